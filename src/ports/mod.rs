// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dataflow endpoints owned by blocks.
//!
//! Ports are shared between a block handle and its worker actor through
//! `Arc`. Their names, dtypes and domains are fixed at creation; only their
//! queues and connections change afterwards, behind per-port locks.

mod dtype;
mod input;
mod label;
mod output;

pub use dtype::DType;
pub use input::InputPort;
pub use label::Label;
pub use output::OutputPort;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::ConfigError;

/// Whether a port consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A port name, addressable either by string or by numeric index.
///
/// Indices are converted to their decimal string, so port `0` and port `"0"`
/// are the same port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortName(String);

impl PortName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for PortName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for PortName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&String> for PortName {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}

impl From<usize> for PortName {
    fn from(index: usize) -> Self {
        Self(index.to_string())
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reflection record for one port, as consumed by topology and
/// documentation tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortInfo {
    pub name: String,
    pub dtype: DType,
    pub is_sig_slot: bool,
}

/// Ports of one direction, in declaration order.
#[derive(Debug)]
pub struct PortMap<P> {
    ports: Vec<Arc<P>>,
    index: HashMap<String, usize>,
}

impl<P> Default for PortMap<P> {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<P> Clone for PortMap<P> {
    fn clone(&self) -> Self {
        Self {
            ports: self.ports.clone(),
            index: self.index.clone(),
        }
    }
}

impl<P> PortMap<P> {
    pub fn get(&self, name: &str) -> Option<&Arc<P>> {
        self.index.get(name).map(|&pos| &self.ports[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<P>> {
        self.ports.iter()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Append a port. The caller has already checked the name is free.
    pub(crate) fn push(&mut self, name: String, port: Arc<P>) {
        self.index.insert(name, self.ports.len());
        self.ports.push(port);
    }
}

/// Inputs and outputs of one block.
#[derive(Debug, Default, Clone)]
pub struct PortSet {
    pub inputs: PortMap<InputPort>,
    pub outputs: PortMap<OutputPort>,
}

impl PortSet {
    pub fn input(&self, name: &str) -> Option<&Arc<InputPort>> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&Arc<OutputPort>> {
        self.outputs.get(name)
    }

    /// Input ports whose names are numeric indices, sorted by index.
    pub fn indexed_inputs(&self) -> Vec<&Arc<InputPort>> {
        indexed(self.inputs.iter(), |port| port.name())
    }

    /// Output ports whose names are numeric indices, sorted by index.
    pub fn indexed_outputs(&self) -> Vec<&Arc<OutputPort>> {
        indexed(self.outputs.iter(), |port| port.name())
    }

    pub fn input_info(&self) -> Vec<PortInfo> {
        self.inputs
            .iter()
            .map(|port| PortInfo {
                name: port.name().to_string(),
                dtype: port.dtype().clone(),
                is_sig_slot: port.is_slot(),
            })
            .collect()
    }

    pub fn output_info(&self) -> Vec<PortInfo> {
        self.outputs
            .iter()
            .map(|port| PortInfo {
                name: port.name().to_string(),
                dtype: port.dtype().clone(),
                is_sig_slot: port.is_signal(),
            })
            .collect()
    }
}

fn indexed<'a, P>(
    ports: impl Iterator<Item = &'a Arc<P>>,
    name: impl Fn(&P) -> &str,
) -> Vec<&'a Arc<P>> {
    let mut numbered: Vec<(usize, &Arc<P>)> = ports
        .filter_map(|port| name(port).parse::<usize>().ok().map(|index| (index, port)))
        .collect();
    numbered.sort_by_key(|(index, _)| *index);
    numbered.into_iter().map(|(_, port)| port).collect()
}

/// Forward every label queued on `input` to every output, in order.
///
/// The input's queue is left untouched, so each call forwards the full set
/// again.
pub fn propagate_labels<'a>(input: &InputPort, outputs: impl IntoIterator<Item = &'a Arc<OutputPort>>) {
    let labels = input.labels();
    if labels.is_empty() {
        return;
    }
    for output in outputs {
        for label in &labels {
            output.post_label(label.clone());
        }
    }
}

pub(crate) fn validate_port_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPortName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_domain(port: &str, domain: &str) -> Result<(), ConfigError> {
    let valid = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '/'));
    if !valid {
        return Err(ConfigError::InvalidDomain {
            port: port.to_string(),
            domain: domain.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(name: &str) -> Arc<OutputPort> {
        Arc::new(OutputPort::new(name, DType::new("float32").unwrap()))
    }

    #[test]
    fn test_port_name_from_index() {
        assert_eq!(PortName::from(3usize).as_str(), "3");
        assert_eq!(PortName::from(3usize), PortName::from("3"));
    }

    #[test]
    fn test_port_map_keeps_declaration_order() {
        let mut map = PortMap::default();
        for name in ["zeta", "alpha", "mid"] {
            map.push(name.to_string(), output(name));
        }
        let names: Vec<&str> = map.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(map.contains("alpha"));
        assert_eq!(map.get("mid").unwrap().name(), "mid");
        assert!(map.get("missing").is_none());
    }

    #[test]
    fn test_indexed_ports_sorted_numerically() {
        let mut ports = PortSet::default();
        for name in ["10", "2", "ctrl", "0"] {
            ports.outputs.push(name.to_string(), output(name));
        }
        let names: Vec<&str> = ports.indexed_outputs().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["0", "2", "10"]);
    }

    #[test]
    fn test_propagate_labels_forwards_in_order_once_per_call() {
        let input = InputPort::new("in0", DType::new("float32").unwrap());
        let labels: Vec<Label> = (0..3)
            .map(|i| Label::new(format!("L{}", i + 1), json!(i), i as u64))
            .collect();
        for label in &labels {
            input.push_label(label.clone());
        }
        let outputs = vec![output("out0"), output("out1")];

        propagate_labels(&input, &outputs);
        for out in &outputs {
            assert_eq!(out.posted_labels(), labels);
        }

        propagate_labels(&input, &outputs);
        for out in &outputs {
            let posted = out.posted_labels();
            assert_eq!(posted.len(), 6);
            assert_eq!(&posted[3..], &labels[..]);
        }
        assert_eq!(input.labels(), labels);
    }

    #[test]
    fn test_port_name_validation() {
        assert!(validate_port_name("in0").is_ok());
        assert!(validate_port_name("").is_err());
        assert!(validate_port_name("bad name").is_err());
    }

    #[test]
    fn test_domain_validation() {
        assert!(validate_domain("p", "").is_ok());
        assert!(validate_domain("p", "cuda:0").is_ok());
        assert!(validate_domain("p", "opencl/gpu-1.fast_path").is_ok());
        assert_eq!(
            validate_domain("p", "bad domain"),
            Err(ConfigError::InvalidDomain {
                port: "p".to_string(),
                domain: "bad domain".to_string()
            })
        );
        assert!(validate_domain("p", "x;y").is_err());
    }

    #[test]
    fn test_port_info_reflects_flags() {
        let mut ports = PortSet::default();
        ports.outputs.push(
            "sig".to_string(),
            Arc::new(OutputPort::with_options("sig".to_string(), DType::empty(), String::new(), true)),
        );
        ports.outputs.push("out0".to_string(), output("out0"));
        let info = ports.output_info();
        assert_eq!(info.len(), 2);
        assert!(info[0].is_sig_slot);
        assert_eq!(info[1].dtype, DType::new("float32").unwrap());
        assert!(!info[1].is_sig_slot);
    }

    #[test]
    fn test_port_info_with_custom_dtype_reads_back() {
        let mut ports = PortSet::default();
        ports.inputs.push(
            "frames".to_string(),
            Arc::new(InputPort::new("frames", DType::custom("packet", 1500))),
        );
        let info = ports.input_info();
        let json = serde_json::to_string(&info).unwrap();
        let back: Vec<PortInfo> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
        assert_eq!(back[0].dtype.size(), 1500);
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data type descriptors for port payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Describes the element type carried by a port.
///
/// A dtype has a canonical name, an element size in bytes, and a dimension
/// (the number of elements per item, 1 for scalars). The empty dtype names a
/// message-only port such as a signal or a slot. Opaque element types use the
/// `custom(name,size)` markup.
///
/// # Example
/// ```
/// use the_blockflow::ports::DType;
///
/// let dtype: DType = "complex_float32".parse().unwrap();
/// assert_eq!(dtype.elem_size(), 8);
/// assert_eq!(dtype.with_dimension(4).size(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DType {
    name: String,
    elem_size: usize,
    dimension: usize,
    custom: bool,
}

/// Known scalar type names and their sizes in bytes.
const SCALARS: &[(&str, usize)] = &[
    ("int8", 1),
    ("int16", 2),
    ("int32", 4),
    ("int64", 8),
    ("uint8", 1),
    ("uint16", 2),
    ("uint32", 4),
    ("uint64", 8),
    ("float32", 4),
    ("float64", 8),
];

fn alias(name: &str) -> &str {
    match name {
        "byte" => "uint8",
        "char" => "int8",
        "float" => "float32",
        "double" => "float64",
        "complex" => "complex_float32",
        other => other,
    }
}

fn scalar_size(name: &str) -> Option<usize> {
    SCALARS
        .iter()
        .find(|(scalar, _)| *scalar == name)
        .map(|(_, size)| *size)
}

fn unknown(markup: &str) -> ConfigError {
    ConfigError::UnknownDType {
        markup: markup.to_string(),
    }
}

/// Parse the optional ", dimension" suffix; `None` when it is malformed.
fn parse_dimension(suffix: Option<&str>) -> Option<usize> {
    match suffix {
        Some(dim) => dim.trim().parse::<usize>().ok().filter(|d| *d > 0),
        None => Some(1),
    }
}

impl DType {
    /// Parse a dtype from its markup name.
    pub fn new(markup: &str) -> Result<Self, ConfigError> {
        let trimmed = markup.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }
        if trimmed.starts_with("custom(") {
            return Self::parse_custom(trimmed).ok_or_else(|| unknown(markup));
        }

        // "name, dimension" is accepted as a shorthand for with_dimension
        let (base, suffix) = match trimmed.split_once(',') {
            Some((base, dim)) => (base.trim(), Some(dim)),
            None => (trimmed, None),
        };
        let dimension = parse_dimension(suffix).ok_or_else(|| unknown(markup))?;

        let name = alias(base);
        let elem_size = match name.strip_prefix("complex_") {
            Some(inner) => scalar_size(inner).map(|size| size * 2),
            None => scalar_size(name),
        }
        .ok_or_else(|| unknown(markup))?;

        Ok(Self {
            name: name.to_string(),
            elem_size,
            dimension,
            custom: false,
        })
    }

    /// `custom(name,size)` with an optional trailing ", dimension".
    fn parse_custom(markup: &str) -> Option<Self> {
        let inner = markup.strip_prefix("custom(")?;
        let (args, rest) = inner.split_once(')')?;
        let (name, size) = args.split_once(',')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let elem_size = size.trim().parse::<usize>().ok()?;

        let rest = rest.trim();
        let suffix = if rest.is_empty() {
            None
        } else {
            Some(rest.strip_prefix(',')?)
        };
        let dimension = parse_dimension(suffix)?;

        Some(Self::custom(name, elem_size).with_dimension(dimension))
    }

    /// The dtype of message-only ports.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            elem_size: 0,
            dimension: 1,
            custom: false,
        }
    }

    /// An opaque element type of a fixed byte size.
    pub fn custom(name: impl Into<String>, elem_size: usize) -> Self {
        Self {
            name: name.into(),
            elem_size,
            dimension: 1,
            custom: true,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Size in bytes of one item: element size times dimension.
    pub fn size(&self) -> usize {
        self.elem_size * self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_complex(&self) -> bool {
        !self.custom && self.name.starts_with("complex_")
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

impl Default for DType {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.custom {
            write!(f, "custom({},{})", self.name, self.elem_size)?;
        } else {
            write!(f, "{}", self.name)?;
        }
        if self.dimension > 1 {
            write!(f, ", {}", self.dimension)?;
        }
        Ok(())
    }
}

impl FromStr for DType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DType::new(s)
    }
}

impl TryFrom<String> for DType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DType::new(&value)
    }
}

impl From<DType> for String {
    fn from(dtype: DType) -> Self {
        dtype.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(DType::new("int8").unwrap().elem_size(), 1);
        assert_eq!(DType::new("uint16").unwrap().elem_size(), 2);
        assert_eq!(DType::new("float32").unwrap().elem_size(), 4);
        assert_eq!(DType::new("float64").unwrap().elem_size(), 8);
    }

    #[test]
    fn test_complex_doubles_element_size() {
        let dtype = DType::new("complex_int16").unwrap();
        assert!(dtype.is_complex());
        assert_eq!(dtype.elem_size(), 4);
        assert_eq!(DType::new("complex_float64").unwrap().elem_size(), 16);
    }

    #[test]
    fn test_aliases_resolve_to_canonical_names() {
        assert_eq!(DType::new("byte").unwrap().name(), "uint8");
        assert_eq!(DType::new("float").unwrap().name(), "float32");
        assert_eq!(DType::new("double").unwrap().name(), "float64");
        assert_eq!(DType::new("complex").unwrap().name(), "complex_float32");
    }

    #[test]
    fn test_dimension_markup() {
        let dtype = DType::new("float32, 4").unwrap();
        assert_eq!(dtype.dimension(), 4);
        assert_eq!(dtype.size(), 16);
        assert_eq!(dtype.to_string(), "float32, 4");
        assert_eq!(DType::new(&dtype.to_string()).unwrap(), dtype);
    }

    #[test]
    fn test_unknown_markup_is_a_config_error() {
        let err = DType::new("quaternion").unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDType {
                markup: "quaternion".to_string()
            }
        );
        assert!(DType::new("float32, 0").is_err());
        assert!(DType::new("complex_complex_int8").is_err());
    }

    #[test]
    fn test_empty_markup_is_message_dtype() {
        let dtype = DType::new("").unwrap();
        assert!(dtype.is_empty());
        assert_eq!(dtype.size(), 0);
        assert_eq!(dtype, DType::default());
    }

    #[test]
    fn test_serde_uses_markup_string() {
        let dtype = DType::new("int32").unwrap().with_dimension(2);
        let json = serde_json::to_string(&dtype).unwrap();
        assert_eq!(json, "\"int32, 2\"");
        let back: DType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dtype);
        assert!(serde_json::from_str::<DType>("\"bogus\"").is_err());
    }

    #[test]
    fn test_custom_dtype() {
        let dtype = DType::custom("packet", 1500);
        assert_eq!(dtype.name(), "packet");
        assert_eq!(dtype.size(), 1500);
        assert!(dtype.is_custom());
        assert_eq!(dtype.to_string(), "custom(packet,1500)");
    }

    #[test]
    fn test_custom_markup_parses() {
        let dtype = DType::new("custom(packet, 1500)").unwrap();
        assert_eq!(dtype, DType::custom("packet", 1500));

        let framed = DType::new("custom(frame,64), 3").unwrap();
        assert_eq!(framed.elem_size(), 64);
        assert_eq!(framed.dimension(), 3);
        assert_eq!(framed.to_string(), "custom(frame,64), 3");

        assert!(DType::new("custom(packet)").is_err());
        assert!(DType::new("custom(,8)").is_err());
        assert!(DType::new("custom(packet,big)").is_err());
        assert!(DType::new("custom(packet,8) 3").is_err());
    }

    #[test]
    fn test_custom_dtype_serde_reads_back() {
        let dtype = DType::custom("packet", 1500).with_dimension(2);
        let json = serde_json::to_string(&dtype).unwrap();
        assert_eq!(json, "\"custom(packet,1500), 2\"");
        let back: DType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dtype);

        // a custom name that shadows a scalar keeps its own size
        let shadow = DType::custom("float32", 7);
        let back: DType = serde_json::from_str(&serde_json::to_string(&shadow).unwrap()).unwrap();
        assert_eq!(back.elem_size(), 7);
        assert!(back.is_custom());
    }
}

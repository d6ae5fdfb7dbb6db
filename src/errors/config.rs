// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::ports::PortDirection;

/// Errors raised while configuring a block, a port, or a thread pool layout.
///
/// These are reported synchronously to the configuring caller. Validation runs
/// before any state is touched, so a failed setup leaves nothing behind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A port with this name already exists in the given direction
    DuplicatePort {
        direction: PortDirection,
        name: String,
    },
    /// Port names must be non-empty and free of whitespace
    InvalidPortName {
        name: String,
    },
    /// Callables must be registered under a non-empty name
    EmptyCallName,
    /// The domain string contains characters outside the allowed set
    InvalidDomain {
        port: String,
        domain: String,
    },
    /// The data type markup does not name a known type
    UnknownDType {
        markup: String,
    },
    /// Configuration was attempted while the block is active
    BlockActive {
        operation: &'static str,
    },
    /// No affinity zone with this name is configured
    UnknownAffinityZone {
        zone: String,
    },
    /// A thread pool layout asks for an unusable number of threads
    InvalidThreadCount {
        scope: String,
        requested: usize,
        maximum: usize,
    },
    /// Thread names are handed to the OS and cannot carry a NUL byte
    InvalidThreadName {
        scope: String,
    },
    /// A zero-byte worker stack was requested
    InvalidStackSize {
        scope: String,
    },
    /// Affinity zone names must be non-empty
    EmptyZoneName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicatePort { direction, name } => {
                write!(f, "Duplicate {} port name: '{}'", direction, name)
            }
            ConfigError::InvalidPortName { name } => {
                write!(f, "Invalid port name '{}': names must be non-empty and contain no whitespace", name)
            }
            ConfigError::EmptyCallName => {
                write!(f, "Callable names must be non-empty")
            }
            ConfigError::InvalidDomain { port, domain } => {
                write!(f, "Port '{}' has malformed domain '{}'", port, domain)
            }
            ConfigError::UnknownDType { markup } => {
                write!(f, "Unknown data type '{}'", markup)
            }
            ConfigError::BlockActive { operation } => {
                write!(f, "Cannot {} while the block is active", operation)
            }
            ConfigError::UnknownAffinityZone { zone } => {
                write!(f, "Affinity zone '{}' is not configured", zone)
            }
            ConfigError::InvalidThreadCount {
                scope,
                requested,
                maximum,
            } => {
                write!(
                    f,
                    "Thread pool '{}' requests {} threads, maximum is {}",
                    scope, requested, maximum
                )
            }
            ConfigError::InvalidThreadName { scope } => {
                write!(f, "Thread pool '{}' has a thread name containing a NUL byte", scope)
            }
            ConfigError::InvalidStackSize { scope } => {
                write!(f, "Thread pool '{}' requests a zero-byte thread stack", scope)
            }
            ConfigError::EmptyZoneName => {
                write!(f, "Affinity zone names must be non-empty")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors produced by the call/reply and signal/slot protocols.

use thiserror::Error;

/// Failure of a call into a block's callable registry.
///
/// Errors raised inside the worker actor are carried back through the reply
/// channel as one of these variants and returned in the caller's context with
/// their original diagnostic intact.
#[derive(Error, Debug)]
pub enum CallError {
    /// No callable (or slot) with this name is registered.
    #[error("Block call '{name}': method does not exist in registry")]
    NotFound { name: String },

    /// The callable was invoked with the wrong number of arguments.
    #[error("Block call '{name}' expects {expected} argument(s), got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    /// An argument could not be decoded into the callable's parameter type.
    #[error("Block call '{name}': argument {index} could not be decoded: {source}")]
    BadArgument {
        name: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The return value could not be converted to or from a `Value`.
    #[error("Block call '{name}': return value could not be converted: {source}")]
    BadReturn {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The handler itself returned an error.
    #[error("Block call '{name}' failed: {source:#}")]
    Invocation {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The handler panicked; the actor caught the panic and kept running.
    #[error("Block call '{name}' panicked: {message}")]
    Panicked { name: String, message: String },

    /// The worker actor's mailbox or reply channel is closed.
    #[error("worker actor is no longer running")]
    ActorGone,
}

impl CallError {
    pub fn not_found(name: impl Into<String>) -> Self {
        CallError::NotFound { name: name.into() }
    }

    /// True when the failure is a missing registry entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CallError::NotFound { .. })
    }

    /// Name of the call this error refers to, if any.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            CallError::NotFound { name }
            | CallError::ArgumentCount { name, .. }
            | CallError::BadArgument { name, .. }
            | CallError::BadReturn { name, .. }
            | CallError::Invocation { name, .. }
            | CallError::Panicked { name, .. } => Some(name),
            CallError::ActorGone => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_the_call() {
        let err = CallError::not_found("setGain");
        assert!(err.is_not_found());
        assert_eq!(err.call_name(), Some("setGain"));
        assert_eq!(
            err.to_string(),
            "Block call 'setGain': method does not exist in registry"
        );
    }

    #[test]
    fn test_invocation_preserves_handler_diagnostic() {
        let err = CallError::Invocation {
            name: "tune".to_string(),
            source: anyhow::anyhow!("frequency out of range").context("retuning"),
        };
        let text = err.to_string();
        assert!(text.contains("tune"));
        assert!(text.contains("retuning"));
        assert!(text.contains("frequency out of range"));
    }

    #[test]
    fn test_actor_gone_has_no_call_name() {
        assert_eq!(CallError::ActorGone.call_name(), None);
    }
}

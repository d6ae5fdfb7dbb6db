// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::errors::CallError;
use crate::Value;

/// Why an invocation failed, before the call name is attached.
enum Fault {
    Argument {
        index: usize,
        source: serde_json::Error,
    },
    Return(serde_json::Error),
    Handler(anyhow::Error),
}

type Invoke<L> = dyn Fn(&mut L, &[Value]) -> Result<Value, Fault> + Send + Sync;

/// A type-erased handle to a method on block logic `L`, plus its arity.
///
/// Arguments and return values cross the call boundary as [`Value`]s. The
/// typed constructors decode each argument with serde and encode the result,
/// so handlers are written against ordinary Rust types:
///
/// ```
/// use the_blockflow::registry::Callable;
///
/// struct Gain { gain: f64 }
///
/// let set_gain = Callable::arity1(|block: &mut Gain, gain: f64| {
///     block.gain = gain;
///     Ok(())
/// });
/// assert_eq!(set_gain.num_args(), 1);
/// ```
pub struct Callable<L> {
    invoke: Arc<Invoke<L>>,
    num_args: usize,
}

impl<L> Clone for Callable<L> {
    fn clone(&self) -> Self {
        Self {
            invoke: Arc::clone(&self.invoke),
            num_args: self.num_args,
        }
    }
}

impl<L> fmt::Debug for Callable<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("num_args", &self.num_args)
            .finish()
    }
}

fn decode<A: DeserializeOwned>(args: &[Value], index: usize) -> Result<A, Fault> {
    serde_json::from_value(args[index].clone()).map_err(|source| Fault::Argument { index, source })
}

fn encode<R: Serialize>(result: anyhow::Result<R>) -> Result<Value, Fault> {
    let value = result.map_err(Fault::Handler)?;
    serde_json::to_value(value).map_err(Fault::Return)
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<L: 'static> Callable<L> {
    /// Wrap a handler that takes the raw argument list.
    ///
    /// `num_args` is the declared arity; calls with a different number of
    /// arguments are rejected before the handler runs.
    pub fn new<F>(num_args: usize, handler: F) -> Self
    where
        F: Fn(&mut L, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            invoke: Arc::new(move |target: &mut L, args: &[Value]| handler(target, args).map_err(Fault::Handler)),
            num_args,
        }
    }

    pub fn arity0<R, F>(handler: F) -> Self
    where
        R: Serialize,
        F: Fn(&mut L) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            invoke: Arc::new(move |target: &mut L, _args: &[Value]| encode(handler(target))),
            num_args: 0,
        }
    }

    pub fn arity1<A, R, F>(handler: F) -> Self
    where
        A: DeserializeOwned,
        R: Serialize,
        F: Fn(&mut L, A) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            invoke: Arc::new(move |target: &mut L, args: &[Value]| {
                let a = decode(args, 0)?;
                encode(handler(target, a))
            }),
            num_args: 1,
        }
    }

    pub fn arity2<A, B, R, F>(handler: F) -> Self
    where
        A: DeserializeOwned,
        B: DeserializeOwned,
        R: Serialize,
        F: Fn(&mut L, A, B) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            invoke: Arc::new(move |target: &mut L, args: &[Value]| {
                let a = decode(args, 0)?;
                let b = decode(args, 1)?;
                encode(handler(target, a, b))
            }),
            num_args: 2,
        }
    }

    pub fn arity3<A, B, C, R, F>(handler: F) -> Self
    where
        A: DeserializeOwned,
        B: DeserializeOwned,
        C: DeserializeOwned,
        R: Serialize,
        F: Fn(&mut L, A, B, C) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self {
            invoke: Arc::new(move |target: &mut L, args: &[Value]| {
                let a = decode(args, 0)?;
                let b = decode(args, 1)?;
                let c = decode(args, 2)?;
                encode(handler(target, a, b, c))
            }),
            num_args: 3,
        }
    }
}

impl<L> Callable<L> {
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    /// Invoke against `target`, reporting failures under `name`.
    ///
    /// Panics raised by the handler are caught and returned as
    /// [`CallError::Panicked`].
    pub fn call(&self, name: &str, target: &mut L, args: &[Value]) -> Result<Value, CallError> {
        if args.len() != self.num_args {
            return Err(CallError::ArgumentCount {
                name: name.to_string(),
                expected: self.num_args,
                got: args.len(),
            });
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| (self.invoke)(target, args)));
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Fault::Argument { index, source })) => Err(CallError::BadArgument {
                name: name.to_string(),
                index,
                source,
            }),
            Ok(Err(Fault::Return(source))) => Err(CallError::BadReturn {
                name: name.to_string(),
                source,
            }),
            Ok(Err(Fault::Handler(source))) => Err(CallError::Invocation {
                name: name.to_string(),
                source,
            }),
            Err(payload) => Err(CallError::Panicked {
                name: name.to_string(),
                message: panic_message(payload),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Mixer {
        gain: f64,
        label: String,
    }

    #[test]
    fn test_typed_arguments_are_decoded() {
        let call = Callable::arity2(|m: &mut Mixer, gain: f64, label: String| {
            m.gain = gain;
            m.label = label;
            Ok(m.gain * 2.0)
        });
        let mut mixer = Mixer::default();
        let result = call.call("configure", &mut mixer, &[json!(1.5), json!("main")]).unwrap();
        assert_eq!(result, json!(3.0));
        assert_eq!(mixer.label, "main");
    }

    #[test]
    fn test_unit_return_encodes_as_null() {
        let call = Callable::arity0(|m: &mut Mixer| {
            m.gain = 0.0;
            Ok(())
        });
        let mut mixer = Mixer { gain: 4.0, ..Default::default() };
        assert_eq!(call.call("reset", &mut mixer, &[]).unwrap(), Value::Null);
        assert_eq!(mixer.gain, 0.0);
    }

    #[test]
    fn test_wrong_argument_count_never_reaches_handler() {
        let call = Callable::arity1(|m: &mut Mixer, gain: f64| {
            m.gain = gain;
            Ok(())
        });
        let mut mixer = Mixer::default();
        let err = call.call("setGain", &mut mixer, &[]).unwrap_err();
        assert!(matches!(err, CallError::ArgumentCount { expected: 1, got: 0, .. }));
    }

    #[test]
    fn test_undecodable_argument_reports_index() {
        let call = Callable::arity2(|_: &mut Mixer, _a: f64, _b: u32| Ok(()));
        let mut mixer = Mixer::default();
        let err = call
            .call("pair", &mut mixer, &[json!(1.0), json!("not a number")])
            .unwrap_err();
        assert!(matches!(err, CallError::BadArgument { index: 1, .. }));
    }

    #[test]
    fn test_handler_error_is_preserved() {
        let call = Callable::arity1(|_: &mut Mixer, gain: f64| -> anyhow::Result<()> {
            anyhow::bail!("gain {} exceeds headroom", gain)
        });
        let mut mixer = Mixer::default();
        let err = call.call("setGain", &mut mixer, &[json!(99.0)]).unwrap_err();
        assert!(err.to_string().contains("gain 99 exceeds headroom"));
    }

    #[test]
    fn test_panic_is_caught() {
        let call = Callable::arity0(|_: &mut Mixer| -> anyhow::Result<()> { panic!("boom") });
        let mut mixer = Mixer::default();
        match call.call("explode", &mut mixer, &[]) {
            Err(CallError::Panicked { name, message }) => {
                assert_eq!(name, "explode");
                assert_eq!(message, "boom");
            }
            other => panic!("expected Panicked, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_handler_sees_all_arguments() {
        let call = Callable::new(3, |_: &mut Mixer, args: &[Value]| Ok(json!(args.len())));
        let mut mixer = Mixer::default();
        assert_eq!(
            call.call("raw", &mut mixer, &[json!(1), json!(2), json!(3)]).unwrap(),
            json!(3)
        );
    }
}

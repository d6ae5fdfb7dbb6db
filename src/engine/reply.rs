// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;

use crate::errors::CallError;

/// Block the calling thread until the actor fulfils `reply`.
///
/// Works from plain threads, from inside a multi-thread runtime (the worker
/// is handed off with `block_in_place`) and from a current-thread runtime.
/// A reply channel dropped unfulfilled means the actor is gone.
pub(crate) fn wait_for_reply<T>(reply: oneshot::Receiver<T>) -> Result<T, CallError> {
    let outcome = match Handle::try_current() {
        Err(_) => reply.blocking_recv(),
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::CurrentThread => futures::executor::block_on(reply),
            _ => tokio::task::block_in_place(|| reply.blocking_recv()),
        },
    };
    outcome.map_err(|_| CallError::ActorGone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_from_plain_thread() {
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || tx.send(7).unwrap());
        assert_eq!(wait_for_reply(rx).unwrap(), 7);
    }

    #[test]
    fn test_dropped_sender_is_actor_gone() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        assert!(matches!(wait_for_reply(rx), Err(CallError::ActorGone)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reply_inside_multi_thread_runtime() {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move { tx.send("done").unwrap() });
        assert_eq!(wait_for_reply(rx).unwrap(), "done");
    }

    #[tokio::test]
    async fn test_reply_inside_current_thread_runtime() {
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || tx.send(1u8).unwrap());
        assert_eq!(wait_for_reply(rx).unwrap(), 1);
    }
}

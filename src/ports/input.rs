// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::ports::{DType, Label};
use crate::traits::BufferManager;
use crate::Value;

#[derive(Default)]
struct InputQueue {
    messages: VecDeque<Value>,
    /// Labels tagged with their arrival sequence number
    labels: VecDeque<(u64, Label)>,
    total_messages: u64,
    total_labels: u64,
}

/// A named, typed input endpoint of a block.
///
/// Upstream output ports push messages and labels into the port's queues;
/// every arrival wakes the owning block's worker actor. Slot ports carry the
/// argument lists of connected signals and are dispatched by the actor to the
/// callable of the same name.
pub struct InputPort {
    name: String,
    dtype: DType,
    domain: String,
    is_slot: bool,
    queue: Mutex<InputQueue>,
    buffer_manager: Mutex<Option<Arc<dyn BufferManager>>>,
    waker: Arc<Notify>,
}

impl InputPort {
    /// A port that is not owned by any block.
    ///
    /// Arrivals still signal the port's own waker, see [`InputPort::waker`].
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self::with_waker(name.into(), dtype, String::new(), false, Arc::new(Notify::new()))
    }

    pub(crate) fn with_waker(
        name: String,
        dtype: DType,
        domain: String,
        is_slot: bool,
        waker: Arc<Notify>,
    ) -> Self {
        Self {
            name,
            dtype,
            domain,
            is_slot,
            queue: Mutex::new(InputQueue::default()),
            buffer_manager: Mutex::new(None),
            waker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> &DType {
        &self.dtype
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_slot(&self) -> bool {
        self.is_slot
    }

    /// Notifier signalled on every message or label arrival.
    pub fn waker(&self) -> &Arc<Notify> {
        &self.waker
    }

    pub fn buffer_manager(&self) -> Option<Arc<dyn BufferManager>> {
        self.buffer_manager.lock().clone()
    }

    /// Install the manager negotiated by the connection resolver.
    pub fn set_buffer_manager(&self, manager: Option<Arc<dyn BufferManager>>) {
        *self.buffer_manager.lock() = manager;
    }

    /// Enqueue an asynchronous message and wake the owning actor.
    pub fn push_message(&self, message: Value) {
        {
            let mut queue = self.queue.lock();
            queue.messages.push_back(message);
            queue.total_messages += 1;
        }
        self.waker.notify_one();
    }

    pub fn pop_message(&self) -> Option<Value> {
        self.queue.lock().messages.pop_front()
    }

    pub fn has_message(&self) -> bool {
        !self.queue.lock().messages.is_empty()
    }

    pub fn pending_messages(&self) -> usize {
        self.queue.lock().messages.len()
    }

    /// Enqueue a label and wake the owning actor.
    pub fn push_label(&self, label: Label) {
        {
            let mut queue = self.queue.lock();
            let seq = queue.total_labels;
            queue.labels.push_back((seq, label));
            queue.total_labels += 1;
        }
        self.waker.notify_one();
    }

    /// Snapshot of the labels currently queued, oldest first.
    pub fn labels(&self) -> Vec<Label> {
        self.queue.lock().labels.iter().map(|(_, label)| label.clone()).collect()
    }

    pub fn pending_labels(&self) -> usize {
        self.queue.lock().labels.len()
    }

    /// Remove and return every queued label.
    pub fn take_labels(&self) -> Vec<Label> {
        self.queue.lock().labels.drain(..).map(|(_, label)| label).collect()
    }

    /// Drop the labels that arrived before `mark`, a value previously read
    /// from [`InputPort::total_labels`]. Later arrivals stay queued.
    pub fn discard_labels_before(&self, mark: u64) -> usize {
        let mut queue = self.queue.lock();
        let before = queue.labels.len();
        queue.labels.retain(|(seq, _)| *seq >= mark);
        before - queue.labels.len()
    }

    /// Remove the first queued label equal to `label`.
    pub fn remove_label(&self, label: &Label) -> bool {
        let mut queue = self.queue.lock();
        match queue.labels.iter().position(|(_, queued)| queued == label) {
            Some(pos) => {
                queue.labels.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn total_messages(&self) -> u64 {
        self.queue.lock().total_messages
    }

    pub fn total_labels(&self) -> u64 {
        self.queue.lock().total_labels
    }
}

impl fmt::Debug for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("name", &self.name)
            .field("dtype", &self.dtype)
            .field("domain", &self.domain)
            .field("is_slot", &self.is_slot)
            .field("pending_messages", &self.pending_messages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_are_fifo() {
        let port = InputPort::new("in0", DType::empty());
        port.push_message(json!(1));
        port.push_message(json!(2));
        assert_eq!(port.pending_messages(), 2);
        assert_eq!(port.pop_message(), Some(json!(1)));
        assert_eq!(port.pop_message(), Some(json!(2)));
        assert_eq!(port.pop_message(), None);
        assert_eq!(port.total_messages(), 2);
    }

    #[test]
    fn test_labels_snapshot_does_not_consume() {
        let port = InputPort::new("in0", DType::new("float32").unwrap());
        port.push_label(Label::new("a", json!(1), 0));
        port.push_label(Label::new("b", json!(2), 5));
        assert_eq!(port.labels().len(), 2);
        assert_eq!(port.labels().len(), 2);

        assert!(port.remove_label(&Label::new("a", json!(1), 0)));
        assert!(!port.remove_label(&Label::new("a", json!(1), 0)));

        let taken = port.take_labels();
        assert_eq!(taken, vec![Label::new("b", json!(2), 5)]);
        assert!(port.labels().is_empty());
        assert_eq!(port.total_labels(), 2);
    }

    #[test]
    fn test_discard_keeps_later_arrivals() {
        let port = InputPort::new("in0", DType::new("float32").unwrap());
        port.push_label(Label::new("a", json!(1), 0));
        port.push_label(Label::new("b", json!(2), 1));
        let mark = port.total_labels();
        port.push_label(Label::new("c", json!(3), 2));

        assert_eq!(port.discard_labels_before(mark), 2);
        assert_eq!(port.labels(), vec![Label::new("c", json!(3), 2)]);
        assert_eq!(port.discard_labels_before(mark), 0);
    }

    #[tokio::test]
    async fn test_arrival_signals_waker() {
        let port = InputPort::new("in0", DType::empty());
        port.push_message(json!("ping"));
        // notify_one stores a permit when nobody is waiting yet
        tokio::time::timeout(std::time::Duration::from_secs(1), port.waker().notified())
            .await
            .expect("arrival should leave a wake permit");
    }
}

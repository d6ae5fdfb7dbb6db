// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::ports::{DType, InputPort, Label};
use crate::traits::BufferManager;
use crate::Value;

/// A named, typed output endpoint of a block.
///
/// Messages fan out to subscribers as soon as they are posted. Labels are
/// queued and delivered when the owning actor flushes the port at the end of
/// a work cycle. A signal port is an output whose messages are the argument
/// lists of signal emissions.
pub struct OutputPort {
    name: String,
    dtype: DType,
    domain: String,
    is_signal: bool,
    subscribers: Mutex<Vec<Weak<InputPort>>>,
    labels: Mutex<VecDeque<Label>>,
    buffer_manager: Mutex<Option<Arc<dyn BufferManager>>>,
    total_messages: AtomicU64,
    total_labels: AtomicU64,
}

impl OutputPort {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self::with_options(name.into(), dtype, String::new(), false)
    }

    pub(crate) fn with_options(name: String, dtype: DType, domain: String, is_signal: bool) -> Self {
        Self {
            name,
            dtype,
            domain,
            is_signal,
            subscribers: Mutex::new(Vec::new()),
            labels: Mutex::new(VecDeque::new()),
            buffer_manager: Mutex::new(None),
            total_messages: AtomicU64::new(0),
            total_labels: AtomicU64::new(0),
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

    pub fn is_signal(&self) -> bool {
        self.is_signal
    }

    pub fn buffer_manager(&self) -> Option<Arc<dyn BufferManager>> {
        self.buffer_manager.lock().clone()
    }

    pub fn set_buffer_manager(&self, manager: Option<Arc<dyn BufferManager>>) {
        *self.buffer_manager.lock() = manager;
    }

    /// Connect a downstream input. Subscribing the same port twice is a no-op.
    pub fn subscribe(&self, input: &Arc<InputPort>) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| weak.strong_count() > 0);
        if subscribers
            .iter()
            .any(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(input)))
        {
            return;
        }
        subscribers.push(Arc::downgrade(input));
    }

    pub fn unsubscribe(&self, input: &Arc<InputPort>) {
        self.subscribers.lock().retain(|weak| {
            weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), Arc::as_ptr(input))
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn live_subscribers(&self) -> Vec<Arc<InputPort>> {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Deliver a message to every subscriber without waiting on any of them.
    ///
    /// Returns the number of subscribers reached; zero is a valid delivery.
    pub fn post_message(&self, message: Value) -> usize {
        self.total_messages.fetch_add(1, Ordering::Relaxed);
        let subscribers = self.live_subscribers();
        for input in &subscribers {
            input.push_message(message.clone());
        }
        subscribers.len()
    }

    /// Queue a label for delivery at the next flush.
    pub fn post_label(&self, label: Label) {
        self.total_labels.fetch_add(1, Ordering::Relaxed);
        self.labels.lock().push_back(label);
    }

    /// Labels posted since the last flush, oldest first.
    pub fn posted_labels(&self) -> Vec<Label> {
        self.labels.lock().iter().cloned().collect()
    }

    /// Deliver queued labels to every subscriber in posting order.
    ///
    /// Returns the number of labels flushed. Labels on an unconnected port are
    /// dropped.
    pub fn flush_labels(&self) -> usize {
        let labels: Vec<Label> = self.labels.lock().drain(..).collect();
        if labels.is_empty() {
            return 0;
        }
        for input in self.live_subscribers() {
            for label in &labels {
                input.push_label(label.clone());
            }
        }
        labels.len()
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }

    pub fn total_labels(&self) -> u64 {
        self.total_labels.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("name", &self.name)
            .field("dtype", &self.dtype)
            .field("domain", &self.domain)
            .field("is_signal", &self.is_signal)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

//! Record types passed between the engine and user map/reduce code.

use std::cmp::Ordering;

use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// A (key,value) pair. Keys and values are opaque to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Pair {
        Pair {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl PartialOrd for Pair {
    fn partial_cmp(&self, other: &Pair) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pair {
    fn cmp(&self, other: &Pair) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Equal => self.value.cmp(&other.value),
            o => o,
        }
    }
}

/// A (key,[value]) group; input to a synchronous reducer function.
/// Can be iterated over, e.g. in a `for` loop.
pub struct MultiRecord {
    key: String,
    values: Vec<String>,
}

impl MultiRecord {
    pub fn new(key: String, values: Vec<String>) -> MultiRecord {
        MultiRecord { key, values }
    }

    /// Retrieves the key of the group.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl IntoIterator for MultiRecord {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;
    /// Iterates over the values, in the order they were delivered.
    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Buffered emitter handed to synchronous map/reduce functions; the
/// engine forwards the buffer once the function returns.
pub struct Emitter {
    buf: Vec<Pair>,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter { buf: Vec::new() }
    }

    pub fn emit(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.buf.push(Pair::new(key, value));
    }

    pub fn into_pairs(self) -> Vec<Pair> {
        self.buf
    }
}

impl Default for Emitter {
    fn default() -> Emitter {
        Emitter::new()
    }
}

/// Channel-backed sink through which a running mapper or reducer emits
/// pairs to the engine.
pub struct PairSink {
    tx: mpsc::UnboundedSender<Pair>,
}

impl PairSink {
    /// Creates a sink and the engine-side receiver draining it.
    pub fn channel() -> (PairSink, mpsc::UnboundedReceiver<Pair>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PairSink { tx }, rx)
    }

    /// Emits one pair. Fails only when the engine has abandoned the task.
    pub fn emit(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.tx
            .send(Pair::new(key, value))
            .map_err(|_| Error::Unavailable)
    }
}

/// Pull stream over the values of one key, delivered to a reducer in
/// ascending value order.
pub struct ValueStream {
    rx: mpsc::Receiver<String>,
}

impl ValueStream {
    /// Creates a stream and the engine-side sender feeding it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, ValueStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, ValueStream { rx })
    }

    /// The next value, or `None` once the key group is exhausted.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

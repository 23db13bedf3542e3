//! In-memory [`LineSink`] for assertions on dispatched output.

use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use flowframe::{HEARTBEAT_MARKER, LineSink};

/// Sink recording every write; clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Every write so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if a writer panicked while holding the lock.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("recording sink poisoned").clone()
    }

    /// Writes that were payloads, with the dispatcher's trailing newline removed.
    #[must_use]
    pub fn payloads(&self) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|w| !is_heartbeat(w))
            .map(|mut w| {
                w.pop();
                w
            })
            .collect()
    }

    /// Number of heartbeat markers written so far.
    #[must_use]
    pub fn heartbeats(&self) -> usize { self.writes().iter().filter(|w| is_heartbeat(w)).count() }
}

fn is_heartbeat(write: &str) -> bool { write.strip_suffix('\n') == Some(HEARTBEAT_MARKER) }

#[async_trait]
impl LineSink for RecordingSink {
    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.writes
            .lock()
            .map_err(|_| io::Error::other("recording sink poisoned"))?
            .push(text.to_owned());
        Ok(())
    }
}

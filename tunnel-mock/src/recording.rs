use std::sync::{Mutex, PoisonError};

use tunnel_core::{Observer, SourceEvent};

/// Observer that records every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, SourceEvent)>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event with the endpoint that emitted it, in order.
    #[must_use]
    pub fn events(&self) -> Vec<(String, SourceEvent)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&SourceEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, e)| pred(e))
            .count()
    }

    /// Returns true if `event` was recorded at least once.
    #[must_use]
    pub fn contains(&self, event: &SourceEvent) -> bool {
        self.count(|e| e == event) > 0
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, endpoint: &str, event: &SourceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint.to_string(), event.clone()));
    }
}

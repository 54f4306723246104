use std::sync::{Arc, Mutex};

use liveglob::{GlobEvent, LiveGlob, SubscriptionId};

/// Collects every event a live glob delivers.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubscriber {
    events: Arc<Mutex<Vec<GlobEvent>>>,
}

impl RecordingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `view` and start recording.
    pub fn attach(&self, view: &LiveGlob) -> SubscriptionId {
        let events = Arc::clone(&self.events);
        view.subscribe(move |event| {
            events.lock().unwrap().push(event.clone());
        })
    }

    pub fn events(&self) -> Vec<GlobEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events as `("add", "src/a.rs")` pairs, for compact assertions.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| (event.kind.as_str(), event.path.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

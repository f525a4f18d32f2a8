//! Event definition and subscriber registries.
//!
//! Both are keyed by exact event name and backed by `DashMap`, so
//! registration and lookup from concurrent callers never race or lose
//! entries.

use std::sync::Arc;

use arena_core::{Event, EventDefinition};
use dashmap::DashMap;

/// In-process event subscriber.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(f)
}

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Delivery policies by event name. Purely descriptive, no runtime state.
#[derive(Default)]
pub struct EventDefinitions {
    definitions: DashMap<String, EventDefinition>,
}

impl EventDefinitions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a definition, replacing any previous one with the same name.
    pub fn define(&self, definition: EventDefinition) {
        let _ = self.definitions.insert(definition.name.clone(), definition);
    }

    /// Look up a definition by exact name.
    pub fn get(&self, name: &str) -> Option<EventDefinition> {
        self.definitions.get(name).map(|d| d.value().clone())
    }

    /// Whether `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Number of defined events.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no events are defined.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscribers
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered handler lists by event name.
#[derive(Default)]
pub struct Subscribers {
    handlers: DashMap<String, Vec<EventHandler>>,
}

impl Subscribers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `name`.
    ///
    /// The append happens under the entry's shard lock, so concurrent
    /// registrations for the same name are all kept.
    pub fn register(&self, name: impl Into<String>, handler: EventHandler) {
        self.handlers.entry(name.into()).or_default().push(handler);
    }

    /// Snapshot the handlers for `name` in registration order.
    ///
    /// Returns `None` when nothing ever subscribed. The returned list is
    /// detached: later registrations do not affect it.
    pub fn snapshot(&self, name: &str) -> Option<Vec<EventHandler>> {
        self.handlers
            .get(name)
            .map(|list| list.value().clone())
            .filter(|list| !list.is_empty())
    }

    /// Number of handlers registered for `name`.
    pub fn count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, |list| list.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use serde_json::json;

    fn recorder(log: &Arc<Mutex<Vec<usize>>>, tag: usize) -> EventHandler {
        let log = Arc::clone(log);
        handler(move |_| log.lock().push(tag))
    }

    #[test]
    fn define_and_lookup() {
        let defs = EventDefinitions::new();
        assert!(defs.is_empty());
        defs.define(EventDefinition::broadcast("chat"));
        assert!(defs.contains("chat"));
        assert_eq!(defs.get("chat"), Some(EventDefinition::broadcast("chat")));
        assert_eq!(defs.get("Chat"), None);
        assert_eq!(defs.get("cha"), None);
    }

    #[test]
    fn define_overwrites_by_name() {
        let defs = EventDefinitions::new();
        defs.define(EventDefinition::internal("tick"));
        defs.define(EventDefinition::broadcast("tick"));
        assert_eq!(defs.len(), 1);
        assert!(defs.get("tick").unwrap().broadcast);
    }

    #[test]
    fn snapshot_missing_name_is_none() {
        let subs = Subscribers::new();
        assert!(subs.snapshot("nothing").is_none());
        assert_eq!(subs.count("nothing"), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_registrations() {
        let subs = Subscribers::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        subs.register("tick", recorder(&log, 1));

        let snapshot = subs.snapshot("tick").unwrap();
        subs.register("tick", recorder(&log, 2));

        let event = Event::new("tick", json!(null));
        for h in &snapshot {
            h(&event);
        }
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(subs.count("tick"), 2);
    }

    #[test]
    fn concurrent_registrations_are_not_lost() {
        let subs = Arc::new(Subscribers::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let subs = Arc::clone(&subs);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        subs.register("tick", handler(|_| {}));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(subs.count("tick"), 400);
    }

    proptest! {
        #[test]
        fn snapshot_preserves_registration_order(n in 1usize..32) {
            let subs = Subscribers::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            for tag in 0..n {
                subs.register("ordered", recorder(&log, tag));
            }
            let event = Event::new("ordered", json!(null));
            for h in subs.snapshot("ordered").unwrap() {
                h(&event);
            }
            prop_assert_eq!(log.lock().clone(), (0..n).collect::<Vec<_>>());
        }
    }
}

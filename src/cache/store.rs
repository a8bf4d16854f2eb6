//! Local mirror store.
//!
//! # Responsibilities
//! - Hold the latest known version of every mirrored object
//! - Turn wire-level watch events into cache events with old/new state
//! - Reconcile a fresh listing against the mirror after a re-list
//!
//! # Design Decisions
//! - DashMap keeps concurrent reader access lock-free for callers while the
//!   watch loop writes
//! - Reconciliation emits the minimal event set (adds, updates, removes)
//!   rather than clearing and re-adding, so handlers see real deltas

use dashmap::DashMap;

use crate::cache::object::{ApiObject, ObjectKey, WatchEvent, WatchEventKind};

/// Notification delivered to registered event handlers.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// An object appeared.
    Added(ApiObject),
    /// An object changed; both versions are provided.
    Updated {
        /// Previously mirrored version.
        old: ApiObject,
        /// Version just received.
        new: ApiObject,
    },
    /// An object went away; the last mirrored version is provided.
    Removed(ApiObject),
}

impl CacheEvent {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheEvent::Added(_) => "added",
            CacheEvent::Updated { .. } => "updated",
            CacheEvent::Removed(_) => "removed",
        }
    }
}

/// Concurrent mirror of a remote resource collection.
#[derive(Debug, Default)]
pub struct Store {
    objects: DashMap<ObjectKey, ApiObject>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest mirrored version of an object, if present.
    pub fn get(&self, key: &ObjectKey) -> Option<ApiObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    /// Number of mirrored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing is mirrored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Copy of the full mirror.
    pub fn snapshot(&self) -> Vec<ApiObject> {
        self.objects.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Apply one watch event, returning the handler notification it implies.
    ///
    /// A delete for an unknown object returns `None` (nothing to notify).
    pub fn apply(&self, event: WatchEvent) -> Option<CacheEvent> {
        let key = event.object.key();
        match event.kind {
            WatchEventKind::Added | WatchEventKind::Modified => {
                match self.objects.insert(key, event.object.clone()) {
                    Some(old) if old != event.object => Some(CacheEvent::Updated {
                        old,
                        new: event.object,
                    }),
                    Some(_) => None,
                    None => Some(CacheEvent::Added(event.object)),
                }
            }
            WatchEventKind::Deleted => self
                .objects
                .remove(&key)
                .map(|(_, old)| CacheEvent::Removed(old)),
        }
    }

    /// Reconcile a fresh full listing against the mirror, returning the
    /// events the transition implies.
    pub fn replace(&self, items: Vec<ApiObject>) -> Vec<CacheEvent> {
        let mut events = Vec::new();
        let mut listed = std::collections::HashSet::new();

        for item in items {
            let key = item.key();
            listed.insert(key.clone());
            match self.objects.insert(key, item.clone()) {
                Some(old) if old != item => events.push(CacheEvent::Updated { old, new: item }),
                Some(_) => {}
                None => events.push(CacheEvent::Added(item)),
            }
        }

        let gone: Vec<ObjectKey> = self
            .objects
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|key| !listed.contains(key))
            .collect();
        for key in gone {
            if let Some((_, old)) = self.objects.remove(&key) {
                events.push(CacheEvent::Removed(old));
            }
        }

        events
    }
}

//! Change notification for store slices.
//!
//! Each slice owns one [`Observers`] registry. There is no process-wide
//! listener list: a consumer subscribes to the slice it renders and
//! unsubscribes with the id it got back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::store::lock;

/// The three cached domains, plus the explore subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Transactions,
    Feedback,
    Trends,
    Explore,
}

/// Individually cached resources. Several live in the transactions domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Transactions,
    Summary,
    Forecast,
    Unusual,
    DataPresence,
    Feedback,
    Trends,
    Places,
}

impl Resource {
    pub fn domain(&self) -> Domain {
        match self {
            Resource::Transactions
            | Resource::Summary
            | Resource::Forecast
            | Resource::Unusual
            | Resource::DataPresence => Domain::Transactions,
            Resource::Feedback => Domain::Feedback,
            Resource::Trends => Domain::Trends,
            Resource::Places => Domain::Explore,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Transactions => "transactions",
            Resource::Summary => "summary",
            Resource::Forecast => "forecast",
            Resource::Unusual => "unusual",
            Resource::DataPresence => "data-presence",
            Resource::Feedback => "feedback",
            Resource::Trends => "trends",
            Resource::Places => "places",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    FetchStarted,
    Loaded,
    Failed(String),
    Cleared,
    ErrorCleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceEvent {
    pub resource: Resource,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SliceEvent) + Send + Sync>;

#[derive(Default)]
pub struct Observers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&SliceEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every current subscriber, in subscription order.
    ///
    /// The registry lock is released before callbacks run, so a listener may
    /// read the store or unsubscribe itself.
    pub fn notify(&self, event: &SliceEvent) {
        let snapshot: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers").field("listeners", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: ChangeKind) -> SliceEvent {
        SliceEvent {
            resource: Resource::Feedback,
            kind,
        }
    }

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let obs = Observers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = obs.subscribe(move |e| sink.lock().unwrap().push(e.kind.clone()));
        assert_eq!(obs.len(), 1);

        obs.notify(&event(ChangeKind::FetchStarted));
        obs.notify(&event(ChangeKind::Loaded));
        assert!(obs.unsubscribe(id));
        assert!(!obs.unsubscribe(id));
        obs.notify(&event(ChangeKind::Cleared));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ChangeKind::FetchStarted, ChangeKind::Loaded]
        );
        assert!(obs.is_empty());
    }

    #[test]
    fn test_listener_may_unsubscribe_during_notify() {
        let obs = Arc::new(Observers::new());
        let handle = Arc::clone(&obs);
        let id_cell: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let id_for_listener = Arc::clone(&id_cell);

        let id = obs.subscribe(move |_| {
            if let Some(id) = *id_for_listener.lock().unwrap() {
                handle.unsubscribe(id);
            }
        });
        *id_cell.lock().unwrap() = Some(id);

        obs.notify(&event(ChangeKind::Loaded));
        assert!(obs.is_empty());
    }

    #[test]
    fn test_resource_domains() {
        assert_eq!(Resource::Summary.domain(), Domain::Transactions);
        assert_eq!(Resource::Trends.domain(), Domain::Trends);
        assert_eq!(Resource::Places.domain(), Domain::Explore);
    }
}

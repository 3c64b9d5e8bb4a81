//! Domain store: one slice per domain, each owning its cached data.
//!
//! A [`Store`] is an ordinary value. Whoever drives the session creates one
//! and passes `&Store` into every orchestrator call; tests create a fresh
//! one each. Slices use short internal locks that are never held across an
//! `.await`, so two fetches on the same resource land in completion order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::aggregation::{DEFAULT_TOP_N, DerivedViews, ViewMemo};
use crate::explore::NearbyPlaces;
use crate::month::MonthFilter;
use crate::observer::{ChangeKind, Observers, Resource, SliceEvent, SubscriptionId};
use crate::reports::{
    DataPresence, FeedbackReport, Forecast, Summary, TrendRecord, TrendsReport, UnusualTransaction,
};
use crate::state::{CachePayload, DomainState, EmptyResultPolicy};
use crate::transaction::Transaction;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One cached resource inside a slice.
///
/// Every mutation notifies the owning slice's observers after the lock is
/// released.
#[derive(Debug)]
pub struct ResourceCell<T> {
    resource: Resource,
    state: Mutex<DomainState<T>>,
    observers: Arc<Observers>,
}

impl<T: Default> ResourceCell<T> {
    fn new(resource: Resource, observers: Arc<Observers>) -> Self {
        Self {
            resource,
            state: Mutex::new(DomainState::default()),
            observers,
        }
    }

    /// Drop cached data and return to `NotFetched`.
    pub fn clear(&self) {
        self.mutate(ChangeKind::Cleared, |s| s.clear());
    }
}

impl<T> ResourceCell<T> {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn read<R>(&self, f: impl FnOnce(&DomainState<T>) -> R) -> R {
        f(&lock(&self.state))
    }

    pub fn snapshot(&self) -> DomainState<T>
    where
        T: Clone,
    {
        self.read(|s| s.clone())
    }

    pub fn data(&self) -> T
    where
        T: Clone,
    {
        self.read(|s| s.data.clone())
    }

    pub fn is_warm(&self, policy: EmptyResultPolicy) -> bool
    where
        T: CachePayload,
    {
        self.read(|s| s.is_warm(policy))
    }

    pub fn begin(&self) {
        self.mutate(ChangeKind::FetchStarted, |s| s.begin());
    }

    pub fn succeed(&self, data: T) {
        self.mutate(ChangeKind::Loaded, |s| s.succeed(data));
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        let kind = ChangeKind::Failed(message.clone());
        self.mutate(kind, |s| s.fail(message));
    }

    pub fn clear_error(&self) {
        self.mutate(ChangeKind::ErrorCleared, |s| s.clear_error());
    }

    fn mutate(&self, kind: ChangeKind, f: impl FnOnce(&mut DomainState<T>)) {
        {
            let mut state = lock(&self.state);
            f(&mut state);
        }
        self.observers.notify(&SliceEvent {
            resource: self.resource,
            kind,
        });
    }
}

/// Cached transaction list together with the query that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionList {
    pub expenses_only: bool,
    pub items: Arc<Vec<Transaction>>,
}

impl TransactionList {
    pub fn new(expenses_only: bool, items: Vec<Transaction>) -> Self {
        Self {
            expenses_only,
            items: Arc::new(items),
        }
    }
}

impl CachePayload for TransactionList {
    fn is_empty_payload(&self) -> bool {
        self.items.is_empty()
    }
}

/// The transactions domain: the raw list plus everything the server derives
/// from it.
#[derive(Debug)]
pub struct TransactionsSlice {
    observers: Arc<Observers>,
    pub list: ResourceCell<TransactionList>,
    pub summary: ResourceCell<Option<Summary>>,
    pub forecast: ResourceCell<Option<Forecast>>,
    pub unusual: ResourceCell<Vec<UnusualTransaction>>,
    pub presence: ResourceCell<Option<DataPresence>>,
    memo: Mutex<ViewMemo>,
}

impl TransactionsSlice {
    pub fn new(top_n: usize) -> Self {
        let observers = Arc::new(Observers::new());
        Self {
            list: ResourceCell::new(Resource::Transactions, Arc::clone(&observers)),
            summary: ResourceCell::new(Resource::Summary, Arc::clone(&observers)),
            forecast: ResourceCell::new(Resource::Forecast, Arc::clone(&observers)),
            unusual: ResourceCell::new(Resource::Unusual, Arc::clone(&observers)),
            presence: ResourceCell::new(Resource::DataPresence, Arc::clone(&observers)),
            memo: Mutex::new(ViewMemo::new(top_n)),
            observers,
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&SliceEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Currently cached transactions (shared, never copied).
    pub fn items(&self) -> Arc<Vec<Transaction>> {
        self.list.read(|s| Arc::clone(&s.data.items))
    }

    /// Dashboard views over the cached list, memoized on the list identity.
    pub fn views(&self, filter: &MonthFilter) -> Arc<DerivedViews> {
        let items = self.items();
        lock(&self.memo).views(&items, filter)
    }

    pub fn view_computations(&self) -> usize {
        lock(&self.memo).computations()
    }

    /// Empty the list and every server-derived resource of this domain.
    pub fn invalidate(&self) {
        self.list.clear();
        self.summary.clear();
        self.forecast.clear();
        self.unusual.clear();
        self.presence.clear();
        lock(&self.memo).reset();
    }
}

impl Default for TransactionsSlice {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

/// A domain with a single cached report.
#[derive(Debug)]
pub struct DomainSlice<T> {
    observers: Arc<Observers>,
    pub state: ResourceCell<T>,
}

impl<T: Default> DomainSlice<T> {
    pub fn new(resource: Resource) -> Self {
        let observers = Arc::new(Observers::new());
        Self {
            state: ResourceCell::new(resource, Arc::clone(&observers)),
            observers,
        }
    }

    /// Drop the cached report.
    pub fn clear(&self) {
        self.state.clear();
    }
}

impl<T> DomainSlice<T> {
    pub fn subscribe(&self, listener: impl Fn(&SliceEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

pub type FeedbackSlice = DomainSlice<FeedbackReport>;
pub type TrendsSlice = DomainSlice<TrendsReport>;
pub type ExploreSlice = DomainSlice<Option<NearbyPlaces>>;

impl DomainSlice<TrendsReport> {
    /// Cached trends in display order.
    pub fn sorted_trends(&self) -> Vec<TrendRecord> {
        self.state.read(|s| s.data.sorted_trends())
    }
}

/// All session state for one dashboard.
#[derive(Debug)]
pub struct Store {
    pub transactions: TransactionsSlice,
    pub feedback: FeedbackSlice,
    pub trends: TrendsSlice,
    pub explore: ExploreSlice,
}

impl Store {
    pub fn new() -> Self {
        Self::with_top_n(DEFAULT_TOP_N)
    }

    /// Store whose top-spending view ranks `top_n` categories.
    pub fn with_top_n(top_n: usize) -> Self {
        Self {
            transactions: TransactionsSlice::new(top_n),
            feedback: DomainSlice::new(Resource::Feedback),
            trends: DomainSlice::new(Resource::Trends),
            explore: DomainSlice::new(Resource::Places),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

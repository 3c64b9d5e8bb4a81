//! Per-resource cache state: data, loading flag, last error, fetch status.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Whether a resource has ever been populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Never fetched, or cleared since.
    #[default]
    NotFetched,
    /// At least one fetch completed successfully since the last clear.
    Fetched,
    /// Every attempt since the last clear failed.
    Failed,
}

/// How a successful-but-empty result is treated on the next read.
///
/// `Trust` caches it like any other result; `Retry` treats an empty cache as
/// cold and fetches again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResultPolicy {
    #[default]
    Trust,
    Retry,
}

/// Emptiness test used by [`EmptyResultPolicy::Retry`].
pub trait CachePayload {
    fn is_empty_payload(&self) -> bool;
}

impl<T> CachePayload for Vec<T> {
    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }
}

impl<T> CachePayload for Option<T> {
    fn is_empty_payload(&self) -> bool {
        self.is_none()
    }
}

impl<T: CachePayload> CachePayload for Arc<T> {
    fn is_empty_payload(&self) -> bool {
        self.as_ref().is_empty_payload()
    }
}

/// Cached data for one resource plus its fetch bookkeeping.
///
/// `data` is always replaced wholesale by the most recently completed fetch.
/// A failed fetch leaves `data` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainState<T> {
    pub data: T,
    /// True while at least one remote call for this resource is in flight.
    pub loading: bool,
    pub error: Option<String>,
    pub status: FetchStatus,
    in_flight: usize,
}

impl<T: Default> Default for DomainState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
            status: FetchStatus::NotFetched,
            in_flight: 0,
        }
    }
}

impl<T> DomainState<T> {
    /// Can a read be answered without a network call?
    pub fn is_warm(&self, policy: EmptyResultPolicy) -> bool
    where
        T: CachePayload,
    {
        match (self.status, policy) {
            (FetchStatus::Fetched, EmptyResultPolicy::Trust) => true,
            (FetchStatus::Fetched, EmptyResultPolicy::Retry) => !self.data.is_empty_payload(),
            _ => false,
        }
    }

    /// A fetch attempt started.
    pub fn begin(&mut self) {
        self.in_flight += 1;
        self.loading = true;
        self.error = None;
    }

    /// A fetch attempt completed with data.
    pub fn succeed(&mut self, data: T) {
        self.settle();
        self.data = data;
        self.error = None;
        self.status = FetchStatus::Fetched;
    }

    /// A fetch attempt failed; cached data stays as it was.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.settle();
        self.error = Some(message.into());
        if self.status != FetchStatus::Fetched {
            self.status = FetchStatus::Failed;
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop cached data and return to `NotFetched`.
    ///
    /// In-flight attempts keep counting: one that completes later still lands.
    pub fn clear(&mut self)
    where
        T: Default,
    {
        self.data = T::default();
        self.error = None;
        self.status = FetchStatus::NotFetched;
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
    }
}

//! Cache-first reads against the remote API.
//!
//! Every read checks its resource cell first and only goes to the network on
//! a miss or a forced refresh. The store is passed in explicitly; nothing here
//! holds a lock across an `.await`.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use fincoach_core::{
    CachePayload, CoachError, CoachResult, DataPresence, EmptyResultPolicy, FeedbackReport, FetchStatus,
    Forecast,
    ResourceCell, Store, Summary, Transaction, TransactionList, TrendsReport, UnusualTransaction,
    UploadReceipt,
};

use fincoach_ingest::{UploadPreview, check_extension, parse_statement_csv};

use crate::api::RemoteApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Remote,
}

/// Result of a read, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    pub source: Source,
    pub data: T,
}

impl<T> FetchOutcome<T> {
    pub fn is_cache_hit(&self) -> bool {
        self.source == Source::Cache
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        FetchOutcome {
            source: self.source,
            data: f(self.data),
        }
    }
}

/// Whether a read may be answered from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    CacheFirst,
    Refresh,
}

/// Drives reads and writes for one dashboard session.
#[derive(Debug, Clone)]
pub struct Orchestrator<A: RemoteApi> {
    api: A,
    policy: EmptyResultPolicy,
}

impl<A: RemoteApi> Orchestrator<A> {
    pub fn new(api: A) -> Self {
        Self::with_policy(api, EmptyResultPolicy::default())
    }

    pub fn with_policy(api: A, policy: EmptyResultPolicy) -> Self {
        Self { api, policy }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn policy(&self) -> EmptyResultPolicy {
        self.policy
    }

    async fn load<T, Fut>(
        &self,
        cell: &ResourceCell<T>,
        mode: Mode,
        matches: impl Fn(&T) -> bool,
        fetch: impl FnOnce() -> Fut,
    ) -> CoachResult<FetchOutcome<T>>
    where
        T: Clone + CachePayload,
        Fut: Future<Output = CoachResult<T>>,
    {
        let resource = cell.resource().name();
        if mode == Mode::CacheFirst {
            let hit = cell.read(|s| (s.is_warm(self.policy) && matches(&s.data)).then(|| s.data.clone()));
            if let Some(data) = hit {
                debug!(resource, "cache hit");
                return Ok(FetchOutcome {
                    source: Source::Cache,
                    data,
                });
            }
            debug!(resource, "cache miss");
        }

        cell.begin();
        match fetch().await {
            Ok(data) => {
                info!(resource, "loaded from remote");
                cell.succeed(data.clone());
                Ok(FetchOutcome {
                    source: Source::Remote,
                    data,
                })
            }
            Err(e) => {
                warn!(resource, error = %e, "remote fetch failed");
                cell.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn load_transactions(
        &self,
        store: &Store,
        expenses_only: bool,
        mode: Mode,
    ) -> CoachResult<FetchOutcome<Arc<Vec<Transaction>>>> {
        let outcome = self
            .load(
                &store.transactions.list,
                mode,
                |cached: &TransactionList| cached.expenses_only == expenses_only,
                || async move {
                    self.api
                        .transactions(expenses_only)
                        .await
                        .map(|items| TransactionList::new(expenses_only, items))
                },
            )
            .await?;
        Ok(outcome.map(|list| list.items))
    }

    /// Transaction list, from cache when it was loaded with the same
    /// `expenses_only` flag.
    pub async fn get_transactions(
        &self,
        store: &Store,
        expenses_only: bool,
    ) -> CoachResult<FetchOutcome<Arc<Vec<Transaction>>>> {
        self.load_transactions(store, expenses_only, Mode::CacheFirst)
            .await
    }

    pub async fn refresh_transactions(
        &self,
        store: &Store,
        expenses_only: bool,
    ) -> CoachResult<FetchOutcome<Arc<Vec<Transaction>>>> {
        self.load_transactions(store, expenses_only, Mode::Refresh)
            .await
    }

    async fn load_summary(&self, store: &Store, mode: Mode) -> CoachResult<FetchOutcome<Summary>> {
        let outcome = self
            .load(&store.transactions.summary, mode, |_| true, || async {
                self.api.summary().await.map(Some)
            })
            .await?;
        Ok(outcome.map(Option::unwrap_or_default))
    }

    pub async fn get_summary(&self, store: &Store) -> CoachResult<FetchOutcome<Summary>> {
        self.load_summary(store, Mode::CacheFirst).await
    }

    pub async fn refresh_summary(&self, store: &Store) -> CoachResult<FetchOutcome<Summary>> {
        self.load_summary(store, Mode::Refresh).await
    }

    async fn load_forecast(&self, store: &Store, mode: Mode) -> CoachResult<FetchOutcome<Forecast>> {
        let outcome = self
            .load(&store.transactions.forecast, mode, |_| true, || async {
                self.api.forecast().await.map(Some)
            })
            .await?;
        Ok(outcome.map(Option::unwrap_or_default))
    }

    pub async fn get_forecast(&self, store: &Store) -> CoachResult<FetchOutcome<Forecast>> {
        self.load_forecast(store, Mode::CacheFirst).await
    }

    pub async fn refresh_forecast(&self, store: &Store) -> CoachResult<FetchOutcome<Forecast>> {
        self.load_forecast(store, Mode::Refresh).await
    }

    async fn load_unusual(
        &self,
        store: &Store,
        mode: Mode,
    ) -> CoachResult<FetchOutcome<Vec<UnusualTransaction>>> {
        self.load(&store.transactions.unusual, mode, |_| true, || {
            self.api.unusual()
        })
        .await
    }

    pub async fn get_unusual(&self, store: &Store) -> CoachResult<FetchOutcome<Vec<UnusualTransaction>>> {
        self.load_unusual(store, Mode::CacheFirst).await
    }

    pub async fn refresh_unusual(
        &self,
        store: &Store,
    ) -> CoachResult<FetchOutcome<Vec<UnusualTransaction>>> {
        self.load_unusual(store, Mode::Refresh).await
    }

    async fn load_presence(&self, store: &Store, mode: Mode) -> CoachResult<FetchOutcome<DataPresence>> {
        let outcome = self
            .load(&store.transactions.presence, mode, |_| true, || async {
                self.api.data_presence().await.map(Some)
            })
            .await?;
        Ok(outcome.map(Option::unwrap_or_default))
    }

    /// Does the server hold any transactions?
    ///
    /// A loaded, non-empty transaction list already answers yes.
    pub async fn check_data_presence(&self, store: &Store) -> CoachResult<FetchOutcome<DataPresence>> {
        let cached = store.transactions.list.read(|s| {
            (s.status == FetchStatus::Fetched && !s.data.items.is_empty()).then(|| s.data.items.len())
        });
        if let Some(count) = cached {
            debug!(count, "presence answered from cached transactions");
            return Ok(FetchOutcome {
                source: Source::Cache,
                data: DataPresence {
                    has_data: true,
                    count: Some(count as u64),
                },
            });
        }
        self.load_presence(store, Mode::CacheFirst).await
    }

    pub async fn refresh_data_presence(
        &self,
        store: &Store,
    ) -> CoachResult<FetchOutcome<DataPresence>> {
        self.load_presence(store, Mode::Refresh).await
    }

    pub async fn get_feedback(&self, store: &Store) -> CoachResult<FetchOutcome<FeedbackReport>> {
        self.load(&store.feedback.state, Mode::CacheFirst, |_| true, || {
            self.api.feedback()
        })
        .await
    }

    pub async fn refresh_feedback(&self, store: &Store) -> CoachResult<FetchOutcome<FeedbackReport>> {
        self.load(&store.feedback.state, Mode::Refresh, |_| true, || {
            self.api.feedback()
        })
        .await
    }

    pub async fn get_trends(&self, store: &Store) -> CoachResult<FetchOutcome<TrendsReport>> {
        self.load(&store.trends.state, Mode::CacheFirst, |_| true, || {
            self.api.trends()
        })
        .await
    }

    pub async fn refresh_trends(&self, store: &Store) -> CoachResult<FetchOutcome<TrendsReport>> {
        self.load(&store.trends.state, Mode::Refresh, |_| true, || {
            self.api.trends()
        })
        .await
    }

    /// Delete every transaction on the server.
    ///
    /// On success the transactions domain is emptied and the feedback and
    /// trends reports are cleared. On failure every cache is left as it was.
    pub async fn delete_all(&self, store: &Store) -> CoachResult<Option<String>> {
        match self.api.delete_all().await {
            Ok(message) => {
                info!(message = message.as_deref().unwrap_or(""), "deleted all transactions");
                store.transactions.invalidate();
                store.feedback.clear();
                store.trends.clear();
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "delete-all failed, cache kept");
                Err(e)
            }
        }
    }

    /// Upload a CSV statement. A successful upload invalidates everything
    /// computed from the old transaction set.
    pub async fn upload(
        &self,
        store: &Store,
        file_name: impl Into<String>,
        contents: Vec<u8>,
    ) -> CoachResult<UploadReceipt> {
        let file_name = file_name.into();
        match self.api.upload(file_name.clone(), contents).await {
            Ok(receipt) => {
                info!(
                    file = %file_name,
                    added = receipt.transactions_added,
                    "upload accepted"
                );
                store.transactions.invalidate();
                store.feedback.clear();
                store.trends.clear();
                Ok(receipt)
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "upload failed");
                Err(e)
            }
        }
    }

    /// Validate a statement file locally, then upload it.
    ///
    /// Nothing is sent unless the file passes validation with at least one
    /// usable row.
    pub async fn upload_statement(
        &self,
        store: &Store,
        path: &Path,
    ) -> CoachResult<(UploadPreview, UploadReceipt)> {
        check_extension(path).map_err(|e| CoachError::InvalidInput(e.to_string()))?;
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| CoachError::InvalidInput(format!("reading {}: {e}", path.display())))?;
        // validate the exact bytes that get uploaded
        let text = std::str::from_utf8(&contents)
            .map_err(|_| CoachError::InvalidInput(format!("{} is not UTF-8", path.display())))?;
        let preview = parse_statement_csv(text).map_err(|e| {
            CoachError::InvalidInput(format!("validating {}: {e:#}", path.display()))
        })?;
        if preview.rows.is_empty() {
            return Err(CoachError::InvalidInput(format!(
                "{} has no usable rows ({} skipped)",
                path.display(),
                preview.skipped.len()
            )));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement.csv".to_string());
        let receipt = self.upload(store, file_name, contents).await?;
        Ok((preview, receipt))
    }
}

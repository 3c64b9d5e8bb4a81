//! Remote dashboard API: the trait the orchestrator talks to, and its HTTP
//! implementation.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use fincoach_core::{
    CoachError, CoachResult, DataPresence, FeedbackReport, Forecast, Summary, Transaction,
    TrendsReport, UnusualTransaction, UploadReceipt,
};

use crate::schema::{
    WireFeedback, WireForecast, WireMessage, WirePresence, WireSummary, WireTransaction,
    WireTrends, WireUnusual, WireUpload, error_detail, transactions_from_wire,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const PATH_EXISTS: &str = "/api/transactions/exists";
pub const PATH_TRANSACTIONS: &str = "/api/transactions";
pub const PATH_SUMMARY: &str = "/api/transactions/summary";
pub const PATH_FORECAST: &str = "/api/forecast/monthly";
pub const PATH_FEEDBACK: &str = "/api/general-feedback";
pub const PATH_TRENDS: &str = "/api/general-feedback-trends";
pub const PATH_UNUSUAL: &str = "/api/fraud-detections";
pub const PATH_DELETE_ALL: &str = "/api/transactions/all";
pub const PATH_UPLOAD: &str = "/api/transactions/upload";

/// Every call the dashboard makes against its backend.
///
/// Implementations return decoded domain values; transport and status
/// failures become [`CoachError::Network`], undecodable bodies
/// [`CoachError::Malformed`].
pub trait RemoteApi: Send + Sync {
    fn data_presence(&self) -> impl Future<Output = CoachResult<DataPresence>> + Send;

    fn transactions(
        &self,
        expenses_only: bool,
    ) -> impl Future<Output = CoachResult<Vec<Transaction>>> + Send;

    fn summary(&self) -> impl Future<Output = CoachResult<Summary>> + Send;

    fn forecast(&self) -> impl Future<Output = CoachResult<Forecast>> + Send;

    fn feedback(&self) -> impl Future<Output = CoachResult<FeedbackReport>> + Send;

    fn trends(&self) -> impl Future<Output = CoachResult<TrendsReport>> + Send;

    fn unusual(&self) -> impl Future<Output = CoachResult<Vec<UnusualTransaction>>> + Send;

    /// Delete every stored transaction. Returns the server's message, if any.
    fn delete_all(&self) -> impl Future<Output = CoachResult<Option<String>>> + Send;

    fn upload(
        &self,
        file_name: String,
        contents: Vec<u8>,
    ) -> impl Future<Output = CoachResult<UploadReceipt>> + Send;
}

/// reqwest-backed client for a dashboard server at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CoachResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Network(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Body of a successful response; any other status is a `Network` error.
    async fn body(endpoint: &str, resp: reqwest::Response) -> CoachResult<String> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoachError::Network(format!("{endpoint}: {e}")))?;
        if !status.is_success() {
            return Err(CoachError::Network(format!(
                "{endpoint}: {status} {}",
                error_detail(&body)
            )));
        }
        Ok(body)
    }

    async fn decode<W: DeserializeOwned>(endpoint: &str, resp: reqwest::Response) -> CoachResult<W> {
        let body = Self::body(endpoint, resp).await?;
        serde_json::from_str(&body).map_err(|e| CoachError::malformed(endpoint, e))
    }

    async fn get_json<W: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> CoachResult<W> {
        debug!(path, "GET");
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| CoachError::Network(format!("{path}: {e}")))?;
        Self::decode(path, resp).await
    }
}

impl RemoteApi for HttpApi {
    async fn data_presence(&self) -> CoachResult<DataPresence> {
        let w: WirePresence = self.get_json(PATH_EXISTS, &[]).await?;
        Ok(w.into())
    }

    async fn transactions(&self, expenses_only: bool) -> CoachResult<Vec<Transaction>> {
        let query = [("expenses_only", expenses_only.to_string())];
        let w: Vec<WireTransaction> = self.get_json(PATH_TRANSACTIONS, &query).await?;
        transactions_from_wire(PATH_TRANSACTIONS, w)
    }

    async fn summary(&self) -> CoachResult<Summary> {
        let w: WireSummary = self.get_json(PATH_SUMMARY, &[]).await?;
        Ok(w.into())
    }

    async fn forecast(&self) -> CoachResult<Forecast> {
        let w: WireForecast = self.get_json(PATH_FORECAST, &[]).await?;
        Ok(w.into())
    }

    async fn feedback(&self) -> CoachResult<FeedbackReport> {
        let w: WireFeedback = self.get_json(PATH_FEEDBACK, &[]).await?;
        Ok(w.into())
    }

    async fn trends(&self) -> CoachResult<TrendsReport> {
        let w: WireTrends = self.get_json(PATH_TRENDS, &[]).await?;
        Ok(w.into())
    }

    async fn unusual(&self) -> CoachResult<Vec<UnusualTransaction>> {
        let w: Vec<WireUnusual> = self.get_json(PATH_UNUSUAL, &[]).await?;
        Ok(w.into_iter().map(Into::into).collect())
    }

    async fn delete_all(&self) -> CoachResult<Option<String>> {
        info!(path = PATH_DELETE_ALL, "DELETE");
        let resp = self
            .client
            .delete(self.url(PATH_DELETE_ALL))
            .send()
            .await
            .map_err(|e| CoachError::Network(format!("{PATH_DELETE_ALL}: {e}")))?;
        // any 2xx means the rows are gone; the body is optional
        let body = Self::body(PATH_DELETE_ALL, resp).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<WireMessage>(&body) {
            Ok(w) => Ok(w.message),
            Err(e) => {
                debug!(path = PATH_DELETE_ALL, error = %e, "ignoring non-JSON delete body");
                Ok(None)
            }
        }
    }

    async fn upload(&self, file_name: String, contents: Vec<u8>) -> CoachResult<UploadReceipt> {
        info!(path = PATH_UPLOAD, file = %file_name, bytes = contents.len(), "POST");
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| CoachError::InvalidInput(e.to_string()))?;
        let form = Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url(PATH_UPLOAD))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoachError::Network(format!("{PATH_UPLOAD}: {e}")))?;
        let w: WireUpload = Self::decode(PATH_UPLOAD, resp).await?;
        Ok(w.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpApi::new("http://example.test:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://example.test:8000");
        assert_eq!(api.url(PATH_SUMMARY), "http://example.test:8000/api/transactions/summary");
    }
}

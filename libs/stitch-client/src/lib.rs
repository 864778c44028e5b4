use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use stitch_api::{BatchPayload, IngestError};

/// Base URL of the Stitch API, without trailing slash.
pub const DEFAULT_BASE_URL: &str = "https://api.stitchdata.com";
pub const IMPORT_BATCH_PATH: &str = "/v2/import/batch";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Ответ API на принятый batch.
///
/// `body` holds the response decoded as a string map (`status`, `message`);
/// it is empty when the body has another shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReceipt {
    pub status: u16,
    pub body: BTreeMap<String, String>,
}

/// HTTP client for the batch import endpoint.
///
/// Batches are sent one request each, strictly in order. No retries.
pub struct ImportClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ImportClient {
    pub fn new(config: ClientConfig) -> Result<Self, IngestError> {
        if config.token.is_empty() {
            return Err(IngestError::config("API token is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IngestError::config(format!("HTTP client: {e}")))?;
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            endpoint: format!("{base}{IMPORT_BATCH_PATH}"),
            token: config.token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, payload: &BatchPayload) -> Result<ImportReceipt, IngestError> {
        let body = payload.to_json()?;
        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .body(body)
            .send()
            .await
            .map_err(|e| IngestError::io(format!("import request: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| IngestError::io(format!("import read: {e}")))?;

        if !status.is_success() {
            return Err(IngestError::Rejected { status: status.as_u16(), body: text });
        }

        Ok(ImportReceipt {
            status: status.as_u16(),
            body: serde_json::from_str(&text).unwrap_or_default(),
        })
    }

    /// Send every payload in order, stopping at the first failure.
    pub async fn send_all(&self, payloads: &[BatchPayload]) -> Result<Vec<ImportReceipt>, IngestError> {
        let mut receipts = Vec::with_capacity(payloads.len());
        for (i, payload) in payloads.iter().enumerate() {
            let receipt = self.send(payload).await.inspect_err(|e| {
                tracing::error!(batch = i, table = %payload.table_name, error = %e, "batch not accepted");
            })?;
            tracing::info!(
                batch = i,
                table = %payload.table_name,
                records = payload.messages.len(),
                status = receipt.status,
                "batch accepted"
            );
            receipts.push(receipt);
        }
        Ok(receipts)
    }
}

//! HTTP client for the knaps API.
//!
//! Unwraps the `{data, meta}` success envelope and turns the `{error, meta}`
//! envelope into [`ClientError::Api`].

use std::time::Duration;

use knaps_core::{FieldError, OverallAnalytics, ProductAnalytics};
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered with its error envelope.
    #[error("server returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected response body for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkSummary {
    pub success: usize,
    pub errors: usize,
    #[serde(default)]
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkFailure {
    pub row: usize,
    pub error: String,
    #[serde(default)]
    pub details: Vec<FieldError>,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("knaps-cli/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned),
        })
    }

    /// POST a product CSV to the bulk import endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or an error envelope.
    pub async fn upload_products_csv(&self, csv: String) -> Result<BulkSummary, ClientError> {
        let url = self.url("api/v1/products/bulk/csv", &[])?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/csv")
            .body(csv);
        self.send(request, "products/bulk/csv").await
    }

    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or an error envelope.
    pub async fn product_analytics(
        &self,
        product_id: Option<i64>,
        month: Option<&str>,
    ) -> Result<Vec<ProductAnalytics>, ClientError> {
        let product_id = product_id.map(|id| id.to_string());
        let mut params = Vec::new();
        if let Some(id) = product_id.as_deref() {
            params.push(("product_id", id));
        }
        if let Some(month) = month {
            params.push(("month", month));
        }
        let url = self.url("api/v1/analytics/products", &params)?;
        self.send(self.client.get(url), "analytics/products").await
    }

    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or an error envelope.
    pub async fn overall_analytics(
        &self,
        month: Option<&str>,
    ) -> Result<OverallAnalytics, ClientError> {
        let params: Vec<(&str, &str)> = month.map(|m| ("month", m)).into_iter().collect();
        let url = self.url("api/v1/analytics/overall", &params)?;
        self.send(self.client.get(url), "analytics/overall").await
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends the request with the bearer token and unwraps the envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => ClientError::Api {
                    status: status.as_u16(),
                    code: envelope.error.code,
                    message: envelope.error.message,
                },
                Err(_) => ClientError::Api {
                    status: status.as_u16(),
                    code: "unknown".to_string(),
                    message: body,
                },
            });
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| ClientError::Deserialize {
                context: context.to_string(),
                source: e,
            })
    }
}

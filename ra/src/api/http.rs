//! HTTP implementation of the ChurnApi trait
//!
//! Talks to the RetentionAI backend: form-encoded token exchange, JSON
//! everywhere else, bearer auth on the analysis endpoints. No retries; a
//! failed call is reported once and the caller decides what to show.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ApiError, ChurnApi, Credentials, ErrorBody, HealthResponse, PredictionResponse, RetentionPlanResponse,
    TokenResponse,
};
use crate::config::ApiConfig;
use crate::record::EmployeeRecord;

/// HTTP client for the RetentionAI backend
pub struct HttpChurnApi {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpChurnApi {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and map transport failures
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                debug!(timeout = ?self.timeout, "send: timed out");
                ApiError::Timeout(self.timeout)
            } else {
                debug!(error = %e, "send: network error");
                ApiError::Network(e)
            }
        })
    }

    /// Turn a non-2xx response into an error carrying the server's detail
    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = ErrorBody::parse(&text).message();
        debug!(status = status.as_u16(), ?detail, "check: API error");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized { message: detail });
        }
        Err(ApiError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Network(e)
            }
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post_record<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        record: &EmployeeRecord,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).bearer_auth(token).json(record);
        let response = self.send(request).await?;
        let response = self.check(response).await?;
        self.decode(response).await
    }
}

#[async_trait]
impl ChurnApi for HttpChurnApi {
    async fn request_token(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        debug!(%username, "request_token: called");
        let request = self
            .http
            .post(self.url("/auth/token"))
            .form(&[("username", username), ("password", password)]);

        let response = self.send(request).await?;
        let response = self.check(response).await?;
        let token: TokenResponse = self.decode(response).await?;
        if token.access_token.is_empty() {
            return Err(ApiError::InvalidResponse("empty access_token".to_string()));
        }
        debug!("request_token: success");
        Ok(token)
    }

    async fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        debug!(%username, "register: called");
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&Credentials { username, password });

        let response = self.send(request).await?;
        self.check(response).await?;
        debug!("register: success");
        Ok(())
    }

    async fn predict(&self, token: &str, record: &EmployeeRecord) -> Result<PredictionResponse, ApiError> {
        debug!("predict: called");
        let prediction: PredictionResponse = self.post_record("/predict", token, record).await?;
        if !prediction.churn_probability.is_finite() {
            return Err(ApiError::InvalidResponse("churn_probability is not a number".to_string()));
        }
        debug!(churn_probability = prediction.churn_probability, "predict: success");
        Ok(prediction)
    }

    async fn retention_plan(&self, token: &str, record: &EmployeeRecord) -> Result<RetentionPlanResponse, ApiError> {
        debug!("retention_plan: called");
        let plan: RetentionPlanResponse = self.post_record("/generate-retention-plan", token, record).await?;
        debug!(plan_len = plan.retention_plan.len(), "retention_plan: success");
        Ok(plan)
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        debug!("health: called");
        let response = self.send(self.http.get(self.url("/health"))).await?;
        let response = self.check(response).await?;
        self.decode(response).await
    }
}

//! Prediction service client
//!
//! [`ChurnApi`] is the seam between the workflows and the network;
//! [`HttpChurnApi`] is the real implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod http;
mod types;

pub use client::ChurnApi;
#[cfg(test)]
pub use client::mock;
pub use error::ApiError;
pub use http::HttpChurnApi;
pub use types::{
    Credentials, ErrorBody, HealthResponse, PredictionResponse, RetentionPlanResponse, TokenResponse,
};

use crate::config::ApiConfig;

/// Create the HTTP client behind a shared trait object
pub fn create_client(config: &ApiConfig) -> Result<Arc<dyn ChurnApi>, ApiError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(HttpChurnApi::from_config(config)?))
}

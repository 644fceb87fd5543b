//! ChurnApi trait definition

use async_trait::async_trait;

use super::{ApiError, HealthResponse, PredictionResponse, RetentionPlanResponse, TokenResponse};
use crate::record::EmployeeRecord;

/// Client for the prediction service
///
/// Every call is independent; authenticated calls take the bearer token
/// explicitly so the client never holds session state of its own.
#[async_trait]
pub trait ChurnApi: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn request_token(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// Create an account; the response body is ignored
    async fn register(&self, username: &str, password: &str) -> Result<(), ApiError>;

    /// Score a record
    async fn predict(&self, token: &str, record: &EmployeeRecord) -> Result<PredictionResponse, ApiError>;

    /// Generate a retention plan for a record
    async fn retention_plan(&self, token: &str, record: &EmployeeRecord) -> Result<RetentionPlanResponse, ApiError>;

    /// Service liveness
    async fn health(&self) -> Result<HealthResponse, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted API for unit tests
    ///
    /// Each endpoint pops from its own queue; an exhausted queue yields
    /// `InvalidResponse`.
    #[derive(Default)]
    pub struct MockChurnApi {
        tokens: Mutex<VecDeque<Result<TokenResponse, ApiError>>>,
        registrations: Mutex<VecDeque<Result<(), ApiError>>>,
        predictions: Mutex<VecDeque<Result<PredictionResponse, ApiError>>>,
        plans: Mutex<VecDeque<Result<RetentionPlanResponse, ApiError>>>,
        token_calls: AtomicUsize,
        register_calls: AtomicUsize,
        predict_calls: AtomicUsize,
        plan_calls: AtomicUsize,
        last_token: Mutex<Option<String>>,
    }

    impl MockChurnApi {
        pub fn new() -> Self {
            debug!("MockChurnApi::new: called");
            Self::default()
        }

        pub fn with_token(self, result: Result<TokenResponse, ApiError>) -> Self {
            push(&self.tokens, result);
            self
        }

        pub fn with_registration(self, result: Result<(), ApiError>) -> Self {
            push(&self.registrations, result);
            self
        }

        pub fn with_prediction(self, result: Result<PredictionResponse, ApiError>) -> Self {
            push(&self.predictions, result);
            self
        }

        pub fn with_plan(self, result: Result<RetentionPlanResponse, ApiError>) -> Self {
            push(&self.plans, result);
            self
        }

        pub fn token_calls(&self) -> usize {
            self.token_calls.load(Ordering::SeqCst)
        }

        pub fn register_calls(&self) -> usize {
            self.register_calls.load(Ordering::SeqCst)
        }

        pub fn predict_calls(&self) -> usize {
            self.predict_calls.load(Ordering::SeqCst)
        }

        pub fn plan_calls(&self) -> usize {
            self.plan_calls.load(Ordering::SeqCst)
        }

        /// Bearer token seen by the most recent authenticated call
        pub fn last_token(&self) -> Option<String> {
            self.last_token.lock().unwrap().clone()
        }
    }

    /// Successful prediction with only the probability set
    pub fn prediction(churn_probability: f64) -> PredictionResponse {
        PredictionResponse {
            churn_probability,
            risk_level: None,
            prediction: None,
            model_used: None,
        }
    }

    /// Successful plan
    pub fn plan(text: &str) -> RetentionPlanResponse {
        RetentionPlanResponse {
            retention_plan: text.to_string(),
            risk_level: None,
            churn_probability: None,
        }
    }

    /// Successful token
    pub fn token(access_token: &str) -> TokenResponse {
        TokenResponse {
            access_token: access_token.to_string(),
            token_type: Some("bearer".to_string()),
        }
    }

    fn push<T>(queue: &Mutex<VecDeque<T>>, item: T) {
        queue.lock().unwrap().push_back(item);
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, endpoint: &str) -> Result<T, ApiError> {
        queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            debug!(%endpoint, "MockChurnApi: no more mock responses");
            Err(ApiError::InvalidResponse(format!("No more mock responses for {endpoint}")))
        })
    }

    #[async_trait]
    impl ChurnApi for MockChurnApi {
        async fn request_token(&self, _username: &str, _password: &str) -> Result<TokenResponse, ApiError> {
            debug!("MockChurnApi::request_token: called");
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            pop(&self.tokens, "token")
        }

        async fn register(&self, _username: &str, _password: &str) -> Result<(), ApiError> {
            debug!("MockChurnApi::register: called");
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            pop(&self.registrations, "register")
        }

        async fn predict(&self, token: &str, _record: &EmployeeRecord) -> Result<PredictionResponse, ApiError> {
            debug!("MockChurnApi::predict: called");
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock().unwrap() = Some(token.to_string());
            pop(&self.predictions, "predict")
        }

        async fn retention_plan(&self, token: &str, _record: &EmployeeRecord) -> Result<RetentionPlanResponse, ApiError> {
            debug!("MockChurnApi::retention_plan: called");
            self.plan_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_token.lock().unwrap() = Some(token.to_string());
            pop(&self.plans, "plan")
        }

        async fn health(&self) -> Result<HealthResponse, ApiError> {
            debug!("MockChurnApi::health: called");
            Ok(HealthResponse {
                status: "healthy".to_string(),
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_returns_queued_responses() {
            let api = MockChurnApi::new()
                .with_prediction(Ok(prediction(72.5)))
                .with_prediction(Ok(prediction(30.0)));
            let record = EmployeeRecord::default();

            let first = api.predict("tok", &record).await.unwrap();
            assert_eq!(first.churn_probability, 72.5);
            let second = api.predict("tok", &record).await.unwrap();
            assert_eq!(second.churn_probability, 30.0);

            assert_eq!(api.predict_calls(), 2);
            assert_eq!(api.plan_calls(), 0);
            assert_eq!(api.last_token().as_deref(), Some("tok"));
        }

        #[tokio::test]
        async fn test_mock_errors_when_exhausted() {
            let api = MockChurnApi::new();
            let result = api.retention_plan("tok", &EmployeeRecord::default()).await;
            assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
            assert_eq!(api.plan_calls(), 1);
        }
    }
}

//! Wire types for the prediction service

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from `POST /auth/token`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from `POST /predict`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionResponse {
    /// Percentage, 0-100
    pub churn_probability: f64,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub prediction: Option<i64>,
    #[serde(default)]
    pub model_used: Option<String>,
}

/// Response from `POST /generate-retention-plan`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetentionPlanResponse {
    pub retention_plan: String,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub churn_probability: Option<f64>,
}

/// Response from `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body; `detail` is a string, or a list of validation entries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parse a raw body, tolerating anything that isn't JSON
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// Flatten `detail` to a single message
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(entries) => {
                let msgs: Vec<&str> = entries
                    .iter()
                    .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_response_optional_fields() {
        let resp: PredictionResponse = serde_json::from_str(r#"{"churn_probability": 72.5}"#).unwrap();
        assert_eq!(resp.churn_probability, 72.5);
        assert!(resp.risk_level.is_none());
        assert!(resp.model_used.is_none());

        let resp: PredictionResponse = serde_json::from_str(
            r#"{"churn_probability": 30, "risk_level": "Low", "prediction": 0, "model_used": "xgboost"}"#,
        )
        .unwrap();
        assert_eq!(resp.churn_probability, 30.0);
        assert_eq!(resp.risk_level.as_deref(), Some("Low"));
        assert_eq!(resp.prediction, Some(0));
        assert_eq!(resp.model_used.as_deref(), Some("xgboost"));
    }

    #[test]
    fn test_token_response() {
        let resp: TokenResponse = serde_json::from_str(r#"{"access_token": "abc", "token_type": "bearer"}"#).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.token_type.as_deref(), Some("bearer"));

        assert!(serde_json::from_str::<TokenResponse>(r#"{"token_type": "bearer"}"#).is_err());
    }

    #[test]
    fn test_error_body_string_detail() {
        let body = ErrorBody::parse(r#"{"detail": "Invalid credentials"}"#);
        assert_eq!(body.message().as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_error_body_validation_list() {
        let body = ErrorBody::parse(
            r#"{"detail": [{"loc": ["body", "Age"], "msg": "field required", "type": "value_error.missing"},
                           {"loc": ["body", "Gender"], "msg": "value is not a valid enumeration member"}]}"#,
        );
        assert_eq!(
            body.message().as_deref(),
            Some("field required; value is not a valid enumeration member")
        );
    }

    #[test]
    fn test_error_body_unusable() {
        assert_eq!(ErrorBody::parse("Internal Server Error").message(), None);
        assert_eq!(ErrorBody::parse(r#"{"error": "x"}"#).message(), None);
        assert_eq!(ErrorBody::parse(r#"{"detail": ""}"#).message(), None);
        assert_eq!(ErrorBody::parse(r#"{"detail": 42}"#).message(), None);
    }
}

//! Auth and analysis workflows
//!
//! Both workflows are state machines: feeding an event returns at most one
//! effect, and the effect is executed by whoever hosts the workflow. The TUI
//! runner spawns effects as tasks and feeds their completions back; the CLI
//! awaits them inline. Nothing in here touches the network except
//! [`Request::perform`] and the `execute` functions it dispatches to.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiError, ChurnApi};

pub mod analysis;
pub mod auth;

pub use analysis::{
    AnalysisEffect, AnalysisEvent, AnalysisResult, AnalysisState, AnalysisWorkflow, RetentionPlan, RiskClass,
    RunOutcome, Ticket,
};
pub use auth::{AuthEffect, AuthEvent, AuthMode, AuthOutcome, AuthPhase, AuthWorkflow, Notice, NoticeKind};

/// Message shown when the server gives no usable detail
pub const GENERIC_ERROR: &str = "An error occurred";

/// Message shown on the auth screen after a rejected token
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Why an authenticated call failed, as far as the UI cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The call did not complete
    Network(String),
    /// The server answered with an error
    Rejected(String),
    /// The bearer token was refused; the session must end
    SessionInvalid,
}

impl Failure {
    /// Classify an error from an authenticated call
    pub fn from_api(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => Failure::SessionInvalid,
            ApiError::Network(e) => Failure::Network(e.to_string()),
            ApiError::Timeout(d) => Failure::Network(format!("request timed out after {d:?}")),
            ApiError::Rejected { status, detail } => Failure::Rejected(
                detail
                    .clone()
                    .unwrap_or_else(|| format!("Server returned status {status}")),
            ),
            ApiError::InvalidResponse(m) => Failure::Rejected(format!("Unexpected response: {m}")),
            ApiError::Json(e) => Failure::Rejected(format!("Unexpected response: {e}")),
        }
    }

    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Failure::SessionInvalid)
    }

    /// Text for the user
    pub fn message(&self) -> String {
        match self {
            Failure::Network(m) => format!("Could not reach the prediction service: {m}"),
            Failure::Rejected(m) => m.clone(),
            Failure::SessionInvalid => SESSION_EXPIRED.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A network effect ready to run off the UI loop
#[derive(Debug, Clone)]
pub enum Request {
    Auth(AuthEffect),
    Analysis(AnalysisEffect),
}

/// The event a finished [`Request`] feeds back
#[derive(Debug, Clone)]
pub enum Completion {
    Auth(AuthEvent),
    Analysis(AnalysisEvent),
}

impl Request {
    /// Run the effect; `token` is the bearer token at the time of the call
    pub async fn perform(self, api: Arc<dyn ChurnApi>, token: Option<String>) -> Option<Completion> {
        debug!(?self, "Request::perform: called");
        match self {
            Request::Auth(effect) => auth::execute(api.as_ref(), effect).await.map(Completion::Auth),
            Request::Analysis(effect) => analysis::execute(api.as_ref(), token.as_deref(), effect)
                .await
                .map(Completion::Analysis),
        }
    }
}

//! Churn analysis: prediction, then retention plan
//!
//! A submission moves through `Loading -> PartialResult -> Succeeded`, with
//! `Failed` if the prediction fails and `PlanFailed` if only the plan does.
//! Each submission gets a ticket; completions carrying any other ticket are
//! dropped.

use std::fmt;

use tracing::{debug, info, warn};

use super::Failure;
use crate::api::{ChurnApi, PredictionResponse, RetentionPlanResponse};
use crate::record::EmployeeRecord;
use crate::session::SessionReader;

/// Probability above which an employee is classed critical
pub const CRITICAL_THRESHOLD: f64 = 50.0;

/// Per-submission sequence number
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Critical,
    Stable,
}

impl RiskClass {
    pub fn from_probability(churn_probability: f64) -> Self {
        if churn_probability > CRITICAL_THRESHOLD {
            Self::Critical
        } else {
            Self::Stable
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Stable => "Safe",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Critical => "Critical: Employee is highly likely to leave. Review retention plan immediately.",
            Self::Stable => "Safe: Employee is stable, but maintain engagement.",
        }
    }
}

/// Outcome of the prediction call
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Percentage, 0-100
    pub churn_probability: f64,
    pub risk_level: Option<String>,
    pub model_used: Option<String>,
}

impl AnalysisResult {
    pub fn risk_class(&self) -> RiskClass {
        RiskClass::from_probability(self.churn_probability)
    }

    /// Probability with one decimal, e.g. `72.5%`
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.churn_probability)
    }
}

impl From<PredictionResponse> for AnalysisResult {
    fn from(resp: PredictionResponse) -> Self {
        Self {
            churn_probability: resp.churn_probability,
            risk_level: resp.risk_level,
            model_used: resp.model_used,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Churn Risk: {}", self.percent())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    pub text: String,
}

impl From<RetentionPlanResponse> for RetentionPlan {
    fn from(resp: RetentionPlanResponse) -> Self {
        Self {
            text: resp.retention_plan,
        }
    }
}

/// What the dashboard shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    /// Prediction in flight; the record is kept for the plan call
    Loading { ticket: Ticket, record: EmployeeRecord },
    /// Result visible, plan in flight
    PartialResult { ticket: Ticket, result: AnalysisResult },
    Succeeded { result: AnalysisResult, plan: RetentionPlan },
    /// Result visible, plan failed
    PlanFailed { result: AnalysisResult, failure: Failure },
    /// Prediction failed; nothing but the error is shown
    Failed(Failure),
}

impl AnalysisState {
    /// A submission is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading { .. } | Self::PartialResult { .. })
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::PartialResult { result, .. } | Self::Succeeded { result, .. } | Self::PlanFailed { result, .. } => {
                Some(result)
            }
            _ => None,
        }
    }

    pub fn plan(&self) -> Option<&RetentionPlan> {
        match self {
            Self::Succeeded { plan, .. } => Some(plan),
            _ => None,
        }
    }

    /// Ticket of the submission in flight
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Loading { ticket, .. } | Self::PartialResult { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) | Self::PlanFailed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Short status word for status bars
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading { .. } => "analyzing",
            Self::PartialResult { .. } => "generating plan",
            Self::Succeeded { .. } => "done",
            Self::PlanFailed { .. } => "plan failed",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Submit { ticket: Ticket, record: EmployeeRecord },
    PredictionCompleted { ticket: Ticket, outcome: Result<AnalysisResult, Failure> },
    PlanCompleted { ticket: Ticket, outcome: Result<RetentionPlan, Failure> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEffect {
    Predict { ticket: Ticket, record: EmployeeRecord },
    GeneratePlan { ticket: Ticket, record: EmployeeRecord },
    /// Host logs out and routes to the auth screen
    ExpireSession,
}

/// Pure transition: `(state, event) -> (state, effect)`
pub fn transition(state: AnalysisState, event: AnalysisEvent) -> (AnalysisState, Option<AnalysisEffect>) {
    match (state, event) {
        (state, AnalysisEvent::Submit { .. }) if state.is_busy() => (state, None),
        (_, AnalysisEvent::Submit { ticket, record }) => (
            AnalysisState::Loading {
                ticket,
                record: record.clone(),
            },
            Some(AnalysisEffect::Predict { ticket, record }),
        ),

        (AnalysisState::Loading { ticket, record }, AnalysisEvent::PredictionCompleted { ticket: t, outcome })
            if t == ticket =>
        {
            match outcome {
                Ok(result) => (
                    AnalysisState::PartialResult { ticket, result },
                    Some(AnalysisEffect::GeneratePlan { ticket, record }),
                ),
                Err(failure) => {
                    let effect = failure.is_session_invalid().then_some(AnalysisEffect::ExpireSession);
                    (AnalysisState::Failed(failure), effect)
                }
            }
        }

        (AnalysisState::PartialResult { ticket, result }, AnalysisEvent::PlanCompleted { ticket: t, outcome })
            if t == ticket =>
        {
            match outcome {
                Ok(plan) => (AnalysisState::Succeeded { result, plan }, None),
                Err(failure) => {
                    let effect = failure.is_session_invalid().then_some(AnalysisEffect::ExpireSession);
                    (AnalysisState::PlanFailed { result, failure }, effect)
                }
            }
        }

        // Completion for a submission that is no longer current
        (state, _) => (state, None),
    }
}

/// Owns the analysis state and hands out tickets
#[derive(Debug, Clone, Default)]
pub struct AnalysisWorkflow {
    state: AnalysisState,
    last_ticket: Ticket,
}

/// How a CLI run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another submission was in flight
    Rejected,
    /// Reached a stable state; see [`AnalysisWorkflow::state`]
    Finished,
    /// The token was refused; the caller must log out
    SessionExpired,
}

impl AnalysisWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Back to `Idle`; in-flight completions become stale
    pub fn reset(&mut self) {
        debug!("AnalysisWorkflow::reset: called");
        self.last_ticket += 1;
        self.state = AnalysisState::Idle;
    }

    /// Start a submission of `record`
    pub fn submit(&mut self, record: EmployeeRecord) -> Option<AnalysisEffect> {
        if self.is_busy() {
            debug!("AnalysisWorkflow::submit: rejected, submission in flight");
            return None;
        }
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        info!(ticket, "Analysis started");
        self.handle(AnalysisEvent::Submit { ticket, record })
    }

    /// Feed an event through [`transition`]
    pub fn handle(&mut self, event: AnalysisEvent) -> Option<AnalysisEffect> {
        debug!(state = self.state.label(), "AnalysisWorkflow::handle: called");
        let state = std::mem::take(&mut self.state);
        let (state, effect) = transition(state, event);
        self.state = state;
        debug!(state = self.state.label(), ?effect, "AnalysisWorkflow::handle: transitioned");
        effect
    }

    /// Run one submission to a stable state, awaiting each call inline
    ///
    /// `observe` sees every intermediate state, so a caller can show the
    /// result before the plan arrives.
    pub async fn run(
        &mut self,
        api: &dyn ChurnApi,
        session: &SessionReader,
        record: EmployeeRecord,
        mut observe: impl FnMut(&AnalysisState),
    ) -> RunOutcome {
        debug!("AnalysisWorkflow::run: called");
        let mut effect = self.submit(record);
        if effect.is_none() {
            return RunOutcome::Rejected;
        }
        observe(&self.state);

        while let Some(current) = effect.take() {
            if current == AnalysisEffect::ExpireSession {
                return RunOutcome::SessionExpired;
            }
            let token = session.token();
            if let Some(event) = execute(api, token.as_deref(), current).await {
                effect = self.handle(event);
                observe(&self.state);
            }
        }
        RunOutcome::Finished
    }
}

/// Execute a network effect; `ExpireSession` belongs to the host
pub async fn execute(api: &dyn ChurnApi, token: Option<&str>, effect: AnalysisEffect) -> Option<AnalysisEvent> {
    match effect {
        AnalysisEffect::Predict { ticket, record } => {
            let outcome = match token {
                Some(token) => api.predict(token, &record).await.map(AnalysisResult::from).map_err(|e| {
                    warn!(ticket, error = %e, "Prediction failed");
                    Failure::from_api(&e)
                }),
                None => Err(Failure::SessionInvalid),
            };
            Some(AnalysisEvent::PredictionCompleted { ticket, outcome })
        }
        AnalysisEffect::GeneratePlan { ticket, record } => {
            let outcome = match token {
                Some(token) => api
                    .retention_plan(token, &record)
                    .await
                    .map(RetentionPlan::from)
                    .map_err(|e| {
                        warn!(ticket, error = %e, "Retention plan failed");
                        Failure::from_api(&e)
                    }),
                None => Err(Failure::SessionInvalid),
            };
            Some(AnalysisEvent::PlanCompleted { ticket, outcome })
        }
        AnalysisEffect::ExpireSession => None,
    }
}

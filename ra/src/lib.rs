//! RetentionAI - employee churn risk client
//!
//! Authenticates against a RetentionAI service, collects a 30-attribute
//! employee record, and shows the service's churn-risk score and retention
//! plan for it.
//!
//! # Modules
//!
//! - [`session`] - Session store with persistence and read-only handles
//! - [`guard`] - Route guard for the protected dashboard
//! - [`workflow`] - Auth and analysis state machines
//! - [`api`] - Prediction service client trait and HTTP implementation
//! - [`record`] - Employee record schema and validation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`tui`] - Terminal dashboard

pub mod api;
pub mod cli;
pub mod config;
pub mod guard;
pub mod record;
pub mod session;
pub mod tui;
pub mod workflow;

// Re-export commonly used types
pub use api::{ApiError, ChurnApi, HttpChurnApi};
pub use config::Config;
pub use guard::{Navigation, Route, RouteGuard};
pub use record::{EmployeeRecord, RecordError};
pub use session::{FileStorage, MemoryStorage, Session, SessionReader, SessionStorage, SessionStore};
pub use workflow::{AnalysisState, AnalysisWorkflow, AuthMode, AuthOutcome, AuthWorkflow, Failure};

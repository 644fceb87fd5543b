//! Login and registration
//!
//! `Idle -> Submitting -> {Succeeded | Failed}`. Only one submission is in
//! flight at a time, and the mode can't change underneath it.

use std::fmt;

use tracing::{debug, info, warn};

use super::{GENERIC_ERROR, SESSION_EXPIRED};
use crate::api::{ApiError, ChurnApi};
use crate::session::SessionStore;

/// Notice shown after registering
pub const REGISTERED_NOTICE: &str = "Registration successful! Please login.";

/// Notice shown when a field is left empty
pub const MISSING_FIELDS: &str = "Username and password are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One line of feedback under the auth form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// User pressed submit
    Submit { username: String, password: String },
    /// User picked the other form
    SwitchMode(AuthMode),
    /// Token endpoint accepted the credentials
    TokenIssued { username: String, token: String },
    /// Registration endpoint accepted the account
    Registered,
    /// Either endpoint failed; `message` is what the user sees
    Failed { message: String },
    /// An authenticated call was refused elsewhere
    SessionExpired,
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthEffect {
    RequestToken { username: String, password: String },
    Register { username: String, password: String },
    /// Host writes the session and navigates to the dashboard
    EstablishSession { token: String, username: String },
}

impl fmt::Debug for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit { username, .. } => f.debug_struct("Submit").field("username", username).finish_non_exhaustive(),
            Self::SwitchMode(mode) => f.debug_tuple("SwitchMode").field(mode).finish(),
            Self::TokenIssued { username, .. } => f
                .debug_struct("TokenIssued")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Registered => f.write_str("Registered"),
            Self::Failed { message } => f.debug_struct("Failed").field("message", message).finish(),
            Self::SessionExpired => f.write_str("SessionExpired"),
        }
    }
}

impl fmt::Debug for AuthEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestToken { username, .. } => f
                .debug_struct("RequestToken")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Register { username, .. } => f.debug_struct("Register").field("username", username).finish_non_exhaustive(),
            Self::EstablishSession { username, .. } => f
                .debug_struct("EstablishSession")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

/// What a CLI submission ended in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    LoggedIn { username: String },
    Registered,
    Rejected(String),
    /// Another submission was already in flight
    Busy,
}

/// Auth screen state machine
#[derive(Debug, Clone, Default)]
pub struct AuthWorkflow {
    mode: AuthMode,
    phase: AuthPhase,
    notice: Option<Notice>,
}

impl AuthWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == AuthPhase::Submitting
    }

    /// Apply an event, returning the effect to execute, if any
    pub fn handle(&mut self, event: AuthEvent) -> Option<AuthEffect> {
        debug!(?event, phase = ?self.phase, "AuthWorkflow::handle: called");
        match event {
            AuthEvent::Submit { username, password } => {
                if self.is_submitting() {
                    debug!("AuthWorkflow::handle: submit ignored, already submitting");
                    return None;
                }
                if username.trim().is_empty() || password.is_empty() {
                    self.phase = AuthPhase::Failed;
                    self.notice = Some(Notice::error(MISSING_FIELDS));
                    return None;
                }
                self.phase = AuthPhase::Submitting;
                self.notice = None;
                Some(match self.mode {
                    AuthMode::Login => AuthEffect::RequestToken { username, password },
                    AuthMode::Register => AuthEffect::Register { username, password },
                })
            }
            AuthEvent::SwitchMode(mode) => {
                if self.is_submitting() {
                    return None;
                }
                self.mode = mode;
                self.phase = AuthPhase::Idle;
                self.notice = None;
                None
            }
            AuthEvent::TokenIssued { username, token } => {
                if !self.is_submitting() {
                    return None;
                }
                self.phase = AuthPhase::Succeeded;
                self.notice = None;
                Some(AuthEffect::EstablishSession { token, username })
            }
            AuthEvent::Registered => {
                if !self.is_submitting() {
                    return None;
                }
                self.phase = AuthPhase::Succeeded;
                self.mode = AuthMode::Login;
                self.notice = Some(Notice::info(REGISTERED_NOTICE));
                None
            }
            AuthEvent::Failed { message } => {
                if !self.is_submitting() {
                    return None;
                }
                self.phase = AuthPhase::Failed;
                self.notice = Some(Notice::error(message));
                None
            }
            AuthEvent::SessionExpired => {
                self.mode = AuthMode::Login;
                self.phase = AuthPhase::Idle;
                self.notice = Some(Notice::error(SESSION_EXPIRED));
                None
            }
        }
    }

    /// Run one submission to completion against `api`, writing `store` on login
    pub async fn submit(
        &mut self,
        api: &dyn ChurnApi,
        store: &mut SessionStore,
        username: &str,
        password: &str,
    ) -> AuthOutcome {
        debug!(%username, mode = ?self.mode, "AuthWorkflow::submit: called");
        let submit = AuthEvent::Submit {
            username: username.to_string(),
            password: password.to_string(),
        };
        let Some(effect) = self.handle(submit) else {
            return self.outcome();
        };

        let completion = execute(api, effect).await;
        if let Some(AuthEffect::EstablishSession { token, username }) = completion.and_then(|e| self.handle(e)) {
            store.login(token, username.clone());
            return AuthOutcome::LoggedIn { username };
        }
        self.outcome()
    }

    fn outcome(&self) -> AuthOutcome {
        match self.phase {
            AuthPhase::Submitting => AuthOutcome::Busy,
            AuthPhase::Succeeded => AuthOutcome::Registered,
            AuthPhase::Idle | AuthPhase::Failed => AuthOutcome::Rejected(
                self.notice
                    .as_ref()
                    .map(|n| n.text.clone())
                    .unwrap_or_else(|| GENERIC_ERROR.to_string()),
            ),
        }
    }
}

/// Message for a failed auth call: the server's detail verbatim, else generic
fn failure_message(err: &ApiError) -> String {
    err.server_detail().unwrap_or(GENERIC_ERROR).to_string()
}

/// Execute a network effect; session effects belong to the host
pub async fn execute(api: &dyn ChurnApi, effect: AuthEffect) -> Option<AuthEvent> {
    match effect {
        AuthEffect::RequestToken { username, password } => match api.request_token(&username, &password).await {
            Ok(token) => {
                info!(%username, "Token issued");
                Some(AuthEvent::TokenIssued {
                    username,
                    token: token.access_token,
                })
            }
            Err(e) => {
                warn!(%username, error = %e, "Login failed");
                Some(AuthEvent::Failed {
                    message: failure_message(&e),
                })
            }
        },
        AuthEffect::Register { username, password } => match api.register(&username, &password).await {
            Ok(()) => {
                info!(%username, "Registered");
                Some(AuthEvent::Registered)
            }
            Err(e) => {
                warn!(%username, error = %e, "Registration failed");
                Some(AuthEvent::Failed {
                    message: failure_message(&e),
                })
            }
        },
        AuthEffect::EstablishSession { .. } => None,
    }
}

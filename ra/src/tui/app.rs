//! TUI application - event handling and state management
//!
//! The App owns the session, the route guard and both workflows, and turns
//! key presses and request completions into state changes. Network work is
//! queued as [`Request`]s for the runner to spawn; nothing here blocks or
//! renders.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, trace, warn};

use super::state::{AppState, InteractionMode};
use crate::guard::{Route, RouteGuard};
use crate::record::{FieldKind, FieldValue, SCHEMA};
use crate::session::{SessionReader, SessionStore};
use crate::workflow::{
    AnalysisEffect, AnalysisState, AnalysisWorkflow, AuthEffect, AuthEvent, AuthWorkflow, Completion, Request,
};

/// Lines moved per PageUp/PageDown in the plan panel
const PLAN_PAGE: u16 = 10;

/// TUI application
#[derive(Debug)]
pub struct App {
    state: AppState,
    session: SessionStore,
    guard: RouteGuard,
    auth: AuthWorkflow,
    analysis: AnalysisWorkflow,
    /// Effects waiting for the runner
    pending: Vec<Request>,
}

impl App {
    /// Create the application, landing on the dashboard if the session allows
    pub fn new(session: SessionStore) -> Self {
        debug!("App::new: called");
        let guard = RouteGuard::new(session.reader());
        let mut app = Self {
            state: AppState::new(),
            session,
            guard,
            auth: AuthWorkflow::new(),
            analysis: AnalysisWorkflow::new(),
            pending: Vec::new(),
        };
        app.navigate(Route::Dashboard);
        app
    }

    pub fn state(&self) -> &AppState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    pub fn auth(&self) -> &AuthWorkflow {
        &self.auth
    }

    pub fn analysis(&self) -> &AnalysisState {
        self.analysis.state()
    }

    pub fn session_reader(&self) -> SessionReader {
        self.session.reader()
    }

    pub fn username(&self) -> Option<String> {
        self.session.session().username().map(str::to_string)
    }

    /// The route to render this frame, as decided by the guard
    pub fn route(&self) -> Route {
        self.guard.resolve(self.state.route).target()
    }

    /// Navigate, replacing the requested route with the guard's decision
    pub fn navigate(&mut self, requested: Route) {
        let nav = self.guard.resolve(requested);
        debug!(requested = requested.path(), ?nav, "App::navigate: called");
        self.state.route = nav.target();
        self.state.interaction_mode = InteractionMode::Normal;
    }

    /// Drain effects queued since the last call
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.pending)
    }

    /// Periodic tick
    pub fn tick(&mut self) {
        self.state.tick = self.state.tick.wrapping_add(1);
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        self.state.clear_error();

        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            debug!("App::handle_key: Ctrl+C force quit");
            return true;
        }

        let quit = match self.route() {
            Route::Auth => self.handle_auth_key(key),
            Route::Dashboard => match &self.state.interaction_mode {
                InteractionMode::Normal => self.handle_normal_key(key),
                InteractionMode::Editing(_) => self.handle_editing_key(key),
                InteractionMode::Help => self.handle_help_key(key),
            },
        };
        quit || self.state.should_quit
    }

    /// Handle key on the auth screen
    fn handle_auth_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_auth_key: called");
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                let form = &mut self.state.auth_form;
                form.focus = form.focus.toggled();
            }
            KeyCode::F(2) => {
                let mode = self.auth.mode().toggled();
                self.auth.handle(AuthEvent::SwitchMode(mode));
            }
            KeyCode::Enter => self.submit_auth(),
            KeyCode::Backspace if !self.auth.is_submitting() => {
                self.state.auth_form.focused_mut().pop();
            }
            KeyCode::Char(c) if !self.auth.is_submitting() => {
                self.state.auth_form.focused_mut().push(c);
            }
            _ => {}
        }
        false
    }

    fn submit_auth(&mut self) {
        let form = &self.state.auth_form;
        let event = AuthEvent::Submit {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
        };
        if let Some(effect) = self.auth.handle(event) {
            debug!("App::submit_auth: queueing request");
            self.pending.push(Request::Auth(effect));
        }
    }

    /// Handle key on the dashboard in normal mode
    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_normal_key: called");
        match key.code {
            KeyCode::Char('q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.state.interaction_mode = InteractionMode::Help;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.record_form.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.record_form.select_prev(),
            KeyCode::Char('g') | KeyCode::Home => self.state.record_form.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.state.record_form.select_last(),
            KeyCode::Char('h') | KeyCode::Left => self.step_selected(false),
            KeyCode::Char('l') | KeyCode::Right => self.step_selected(true),
            KeyCode::Enter => {
                let spec = &SCHEMA[self.state.record_form.selected];
                if let FieldKind::Choice(_) = spec.kind {
                    self.step_selected(true);
                } else {
                    let current = self
                        .state
                        .record_form
                        .record
                        .get_at(self.state.record_form.selected)
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    self.state.interaction_mode = InteractionMode::Editing(current);
                }
            }
            KeyCode::Char('a') | KeyCode::F(5) => self.start_analysis(),
            KeyCode::Char('r') => self.state.record_form.reset(),
            KeyCode::Char('L') => self.logout(),
            KeyCode::PageDown => self.state.scroll_plan_down(PLAN_PAGE),
            KeyCode::PageUp => self.state.scroll_plan_up(PLAN_PAGE),
            _ => {}
        }
        false
    }

    /// Handle key while editing a field value
    fn handle_editing_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_editing_key: called");
        let InteractionMode::Editing(buffer) = &mut self.state.interaction_mode else {
            return false;
        };
        match key.code {
            KeyCode::Esc => {
                self.state.interaction_mode = InteractionMode::Normal;
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => {
                buffer.push(c);
            }
            KeyCode::Enter => {
                let raw = buffer.clone();
                let name = self.state.record_form.selected_name();
                match self.state.record_form.record.set_raw(name, &raw) {
                    Ok(()) => self.state.interaction_mode = InteractionMode::Normal,
                    Err(e) => {
                        debug!(error = %e, "App::handle_editing_key: rejected value");
                        self.state.set_error(e.to_string());
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn handle_help_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_help_key: called");
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') | KeyCode::F(1)) {
            self.state.interaction_mode = InteractionMode::Normal;
        }
        false
    }

    /// Cycle a choice field, or nudge an integer field by one
    fn step_selected(&mut self, forward: bool) {
        let form = &mut self.state.record_form;
        let spec = &SCHEMA[form.selected];
        let Some(current) = form.record.get_at(form.selected) else {
            return;
        };
        let next = match (spec.kind, current) {
            (FieldKind::Choice(_), current) => spec.cycle(current, forward),
            (FieldKind::Integer, FieldValue::Integer(n)) => {
                FieldValue::Integer(if forward { n.saturating_add(1) } else { n.saturating_sub(1) })
            }
            _ => return,
        };
        if let Err(e) = form.record.set(spec.name, next) {
            self.state.set_error(e.to_string());
        }
    }

    fn start_analysis(&mut self) {
        let record = self.state.record_form.record.clone();
        match self.analysis.submit(record) {
            Some(effect) => {
                self.state.plan_scroll = 0;
                self.pending.push(Request::Analysis(effect));
            }
            None => debug!("App::start_analysis: analysis already running"),
        }
    }

    fn logout(&mut self) {
        info!("Logging out from dashboard");
        self.session.logout();
        self.analysis.reset();
        self.state.plan_scroll = 0;
        self.auth = AuthWorkflow::new();
        self.navigate(Route::Dashboard);
    }

    /// The bearer token was refused: end the session and show why
    fn expire_session(&mut self) {
        warn!("Session rejected by server, logging out");
        self.session.logout();
        self.analysis.reset();
        self.state.plan_scroll = 0;
        self.auth.handle(AuthEvent::SessionExpired);
        self.navigate(Route::Dashboard);
    }

    /// Feed back the result of a spawned request
    pub fn handle_completion(&mut self, completion: Completion) {
        debug!(?completion, "App::handle_completion: called");
        match completion {
            Completion::Auth(event) => {
                if let Some(AuthEffect::EstablishSession { token, username }) = self.auth.handle(event) {
                    self.session.login(token, username);
                    self.state.auth_form.clear();
                    self.navigate(Route::Dashboard);
                }
            }
            Completion::Analysis(event) => match self.analysis.handle(event) {
                Some(AnalysisEffect::ExpireSession) => self.expire_session(),
                Some(effect) => self.pending.push(Request::Analysis(effect)),
                None => {}
            },
        }
    }
}

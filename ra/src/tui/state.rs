//! TUI state types
//!
//! Form buffers and interaction modes. Session and workflow state live on
//! [`App`](super::App); this is only what the screens themselves own.

use tracing::debug;

use crate::guard::Route;
use crate::record::{EmployeeRecord, SCHEMA, display_order};

/// Spinner frames for in-flight requests
pub const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How keys are interpreted on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Navigating the form
    #[default]
    Normal,
    /// Typing a new value for the selected field
    Editing(String),
    /// Help overlay visible
    Help,
}

/// Which auth input has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    #[default]
    Username,
    Password,
}

impl AuthField {
    pub fn toggled(self) -> Self {
        match self {
            Self::Username => Self::Password,
            Self::Password => Self::Username,
        }
    }
}

/// Auth screen inputs
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub focus: AuthField,
}

impl AuthForm {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Password => &mut self.password,
        }
    }

    /// Forget what was typed
    pub fn clear(&mut self) {
        debug!("AuthForm::clear: called");
        *self = Self::default();
    }
}

/// Dashboard record editor
///
/// Navigation follows the grouped display order, not wire order.
#[derive(Debug, Clone)]
pub struct RecordForm {
    pub record: EmployeeRecord,
    /// Index into `SCHEMA`
    pub selected: usize,
    order: Vec<usize>,
}

impl Default for RecordForm {
    fn default() -> Self {
        let order = display_order();
        Self {
            record: EmployeeRecord::default(),
            selected: order[0],
            order,
        }
    }
}

impl RecordForm {
    /// Schema indices in display order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn position(&self) -> usize {
        self.order.iter().position(|&i| i == self.selected).unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let pos = (self.position() + 1).min(self.order.len() - 1);
        self.selected = self.order[pos];
    }

    pub fn select_prev(&mut self) {
        let pos = self.position().saturating_sub(1);
        self.selected = self.order[pos];
    }

    pub fn select_first(&mut self) {
        self.selected = self.order[0];
    }

    pub fn select_last(&mut self) {
        self.selected = self.order[self.order.len() - 1];
    }

    /// Wire name of the selected field
    pub fn selected_name(&self) -> &'static str {
        SCHEMA[self.selected].name
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        debug!("RecordForm::reset: called");
        self.record = EmployeeRecord::default();
    }
}

/// Screen-level state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Route last navigated to; the guard decides what actually renders
    pub route: Route,
    pub interaction_mode: InteractionMode,
    pub auth_form: AuthForm,
    pub record_form: RecordForm,
    /// Plan panel scroll offset (lines)
    pub plan_scroll: u16,
    /// Transient message, cleared on the next key press
    pub error_message: Option<String>,
    /// Incremented on every tick; drives the spinner
    pub tick: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        debug!("AppState::new: called");
        Self::default()
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }

    pub fn scroll_plan_down(&mut self, lines: u16) {
        self.plan_scroll = self.plan_scroll.saturating_add(lines);
    }

    pub fn scroll_plan_up(&mut self, lines: u16) {
        self.plan_scroll = self.plan_scroll.saturating_sub(lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_form_selection_is_clamped() {
        let mut form = RecordForm::default();
        let first = form.order()[0];
        let last = *form.order().last().unwrap();

        form.select_prev();
        assert_eq!(form.selected, first);

        form.select_last();
        form.select_next();
        assert_eq!(form.selected, last);

        form.select_first();
        assert_eq!(form.selected_name(), SCHEMA[first].name);
    }

    #[test]
    fn test_record_form_follows_display_order() {
        let mut form = RecordForm::default();
        form.select_next();
        assert_eq!(form.selected, form.order()[1]);
        assert_eq!(SCHEMA[form.selected].group, SCHEMA[form.order()[0]].group);
    }

    #[test]
    fn test_auth_form_focus() {
        let mut form = AuthForm::default();
        form.focused_mut().push('a');
        form.focus = form.focus.toggled();
        form.focused_mut().push('b');
        assert_eq!(form.username, "a");
        assert_eq!(form.password, "b");

        form.clear();
        assert!(form.username.is_empty());
        assert_eq!(form.focus, AuthField::Username);
    }

    #[test]
    fn test_spinner_wraps() {
        let mut state = AppState::new();
        state.tick = SPINNER.len();
        assert_eq!(state.spinner(), SPINNER[0]);
    }

    #[test]
    fn test_plan_scroll_saturates() {
        let mut state = AppState::new();
        state.scroll_plan_up(5);
        assert_eq!(state.plan_scroll, 0);
        state.scroll_plan_down(3);
        assert_eq!(state.plan_scroll, 3);
    }
}

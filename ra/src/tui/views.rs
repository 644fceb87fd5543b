//! TUI views and rendering
//!
//! All rendering logic is contained here. Views read the App and never
//! modify it.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::trace;

use super::app::App;
use super::state::{AuthField, InteractionMode};
use crate::guard::Route;
use crate::record::{FieldGroup, FieldKind, SCHEMA};
use crate::workflow::{AnalysisState, AuthMode, NoticeKind, RiskClass};

mod colors {
    use ratatui::style::Color;

    pub const CRITICAL: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const STABLE: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const PENDING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const INFO: Color = Color::Rgb(100, 149, 237); // Cornflower blue
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

fn risk_color(class: RiskClass) -> Color {
    match class {
        RiskClass::Critical => colors::CRITICAL,
        RiskClass::Stable => colors::STABLE,
    }
}

/// Main render function
pub fn render(app: &App, frame: &mut Frame) {
    let route = app.route();
    trace!(?route, "render: called");
    let area = frame.area();
    match route {
        Route::Auth => render_auth(app, frame, area),
        Route::Dashboard => render_dashboard(app, frame, area),
    }
}

fn render_auth(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_auth: called");
    let popup = centered_rect(50, 50, area);
    frame.render_widget(Clear, popup);

    let auth = app.auth();
    let form = &app.state().auth_form;

    let tab = |mode: AuthMode| {
        let style = if auth.mode() == mode {
            Style::default()
                .fg(Color::Black)
                .bg(colors::HEADER)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::DIM)
        };
        Span::styled(format!(" {} ", mode.title()), style)
    };

    let field = |label: &str, value: String, focused: bool| {
        let marker = if focused { "▸ " } else { "  " };
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused && !auth.is_submitting() { "_" } else { "" };
        Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<10}", label), Style::default().fg(colors::DIM)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let mut lines = vec![
        Line::from(vec![tab(AuthMode::Login), Span::raw("  "), tab(AuthMode::Register)]),
        Line::from(""),
        field("Username", form.username.clone(), form.focus == AuthField::Username),
        field(
            "Password",
            "•".repeat(form.password.chars().count()),
            form.focus == AuthField::Password,
        ),
        Line::from(""),
    ];

    if auth.is_submitting() {
        let label = match auth.mode() {
            AuthMode::Login => "Signing in...",
            AuthMode::Register => "Creating account...",
        };
        lines.push(Line::from(Span::styled(
            format!("{} {}", app.state().spinner(), label),
            Style::default().fg(colors::PENDING),
        )));
    } else if let Some(notice) = auth.notice() {
        let color = match notice.kind {
            NoticeKind::Info => colors::STABLE,
            NoticeKind::Error => colors::CRITICAL,
        };
        lines.push(Line::from(Span::styled(notice.text.clone(), Style::default().fg(color))));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Enter", Style::default().fg(colors::KEYBIND)),
        Span::raw(" submit  "),
        Span::styled("Tab", Style::default().fg(colors::KEYBIND)),
        Span::raw(" field  "),
        Span::styled("F2", Style::default().fg(colors::KEYBIND)),
        Span::raw(" login/register  "),
        Span::styled("Esc", Style::default().fg(colors::KEYBIND)),
        Span::raw(" quit"),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            " RetentionAI ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), popup);
}

fn render_dashboard(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_dashboard: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_header(app, frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_form(app, frame, body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(body[1]);
    render_result(app, frame, right[0]);
    render_plan(app, frame, right[1]);

    render_footer(app, frame, chunks[2]);

    if app.state().interaction_mode == InteractionMode::Help {
        render_help_overlay(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let user = app.username().unwrap_or_default();
    let status = app.analysis().label();
    let line = Line::from(vec![
        Span::styled(
            " RetentionAI ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" user: "),
        Span::styled(user, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  status: "),
        Span::styled(status, Style::default().fg(colors::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_form: called");
    let form = &app.state().record_form;
    let mut lines = Vec::new();
    let mut group: Option<FieldGroup> = None;
    let mut selected_line = 0usize;

    for &i in form.order() {
        let spec = &SCHEMA[i];
        let value = match form.record.get_at(i) {
            Some(v) => v,
            None => continue,
        };
        if group != Some(spec.group) {
            if group.is_some() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                spec.group.title(),
                Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
            )));
            group = Some(spec.group);
        }

        let selected = i == form.selected;
        if selected {
            selected_line = lines.len();
        }
        let shown = match (&app.state().interaction_mode, selected) {
            (InteractionMode::Editing(buffer), true) => format!("{buffer}_"),
            _ => match spec.kind {
                FieldKind::Choice(_) => format!("‹ {value} ›"),
                _ => value.to_string(),
            },
        };
        let style = if selected {
            Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<28}", spec.label), style.fg(colors::DIM)),
            Span::styled(shown, style),
        ]));
    }

    // Keep the selection in view
    let inner_height = area.height.saturating_sub(2) as usize;
    let offset = selected_line.saturating_sub(inner_height.saturating_sub(1));

    let block = Block::default().borders(Borders::ALL).title(" Employee ");
    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset as u16, 0)), area);
}

fn render_result(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_result: called");
    let state = app.analysis();
    let mut lines = Vec::new();

    match state {
        AnalysisState::Idle => {
            lines.push(Line::from(Span::styled(
                "Fill in the record and press a to analyze.",
                Style::default().fg(colors::DIM),
            )));
        }
        AnalysisState::Loading { .. } => {
            lines.push(Line::from(Span::styled(
                format!("{} Analyzing...", app.state().spinner()),
                Style::default().fg(colors::PENDING),
            )));
        }
        AnalysisState::Failed(failure) => {
            lines.push(Line::from(Span::styled(
                failure.message(),
                Style::default().fg(colors::CRITICAL),
            )));
        }
        _ => {}
    }

    if let Some(result) = state.result() {
        let class = result.risk_class();
        let color = risk_color(class);
        lines.push(Line::from(vec![
            Span::raw("Churn Risk: "),
            Span::styled(result.percent(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(class.label(), Style::default().fg(color)),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(class.advice(), Style::default().fg(color))));
        if let Some(level) = &result.risk_level {
            lines.push(Line::from(vec![
                Span::styled("Risk level: ", Style::default().fg(colors::DIM)),
                Span::raw(level.clone()),
            ]));
        }
        if let Some(model) = &result.model_used {
            lines.push(Line::from(vec![
                Span::styled("Model: ", Style::default().fg(colors::DIM)),
                Span::raw(model.clone()),
            ]));
        }
    }

    if let Some(message) = &app.state().error_message {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(colors::CRITICAL))));
    }

    let block = Block::default().borders(Borders::ALL).title(" Risk ");
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_plan(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_plan: called");
    let state = app.analysis();
    let paragraph = match state {
        AnalysisState::PartialResult { .. } => Paragraph::new(Span::styled(
            format!("{} Generating retention plan...", app.state().spinner()),
            Style::default().fg(colors::PENDING),
        )),
        AnalysisState::Succeeded { plan, .. } => Paragraph::new(plan.text.as_str()).scroll((app.state().plan_scroll, 0)),
        AnalysisState::PlanFailed { failure, .. } => Paragraph::new(Span::styled(
            format!("Retention plan unavailable: {}", failure.message()),
            Style::default().fg(colors::CRITICAL),
        )),
        _ => Paragraph::new(""),
    };

    let block = Block::default().borders(Borders::ALL).title(" Retention Plan ");
    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let line = match &app.state().interaction_mode {
        InteractionMode::Editing(_) => Line::from(vec![
            Span::styled("Enter", Style::default().fg(colors::KEYBIND)),
            Span::raw(" save  "),
            Span::styled("Esc", Style::default().fg(colors::KEYBIND)),
            Span::raw(" cancel  "),
            Span::styled(
                format!("editing {}", app.state().record_form.selected_name()),
                Style::default().fg(colors::INFO),
            ),
        ]),
        _ => Line::from(vec![
            Span::styled("a", Style::default().fg(colors::KEYBIND)),
            Span::raw(" analyze  "),
            Span::styled("Enter", Style::default().fg(colors::KEYBIND)),
            Span::raw(" edit  "),
            Span::styled("←/→", Style::default().fg(colors::KEYBIND)),
            Span::raw(" change  "),
            Span::styled("L", Style::default().fg(colors::KEYBIND)),
            Span::raw(" logout  "),
            Span::styled("?", Style::default().fg(colors::KEYBIND)),
            Span::raw(" help  "),
            Span::styled("q", Style::default().fg(colors::KEYBIND)),
            Span::raw(" quit"),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled("Form", Style::default().add_modifier(Modifier::BOLD))]),
        key_line("j/↓", "Next field"),
        key_line("k/↑", "Previous field"),
        key_line("g/G", "First / last field"),
        key_line("Enter", "Edit value (cycles choices)"),
        key_line("h/l ←/→", "Previous / next choice, -1 / +1"),
        key_line("r", "Reset record to defaults"),
        Line::from(""),
        Line::from(vec![Span::styled("Analysis", Style::default().add_modifier(Modifier::BOLD))]),
        key_line("a/F5", "Analyze churn risk"),
        key_line("PgUp/PgDn", "Scroll retention plan"),
        Line::from(""),
        Line::from(vec![Span::styled("Session", Style::default().add_modifier(Modifier::BOLD))]),
        key_line("L", "Log out"),
        key_line("?", "Toggle help"),
        key_line("q", "Quit"),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Help ");
    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    trace!(percent_x, percent_y, "centered_rect: called");
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

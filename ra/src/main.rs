//! RetentionAI - employee churn risk client
//!
//! CLI entry point: session commands, scripted analysis and the dashboard.

use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use retentionai::api::{ChurnApi, create_client};
use retentionai::cli::{
    Cli, Command, CredentialArgs, OutputFormat, RecordCommand, RecordFormat, generate_after_help, get_log_path,
};
use retentionai::config::Config;
use retentionai::guard::{Route, RouteGuard};
use retentionai::record::{EmployeeRecord, SCHEMA, display_order};
use retentionai::session::{FileStorage, MemoryStorage, SessionStore};
use retentionai::tui;
use retentionai::workflow::auth::REGISTERED_NOTICE;
use retentionai::workflow::{
    AnalysisState, AnalysisWorkflow, AuthEvent, AuthMode, AuthOutcome, AuthWorkflow, RunOutcome, SESSION_EXPIRED,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        debug!(%url, "main: overriding api.base-url");
        config.api.base_url = url;
    }
    config.validate().context("Invalid configuration")?;

    info!("RetentionAI loaded config: api={}", config.api.base_url);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Login { credentials }) => cmd_login(&config, credentials).await,
        Some(Command::Register { credentials }) => cmd_register(&config, credentials).await,
        Some(Command::Logout) => cmd_logout(&config),
        Some(Command::Whoami) => cmd_whoami(&config),
        Some(Command::Analyze { record, set, format }) => cmd_analyze(&config, record, set, format).await,
        Some(Command::Record { command }) => match command {
            RecordCommand::Template { format } => cmd_record_template(format),
            RecordCommand::Fields => cmd_record_fields(),
        },
        Some(Command::Health) => cmd_health(&config).await,
        Some(Command::Tui) => cmd_tui(&config).await,
        None => {
            debug!("main: no command specified, printing help");
            Cli::command().after_help(generate_after_help()).print_help()?;
            Ok(())
        }
    }
}

/// Open the session store the config points at
fn open_session(config: &Config) -> SessionStore {
    if config.session.persist {
        let path = config.session.expanded_token_file();
        debug!(path = %path.display(), "open_session: file-backed");
        SessionStore::initialize(FileStorage::new(path))
    } else {
        debug!("open_session: memory-only");
        SessionStore::initialize(MemoryStorage::new())
    }
}

fn open_api(config: &Config) -> Result<Arc<dyn ChurnApi>> {
    create_client(&config.api).context("Failed to create API client")
}

/// Password from the flag, or the first line of stdin
fn read_password(credentials: &CredentialArgs) -> Result<String> {
    if let Some(password) = &credentials.password {
        return Ok(password.clone());
    }
    if !credentials.password_stdin {
        return Err(eyre!("Provide a password with --password or --password-stdin"));
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Log in and persist the session
async fn cmd_login(config: &Config, credentials: CredentialArgs) -> Result<()> {
    debug!(username = %credentials.username, "cmd_login: called");
    let password = read_password(&credentials)?;
    let api = open_api(config)?;
    let mut store = open_session(config);

    let mut auth = AuthWorkflow::new();
    match auth
        .submit(api.as_ref(), &mut store, &credentials.username, &password)
        .await
    {
        AuthOutcome::LoggedIn { username } => {
            println!("{} Logged in as {}", "✓".green(), username.cyan());
            if !store.is_persistent() {
                warn!("cmd_login: session not persisted");
                println!("{} Session could not be saved; it lasts for this command only", "!".yellow());
            }
            Ok(())
        }
        AuthOutcome::Rejected(message) => Err(eyre!(message)),
        other => Err(eyre!("Unexpected login outcome: {:?}", other)),
    }
}

/// Create an account
async fn cmd_register(config: &Config, credentials: CredentialArgs) -> Result<()> {
    debug!(username = %credentials.username, "cmd_register: called");
    let password = read_password(&credentials)?;
    let api = open_api(config)?;
    let mut store = open_session(config);

    let mut auth = AuthWorkflow::new();
    auth.handle(AuthEvent::SwitchMode(AuthMode::Register));
    match auth
        .submit(api.as_ref(), &mut store, &credentials.username, &password)
        .await
    {
        AuthOutcome::Registered => {
            println!("{} {}", "✓".green(), REGISTERED_NOTICE);
            Ok(())
        }
        AuthOutcome::Rejected(message) => Err(eyre!(message)),
        other => Err(eyre!("Unexpected registration outcome: {:?}", other)),
    }
}

fn cmd_logout(config: &Config) -> Result<()> {
    debug!("cmd_logout: called");
    let mut store = open_session(config);
    match store.session().username() {
        Some(username) => {
            let username = username.to_string();
            store.logout();
            println!("{} Logged out {}", "✓".green(), username);
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

fn cmd_whoami(config: &Config) -> Result<()> {
    debug!("cmd_whoami: called");
    let store = open_session(config);
    match store.session().username() {
        Some(username) => println!("{}", username),
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Analyze one record, printing the result as soon as it arrives
async fn cmd_analyze(config: &Config, record_path: Option<PathBuf>, set: Vec<String>, format: OutputFormat) -> Result<()> {
    debug!(?record_path, ?set, ?format, "cmd_analyze: called");
    let mut store = open_session(config);

    let guard = RouteGuard::new(store.reader());
    if guard.resolve(Route::Dashboard).is_redirect() {
        return Err(eyre!("Not logged in. Run `ra login -u USERNAME` first."));
    }

    let mut record = match &record_path {
        Some(path) => EmployeeRecord::load_overlay(path)?,
        None => EmployeeRecord::default(),
    };
    for assignment in &set {
        record
            .apply_assignment(assignment)
            .context(format!("Invalid --set '{}'", assignment))?;
    }

    let api = open_api(config)?;
    let mut workflow = AnalysisWorkflow::new();
    let outcome = workflow
        .run(api.as_ref(), &store.reader(), record, |state| {
            if format == OutputFormat::Text {
                print_progress(state);
            }
        })
        .await;

    match outcome {
        RunOutcome::SessionExpired => {
            store.logout();
            return Err(eyre!(SESSION_EXPIRED));
        }
        RunOutcome::Rejected => return Err(eyre!("An analysis is already running")),
        RunOutcome::Finished => {}
    }

    let state = workflow.state();
    if format == OutputFormat::Json && state.result().is_some() {
        println!("{}", serde_json::to_string_pretty(&analysis_json(state))?);
    }
    analysis_status(state)
}

/// Exit status of a finished analysis; a missing plan fails the command
fn analysis_status(state: &AnalysisState) -> Result<()> {
    match state {
        AnalysisState::Failed(failure) => Err(eyre!(failure.message())),
        AnalysisState::PlanFailed { failure, .. } => Err(eyre!("Retention plan unavailable: {}", failure.message())),
        _ => Ok(()),
    }
}

/// Text output for each state the analysis passes through
fn print_progress(state: &AnalysisState) {
    match state {
        AnalysisState::Loading { .. } => eprintln!("{}", "Analyzing...".dimmed()),
        AnalysisState::PartialResult { result, .. } => {
            let class = result.risk_class();
            let percent = if class.is_critical() {
                result.percent().red().bold()
            } else {
                result.percent().green().bold()
            };
            println!("Churn Risk: {}", percent);
            println!("{}", class.advice());
            if let Some(level) = &result.risk_level {
                println!("{} {}", "Risk level:".dimmed(), level);
            }
            if let Some(model) = &result.model_used {
                println!("{} {}", "Model:".dimmed(), model);
            }
            eprintln!("{}", "Generating retention plan...".dimmed());
        }
        AnalysisState::Succeeded { plan, .. } => {
            println!();
            println!("{}", "Retention Plan".cyan().bold());
            println!("{}", plan.text);
        }
        AnalysisState::Idle | AnalysisState::PlanFailed { .. } | AnalysisState::Failed(_) => {}
    }
}

fn analysis_json(state: &AnalysisState) -> serde_json::Value {
    let result = state.result();
    serde_json::json!({
        "churn_probability": result.map(|r| r.churn_probability),
        "risk_class": result.map(|r| r.risk_class().label()),
        "risk_level": result.and_then(|r| r.risk_level.clone()),
        "model_used": result.and_then(|r| r.model_used.clone()),
        "retention_plan": state.plan().map(|p| p.text.clone()),
        "plan_error": state.failure().map(|f| f.message()),
    })
}

fn cmd_record_template(format: RecordFormat) -> Result<()> {
    debug!(?format, "cmd_record_template: called");
    let record = EmployeeRecord::default();
    let text = match format {
        RecordFormat::Yaml => serde_yaml::to_string(&record)?,
        RecordFormat::Json => serde_json::to_string_pretty(&record)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

fn cmd_record_fields() -> Result<()> {
    debug!("cmd_record_fields: called");
    let mut group = None;
    for i in display_order() {
        let spec = &SCHEMA[i];
        if group != Some(spec.group) {
            if group.is_some() {
                println!();
            }
            println!("{}", spec.group.title().cyan().bold());
            group = Some(spec.group);
        }
        println!(
            "  {:<26} {:<40} {}",
            spec.name,
            spec.kind.describe(),
            format!("default {}", spec.default_value()).dimmed()
        );
    }
    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    debug!("cmd_health: called");
    let api = open_api(config)?;
    let health = api
        .health()
        .await
        .context(format!("Service at {} is not reachable", config.api.base_url))?;
    println!("{} {} is {}", "✓".green(), config.api.base_url, health.status.cyan());
    Ok(())
}

async fn cmd_tui(config: &Config) -> Result<()> {
    debug!("cmd_tui: called");
    let store = open_session(config);
    let api = open_api(config)?;
    tui::run(store, api, Duration::from_millis(config.tui.tick_rate_ms)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use retentionai::workflow::{AnalysisResult, Failure, RetentionPlan};

    fn result() -> AnalysisResult {
        AnalysisResult {
            churn_probability: 72.5,
            risk_level: None,
            model_used: None,
        }
    }

    #[test]
    fn test_analysis_status_fails_without_plan() {
        let state = AnalysisState::PlanFailed {
            result: result(),
            failure: Failure::Rejected("Plan generator unavailable".to_string()),
        };
        let err = analysis_status(&state).unwrap_err();
        assert_eq!(err.to_string(), "Retention plan unavailable: Plan generator unavailable");

        // The partial result still goes out in JSON mode
        assert_eq!(analysis_json(&state)["churn_probability"], 72.5);
        assert_eq!(analysis_json(&state)["plan_error"], "Plan generator unavailable");
    }

    #[test]
    fn test_analysis_status() {
        let state = AnalysisState::Succeeded {
            result: result(),
            plan: RetentionPlan {
                text: "Offer a raise.".to_string(),
            },
        };
        assert!(analysis_status(&state).is_ok());

        let state = AnalysisState::Failed(Failure::Network("refused".to_string()));
        assert!(analysis_status(&state).is_err());
    }
}

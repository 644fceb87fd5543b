//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config;

/// RetentionAI - employee churn risk client
#[derive(Parser)]
#[command(
    name = "ra",
    about = "Employee churn risk analysis against a RetentionAI service",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Override api.base-url
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Create an account (does not log in)
    Register {
        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Forget the persisted session
    Logout,

    /// Show who the session belongs to
    Whoami,

    /// Analyze one employee record (requires login)
    ///
    /// Exits non-zero when the prediction or the retention plan fails; the
    /// prediction is still printed when only the plan failed.
    Analyze {
        /// Partial record (YAML or JSON) overlaid on the defaults
        #[arg(short, long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Override a field, e.g. --set OverTime=Yes
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Inspect the record schema
    Record {
        #[command(subcommand)]
        command: RecordCommand,
    },

    /// Check that the service is up
    Health,

    /// Launch the interactive dashboard
    Tui,
}

/// Username and password for login/register
#[derive(Debug, clap::Args)]
pub struct CredentialArgs {
    /// Username
    #[arg(short, long)]
    pub username: String,

    /// Password
    #[arg(short, long, conflicts_with = "password_stdin")]
    pub password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

/// Record subcommands
#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Print the default record
    Template {
        /// Output format
        #[arg(short, long, default_value = "yaml")]
        format: RecordFormat,
    },

    /// List fields with their kinds and defaults
    Fields,
}

/// Output format for analysis results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Serialization for record templates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "RecordFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use yaml or json", s)),
        }
    }
}

/// Path of the log file
pub fn get_log_path() -> PathBuf {
    config::data_dir().join("logs").join("retentionai.log")
}

/// Trailer for `--help`
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();
    help.push_str("Config is read from --config, ./.retentionai.yml or ~/.config/retentionai/retentionai.yml\n");
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

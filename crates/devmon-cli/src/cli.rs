//! CLI argument definitions for DevMon.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `teams` | List teams from every configured tracker, or one |
//! | `team` | Show one team from one tracker |
//! | `sources` | Show registered trackers and probe their connections |
//! | `analyze` | AI risk predictions per team |
//! | `insights` | AI insights per team |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--mock` | `false` | Serve sample data instead of calling trackers |
//! | `--timeout-ms` | from env | Per-request tracker timeout in ms |
//! | `--log-level` | `warn` | Log filter written to stderr |
//!
//! # Examples
//!
//! ```bash
//! devmon teams --pretty
//! devmon team ciro-irp-1 --source azure-devops --format table
//! devmon analyze --mock --sprint-days 10
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use devmon_core::SourceId;

/// DevMon - team data across project trackers
///
/// Reads teams, members, sprints and metrics from Azure DevOps and Jira
/// through one normalized model, with optional AI risk analysis.
#[derive(Debug, Parser)]
#[command(
    name = "devmon",
    author,
    version,
    about = "Team data across project trackers",
    long_about = "DevMon reads teams, members, sprints and metrics from Azure DevOps and \
Jira and reports them in one normalized shape.\n\
\n\
Trackers are configured through DEVMON_* environment variables. Without any \
credentials, sample data is served.\n\
\n\
Use 'devmon <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Serve sample data in place of every configured tracker.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Per-request tracker timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log filter (e.g. `info`, `devmon_core=debug`). Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminals.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Tracker selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    AzureDevops,
    Jira,
}

impl From<SourceArg> for SourceId {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::AzureDevops => Self::AzureDevOps,
            SourceArg::Jira => Self::Jira,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List teams with members, current sprint and metrics.
    ///
    ///   devmon teams
    ///   devmon teams --source jira
    Teams(TeamsArgs),

    /// Show a single team.
    ///
    ///   devmon team ciro-irp-1 --source azure-devops
    Team(TeamArgs),

    /// Registered trackers and their connection status.
    Sources,

    /// Risk predictions for each team's current sprint.
    ///
    ///   devmon analyze
    ///   devmon analyze --team ciro-irp-1 --source azure-devops --sprint-days 10
    Analyze(AnalyzeArgs),

    /// Short bulleted insights for each team.
    Insights(TeamSelection),
}

#[derive(Debug, Args)]
pub struct TeamsArgs {
    /// Only this tracker; its failure is reported instead of skipped.
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,
}

#[derive(Debug, Args)]
pub struct TeamArgs {
    /// Team identifier as reported by the tracker.
    pub team_id: String,

    #[arg(long, value_enum)]
    pub source: SourceArg,
}

/// Either every team, or one team of one tracker.
#[derive(Debug, Args)]
pub struct TeamSelection {
    /// Restrict to this team (requires --source).
    #[arg(long, requires = "source")]
    pub team: Option<String>,

    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub selection: TeamSelection,

    /// Sprint length in days; defaults to the sprint's dates, else 14.
    #[arg(long)]
    pub sprint_days: Option<u32>,
}

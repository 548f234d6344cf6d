//! # DevMon Core
//!
//! Team data abstraction layer for the DevMon developer-productivity toolkit.
//!
//! ## Overview
//!
//! This crate lets callers query teams, members, sprints and metrics
//! uniformly across project trackers:
//!
//! - **Canonical domain model** for teams, members, sprints and metrics
//! - **Tracker clients** for Azure DevOps and Jira over an injectable transport
//! - **Normalizer** mapping tracker payloads into the domain model
//! - **Adapter contract** ([`TeamSource`]) and a closed adapter set
//! - **Registry** fanning out to every configured tracker with failure isolation
//! - **Mock adapter** serving deterministic sample data when no credentials exist
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Azure DevOps, Jira and mock adapters |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Team, Member, Sprint, TeamMetrics, WorkItem |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalize`] | Tracker payload to domain conversion |
//! | [`payload`] | Tracker wire payloads |
//! | [`registry`] | Source registry and fan-out |
//! | [`retry`] | Retry with backoff |
//! | [`source`] | Source identifiers |
//! | [`team_source`] | Adapter trait and structured source errors |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use devmon_core::{DevMonConfig, TeamRegistryBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = TeamRegistryBuilder::new()
//!         .with_config(DevMonConfig::from_env()?)
//!         .build();
//!
//!     for team in registry.all_teams().await {
//!         println!("{} [{}] velocity={}", team.name, team.source, team.metrics.velocity);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod payload;
pub mod registry;
pub mod retry;
pub mod source;
pub mod team_source;

pub use adapters::{
    AzureDevOpsAdapter, AzureDevOpsClient, AzureDevOpsTeamData, JiraAdapter, JiraClient,
    JiraTeamData, MockAdapter, MockLatency, TrackerAdapter,
};
pub use config::{AzureDevOpsConfig, DevMonConfig, JiraConfig, TrackerConfig};
pub use domain::{
    parse_sprint_date, Member, MemberRole, Sprint, SprintStatus, Team, TeamMetrics, WorkItem,
    WorkItemStates,
};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpFuture, HttpMethod, HttpRequest,
    HttpResponse, ReqwestHttpClient,
};
pub use normalize::{normalize_azure_devops_team, normalize_jira_team};
pub use registry::{FanOutReport, SourceOutcome, SourceStatus, TeamRegistry, TeamRegistryBuilder};
pub use retry::{Backoff, RetryConfig, RetryingHttpClient};
pub use source::SourceId;
pub use team_source::{SourceError, SourceErrorKind, SourceFuture, TeamSource};

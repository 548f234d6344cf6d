//! Team source trait and error types.
//!
//! This module defines the adapter contract (`TeamSource`) every tracker
//! integration implements, along with the structured error the registry uses
//! to decide whether a failure is absorbed or surfaced.
//!
//! # Operations
//!
//! | Operation | Output | Description |
//! |-----------|--------|-------------|
//! | [`teams`](TeamSource::teams) | `Vec<Team>` | Every team with members, sprint and metrics |
//! | [`team`](TeamSource::team) | `Option<Team>` | One team by id |
//! | [`team_members`](TeamSource::team_members) | `Vec<Member>` | Members of a team |
//! | [`current_sprint`](TeamSource::current_sprint) | `Option<Sprint>` | Active sprint of a team |
//! | [`team_metrics`](TeamSource::team_metrics) | [`TeamMetrics`] | Metrics for the active sprint |
//! | [`check_connection`](TeamSource::check_connection) | `()` | Credential / reachability probe |
//!
//! # Example
//!
//! ```rust,ignore
//! use devmon_core::{MockAdapter, TeamSource};
//!
//! async fn print_teams(source: &dyn TeamSource) -> Result<(), devmon_core::SourceError> {
//!     for team in source.teams().await? {
//!         println!("{} ({} members)", team.name, team.members.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Member, SourceId, Sprint, Team, TeamMetrics};

/// Boxed future returned by [`TeamSource`] operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotConfigured,
    Unauthorized,
    NotFound,
    RateLimited,
    Unavailable,
    Timeout,
    MalformedPayload,
    InvalidRequest,
    Internal,
}

/// Structured tracker error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    status: Option<u16>,
    retryable: bool,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retryable,
        }
    }

    pub fn not_configured(source: impl Display) -> Self {
        Self::new(
            SourceErrorKind::NotConfigured,
            format!("source '{source}' is not configured"),
            false,
        )
    }

    /// Classifies a non-2xx tracker response.
    pub fn from_status(source: SourceId, status: u16) -> Self {
        let (kind, retryable) = match status {
            401 | 403 => (SourceErrorKind::Unauthorized, false),
            404 => (SourceErrorKind::NotFound, false),
            408 => (SourceErrorKind::Timeout, true),
            429 => (SourceErrorKind::RateLimited, true),
            400..=499 => (SourceErrorKind::InvalidRequest, false),
            _ => (SourceErrorKind::Unavailable, true),
        };
        Self {
            kind,
            message: format!("{source} API error: upstream returned status {status}"),
            status: Some(status),
            retryable,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Timeout, message, true)
    }

    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::MalformedPayload, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::NotFound, message, false)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message, false)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the upstream response, when the failure came from one.
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::Unauthorized => "source.unauthorized",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::MalformedPayload => "source.malformed_payload",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Tracker adapter contract.
///
/// Implementations must be `Send + Sync`; the registry shares them across
/// concurrently polled futures.
pub trait TeamSource: Send + Sync {
    /// Provenance tag stamped on every team this source returns.
    fn id(&self) -> SourceId;

    /// Fetches every team with members, current sprint and metrics.
    ///
    /// A failure to enrich one team degrades that team to a placeholder; only
    /// a failure to list teams at all is an error.
    fn teams(&self) -> SourceFuture<'_, Vec<Team>>;

    /// Fetches one team by id, `None` when the tracker has no such team.
    fn team<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Team>>;

    fn team_members<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Vec<Member>>;

    fn current_sprint<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, Option<Sprint>>;

    fn team_metrics<'a>(&'a self, team_id: &'a str) -> SourceFuture<'a, TeamMetrics>;

    /// Verifies credentials and reachability with the cheapest request the
    /// tracker offers.
    fn check_connection(&self) -> SourceFuture<'_, ()>;
}

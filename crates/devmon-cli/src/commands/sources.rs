use serde::Serialize;

use devmon_core::{SourceStatus, TeamRegistry};

use crate::error::CliError;

use super::{elapsed_ms, CommandResult};

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub async fn run(registry: &TeamRegistry) -> Result<CommandResult, CliError> {
    let started = std::time::Instant::now();
    let statuses = registry.check_connections().await;

    let warnings = statuses
        .iter()
        .filter(|status| !status.connected)
        .map(|status| match &status.error {
            Some(error) => format!("{}: connection check failed: {error}", status.source),
            None => format!("{}: connection check failed", status.source),
        })
        .collect::<Vec<_>>();

    let data = serde_json::to_value(SourcesResponseData { sources: statuses })?;
    Ok(CommandResult::ok(data, registry.registered_sources())
        .with_warnings(warnings)
        .with_latency(elapsed_ms(started)))
}

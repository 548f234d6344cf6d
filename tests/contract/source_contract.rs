#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use devmon_core::{
    AzureDevOpsConfig, DevMonConfig, HttpClient, JiraConfig, MockAdapter, MockLatency, SourceId,
    TeamSource, TrackerAdapter, TrackerConfig,
};

use support::{FakeHttpClient, AZURE_BASE_URL, JIRA_BASE_URL};

struct SourceCase {
    name: &'static str,
    source: SourceId,
    adapter: Arc<dyn TeamSource>,
    team_id: &'static str,
}

fn source_cases() -> Vec<SourceCase> {
    let http: Arc<dyn HttpClient> =
        Arc::new(FakeHttpClient::default().with_azure_project().with_jira_project());
    let config = DevMonConfig::default();

    let azure = AzureDevOpsConfig::new("contoso", "platform", "pat-123")
        .expect("valid azure config")
        .with_base_url(AZURE_BASE_URL)
        .expect("valid base url");
    let jira = JiraConfig::new(JIRA_BASE_URL, "me@company.com", "token", "DEV")
        .expect("valid jira config");

    vec![
        SourceCase {
            name: "azure-devops",
            source: SourceId::AzureDevOps,
            adapter: Arc::new(TrackerAdapter::from_config(
                TrackerConfig::AzureDevOps(azure),
                Arc::clone(&http),
                &config,
            )),
            team_id: "team-1",
        },
        SourceCase {
            name: "jira",
            source: SourceId::Jira,
            adapter: Arc::new(TrackerAdapter::from_config(
                TrackerConfig::Jira(jira),
                Arc::clone(&http),
                &config,
            )),
            team_id: "84",
        },
        SourceCase {
            name: "mock",
            source: SourceId::AzureDevOps,
            adapter: Arc::new(MockAdapter::default().with_latency(MockLatency::none())),
            team_id: "ciro-irp-1",
        },
        SourceCase {
            name: "mock-as-jira",
            source: SourceId::Jira,
            adapter: Arc::new(MockAdapter::new(SourceId::Jira).with_latency(MockLatency::none())),
            team_id: "ciro-irp-2",
        },
    ]
}

#[tokio::test]
async fn teams_are_tagged_with_the_adapter_source() {
    for case in source_cases() {
        assert_eq!(case.adapter.id(), case.source, "{}: id", case.name);

        let teams = case
            .adapter
            .teams()
            .await
            .unwrap_or_else(|error| panic!("{}: teams failed: {error}", case.name));

        assert!(!teams.is_empty(), "{}: at least one team", case.name);
        for team in &teams {
            assert_eq!(team.source, case.source, "{}: source of {}", case.name, team.id);
            assert!(!team.id.is_empty(), "{}: team id", case.name);
            assert!(!team.name.is_empty(), "{}: team name", case.name);
            assert!(team.metrics.sprint_progress <= 100, "{}: progress", case.name);
            assert!(team.metrics.velocity >= 0.0, "{}: velocity", case.name);
        }
    }
}

#[tokio::test]
async fn single_team_matches_the_listing() {
    for case in source_cases() {
        let teams = case.adapter.teams().await.expect("teams");
        let listed = teams
            .iter()
            .find(|team| team.id == case.team_id)
            .unwrap_or_else(|| panic!("{}: team {} listed", case.name, case.team_id));

        let team = case
            .adapter
            .team(case.team_id)
            .await
            .expect("team lookup")
            .unwrap_or_else(|| panic!("{}: team {} found", case.name, case.team_id));

        assert_eq!(&team, listed, "{}: team matches listing", case.name);
    }
}

#[tokio::test]
async fn unknown_team_is_none() {
    for case in source_cases() {
        let team = case
            .adapter
            .team("9999")
            .await
            .unwrap_or_else(|error| panic!("{}: lookup failed: {error}", case.name));
        assert!(team.is_none(), "{}: unknown team", case.name);
    }
}

#[tokio::test]
async fn per_team_operations_agree_with_the_aggregate_team() {
    for case in source_cases() {
        let team = case
            .adapter
            .team(case.team_id)
            .await
            .expect("team lookup")
            .expect("team exists");

        let members = case.adapter.team_members(case.team_id).await.expect("members");
        let sprint = case.adapter.current_sprint(case.team_id).await.expect("sprint");
        let metrics = case.adapter.team_metrics(case.team_id).await.expect("metrics");

        assert_eq!(members, team.members, "{}: members", case.name);
        assert_eq!(sprint, team.sprint, "{}: sprint", case.name);
        assert_eq!(metrics, team.metrics, "{}: metrics", case.name);
        assert!(sprint.is_some(), "{}: sprint in progress", case.name);
    }
}

#[tokio::test]
async fn connection_check_succeeds_with_valid_credentials() {
    for case in source_cases() {
        case.adapter
            .check_connection()
            .await
            .unwrap_or_else(|error| panic!("{}: connection failed: {error}", case.name));
    }
}

#[tokio::test]
async fn live_adapters_report_sprint_metrics_from_work_items() {
    let cases = source_cases();

    let azure = cases[0].adapter.team("team-1").await.expect("team").expect("exists");
    assert_eq!(azure.members.len(), 2);
    assert_eq!(azure.metrics.velocity, 8.0);
    assert_eq!(azure.metrics.active_stories, 1);
    assert_eq!(azure.metrics.sprint_progress, 80);
    let sprint = azure.sprint.expect("sprint");
    assert_eq!(sprint.name, "Sprint 15");
    assert_eq!(sprint.planned_points, 10.0);
    assert_eq!(sprint.completed_points, 8.0);

    let jira = cases[1].adapter.team("84").await.expect("team").expect("exists");
    assert_eq!(jira.name, "DEV board");
    assert_eq!(jira.metrics.velocity, 5.0);
    assert_eq!(jira.metrics.active_stories, 1);
    assert_eq!(jira.metrics.average_cycle_time_days, None);
}

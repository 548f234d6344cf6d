#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use devmon_core::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse};

pub const AZURE_BASE_URL: &str = "https://dev.azure.test";
pub const AZURE_API: &str = "https://dev.azure.test/contoso/platform/_apis";
pub const JIRA_BASE_URL: &str = "https://contoso.atlassian.net";
pub const JIRA_ISSUES: &str = "https://contoso.atlassian.net/rest/agile/1.0/sprint/7/issue?fields=summary%2Cstatus%2Cassignee%2Cresolutiondate%2Ccustomfield_10016";

enum Reply {
    Response(HttpResponse),
    Failure(HttpError),
}

/// Transport answering by exact URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeHttpClient {
    routes: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeHttpClient {
    pub fn route(&self, url: impl Into<String>, response: HttpResponse) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.into(), Reply::Response(response));
    }

    pub fn fail(&self, url: impl Into<String>, error: HttpError) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.into(), Reply::Failure(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.url == url)
            .count()
    }

    /// Routes for one Azure DevOps team `team-1` in sprint `Sprint 15`.
    pub fn with_azure_project(self) -> Self {
        self.route(
            format!("{AZURE_BASE_URL}/contoso/_apis/projects/platform?api-version=7.0"),
            HttpResponse::ok_json(r#"{"id":"p-1","name":"platform"}"#),
        );
        self.route(
            format!("{AZURE_API}/teams?api-version=7.0"),
            HttpResponse::ok_json(r#"{"value":[{"id":"team-1","name":"Platform"}]}"#),
        );
        self.route(
            format!("{AZURE_API}/teams/team-1/members?api-version=7.0"),
            HttpResponse::ok_json(
                r#"{"value":[
                    {"identity":{"id":"m-1","displayName":"Sarah Johnson","uniqueName":"sarah@company.com"},"isTeamAdmin":true},
                    {"identity":{"id":"m-2","displayName":"Mike Chen","uniqueName":"mike@company.com"}}
                ]}"#,
            ),
        );
        self.route(
            format!("{AZURE_API}/work/teamsettings/iterations?api-version=7.0&teamId=team-1"),
            HttpResponse::ok_json(
                r#"{"value":[{"id":"it-15","name":"Sprint 15","path":"platform\\Sprint 15","attributes":{"startDate":"2024-01-15T00:00:00Z","finishDate":"2024-01-29T00:00:00Z","timeFrame":"current"}}]}"#,
            ),
        );
        self.route(
            format!("{AZURE_API}/wit/wiql?api-version=7.0"),
            HttpResponse::ok_json(r#"{"workItems":[{"id":1},{"id":2}]}"#),
        );
        self.route(
            format!("{AZURE_API}/wit/workitems?ids=1,2&api-version=7.0"),
            HttpResponse::ok_json(
                r#"{"value":[
                    {"id":1,"fields":{"System.Title":"a","System.State":"Closed","Microsoft.VSTS.Scheduling.StoryPoints":8.0}},
                    {"id":2,"fields":{"System.Title":"b","System.State":"Active","Microsoft.VSTS.Scheduling.StoryPoints":2.0}}
                ]}"#,
            ),
        );
        self
    }

    /// Routes for Jira project `DEV` with scrum board 84 running sprint 7.
    pub fn with_jira_project(self) -> Self {
        self.route(
            format!("{JIRA_BASE_URL}/rest/api/3/project/DEV"),
            HttpResponse::ok_json(r#"{"id":"10000","key":"DEV","name":"Develop"}"#),
        );
        self.route(
            format!("{JIRA_BASE_URL}/rest/agile/1.0/board?projectKeyOrId=DEV"),
            HttpResponse::ok_json(
                r#"{"values":[{"id":84,"name":"DEV board","type":"scrum"}],"isLast":true}"#,
            ),
        );
        self.route(
            format!("{JIRA_BASE_URL}/rest/api/3/user/assignable/search?project=DEV"),
            HttpResponse::ok_json(
                r#"[{"accountId":"acc-1","displayName":"Lisa Wang","emailAddress":"lisa.wang@company.com","active":true}]"#,
            ),
        );
        self.route(
            format!("{JIRA_BASE_URL}/rest/agile/1.0/board/84/sprint?state=active"),
            HttpResponse::ok_json(
                r#"{"values":[{"id":7,"name":"DEV Sprint 7","state":"active","startDate":"2024-01-01T09:00:00.000Z","endDate":"2024-01-15T09:00:00.000Z"}]}"#,
            ),
        );
        self.route(
            format!("{JIRA_ISSUES}&startAt=0&maxResults=100"),
            HttpResponse::ok_json(
                r#"{"total":2,"issues":[
                    {"id":"10001","key":"DEV-1","fields":{"summary":"a","status":{"name":"Done"},"customfield_10016":5.0}},
                    {"id":"10002","key":"DEV-2","fields":{"summary":"b","status":{"name":"In Progress"},"customfield_10016":3.0}}
                ]}"#,
            ),
        );
        self
    }
}

impl HttpClient for FakeHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let reply = match self.routes.lock().expect("routes lock").get(&request.url) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Failure(error)) => Err(error.clone()),
            None => Ok(HttpResponse::new(404, "not found")),
        };
        self.requests.lock().expect("requests lock").push(request);
        Box::pin(async move { reply })
    }
}

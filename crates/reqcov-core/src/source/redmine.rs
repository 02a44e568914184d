//! HTTP client for the Redmine REST API

use super::tracker::{Credentials, Issue, IssueQuery, IssueTracker};
use crate::error::ParserError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use facet::Facet;
use tracing::debug;

const PAGE_SIZE: u64 = 100;

#[derive(Debug, Facet)]
struct IssuesPage {
    #[facet(default)]
    issues: Vec<RedmineIssue>,
    #[facet(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Facet)]
struct RedmineIssue {
    id: u64,
    #[facet(default)]
    subject: String,
    #[facet(default)]
    description: Option<String>,
    #[facet(default)]
    fixed_version: Option<NamedRef>,
}

#[derive(Debug, Facet)]
struct NamedRef {
    #[facet(default)]
    name: String,
}

impl From<RedmineIssue> for Issue {
    fn from(issue: RedmineIssue) -> Self {
        Issue {
            id: issue.id,
            subject: issue.subject,
            description: issue.description,
            target_version: issue.fixed_version.map(|v| v.name),
        }
    }
}

/// Fetches issues from `<base_url>/issues.json`, following pagination
pub struct RedmineClient {
    base_url: String,
    credentials: Credentials,
    agent: ureq::Agent,
}

impl RedmineClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    fn issues_url(&self) -> String {
        format!("{}/issues.json", self.base_url.trim_end_matches('/'))
    }

    fn fetch_page(&self, query: &IssueQuery, offset: u64) -> Result<IssuesPage, ParserError> {
        let url = self.issues_url();
        debug!("GET {} (offset {})", url, offset);

        let mut request = self.agent.get(&url);
        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        request = request
            .query("offset", offset.to_string())
            .query("limit", PAGE_SIZE.to_string());

        match &self.credentials {
            Credentials::None => {}
            Credentials::ApiKey(key) => {
                request = request.header("X-Redmine-API-Key", key.as_str());
            }
            Credentials::Basic { username, password } => {
                let token = STANDARD.encode(format!("{username}:{password}"));
                request = request.header("Authorization", format!("Basic {token}"));
            }
        }

        let mut response = request.call().map_err(|err| match err {
            ureq::Error::StatusCode(status @ (401 | 403)) => ParserError::Authentication {
                url: url.clone(),
                status,
            },
            ureq::Error::StatusCode(status) => ParserError::Http {
                url: url.clone(),
                status,
            },
            other => ParserError::Unreachable {
                url: url.clone(),
                reason: other.to_string(),
            },
        })?;

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| ParserError::Unreachable {
                url: url.clone(),
                reason: err.to_string(),
            })?;

        parse_page(&body, &url)
    }
}

fn parse_page(body: &str, url: &str) -> Result<IssuesPage, ParserError> {
    facet_json::from_str(body).map_err(|err| ParserError::Malformed {
        location: url.to_string(),
        reason: err.to_string(),
    })
}

impl IssueTracker for RedmineClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, ParserError> {
        let mut issues = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(query, offset)?;
            let count = page.issues.len() as u64;
            issues.extend(page.issues.into_iter().map(Issue::from));
            offset += count;

            let total = page.total_count.unwrap_or(offset);
            if count == 0 || offset >= total {
                break;
            }
        }

        Ok(issues)
    }
}

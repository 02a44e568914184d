//! Requirements backed by issues of an issue tracker
//!
//! The HTTP conversation with the tracker is delegated to an [`IssueTracker`]
//! implementation (see `RedmineClient`). This module owns what happens to the
//! fetched issues: which ones count as requirements, and how each one maps to
//! a [`Requirement`].

use super::RequirementSource;
use crate::error::{ConfigError, ParserError, Result};
use crate::requirement::{Requirement, VERSION_UNKNOWN};
use crate::tag::TagMatcher;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const DEFAULT_STATUS_FILTER: &str = "*";

/// An issue as returned by the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: u64,
    pub subject: String,
    pub description: Option<String>,
    /// Name of the version the issue is planned for
    pub target_version: Option<String>,
}

/// How to authenticate against the tracker
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    None,
    ApiKey(String),
    Basic { username: String, password: String },
}

impl Credentials {
    /// Build credentials from optional config values.
    ///
    /// Blank values count as absent. An api key and a user name are mutually
    /// exclusive, and a password needs a user name.
    pub fn from_parts(
        api_key: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(api_key), present(username), present(password)) {
            (Some(_), Some(_), _) => Err(ConfigError::ConflictingOptions(
                "an api key and a username cannot both be set".to_string(),
            )),
            (Some(key), None, None) => Ok(Credentials::ApiKey(key)),
            (Some(_), None, Some(_)) => Err(ConfigError::ConflictingOptions(
                "a password cannot be combined with an api key".to_string(),
            )),
            (None, Some(username), password) => Ok(Credentials::Basic {
                username,
                password: password.unwrap_or_default(),
            }),
            (None, None, Some(_)) => {
                Err(ConfigError::MissingOption("requirements.redmine.username"))
            }
            (None, None, None) => Ok(Credentials::None),
        }
    }
}

// Secrets stay out of logs and panics
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(***)"),
            Credentials::Basic { username, .. } => {
                write!(f, "Basic {{ username: {username:?}, password: *** }}")
            }
        }
    }
}

/// Query sent to the tracker for one parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub project: String,
    pub status: String,
    pub tracker: Option<String>,
    /// Related data to embed (`children`, `relations`)
    pub include: Vec<String>,
    pub extra_params: Vec<(String, String)>,
}

impl IssueQuery {
    /// Query-string parameters, in a stable order
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("project_id".to_string(), self.project.clone())];
        if let Some(tracker) = &self.tracker {
            params.push(("tracker_id".to_string(), tracker.clone()));
        }
        params.push(("status_id".to_string(), self.status.clone()));
        if !self.include.is_empty() {
            params.push(("include".to_string(), self.include.join(",")));
        }
        params.extend(self.extra_params.iter().cloned());
        params
    }
}

/// The collaborator that talks to the tracker
pub trait IssueTracker: Sync {
    /// Root URL of the tracker, used to build back-links
    fn base_url(&self) -> &str;

    /// All issues matching `query`
    fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, ParserError>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for &T {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, ParserError> {
        (**self).fetch_issues(query)
    }
}

/// Options of the tracker-backed source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerOptions {
    pub project: String,
    pub include_children: bool,
    pub include_relations: bool,
    pub status_filter: String,
    pub tracker_filter: Option<String>,
    /// Only issues planned for one of these versions; empty means all
    pub target_versions: Vec<String>,
    /// Skip issues whose subject has no tag, and read the revision from it
    pub require_tag: bool,
    pub extra_params: Vec<(String, String)>,
}

impl TrackerOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            include_children: true,
            include_relations: true,
            status_filter: DEFAULT_STATUS_FILTER.to_string(),
            tracker_filter: None,
            target_versions: Vec::new(),
            require_tag: true,
            extra_params: Vec::new(),
        }
    }

    pub fn query(&self) -> IssueQuery {
        let mut include = Vec::new();
        if self.include_children {
            include.push("children".to_string());
        }
        if self.include_relations {
            include.push("relations".to_string());
        }
        IssueQuery {
            project: self.project.clone(),
            status: self.status_filter.clone(),
            tracker: self
                .tracker_filter
                .clone()
                .filter(|t| !t.trim().is_empty()),
            include,
            extra_params: self.extra_params.clone(),
        }
    }
}

/// Requirements read from the issues of a tracker project
pub struct TrackerSource<T> {
    tracker: T,
    options: TrackerOptions,
}

impl<T: IssueTracker> TrackerSource<T> {
    pub fn new(tracker: T, options: TrackerOptions) -> Result<Self, ConfigError> {
        if tracker.base_url().trim().is_empty() {
            return Err(ConfigError::MissingOption("requirements.redmine.url"));
        }
        if options.project.trim().is_empty() {
            return Err(ConfigError::MissingOption("requirements.redmine.project"));
        }
        if options.status_filter.trim().is_empty() {
            return Err(ConfigError::MissingOption("requirements.redmine.status"));
        }
        Ok(Self { tracker, options })
    }

    /// Filter and map fetched issues.
    ///
    /// Issues are mapped in parallel. The first requirement of a given id wins
    /// if the tracker returned the same issue twice.
    pub fn requirements_from_issues(
        &self,
        issues: &[Issue],
        tags: &TagMatcher,
    ) -> Vec<Requirement> {
        #[cfg(feature = "parallel")]
        let mapped: Vec<Requirement> = {
            use rayon::prelude::*;

            issues
                .par_iter()
                .filter(|issue| self.accepts(issue, tags))
                .map(|issue| self.to_requirement(issue, tags))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mapped: Vec<Requirement> = issues
            .iter()
            .filter(|issue| self.accepts(issue, tags))
            .map(|issue| self.to_requirement(issue, tags))
            .collect();

        let mut seen = HashSet::with_capacity(mapped.len());
        mapped
            .into_iter()
            .filter(|req| {
                let fresh = seen.insert(req.id.clone());
                if !fresh {
                    warn!("Dropping duplicate issue #{} returned by the tracker", req.id);
                }
                fresh
            })
            .collect()
    }

    fn accepts(&self, issue: &Issue, tags: &TagMatcher) -> bool {
        if self.options.require_tag && !tags.is_match(&issue.subject) {
            debug!("Issue #{} has no tag in its subject, skipping", issue.id);
            return false;
        }
        if self.options.target_versions.is_empty() {
            return true;
        }
        issue
            .target_version
            .as_ref()
            .is_some_and(|v| self.options.target_versions.contains(v))
    }

    fn to_requirement(&self, issue: &Issue, tags: &TagMatcher) -> Requirement {
        let revision = if self.options.require_tag {
            tags.extract_revision(&issue.subject)
        } else {
            None
        };

        Requirement {
            id: issue.id.to_string(),
            version: issue
                .target_version
                .clone()
                .unwrap_or_else(|| VERSION_UNKNOWN.to_string()),
            revision,
            short_description: issue.subject.clone(),
            full_description: issue.description.clone().unwrap_or_default(),
            link: Some(format!(
                "{}/issues/{}",
                self.tracker.base_url().trim_end_matches('/'),
                issue.id
            )),
        }
    }
}

impl<T: IssueTracker> RequirementSource for TrackerSource<T> {
    fn location(&self) -> String {
        format!(
            "{} (project {})",
            self.tracker.base_url(),
            self.options.project
        )
    }

    fn parse(&self, tags: &TagMatcher) -> Result<Vec<Requirement>> {
        info!("Retrieving issues from {}", self.location());
        let issues = self.tracker.fetch_issues(&self.options.query())?;
        debug!("Tracker returned {} issues", issues.len());

        let requirements = self.requirements_from_issues(&issues, tags);
        info!("{} requirements were built from tracker issues", requirements.len());
        Ok(requirements)
    }
}

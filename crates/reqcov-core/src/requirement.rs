//! Declared requirements

use crate::error::ConfigError;
use facet::Facet;
use std::collections::HashSet;

/// Version reported when a source cannot tell which version a requirement targets
pub const VERSION_UNKNOWN: &str = "unknown";

/// A declared unit of functionality to trace, independent of any code tag
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Requirement {
    /// Unique within one declaration set
    pub id: String,
    /// Target version, or [`VERSION_UNKNOWN`]
    pub version: String,
    /// Revision code tags must carry when revision checking is on
    #[facet(default)]
    pub revision: Option<String>,
    #[facet(default)]
    pub short_description: String,
    #[facet(default)]
    pub full_description: String,
    /// Back-link to wherever the requirement is declared
    #[facet(default)]
    pub link: Option<String>,
}

impl Requirement {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            revision: None,
            short_description: String::new(),
            full_description: String::new(),
            link: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = text.into();
        self
    }

    pub fn with_full_description(mut self, text: impl Into<String>) -> Self {
        self.full_description = text.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Reject a declaration set that uses the same id twice.
pub fn ensure_unique_ids(requirements: &[Requirement]) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(requirements.len());
    for requirement in requirements {
        if !seen.insert(requirement.id.as_str()) {
            return Err(ConfigError::DuplicateRequirement(requirement.id.clone()));
        }
    }
    Ok(())
}

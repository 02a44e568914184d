//! Requirement sources
//!
//! A source produces the declared requirement list, independently of any code
//! tag. Each variant carries its own typed options, validated when the source
//! is constructed, and every variant returns the same [`Requirement`] shape.

mod file;
#[cfg(feature = "redmine")]
mod redmine;
mod tracker;

pub use file::{DeclarationFormat, FileSource, FileSourceOptions};
#[cfg(feature = "redmine")]
pub use redmine::RedmineClient;
pub use tracker::{Credentials, Issue, IssueQuery, IssueTracker, TrackerOptions, TrackerSource};

use crate::error::Result;
use crate::requirement::Requirement;
use crate::tag::TagMatcher;

/// Anything that can produce a declared requirement list
pub trait RequirementSource {
    /// Human-readable description of where requirements come from, for logs
    fn location(&self) -> String;

    /// Fetch and interpret the declarations.
    ///
    /// `tags` is the compiled tag configuration of the run; sources that read
    /// tags out of declaration text (such as issue titles) use it, others may
    /// ignore it.
    fn parse(&self, tags: &TagMatcher) -> Result<Vec<Requirement>>;
}

impl<S: RequirementSource + ?Sized> RequirementSource for &S {
    fn location(&self) -> String {
        (**self).location()
    }

    fn parse(&self, tags: &TagMatcher) -> Result<Vec<Requirement>> {
        (**self).parse(tags)
    }
}

impl<S: RequirementSource + ?Sized> RequirementSource for Box<S> {
    fn location(&self) -> String {
        (**self).location()
    }

    fn parse(&self, tags: &TagMatcher) -> Result<Vec<Requirement>> {
        (**self).parse(tags)
    }
}

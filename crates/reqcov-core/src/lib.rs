//! reqcov-core - Core library for requirement coverage analysis
//!
//! This crate provides the building blocks for:
//! - Extracting coverage tags (`@Req(ID)`, `@Req(ID, rev=R)`) from source and test trees
//! - Reading the declared requirements from a file or an issue tracker
//! - Correlating both into a per-requirement coverage verdict
//!
//! # Features
//!
//! - `parallel` - Scan files and map tracker issues in parallel (brings in `rayon`)
//! - `redmine` - Enable [`RedmineClient`] for reading requirements from Redmine
//!   (brings in `ureq`)
//!
//! # Computing Coverage
//!
//! ```no_run
//! use reqcov_core::{FileSource, FileSourceOptions, RunConfig, pipeline};
//!
//! let config = RunConfig::new("src", "tests");
//! let source = FileSource::new(FileSourceOptions::new("requirements.yaml"))?;
//! let result = pipeline::run(&config, &source)?;
//!
//! for verdict in &result.verdicts {
//!     println!("{}: {}", verdict.requirement.id, verdict.status);
//! }
//! println!("Coverage: {}%", result.summary.percentage);
//! # Ok::<(), reqcov_core::Error>(())
//! ```
//!
//! # Custom Tag Syntax
//!
//! ```
//! use reqcov_core::TagConfig;
//!
//! let tags = TagConfig::new("#req:", r"[A-Z]+-\d+")
//!     .revision(r"@(\w+)")
//!     .compile()
//!     .unwrap();
//!
//! let m = tags.find("# see #req:AUTH-7@v2").unwrap();
//! assert_eq!(m.id, "AUTH-7");
//! assert_eq!(m.revision, Some("v2"));
//! ```

pub mod coverage;
mod error;
mod files;
pub mod pipeline;
mod requirement;
mod scanner;
pub mod source;
mod tag;

pub use coverage::{
    CorrelationOptions, CoverageCorrelator, CoverageResult, CoverageStatus, CoverageSummary,
    CoverageVerdict, Percentage, correlate,
};
pub use error::{ConfigError, Error, ParserError, PatternKind, Result};
pub use files::{FileFilter, FileMatcher, SUPPORTED_EXTENSIONS, is_supported_extension};
pub use pipeline::RunConfig;
pub use requirement::{Requirement, VERSION_UNKNOWN, ensure_unique_ids};
pub use scanner::{CodeTagScanner, CoverageTag, Location, Origin, ScanResult, ScanWarning};
#[cfg(feature = "redmine")]
pub use source::RedmineClient;
pub use source::{
    Credentials, DeclarationFormat, FileSource, FileSourceOptions, Issue, IssueQuery,
    IssueTracker, RequirementSource, TrackerOptions, TrackerSource,
};
pub use tag::{
    DEFAULT_ID_PATTERN, DEFAULT_MARKER, DEFAULT_REVISION_PATTERN, DEFAULT_TERMINATOR, TagConfig,
    TagMatch, TagMatcher,
};

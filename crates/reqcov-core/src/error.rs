//! Error taxonomy for a coverage run
//!
//! [`ConfigError`] and [`ParserError`] are fatal and abort the run before a
//! [`CoverageResult`](crate::CoverageResult) is produced. Unreadable files found
//! while scanning are not errors at all; they surface as
//! [`ScanWarning`](crate::ScanWarning) records next to the result.

use crate::scanner::Origin;
use std::path::PathBuf;

/// Which pattern of a tag configuration failed to compile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Id,
    Revision,
    Tag,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PatternKind::Id => "id",
            PatternKind::Revision => "revision",
            PatternKind::Tag => "tag",
        })
    }
}

/// Invalid configuration, detected before any scanning or parsing begins
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("tag marker must not be empty")]
    EmptyMarker,

    #[error("invalid {kind} pattern `{pattern}`: {source}")]
    InvalidPattern {
        kind: PatternKind,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("id pattern `{0}` matches the empty string")]
    EmptyIdMatch(String),

    #[error("revision pattern `{pattern}` must define exactly one capture group, found {found}")]
    RevisionGroups { pattern: String, found: usize },

    #[error("invalid file filter glob `{pattern}`: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("missing required option `{0}`")]
    MissingOption(&'static str),

    #[error("invalid value `{value}` for option `{option}`")]
    InvalidValue { option: &'static str, value: String },

    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    #[error("duplicate requirement id `{0}`")]
    DuplicateRequirement(String),

    #[error("{origin} root {} does not exist or is not a directory", path.display())]
    MissingRoot { origin: Origin, path: PathBuf },

    #[error("source root and test root are the same directory: {}", path.display())]
    SameRoot { path: PathBuf },
}

/// A requirement source could not produce its requirement list
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("failed to read requirement declarations from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed requirement declarations in {location}: {reason}")]
    Malformed { location: String, reason: String },

    #[error("tracker at {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("authentication against {url} failed (HTTP {status})")]
    Authentication { url: String, status: u16 },

    #[error("tracker at {url} answered with HTTP {status}")]
    Http { url: String, status: u16 },
}

/// Any fatal error of a coverage run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parser(#[from] ParserError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

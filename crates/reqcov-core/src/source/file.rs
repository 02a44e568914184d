//! Requirements declared in a local YAML or JSON file
//!
//! ```yaml
//! requirements:
//!   - id: REQ-1
//!     version: "1.0"
//!     revision: v2
//!     summary: Users can log in
//!     description: Longer text...
//!     link: https://wiki.example.com/REQ-1
//! ```

use super::RequirementSource;
use crate::error::{ConfigError, ParserError, Result};
use crate::requirement::{Requirement, VERSION_UNKNOWN, ensure_unique_ids};
use crate::tag::TagMatcher;
use facet::Facet;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Facet)]
struct DeclarationFile {
    #[facet(default)]
    requirements: Vec<DeclaredRequirement>,
}

#[derive(Debug, Facet)]
struct DeclaredRequirement {
    id: String,
    #[facet(default)]
    version: Option<String>,
    #[facet(default)]
    revision: Option<String>,
    #[facet(default)]
    summary: Option<String>,
    #[facet(default)]
    description: Option<String>,
    #[facet(default)]
    link: Option<String>,
}

/// Syntax of a declaration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    Yaml,
    Json,
}

impl DeclarationFormat {
    /// Guess from the file extension; anything but `.json` is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSourceOptions {
    pub path: PathBuf,
    /// Overrides the format guessed from the extension
    pub format: Option<DeclarationFormat>,
}

impl FileSourceOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }
}

/// Reads requirements from a declaration file; no network involved
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: DeclarationFormat,
}

impl FileSource {
    pub fn new(options: FileSourceOptions) -> Result<Self, ConfigError> {
        if options.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingOption("requirements.file.path"));
        }
        let format = options
            .format
            .unwrap_or_else(|| DeclarationFormat::from_path(&options.path));
        Ok(Self {
            path: options.path,
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interpret declaration text (no I/O).
    ///
    /// `location` is only used in error messages.
    pub fn parse_declarations(
        content: &str,
        format: DeclarationFormat,
        location: &str,
    ) -> Result<Vec<Requirement>> {
        let file: DeclarationFile = match format {
            DeclarationFormat::Yaml => {
                facet_yaml::from_str(content).map_err(|e| malformed(location, e))?
            }
            DeclarationFormat::Json => {
                facet_json::from_str(content).map_err(|e| malformed(location, e))?
            }
        };

        let mut requirements = Vec::with_capacity(file.requirements.len());
        for (index, declared) in file.requirements.into_iter().enumerate() {
            let id = declared.id.trim();
            if id.is_empty() {
                return Err(ParserError::Malformed {
                    location: location.to_string(),
                    reason: format!("entry #{} has an empty id", index + 1),
                }
                .into());
            }

            let version = declared
                .version
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| VERSION_UNKNOWN.to_string());

            requirements.push(Requirement {
                id: id.to_string(),
                version,
                revision: declared.revision.filter(|r| !r.trim().is_empty()),
                short_description: declared.summary.unwrap_or_default(),
                full_description: declared.description.unwrap_or_default(),
                link: declared.link,
            });
        }

        ensure_unique_ids(&requirements)?;
        Ok(requirements)
    }
}

fn malformed(location: &str, err: impl std::fmt::Display) -> ParserError {
    ParserError::Malformed {
        location: location.to_string(),
        reason: err.to_string(),
    }
}

impl RequirementSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn parse(&self, _tags: &TagMatcher) -> Result<Vec<Requirement>> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ParserError::Read {
            path: self.path.clone(),
            source,
        })?;

        let requirements = Self::parse_declarations(&content, self.format, &self.location())?;
        info!(
            "Loaded {} requirements from {}",
            requirements.len(),
            self.path.display()
        );
        Ok(requirements)
    }
}

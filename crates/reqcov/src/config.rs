//! Configuration schema for reqcov
//!
//! Config lives at `.config/reqcov/config.yaml` relative to the project root.
//! Relative paths inside it resolve against the directory holding the file.
//! When `source_root` or `test_root` is left out, the default (`src` or
//! `tests`) is taken relative to the project root instead.
//!
//! ```yaml
//! source_root: ../../src
//! test_root: ../../tests
//! revision_check: true
//! covered: [fully-covered, source-only, test-only]
//! tag:
//!   marker: "@Req("
//! files:
//!   exclude: ["generated/**"]
//! requirements:
//!   redmine:
//!     url: https://redmine.example.com
//!     project: shop
//!     target_versions: ["2.0"]
//!     api_key: 0123456789abcdef
//! ```

use eyre::{Result, WrapErr};
use facet::Facet;
use reqcov_core::{
    ConfigError, CorrelationOptions, CoverageStatus, Credentials, DEFAULT_REVISION_PATTERN,
    DEFAULT_TERMINATOR, DeclarationFormat, FileFilter, FileSource, FileSourceOptions,
    RedmineClient, RequirementSource, RunConfig, TagConfig, TrackerOptions, TrackerSource,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_ROOT: &str = "src";
pub const DEFAULT_TEST_ROOT: &str = "tests";

/// Root configuration for reqcov
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Production code to scan (default: `src`)
    #[facet(default)]
    pub source_root: Option<String>,

    /// Test code to scan (default: `tests`)
    #[facet(default)]
    pub test_root: Option<String>,

    /// Flag tags whose revision disagrees with the requirement as stale
    #[facet(default)]
    pub revision_check: bool,

    #[facet(default)]
    pub tag: Option<TagSection>,

    #[facet(default)]
    pub files: Option<FilesSection>,

    /// Statuses counted as covered (default: fully-covered, source-only, test-only)
    #[facet(default)]
    pub covered: Vec<String>,

    #[facet(default)]
    pub requirements: Option<RequirementsSection>,
}

/// Tag syntax. An empty `revision_pattern` or `terminator` disables it.
#[derive(Debug, Clone, Default, Facet)]
pub struct TagSection {
    #[facet(default)]
    pub marker: Option<String>,
    #[facet(default)]
    pub id_pattern: Option<String>,
    #[facet(default)]
    pub revision_pattern: Option<String>,
    #[facet(default)]
    pub terminator: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct FilesSection {
    /// Extension allow-list; the built-in list of source extensions when empty
    #[facet(default)]
    pub extensions: Vec<String>,
    #[facet(default)]
    pub include: Vec<String>,
    #[facet(default)]
    pub exclude: Vec<String>,
    #[facet(default)]
    pub respect_gitignore: Option<bool>,
}

/// Where requirements come from; exactly one entry must be set
#[derive(Debug, Clone, Default, Facet)]
pub struct RequirementsSection {
    #[facet(default)]
    pub file: Option<FileSection>,
    #[facet(default)]
    pub redmine: Option<RedmineSection>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct FileSection {
    #[facet(default)]
    pub path: String,
    /// `yaml` or `json`; guessed from the extension when absent
    #[facet(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct RedmineSection {
    #[facet(default)]
    pub url: String,
    #[facet(default)]
    pub project: String,
    #[facet(default)]
    pub include_children: Option<bool>,
    #[facet(default)]
    pub include_relations: Option<bool>,
    #[facet(default)]
    pub status: Option<String>,
    #[facet(default)]
    pub tracker: Option<String>,
    #[facet(default)]
    pub target_versions: Vec<String>,
    #[facet(default)]
    pub require_tag: Option<bool>,
    #[facet(default)]
    pub api_key: Option<String>,
    #[facet(default)]
    pub username: Option<String>,
    #[facet(default)]
    pub password: Option<String>,
    /// Extra query-string parameters sent with every request
    #[facet(default)]
    pub extra_params: BTreeMap<String, String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eyre::bail!(
            "Config file not found at {}\n\n\
             Create a config file pointing at your requirements:\n\n\
             source_root: ../../src\n\
             test_root: ../../tests\n\
             requirements:\n  \
                 file:\n    \
                     path: ../../requirements.yaml",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = facet_yaml::from_str(content)?;
    Ok(config)
}

impl Config {
    /// Everything the pipeline needs apart from the requirement source
    pub fn run_config(
        &self,
        config_dir: &Path,
        project_root: &Path,
    ) -> Result<RunConfig, ConfigError> {
        let source_root = match &self.source_root {
            Some(path) => resolve(config_dir, path),
            None => project_root.join(DEFAULT_SOURCE_ROOT),
        };
        let test_root = match &self.test_root {
            Some(path) => resolve(config_dir, path),
            None => project_root.join(DEFAULT_TEST_ROOT),
        };

        let mut config = RunConfig::new(source_root, test_root);
        if let Some(tag) = &self.tag {
            config.tag = tag.to_tag_config();
        }
        if let Some(files) = &self.files {
            config.files = files.to_file_filter();
        }
        config.correlation = CorrelationOptions {
            revision_check: self.revision_check,
            covered_statuses: self.covered_statuses()?,
        };
        Ok(config)
    }

    pub fn covered_statuses(&self) -> Result<Vec<CoverageStatus>, ConfigError> {
        if self.covered.is_empty() {
            return Ok(CoverageStatus::DEFAULT_COVERED.to_vec());
        }
        self.covered
            .iter()
            .map(|s| {
                CoverageStatus::parse(s.trim()).ok_or_else(|| ConfigError::InvalidValue {
                    option: "covered",
                    value: s.clone(),
                })
            })
            .collect()
    }

    /// Build the configured requirement source, validating its options
    pub fn requirement_source(
        &self,
        base_dir: &Path,
    ) -> Result<Box<dyn RequirementSource>, ConfigError> {
        let section = self
            .requirements
            .as_ref()
            .ok_or(ConfigError::MissingOption("requirements"))?;

        match (&section.file, &section.redmine) {
            (Some(file), None) => Ok(Box::new(file.to_source(base_dir)?)),
            (None, Some(redmine)) => Ok(Box::new(redmine.to_source()?)),
            (None, None) => Err(ConfigError::MissingOption("requirements.file")),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingOptions(
                "requirements must use either `file` or `redmine`, not both".to_string(),
            )),
        }
    }
}

impl TagSection {
    pub fn to_tag_config(&self) -> TagConfig {
        let mut tag = TagConfig::default();
        if let Some(marker) = &self.marker {
            tag.marker = marker.clone();
        }
        if let Some(id) = &self.id_pattern {
            tag.id_pattern = id.clone();
        }
        tag.revision_pattern = optional(&self.revision_pattern, DEFAULT_REVISION_PATTERN);
        tag.terminator = optional(&self.terminator, DEFAULT_TERMINATOR);
        tag
    }
}

// Absent means default, empty means off
fn optional(value: &Option<String>, default: &str) -> Option<String> {
    match value.as_deref() {
        None => Some(default.to_string()),
        Some("") => None,
        Some(v) => Some(v.to_string()),
    }
}

impl FilesSection {
    pub fn to_file_filter(&self) -> FileFilter {
        FileFilter::new()
            .extensions(self.extensions.iter().cloned())
            .include(self.include.iter().cloned())
            .exclude(self.exclude.iter().cloned())
            .respect_gitignore(self.respect_gitignore.unwrap_or(true))
    }
}

impl FileSection {
    pub fn to_source(&self, base_dir: &Path) -> Result<FileSource, ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::MissingOption("requirements.file.path"));
        }
        let format = match self.format.as_deref().map(str::to_lowercase).as_deref() {
            None => None,
            Some("yaml" | "yml") => Some(DeclarationFormat::Yaml),
            Some("json") => Some(DeclarationFormat::Json),
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    option: "requirements.file.format",
                    value: self.format.clone().unwrap_or_default(),
                });
            }
        };
        FileSource::new(FileSourceOptions {
            path: resolve(base_dir, &self.path),
            format,
        })
    }
}

impl RedmineSection {
    pub fn tracker_options(&self) -> TrackerOptions {
        let mut options = TrackerOptions::new(self.project.trim());
        if let Some(children) = self.include_children {
            options.include_children = children;
        }
        if let Some(relations) = self.include_relations {
            options.include_relations = relations;
        }
        if let Some(status) = &self.status {
            options.status_filter = status.clone();
        }
        options.tracker_filter = self.tracker.clone();
        options.target_versions = self.target_versions.clone();
        if let Some(require_tag) = self.require_tag {
            options.require_tag = require_tag;
        }
        options.extra_params = self
            .extra_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        options
    }

    pub fn to_source(&self) -> Result<TrackerSource<RedmineClient>, ConfigError> {
        let credentials = Credentials::from_parts(
            self.api_key.clone(),
            self.username.clone(),
            self.password.clone(),
        )?;
        let client = RedmineClient::new(self.url.trim(), credentials);
        TrackerSource::new(client, self.tracker_options())
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    base_dir.join(path)
}

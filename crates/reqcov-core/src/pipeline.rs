//! A complete coverage run
//!
//! Stages run in a fixed order and the first error aborts the run, so a
//! caller never sees a partial [`CoverageResult`]:
//!
//! 1. compile the tag configuration
//! 2. compile the file filter
//! 3. verify that both roots exist and are not the same directory
//! 4. parse requirements from the source
//! 5. verify requirement ids are unique
//! 6. scan the roots
//! 7. correlate, then attach the scan warnings

use crate::coverage::{CorrelationOptions, CoverageCorrelator, CoverageResult};
use crate::error::Result;
use crate::files::FileFilter;
use crate::requirement::ensure_unique_ids;
use crate::scanner::{CodeTagScanner, Origin, ensure_root, nested_roots};
use crate::source::RequirementSource;
use crate::tag::TagConfig;
use std::path::PathBuf;
use tracing::info;

/// Inputs of a run, apart from the requirement source
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_root: PathBuf,
    pub test_root: PathBuf,
    pub tag: TagConfig,
    pub files: FileFilter,
    pub correlation: CorrelationOptions,
}

impl RunConfig {
    pub fn new(source_root: impl Into<PathBuf>, test_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            test_root: test_root.into(),
            tag: TagConfig::default(),
            files: FileFilter::default(),
            correlation: CorrelationOptions::default(),
        }
    }
}

pub fn run(config: &RunConfig, source: &dyn RequirementSource) -> Result<CoverageResult> {
    let tags = config.tag.compile()?;
    let files = config.files.compile()?;
    ensure_root(&config.source_root, Origin::Source)?;
    ensure_root(&config.test_root, Origin::Test)?;
    nested_roots(&config.source_root, &config.test_root)?;

    info!("Reading requirements from {}", source.location());
    let requirements = source.parse(&tags)?;
    ensure_unique_ids(&requirements)?;

    let scan = CodeTagScanner::new(&tags, &files).scan(&config.source_root, &config.test_root)?;

    let mut result = CoverageCorrelator::new(config.correlation.clone())
        .correlate(requirements, scan.tags)?;
    result.warnings = scan.warnings;

    info!(
        "{} of {} requirements covered ({}%), {} orphan tags",
        result.summary.covered,
        result.summary.total,
        result.summary.percentage,
        result.orphans.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error, ParserError};
    use crate::requirement::Requirement;
    use crate::tag::TagMatcher;
    use std::cell::Cell;

    struct StaticSource {
        requirements: Vec<Requirement>,
        calls: Cell<usize>,
    }

    impl StaticSource {
        fn new(requirements: Vec<Requirement>) -> Self {
            Self {
                requirements,
                calls: Cell::new(0),
            }
        }
    }

    impl RequirementSource for StaticSource {
        fn location(&self) -> String {
            "memory".to_string()
        }

        fn parse(&self, _tags: &TagMatcher) -> Result<Vec<Requirement>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.requirements.clone())
        }
    }

    struct BrokenSource;

    impl RequirementSource for BrokenSource {
        fn location(&self) -> String {
            "nowhere".to_string()
        }

        fn parse(&self, _tags: &TagMatcher) -> Result<Vec<Requirement>> {
            Err(ParserError::Malformed {
                location: self.location(),
                reason: "bad".to_string(),
            }
            .into())
        }
    }

    fn roots() -> (tempfile::TempDir, RunConfig) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let test = dir.path().join("test");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&test).unwrap();
        (dir, RunConfig::new(src, test))
    }

    #[test]
    fn test_invalid_pattern_aborts_before_parsing() {
        let (_dir, mut config) = roots();
        config.tag = TagConfig::new("@Req(", "[unclosed");
        let source = StaticSource::new(Vec::new());

        let err = run(&config, &source).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidPattern { .. })));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_missing_root_aborts_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(dir.path(), dir.path().join("missing"));
        let source = StaticSource::new(Vec::new());

        let err = run(&config, &source).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingRoot { .. })));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_same_root_aborts_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::new(dir.path(), dir.path());
        let source = StaticSource::new(Vec::new());

        let err = run(&config, &source).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::SameRoot { .. })));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_duplicate_ids_from_any_source_are_rejected() {
        let (_dir, config) = roots();
        let source =
            StaticSource::new(vec![Requirement::new("A", "1"), Requirement::new("A", "2")]);

        let err = run(&config, &source).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::DuplicateRequirement(_))
        ));
    }

    #[test]
    fn test_parser_error_is_propagated() {
        let (_dir, config) = roots();
        let err = run(&config, &BrokenSource).unwrap_err();
        assert!(matches!(err, Error::Parser(ParserError::Malformed { .. })));
    }

    #[test]
    fn test_warnings_are_attached_to_result() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let test = dir.path().join("test");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&test).unwrap();
        std::fs::write(src.join("bin.rs"), [0xc3, 0x28]).unwrap();
        std::fs::write(test.join("ok.rs"), "// @Req(A)").unwrap();

        let config = RunConfig::new(&src, &test);
        let source = StaticSource::new(vec![Requirement::new("A", "1")]);
        let result = run(&config, &source).unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.verdicts.len(), 1);
        assert_eq!(result.summary.test_only, 1);
    }

    #[test]
    fn test_nested_test_root_keeps_test_only_status() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        std::fs::create_dir_all(pkg.join("tests")).unwrap();
        std::fs::write(pkg.join("tests/it.rs"), "// @Req(A)").unwrap();

        let config = RunConfig::new(&pkg, pkg.join("tests"));
        let source = StaticSource::new(vec![Requirement::new("A", "1")]);
        let result = run(&config, &source).unwrap();

        assert_eq!(result.summary.test_only, 1);
        assert_eq!(result.summary.fully_covered, 0);
    }
}

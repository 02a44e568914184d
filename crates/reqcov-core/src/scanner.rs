//! Extraction of coverage tags from source and test trees
//!
//! Every line of every eligible file is searched for tags. Tags found under the
//! source root are [`Origin::Source`], tags under the test root are
//! [`Origin::Test`]. The resulting list is ordered by root (source first),
//! then by relative file path, line, and column, whether or not files were
//! read in parallel.

use crate::error::ConfigError;
use crate::files::FileMatcher;
use crate::tag::TagMatcher;
use facet::Facet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which tree a tag was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[facet(rename_all = "lowercase")]
#[repr(u8)]
pub enum Origin {
    /// Production code: the requirement is implemented here
    Source,
    /// Test code: the requirement is verified here
    Test,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Source => "source",
            Origin::Test => "test",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tag was found
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Location {
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column of the tag start, in characters (1-indexed)
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A coverage tag found in code
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CoverageTag {
    pub requirement_id: String,
    #[facet(default)]
    pub revision: Option<String>,
    pub origin: Origin,
    pub location: Location,
}

/// A file that could not be scanned. The scan carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct ScanWarning {
    pub file: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.file.display(), self.reason)
    }
}

/// Tags found by a scan, plus the files that had to be skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub tags: Vec<CoverageTag>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn extend(&mut self, other: ScanResult) {
        self.tags.extend(other.tags);
        self.warnings.extend(other.warnings);
    }
}

/// Walks code trees and extracts coverage tags
pub struct CodeTagScanner<'a> {
    tags: &'a TagMatcher,
    files: &'a FileMatcher,
}

impl<'a> CodeTagScanner<'a> {
    pub fn new(tags: &'a TagMatcher, files: &'a FileMatcher) -> Self {
        Self { tags, files }
    }

    /// Scan both roots. A missing root is fatal; unreadable files are not.
    ///
    /// When one root is nested inside the other, the inner tree is only
    /// scanned under its own origin.
    pub fn scan(&self, source_root: &Path, test_root: &Path) -> Result<ScanResult, ConfigError> {
        ensure_root(source_root, Origin::Source)?;
        ensure_root(test_root, Origin::Test)?;
        let (source_skip, test_skip) = nested_roots(source_root, test_root)?;

        let mut result = self.scan_tree(source_root, Origin::Source, source_skip.as_deref());
        result.extend(self.scan_tree(test_root, Origin::Test, test_skip.as_deref()));

        info!(
            "Found {} tags ({} files skipped)",
            result.tags.len(),
            result.warnings.len()
        );
        Ok(result)
    }

    /// Scan a single root. The root is expected to exist.
    pub fn scan_root(&self, root: &Path, origin: Origin) -> ScanResult {
        self.scan_tree(root, origin, None)
    }

    fn scan_tree(&self, root: &Path, origin: Origin, skip: Option<&Path>) -> ScanResult {
        let (files, mut warnings) = self.files.collect_files_except(root, skip);
        debug!(
            "Scanning {} {} files under {}",
            files.len(),
            origin,
            root.display()
        );

        let outcomes = self.scan_files(&files, origin);

        let mut tags = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(file_tags) => tags.extend(file_tags),
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        ScanResult { tags, warnings }
    }

    /// Extract the tags of in-memory content (no I/O)
    pub fn scan_content(&self, path: &Path, content: &str, origin: Origin) -> Vec<CoverageTag> {
        extract_from_content(self.tags, path, content, origin)
    }

    // One outcome per file, in the same order as `files`
    fn scan_files(
        &self,
        files: &[PathBuf],
        origin: Origin,
    ) -> Vec<Result<Vec<CoverageTag>, ScanWarning>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            files
                .par_iter()
                .map(|path| scan_file(self.tags, path, origin))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            files
                .iter()
                .map(|path| scan_file(self.tags, path, origin))
                .collect()
        }
    }
}

pub(crate) fn ensure_root(root: &Path, origin: Origin) -> Result<(), ConfigError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::MissingRoot {
            origin,
            path: root.to_path_buf(),
        })
    }
}

/// Directories to leave out of the source and test walks, in that order.
///
/// A root nested inside the other one is skipped by the outer walk. Both
/// roots naming the same directory is an error, since every tag would then
/// belong to both origins.
pub(crate) fn nested_roots(
    source_root: &Path,
    test_root: &Path,
) -> Result<(Option<PathBuf>, Option<PathBuf>), ConfigError> {
    let source = canonical(source_root);
    let test = canonical(test_root);

    if source == test {
        return Err(ConfigError::SameRoot { path: source });
    }
    if let Ok(relative) = test.strip_prefix(&source) {
        debug!("Test root is inside the source root, skipping it there");
        return Ok((Some(source_root.join(relative)), None));
    }
    if let Ok(relative) = source.strip_prefix(&test) {
        debug!("Source root is inside the test root, skipping it there");
        return Ok((None, Some(test_root.join(relative))));
    }
    Ok((None, None))
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn scan_file(
    tags: &TagMatcher,
    path: &Path,
    origin: Origin,
) -> Result<Vec<CoverageTag>, ScanWarning> {
    let bytes = std::fs::read(path).map_err(|e| ScanWarning {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let content = String::from_utf8(bytes).map_err(|e| ScanWarning {
        file: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;
    Ok(extract_from_content(tags, path, &content, origin))
}

/// Extract tags line by line, left to right within a line
pub(crate) fn extract_from_content(
    tags: &TagMatcher,
    path: &Path,
    content: &str,
    origin: Origin,
) -> Vec<CoverageTag> {
    let mut found = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        for m in tags.find_iter(line) {
            found.push(CoverageTag {
                requirement_id: m.id.to_string(),
                revision: m.revision.map(ToString::to_string),
                origin,
                location: Location {
                    file: path.to_path_buf(),
                    line: line_idx + 1,
                    column: line[..m.start].chars().count() + 1,
                },
            });
        }
    }

    found
}

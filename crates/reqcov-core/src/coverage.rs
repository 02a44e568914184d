//! Coverage analysis and reporting
//!
//! The correlator merges the declared requirements with the scanned tags:
//! one [`CoverageVerdict`] per requirement, in declaration order, plus the
//! tags that reference no declared requirement ("orphans").
//!
//! With revision checking on, a tag is *valid* for a requirement when it
//! carries exactly the requirement's revision and *stale* otherwise (a tag
//! without revision is stale too). A requirement without a declared revision
//! accepts every tag. An origin (source or test) whose tags are all stale
//! makes the whole verdict [`CoverageStatus::Stale`].

use crate::error::ConfigError;
use crate::requirement::{Requirement, ensure_unique_ids};
use crate::scanner::{CoverageTag, Origin, ScanWarning};
use facet::Facet;
use std::collections::HashMap;

/// Coverage verdict of a single requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum CoverageStatus {
    /// No tag references the requirement
    NotCovered,
    /// Only source code references it
    CoveredBySourceOnly,
    /// Only test code references it
    CoveredByTestOnly,
    /// Both source and test code reference it
    FullyCovered,
    /// Tags reference it, but with a revision other than the declared one
    Stale,
}

impl CoverageStatus {
    pub const ALL: [CoverageStatus; 5] = [
        CoverageStatus::NotCovered,
        CoverageStatus::CoveredBySourceOnly,
        CoverageStatus::CoveredByTestOnly,
        CoverageStatus::FullyCovered,
        CoverageStatus::Stale,
    ];

    /// Statuses counted as covered unless configured otherwise
    pub const DEFAULT_COVERED: [CoverageStatus; 3] = [
        CoverageStatus::CoveredBySourceOnly,
        CoverageStatus::CoveredByTestOnly,
        CoverageStatus::FullyCovered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::NotCovered => "not-covered",
            CoverageStatus::CoveredBySourceOnly => "source-only",
            CoverageStatus::CoveredByTestOnly => "test-only",
            CoverageStatus::FullyCovered => "fully-covered",
            CoverageStatus::Stale => "stale",
        }
    }

    /// Parse a status from its string representation
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    fn from_origins(has_source: bool, has_test: bool) -> Self {
        match (has_source, has_test) {
            (true, true) => CoverageStatus::FullyCovered,
            (true, false) => CoverageStatus::CoveredBySourceOnly,
            (false, true) => CoverageStatus::CoveredByTestOnly,
            (false, false) => CoverageStatus::NotCovered,
        }
    }
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A percentage with two decimals, stored in hundredths of a percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Facet)]
pub struct Percentage {
    pub hundredths: u64,
}

impl Percentage {
    /// `part / whole * 100`, rounded half-up to two decimals.
    ///
    /// Nothing to cover counts as fully covered.
    pub fn of(part: usize, whole: usize) -> Self {
        if whole == 0 {
            return Self { hundredths: 10_000 };
        }
        let part = part as u64;
        let whole = whole as u64;
        Self {
            hundredths: (2 * part * 10_000 + whole) / (2 * whole),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.hundredths as f64 / 100.0
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

/// Coverage of one requirement
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CoverageVerdict {
    pub requirement: Requirement,
    pub status: CoverageStatus,
    pub source_tag_count: usize,
    pub test_tag_count: usize,
    /// Tags of either origin whose revision disagrees with the requirement
    pub stale_tag_count: usize,
    /// Every tag that referenced the requirement, in scan order
    pub tags: Vec<CoverageTag>,
}

/// Aggregate counters of a coverage run
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CoverageSummary {
    pub total: usize,
    pub not_covered: usize,
    pub source_only: usize,
    pub test_only: usize,
    pub fully_covered: usize,
    pub stale: usize,
    /// Requirements whose status is one of the configured covered statuses
    pub covered: usize,
    pub percentage: Percentage,
}

impl CoverageSummary {
    pub fn count(&self, status: CoverageStatus) -> usize {
        match status {
            CoverageStatus::NotCovered => self.not_covered,
            CoverageStatus::CoveredBySourceOnly => self.source_only,
            CoverageStatus::CoveredByTestOnly => self.test_only,
            CoverageStatus::FullyCovered => self.fully_covered,
            CoverageStatus::Stale => self.stale,
        }
    }
}

/// Everything a report needs
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CoverageResult {
    /// One verdict per requirement, in declaration order
    pub verdicts: Vec<CoverageVerdict>,
    /// Tags referencing undeclared requirements, in scan order
    pub orphans: Vec<CoverageTag>,
    pub summary: CoverageSummary,
    /// Files the scanner had to skip
    pub warnings: Vec<ScanWarning>,
}

impl CoverageResult {
    /// Coverage percentage (0.0 - 100.0)
    pub fn coverage_percent(&self) -> f64 {
        self.summary.percentage.as_f64()
    }

    /// Whether coverage reaches `threshold` percent
    pub fn is_passing(&self, threshold: f64) -> bool {
        self.coverage_percent() >= threshold
    }

    pub fn verdict(&self, requirement_id: &str) -> Option<&CoverageVerdict> {
        self.verdicts
            .iter()
            .find(|v| v.requirement.id == requirement_id)
    }
}

/// Options of the correlation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationOptions {
    pub revision_check: bool,
    /// Statuses that count towards the coverage percentage
    pub covered_statuses: Vec<CoverageStatus>,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            revision_check: false,
            covered_statuses: CoverageStatus::DEFAULT_COVERED.to_vec(),
        }
    }
}

impl CorrelationOptions {
    pub fn with_revision_check(revision_check: bool) -> Self {
        Self {
            revision_check,
            ..Self::default()
        }
    }
}

/// Merges requirements and tags into a [`CoverageResult`]
#[derive(Debug, Clone, Default)]
pub struct CoverageCorrelator {
    options: CorrelationOptions,
}

#[derive(Default)]
struct OriginTally {
    total: usize,
    valid: usize,
}

impl OriginTally {
    fn covered(&self) -> bool {
        self.valid > 0
    }

    fn stale(&self) -> bool {
        self.total > 0 && self.valid == 0
    }
}

impl CoverageCorrelator {
    pub fn new(options: CorrelationOptions) -> Self {
        Self { options }
    }

    /// Compute coverage.
    ///
    /// Duplicate requirement ids are rejected again here, since the result
    /// would otherwise credit one tag to two requirements.
    pub fn correlate(
        &self,
        requirements: Vec<Requirement>,
        tags: Vec<CoverageTag>,
    ) -> Result<CoverageResult, ConfigError> {
        ensure_unique_ids(&requirements)?;

        let index: HashMap<&str, usize> = requirements
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let mut groups: Vec<Vec<CoverageTag>> = vec![Vec::new(); requirements.len()];
        let mut orphans = Vec::new();
        for tag in tags {
            match index.get(tag.requirement_id.as_str()) {
                Some(&i) => groups[i].push(tag),
                None => orphans.push(tag),
            }
        }
        drop(index);

        let verdicts: Vec<CoverageVerdict> = requirements
            .into_iter()
            .zip(groups)
            .map(|(requirement, group)| self.verdict(requirement, group))
            .collect();

        let summary = self.summarize(&verdicts);

        Ok(CoverageResult {
            verdicts,
            orphans,
            summary,
            warnings: Vec::new(),
        })
    }

    fn verdict(&self, requirement: Requirement, tags: Vec<CoverageTag>) -> CoverageVerdict {
        let mut source = OriginTally::default();
        let mut test = OriginTally::default();

        for tag in &tags {
            let tally = match tag.origin {
                Origin::Source => &mut source,
                Origin::Test => &mut test,
            };
            tally.total += 1;
            if self.is_valid(&requirement, tag) {
                tally.valid += 1;
            }
        }

        let status = if tags.is_empty() {
            CoverageStatus::NotCovered
        } else if source.stale() || test.stale() {
            CoverageStatus::Stale
        } else {
            CoverageStatus::from_origins(source.covered(), test.covered())
        };

        CoverageVerdict {
            requirement,
            status,
            source_tag_count: source.total,
            test_tag_count: test.total,
            stale_tag_count: (source.total - source.valid) + (test.total - test.valid),
            tags,
        }
    }

    fn is_valid(&self, requirement: &Requirement, tag: &CoverageTag) -> bool {
        if !self.options.revision_check {
            return true;
        }
        match &requirement.revision {
            None => true,
            Some(expected) => tag.revision.as_ref() == Some(expected),
        }
    }

    fn summarize(&self, verdicts: &[CoverageVerdict]) -> CoverageSummary {
        let count = |status: CoverageStatus| verdicts.iter().filter(|v| v.status == status).count();
        let covered = verdicts
            .iter()
            .filter(|v| self.options.covered_statuses.contains(&v.status))
            .count();

        CoverageSummary {
            total: verdicts.len(),
            not_covered: count(CoverageStatus::NotCovered),
            source_only: count(CoverageStatus::CoveredBySourceOnly),
            test_only: count(CoverageStatus::CoveredByTestOnly),
            fully_covered: count(CoverageStatus::FullyCovered),
            stale: count(CoverageStatus::Stale),
            covered,
            percentage: Percentage::of(covered, verdicts.len()),
        }
    }
}

/// Compute coverage with the default covered statuses
pub fn correlate(
    requirements: Vec<Requirement>,
    tags: Vec<CoverageTag>,
    revision_check: bool,
) -> Result<CoverageResult, ConfigError> {
    CoverageCorrelator::new(CorrelationOptions::with_revision_check(revision_check))
        .correlate(requirements, tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Location;
    use std::path::PathBuf;

    fn req(id: &str, revision: Option<&str>) -> Requirement {
        let r = Requirement::new(id, "1.0");
        match revision {
            Some(rev) => r.with_revision(rev),
            None => r,
        }
    }

    fn tag(id: &str, revision: Option<&str>, origin: Origin, line: usize) -> CoverageTag {
        CoverageTag {
            requirement_id: id.to_string(),
            revision: revision.map(ToString::to_string),
            origin,
            location: Location {
                file: PathBuf::from(match origin {
                    Origin::Source => "src/lib.rs",
                    Origin::Test => "tests/it.rs",
                }),
                line,
                column: 4,
            },
        }
    }

    fn rank(status: CoverageStatus) -> u8 {
        match status {
            CoverageStatus::NotCovered | CoverageStatus::Stale => 0,
            CoverageStatus::CoveredBySourceOnly | CoverageStatus::CoveredByTestOnly => 1,
            CoverageStatus::FullyCovered => 2,
        }
    }

    #[test]
    fn test_full_and_missing_coverage() {
        let result = correlate(
            vec![req("REQ-1", Some("v1")), req("REQ-2", Some("v1"))],
            vec![
                tag("REQ-1", Some("v1"), Origin::Source, 3),
                tag("REQ-1", Some("v1"), Origin::Test, 9),
            ],
            true,
        )
        .unwrap();

        assert_eq!(result.verdicts[0].status, CoverageStatus::FullyCovered);
        assert_eq!(result.verdicts[1].status, CoverageStatus::NotCovered);
        assert_eq!(result.summary.percentage.to_string(), "50.00");
        assert_eq!(result.summary.covered, 1);
        assert_eq!(result.summary.fully_covered, 1);
        assert_eq!(result.summary.not_covered, 1);
    }

    #[test]
    fn test_revision_mismatch_is_stale() {
        let result = correlate(
            vec![req("REQ-3", Some("v2"))],
            vec![tag("REQ-3", Some("v1"), Origin::Source, 1)],
            true,
        )
        .unwrap();

        let verdict = &result.verdicts[0];
        assert_eq!(verdict.status, CoverageStatus::Stale);
        assert_eq!(verdict.stale_tag_count, 1);
        assert_eq!(result.summary.covered, 0);
        assert_eq!(result.summary.stale, 1);
        assert_eq!(result.summary.percentage.to_string(), "0.00");
    }

    #[test]
    fn test_revision_mismatch_ignored_without_check() {
        let result = correlate(
            vec![req("REQ-3", Some("v2"))],
            vec![tag("REQ-3", Some("v1"), Origin::Source, 1)],
            false,
        )
        .unwrap();
        assert_eq!(result.verdicts[0].status, CoverageStatus::CoveredBySourceOnly);
        assert_eq!(result.verdicts[0].stale_tag_count, 0);
    }

    #[test]
    fn test_missing_tag_revision_is_stale_when_required() {
        let result = correlate(
            vec![req("REQ-3", Some("v2"))],
            vec![tag("REQ-3", None, Origin::Test, 1)],
            true,
        )
        .unwrap();
        assert_eq!(result.verdicts[0].status, CoverageStatus::Stale);
    }

    #[test]
    fn test_requirement_without_revision_accepts_any_tag() {
        let result = correlate(
            vec![req("REQ-3", None)],
            vec![tag("REQ-3", Some("whatever"), Origin::Test, 1)],
            true,
        )
        .unwrap();
        assert_eq!(result.verdicts[0].status, CoverageStatus::CoveredByTestOnly);
    }

    #[test]
    fn test_orphans_are_reported_and_never_counted() {
        let result = correlate(
            vec![req("REQ-4", None)],
            vec![tag("REQ-99", None, Origin::Source, 1)],
            false,
        )
        .unwrap();

        assert_eq!(result.verdicts[0].status, CoverageStatus::NotCovered);
        assert_eq!(result.orphans.len(), 1);
        assert_eq!(result.orphans[0].requirement_id, "REQ-99");
        assert_eq!(result.summary.total, 1);
    }

    #[test]
    fn test_counts_every_tag_of_an_origin() {
        let result = correlate(
            vec![req("REQ-5", None)],
            vec![
                tag("REQ-5", None, Origin::Source, 2),
                tag("REQ-5", None, Origin::Source, 20),
            ],
            false,
        )
        .unwrap();

        let verdict = &result.verdicts[0];
        assert_eq!(verdict.status, CoverageStatus::CoveredBySourceOnly);
        assert_eq!(verdict.source_tag_count, 2);
        assert_eq!(verdict.test_tag_count, 0);
        assert_eq!(verdict.tags.len(), 2);
    }

    #[test]
    fn test_valid_tag_beats_stale_tag_of_same_origin() {
        let result = correlate(
            vec![req("R", Some("v2"))],
            vec![
                tag("R", Some("v1"), Origin::Source, 1),
                tag("R", Some("v2"), Origin::Source, 2),
                tag("R", Some("v2"), Origin::Test, 3),
            ],
            true,
        )
        .unwrap();
        let verdict = &result.verdicts[0];
        assert_eq!(verdict.status, CoverageStatus::FullyCovered);
        assert_eq!(verdict.stale_tag_count, 1);
    }

    #[test]
    fn test_stale_origin_suppresses_other_origin() {
        // Source is valid, but every test tag is stale
        let result = correlate(
            vec![req("R", Some("v2"))],
            vec![
                tag("R", Some("v2"), Origin::Source, 1),
                tag("R", Some("v1"), Origin::Test, 2),
            ],
            true,
        )
        .unwrap();
        assert_eq!(result.verdicts[0].status, CoverageStatus::Stale);
    }

    #[test]
    fn test_adding_source_tag_never_lowers_status() {
        let base_sets: Vec<Vec<CoverageTag>> = vec![
            vec![],
            vec![tag("R", None, Origin::Test, 1)],
            vec![tag("R", None, Origin::Source, 1)],
            vec![tag("R", None, Origin::Source, 1), tag("R", None, Origin::Test, 2)],
        ];

        for tags in base_sets {
            let before = correlate(vec![req("R", None)], tags.clone(), false).unwrap();
            let mut more = tags;
            more.push(tag("R", None, Origin::Source, 99));
            let after = correlate(vec![req("R", None)], more, false).unwrap();

            assert!(
                rank(after.verdicts[0].status) >= rank(before.verdicts[0].status),
                "{} -> {}",
                before.verdicts[0].status,
                after.verdicts[0].status
            );
        }
    }

    #[test]
    fn test_verdicts_follow_declaration_order() {
        let ids = ["c", "a", "b"];
        let result = correlate(
            ids.iter().map(|id| req(id, None)).collect(),
            vec![tag("b", None, Origin::Test, 1), tag("c", None, Origin::Source, 2)],
            false,
        )
        .unwrap();
        let order: Vec<_> = result.verdicts.iter().map(|v| v.requirement.id.as_str()).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_duplicate_requirement_is_rejected() {
        let err = correlate(vec![req("A", None), req("A", None)], Vec::new(), false).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRequirement(_)));
    }

    #[test]
    fn test_configurable_covered_statuses() {
        let correlator = CoverageCorrelator::new(CorrelationOptions {
            revision_check: false,
            covered_statuses: vec![CoverageStatus::FullyCovered],
        });
        let result = correlator
            .correlate(
                vec![req("A", None), req("B", None)],
                vec![
                    tag("A", None, Origin::Source, 1),
                    tag("B", None, Origin::Source, 1),
                    tag("B", None, Origin::Test, 1),
                ],
            )
            .unwrap();
        assert_eq!(result.summary.covered, 1);
        assert_eq!(result.summary.percentage.to_string(), "50.00");
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(Percentage::of(1, 3).to_string(), "33.33");
        assert_eq!(Percentage::of(2, 3).to_string(), "66.67");
        assert_eq!(Percentage::of(1, 8).to_string(), "12.50");
        // 1/16 = 6.25 exactly, 1/32 = 3.125 rounds half up
        assert_eq!(Percentage::of(1, 32).to_string(), "3.13");
        assert_eq!(Percentage::of(1, 200000).to_string(), "0.00");
        assert_eq!(Percentage::of(1, 20000).to_string(), "0.01");
        assert_eq!(Percentage::of(3, 3).to_string(), "100.00");
        assert_eq!(Percentage::of(0, 0).to_string(), "100.00");
        assert_eq!(Percentage::of(0, 5).as_f64(), 0.0);
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in CoverageStatus::ALL {
            assert_eq!(CoverageStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CoverageStatus::parse("covered"), None);
    }
}

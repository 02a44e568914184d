//! End-to-end runs of the coverage pipeline over real directory trees

use reqcov_core::{
    ConfigError, CorrelationOptions, CoverageStatus, Error, FileFilter, FileSource,
    FileSourceOptions, Origin, RunConfig, TagConfig, pipeline,
};
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn shop_config(revision_check: bool) -> RunConfig {
    let root = fixture("shop");
    let mut config = RunConfig::new(root.join("src"), root.join("tests"));
    config.correlation = CorrelationOptions::with_revision_check(revision_check);
    config
}

fn shop_source() -> FileSource {
    FileSource::new(FileSourceOptions::new(fixture("shop").join("requirements.yaml"))).unwrap()
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_shop_fixture_with_revision_check() {
    let result = pipeline::run(&shop_config(true), &shop_source()).unwrap();

    let statuses: Vec<_> = result
        .verdicts
        .iter()
        .map(|v| (v.requirement.id.as_str(), v.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("CART-1", CoverageStatus::FullyCovered),
            ("CART-2", CoverageStatus::Stale),
            ("CHECKOUT-1", CoverageStatus::CoveredBySourceOnly),
            ("CHECKOUT-2", CoverageStatus::CoveredByTestOnly),
            ("ACCOUNT-1", CoverageStatus::NotCovered),
        ]
    );

    assert_eq!(result.orphans.len(), 1);
    assert_eq!(result.orphans[0].requirement_id, "GIFT-9");
    assert_eq!(result.orphans[0].origin, Origin::Source);

    assert_eq!(result.summary.total, 5);
    assert_eq!(result.summary.covered, 3);
    assert_eq!(result.summary.percentage.to_string(), "60.00");
    assert!(result.is_passing(60.0));
    assert!(!result.is_passing(60.01));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_shop_fixture_without_revision_check() {
    let result = pipeline::run(&shop_config(false), &shop_source()).unwrap();

    let cart2 = result.verdict("CART-2").unwrap();
    assert_eq!(cart2.status, CoverageStatus::CoveredBySourceOnly);
    assert_eq!(cart2.stale_tag_count, 0);
    assert_eq!(result.summary.percentage.to_string(), "80.00");
}

#[test]
fn test_markdown_is_not_scanned_by_default() {
    let result = pipeline::run(&shop_config(true), &shop_source()).unwrap();
    let account = result.verdict("ACCOUNT-1").unwrap();
    assert!(account.tags.is_empty());
}

#[test]
fn test_full_and_missing_coverage() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "requirements.yaml",
        "requirements:\n  - id: REQ-1\n    revision: v1\n  - id: REQ-2\n    revision: v1\n",
    );
    write(dir.path(), "src/lib.rs", "// @Req(REQ-1, rev=v1)\npub fn f() {}\n");
    write(dir.path(), "test/lib_test.rs", "// @Req(REQ-1, rev=v1)\n");

    let mut config = RunConfig::new(dir.path().join("src"), dir.path().join("test"));
    config.correlation = CorrelationOptions::with_revision_check(true);
    let source =
        FileSource::new(FileSourceOptions::new(dir.path().join("requirements.yaml"))).unwrap();

    let result = pipeline::run(&config, &source).unwrap();
    assert_eq!(result.verdicts[0].status, CoverageStatus::FullyCovered);
    assert_eq!(result.verdicts[1].status, CoverageStatus::NotCovered);
    assert_eq!(result.summary.percentage.to_string(), "50.00");
}

#[test]
fn test_two_tags_on_different_lines() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reqs.json", r#"{"requirements": [{"id": "REQ-5"}]}"#);
    write(
        dir.path(),
        "src/a.rs",
        "// @Req(REQ-5)\nfn a() {}\n\n// @Req(REQ-5)\nfn b() {}\n",
    );
    fs::create_dir_all(dir.path().join("test")).unwrap();

    let config = RunConfig::new(dir.path().join("src"), dir.path().join("test"));
    let source = FileSource::new(FileSourceOptions::new(dir.path().join("reqs.json"))).unwrap();

    let result = pipeline::run(&config, &source).unwrap();
    let verdict = &result.verdicts[0];
    assert_eq!(verdict.status, CoverageStatus::CoveredBySourceOnly);
    assert_eq!(verdict.source_tag_count, 2);
    assert_eq!(verdict.test_tag_count, 0);
    let lines: Vec<_> = verdict.tags.iter().map(|t| t.location.line).collect();
    assert_eq!(lines, vec![1, 4]);
}

#[test]
fn test_duplicate_declarations_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "reqs.yaml",
        "requirements:\n  - id: REQ-7\n  - id: REQ-7\n",
    );
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("test")).unwrap();

    let config = RunConfig::new(dir.path().join("src"), dir.path().join("test"));
    let source = FileSource::new(FileSourceOptions::new(dir.path().join("reqs.yaml"))).unwrap();

    let err = pipeline::run(&config, &source).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::DuplicateRequirement(ref id)) if id == "REQ-7"
    ));
}

#[test]
fn test_custom_tag_syntax_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reqs.yaml", "requirements:\n  - id: AUTH-7\n");
    write(dir.path(), "src/auth.py", "# implements #req:AUTH-7\n");
    write(dir.path(), "src/generated/auth_pb.py", "# #req:AUTH-7\n");
    write(dir.path(), "test/test_auth.py", "# @Req(AUTH-7)\n");

    let mut config = RunConfig::new(dir.path().join("src"), dir.path().join("test"));
    config.tag = TagConfig::new("#req:", r"[A-Z]+-\d+");
    config.files = FileFilter::new()
        .extensions([".py"])
        .exclude(["generated/**"]);
    let source = FileSource::new(FileSourceOptions::new(dir.path().join("reqs.yaml"))).unwrap();

    let result = pipeline::run(&config, &source).unwrap();
    let verdict = &result.verdicts[0];
    assert_eq!(verdict.status, CoverageStatus::CoveredBySourceOnly);
    assert_eq!(verdict.source_tag_count, 1);
}

#[test]
fn test_empty_requirement_set_is_fully_covered() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "reqs.yaml", "requirements: []\n");
    write(dir.path(), "src/a.rs", "// @Req(X-1)\n");
    fs::create_dir_all(dir.path().join("test")).unwrap();

    let config = RunConfig::new(dir.path().join("src"), dir.path().join("test"));
    let source = FileSource::new(FileSourceOptions::new(dir.path().join("reqs.yaml"))).unwrap();

    let result = pipeline::run(&config, &source).unwrap();
    assert!(result.verdicts.is_empty());
    assert_eq!(result.orphans.len(), 1);
    assert_eq!(result.summary.percentage.to_string(), "100.00");
}

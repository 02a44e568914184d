//! Output formatting for coverage results

use eyre::Result;
use facet::Facet;
use owo_colors::OwoColorize;
use reqcov_core::{CoverageResult, CoverageStatus, CoverageTag};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a coverage result in the specified format
pub fn render_result(
    result: &CoverageResult,
    format: OutputFormat,
    verbose: bool,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, verbose)),
        OutputFormat::Json => render_json(result),
    }
}

fn status_label(status: CoverageStatus) -> String {
    let label = status.as_str();
    match status {
        CoverageStatus::FullyCovered => label.green().to_string(),
        CoverageStatus::CoveredBySourceOnly | CoverageStatus::CoveredByTestOnly => {
            label.cyan().to_string()
        }
        CoverageStatus::Stale => label.magenta().to_string(),
        CoverageStatus::NotCovered => label.red().to_string(),
    }
}

fn render_text(result: &CoverageResult, verbose: bool) -> String {
    let summary = &result.summary;
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!("{} Requirement Coverage Report\n", "##".bold()));
    output.push('\n');

    let percent = summary.percentage.as_f64();
    let percent_str = format!("{}%", summary.percentage);
    let color_percent = if percent >= 80.0 {
        percent_str.green().to_string()
    } else if percent >= 50.0 {
        percent_str.yellow().to_string()
    } else {
        percent_str.red().to_string()
    };

    output.push_str(&format!(
        "Coverage: {} ({}/{} requirements)\n",
        color_percent, summary.covered, summary.total
    ));

    let breakdown: Vec<String> = CoverageStatus::ALL
        .iter()
        .filter(|status| summary.count(**status) > 0)
        .map(|status| format!("{} {}", summary.count(*status), status))
        .collect();
    if !breakdown.is_empty() {
        output.push_str(&format!("  Verdicts: {}\n", breakdown.join(", ").dimmed()));
    }
    output.push('\n');

    if !result.orphans.is_empty() {
        output.push_str(&format!(
            "{} Orphan Tags ({}):\n",
            "!".red().bold(),
            result.orphans.len()
        ));
        for tag in &result.orphans {
            output.push_str(&format!(
                "  {} {} - unknown requirement {}\n",
                "-".red(),
                tag.location,
                tag.requirement_id.yellow()
            ));
        }
        output.push('\n');
    }

    let stale: Vec<_> = result
        .verdicts
        .iter()
        .filter(|v| v.status == CoverageStatus::Stale)
        .collect();
    if !stale.is_empty() {
        output.push_str(&format!(
            "{} Stale Requirements ({}):\n",
            "~".magenta().bold(),
            stale.len()
        ));
        for verdict in stale {
            let expected = verdict.requirement.revision.as_deref().unwrap_or("-");
            output.push_str(&format!(
                "  {} {} (expected rev {}, {} stale tags)\n",
                "-".magenta(),
                verdict.requirement.id,
                expected.cyan(),
                verdict.stale_tag_count
            ));
        }
        output.push('\n');
    }

    let uncovered: Vec<_> = result
        .verdicts
        .iter()
        .filter(|v| v.status == CoverageStatus::NotCovered)
        .collect();
    if !uncovered.is_empty() {
        output.push_str(&format!(
            "{} Uncovered Requirements ({}):\n",
            "?".yellow().bold(),
            uncovered.len()
        ));
        for verdict in uncovered {
            output.push_str(&format!(
                "  {} {} {}\n",
                "-".yellow(),
                verdict.requirement.id,
                verdict.requirement.short_description.dimmed()
            ));
        }
        output.push('\n');
    }

    if !result.warnings.is_empty() {
        output.push_str(&format!(
            "{} Skipped Files ({}):\n",
            "!".yellow().bold(),
            result.warnings.len()
        ));
        for warning in &result.warnings {
            output.push_str(&format!(
                "  {} {}: {}\n",
                "-".yellow(),
                warning.file.display(),
                warning.reason.dimmed()
            ));
        }
        output.push('\n');
    }

    if verbose {
        for verdict in &result.verdicts {
            output.push_str(&format!(
                "{} [{}] {} ({} source, {} test)\n",
                "+".bold(),
                status_label(verdict.status),
                verdict.requirement.id.green(),
                verdict.source_tag_count,
                verdict.test_tag_count
            ));
            for tag in &verdict.tags {
                output.push_str(&format!(
                    "      {} {}\n",
                    tag.location.to_string().dimmed(),
                    tag.origin.as_str().dimmed()
                ));
            }
        }
        output.push('\n');
    }

    output
}

#[derive(Facet)]
struct JsonReport {
    total: usize,
    covered: usize,
    coverage_percent: String,
    counts: JsonCounts,
    requirements: Vec<JsonVerdict>,
    orphans: Vec<JsonTag>,
    warnings: Vec<JsonWarning>,
}

#[derive(Facet)]
struct JsonCounts {
    not_covered: usize,
    source_only: usize,
    test_only: usize,
    fully_covered: usize,
    stale: usize,
}

#[derive(Facet)]
struct JsonVerdict {
    id: String,
    version: String,
    revision: Option<String>,
    summary: String,
    link: Option<String>,
    status: String,
    source_tags: usize,
    test_tags: usize,
    stale_tags: usize,
    tags: Vec<JsonTag>,
}

#[derive(Facet)]
struct JsonTag {
    requirement_id: String,
    revision: Option<String>,
    origin: String,
    file: String,
    line: usize,
    column: usize,
}

#[derive(Facet)]
struct JsonWarning {
    file: String,
    reason: String,
}

impl From<&CoverageTag> for JsonTag {
    fn from(tag: &CoverageTag) -> Self {
        JsonTag {
            requirement_id: tag.requirement_id.clone(),
            revision: tag.revision.clone(),
            origin: tag.origin.as_str().to_string(),
            file: tag.location.file.display().to_string(),
            line: tag.location.line,
            column: tag.location.column,
        }
    }
}

fn render_json(result: &CoverageResult) -> Result<String> {
    let summary = &result.summary;
    let report = JsonReport {
        total: summary.total,
        covered: summary.covered,
        coverage_percent: summary.percentage.to_string(),
        counts: JsonCounts {
            not_covered: summary.not_covered,
            source_only: summary.source_only,
            test_only: summary.test_only,
            fully_covered: summary.fully_covered,
            stale: summary.stale,
        },
        requirements: result
            .verdicts
            .iter()
            .map(|v| JsonVerdict {
                id: v.requirement.id.clone(),
                version: v.requirement.version.clone(),
                revision: v.requirement.revision.clone(),
                summary: v.requirement.short_description.clone(),
                link: v.requirement.link.clone(),
                status: v.status.as_str().to_string(),
                source_tags: v.source_tag_count,
                test_tags: v.test_tag_count,
                stale_tags: v.stale_tag_count,
                tags: v.tags.iter().map(JsonTag::from).collect(),
            })
            .collect(),
        orphans: result.orphans.iter().map(JsonTag::from).collect(),
        warnings: result
            .warnings
            .iter()
            .map(|w| JsonWarning {
                file: w.file.display().to_string(),
                reason: w.reason.clone(),
            })
            .collect(),
    };

    facet_json::to_string_pretty(&report)
        .map_err(|e| eyre::eyre!("JSON serialization failed: {e}"))
}

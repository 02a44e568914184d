//! Coverage tag patterns
//!
//! A tag is a marker literal followed by a requirement id and, optionally, a
//! revision suffix and a closing literal. With the defaults:
//!
//! ```text
//! // @Req(REQ-1)
//! // @Req(REQ-1, rev=v2)
//! ```
//!
//! [`TagConfig`] is plain data. [`TagConfig::compile`] validates it and produces
//! a [`TagMatcher`], which is what the scanner and the requirement sources use.

use crate::error::{ConfigError, PatternKind};
use regex::{Captures, Regex};

pub const DEFAULT_MARKER: &str = "@Req(";
pub const DEFAULT_TERMINATOR: &str = ")";
pub const DEFAULT_ID_PATTERN: &str = r"[A-Za-z0-9_.\-]+";
pub const DEFAULT_REVISION_PATTERN: &str = r"\s*,\s*rev\s*=\s*([A-Za-z0-9_.\-]+)";

/// Textual definition of a coverage tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagConfig {
    /// Literal that opens a tag (matched verbatim, not as a regex)
    pub marker: String,
    /// Regex for the requirement id
    pub id_pattern: String,
    /// Regex with exactly one capture group holding the revision
    pub revision_pattern: Option<String>,
    /// Literal that closes a tag
    pub terminator: Option<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
            revision_pattern: Some(DEFAULT_REVISION_PATTERN.to_string()),
            terminator: Some(DEFAULT_TERMINATOR.to_string()),
        }
    }
}

impl TagConfig {
    /// A tag made of `marker` directly followed by an id, nothing else
    pub fn new(marker: impl Into<String>, id_pattern: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            id_pattern: id_pattern.into(),
            revision_pattern: None,
            terminator: None,
        }
    }

    pub fn revision(mut self, pattern: impl Into<String>) -> Self {
        self.revision_pattern = Some(pattern.into());
        self
    }

    pub fn terminator(mut self, literal: impl Into<String>) -> Self {
        self.terminator = Some(literal.into());
        self
    }

    /// Validate the patterns and build the matchers.
    ///
    /// Any failure here must stop the run before scanning starts.
    pub fn compile(&self) -> Result<TagMatcher, ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }

        let anchored_id = compile_pattern(
            PatternKind::Id,
            &self.id_pattern,
            &format!("^(?:{})$", self.id_pattern),
        )?;
        if anchored_id.is_match("") {
            return Err(ConfigError::EmptyIdMatch(self.id_pattern.clone()));
        }

        let revision = match &self.revision_pattern {
            Some(pattern) => {
                let re = compile_pattern(PatternKind::Revision, pattern, pattern)?;
                // captures_len() counts the implicit whole-match group
                if re.captures_len() != 2 {
                    return Err(ConfigError::RevisionGroups {
                        pattern: pattern.clone(),
                        found: re.captures_len() - 1,
                    });
                }
                Some(re)
            }
            None => None,
        };

        let mut full = regex::escape(&self.marker);
        full.push_str(r"\s*(?P<id>");
        full.push_str(&self.id_pattern);
        full.push(')');
        if let Some(pattern) = &self.revision_pattern {
            full.push_str("(?:");
            full.push_str(pattern);
            full.push_str(")?");
        }
        if let Some(terminator) = &self.terminator {
            full.push_str(r"\s*");
            full.push_str(&regex::escape(terminator));
        }
        let tag = compile_pattern(PatternKind::Tag, &full, &full)?;

        Ok(TagMatcher { tag, revision })
    }
}

fn compile_pattern(kind: PatternKind, shown: &str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        kind,
        pattern: shown.to_string(),
        source: Box::new(source),
    })
}

/// One tag occurrence inside a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch<'t> {
    pub id: &'t str,
    pub revision: Option<&'t str>,
    /// Byte offset of the tag start within the searched text
    pub start: usize,
    /// Byte offset one past the tag end
    pub end: usize,
}

/// Compiled form of a [`TagConfig`]
#[derive(Debug, Clone)]
pub struct TagMatcher {
    tag: Regex,
    revision: Option<Regex>,
}

impl TagMatcher {
    /// All tags in `text`, left to right
    pub fn find_iter<'t>(&self, text: &'t str) -> impl Iterator<Item = TagMatch<'t>> {
        self.tag
            .captures_iter(text)
            .filter_map(|caps| self.to_match(&caps))
    }

    /// The first tag in `text`
    pub fn find<'t>(&self, text: &'t str) -> Option<TagMatch<'t>> {
        self.tag.captures(text).and_then(|caps| self.to_match(&caps))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.tag.is_match(text)
    }

    /// Revision of the first tag in `text`, if the tag carries one
    pub fn extract_revision(&self, text: &str) -> Option<String> {
        self.find(text)
            .and_then(|m| m.revision)
            .map(ToString::to_string)
    }

    fn to_match<'t>(&self, caps: &Captures<'t>) -> Option<TagMatch<'t>> {
        let whole = caps.get(0)?;
        let id = caps.name("id")?;

        // Only look for the revision after the id so the id text never leaks into it
        let tail = &whole.as_str()[id.end() - whole.start()..];
        let revision = self
            .revision
            .as_ref()
            .and_then(|re| re.captures(tail))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        Some(TagMatch {
            id: id.as_str(),
            revision,
            start: whole.start(),
            end: whole.end(),
        })
    }
}

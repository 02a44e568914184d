//! Selection of the files a scan looks at

use crate::error::ConfigError;
use crate::scanner::ScanWarning;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// File extensions scanned when no explicit allow-list is configured.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "rs",     // Rust
    "swift",  // Swift
    "ts",     // TypeScript
    "tsx",    // TypeScript JSX
    "js",     // JavaScript
    "jsx",    // JavaScript JSX
    "go",     // Go
    "c",      // C
    "h",      // C headers
    "cpp",    // C++
    "hpp",    // C++ headers
    "cc",     // C++
    "cxx",    // C++
    "m",      // Objective-C
    "mm",     // Objective-C++
    "java",   // Java
    "kt",     // Kotlin
    "kts",    // Kotlin script
    "scala",  // Scala
    "groovy", // Groovy
    "cs",     // C#
    "zig",    // Zig
    "php",    // PHP
    "py",     // Python
    "rb",     // Ruby
    "dart",   // Dart
    "lua",    // Lua
    "ex",     // Elixir
    "exs",    // Elixir script
    "erl",    // Erlang
    "hs",     // Haskell
    "fs",     // F#
    "ml",     // OCaml
    "sh",     // Shell/Bash
    "sql",    // SQL
    "feature", // Gherkin
];

/// Check if a file extension is in the default allow-list
pub fn is_supported_extension(ext: &OsStr) -> bool {
    ext.to_str()
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Which files under a root are eligible for tag scanning.
///
/// The same filter is applied to the source root and the test root. Glob
/// patterns match the path relative to the root being scanned, using `/`
/// as separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    extensions: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    respect_gitignore: bool,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFilter {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            respect_gitignore: true,
        }
    }

    /// Replace the default extension allow-list (e.g., `["rs", "java"]`)
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions.extend(
            exts.into_iter()
                .map(Into::into)
                .map(|e: String| e.trim_start_matches('.').to_string()),
        );
        self
    }

    /// Add include patterns (e.g., `["**/*.rs"]`)
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["target/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    pub fn compile(&self) -> Result<FileMatcher, ConfigError> {
        Ok(FileMatcher {
            extensions: self.extensions.clone(),
            include: build_globset(&self.include)?,
            has_include: !self.include.is_empty(),
            exclude: build_globset(&self.exclude)?,
            respect_gitignore: self.respect_gitignore,
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = pattern.replace('\\', "/");
        let glob = Glob::new(&normalized).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Compiled form of a [`FileFilter`]
#[derive(Debug, Clone)]
pub struct FileMatcher {
    extensions: Vec<String>,
    include: GlobSet,
    has_include: bool,
    exclude: GlobSet,
    respect_gitignore: bool,
}

impl FileMatcher {
    /// Whether `path` (somewhere under `root`) should be scanned
    pub fn accepts(&self, path: &Path, root: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext_ok = if self.extensions.is_empty() {
            is_supported_extension(ext)
        } else {
            ext.to_str()
                .is_some_and(|e| self.extensions.iter().any(|allowed| allowed == e))
        };
        if !ext_ok {
            return false;
        }

        let relative = relative_slash_path(path, root);
        if self.has_include && !self.include.is_match(&relative) {
            return false;
        }
        !self.exclude.is_match(&relative)
    }

    /// Recursively list the eligible regular files under `root`.
    ///
    /// The returned list is sorted by relative path so that every consumer
    /// sees the same order no matter how the directory was walked. Entries
    /// the walker cannot read become warnings.
    pub fn collect_files(&self, root: &Path) -> (Vec<PathBuf>, Vec<ScanWarning>) {
        self.collect_files_except(root, None)
    }

    /// Like [`collect_files`](Self::collect_files), but never descends into `skip`
    pub(crate) fn collect_files_except(
        &self,
        root: &Path,
        skip: Option<&Path>,
    ) -> (Vec<PathBuf>, Vec<ScanWarning>) {
        use ignore::WalkBuilder;

        let mut builder = WalkBuilder::new(root);
        builder
            .follow_links(true)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore);
        if let Some(skip) = skip {
            let skip = skip.to_path_buf();
            builder.filter_entry(move |entry| entry.path() != skip);
        }
        let walker = builder.build();

        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let file = match &err {
                        ignore::Error::WithPath { path, .. } => path.clone(),
                        _ => root.to_path_buf(),
                    };
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                    warnings.push(ScanWarning {
                        file,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if self.accepts(entry.path(), root) {
                files.push(entry.into_path());
            }
        }

        files.sort_by_cached_key(|path| relative_slash_path(path, root));
        (files, warnings)
    }
}

/// Path of `path` relative to `root`, with `/` separators
pub(crate) fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

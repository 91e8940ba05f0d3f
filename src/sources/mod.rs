//! Source file selection
//!
//! Resolves a glob relative to a base directory into concrete files. The
//! base plays the same role as a stream base: outputs keep the path
//! relative to it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;
use walkdir::WalkDir;

/// A file selected by a [`SourceSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path
    pub path: PathBuf,

    /// Path relative to the set's base
    pub relative: PathBuf,
}

impl SourceFile {
    /// Output location mirroring the relative path under `out_dir`
    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.relative)
    }

    /// Output location with the extension replaced
    pub fn output_with_extension(&self, out_dir: &Path, ext: &str) -> PathBuf {
        out_dir.join(&self.relative).with_extension(ext)
    }

    /// Output location with `suffix` inserted before a new extension,
    /// e.g. `main` + `.min` + `css` -> `main.min.css`
    pub fn output_with_suffix(&self, out_dir: &Path, suffix: &str, ext: &str) -> PathBuf {
        let stem = self.stem();
        let file_name = format!("{}{}.{}", stem, suffix, ext);
        let mut path = out_dir.join(&self.relative);
        path.set_file_name(file_name);
        path
    }

    /// File name without extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// File name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Lower-cased extension, if any
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// A glob anchored at a base directory
#[derive(Debug, Clone)]
pub struct SourceSet {
    base: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

impl SourceSet {
    /// Compile `pattern` relative to `base`
    ///
    /// `*` does not cross directory separators; use `**` for recursion.
    /// Brace alternatives (`*.{jpg,png}`) are supported.
    pub fn new(base: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;

        Ok(Self {
            base: base.into(),
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Base directory
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Glob pattern as configured
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check whether an absolute path falls under the base and matches
    pub fn matches(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base)
            .map(|relative| self.matcher.is_match(relative))
            .unwrap_or(false)
    }

    /// List every matching file, sorted by relative path
    ///
    /// A missing base directory selects nothing.
    pub fn files(&self) -> Result<Vec<SourceFile>> {
        if !self.base.is_dir() {
            debug!("Source directory {} does not exist", self.base.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.base).follow_links(true) {
            let entry = entry
                .with_context(|| format!("Failed to walk {}", self.base.display()))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.base) else {
                continue;
            };

            if self.matcher.is_match(relative) {
                files.push(SourceFile {
                    path: entry.path().to_path_buf(),
                    relative: relative.to_path_buf(),
                });
            }
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        debug!(
            "{} file(s) match {} in {}",
            files.len(),
            self.pattern,
            self.base.display()
        );

        Ok(files)
    }
}

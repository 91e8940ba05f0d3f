//! Configuration handling for sitepipe
//!
//! Parses and manages `sitepipe.toml`. Every field is optional; an absent
//! file yields the built-in layout (`app/` → `dist/`).

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use schema::*;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "sitepipe.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source and output roots
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTML page composition
    #[serde(default)]
    pub html: HtmlConfig,

    /// SCSS pipeline
    #[serde(default)]
    pub styles: StylesConfig,

    /// Script pipeline
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Image pipeline
    #[serde(default)]
    pub images: ImagesConfig,

    /// Font copy-through
    #[serde(default)]
    pub fonts: FontsConfig,

    /// Development server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

/// Asset categories with their own source directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Html,
    Styles,
    Scripts,
    Images,
    Fonts,
}

/// Absolute locations for one asset category
#[derive(Debug, Clone)]
pub struct AssetPaths {
    /// Glob base; output paths mirror the path relative to it
    pub base: PathBuf,

    /// Files the task reads
    pub include: String,

    /// Files whose change re-runs the task
    pub watch: String,

    /// Directory the task writes into
    pub output: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", canonical_path.display()))?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;

        Ok(config)
    }

    /// Load an explicit config file, or `./sitepipe.toml` when present, or
    /// fall back to the built-in defaults rooted at the working directory
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let cwd = std::env::current_dir()?;
        let candidate = cwd.join(CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(candidate);
        }

        debug!("No {} found, using defaults", CONFIG_FILE);
        let config = Self::default_config(cwd);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without touching the filesystem
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Create a default configuration rooted at `root`
    pub fn default_config(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.paths.source.trim().is_empty() || self.paths.output.trim().is_empty() {
            anyhow::bail!("[paths] source and output must not be empty");
        }

        // An output inside the source tree would feed the watcher its own writes
        if self.output_dir().starts_with(self.source_dir()) {
            anyhow::bail!(
                "Output directory must differ from and lie outside the source directory: {}",
                self.output_dir().display()
            );
        }

        if !(1..=100).contains(&self.images.jpeg_quality) {
            anyhow::bail!("[images] jpeg_quality must be between 1 and 100");
        }

        if !(1..=10).contains(&self.images.avif_speed) {
            anyhow::bail!("[images] avif_speed must be between 1 and 10");
        }

        if !(1.0..=100.0).contains(&self.images.avif_quality) {
            anyhow::bail!("[images] avif_quality must be between 1 and 100");
        }

        Ok(())
    }

    /// Get the absolute source directory path
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.paths.source)
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.paths.output)
    }

    /// Resolve the source and output locations for an asset category
    pub fn assets(&self, asset: Asset) -> AssetPaths {
        let (dir, include, watch, output) = match asset {
            Asset::Html => (
                &self.html.dir,
                &self.html.include,
                &self.html.watch,
                &self.html.output,
            ),
            Asset::Styles => (
                &self.styles.dir,
                &self.styles.include,
                &self.styles.watch,
                &self.styles.output,
            ),
            Asset::Scripts => (
                &self.scripts.dir,
                &self.scripts.include,
                &self.scripts.watch,
                &self.scripts.output,
            ),
            Asset::Images => (
                &self.images.dir,
                &self.images.include,
                &self.images.include,
                &self.images.output,
            ),
            Asset::Fonts => (
                &self.fonts.dir,
                &self.fonts.include,
                &self.fonts.include,
                &self.fonts.output,
            ),
        };

        AssetPaths {
            base: join_relative(&self.source_dir(), dir),
            include: include.clone(),
            watch: watch.clone(),
            output: join_relative(&self.output_dir(), output),
        }
    }

    /// Absolute layout directory for page composition
    pub fn layouts_dir(&self) -> PathBuf {
        join_relative(&self.source_dir(), &self.html.layouts)
    }

    /// Absolute partial directory for page composition
    pub fn partials_dir(&self) -> PathBuf {
        join_relative(&self.source_dir(), &self.html.partials)
    }
}

/// Join a configured sub-directory, treating `.` and `""` as the base itself
fn join_relative(base: &Path, dir: &str) -> PathBuf {
    match dir.trim_matches('/') {
        "" | "." => base.to_path_buf(),
        dir => base.join(dir),
    }
}

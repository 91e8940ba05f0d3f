//! Stylesheet pipeline: SCSS → prefixed CSS → minified CSS

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use super::TransformError;

/// Both renditions of one stylesheet
#[derive(Debug, Clone)]
pub struct StyleOutput {
    /// Prefixed, readable CSS
    pub expanded: String,

    /// Prefixed CSS with whitespace and every comment removed
    pub minified: String,
}

/// Compiles SCSS and post-processes it for a fixed set of browser targets
pub struct StyleCompiler {
    browsers: Option<Browsers>,
    load_paths: Vec<PathBuf>,
}

impl StyleCompiler {
    /// Create a compiler for the given browserslist queries
    pub fn new<S: AsRef<str>>(queries: &[S]) -> Result<Self, TransformError> {
        let browsers = if queries.is_empty() {
            None
        } else {
            Browsers::from_browserslist(queries.iter().map(|q| q.as_ref()))
                .map_err(|e| TransformError::Browsers(e.to_string()))?
        };

        Ok(Self {
            browsers,
            load_paths: Vec::new(),
        })
    }

    /// Add a directory searched by `@use` and `@import`
    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    fn targets(&self) -> Targets {
        Targets {
            browsers: self.browsers,
            ..Targets::default()
        }
    }

    fn scss_options(&self, extra: Option<&Path>) -> grass::Options<'static> {
        let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
        if let Some(dir) = extra {
            options = options.load_path(dir);
        }
        for path in &self.load_paths {
            options = options.load_path(path);
        }
        options
    }

    /// Compile an SCSS file and post-process the result
    pub fn compile_file(&self, path: &Path) -> Result<StyleOutput, TransformError> {
        debug!("Compiling SCSS: {}", path.display());

        let css = grass::from_path(path, &self.scss_options(path.parent()))
            .map_err(|e| TransformError::Scss(e.to_string()))?;

        let filename = path.display().to_string();
        self.process(&css, &filename)
    }

    /// Compile SCSS source text and post-process the result
    pub fn compile_str(&self, source: &str, filename: &str) -> Result<StyleOutput, TransformError> {
        let css = grass::from_string(source.to_string(), &self.scss_options(None))
            .map_err(|e| TransformError::Scss(e.to_string()))?;

        self.process(&css, filename)
    }

    /// Prefix and minify plain CSS
    pub fn process(&self, css: &str, filename: &str) -> Result<StyleOutput, TransformError> {
        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| TransformError::Css(e.to_string()))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets(),
                ..MinifyOptions::default()
            })
            .map_err(|e| TransformError::Css(e.to_string()))?;

        let expanded = stylesheet
            .to_css(PrinterOptions {
                minify: false,
                targets: self.targets(),
                ..PrinterOptions::default()
            })
            .map_err(|e| TransformError::Css(e.to_string()))?
            .code;

        stylesheet.license_comments.clear();

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                targets: self.targets(),
                ..PrinterOptions::default()
            })
            .map_err(|e| TransformError::Css(e.to_string()))?
            .code;

        Ok(StyleOutput { expanded, minified })
    }
}

//! Asset transformation
//!
//! Thin adapters over the libraries that do the real work:
//! - [`template`]: layout/partial page composition with handlebars
//! - [`style`]: SCSS via grass, prefixing and minification via lightningcss
//! - [`script`]: JavaScript minification via oxc
//! - [`raster`]: JPEG/PNG recompression and WebP/AVIF conversion
//!
//! Each adapter works on in-memory content; reading and writing files is
//! left to the tasks.

pub mod raster;
pub mod script;
pub mod style;
pub mod template;

use thiserror::Error;

pub use raster::RasterKind;
pub use style::{StyleCompiler, StyleOutput};
pub use template::PageRenderer;

/// Errors raised by the transformation libraries
#[derive(Debug, Error)]
pub enum TransformError {
    /// A layout, partial or page failed to compile or render
    #[error("template error in {name}: {message}")]
    Template { name: String, message: String },

    /// The page names a layout that was never registered
    #[error("layout '{0}' not found")]
    MissingLayout(String),

    /// Front matter is not a YAML mapping
    #[error("invalid front matter: {0}")]
    FrontMatter(String),

    /// SCSS compilation failed (message carries the location)
    #[error("{0}")]
    Scss(String),

    /// CSS parsing, prefixing or printing failed
    #[error("CSS error: {0}")]
    Css(String),

    /// Invalid browserslist query
    #[error("invalid browser targets: {0}")]
    Browsers(String),

    /// JavaScript failed to parse
    #[error("JavaScript parse error: {0}")]
    Script(String),

    /// Decoding or encoding a raster image failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// AVIF encoding failed
    #[error("AVIF encoding failed: {0}")]
    Avif(String),
}

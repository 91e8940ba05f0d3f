//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Source and output roots, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Source tree
    #[serde(default = "default_source_dir")]
    pub source: String,

    /// Distributable output tree
    #[serde(default = "default_output_dir")]
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source_dir(),
            output: default_output_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "app".to_string()
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_suffix() -> String {
    ".min".to_string()
}

/// HTML page composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Page directory, relative to the source root
    #[serde(default = "default_html_dir")]
    pub dir: String,

    /// Pages to render
    #[serde(default = "default_html_include")]
    pub include: String,

    /// Files that trigger a re-render (layouts and partials included)
    #[serde(default = "default_html_watch")]
    pub watch: String,

    /// Output directory, relative to the output root
    #[serde(default = "default_html_output")]
    pub output: String,

    /// Layout directory, relative to the source root
    #[serde(default = "default_layouts_dir")]
    pub layouts: String,

    /// Partial directory, relative to the source root
    #[serde(default = "default_partials_dir")]
    pub partials: String,

    /// Layout used when a page does not name one
    #[serde(default = "default_layout")]
    pub default_layout: String,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            dir: default_html_dir(),
            include: default_html_include(),
            watch: default_html_watch(),
            output: default_html_output(),
            layouts: default_layouts_dir(),
            partials: default_partials_dir(),
            default_layout: default_layout(),
        }
    }
}

fn default_html_dir() -> String {
    ".".to_string()
}

fn default_html_include() -> String {
    "*.html".to_string()
}

fn default_html_watch() -> String {
    "**/*.html".to_string()
}

fn default_html_output() -> String {
    ".".to_string()
}

fn default_layouts_dir() -> String {
    "templates/layouts".to_string()
}

fn default_partials_dir() -> String {
    "templates/partials".to_string()
}

fn default_layout() -> String {
    "default".to_string()
}

/// SCSS compilation, prefixing and minification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    #[serde(default = "default_styles_dir")]
    pub dir: String,

    #[serde(default = "default_styles_include")]
    pub include: String,

    #[serde(default = "default_styles_watch")]
    pub watch: String,

    #[serde(default = "default_styles_output")]
    pub output: String,

    /// Browserslist queries used for vendor prefixing
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,

    /// Suffix inserted before `.css` on the minified sibling
    #[serde(default = "default_min_suffix")]
    pub min_suffix: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            dir: default_styles_dir(),
            include: default_styles_include(),
            watch: default_styles_watch(),
            output: default_styles_output(),
            browsers: default_browsers(),
            min_suffix: default_min_suffix(),
        }
    }
}

fn default_styles_dir() -> String {
    "scss".to_string()
}

fn default_styles_include() -> String {
    "*.scss".to_string()
}

fn default_styles_watch() -> String {
    "**/*.scss".to_string()
}

fn default_styles_output() -> String {
    "css".to_string()
}

fn default_browsers() -> Vec<String> {
    vec!["last 10 versions".to_string()]
}

/// Script copy and minification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default = "default_scripts_dir")]
    pub dir: String,

    #[serde(default = "default_scripts_include")]
    pub include: String,

    #[serde(default = "default_scripts_watch")]
    pub watch: String,

    #[serde(default = "default_scripts_output")]
    pub output: String,

    /// Suffix inserted before `.js` on the minified sibling
    #[serde(default = "default_min_suffix")]
    pub min_suffix: String,

    /// Shorten local identifiers
    #[serde(default = "default_true")]
    pub mangle: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: default_scripts_dir(),
            include: default_scripts_include(),
            watch: default_scripts_watch(),
            output: default_scripts_output(),
            min_suffix: default_min_suffix(),
            mangle: true,
        }
    }
}

fn default_scripts_dir() -> String {
    "js".to_string()
}

fn default_scripts_include() -> String {
    "*.js".to_string()
}

fn default_scripts_watch() -> String {
    "**/*.js".to_string()
}

fn default_scripts_output() -> String {
    "js".to_string()
}

/// PNG deflate effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

/// Image optimization and modern-format conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_images_dir")]
    pub dir: String,

    /// Matched files are both built and watched
    #[serde(default = "default_images_include")]
    pub include: String,

    #[serde(default = "default_images_output")]
    pub output: String,

    /// JPEG re-encode quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_png_compression")]
    pub png_compression: PngCompression,

    /// Emit `.webp` siblings during full builds
    #[serde(default = "default_true")]
    pub webp: bool,

    /// Emit `.avif` siblings during full builds
    #[serde(default = "default_true")]
    pub avif: bool,

    /// AVIF quality (1-100)
    #[serde(default = "default_avif_quality")]
    pub avif_quality: f32,

    /// AVIF encoder speed (1 slowest - 10 fastest)
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: default_images_dir(),
            include: default_images_include(),
            output: default_images_output(),
            jpeg_quality: default_jpeg_quality(),
            png_compression: default_png_compression(),
            webp: true,
            avif: true,
            avif_quality: default_avif_quality(),
            avif_speed: default_avif_speed(),
        }
    }
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_images_include() -> String {
    "**/*.{jpg,png,svg,jpeg,webp,ico,gif,xml,json,webmanifest,avif}".to_string()
}

fn default_images_output() -> String {
    "img".to_string()
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_png_compression() -> PngCompression {
    PngCompression::Best
}

fn default_avif_quality() -> f32 {
    50.0
}

fn default_avif_speed() -> u8 {
    6
}

/// Font copy-through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontsConfig {
    #[serde(default = "default_fonts_dir")]
    pub dir: String,

    #[serde(default = "default_fonts_include")]
    pub include: String,

    #[serde(default = "default_fonts_output")]
    pub output: String,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: default_fonts_dir(),
            include: default_fonts_include(),
            output: default_fonts_output(),
        }
    }
}

fn default_fonts_dir() -> String {
    "fonts".to_string()
}

fn default_fonts_include() -> String {
    "**/*.{eot,woff,woff2,ttf,svg}".to_string()
}

fn default_fonts_output() -> String {
    "fonts".to_string()
}

/// Development server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to run dev server on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Open browser automatically
    #[serde(default)]
    pub open: bool,

    /// Inject the live-reload client into served pages
    #[serde(default = "default_true")]
    pub reload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            open: false,
            reload: true,
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period before a batch of filesystem events is handled
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

//! Page composition
//!
//! Pages are handlebars templates with optional YAML front matter. The
//! page body is registered as the `body` partial and rendered inside the
//! selected layout through `{{> body}}`.

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::TransformError;

static FRONT_MATTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\A---[ \t]*\r?\n((?s:.*?))^---[ \t]*\r?$\n?").unwrap()
});

/// Layout name prefix inside the registry, keeps layouts apart from partials
const LAYOUT_PREFIX: &str = "layouts/";

/// Split leading front matter from a page
///
/// Returns the front matter as a JSON object (empty when absent) and the
/// remaining body.
pub fn split_front_matter(source: &str) -> Result<(Map<String, Value>, &str), TransformError> {
    let Some(caps) = FRONT_MATTER_REGEX.captures(source) else {
        return Ok((Map::new(), source));
    };

    let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
    let yaml = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = &source[whole..];

    if yaml.trim().is_empty() {
        return Ok((Map::new(), body));
    }

    let value: Value = serde_yaml_ng::from_str(yaml)
        .map_err(|e| TransformError::FrontMatter(e.to_string()))?;

    match value {
        Value::Object(map) => Ok((map, body)),
        Value::Null => Ok((Map::new(), body)),
        other => Err(TransformError::FrontMatter(format!(
            "expected a mapping, found {}",
            other
        ))),
    }
}

/// Per-page values injected next to the front matter
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Page file stem (`index` for `index.html`)
    pub page: String,

    /// Relative prefix from the page to the output root (`""`, `"../"`, ...)
    pub root: String,
}

/// Handlebars registry holding the layouts and partials for one run
pub struct PageRenderer {
    registry: Handlebars<'static>,
    default_layout: String,
}

impl PageRenderer {
    /// Create an empty renderer
    pub fn new(default_layout: impl Into<String>) -> Self {
        Self {
            registry: Handlebars::new(),
            default_layout: default_layout.into(),
        }
    }

    /// Register a layout under `name`
    pub fn register_layout(&mut self, name: &str, source: &str) -> Result<(), TransformError> {
        self.registry
            .register_template_string(&format!("{}{}", LAYOUT_PREFIX, name), source)
            .map_err(|e| TransformError::Template {
                name: format!("layout '{}'", name),
                message: e.to_string(),
            })
    }

    /// Register a partial under `name`, usable as `{{> name}}`
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<(), TransformError> {
        self.registry
            .register_partial(name, source)
            .map_err(|e| TransformError::Template {
                name: format!("partial '{}'", name),
                message: e.to_string(),
            })
    }

    /// Check whether a layout is registered
    pub fn has_layout(&self, name: &str) -> bool {
        self.registry
            .has_template(&format!("{}{}", LAYOUT_PREFIX, name))
    }

    /// Render a page source into a full document
    ///
    /// `layout: none` (or `layout: false`) in the front matter renders the
    /// body on its own.
    pub fn render_page(
        &mut self,
        source: &str,
        context: &PageContext,
    ) -> Result<String, TransformError> {
        let (mut data, body) = split_front_matter(source)?;

        let layout = match data.get("layout") {
            Some(Value::String(name)) if name == "none" => None,
            Some(Value::Bool(false)) => None,
            Some(Value::String(name)) => Some(name.clone()),
            _ => Some(self.default_layout.clone()),
        };

        data.insert("page".to_string(), Value::String(context.page.clone()));
        data.insert("root".to_string(), Value::String(context.root.clone()));
        let data = Value::Object(data);

        let page_name = format!("page '{}'", context.page);

        let Some(layout) = layout else {
            return self
                .registry
                .render_template(body, &data)
                .map_err(|e| TransformError::Template {
                    name: page_name,
                    message: e.to_string(),
                });
        };

        if !self.has_layout(&layout) {
            return Err(TransformError::MissingLayout(layout));
        }

        self.register_partial("body", body)?;

        self.registry
            .render(&format!("{}{}", LAYOUT_PREFIX, layout), &data)
            .map_err(|e| TransformError::Template {
                name: page_name,
                message: e.to_string(),
            })
    }
}

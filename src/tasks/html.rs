//! HTML page composition

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::{Task, TaskContext, TaskReport};
use crate::config::Asset;
use crate::sources::SourceSet;
use crate::transform::template::{PageContext, PageRenderer};

/// Template files recognised in the layout and partial directories
const TEMPLATE_GLOB: &str = "**/*.{html,hbs,handlebars}";

/// Renders every page through its layout
///
/// Layouts and partials are re-read on each run, so edits to them show up
/// on the next rebuild.
pub struct HtmlTask;

impl HtmlTask {
    fn load_templates(ctx: &TaskContext) -> Result<PageRenderer> {
        let config = &ctx.config;
        let mut renderer = PageRenderer::new(config.html.default_layout.clone());

        for file in SourceSet::new(config.layouts_dir(), TEMPLATE_GLOB)?.files()? {
            let source = read(&file.path)?;
            renderer.register_layout(&file.stem(), &source)?;
            debug!("Registered layout '{}'", file.stem());
        }

        for file in SourceSet::new(config.partials_dir(), TEMPLATE_GLOB)?.files()? {
            let source = read(&file.path)?;
            renderer.register_partial(&file.stem(), &source)?;
            debug!("Registered partial '{}'", file.stem());
        }

        Ok(renderer)
    }
}

impl Task for HtmlTask {
    fn name(&self) -> &'static str {
        "html"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let paths = ctx.config.assets(Asset::Html);
        let sources = SourceSet::new(&paths.base, &paths.include)?;
        let mut renderer = Self::load_templates(ctx)?;
        let mut report = TaskReport::new(self.name());

        for file in sources.files()? {
            let source = read(&file.path)?;
            let depth = file.relative.components().count().saturating_sub(1);
            let page = PageContext {
                page: file.stem(),
                root: "../".repeat(depth),
            };

            let html = renderer
                .render_page(&source, &page)
                .with_context(|| format!("Failed to render {}", file.path.display()))?;

            report.write(&file.output_path(&paths.output), html)?;
        }

        Ok(report)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::tests::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_renders_pages_through_layout() {
        let (dir, ctx) = fixture();
        let report = HtmlTask.run(&ctx).unwrap();

        assert_eq!(report.outputs.len(), 1);
        let html = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(html, "<html><body><nav>index</nav><h1>Home</h1></body></html>");
    }

    #[test]
    fn test_templates_are_not_pages() {
        let (dir, ctx) = fixture();
        HtmlTask.run(&ctx).unwrap();
        assert!(!dir.path().join("dist/templates").exists());
    }

    #[test]
    fn test_layout_edits_are_picked_up() {
        let (dir, ctx) = fixture();
        HtmlTask.run(&ctx).unwrap();

        fs::write(
            dir.path().join("app/templates/layouts/default.html"),
            "<main>{{> body}}</main>",
        )
        .unwrap();
        HtmlTask.run(&ctx).unwrap();

        let html = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(html, "<main><h1>Home</h1></main>");
    }

    #[test]
    fn test_unknown_layout_fails() {
        let (dir, ctx) = fixture();
        fs::write(dir.path().join("app/about.html"), "---\nlayout: post\n---\nhi").unwrap();

        let err = HtmlTask.run(&ctx).unwrap_err();
        assert!(format!("{:#}", err).contains("layout 'post' not found"));
    }
}

//! Script copy and minification

use std::fs;

use anyhow::{Context, Result};

use super::{Task, TaskContext, TaskReport};
use crate::config::Asset;
use crate::sources::SourceSet;
use crate::transform::script::minify_js;

/// Writes each script as-is plus a minified sibling
pub struct ScriptsTask;

impl Task for ScriptsTask {
    fn name(&self) -> &'static str {
        "js"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let options = &ctx.config.scripts;
        let paths = ctx.config.assets(Asset::Scripts);
        let sources = SourceSet::new(&paths.base, &paths.include)?;
        let mut report = TaskReport::new(self.name());

        for file in sources.files()? {
            let source = fs::read_to_string(&file.path)
                .with_context(|| format!("Failed to read {}", file.path.display()))?;

            report.write(&file.output_path(&paths.output), &source)?;

            let minified = minify_js(&source, options.mangle)
                .with_context(|| format!("Failed to minify {}", file.path.display()))?;
            report.write(
                &file.output_with_suffix(&paths.output, &options.min_suffix, "js"),
                minified,
            )?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::tests::fixture;

    #[test]
    fn test_writes_original_and_minified() {
        let (dir, ctx) = fixture();
        let report = ScriptsTask.run(&ctx).unwrap();

        assert_eq!(report.outputs.len(), 2);
        let original = fs::read_to_string(dir.path().join("dist/js/app.js")).unwrap();
        let minified = fs::read_to_string(dir.path().join("dist/js/app.min.js")).unwrap();
        assert!(original.contains("function greet(name)"));
        assert!(minified.len() < original.len());
        assert!(minified.contains("greet"));
    }

    #[test]
    fn test_syntax_error_fails_the_task() {
        let (dir, ctx) = fixture();
        fs::write(dir.path().join("app/js/broken.js"), "function (").unwrap();

        let err = ScriptsTask.run(&ctx).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.js"));
    }
}

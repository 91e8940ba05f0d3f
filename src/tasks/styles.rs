//! SCSS compilation
//!
//! Compile failures are recorded per file and never fail the task.

use anyhow::Result;
use tracing::warn;

use super::{Task, TaskContext, TaskFailure, TaskReport};
use crate::config::Asset;
use crate::sources::SourceSet;
use crate::transform::StyleCompiler;

/// Compiles top-level stylesheets into prefixed and minified CSS
pub struct StylesTask;

impl Task for StylesTask {
    fn name(&self) -> &'static str {
        "css"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let options = &ctx.config.styles;
        let paths = ctx.config.assets(Asset::Styles);
        let sources = SourceSet::new(&paths.base, &paths.include)?;
        let compiler = StyleCompiler::new(&options.browsers)?.with_load_path(&paths.base);
        let mut report = TaskReport::new(self.name());

        for file in sources.files()? {
            // Partials are only reachable through @use/@import
            if file.file_name().starts_with('_') {
                continue;
            }

            match compiler.compile_file(&file.path) {
                Ok(output) => {
                    report.write(&file.output_with_extension(&paths.output, "css"), output.expanded)?;
                    report.write(
                        &file.output_with_suffix(&paths.output, &options.min_suffix, "css"),
                        output.minified,
                    )?;
                }
                Err(e) => {
                    warn!("{}: {}", file.path.display(), e);
                    report.failures.push(TaskFailure {
                        file: file.path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::tests::fixture;
    use std::fs;

    #[test]
    fn test_compiles_entry_and_skips_partials() {
        let (dir, ctx) = fixture();
        let report = StylesTask.run(&ctx).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.outputs.len(), 2);

        let minified = fs::read_to_string(dir.path().join("dist/css/main.min.css")).unwrap();
        assert!(minified.contains(".a{color:red}"));
        assert!(dir.path().join("dist/css/main.css").is_file());
        assert!(!dir.path().join("dist/css/_vars.css").exists());
    }

    #[test]
    fn test_compile_error_is_recorded_not_raised() {
        let (dir, ctx) = fixture();
        fs::write(dir.path().join("app/scss/broken.scss"), ".b { color: $nope; }").unwrap();

        let report = StylesTask.run(&ctx).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].file.ends_with("broken.scss"));
        assert!(dir.path().join("dist/css/main.min.css").is_file());
        assert!(!dir.path().join("dist/css/broken.css").exists());
    }
}

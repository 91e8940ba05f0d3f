//! Font copy-through

use std::fs;

use anyhow::{Context, Result};

use super::{Task, TaskContext, TaskReport};
use crate::config::Asset;
use crate::sources::SourceSet;

/// Copies font files unchanged into the output tree
pub struct FontsTask;

impl Task for FontsTask {
    fn name(&self) -> &'static str {
        "fonts"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let paths = ctx.config.assets(Asset::Fonts);
        let sources = SourceSet::new(&paths.base, &paths.include)?;
        let mut report = TaskReport::new(self.name());

        for file in sources.files()? {
            let bytes = fs::read(&file.path)
                .with_context(|| format!("Failed to read {}", file.path.display()))?;
            report.write(&file.output_path(&paths.output), bytes)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::tests::fixture;

    #[test]
    fn test_copies_matching_fonts_only() {
        let (dir, ctx) = fixture();
        fs::write(dir.path().join("app/fonts/readme.txt"), "ignored").unwrap();

        let report = FontsTask.run(&ctx).unwrap();

        assert_eq!(report.outputs.len(), 1);
        let copied = dir.path().join("dist/fonts/body.woff2");
        assert_eq!(fs::read_to_string(copied).unwrap(), "wOF2");
        assert!(!dir.path().join("dist/fonts/readme.txt").exists());
    }
}

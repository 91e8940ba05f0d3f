//! Output directory removal

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::{Task, TaskContext, TaskReport};

/// Removes the output directory so a full build starts from scratch
pub struct CleanTask;

impl Task for CleanTask {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn run(&self, ctx: &TaskContext) -> Result<TaskReport> {
        let config = &ctx.config;
        let output = normalize(&config.output_dir());

        for protected in [normalize(&config.root), normalize(&config.source_dir())] {
            if protected.starts_with(&output) {
                anyhow::bail!(
                    "Refusing to clean {}: it contains {}",
                    output.display(),
                    protected.display()
                );
            }
        }

        if output.exists() {
            fs::remove_dir_all(&output)
                .with_context(|| format!("Failed to remove {}", output.display()))?;
            debug!("Removed {}", output.display());
        }

        Ok(TaskReport::new(self.name()))
    }
}

/// Resolve `.` and `..` lexically so a configured `../site` cannot slip
/// past the containment check
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;

    fn context(config: Config) -> TaskContext {
        TaskContext::new(Arc::new(config))
    }

    #[test]
    fn test_removes_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        fs::create_dir_all(dist.join("css")).unwrap();
        fs::write(dist.join("css/main.css"), "a{}").unwrap();

        CleanTask.run(&context(Config::default_config(dir.path()))).unwrap();
        assert!(!dist.exists());
    }

    #[test]
    fn test_missing_output_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        CleanTask.run(&context(Config::default_config(dir.path()))).unwrap();
    }

    #[test]
    fn test_refuses_to_remove_project_or_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();

        let mut config = Config::default_config(dir.path().join("site"));
        config.paths.output = "..".to_string();
        let err = CleanTask.run(&context(config)).unwrap_err();
        assert!(err.to_string().contains("Refusing to clean"));

        let mut config = Config::default_config(dir.path());
        config.paths.source = "dist/app".to_string();
        let err = CleanTask.run(&context(config)).unwrap_err();
        assert!(err.to_string().contains("Refusing to clean"));

        assert!(dir.path().join("app").exists());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }
}

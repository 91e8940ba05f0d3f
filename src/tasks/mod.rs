//! Pipeline tasks and the runner that composes them
//!
//! A task reads the files matched by one source glob and writes transformed
//! files into its output directory. Tasks share no mutable state and write
//! disjoint paths, so the runner may execute them in any order.

mod clean;
mod fonts;
mod html;
mod images;
mod scripts;
mod styles;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures_util::future::{join_all, BoxFuture};
use tracing::{debug, error};

use crate::config::Config;

pub use clean::CleanTask;
pub use fonts::FontsTask;
pub use html::HtmlTask;
pub use images::{AvifTask, ImagesTask, WebpTask};
pub use scripts::ScriptsTask;
pub use styles::StylesTask;

/// Shared, read-only state handed to every task
pub struct TaskContext {
    /// Project configuration
    pub config: Arc<Config>,
}

impl TaskContext {
    /// Create a new task context
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// A file written by a task
#[derive(Debug, Clone)]
pub struct OutputFile {
    /// Output file path
    pub path: PathBuf,

    /// Size in bytes
    pub size: usize,
}

/// A per-file failure the task recovered from
#[derive(Debug, Clone)]
pub struct TaskFailure {
    /// Source file that failed
    pub file: PathBuf,

    /// Error message
    pub message: String,
}

/// Outcome of one task run
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Task name
    pub task: &'static str,

    /// Files written
    pub outputs: Vec<OutputFile>,

    /// Recovered failures (style compilation only)
    pub failures: Vec<TaskFailure>,

    /// Wall-clock time
    pub duration: Duration,
}

impl TaskReport {
    /// Create an empty report
    pub fn new(task: &'static str) -> Self {
        Self {
            task,
            outputs: Vec::new(),
            failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Write `contents` to `path`, creating parent directories, and record it
    pub fn write(&mut self, path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
        let contents = contents.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        self.outputs.push(OutputFile {
            path: path.to_path_buf(),
            size: contents.len(),
        });

        Ok(())
    }

    /// Whether any file failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// A pipeline task
pub trait Task: Send + Sync {
    /// Task name for logging and the CLI
    fn name(&self) -> &'static str;

    /// Run the task to completion on the calling thread
    fn run(&self, ctx: &TaskContext) -> Result<TaskReport>;
}

/// Tasks addressable from the CLI and the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Html,
    Css,
    Js,
    Images,
    Webp,
    Avif,
    Fonts,
    Clean,
}

impl TaskKind {
    /// Instantiate the task
    pub fn task(self) -> Arc<dyn Task> {
        match self {
            TaskKind::Html => Arc::new(HtmlTask),
            TaskKind::Css => Arc::new(StylesTask),
            TaskKind::Js => Arc::new(ScriptsTask),
            TaskKind::Images => Arc::new(ImagesTask),
            TaskKind::Webp => Arc::new(WebpTask),
            TaskKind::Avif => Arc::new(AvifTask),
            TaskKind::Fonts => Arc::new(FontsTask),
            TaskKind::Clean => Arc::new(CleanTask),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task().name())
    }
}

/// A composition of tasks
#[derive(Clone)]
pub enum Step {
    /// A single task
    Task(Arc<dyn Task>),

    /// Run in order, stop at the first failure
    Series(Vec<Step>),

    /// Run concurrently, wait for all
    Parallel(Vec<Step>),
}

impl From<TaskKind> for Step {
    fn from(kind: TaskKind) -> Self {
        Step::Task(kind.task())
    }
}

/// Run steps one after another
pub fn series(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Series(steps.into_iter().collect())
}

/// Run steps concurrently
pub fn parallel(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Parallel(steps.into_iter().collect())
}

/// The full build: clean, then every asset task in parallel
pub fn build_pipeline() -> Step {
    series([
        TaskKind::Clean.into(),
        parallel(
            [
                TaskKind::Html,
                TaskKind::Css,
                TaskKind::Js,
                TaskKind::Images,
                TaskKind::Webp,
                TaskKind::Avif,
                TaskKind::Fonts,
            ]
            .map(Step::from),
        ),
    ])
}

/// Execute a step and collect the reports of every task it ran
///
/// Each task runs on a blocking worker. Inside [`Step::Parallel`] all
/// children run to completion before the first error is returned.
pub fn run<'a>(step: &'a Step, ctx: &'a Arc<TaskContext>) -> BoxFuture<'a, Result<Vec<TaskReport>>> {
    Box::pin(async move {
        match step {
            Step::Task(task) => Ok(vec![run_task(task.clone(), ctx.clone()).await?]),
            Step::Series(steps) => {
                let mut reports = Vec::new();
                for step in steps {
                    reports.extend(run(step, ctx).await?);
                }
                Ok(reports)
            }
            Step::Parallel(steps) => {
                let results = join_all(steps.iter().map(|step| run(step, ctx))).await;

                let mut reports = Vec::new();
                let mut first_error = None;
                for result in results {
                    match result {
                        Ok(r) => reports.extend(r),
                        Err(e) if first_error.is_none() => first_error = Some(e),
                        Err(e) => error!("{:#}", e),
                    }
                }

                match first_error {
                    Some(e) => Err(e),
                    None => Ok(reports),
                }
            }
        }
    })
}

/// Run one task off the async runtime
pub async fn run_task(task: Arc<dyn Task>, ctx: Arc<TaskContext>) -> Result<TaskReport> {
    let name = task.name();
    let start = Instant::now();
    debug!("Starting '{}'", name);

    let mut report = tokio::task::spawn_blocking(move || task.run(&ctx))
        .await
        .with_context(|| format!("Task '{}' panicked", name))?
        .with_context(|| format!("Task '{}' failed", name))?;

    report.duration = start.elapsed();
    debug!("Finished '{}' in {:?}", name, report.duration);

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Lay out a small source tree covering every task
    pub(crate) fn fixture() -> (tempfile::TempDir, Arc<TaskContext>) {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");

        let files: &[(&str, &str)] = &[
            (
                "index.html",
                "---\ntitle: Home\n---\n<h1>{{title}}</h1>",
            ),
            ("templates/layouts/default.html", "<html><body>{{> nav}}{{> body}}</body></html>"),
            ("templates/partials/nav.html", "<nav>{{page}}</nav>"),
            ("scss/main.scss", "@import 'vars';\n.a { color: $brand; }"),
            ("scss/_vars.scss", "$brand: red;"),
            ("js/app.js", "function greet(name) { return 'hi ' + name; }"),
            ("images/icon.svg", "<svg></svg>"),
            ("fonts/body.woff2", "wOF2"),
        ];

        for (rel, contents) in files {
            let path = app.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }

        fs::write(
            app.join("images/photo.png"),
            crate::transform::raster::tests::sample(image::ImageFormat::Png),
        )
        .unwrap();

        let config = Config::default_config(dir.path());
        (dir, Arc::new(TaskContext::new(Arc::new(config))))
    }

    struct Counting {
        name: &'static str,
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Task for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn run(&self, _ctx: &TaskContext) -> Result<TaskReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("{} exploded", self.name);
            }
            Ok(TaskReport::new(self.name))
        }
    }

    fn counting(name: &'static str, runs: &Arc<AtomicUsize>, fail: bool) -> Step {
        Step::Task(Arc::new(Counting {
            name,
            runs: runs.clone(),
            fail,
        }))
    }

    #[tokio::test]
    async fn test_parallel_runs_every_task_before_failing() {
        let (_dir, ctx) = fixture();
        let runs = Arc::new(AtomicUsize::new(0));

        let step = parallel([
            counting("a", &runs, false),
            counting("b", &runs, true),
            counting("c", &runs, false),
        ]);

        let err = run(&step, &ctx).await.unwrap_err();
        assert!(format!("{:#}", err).contains("b exploded"));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_series_stops_at_first_failure() {
        let (_dir, ctx) = fixture();
        let runs = Arc::new(AtomicUsize::new(0));

        let step = series([
            counting("a", &runs, false),
            counting("b", &runs, true),
            counting("c", &runs, false),
        ]);

        assert!(run(&step, &ctx).await.is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_build_pipeline_writes_every_asset() {
        let (dir, ctx) = fixture();
        let dist = dir.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("stale.txt"), "old").unwrap();

        let reports = run(&build_pipeline(), &ctx).await.unwrap();

        let names: Vec<_> = reports.iter().map(|r| r.task).collect();
        assert_eq!(
            names,
            vec!["clean", "html", "css", "js", "images", "webp", "avif", "fonts"]
        );

        assert!(!dist.join("stale.txt").exists());
        for rel in [
            "index.html",
            "css/main.css",
            "css/main.min.css",
            "js/app.js",
            "js/app.min.js",
            "img/icon.svg",
            "img/photo.png",
            "img/photo.webp",
            "img/photo.avif",
            "fonts/body.woff2",
        ] {
            assert!(dist.join(rel).is_file(), "missing {}", rel);
        }
        assert!(!dist.join("css/_vars.css").exists());
    }

    #[test]
    fn test_task_kind_names() {
        assert_eq!(TaskKind::Css.to_string(), "css");
        assert_eq!(TaskKind::Clean.to_string(), "clean");
    }
}

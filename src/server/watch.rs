//! Source watching
//!
//! Each watch glob maps to one task. A debounced batch of changes re-runs
//! every matched task once, then notifies connected browsers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use super::{ReloadChannel, ReloadMessage};
use crate::cli::{print_failures, print_report};
use crate::config::{Asset, Config};
use crate::sources::SourceSet;
use crate::tasks::{TaskContext, TaskKind, TaskReport};
use crate::utils::relative_path;

/// Watch globs and the task each one triggers
pub struct WatchRules {
    rules: Vec<(TaskKind, SourceSet)>,
}

impl WatchRules {
    /// Build the rules from the configured watch globs
    pub fn new(config: &Config) -> Result<Self> {
        let mut rules = Vec::new();

        for (kind, asset) in [
            (TaskKind::Html, Asset::Html),
            (TaskKind::Css, Asset::Styles),
            (TaskKind::Js, Asset::Scripts),
            (TaskKind::Images, Asset::Images),
            (TaskKind::Fonts, Asset::Fonts),
        ] {
            let paths = config.assets(asset);
            // Event paths arrive canonicalized
            let base = paths.base.canonicalize().unwrap_or(paths.base);
            rules.push((kind, SourceSet::new(base, &paths.watch)?));
        }

        Ok(Self { rules })
    }

    /// Tasks to re-run for a changed path
    pub fn classify(&self, path: &Path) -> Vec<TaskKind> {
        self.rules
            .iter()
            .filter(|(_, set)| set.matches(path))
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Tasks to re-run for a batch of changed paths, each at most once
    pub fn classify_all<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<TaskKind> {
        let mut kinds = Vec::new();
        for path in paths {
            for kind in self.classify(path) {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }
}

/// Message telling browsers about a successful rebuild
fn reload_message(kind: TaskKind, report: &TaskReport, root: &Path) -> ReloadMessage {
    match kind {
        TaskKind::Css => ReloadMessage::CssUpdate {
            path: report
                .outputs
                .first()
                .and_then(|o| relative_path(root, &o.path))
                .unwrap_or_default(),
        },
        _ => ReloadMessage::FullReload {
            reason: format!("{} rebuilt", kind),
        },
    }
}

/// Start watching the source tree on a background thread
///
/// Style failures are reported and the session continues. Any other task
/// failure is sent through `fatal` and the watcher stops.
pub fn spawn_watcher(
    ctx: Arc<TaskContext>,
    reload: ReloadChannel,
    fatal: UnboundedSender<anyhow::Error>,
) -> Result<()> {
    let config = ctx.config.clone();
    let source = config.source_dir();
    let source = source.canonicalize().unwrap_or(source);
    let rules = WatchRules::new(&config)?;

    // Use a debouncer to avoid too many events
    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(config.watch.debounce_ms), tx)?;

    debouncer.watcher().watch(&source, RecursiveMode::Recursive)?;
    debug!("Watching {}", source.display());

    // The debouncer is moved into the thread to keep it alive
    std::thread::spawn(move || {
        let _debouncer = debouncer;
        let output_dir = config.output_dir();

        loop {
            let events = match rx.recv() {
                Ok(Ok(events)) => events,
                Ok(Err(e)) => {
                    error!("Watch error: {:?}", e);
                    continue;
                }
                // Channel closed, exit
                Err(_) => break,
            };

            let changed: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
            let kinds = rules.classify_all(changed.iter().map(|p| p.as_path()));

            for path in &changed {
                if !rules.classify(path).is_empty() {
                    eprintln!(
                        "  {} File changed: {}",
                        "↻".yellow(),
                        relative_path(&source, path)
                            .unwrap_or_else(|| path.display().to_string())
                            .dimmed()
                    );
                }
            }

            for kind in kinds {
                let report = match kind.task().run(&ctx) {
                    Ok(report) => report,
                    Err(e) => {
                        let _ = fatal.send(e.context(format!("Task '{}' failed", kind)));
                        return;
                    }
                };

                print_report(&report, &config.root);

                if report.has_failures() {
                    print_failures(&report);
                    let failure = &report.failures[0];
                    reload.send(ReloadMessage::Error {
                        message: failure.message.clone(),
                        file: relative_path(&config.root, &failure.file),
                    });
                } else {
                    reload.send(reload_message(kind, &report, &output_dir));
                }
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::OutputFile;
    use pretty_assertions::assert_eq;

    fn rules() -> WatchRules {
        WatchRules::new(&Config::default_config("/site")).unwrap()
    }

    #[test]
    fn test_classify_by_category() {
        let rules = rules();

        assert_eq!(rules.classify(Path::new("/site/app/index.html")), vec![TaskKind::Html]);
        assert_eq!(
            rules.classify(Path::new("/site/app/templates/partials/nav.html")),
            vec![TaskKind::Html]
        );
        assert_eq!(
            rules.classify(Path::new("/site/app/scss/blocks/_header.scss")),
            vec![TaskKind::Css]
        );
        assert_eq!(rules.classify(Path::new("/site/app/js/lib/util.js")), vec![TaskKind::Js]);
        assert_eq!(
            rules.classify(Path::new("/site/app/images/logo.png")),
            vec![TaskKind::Images]
        );
        assert_eq!(
            rules.classify(Path::new("/site/app/fonts/body.woff2")),
            vec![TaskKind::Fonts]
        );
        assert!(rules.classify(Path::new("/site/app/readme.md")).is_empty());
        assert!(rules.classify(Path::new("/site/dist/index.html")).is_empty());
    }

    #[test]
    fn test_batch_runs_each_task_once() {
        let rules = rules();
        let paths = [
            Path::new("/site/app/scss/main.scss"),
            Path::new("/site/app/scss/_vars.scss"),
            Path::new("/site/app/index.html"),
        ];

        assert_eq!(rules.classify_all(paths), vec![TaskKind::Css, TaskKind::Html]);
    }

    /// Poll until `check` yields a value or ten seconds pass
    fn wait_for<T>(what: &str, mut check: impl FnMut() -> Option<T>) -> T {
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(value) = check() {
                return value;
            }
            assert!(std::time::Instant::now() < deadline, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// Drain `rx` until a message satisfies `want`
    fn next_matching(
        rx: &mut tokio::sync::broadcast::Receiver<ReloadMessage>,
        what: &str,
        want: impl Fn(&ReloadMessage) -> bool,
    ) -> ReloadMessage {
        use tokio::sync::broadcast::error::TryRecvError;

        wait_for(what, || loop {
            match rx.try_recv() {
                Ok(message) if want(&message) => return Some(message),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(e) => panic!("reload channel: {}", e),
            }
        })
    }

    #[test]
    fn test_watcher_rebuilds_and_notifies() {
        use crate::tasks::tests::fixture;
        use std::fs;

        let (dir, ctx) = fixture();
        let app = dir.path().join("app");
        let reload = ReloadChannel::new();
        let mut rx = reload.subscribe();
        let (fatal_tx, mut fatal_rx) = tokio::sync::mpsc::unbounded_channel();

        spawn_watcher(ctx, reload.clone(), fatal_tx).unwrap();

        // Stylesheet edit is rebuilt and swapped in place
        fs::write(app.join("scss/main.scss"), ".b { color: blue; }").unwrap();
        let message = next_matching(&mut rx, "css-update", |m| {
            matches!(m, ReloadMessage::CssUpdate { .. })
        });
        assert_eq!(
            message,
            ReloadMessage::CssUpdate {
                path: "css/main.css".to_string()
            }
        );
        let css = fs::read_to_string(dir.path().join("dist/css/main.min.css")).unwrap();
        assert!(css.contains(".b{color:"));

        // Style errors reach the browser and the session keeps running
        fs::write(app.join("scss/broken.scss"), ".c { color: $missing; }").unwrap();
        let message = next_matching(&mut rx, "style error", |m| {
            matches!(m, ReloadMessage::Error { .. })
        });
        let ReloadMessage::Error { file, .. } = message else {
            unreachable!()
        };
        assert_eq!(file.as_deref(), Some("app/scss/broken.scss"));
        assert!(reload.pending_error().is_some());
        assert!(fatal_rx.try_recv().is_err());

        // Script edit triggers a full reload
        fs::write(app.join("js/app.js"), "function greet() { return 1; }").unwrap();
        next_matching(&mut rx, "full-reload", |m| {
            matches!(m, ReloadMessage::FullReload { .. })
        });
        assert!(fs::read_to_string(dir.path().join("dist/js/app.js"))
            .unwrap()
            .contains("return 1"));

        // Any other task failure ends the session
        fs::write(app.join("js/broken.js"), "function (").unwrap();
        let err = wait_for("fatal error", || fatal_rx.try_recv().ok());
        assert!(format!("{:#}", err).contains("broken.js"));
    }

    #[test]
    fn test_reload_message_per_kind() {
        let mut report = TaskReport::new("css");
        report.outputs.push(OutputFile {
            path: PathBuf::from("/site/dist/css/main.css"),
            size: 10,
        });

        assert_eq!(
            reload_message(TaskKind::Css, &report, Path::new("/site/dist")),
            ReloadMessage::CssUpdate {
                path: "css/main.css".to_string()
            }
        );
        assert!(matches!(
            reload_message(TaskKind::Js, &TaskReport::new("js"), Path::new("/site/dist")),
            ReloadMessage::FullReload { .. }
        ));
    }
}

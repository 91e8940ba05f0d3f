//! Watch-and-serve command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::build::execute;
use crate::config::{Config, ServerConfig};
use crate::server::{spawn_watcher, DevServer, ReloadChannel, ReloadMessage};
use crate::tasks::{build_pipeline, TaskContext};
use crate::utils::relative_path;

/// Build, then rebuild on change and serve with live reload
#[derive(Args, Debug, Default)]
pub struct WatchCommand {
    /// Port to run the dev server on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    /// Disable live reload
    #[arg(long)]
    pub no_reload: bool,
}

impl WatchCommand {
    pub async fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = Arc::new(Config::load_or_default(config_path)?);
        info!("Project root: {}", config.root.display());

        let ctx = Arc::new(TaskContext::new(config.clone()));
        let reload = ReloadChannel::new();

        let reports = execute(&ctx, &build_pipeline(), "build").await?;

        // Show a style error from the initial build on first page load
        if let Some(failure) = reports.iter().flat_map(|r| r.failures.iter()).next() {
            reload.send(ReloadMessage::Error {
                message: failure.message.clone(),
                file: relative_path(&config.root, &failure.file),
            });
        }

        let options = ServeOptions::resolve(self, &config.server);

        let (fatal_tx, mut fatal_rx) = tokio::sync::mpsc::unbounded_channel();
        spawn_watcher(ctx.clone(), reload.clone(), fatal_tx)?;

        eprintln!(
            "{} Serving {} at {}\n",
            "→".blue(),
            config.paths.output.cyan(),
            format!("http://{}:{}", options.host, options.port).cyan().underline()
        );

        eprintln!(
            "  {} Watching {}",
            "•".dimmed(),
            config.paths.source.cyan()
        );

        if options.reload {
            eprintln!(
                "  {} Live reload {}",
                "•".dimmed(),
                "enabled".green()
            );
        }

        eprintln!(
            "  {} Press {} to stop\n",
            "•".dimmed(),
            "Ctrl+C".yellow()
        );

        let server = DevServer::new(config, options, reload);

        tokio::select! {
            result = server.start() => result,
            Some(err) = fatal_rx.recv() => Err(err),
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                Ok(())
            }
        }
    }
}

/// Development server options
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub reload: bool,
    pub open: bool,
}

impl ServeOptions {
    /// Command-line flags take precedence over `[server]`
    pub fn resolve(cmd: &WatchCommand, server: &ServerConfig) -> Self {
        Self {
            host: cmd.host.clone().unwrap_or_else(|| server.host.clone()),
            port: cmd.port.unwrap_or(server.port),
            reload: server.reload && !cmd.no_reload,
            open: server.open || cmd.open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let server = ServerConfig::default();

        let options = ServeOptions::resolve(&WatchCommand::default(), &server);
        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 3000);
        assert!(options.reload);
        assert!(!options.open);

        let cmd = WatchCommand {
            port: Some(8080),
            host: Some("0.0.0.0".to_string()),
            open: true,
            no_reload: true,
        };
        let options = ServeOptions::resolve(&cmd, &server);
        assert_eq!(options.host, "0.0.0.0");
        assert_eq!(options.port, 8080);
        assert!(!options.reload);
        assert!(options.open);
    }
}

//! Command-line interface for sitepipe
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - one subcommand per pipeline task (`html`, `css`, `js`, ...)
//! - `build`: clean, then every task in parallel
//! - `watch`: build, then rebuild on change and serve with live reload
//! - `init`: source tree scaffolding

mod build;
mod init;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;

use crate::tasks::{build_pipeline, TaskKind, TaskReport};
use crate::utils::{format_duration, format_size, relative_path};

pub use build::run_step;
pub use init::InitCommand;
pub use watch::{ServeOptions, WatchCommand};

/// sitepipe - static-site asset pipeline with live reload
#[derive(Parser, Debug)]
#[command(name = "sitepipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Defaults to `watch` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (default: ./sitepipe.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose HTML pages from layouts and partials
    Html,

    /// Compile, prefix and minify stylesheets
    Css,

    /// Copy and minify scripts
    Js,

    /// Optimize images and copy other image assets
    Images,

    /// Convert raster images to WebP
    Webp,

    /// Convert raster images to AVIF
    Avif,

    /// Copy fonts
    Fonts,

    /// Remove the output directory
    Clean,

    /// Clean, then run every task in parallel
    Build,

    /// Build, then rebuild on change and serve with live reload
    Watch(WatchCommand),

    /// Scaffold a new source tree
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        let config = self.config.as_deref();
        let single = |kind: TaskKind| run_step(config, kind.into(), kind.to_string());

        match &self.command {
            Some(Commands::Html) => single(TaskKind::Html).await,
            Some(Commands::Css) => single(TaskKind::Css).await,
            Some(Commands::Js) => single(TaskKind::Js).await,
            Some(Commands::Images) => single(TaskKind::Images).await,
            Some(Commands::Webp) => single(TaskKind::Webp).await,
            Some(Commands::Avif) => single(TaskKind::Avif).await,
            Some(Commands::Fonts) => single(TaskKind::Fonts).await,
            Some(Commands::Clean) => single(TaskKind::Clean).await,
            Some(Commands::Build) => run_step(config, build_pipeline(), "build".to_string()).await,
            Some(Commands::Watch(cmd)) => cmd.execute(config).await,
            Some(Commands::Init(cmd)) => cmd.execute().await,
            None => WatchCommand::default().execute(config).await,
        }
    }
}

/// Print the sitepipe banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "sitepipe".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// Print the files a task wrote
pub fn print_report(report: &TaskReport, root: &Path) {
    let status = if report.has_failures() {
        "!".yellow().bold()
    } else {
        "✓".green().bold()
    };

    eprintln!(
        "  {} {} {} {}",
        status,
        report.task.bold(),
        format!("{} file(s)", report.outputs.len()).dimmed(),
        format_duration(report.duration).dimmed()
    );

    for output in &report.outputs {
        eprintln!(
            "      {} {} {}",
            "•".dimmed(),
            relative_path(root, &output.path)
                .unwrap_or_else(|| output.path.display().to_string())
                .cyan(),
            format_size(output.size).dimmed()
        );
    }
}

/// Surface recovered failures as a console notification
pub fn print_failures(report: &TaskReport) {
    eprintln!(
        "\n  {} {}",
        "✗".red().bold(),
        format!("{} error", report.task).red().bold()
    );

    for failure in &report.failures {
        error!("{}: {}", failure.file.display(), failure.message);
        eprintln!(
            "    {}\n    {}\n",
            failure.file.display().to_string().yellow(),
            failure.message
        );
    }
}

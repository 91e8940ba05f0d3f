//! One-shot task execution

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use super::{print_failures, print_report};
use crate::config::Config;
use crate::tasks::{self, Step, TaskContext, TaskReport};
use crate::utils::format_duration;

/// Load the configuration and run `step` once
pub async fn run_step(config_path: Option<&Path>, step: Step, label: String) -> Result<()> {
    let config = Arc::new(Config::load_or_default(config_path)?);
    info!("Project root: {}", config.root.display());

    let ctx = Arc::new(TaskContext::new(config));
    execute(&ctx, &step, &label).await?;

    Ok(())
}

/// Run `step` with progress output and return every task report
pub(crate) async fn execute(
    ctx: &Arc<TaskContext>,
    step: &Step,
    label: &str,
) -> Result<Vec<TaskReport>> {
    let start = Instant::now();

    eprintln!("{} Running {}...\n", "→".blue(), label.cyan());

    let reports = tasks::run(step, ctx).await?;

    for report in &reports {
        print_report(report, &ctx.config.root);
    }

    for report in reports.iter().filter(|r| r.has_failures()) {
        print_failures(report);
    }

    let written: usize = reports.iter().map(|r| r.outputs.len()).sum();

    eprintln!(
        "\n{} Finished {} ({} file(s)) in {}\n",
        "✓".green().bold(),
        label,
        written,
        format_duration(start.elapsed())
    );

    Ok(reports)
}

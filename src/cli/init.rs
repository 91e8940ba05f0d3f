//! Source tree scaffolding

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::{Config, CONFIG_FILE};

/// Scaffold a new source tree
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Project directory
    #[arg(default_value = ".")]
    pub name: String,

    /// Site title used in the starter layout
    #[arg(short, long, default_value = "My Site")]
    pub title: String,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let project_dir = Path::new(&self.name);

        eprintln!("{} Initializing new site...\n", "→".blue());

        if self.name != "." {
            fs::create_dir_all(project_dir)
                .context("Failed to create project directory")?;
        }

        let config = Config::default_config(project_dir);
        let config_text = format!(
            "# sitepipe configuration\n# Every key is optional; these are the defaults.\n\n{}",
            toml::to_string_pretty(&config).context("Failed to render default config")?
        );

        let source = config.paths.source.clone();
        let files = [
            (CONFIG_FILE.to_string(), config_text),
            (format!("{}/index.html", source), self.generate_index()?),
            (
                format!("{}/{}/default.html", source, config.html.layouts),
                LAYOUT.to_string(),
            ),
            (
                format!("{}/{}/header.html", source, config.html.partials),
                HEADER_PARTIAL.to_string(),
            ),
            (
                format!("{}/{}/_variables.scss", source, config.styles.dir),
                VARIABLES_SCSS.to_string(),
            ),
            (
                format!("{}/{}/main.scss", source, config.styles.dir),
                MAIN_SCSS.to_string(),
            ),
            (
                format!("{}/{}/app.js", source, config.scripts.dir),
                APP_JS.to_string(),
            ),
        ];

        for (relative, contents) in &files {
            write_if_absent(project_dir, relative, contents)?;
        }

        for dir in [&config.images.dir, &config.fonts.dir] {
            fs::create_dir_all(project_dir.join(&source).join(dir))
                .with_context(|| format!("Failed to create {}/{}", source, dir))?;
        }

        eprintln!(
            "\n{} Site initialized successfully!\n",
            "✓".green().bold()
        );

        eprintln!("  Next steps:");
        if self.name != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.name.cyan());
        }
        eprintln!("    {} sitepipe", "→".dimmed());
        eprintln!();

        Ok(())
    }

    fn generate_index(&self) -> Result<String> {
        let mut front_matter = serde_json::Map::new();
        front_matter.insert("title".to_string(), self.title.clone().into());
        let front_matter = serde_yaml_ng::to_string(&front_matter)
            .context("Failed to render front matter")?;

        Ok(format!(
            r#"---
{front_matter}---
<section class="hero">
  <h1>{{{{title}}}}</h1>
  <p>Edit <code>app/index.html</code> and save to reload.</p>
</section>
"#
        ))
    }
}

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{{title}}</title>
    <link rel="stylesheet" href="{{root}}css/main.min.css" />
  </head>
  <body class="page-{{page}}">
    {{> header}}
    <main>
      {{> body}}
    </main>
    <script src="{{root}}js/app.min.js"></script>
  </body>
</html>
"#;

const HEADER_PARTIAL: &str = r#"<header class="site-header">
  <a href="{{root}}index.html">{{title}}</a>
</header>
"#;

const VARIABLES_SCSS: &str = r#"$font-stack: system-ui, -apple-system, "Segoe UI", Roboto, sans-serif;
$accent: #646cff;
$gap: 1.5rem;
"#;

const MAIN_SCSS: &str = r#"@import "variables";

body {
  margin: 0;
  font-family: $font-stack;
  line-height: 1.5;
}

.site-header {
  display: flex;
  padding: $gap;
  user-select: none;

  a {
    color: $accent;
    text-decoration: none;
  }
}

.hero {
  padding: $gap * 2 $gap;
  text-align: center;
}
"#;

const APP_JS: &str = r#"// Marks the document once scripts are running
document.addEventListener("DOMContentLoaded", function () {
  document.documentElement.classList.add("js");
});
"#;

fn write_if_absent(project_dir: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = project_dir.join(relative);

    if path.exists() {
        eprintln!("  {} Skipped {} (exists)", "•".dimmed(), relative.yellow());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(&path, contents).with_context(|| format!("Failed to write {}", relative))?;
    eprintln!("  {} Created {}", "✓".green(), relative.cyan());

    Ok(())
}

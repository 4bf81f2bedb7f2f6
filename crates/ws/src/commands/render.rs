//! `ws render` command implementation.

use std::path::PathBuf;

use clap::Args;
use minijinja::context;
use ws_config::Config;
use ws_markdown::MarkdownLoader;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Page name: a path (`content/about`) or `app.page`.
    name: String,

    /// Path to configuration file (default: auto-discover ws.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language code (default: the configured default language).
    #[arg(short, long)]
    lang: Option<String>,

    /// Emit a placeholder comment instead of failing on a missing page.
    #[arg(long)]
    silent: bool,

    /// Print the table of contents instead of the HTML.
    #[arg(long)]
    toc: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let loader = MarkdownLoader::from_config(&config);
        let lang = self
            .lang
            .unwrap_or_else(|| config.i18n.default_language.clone());

        let ctx = context! { lang => &lang, global_seo => &config.seo };
        let result = loader.render(&self.name, Some(&lang), &ctx, self.silent)?;

        if let Some(title) = &result.title {
            output.highlight(title);
        }
        if self.toc {
            let lines: Vec<String> = result
                .toc
                .iter()
                .map(|entry| {
                    let indent = "  ".repeat(usize::from(entry.level.saturating_sub(2)));
                    format!("{indent}- {} (#{})", entry.title, entry.id)
                })
                .collect();
            output.emit(&lines.join("\n"))?;
        } else {
            output.emit(&result.html)?;
        }
        Ok(())
    }
}

//! `ws serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use ws_config::{CliSettings, Config};
use ws_server::run_server;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover ws.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Site database file (overrides config).
    #[arg(long, env = "WS_DATABASE")]
    database: Option<PathBuf>,

    /// Render manifest errors as HTML comments.
    #[arg(long)]
    debug: bool,

    /// Enable verbose output (request and render logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            debug: self.debug.then_some(true),
            database: self.database,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Database: {}",
            config.database_resolved.path.display()
        ));
        output.info(&format!(
            "Static files: {} -> {}",
            config.static_resolved.url,
            config.static_resolved.root.display()
        ));
        if config.debug {
            output.warning("Debug mode: manifest errors are rendered into pages");
        }

        run_server(&config).await?;
        Ok(())
    }
}

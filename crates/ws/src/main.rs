//! Webstore CLI.
//!
//! Provides commands for:
//! - `serve`: Start the storefront server
//! - `render`: Render a markdown page to HTML
//! - `site`: Manage sites, their settings and social links

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, ServeArgs, SiteCommand};
use error::CliError;
use output::Output;

/// Webstore storefront.
#[derive(Parser)]
#[command(name = "ws", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the storefront server.
    Serve(ServeArgs),
    /// Render a markdown page to sanitized HTML.
    Render(RenderArgs),
    /// Site management commands.
    #[command(subcommand)]
    Site(SiteCommand),
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Render(args) => args.execute(),
        Commands::Serve(args) => tokio::runtime::Runtime::new()?.block_on(args.execute()),
        Commands::Site(cmd) => tokio::runtime::Runtime::new()?.block_on(cmd.execute()),
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.command) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

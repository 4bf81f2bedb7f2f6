//! `ws site` commands.
//!
//! Stand in for the admin screens: create sites, edit their settings,
//! toggle maintenance mode and link social profiles.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use ws_config::{CliSettings, Config};
use ws_site::{Database, Platform, SettingsInput, SiteRepository};

use crate::error::CliError;
use crate::output::Output;

/// Options shared by every site command.
#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Path to configuration file (default: auto-discover ws.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site database file (overrides config).
    #[arg(long, env = "WS_DATABASE")]
    database: Option<PathBuf>,
}

impl StoreArgs {
    fn load(&self) -> Result<Config, CliError> {
        let settings = CliSettings {
            database: self.database.clone(),
            ..CliSettings::default()
        };
        Ok(Config::load(self.config.as_deref(), Some(&settings))?)
    }
}

#[derive(Subcommand)]
pub(crate) enum SiteCommand {
    /// Create the database and a default site when none exists.
    Init(InitArgs),
    /// List sites with their settings.
    List(ListArgs),
    /// Create or update a site and its settings.
    Upsert(UpsertArgs),
    /// Turn maintenance mode on or off.
    Maintenance(MaintenanceArgs),
    /// Link a social media profile to a site.
    SocialAdd(SocialAddArgs),
}

#[derive(Args)]
pub(crate) struct InitArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Domain of the default site.
    #[arg(long, default_value = "localhost")]
    domain: String,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args)]
pub(crate) struct UpsertArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Site domain, matched against the request `Host`.
    domain: String,

    /// Site name (at most 60 characters, unique).
    #[arg(long)]
    name: String,

    #[arg(long)]
    short_name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated keywords.
    #[arg(long, value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    #[arg(long)]
    publisher: Option<String>,

    #[arg(long)]
    owner: Option<String>,

    #[arg(long)]
    copyright: Option<String>,

    /// `#rrggbb`.
    #[arg(long)]
    theme_color: Option<String>,

    /// `#rrggbb`.
    #[arg(long)]
    background_color: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Switch {
    On,
    Off,
}

#[derive(Args)]
pub(crate) struct MaintenanceArgs {
    #[command(flatten)]
    store: StoreArgs,

    domain: String,

    #[arg(value_enum)]
    state: Switch,
}

#[derive(Args)]
pub(crate) struct SocialAddArgs {
    #[command(flatten)]
    store: StoreArgs,

    domain: String,

    /// facebook, twitter, instagram, linkedin or youtube.
    platform: String,

    profile_name: String,
}

async fn open(store: &StoreArgs) -> Result<(Config, Database, SiteRepository), CliError> {
    let config = store.load()?;
    let db = Database::connect(&config.database_resolved.path).await?;
    let repo = SiteRepository::new(&db);
    Ok((config, db, repo))
}

impl SiteCommand {
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Init(args) => args.execute().await,
            Self::List(args) => args.execute().await,
            Self::Upsert(args) => args.execute().await,
            Self::Maintenance(args) => args.execute().await,
            Self::SocialAdd(args) => args.execute().await,
        }
    }
}

impl InitArgs {
    async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, db, repo) = open(&self.store).await?;
        output.info(&format!(
            "Database: {}",
            config.database_resolved.path.display()
        ));

        if repo.sites().await?.is_empty() {
            let name = config.seo.name.clone();
            repo.upsert_site(&self.domain, &name).await?;
            repo.upsert_settings(&self.domain, &SettingsInput::from_defaults(&name, &config.seo))
                .await?;
            output.success(&format!("Created site {} ({name})", self.domain));
        } else {
            output.info("Sites already configured");
        }
        db.close().await;
        Ok(())
    }
}

impl ListArgs {
    async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, db, repo) = open(&self.store).await?;

        let sites = repo.sites().await?;
        if sites.is_empty() {
            output.warning("No sites configured (run `ws site init`)");
        }
        let mut lines = Vec::with_capacity(sites.len());
        for site in sites {
            let line = match repo.settings_for_domain(&site.domain).await? {
                Some(settings) => {
                    let social: Vec<String> = repo
                        .social_for(&site.domain)
                        .await?
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    format!(
                        "{}\t{}\tmaintenance={}\tkeywords={}\t{}",
                        site.domain,
                        settings,
                        if settings.maintenance() { "on" } else { "off" },
                        settings.keywords_txt(),
                        social.join(", ")
                    )
                }
                None => format!("{}\t{}\t(no settings)", site.domain, site.name),
            };
            lines.push(line);
        }
        if !lines.is_empty() {
            output.emit(&lines.join("\n"))?;
        }
        db.close().await;
        Ok(())
    }
}

impl UpsertArgs {
    /// Values for the upsert: given flags over stored settings over defaults.
    fn input(self, existing: Option<SettingsInput>, config: &Config) -> SettingsInput {
        let base = existing.unwrap_or_else(|| SettingsInput::from_defaults(&self.name, &config.seo));
        SettingsInput {
            short_name: self.short_name.unwrap_or(base.short_name),
            description: self.description.unwrap_or(base.description),
            keywords: self.keywords.unwrap_or(base.keywords),
            publisher: self.publisher.unwrap_or(base.publisher),
            owner: self.owner.unwrap_or(base.owner),
            copyright: self.copyright.unwrap_or(base.copyright),
            theme_color: self.theme_color.unwrap_or(base.theme_color),
            background_color: self.background_color.unwrap_or(base.background_color),
            maintenance_mode: base.maintenance_mode,
            name: self.name,
        }
    }

    async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, db, repo) = open(&self.store).await?;

        let site = repo.upsert_site(&self.domain, &self.name).await?;
        let existing = repo
            .settings_for_domain(&site.domain)
            .await?
            .map(|s| SettingsInput {
                keywords: s.keywords.iter().map(|k| k.value.clone()).collect(),
                name: s.name,
                short_name: s.short_name,
                description: s.description,
                publisher: s.publisher,
                owner: s.owner,
                copyright: s.copyright,
                theme_color: s.theme_color,
                background_color: s.background_color,
                maintenance_mode: s.maintenance_mode,
            });
        let input = self.input(existing, &config);
        let settings = repo.upsert_settings(&site.domain, &input).await?;

        output.success(&format!("Saved {} ({settings})", site.domain));
        db.close().await;
        Ok(())
    }
}

impl MaintenanceArgs {
    async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, db, repo) = open(&self.store).await?;
        let enabled = matches!(self.state, Switch::On);
        repo.set_maintenance(&self.domain, enabled).await?;
        output.success(&format!(
            "Maintenance mode {} for {}",
            if enabled { "on" } else { "off" },
            self.domain
        ));
        db.close().await;
        Ok(())
    }
}

impl SocialAddArgs {
    async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let platform: Platform = self.platform.parse()?;
        let (_, db, repo) = open(&self.store).await?;
        let link = repo
            .add_social(&self.domain, platform, &self.profile_name)
            .await?;
        output.success(&format!("Linked {link} to {}", self.domain));
        db.close().await;
        Ok(())
    }
}

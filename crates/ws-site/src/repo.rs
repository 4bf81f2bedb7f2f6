//! Queries over the site tables.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::Database;
use crate::error::SiteError;
use crate::models::{
    PageSeo, Platform, SettingsInput, SettingsRow, Site, SiteSettings, SocialMedia, SocialRow,
};

const SETTINGS_COLUMNS: &str = "s.id, s.site_id, s.name, s.short_name, s.description, s.keywords, \
     s.publisher, s.owner, s.copyright, s.theme_color, s.background_color, s.maintenance_mode, \
     s.created, s.modified";

/// Read and write access to sites, their settings and social links.
#[derive(Debug, Clone)]
pub struct SiteRepository {
    pool: SqlitePool,
}

impl SiteRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn sites(&self) -> Result<Vec<Site>, SiteError> {
        let sites = sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites ORDER BY domain")
            .fetch_all(&self.pool)
            .await?;
        Ok(sites)
    }

    /// Every configured site domain.
    pub async fn domains(&self) -> Result<Vec<String>, SiteError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT domain FROM sites ORDER BY domain")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(domain,)| domain).collect())
    }

    pub async fn site_by_domain(&self, domain: &str) -> Result<Option<Site>, SiteError> {
        let site = sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites WHERE domain = ?")
            .bind(normalize_domain(domain))
            .fetch_optional(&self.pool)
            .await?;
        Ok(site)
    }

    /// Create the site or rename it when the domain exists.
    pub async fn upsert_site(&self, domain: &str, name: &str) -> Result<Site, SiteError> {
        let domain = normalize_domain(domain);
        if domain.is_empty() {
            return Err(SiteError::Validation {
                field: "domain",
                message: "must not be empty".to_owned(),
            });
        }
        let site = sqlx::query_as::<_, Site>(
            "INSERT INTO sites (domain, name) VALUES (?, ?) \
             ON CONFLICT (domain) DO UPDATE SET name = excluded.name \
             RETURNING id, domain, name",
        )
        .bind(&domain)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(domain = %site.domain, id = site.id, "Site saved");
        Ok(site)
    }

    pub async fn settings_for_domain(&self, domain: &str) -> Result<Option<SiteSettings>, SiteError> {
        let sql = format!(
            "SELECT {SETTINGS_COLUMNS} FROM site_settings s \
             JOIN sites ON sites.id = s.site_id WHERE sites.domain = ?"
        );
        let row = sqlx::query_as::<_, SettingsRow>(&sql)
            .bind(normalize_domain(domain))
            .fetch_optional(&self.pool)
            .await?;
        row.map(SiteSettings::try_from).transpose()
    }

    /// Validate and store the settings of the site at `domain`.
    pub async fn upsert_settings(
        &self,
        domain: &str,
        input: &SettingsInput,
    ) -> Result<SiteSettings, SiteError> {
        input.validate()?;
        let site = self
            .site_by_domain(domain)
            .await?
            .ok_or_else(|| SiteError::UnknownSite(domain.to_owned()))?;
        let keywords = input.keywords_json()?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO site_settings (site_id, name, short_name, description, keywords, \
             publisher, owner, copyright, theme_color, background_color, maintenance_mode, \
             created, modified) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (site_id) DO UPDATE SET name = excluded.name, \
             short_name = excluded.short_name, description = excluded.description, \
             keywords = excluded.keywords, publisher = excluded.publisher, \
             owner = excluded.owner, copyright = excluded.copyright, \
             theme_color = excluded.theme_color, background_color = excluded.background_color, \
             maintenance_mode = excluded.maintenance_mode, modified = excluded.modified",
        )
        .bind(site.id)
        .bind(&input.name)
        .bind(&input.short_name)
        .bind(&input.description)
        .bind(&keywords)
        .bind(&input.publisher)
        .bind(&input.owner)
        .bind(&input.copyright)
        .bind(&input.theme_color)
        .bind(&input.background_color)
        .bind(input.maintenance_mode)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(domain = %site.domain, name = %input.name, "Site settings saved");
        self.settings_for_domain(&site.domain)
            .await?
            .ok_or(SiteError::MissingSettings(site.domain))
    }

    /// Toggle maintenance mode for the site at `domain`.
    pub async fn set_maintenance(&self, domain: &str, enabled: bool) -> Result<(), SiteError> {
        let result = sqlx::query(
            "UPDATE site_settings SET maintenance_mode = ?, modified = ? \
             WHERE site_id = (SELECT id FROM sites WHERE domain = ?)",
        )
        .bind(enabled)
        .bind(Utc::now())
        .bind(normalize_domain(domain))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(SiteError::MissingSettings(domain.to_owned()));
        }
        tracing::info!(domain, enabled, "Maintenance mode changed");
        Ok(())
    }

    /// Link a social profile; the icon is derived from the platform.
    pub async fn add_social(
        &self,
        domain: &str,
        platform: Platform,
        profile_name: &str,
    ) -> Result<SocialMedia, SiteError> {
        let profile_name = profile_name.trim();
        if profile_name.is_empty() || profile_name.chars().count() > 100 {
            return Err(SiteError::Validation {
                field: "profile_name",
                message: "must be 1 to 100 characters".to_owned(),
            });
        }
        let settings = self
            .settings_for_domain(domain)
            .await?
            .ok_or_else(|| SiteError::MissingSettings(domain.to_owned()))?;

        let row = sqlx::query_as::<_, SocialRow>(
            "INSERT INTO social_media (site_settings_id, platform, profile_name, icon) \
             VALUES (?, ?, ?, ?) \
             RETURNING id, site_settings_id, platform, profile_name, icon",
        )
        .bind(settings.id)
        .bind(platform.as_str())
        .bind(profile_name)
        .bind(platform.icon())
        .fetch_one(&self.pool)
        .await?;
        SocialMedia::try_from(row)
    }

    pub async fn social_for(&self, domain: &str) -> Result<Vec<SocialMedia>, SiteError> {
        let rows = sqlx::query_as::<_, SocialRow>(
            "SELECT m.id, m.site_settings_id, m.platform, m.profile_name, m.icon \
             FROM social_media m \
             JOIN site_settings s ON s.id = m.site_settings_id \
             JOIN sites ON sites.id = s.site_id \
             WHERE sites.domain = ? ORDER BY m.id",
        )
        .bind(normalize_domain(domain))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SocialMedia::try_from).collect()
    }

    pub async fn page_seo(&self, page: &str) -> Result<Option<PageSeo>, SiteError> {
        let seo = sqlx::query_as::<_, PageSeo>(
            "SELECT page, meta_title, meta_description, meta_image FROM page_seo WHERE page = ?",
        )
        .bind(page)
        .fetch_optional(&self.pool)
        .await?;
        Ok(seo)
    }

    pub async fn upsert_page_seo(&self, seo: &PageSeo) -> Result<(), SiteError> {
        seo.validate()?;
        sqlx::query(
            "INSERT INTO page_seo (page, meta_title, meta_description, meta_image) \
             VALUES (?, ?, ?, ?) ON CONFLICT (page) DO UPDATE SET \
             meta_title = excluded.meta_title, meta_description = excluded.meta_description, \
             meta_image = excluded.meta_image",
        )
        .bind(&seo.page)
        .bind(&seo.meta_title)
        .bind(&seo.meta_description)
        .bind(&seo.meta_image)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().to_ascii_lowercase()
}

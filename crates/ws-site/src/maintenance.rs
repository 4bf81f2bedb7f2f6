//! Maintenance mode gate.

use regex::Regex;
use ws_config::MaintenanceConfig;

use crate::error::SiteError;
use crate::repo::SiteRepository;

/// Whether maintenance mode applies to requests for `host`.
///
/// Fails closed: a missing host, an unknown site, a site without settings
/// and store errors all report maintenance as active.
pub async fn is_maintenance_active(repo: &SiteRepository, host: Option<&str>) -> bool {
    let Some(host) = host else {
        tracing::debug!("No request host, maintenance active");
        return true;
    };

    match repo.settings_for_domain(host).await {
        Ok(Some(settings)) => settings.maintenance(),
        Ok(None) => {
            tracing::debug!(host, "No site settings for host, maintenance active");
            true
        }
        Err(e) => {
            tracing::warn!(host, error = %e, "Maintenance lookup failed, maintenance active");
            true
        }
    }
}

/// Request paths served even while maintenance is active.
#[derive(Debug, Clone)]
pub struct MaintenancePolicy {
    ignore: Vec<Regex>,
    static_prefix: Option<String>,
    pub retry_after: u64,
    pub status_code: u16,
    pub redirect_url: Option<String>,
    pub template: String,
}

impl MaintenancePolicy {
    /// Compile the ignore patterns; `static_url` is bypassed when it is a local path.
    pub fn from_config(config: &MaintenanceConfig, static_url: &str) -> Result<Self, SiteError> {
        let ignore = config
            .ignore_urls
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| SiteError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ignore,
            static_prefix: static_url.starts_with('/').then(|| static_url.to_owned()),
            retry_after: config.retry_after,
            status_code: config.status_code,
            redirect_url: config.redirect_url.clone(),
            template: config.template.clone(),
        })
    }

    /// Whether `path` skips the maintenance gate.
    pub fn bypasses(&self, path: &str) -> bool {
        if let Some(prefix) = &self.static_prefix
            && path.starts_with(prefix.as_str())
        {
            return true;
        }
        if let Some(redirect) = &self.redirect_url
            && redirect == path
        {
            return true;
        }
        self.ignore.iter().any(|re| re.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::SettingsInput;

    async fn repo() -> SiteRepository {
        let db = Database::connect_in_memory().await.unwrap();
        SiteRepository::new(&db)
    }

    #[tokio::test]
    async fn test_fail_closed() {
        let repo = repo().await;
        assert!(is_maintenance_active(&repo, None).await);
        assert!(is_maintenance_active(&repo, Some("shop.ro")).await);

        repo.upsert_site("shop.ro", "Shop").await.unwrap();
        assert!(is_maintenance_active(&repo, Some("shop.ro")).await);
    }

    #[tokio::test]
    async fn test_follows_settings_flag() {
        let repo = repo().await;
        repo.upsert_site("shop.ro", "Shop").await.unwrap();
        let input = SettingsInput {
            name: "Magazin".to_owned(),
            ..SettingsInput::default()
        };
        repo.upsert_settings("shop.ro", &input).await.unwrap();
        assert!(!is_maintenance_active(&repo, Some("shop.ro")).await);

        repo.set_maintenance("shop.ro", true).await.unwrap();
        assert!(is_maintenance_active(&repo, Some("shop.ro")).await);
    }

    #[tokio::test]
    async fn test_store_error_is_active() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = SiteRepository::new(&db);
        db.close().await;
        assert!(is_maintenance_active(&repo, Some("shop.ro")).await);
    }

    #[test]
    fn test_default_bypasses() {
        let policy = MaintenancePolicy::from_config(&MaintenanceConfig::default(), "/static/").unwrap();
        assert!(policy.bypasses("/robots.txt"));
        assert!(policy.bypasses("/favicon.ico"));
        assert!(policy.bypasses("/webstore/admin/"));
        assert!(policy.bypasses("/ro/system.js"));
        assert!(policy.bypasses("/static/css/main.css"));
        assert!(!policy.bypasses("/ro/pages/about"));
        assert!(!policy.bypasses("/robots.txt.bak"));
    }

    #[test]
    fn test_redirect_target_bypasses() {
        let config = MaintenanceConfig {
            redirect_url: Some("/maintenance/".to_owned()),
            ..MaintenanceConfig::default()
        };
        let policy = MaintenancePolicy::from_config(&config, "https://cdn.shop.ro/").unwrap();
        assert!(policy.bypasses("/maintenance/"));
        assert!(!policy.bypasses("/static/x.css"));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = MaintenanceConfig {
            ignore_urls: vec!["^/(unclosed".to_owned()],
            ..MaintenanceConfig::default()
        };
        let err = MaintenancePolicy::from_config(&config, "/static/").unwrap_err();
        assert!(err.to_string().starts_with("Invalid maintenance ignore pattern '^/(unclosed'"));
    }
}

//! Site, settings and social media records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ws_config::{SeoDefaults, is_hex_color};

use crate::error::SiteError;

/// One storefront, matched by request `Host`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Site {
    pub id: i64,
    pub domain: String,
    pub name: String,
}

/// Keyword tag, stored as `{"value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub value: String,
}

/// Per-site identity, SEO values and maintenance flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub id: i64,
    pub site_id: i64,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub keywords: Vec<Keyword>,
    pub publisher: String,
    pub owner: String,
    pub copyright: String,
    pub theme_color: String,
    pub background_color: String,
    pub maintenance_mode: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl SiteSettings {
    /// Keyword values joined by `,`.
    pub fn keywords_txt(&self) -> String {
        self.keywords
            .iter()
            .map(|k| k.value.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn maintenance(&self) -> bool {
        self.maintenance_mode
    }
}

impl fmt::Display for SiteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SettingsRow {
    id: i64,
    site_id: i64,
    name: String,
    short_name: String,
    description: String,
    keywords: String,
    publisher: String,
    owner: String,
    copyright: String,
    theme_color: String,
    background_color: String,
    maintenance_mode: bool,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for SiteSettings {
    type Error = SiteError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        let keywords =
            serde_json::from_str(&row.keywords).map_err(|e| SiteError::InvalidData {
                field: "keywords",
                message: e.to_string(),
            })?;
        Ok(Self {
            id: row.id,
            site_id: row.site_id,
            name: row.name,
            short_name: row.short_name,
            description: row.description,
            keywords,
            publisher: row.publisher,
            owner: row.owner,
            copyright: row.copyright,
            theme_color: row.theme_color,
            background_color: row.background_color,
            maintenance_mode: row.maintenance_mode,
            created: row.created,
            modified: row.modified,
        })
    }
}

/// Values written by a settings upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsInput {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub publisher: String,
    pub owner: String,
    pub copyright: String,
    pub theme_color: String,
    pub background_color: String,
    pub maintenance_mode: bool,
}

pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), SiteError> {
    let len = value.chars().count();
    if len > max {
        return Err(SiteError::Validation {
            field,
            message: format!("{len} characters, at most {max} allowed"),
        });
    }
    Ok(())
}

fn check_color(field: &'static str, value: &str) -> Result<(), SiteError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        Err(SiteError::Validation {
            field,
            message: format!("'{value}' is not a #rrggbb color"),
        })
    }
}

impl SettingsInput {
    /// New-record values prefilled from the configured SEO defaults.
    pub fn from_defaults(name: &str, defaults: &SeoDefaults) -> Self {
        Self {
            name: name.to_owned(),
            short_name: name.to_owned(),
            description: defaults.description.clone(),
            keywords: defaults.keywords.clone(),
            publisher: defaults.publisher.clone(),
            owner: defaults.owner.clone(),
            copyright: defaults.copyright.clone(),
            theme_color: defaults.theme_color.clone(),
            background_color: String::new(),
            maintenance_mode: false,
        }
    }

    pub fn validate(&self) -> Result<(), SiteError> {
        if self.name.trim().is_empty() {
            return Err(SiteError::Validation {
                field: "name",
                message: "must not be empty".to_owned(),
            });
        }
        check_len("name", &self.name, 60)?;
        check_len("short_name", &self.short_name, 60)?;
        check_len("description", &self.description, 160)?;
        check_len("publisher", &self.publisher, 60)?;
        check_len("owner", &self.owner, 60)?;
        check_len("copyright", &self.copyright, 70)?;
        check_color("theme_color", &self.theme_color)?;
        check_color("background_color", &self.background_color)?;
        Ok(())
    }

    /// Keywords as the stored JSON array of `{"value": ...}` objects.
    pub(crate) fn keywords_json(&self) -> Result<String, SiteError> {
        let tags: Vec<Keyword> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|value| Keyword {
                value: value.to_owned(),
            })
            .collect();
        serde_json::to_string(&tags).map_err(|e| SiteError::InvalidData {
            field: "keywords",
            message: e.to_string(),
        })
    }
}

/// Supported social networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Twitter,
    Instagram,
    LinkedIn,
    YouTube,
}

impl Platform {
    pub const ALL: [Self; 5] = [
        Self::Facebook,
        Self::Twitter,
        Self::Instagram,
        Self::LinkedIn,
        Self::YouTube,
    ];

    /// Stored value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::LinkedIn => "linkedin",
            Self::YouTube => "youtube",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Twitter => "Twitter",
            Self::Instagram => "Instagram",
            Self::LinkedIn => "LinkedIn",
            Self::YouTube => "YouTube",
        }
    }

    /// Font Awesome icon class.
    pub fn icon(self) -> String {
        format!("fa-brands fa-{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SiteError::Validation {
                field: "platform",
                message: format!(
                    "'{s}' is not one of {}",
                    Self::ALL.map(Self::as_str).join(", ")
                ),
            })
    }
}

/// Social profile linked from a site's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialMedia {
    pub id: i64,
    pub site_settings_id: i64,
    pub platform: Platform,
    pub profile_name: String,
    pub icon: String,
}

impl fmt::Display for SocialMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.platform.display_name(), self.profile_name)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SocialRow {
    id: i64,
    site_settings_id: i64,
    platform: String,
    profile_name: String,
    icon: String,
}

impl TryFrom<SocialRow> for SocialMedia {
    type Error = SiteError;

    fn try_from(row: SocialRow) -> Result<Self, Self::Error> {
        let platform = row
            .platform
            .parse()
            .map_err(|_| SiteError::InvalidData {
                field: "platform",
                message: row.platform.clone(),
            })?;
        Ok(Self {
            id: row.id,
            site_settings_id: row.site_settings_id,
            platform,
            profile_name: row.profile_name,
            icon: row.icon,
        })
    }
}

/// SEO values attached to one content page.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct PageSeo {
    pub page: String,
    pub meta_title: String,
    pub meta_description: String,
    pub meta_image: Option<String>,
}

impl PageSeo {
    pub fn validate(&self) -> Result<(), SiteError> {
        check_len("meta_title", &self.meta_title, 255)?;
        check_len("meta_description", &self.meta_description, 300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(keywords: &[&str]) -> SiteSettings {
        let now = Utc::now();
        SiteSettings {
            id: 1,
            site_id: 1,
            name: "Magazin".to_owned(),
            short_name: "Mag".to_owned(),
            description: String::new(),
            keywords: keywords
                .iter()
                .map(|v| Keyword {
                    value: (*v).to_owned(),
                })
                .collect(),
            publisher: String::new(),
            owner: String::new(),
            copyright: String::new(),
            theme_color: String::new(),
            background_color: String::new(),
            maintenance_mode: true,
            created: now,
            modified: now,
        }
    }

    #[test]
    fn test_keywords_txt() {
        assert_eq!(settings(&["pantofi", "genți"]).keywords_txt(), "pantofi,genți");
        assert_eq!(settings(&[]).keywords_txt(), "");
        assert!(settings(&[]).maintenance());
    }

    #[test]
    fn test_validate_lengths() {
        let mut input = SettingsInput {
            name: "Magazin".to_owned(),
            ..SettingsInput::default()
        };
        assert!(input.validate().is_ok());

        input.copyright = "c".repeat(71);
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid copyright: 71 characters, at most 70 allowed");

        input.copyright = "ă".repeat(70);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_colors() {
        let mut input = SettingsInput {
            name: "Magazin".to_owned(),
            theme_color: "#34521".to_owned(),
            ..SettingsInput::default()
        };
        assert!(matches!(
            input.validate(),
            Err(SiteError::Validation { field: "theme_color", .. })
        ));
        input.theme_color = "#345212".to_owned();
        input.background_color = "white".to_owned();
        assert!(matches!(
            input.validate(),
            Err(SiteError::Validation { field: "background_color", .. })
        ));
    }

    #[test]
    fn test_keywords_json() {
        let input = SettingsInput {
            keywords: vec!["a".to_owned(), "  ".to_owned(), " b ".to_owned()],
            ..SettingsInput::default()
        };
        assert_eq!(
            input.keywords_json().unwrap(),
            r#"[{"value":"a"},{"value":"b"}]"#
        );
    }

    #[test]
    fn test_platform() {
        let platform: Platform = "LinkedIn".parse().unwrap();
        assert_eq!(platform, Platform::LinkedIn);
        assert_eq!(platform.icon(), "fa-brands fa-linkedin");
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_social_display() {
        let social = SocialMedia {
            id: 1,
            site_settings_id: 1,
            platform: Platform::YouTube,
            profile_name: "@magazin".to_owned(),
            icon: Platform::YouTube.icon(),
        };
        assert_eq!(social.to_string(), "YouTube: @magazin");
    }

    #[test]
    fn test_from_defaults() {
        let input = SettingsInput::from_defaults("Shop", &SeoDefaults::default());
        assert_eq!(input.short_name, "Shop");
        assert_eq!(input.theme_color, "#345212");
        assert!(input.validate().is_ok());
    }
}

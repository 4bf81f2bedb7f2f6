//! Multi-site records for the webstore.
//!
//! Sites are matched against the request `Host`. Each site owns one
//! [`SiteSettings`] record holding its identity, SEO values and the
//! maintenance flag, plus any number of [`SocialMedia`] links. Records live
//! in SQLite behind [`SiteRepository`].
//!
//! [`resolve_seo`] merges page overrides, settings and configured defaults
//! into the `global_seo` template variable; [`is_maintenance_active`] and
//! [`MaintenancePolicy`] implement the maintenance gate.

mod db;
mod error;
mod maintenance;
mod models;
mod repo;
mod seo;

pub use db::Database;
pub use error::SiteError;
pub use maintenance::{MaintenancePolicy, is_maintenance_active};
pub use models::{Keyword, PageSeo, Platform, SettingsInput, Site, SiteSettings, SocialMedia};
pub use repo::SiteRepository;
pub use seo::{GlobalSeo, SeoOverrides, registrable_domain, resolve_seo};

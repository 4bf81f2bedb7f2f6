//! Site store errors.

/// Error from the site settings store.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("No site with domain '{0}'")]
    UnknownSite(String),
    #[error("Site '{0}' has no settings")]
    MissingSettings(String),
    #[error("Corrupt {field} in database: {message}")]
    InvalidData { field: &'static str, message: String },
    #[error("Invalid maintenance ignore pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

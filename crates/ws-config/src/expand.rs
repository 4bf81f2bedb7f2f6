//! `${VAR}` and `${VAR:-default}` expansion for string settings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Only the braced form is recognized; a bare `$name` is kept verbatim so
/// that URLs and paths containing dollar signs survive untouched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let expanded = shellexpand::env_with_context(value, lookup).map_err(|e| {
        ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        }
    })?;
    Ok(expanded.into_owned())
}

/// Name of an unset variable.
struct Unset(String);

fn lookup(var: &str) -> Result<Option<String>, Unset> {
    std::env::var(var)
        .map(Some)
        .map_err(|_| Unset(var.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_set_variable() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("WS_EXPAND_DB", "/var/lib/webstore.db");
        }
        let result = expand_env("${WS_EXPAND_DB}", "database.path").unwrap();
        assert_eq!(result, "/var/lib/webstore.db");
        unsafe {
            std::env::remove_var("WS_EXPAND_DB");
        }
    }

    #[test]
    fn default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("WS_EXPAND_UNSET_HOST");
        }
        let result = expand_env("${WS_EXPAND_UNSET_HOST:-0.0.0.0}", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
    }

    #[test]
    fn unset_variable_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("WS_EXPAND_MISSING");
        }
        let err = expand_env("${WS_EXPAND_MISSING}", "static.url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("WS_EXPAND_MISSING"));
        assert!(message.contains("static.url"));
    }

    #[test]
    fn embedded_variable_in_url() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("WS_EXPAND_CDN", "cdn.example.com");
        }
        let result = expand_env("https://${WS_EXPAND_CDN}/static/", "static.url").unwrap();
        assert_eq!(result, "https://cdn.example.com/static/");
        unsafe {
            std::env::remove_var("WS_EXPAND_CDN");
        }
    }

    #[test]
    fn bare_dollar_kept() {
        let result = expand_env("/static/$hash/", "static.url").unwrap();
        assert_eq!(result, "/static/$hash/");
    }
}

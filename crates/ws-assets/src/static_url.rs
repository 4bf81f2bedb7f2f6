//! Static file URL helpers.

use std::collections::BTreeMap;

/// Error from [`static_dynamic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StaticUrlError {
    #[error("Missing variable in static_dynamic tag: '{0}'")]
    MissingVariable(String),
    #[error("Unbalanced brace in static_dynamic path template: {0}")]
    UnbalancedBrace(String),
}

/// Join `path` onto the static base URL.
///
/// Leading slashes on `path` are dropped so manifest values emitted with an
/// absolute public path do not produce `//`.
pub fn static_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Fill `{name}` placeholders in `template` and join the result onto `base`.
///
/// `{{` and `}}` produce literal braces.
pub fn static_dynamic(
    base: &str,
    template: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, StaticUrlError> {
    let mut path = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                path.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(StaticUrlError::UnbalancedBrace(template.to_owned())),
                    }
                }
                let value = vars
                    .get(&name)
                    .ok_or(StaticUrlError::MissingVariable(name))?;
                path.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                path.push('}');
            }
            '}' => return Err(StaticUrlError::UnbalancedBrace(template.to_owned())),
            _ => path.push(c),
        }
    }

    Ok(static_url(base, &path))
}

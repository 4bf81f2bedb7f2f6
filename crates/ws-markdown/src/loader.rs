//! Localized markdown sources.
//!
//! A page name resolves to a directory and a base name, then to the first
//! existing file among `{base}.{lang}.md`, `{base}.{fallback}.md` and
//! `{base}.md`. The file is rendered as a template before markdown
//! conversion.
//!
//! Two name forms are accepted:
//!
//! - path form (`content/about`, `content/about.md`): directory and stem of
//!   the path
//! - namespaced form (`frontpage.about`): the `frontpage` app directory
//!   from configuration, sources under its `markdown/` subdirectory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Value};
use ws_config::Config;

use crate::renderer::RenderResult;

/// Error loading a markdown source.
#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    #[error("Markdown file not found for base '{name}' (lang: {lang})")]
    NotFound { name: String, lang: String },
    #[error("Missing markdown file name after app name (e.g. 'myapp.about'): '{0}'")]
    MissingPage(String),
    #[error("Unknown markdown app '{0}'")]
    UnknownApp(String),
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Template error in {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },
}

/// HTML comment emitted in place of a missing source in silent mode.
pub fn not_found_comment(name: &str, lang: &str) -> String {
    format!("<!-- Markdown file not found: {name} ({lang}) -->")
}

/// Finds, reads and template-renders markdown sources.
#[derive(Debug)]
pub struct MarkdownLoader {
    apps: BTreeMap<String, PathBuf>,
    fallback_language: String,
    env: Environment<'static>,
}

impl MarkdownLoader {
    pub fn new(apps: BTreeMap<String, PathBuf>, fallback_language: impl Into<String>) -> Self {
        Self {
            apps,
            fallback_language: fallback_language.into(),
            env: Environment::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.markdown_resolved.apps.clone(),
            config.i18n.fallback_language.clone(),
        )
    }

    /// Directory and base file name for `name`.
    fn locate(&self, name: &str) -> Result<(PathBuf, String), MarkdownError> {
        let path_form = name.contains('/') || name.ends_with(".md") || !name.contains('.');
        if path_form {
            let path = Path::new(name);
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let base = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok((dir, base));
        }

        let (app, page) = name.split_once('.').unwrap_or((name, ""));
        if page.is_empty() {
            return Err(MarkdownError::MissingPage(name.to_owned()));
        }
        let app_dir = self
            .apps
            .get(app)
            .ok_or_else(|| MarkdownError::UnknownApp(app.to_owned()))?;
        Ok((app_dir.join("markdown"), page.to_owned()))
    }

    /// Language actually used for a request language.
    fn effective_language<'a>(&'a self, lang: Option<&'a str>) -> &'a str {
        lang.filter(|l| !l.is_empty())
            .unwrap_or(&self.fallback_language)
    }

    /// Candidate files for `name`, most specific first.
    pub fn candidates(&self, name: &str, lang: Option<&str>) -> Result<Vec<PathBuf>, MarkdownError> {
        let (dir, base) = self.locate(name)?;
        let lang = self.effective_language(lang);

        let mut suffixes = vec![format!(".{lang}.md")];
        let fallback = format!(".{}.md", self.fallback_language);
        if !suffixes.contains(&fallback) {
            suffixes.push(fallback);
        }
        suffixes.push(".md".to_owned());

        Ok(suffixes
            .into_iter()
            .map(|suffix| dir.join(format!("{base}{suffix}")))
            .collect())
    }

    /// First existing candidate.
    pub fn find(&self, name: &str, lang: Option<&str>) -> Result<PathBuf, MarkdownError> {
        self.candidates(name, lang)?
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| MarkdownError::NotFound {
                name: name.to_owned(),
                lang: self.effective_language(lang).to_owned(),
            })
    }

    /// Markdown source of `name` with `context` substituted.
    ///
    /// With `silent`, a missing file yields [`not_found_comment`] instead of
    /// an error. Other failures are always returned.
    pub fn load(
        &self,
        name: &str,
        lang: Option<&str>,
        context: &Value,
        silent: bool,
    ) -> Result<String, MarkdownError> {
        let path = match self.find(name, lang) {
            Ok(path) => path,
            Err(MarkdownError::NotFound { name, lang }) if silent => {
                tracing::debug!(%name, %lang, "Markdown source missing, emitting placeholder");
                return Ok(not_found_comment(&name, &lang));
            }
            Err(e) => return Err(e),
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| MarkdownError::Io {
            path: path.clone(),
            source,
        })?;
        let rendered = self
            .env
            .render_str(&raw, context)
            .map_err(|e| MarkdownError::Template {
                path: path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), "Loaded markdown source");
        Ok(rendered)
    }

    /// Load `name` and run it through the full rendering pipeline.
    ///
    /// A silent miss returns the placeholder comment as the HTML, bypassing
    /// the sanitizer that would strip it.
    pub fn render(
        &self,
        name: &str,
        lang: Option<&str>,
        context: &Value,
        silent: bool,
    ) -> Result<RenderResult, MarkdownError> {
        match self.load(name, lang, context, false) {
            Ok(source) => Ok(crate::render(&source)),
            Err(MarkdownError::NotFound { name, lang }) if silent => Ok(RenderResult {
                html: not_found_comment(&name, &lang),
                title: None,
                toc: Vec::new(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn loader_with_app(dir: &Path) -> MarkdownLoader {
        let apps = BTreeMap::from([("frontpage".to_owned(), dir.join("frontpage"))]);
        MarkdownLoader::new(apps, "en")
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_language_preferred_over_fallback() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("frontpage/markdown");
        write(&dir.join("about.ro.md"), "ro");
        write(&dir.join("about.en.md"), "en");
        write(&dir.join("about.md"), "plain");

        let loader = loader_with_app(temp.path());
        let ctx = Value::UNDEFINED;
        assert_eq!(loader.load("frontpage.about", Some("ro"), &ctx, false).unwrap(), "ro");
        assert_eq!(loader.load("frontpage.about", Some("de"), &ctx, false).unwrap(), "en");

        fs::remove_file(dir.join("about.en.md")).unwrap();
        assert_eq!(loader.load("frontpage.about", Some("de"), &ctx, false).unwrap(), "plain");
    }

    #[test]
    fn test_candidate_order() {
        let loader = loader_with_app(Path::new("/srv"));
        let candidates = loader.candidates("frontpage.legal.terms", Some("ro")).unwrap();
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/frontpage/markdown/legal.terms.ro.md"),
                PathBuf::from("/srv/frontpage/markdown/legal.terms.en.md"),
                PathBuf::from("/srv/frontpage/markdown/legal.terms.md"),
            ]
        );

        let same = loader.candidates("content/about.md", None).unwrap();
        assert_eq!(
            same,
            vec![
                PathBuf::from("content/about.en.md"),
                PathBuf::from("content/about.md"),
            ]
        );
    }

    #[test]
    fn test_path_form() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("pages/faq.en.md"), "# FAQ");
        let loader = MarkdownLoader::new(BTreeMap::new(), "en");
        let name = temp.path().join("pages/faq").display().to_string();

        let source = loader.load(&name, Some("ro"), &Value::UNDEFINED, false).unwrap();
        assert_eq!(source, "# FAQ");
    }

    #[test]
    fn test_context_substitution() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("frontpage/markdown/welcome.md"),
            "Bun venit la {{ site_name }}!",
        );
        let loader = loader_with_app(temp.path());
        let source = loader
            .load("frontpage.welcome", Some("ro"), &context! { site_name => "Magazin" }, false)
            .unwrap();
        assert_eq!(source, "Bun venit la Magazin!");
    }

    #[test]
    fn test_template_error() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("frontpage/markdown/bad.md"), "{% if %}");
        let loader = loader_with_app(temp.path());
        let err = loader
            .load("frontpage.bad", None, &Value::UNDEFINED, true)
            .unwrap_err();
        assert!(matches!(err, MarkdownError::Template { .. }));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let loader = loader_with_app(temp.path());

        let err = loader
            .load("frontpage.missing", Some("ro"), &Value::UNDEFINED, false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Markdown file not found for base 'frontpage.missing' (lang: ro)"
        );

        let placeholder = loader
            .load("frontpage.missing", Some("ro"), &Value::UNDEFINED, true)
            .unwrap();
        assert_eq!(placeholder, "<!-- Markdown file not found: frontpage.missing (ro) -->");
    }

    #[test]
    fn test_silent_render_keeps_placeholder() {
        let loader = MarkdownLoader::new(BTreeMap::new(), "en");
        let result = loader
            .render("nowhere/page", None, &Value::UNDEFINED, true)
            .unwrap();
        assert_eq!(result.html, "<!-- Markdown file not found: nowhere/page (en) -->");
    }

    #[test]
    fn test_bad_names() {
        let loader = loader_with_app(Path::new("/srv"));
        assert!(matches!(
            loader.find("frontpage.", None),
            Err(MarkdownError::MissingPage(_))
        ));
        assert!(matches!(
            loader.find("shop.about", None),
            Err(MarkdownError::UnknownApp(app)) if app == "shop"
        ));
    }
}

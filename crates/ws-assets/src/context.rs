//! Per-request rendering state.
//!
//! A [`RequestContext`] is created when a request enters the server and is
//! shared (behind an `Arc`) with every template helper invoked while the
//! response renders. [`RequestScope`] clears it when the request ends, on
//! every exit path including errors and unwinding panics.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::preload::PreloadSet;

/// `host[:port]` without the port. Bracketed IPv6 literals keep their
/// brackets; a bare IPv6 address is returned unchanged.
fn strip_port(authority: &str) -> &str {
    if authority.starts_with('[') {
        return authority
            .find(']')
            .map_or(authority, |end| &authority[..=end]);
    }
    match authority.split_once(':') {
        Some((host, port)) if !port.contains(':') => host,
        _ => authority,
    }
}

/// State owned by one in-flight request.
#[derive(Debug)]
pub struct RequestContext {
    host: Option<String>,
    scheme: String,
    language: String,
    path: String,
    site_domains: Vec<String>,
    preloads: Mutex<PreloadSet>,
    emitted_hints: Mutex<BTreeSet<String>>,
}

impl RequestContext {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            host: None,
            scheme: "http".to_owned(),
            language: language.into(),
            path: "/".to_owned(),
            site_domains: Vec::new(),
            preloads: Mutex::new(PreloadSet::new()),
            emitted_hints: Mutex::new(BTreeSet::new()),
        }
    }

    /// Request `Host`, lowercased and without port.
    #[must_use]
    pub fn with_host(mut self, host: Option<&str>) -> Self {
        self.host = host
            .map(|h| strip_port(h.trim()).to_ascii_lowercase())
            .filter(|h| !h.is_empty());
        self
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Domains of every configured site, used for resource hints.
    #[must_use]
    pub fn with_site_domains(mut self, domains: Vec<String>) -> Self {
        self.site_domains = domains;
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn site_domains(&self) -> &[String] {
        &self.site_domains
    }

    /// `scheme://host`, or empty when the host is unknown.
    pub fn origin(&self) -> String {
        self.host
            .as_deref()
            .map(|host| format!("{}://{host}", self.scheme))
            .unwrap_or_default()
    }

    /// Absolute URL of the current request.
    pub fn absolute_url(&self) -> String {
        format!("{}{}", self.origin(), self.path)
    }

    pub fn add_preload(&self, tag: impl Into<String>) {
        self.preloads().add(tag);
    }

    /// Sorted preload tags.
    pub fn get_preloads(&self) -> Vec<String> {
        self.preloads().get()
    }

    pub fn clear_preloads(&self) {
        self.preloads().clear();
    }

    /// Take every collected preload tag, sorted.
    pub fn drain_preloads(&self) -> Vec<String> {
        self.preloads().drain()
    }

    /// Remove domains already hinted in this request and record the rest.
    pub(crate) fn claim_hint_domains(&self, domains: BTreeSet<String>) -> BTreeSet<String> {
        let mut emitted = self.emitted_hints();
        let fresh: BTreeSet<String> = domains.difference(&emitted).cloned().collect();
        emitted.extend(fresh.iter().cloned());
        fresh
    }

    pub(crate) fn reset_hints(&self) {
        self.emitted_hints().clear();
    }

    /// Drop all per-request collections.
    pub fn clear(&self) {
        self.clear_preloads();
        self.reset_hints();
    }

    fn preloads(&self) -> MutexGuard<'_, PreloadSet> {
        self.preloads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emitted_hints(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.emitted_hints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears a [`RequestContext`] when dropped.
#[derive(Debug)]
pub struct RequestScope {
    context: Arc<RequestContext>,
}

impl RequestScope {
    pub fn new(context: Arc<RequestContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<RequestContext> {
        &self.context
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.context.clear();
        tracing::trace!(path = %self.context.path, "Request context cleared");
    }
}

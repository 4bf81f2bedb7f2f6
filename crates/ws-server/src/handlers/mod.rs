//! HTTP request handlers.

pub(crate) mod pages;
pub(crate) mod robots;

use std::sync::Arc;

use minijinja::{Value, context};
use ws_assets::RequestContext;
use ws_site::{GlobalSeo, SeoOverrides, SocialMedia, resolve_seo};

use crate::error::ServerError;
use crate::state::AppState;

/// Site data every page template receives.
pub(crate) struct SiteData {
    pub(crate) global_seo: GlobalSeo,
    pub(crate) social: Vec<SocialMedia>,
}

impl SiteData {
    /// Look up the request's site and resolve its SEO values.
    pub(crate) async fn load(
        state: &AppState,
        request: &RequestContext,
        overrides: &SeoOverrides,
    ) -> Result<Self, ServerError> {
        let (settings, social) = match request.host() {
            Some(host) => (
                state.repo.settings_for_domain(host).await?,
                state.repo.social_for(host).await?,
            ),
            None => (None, Vec::new()),
        };
        Ok(Self {
            global_seo: resolve_seo(overrides, settings.as_ref(), &state.seo, request),
            social,
        })
    }

    /// Base template context shared by every page.
    pub(crate) fn context(&self, request: &Arc<RequestContext>) -> Value {
        let social: Vec<Value> = self
            .social
            .iter()
            .map(|link| {
                context! {
                    platform => link.platform.as_str(),
                    profile_name => &link.profile_name,
                    icon => &link.icon,
                    label => link.to_string(),
                }
            })
            .collect();
        context! {
            request => crate::templates::RequestObject::value(request),
            lang => request.language(),
            global_seo => &self.global_seo,
            social => social,
        }
    }
}

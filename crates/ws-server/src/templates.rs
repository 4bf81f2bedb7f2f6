//! Page templates and the asset / markdown helpers they call.
//!
//! Built-in templates ship with the binary; a file with the same name in
//! the configured templates directory replaces the built-in one.
//!
//! Helpers that touch per-request state (preloads, resource hints, fonts,
//! markdown language) find the [`RequestContext`] through the `request`
//! variable every page is rendered with.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use minijinja::value::{Kwargs, Object, Rest};
use minijinja::{Environment, Error, ErrorKind, State, Value, context};
use ws_assets::{AssetPipeline, FontOptions, FontSource, HintOptions, RequestContext, ScriptOptions};
use ws_markdown::MarkdownLoader;

const BUILTIN: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("page.html", include_str!("../templates/page.html")),
    ("maintenance/503.html", include_str!("../templates/maintenance/503.html")),
    ("robots.txt", include_str!("../templates/robots.txt")),
];

fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, source)| *source)
}

/// The request as seen from templates.
#[derive(Debug)]
pub(crate) struct RequestObject(pub(crate) Arc<RequestContext>);

impl Object for RequestObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let ctx = &self.0;
        let value = match key.as_str()? {
            "language" => Value::from(ctx.language()),
            "host" => Value::from(ctx.host()),
            "path" => Value::from(ctx.path()),
            "origin" => Value::from(ctx.origin()),
            "absolute_url" => Value::from(ctx.absolute_url()),
            _ => return None,
        };
        Some(value)
    }
}

impl RequestObject {
    pub(crate) fn value(context: &Arc<RequestContext>) -> Value {
        Value::from_object(Self(Arc::clone(context)))
    }
}

fn request_context(state: &State) -> Option<Arc<RequestContext>> {
    state
        .lookup("request")?
        .downcast_object_ref::<RequestObject>()
        .map(|r| Arc::clone(&r.0))
}

fn markup(html: String) -> Value {
    Value::from_safe_string(html)
}

/// Template environment with every helper registered.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new(
        dir: Option<&Path>,
        assets: Arc<AssetPipeline>,
        markdown: Arc<MarkdownLoader>,
    ) -> Self {
        let mut env = Environment::new();

        let dir_loader = dir.map(minijinja::path_loader);
        env.set_loader(move |name| {
            if let Some(load) = &dir_loader
                && let Some(source) = load(name)?
            {
                return Ok(Some(source));
            }
            Ok(builtin(name).map(str::to_owned))
        });

        register_asset_helpers(&mut env, &assets);
        register_markdown_helpers(&mut env, markdown);
        Self { env }
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

fn register_asset_helpers(env: &mut Environment<'static>, assets: &Arc<AssetPipeline>) {
    let pipeline = Arc::clone(assets);
    env.add_function("static", move |path: &str| pipeline.static_url(path));

    let pipeline = Arc::clone(assets);
    env.add_function(
        "static_dynamic",
        move |template: &str, kwargs: Kwargs| -> Result<String, Error> {
            let mut vars = BTreeMap::new();
            for key in kwargs.args() {
                let value: Value = kwargs.get(key)?;
                vars.insert(key.to_owned(), value.to_string());
            }
            pipeline
                .static_dynamic(template, &vars)
                .map_err(|e| Error::new(ErrorKind::SyntaxError, e.to_string()))
        },
    );

    let pipeline = Arc::clone(assets);
    env.add_function("webpack", move |filename: &str| pipeline.webpack(filename));

    let pipeline = Arc::clone(assets);
    env.add_function(
        "webpack_asset",
        move |state: &State, entries: Option<String>, kwargs: Kwargs| -> Result<Value, Error> {
            let options = ScriptOptions {
                async_scripts: kwargs.get::<Option<bool>>("async_scripts")?.unwrap_or(false),
                module: kwargs.get::<Option<bool>>("module")?.unwrap_or(false),
            };
            let suffix: Option<String> = kwargs.get("suffix")?;
            kwargs.assert_all_used()?;
            let request = request_context(state);
            Ok(markup(pipeline.webpack_asset(
                entries.as_deref().unwrap_or("main"),
                options,
                suffix.as_deref(),
                request.as_deref(),
            )))
        },
    );

    let pipeline = Arc::clone(assets);
    env.add_function(
        "webpack_preload",
        move |entries: Option<String>, kwargs: Kwargs| -> Result<Value, Error> {
            let module = kwargs.get::<Option<bool>>("module")?.unwrap_or(false);
            let suffix: Option<String> = kwargs.get("suffix")?;
            kwargs.assert_all_used()?;
            Ok(markup(pipeline.webpack_preload(
                entries.as_deref().unwrap_or("main"),
                module,
                suffix.as_deref(),
            )))
        },
    );

    let pipeline = Arc::clone(assets);
    env.add_function("webpack_manifest", move || pipeline.webpack_manifest());

    env.add_function("render_preloads", |state: &State| {
        markup(request_context(state).map_or_else(String::new, |r| ws_assets::render_preloads(&r)))
    });

    let pipeline = Arc::clone(assets);
    env.add_function(
        "resource_hints",
        move |state: &State, rel: Option<String>, kwargs: Kwargs| -> Result<Value, Error> {
            let options = HintOptions {
                rel: rel.unwrap_or_else(|| "dns-prefetch".to_owned()),
                crossorigin: kwargs.get("crossorigin")?,
                extra_domains: kwargs.get("extra_domains")?,
                reset: kwargs.get::<Option<bool>>("reset")?.unwrap_or(false),
                kind: kwargs.get("type")?,
                importance: kwargs.get("importance")?,
                fetchpriority: kwargs.get("fetchpriority")?,
            };
            kwargs.assert_all_used()?;
            let Some(request) = request_context(state) else {
                return Ok(markup(String::new()));
            };
            Ok(markup(pipeline.resource_hints(&options, &request)))
        },
    );

    let pipeline = Arc::clone(assets);
    env.add_function(
        "load_google_fonts",
        move |state: &State, fonts: Rest<String>, kwargs: Kwargs| -> Result<Value, Error> {
            let mut options = FontOptions::default();
            if let Some(source) = kwargs.get::<Option<String>>("source")? {
                options.source = FontSource::parse(&source);
            }
            if let Some(display) = kwargs.get::<Option<String>>("display")? {
                options.display = display;
            }
            if let Some(preloads) = kwargs.get::<Option<bool>>("preloads")? {
                options.preloads = preloads;
            }
            kwargs.assert_all_used()?;
            let request = request_context(state);
            Ok(markup(pipeline.load_google_fonts(&fonts, &options, request.as_deref())))
        },
    );
}

fn register_markdown_helpers(env: &mut Environment<'static>, loader: Arc<MarkdownLoader>) {
    env.add_function(
        "markdownify",
        move |state: &State, name: &str, kwargs: Kwargs| -> Result<Value, Error> {
            let silent = kwargs.get::<Option<bool>>("silent")?.unwrap_or(false);
            kwargs.assert_all_used()?;
            let request = request_context(state);
            let lang = request.as_ref().map(|r| r.language().to_owned());
            let ctx = context! {
                lang => lang.clone(),
                global_seo => state.lookup("global_seo"),
                request => state.lookup("request"),
            };
            let result = loader
                .render(name, lang.as_deref(), &ctx, silent)
                .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
            Ok(markup(result.html))
        },
    );

    env.add_filter("markdown", |text: &str| markup(ws_markdown::markdownify(text)));
}

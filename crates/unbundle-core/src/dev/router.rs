//! Request classification and dispatch.
//!
//! A request is classified by walking an ordered route table, first match
//! wins:
//!
//! | Order | Match | Kind |
//! |---|---|---|
//! | 1 | path is exactly `/` | [`ArtifactKind::HtmlEntry`] |
//! | 2 | path ends with `.js` | [`ArtifactKind::JavaScriptModule`] |
//! | 3 | path starts with `/@modules/` | [`ArtifactKind::PackageImport`] |
//! | 4 | path ends with `.vue`, `type=template` | [`ArtifactKind::ComponentTemplate`] |
//! | 4 | path ends with `.vue`, no `type` | [`ArtifactKind::Component`] |
//! | 5 | path ends with `.css` | [`ArtifactKind::Stylesheet`] |
//!
//! Anything else is [`DevError::Unrouted`].

use crate::config::DevConfig;
use crate::dev::cache::{DescriptorCache, FileStamp};
use crate::dev::package::PackageResolver;
use crate::dev::rewrite::MODULES_PREFIX;
use crate::dev::transform::{
    component_script_module, component_template_module, create_css_module, inject_env_shim,
    transform_javascript, HTML_CONTENT_TYPE, JS_CONTENT_TYPE,
};
use crate::error::DevError;
use crate::sfc::{BlockParser, ComponentParser, RenderCompiler, SfcDescriptor, TemplateCompiler};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Inbound request: path plus decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleRequest {
    path: String,
    query: HashMap<String, String>,
}

impl ModuleRequest {
    /// Build from a raw request target such as `/App.vue?type=template`.
    ///
    /// On duplicate query keys the last value wins.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self {
            path: path.to_string(),
            query,
        }
    }

    #[must_use]
    pub fn new(path: impl Into<String>, query: HashMap<String, String>) -> Self {
        Self {
            path: path.into(),
            query,
        }
    }

    /// Request path, query string removed.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }
}

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    HtmlEntry,
    JavaScriptModule,
    PackageImport,
    Component,
    ComponentTemplate,
    Stylesheet,
}

impl ArtifactKind {
    /// Response content type for this kind.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::HtmlEntry => HTML_CONTENT_TYPE,
            _ => JS_CONTENT_TYPE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HtmlEntry => "html_entry",
            Self::JavaScriptModule => "javascript_module",
            Self::PackageImport => "package_import",
            Self::Component => "component",
            Self::ComponentTemplate => "component_template",
            Self::Stylesheet => "stylesheet",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub kind: ArtifactKind,
    pub matches: fn(&ModuleRequest) -> bool,
}

/// Ordered, first-match-wins route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    /// The table documented at the top of this module.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            routes: vec![
                Route {
                    kind: ArtifactKind::HtmlEntry,
                    matches: |r| r.path() == "/",
                },
                Route {
                    kind: ArtifactKind::JavaScriptModule,
                    matches: |r| r.path().ends_with(".js"),
                },
                Route {
                    kind: ArtifactKind::PackageImport,
                    matches: |r| r.path().starts_with(MODULES_PREFIX),
                },
                Route {
                    kind: ArtifactKind::ComponentTemplate,
                    matches: |r| r.path().ends_with(".vue") && r.query_param("type") == Some("template"),
                },
                Route {
                    kind: ArtifactKind::Component,
                    matches: |r| r.path().ends_with(".vue") && r.query_param("type").is_none(),
                },
                Route {
                    kind: ArtifactKind::Stylesheet,
                    matches: |r| r.path().ends_with(".css"),
                },
            ],
        }
    }

    /// Kind of the first matching route.
    #[must_use]
    pub fn classify(&self, request: &ModuleRequest) -> Option<ArtifactKind> {
        self.routes
            .iter()
            .find(|route| (route.matches)(request))
            .map(|route| route.kind)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResponse {
    pub kind: ArtifactKind,
    pub content_type: &'static str,
    pub body: String,
}

/// Serves module requests for one project root.
pub struct ModuleServer {
    config: DevConfig,
    routes: RouteTable,
    packages: PackageResolver,
    parser: Arc<dyn ComponentParser>,
    compiler: Arc<dyn TemplateCompiler>,
    descriptors: Option<DescriptorCache>,
}

impl std::fmt::Debug for ModuleServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleServer")
            .field("config", &self.config)
            .field("routes", &self.routes.routes.len())
            .field("component_cache", &self.descriptors.is_some())
            .finish_non_exhaustive()
    }
}

impl ModuleServer {
    /// Server with the built-in component parser and template compiler.
    #[must_use]
    pub fn new(config: DevConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(BlockParser::new()),
            Arc::new(RenderCompiler::new()),
        )
    }

    /// Server with caller-supplied component collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: DevConfig,
        parser: Arc<dyn ComponentParser>,
        compiler: Arc<dyn TemplateCompiler>,
    ) -> Self {
        let packages = PackageResolver::new(config.modules_path());
        let descriptors = config.component_cache.then(DescriptorCache::default);
        Self {
            config,
            routes: RouteTable::standard(),
            packages,
            parser,
            compiler,
            descriptors,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DevConfig {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Classify, load and transform one request.
    pub async fn handle(&self, request: &ModuleRequest) -> Result<ModuleResponse, DevError> {
        let kind = self
            .routes
            .classify(request)
            .ok_or_else(|| DevError::Unrouted {
                path: request.path().to_string(),
            })?;
        debug!(path = %request.path(), %kind, "classified request");

        let body = match kind {
            ArtifactKind::HtmlEntry => {
                let html = read_source(&self.config.index_path()).await?;
                inject_env_shim(&html)
            }
            ArtifactKind::JavaScriptModule => {
                let path = self.resolve_path(request.path())?;
                transform_javascript(&read_source(&path).await?)
            }
            ArtifactKind::PackageImport => {
                let specifier = request
                    .path()
                    .strip_prefix(MODULES_PREFIX)
                    .unwrap_or_default();
                let resolved = self.packages.resolve(specifier).await?;
                transform_javascript(&resolved.source)
            }
            ArtifactKind::Component => {
                let path = self.resolve_path(request.path())?;
                let descriptor = self.load_component(&path, request.path(), true).await?;
                component_script_module(&descriptor, request.path())?
            }
            ArtifactKind::ComponentTemplate => {
                let path = self.resolve_path(request.path())?;
                let descriptor = self.load_component(&path, request.path(), false).await?;
                component_template_module(&descriptor, self.compiler.as_ref())?
            }
            ArtifactKind::Stylesheet => {
                let path = self.resolve_path(request.path())?;
                create_css_module(&read_source(&path).await?)
            }
        };

        Ok(ModuleResponse {
            kind,
            content_type: kind.content_type(),
            body,
        })
    }

    /// Join a URL path onto the project root, refusing `..` segments.
    fn resolve_path(&self, url_path: &str) -> Result<PathBuf, DevError> {
        let relative = Path::new(url_path.trim_start_matches('/'));
        let joined = self.config.root.join(relative);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(DevError::FileNotFound { path: joined });
        }
        Ok(joined)
    }

    /// Descriptor for a component request.
    ///
    /// The script phase parks its descriptor for the template phase; the
    /// template phase claims it when the file is unchanged and otherwise
    /// reads and parses again.
    async fn load_component(
        &self,
        path: &Path,
        url_path: &str,
        script_phase: bool,
    ) -> Result<SfcDescriptor, DevError> {
        let stamp = match &self.descriptors {
            Some(_) => FileStamp::read(path).await,
            None => None,
        };

        if !script_phase {
            if let (Some(cache), Some(stamp)) = (&self.descriptors, &stamp) {
                if let Some(descriptor) = cache.take(path, stamp) {
                    debug!(path = %path.display(), "descriptor cache hit");
                    return Ok(descriptor);
                }
            }
        }

        let source = read_source(path).await?;
        let filename = url_path.trim_start_matches('/');
        let descriptor = self.parser.parse(&source, filename)?;

        if script_phase && descriptor.template.is_some() {
            if let (Some(cache), Some(stamp)) = (&self.descriptors, stamp) {
                cache.store(path.to_path_buf(), stamp, descriptor.clone());
            }
        }
        Ok(descriptor)
    }
}

async fn read_source(path: &Path) -> Result<String, DevError> {
    debug!(path = %path.display(), "reading source");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DevError::from_io(path, e))
}

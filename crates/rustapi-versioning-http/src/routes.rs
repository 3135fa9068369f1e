//! Versioned route table
//!
//! Routes are matched with `matchit` on the path left after the reader strips
//! any version segment. Each path holds, per method, every handler revision
//! registered for it; the [`CandidateSelector`] decides between them.
//!
//! ```rust
//! use http::{Method, Request};
//! use rustapi_versioning::{ApiVersion, ApiVersionMetadata, ApiVersionModel, VersionedHandler};
//! use rustapi_versioning_http::VersionedRoutes;
//!
//! let v1 = ApiVersionModel::implemented([ApiVersion::new(1, 0)], []);
//! let v2 = ApiVersionModel::implemented([ApiVersion::new(2, 0)], []);
//!
//! let routes = VersionedRoutes::new()
//!     .route(Method::GET, "/orders/{id}", VersionedHandler::new("get_order", ApiVersionMetadata::new(Default::default(), v1), 1))
//!     .route(Method::GET, "/orders/{id}", VersionedHandler::new("get_order_v2", ApiVersionMetadata::new(Default::default(), v2), 2));
//!
//! let (parts, _) = Request::get("/v2/orders/42").body(()).unwrap().into_parts();
//! let dispatch = routes.dispatch(&parts).unwrap();
//!
//! assert_eq!(*dispatch.handler(), 2);
//! assert_eq!(dispatch.param("id"), Some("42"));
//! ```

use crate::error::{Response, Result, VersioningError};
use crate::reader::{default_reader, ApiVersionReader};
use crate::report::report_api_versions;
use http::request::Parts;
use http::{HeaderMap, Method};
use matchit::Router as MatchitRouter;
use rustapi_versioning::{
    ApiVersion, ApiVersionModel, ApiVersionParser, ApiVersionSelector, ApiVersioningOptions,
    Candidate, CandidateSelector, VersionOrigin, VersionedHandler,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error raised when two route patterns cannot coexist
#[derive(Debug, Clone)]
pub struct RouteConflictError {
    /// The path being registered
    pub new_path: String,
    /// The registered path it collides with
    pub existing_path: String,
    /// Message from the underlying router
    pub details: String,
}

impl fmt::Display for RouteConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "route conflict detected")?;
        writeln!(f, "  existing: {}", self.existing_path)?;
        writeln!(f, "  new:      {}", self.new_path)?;
        writeln!(f, "  details:  {}", self.details)?;
        write!(
            f,
            "  register every revision of an endpoint under the same path pattern"
        )
    }
}

struct Route<H> {
    path: String,
    methods: Vec<(Method, Vec<VersionedHandler<H>>)>,
}

impl<H> Route<H> {
    fn candidates(&self, method: &Method) -> Option<&[VersionedHandler<H>]> {
        self.methods
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handlers)| handlers.as_slice())
    }

    fn allowed_methods(&self) -> Vec<Method> {
        self.methods.iter().map(|(m, _)| m.clone()).collect()
    }
}

/// Path → method → handler revisions
pub struct VersionedRoutes<H> {
    inner: MatchitRouter<usize>,
    routes: Vec<Route<H>>,
    indices: HashMap<String, usize>,
    reader: Arc<dyn ApiVersionReader>,
    parser: ApiVersionParser,
    selector: CandidateSelector,
}

impl<H> VersionedRoutes<H> {
    /// Create a table with default options and the shared default reader
    pub fn new() -> Self {
        Self::with_options(ApiVersioningOptions::default())
    }

    /// Create a table with the given options
    pub fn with_options(options: ApiVersioningOptions) -> Self {
        Self {
            inner: MatchitRouter::new(),
            routes: Vec::new(),
            indices: HashMap::new(),
            reader: Arc::new(default_reader()),
            parser: ApiVersionParser::new(),
            selector: CandidateSelector::new(options),
        }
    }

    /// Read versions with `reader`
    pub fn reader(mut self, reader: impl ApiVersionReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Read versions with a shared reader
    pub fn shared_reader(mut self, reader: Arc<dyn ApiVersionReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Parse raw values with `parser`
    pub fn parser(mut self, parser: ApiVersionParser) -> Self {
        self.parser = parser;
        self
    }

    /// Assume versions with a custom policy
    pub fn selector_policy(mut self, policy: impl ApiVersionSelector + 'static) -> Self {
        self.selector = self.selector.with_policy(policy);
        self
    }

    /// The options in effect
    pub fn options(&self) -> &ApiVersioningOptions {
        self.selector.options()
    }

    /// Register a handler revision
    ///
    /// Every revision of an endpoint is registered under the same path.
    ///
    /// # Panics
    ///
    /// Panics if the path conflicts with a different registered pattern.
    pub fn route(mut self, method: Method, path: &str, handler: VersionedHandler<H>) -> Self {
        let matchit_path = convert_path_params(path);

        let index = match self.indices.get(&matchit_path) {
            Some(&index) => index,
            None => {
                let index = self.routes.len();
                if let Err(e) = self.inner.insert(matchit_path.clone(), index) {
                    let conflict = RouteConflictError {
                        new_path: path.to_string(),
                        existing_path: self.find_conflicting_route(&matchit_path),
                        details: e.to_string(),
                    };
                    panic!("{}", conflict);
                }
                self.routes.push(Route {
                    path: path.to_string(),
                    methods: Vec::new(),
                });
                self.indices.insert(matchit_path, index);
                index
            }
        };

        tracing::debug!(
            method = %method,
            path = %path,
            handler = %handler.name(),
            "registered versioned handler"
        );

        let route = &mut self.routes[index];
        match route.methods.iter_mut().find(|(m, _)| *m == method) {
            Some((_, handlers)) => handlers.push(handler),
            None => route.methods.push((method, vec![handler])),
        }
        self
    }

    fn find_conflicting_route(&self, matchit_path: &str) -> String {
        let shape = normalize_path_for_comparison(matchit_path);
        self.indices
            .iter()
            .find(|(registered, _)| normalize_path_for_comparison(registered) == shape)
            .map(|(_, &index)| self.routes[index].path.clone())
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Registered path patterns
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.path.as_str())
    }

    /// Aggregate version model of every handler on `path`, across methods
    pub fn route_model(&self, path: &str) -> Option<ApiVersionModel> {
        let index = *self.indices.get(&convert_path_params(path))?;
        let models: Vec<ApiVersionModel> = self.routes[index]
            .methods
            .iter()
            .map(|(_, handlers)| CandidateSelector::route_model(handlers))
            .collect();
        Some(ApiVersionModel::aggregate_all(&models))
    }

    /// Resolve the handler for a request
    pub fn dispatch(&self, parts: &Parts) -> Result<Dispatch<'_, H>> {
        let path = self.reader.route_path(parts.uri.path());

        let (route, params) = match self.inner.at(&path) {
            Ok(matched) => {
                let params: Vec<(String, String)> = matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (&self.routes[*matched.value], params)
            }
            Err(_) => {
                return Err(VersioningError::RouteNotFound {
                    path: path.to_string(),
                })
            }
        };

        let candidates =
            route
                .candidates(&parts.method)
                .ok_or_else(|| VersioningError::MethodNotAllowed {
                    method: parts.method.clone(),
                    allowed: route.allowed_methods(),
                })?;

        let requested = self.parser.resolve_requested(self.reader.read(parts))?;
        let selected = self
            .selector
            .select_route(Some(route.path.as_str()), requested.as_ref(), candidates)?;

        tracing::debug!(
            method = %parts.method,
            route = %route.path,
            handler = %selected.candidate.name(),
            version = ?selected.version.as_ref().map(ToString::to_string),
            "dispatched versioned request"
        );

        Ok(Dispatch {
            candidate: selected.candidate,
            version: selected.version,
            origin: selected.origin,
            route: &route.path,
            params,
            route_model: selected.route_model,
            report: self.options().report_api_versions,
        })
    }

    /// Render a dispatch failure, reporting versions when configured to
    pub fn error_response(&self, err: VersioningError) -> Response {
        err.into_response(self.options().report_api_versions)
    }
}

impl<H> Default for VersionedRoutes<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for VersionedRoutes<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedRoutes")
            .field("paths", &self.paths().collect::<Vec<_>>())
            .field("reader", &self.reader)
            .field("options", self.options())
            .finish()
    }
}

/// A resolved request
#[derive(Debug)]
pub struct Dispatch<'a, H> {
    candidate: &'a VersionedHandler<H>,
    version: Option<ApiVersion>,
    origin: VersionOrigin,
    route: &'a str,
    params: Vec<(String, String)>,
    route_model: ApiVersionModel,
    report: bool,
}

impl<'a, H> Dispatch<'a, H> {
    /// The selected handler
    pub fn handler(&self) -> &'a H {
        self.candidate.handler()
    }

    /// Name of the selected handler
    pub fn name(&self) -> std::borrow::Cow<'a, str> {
        self.candidate.name()
    }

    /// The effective version, absent for a neutral handler matched without one
    pub fn version(&self) -> Option<&ApiVersion> {
        self.version.as_ref()
    }

    /// Where the version came from
    pub fn origin(&self) -> VersionOrigin {
        self.origin
    }

    /// The matched path pattern
    pub fn route(&self) -> &'a str {
        self.route
    }

    /// A path parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every path parameter, in pattern order
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Aggregate version model of the route
    pub fn route_model(&self) -> &ApiVersionModel {
        &self.route_model
    }

    /// Write version advertisement headers when reporting is enabled
    pub fn report(&self, headers: &mut HeaderMap) {
        if self.report {
            report_api_versions(&self.route_model, headers);
        }
    }
}

/// Convert `{param}` style to `:param` (and `{*rest}` to `*rest`) for matchit
fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() != Some(&'*') {
                    result.push(':');
                }
            }
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Replace parameter names with a placeholder so conflicting shapes compare equal
fn normalize_path_for_comparison(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut in_param = false;

    for ch in path.chars() {
        match ch {
            ':' | '*' => {
                in_param = true;
                result.push(ch);
                result.push('_');
            }
            '/' => {
                in_param = false;
                result.push('/');
            }
            _ if in_param => {}
            _ => result.push(ch),
        }
    }

    result
}

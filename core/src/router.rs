//! Router: route modes, base path and path identifiers over a [`RuleTable`].
//!
//! The rule table knows nothing about HTTP. The router adds:
//!
//! - where the routed path comes from ([`RouteMode`] + [`RequestSource`])
//! - which ambient parameters seed a match (the request's query)
//! - how a built URL is framed (`/base/path?query` or `/base/?u=path&query`)

use crate::encode::decode_component;
use crate::path_group;
use crate::{Params, RequestMatch, RouteError, RuleTable};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════════════════

/// Where the routed path lives in a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RouteMode {
    /// `/base/product/42`: the URI path after the base path.
    #[default]
    UrlRewrite,
    /// `/index.php/product/42`: the URI path after the script name.
    PathInfo,
    /// `/?u=product/42`: a query parameter.
    Query,
}

impl RouteMode {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UrlRewrite => "urlrewrite",
            Self::PathInfo => "pathinfo",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteMode {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "urlrewrite" => Ok(Self::UrlRewrite),
            "pathinfo" => Ok(Self::PathInfo),
            "query" => Ok(Self::Query),
            _ => Err(RouteError::InvalidConfig {
                reason: format!("unknown route mode \"{s}\"; expected urlrewrite, pathinfo or query"),
            }),
        }
    }
}

/// Router-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSettings {
    /// Where the routed path comes from.
    pub route_mode: RouteMode,
    /// Query parameter holding the path in [`RouteMode::Query`].
    pub query_key: String,
    /// Prefix of every routed URL.
    pub base_path: String,
    /// Names bound to the segments of a path group, in order.
    pub path_identifiers: Vec<String>,
    /// Whether [`Router::parse_into`] replaces the request's query parameters.
    pub write_back: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            route_mode: RouteMode::default(),
            query_key: "u".to_owned(),
            base_path: "/".to_owned(),
            path_identifiers: vec!["_controller".to_owned(), "_action".to_owned()],
            write_back: true,
        }
    }
}

impl RouterSettings {
    /// Set the route mode (builder pattern).
    #[must_use]
    pub fn with_route_mode(mut self, route_mode: RouteMode) -> Self {
        self.route_mode = route_mode;
        self
    }

    /// Set the base path (builder pattern).
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Set the query key (builder pattern).
    #[must_use]
    pub fn with_query_key(mut self, query_key: impl Into<String>) -> Self {
        self.query_key = query_key.into();
        self
    }

    /// Set the path identifiers (builder pattern).
    #[must_use]
    pub fn with_path_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable write-back (builder pattern).
    #[must_use]
    pub fn with_write_back(mut self, write_back: bool) -> Self {
        self.write_back = write_back;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request source
// ═══════════════════════════════════════════════════════════════════════════════

/// The parts of an incoming request the router reads.
///
/// Implement this for your HTTP framework's request type; [`Request`] is a
/// plain in-memory implementation.
pub trait RequestSource {
    /// The raw request URI (`/path?query`), or an absolute URL.
    fn request_uri(&self) -> &str;

    /// Path of the front script, used by [`RouteMode::PathInfo`].
    fn script_name(&self) -> &str {
        ""
    }

    /// Decoded query parameters.
    fn query(&self) -> &Params;

    /// Mutable query parameters, written by [`Router::parse_into`].
    fn query_mut(&mut self) -> &mut Params;
}

/// In-memory request.
///
/// # Example
///
/// ```
/// use ruta::{Request, RequestSource};
///
/// let request = Request::new("/list/red?page=2");
/// assert_eq!(request.request_uri(), "/list/red?page=2");
/// assert_eq!(request.query().get_str("page"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Raw request URI.
    pub uri: String,
    /// Front script path.
    pub script_name: String,
    /// Query parameters.
    pub query: Params,
}

impl Request {
    /// Create a request, parsing its query parameters from the URI.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = uri
            .split_once('?')
            .map(|(_, q)| Params::from_query(q.split('#').next().unwrap_or_default()))
            .unwrap_or_default();
        Self {
            uri,
            script_name: String::new(),
            query,
        }
    }

    /// Set the front script path (builder pattern).
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }
}

impl RequestSource for Request {
    fn request_uri(&self) -> &str {
        &self.uri
    }

    fn script_name(&self) -> &str {
        &self.script_name
    }

    fn query(&self) -> &Params {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Params {
        &mut self.query
    }
}

/// The path component of a request URI, still percent-encoded.
fn uri_path(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(url) if url.has_host() => url.path().to_owned(),
        _ => uri.split(['?', '#']).next().unwrap_or_default().to_owned(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Router
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses request paths and creates URLs.
///
/// # Example
///
/// ```
/// use ruta::prelude::*;
///
/// let mut table = RuleTable::new();
/// table.set_rules([RuleEntry::root(["<_controller>/<_action>/<*>"])]);
/// let router = Router::new(
///     RouterSettings::default().with_route_mode(RouteMode::Query),
///     table,
/// );
///
/// let request = Request::new("/?u=news/list/page-2");
/// let found = router.parse(None, &request).unwrap().unwrap();
/// assert_eq!(found.params.get_str("page"), Some("2"));
///
/// let url = router
///     .create_url("news/list", &Params::new().with("page", 3).with("sort", "date"))
///     .unwrap();
/// assert_eq!(url, "/?u=news/list/page-3-sort-date");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    settings: RouterSettings,
    table: RuleTable,
}

impl Router {
    /// Create a router.
    #[must_use]
    pub fn new(settings: RouterSettings, table: RuleTable) -> Self {
        Self { settings, table }
    }

    /// Router settings.
    #[must_use]
    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Mutable router settings.
    pub fn settings_mut(&mut self) -> &mut RouterSettings {
        &mut self.settings
    }

    /// The rule table.
    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Mutable rule table; changing rules discards compiled state.
    pub fn table_mut(&mut self) -> &mut RuleTable {
        &mut self.table
    }

    /// Compile the rule table now instead of on first use.
    ///
    /// # Errors
    ///
    /// The first configuration error in the table.
    pub fn compile(&self) -> Result<(), RouteError> {
        self.table.compile().map(|_| ())
    }

    /// Extract the routed path from a request, percent-decoded.
    ///
    /// - `UrlRewrite`: URI path minus the base path
    /// - `PathInfo`: URI path minus the script name, leading slashes trimmed
    /// - `Query`: the `query_key` parameter (empty if absent), leading slashes trimmed
    pub fn request_path(&self, source: &impl RequestSource) -> String {
        match self.settings.route_mode {
            RouteMode::UrlRewrite => {
                let path = uri_path(source.request_uri());
                let path = path.strip_prefix(self.settings.base_path.as_str()).unwrap_or(&path);
                decode_component(path)
            }
            RouteMode::PathInfo => {
                let path = uri_path(source.request_uri());
                let path = path.strip_prefix(source.script_name()).unwrap_or(&path);
                decode_component(path).trim_start_matches('/').to_owned()
            }
            RouteMode::Query => source
                .query()
                .get_str(&self.settings.query_key)
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_owned(),
        }
    }

    /// Match a path against the rule table.
    ///
    /// With `path = None` the path comes from [`Router::request_path`].
    /// Leading slashes are ignored. The request's query parameters seed
    /// the result.
    ///
    /// # Errors
    ///
    /// Only configuration errors; no match is `Ok(None)`.
    pub fn parse(
        &self,
        path: Option<&str>,
        source: &impl RequestSource,
    ) -> Result<Option<RequestMatch>, RouteError> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => self.request_path(source),
        };
        let path = path.trim_start_matches('/');
        let found = self
            .table
            .match_path(path, source.query(), &self.settings.path_identifiers)?;
        if found.is_none() {
            tracing::trace!(path, "no rule matched");
        }
        Ok(found)
    }

    /// Like [`Router::parse`]; on a match with `write_back` enabled, the
    /// request's query parameters are replaced by the result.
    ///
    /// # Errors
    ///
    /// See [`Router::parse`].
    pub fn parse_into(
        &self,
        path: Option<&str>,
        source: &mut impl RequestSource,
    ) -> Result<Option<RequestMatch>, RouteError> {
        let found = self.parse(path, &*source)?;
        if self.settings.write_back {
            if let Some(found) = &found {
                *source.query_mut() = found.params.clone();
            }
        }
        Ok(found)
    }

    /// Build a URL for `path_group`, framed for the route mode.
    ///
    /// # Errors
    ///
    /// See [`RuleTable::build`].
    pub fn create_url(&self, path_group: &str, params: &Params) -> Result<String, RouteError> {
        let built = self
            .table
            .build(path_group, params, &self.settings.path_identifiers)?;
        let base = &self.settings.base_path;

        let mut url = match self.settings.route_mode {
            RouteMode::UrlRewrite | RouteMode::PathInfo => format!("{base}{}", built.path),
            RouteMode::Query => format!("{base}?{}={}", self.settings.query_key, built.path),
        };
        if !built.query.is_empty() {
            url.push(match self.settings.route_mode {
                RouteMode::Query => '&',
                RouteMode::UrlRewrite | RouteMode::PathInfo => '?',
            });
            url.push_str(&built.query);
        }
        Ok(url)
    }

    /// Next group in the fallback chain; see [`crate::parent_path_group`].
    #[must_use]
    pub fn parent_path_group(&self, path: &str) -> Option<String> {
        path_group::parent_path_group(path)
    }

    /// Parameters implied by a group under this router's path identifiers.
    #[must_use]
    pub fn path_params(&self, path_group: &str) -> Params {
        path_group::path_params(path_group, &self.settings.path_identifiers)
    }
}

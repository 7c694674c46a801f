//! Config types for file-driven router construction.
//!
//! [`RouterConfig`] mirrors [`RouterSettings`] plus the rule table and
//! deserializes from YAML or JSON:
//!
//! ```yaml
//! route_mode: urlrewrite      # urlrewrite | pathinfo | query
//! base_path: /
//! delimiter: "-"
//! rules:
//!   - group: product/view
//!     rules: ["product/<id>"]
//!   - rules: "<_controller>/<_action>/<*>"   # no group: the root group "*"
//! ```
//!
//! Every field has a default. Load with [`load_config`] and turn into a
//! router with [`Router::from_config`], which compiles eagerly so broken
//! rules fail at startup.

use crate::{RouteError, RouteMode, Router, RouterSettings, RuleEntry, RuleSettings, RuleTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Router configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Where the routed path comes from.
    pub route_mode: RouteMode,
    /// Query parameter holding the path in query mode.
    pub query_key: String,
    /// Prefix of every routed URL.
    pub base_path: String,
    /// Names bound to the segments of a path group.
    pub path_identifiers: Vec<String>,
    /// Whether matches replace the request's query parameters.
    pub write_back: bool,
    /// Delimiter between array items and pair tokens; one character.
    pub delimiter: String,
    /// Name the `<*>` shorthand expands to.
    pub pairs_identifier: String,
    /// Rule entries in priority order.
    pub rules: Vec<RuleEntryConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        let settings = RouterSettings::default();
        let rule_settings = RuleSettings::default();
        Self {
            route_mode: settings.route_mode,
            query_key: settings.query_key,
            base_path: settings.base_path,
            path_identifiers: settings.path_identifiers,
            write_back: settings.write_back,
            delimiter: rule_settings.delimiter.to_string(),
            pairs_identifier: rule_settings.pairs_identifier,
            rules: Vec::new(),
        }
    }
}

/// Configuration for one [`RuleEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntryConfig {
    /// Path group; omitted means the root group `*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// One rule or a list of rules.
    pub rules: RuleList,
}

/// A single rule string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleList {
    /// `rules: "product/<id>"`
    One(String),
    /// `rules: ["product/<id>", "p/<id>"]`
    Many(Vec<String>),
}

impl RuleList {
    /// The rules as a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(rule) => vec![rule.clone()],
            Self::Many(rules) => rules.clone(),
        }
    }
}

impl From<&RuleEntryConfig> for RuleEntry {
    fn from(config: &RuleEntryConfig) -> Self {
        match &config.group {
            Some(group) => RuleEntry::new(group.clone(), config.rules.to_vec()),
            None => RuleEntry::root(config.rules.to_vec()),
        }
    }
}

impl RouterConfig {
    /// Parse YAML.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidConfig`] on malformed input.
    pub fn from_yaml_str(text: &str) -> Result<Self, RouteError> {
        serde_yaml::from_str(text).map_err(|e| RouteError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Parse JSON.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidConfig`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, RouteError> {
        serde_json::from_str(text).map_err(|e| RouteError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Router-level settings.
    #[must_use]
    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            route_mode: self.route_mode,
            query_key: self.query_key.clone(),
            base_path: self.base_path.clone(),
            path_identifiers: self.path_identifiers.clone(),
            write_back: self.write_back,
        }
    }

    /// Validated grammar settings.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidDelimiter`] or [`RouteError::InvalidPairsIdentifier`].
    pub fn rule_settings(&self) -> Result<RuleSettings, RouteError> {
        RuleSettings::new(&self.delimiter, self.pairs_identifier.clone())
    }

    /// Rule entries in priority order.
    #[must_use]
    pub fn entries(&self) -> Vec<RuleEntry> {
        self.rules.iter().map(RuleEntry::from).collect()
    }
}

/// Load a config file: JSON when the extension is `.json`, YAML otherwise.
///
/// # Errors
///
/// [`RouteError::InvalidConfig`] if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> Result<RouterConfig, RouteError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| RouteError::InvalidConfig {
        reason: format!("{}: {e}", path.display()),
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        RouterConfig::from_json_str(&text)
    } else {
        RouterConfig::from_yaml_str(&text)
    };
    config.map_err(|e| match e {
        RouteError::InvalidConfig { reason } => RouteError::InvalidConfig {
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    })
}

impl Router {
    /// Build a router from configuration and compile its rules.
    ///
    /// # Errors
    ///
    /// Any configuration error: bad delimiter or pairs identifier, or a
    /// rule that does not compile.
    pub fn from_config(config: &RouterConfig) -> Result<Self, RouteError> {
        let mut table = RuleTable::with_settings(config.rule_settings()?)?;
        table.set_rules(config.entries());
        table.compile()?;
        tracing::debug!(
            route_mode = %config.route_mode,
            base_path = %config.base_path,
            entries = config.rules.len(),
            "router configured"
        );
        Ok(Router::new(config.router_settings(), table))
    }
}

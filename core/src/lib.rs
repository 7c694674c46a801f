//! ruta - rule-based URL routing engine
//!
//! Compiles human-authored route rules into anchored regular expressions,
//! matches request paths against a prioritized rule table, and builds URLs
//! back from a path group plus parameters.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`CompiledRule`]: one rule string compiled by the rule grammar
//!   (`product/<id>`, `<tags+,>-<*>.html`, ...)
//! - [`RuleTable`]: path group → ordered rules, compiled lazily once
//! - [`RuleTable::match_path`]: first-match-wins path → [`Params`]
//! - [`RuleTable::build`]: path group + [`Params`] → [`BuiltUrl`], with the
//!   parent-group fallback chain
//! - [`Router`]: route mode, base path and path identifiers on top of the table
//!
//! # Key Design Insights
//!
//! 1. **Compile once, read many**: rule compilation is the expensive step and
//!    happens at most once per table (`OnceLock`). Matching and building are
//!    pure functions over `&self`.
//!
//! 2. **No match is not an error**: [`RuleTable::match_path`] returns `None`
//!    when no rule applies. Only malformed configuration and unbuildable URLs
//!    are errors.
//!
//! 3. **Typed parameters**: [`ParameterValue`] distinguishes scalars, arrays,
//!    pairs and missing values instead of duck-typed bags.
//!
//! # Example
//!
//! ```
//! use ruta::prelude::*;
//!
//! let mut table = RuleTable::new();
//! table.append_rules([RuleEntry::new("product/view", ["product/<id>"])]);
//!
//! let router = Router::new(RouterSettings::default(), table);
//!
//! let found = router.parse(Some("product/42"), &Request::default()).unwrap().unwrap();
//! assert_eq!(found.params.get_str("id"), Some("42"));
//!
//! let url = router
//!     .create_url("product/view", &Params::new().with("id", 42))
//!     .unwrap();
//! assert_eq!(url, "/product/42");
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod builder;
mod encode;
mod matcher;
mod params;
mod path_group;
mod router;
mod rule;
mod rule_table;
mod trace;
mod url_builder;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use builder::BuiltUrl;
pub use matcher::RequestMatch;
pub use params::{ParameterValue, Params};
pub use path_group::{parent_path_group, path_params};
pub use router::{Request, RequestSource, RouteMode, Router, RouterSettings};
pub use rule::{ArrayParam, CompiledRule, ParamKind, ParameterSpec, RuleSettings};
pub use rule_table::{RuleEntry, RuleGroup, RuleTable};
pub use trace::{MatchStep, MatchTrace};
pub use url_builder::UrlBuilder;

#[cfg(feature = "config")]
pub use config::{load_config, RouterConfig, RuleEntryConfig, RuleList};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use ruta::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BuiltUrl, CompiledRule, ParameterValue, Params, Request, RequestMatch, RequestSource,
        RouteError, RouteMode, Router, RouterSettings, RuleEntry, RuleSettings, RuleTable,
        UrlBuilder,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Wildcard path group: the root of every parent chain and the home of
/// rules registered without a group.
pub const ROOT_GROUP: &str = "*";

/// Default delimiter between array items and pair tokens.
pub const DEFAULT_DELIMITER: char = '-';

/// Default name of the pairs parameter (`<*>` expands to `<_pairs>`).
pub const DEFAULT_PAIRS_IDENTIFIER: &str = "_pairs";

/// Maximum length of a single rule string.
///
/// Rules are compiled into regexes; very long rules are almost certainly
/// configuration mistakes and make compilation needlessly expensive.
pub const MAX_RULE_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule compilation, URL building and configuration loading.
///
/// Configuration errors (`InvalidRule`, `InvalidPattern`, `InvalidDelimiter`,
/// `InvalidPairsIdentifier`, `InvalidConfig`) are raised once when the table
/// compiles. Fix the configuration and rebuild the table.
///
/// A path that matches no rule is *not* an error: matching returns `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// A rule string violates the placeholder grammar.
    #[error("invalid rule \"{rule}\" at offset {offset}: {reason}")]
    InvalidRule {
        /// The rule as written.
        rule: String,
        /// Byte offset of the offending character.
        offset: usize,
        /// What went wrong.
        reason: String,
    },
    /// The regex assembled from a rule failed to compile.
    #[error("rule \"{rule}\" compiles to invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The rule as written.
        rule: String,
        /// The assembled regex.
        pattern: String,
        /// The regex engine's message.
        reason: String,
    },
    /// The delimiter is not exactly one usable character.
    #[error("invalid delimiter \"{delimiter}\": expected exactly one character other than '/', '<', '>'")]
    InvalidDelimiter {
        /// The rejected delimiter.
        delimiter: String,
    },
    /// The pairs identifier is not a usable parameter name.
    #[error("invalid pairs identifier \"{identifier}\": expected a non-empty word not starting with a digit")]
    InvalidPairsIdentifier {
        /// The rejected identifier.
        identifier: String,
    },
    /// No rule in the path group or any of its parents accepts the parameters.
    #[error("no rule can build a URL for path group \"{path_group}\"")]
    NoRouteBuildable {
        /// The path group the caller asked for.
        path_group: String,
    },
    /// A build parameter has the wrong shape for its placeholder.
    #[error("invalid build parameter \"{name}\": {reason}")]
    InvalidBuildParameter {
        /// The offending parameter name.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// A router configuration could not be read or deserialized.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
}

impl RouteError {
    /// Returns `true` for errors that indicate a broken configuration rather
    /// than a bad call.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidRule { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidDelimiter { .. }
                | Self::InvalidPairsIdentifier { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

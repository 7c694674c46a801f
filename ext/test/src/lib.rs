//! ruta-test: helpers for testing rule tables
//!
//! Provides a terse builder for routers and a round-trip check, plus (with
//! the `fixtures` feature) the YAML conformance fixture runner.
//!
//! # Example
//!
//! ```
//! use ruta_test::prelude::*;
//!
//! let router = TestRouter::new()
//!     .group("product/view", ["product/<id>"])
//!     .root(["<_controller>/<_action>"])
//!     .build();
//!
//! let found = round_trip(&router, "product/view", &Params::new().with("id", 7)).unwrap();
//! assert_eq!(found.params.get_str("id"), Some("7"));
//! ```

use ruta::prelude::*;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Terse router builder for tests.
///
/// Panics on invalid configuration, which is what a test wants.
#[derive(Debug, Clone, Default)]
pub struct TestRouter {
    settings: RouterSettings,
    delimiter: Option<String>,
    entries: Vec<RuleEntry>,
}

impl TestRouter {
    /// Start with default settings and no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rules for a path group (builder pattern).
    #[must_use]
    pub fn group<I, S>(mut self, group: &str, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.push(RuleEntry::new(group, rules));
        self
    }

    /// Add rules for the root group `*` (builder pattern).
    #[must_use]
    pub fn root<I, S>(self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group(ruta::ROOT_GROUP, rules)
    }

    /// Replace the router settings (builder pattern).
    #[must_use]
    pub fn settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the table delimiter (builder pattern).
    #[must_use]
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_owned());
        self
    }

    /// Build and compile the router.
    ///
    /// # Panics
    ///
    /// If the delimiter or any rule is invalid.
    #[must_use]
    pub fn build(self) -> Router {
        let mut table = RuleTable::new();
        if let Some(delimiter) = &self.delimiter {
            if let Err(e) = table.set_delimiter(delimiter) {
                panic!("test router delimiter: {e}");
            }
        }
        table.set_rules(self.entries);
        let router = Router::new(self.settings, table);
        if let Err(e) = router.compile() {
            panic!("test router does not compile: {e}");
        }
        router
    }
}

/// Build a URL for `group`, parse it back, and check that every scalar and
/// array parameter survives unchanged.
///
/// Returns the parse result, or a description of the first difference.
///
/// # Errors
///
/// A message naming the failing step or parameter.
pub fn round_trip(router: &Router, group: &str, params: &Params) -> Result<RequestMatch, String> {
    let url = router
        .create_url(group, params)
        .map_err(|e| format!("build {group}: {e}"))?;
    let found = router
        .parse(None, &Request::new(url.clone()))
        .map_err(|e| format!("parse {url}: {e}"))?
        .ok_or_else(|| format!("{url} matches no rule"))?;

    for (name, value) in params {
        let expected = match value {
            ParameterValue::Scalar(_) | ParameterValue::Array(_) => Some(value),
            ParameterValue::Pairs(_) | ParameterValue::Missing => None,
        };
        if let Some(expected) = expected {
            let actual = found.params.get(name);
            if actual != Some(expected) {
                return Err(format!(
                    "{url}: parameter \"{name}\" expected {expected}, got {actual:?}"
                ));
            }
        }
    }
    Ok(found)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{round_trip, TestRouter};
    pub use ruta::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_builder() {
        let router = TestRouter::new()
            .group("a/b", ["x/<id>"])
            .root(["<_controller>/<_action>"])
            .build();
        let groups = router.table().compile().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].name(), "*");
    }

    #[test]
    fn test_router_delimiter() {
        let router = TestRouter::new().delimiter(",").root(["t/<tags+>"]).build();
        assert_eq!(router.table().delimiter(), ',');
    }

    #[test]
    #[should_panic(expected = "does not compile")]
    fn test_router_panics_on_bad_rule() {
        let _ = TestRouter::new().root(["<oops"]).build();
    }

    #[test]
    fn round_trip_scalars_and_arrays() {
        let router = TestRouter::new().group("c/l", ["list/<cat>/<tags*,>"]).build();
        let params = Params::new().with("cat", "shoes").with("tags", ["red", "blue"]);
        assert!(round_trip(&router, "c/l", &params).is_ok());
    }

    #[test]
    fn round_trip_reports_lossy_rules() {
        // the item regex cannot carry a table delimiter back
        let router = TestRouter::new().group("c/l", ["list/<tags+,>"]).build();
        let params = Params::new().with("tags", ["dark-red"]);
        let err = round_trip(&router, "c/l", &params).unwrap_err();
        assert!(err.contains("matches no rule"), "{err}");
    }

    #[test]
    fn round_trip_reports_build_failure() {
        let router = TestRouter::new().group("c/l", ["list/<id>"]).build();
        let err = round_trip(&router, "c/l", &Params::new()).unwrap_err();
        assert!(err.starts_with("build c/l"), "{err}");
    }
}

//! `UrlBuilder`: fluent URL construction for templates and handlers.
//!
//! Typical use is "the current page, with one filter changed":
//!
//! ```
//! use ruta::prelude::*;
//!
//! let mut table = RuleTable::new();
//! table.set_rules([RuleEntry::root(["<_controller>/<_action>"])]);
//! let router = Router::new(RouterSettings::default(), table);
//!
//! let url = UrlBuilder::new("catalog/list")
//!     .with_params(Params::new().with("color", ["red"]).with("page", 3))
//!     .toggle_param("color", "blue")
//!     .remove_params(["page"])
//!     .build(&router)
//!     .unwrap();
//! assert_eq!(url, "/catalog/list?color%5B0%5D=red&color%5B1%5D=blue");
//! ```

use crate::encode::build_query;
use crate::{ParameterValue, Params, RequestMatch, RouteError, Router};

/// Builder for one URL: a path group (or literal path) plus parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBuilder {
    path: String,
    params: Params,
}

impl UrlBuilder {
    /// Start a URL for `path`: a path group such as `product/view`, or a
    /// literal path (anything containing `//` or `.`).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Params::new(),
        }
    }

    /// Start from a match: the group is rebuilt from the path identifiers,
    /// and every other matched parameter is carried over.
    #[must_use]
    pub fn from_match(found: &RequestMatch, path_identifiers: &[String]) -> Self {
        let segments: Option<Vec<&str>> = path_identifiers
            .iter()
            .map(|id| found.params.get_str(id))
            .collect();
        let path = match segments {
            Some(segments) if !segments.is_empty() => segments.join("/"),
            _ => found.group.clone(),
        };

        let mut params = found.params.clone();
        params.retain(|name, _| !path_identifiers.iter().any(|id| id == name));
        Self { path, params }
    }

    /// The path group or literal path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replace all parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Merge parameters. When either side is an array the values are
    /// unioned (no duplicates, original order first); otherwise the new
    /// value replaces the old one.
    #[must_use]
    pub fn add_params(mut self, params: impl IntoIterator<Item = (String, ParameterValue)>) -> Self {
        for (name, value) in params {
            let union = matches!(
                (self.params.get(&name), &value),
                (Some(ParameterValue::Array(_)), _)
                    | (Some(ParameterValue::Scalar(_)), ParameterValue::Array(_))
            );
            let merged = if union {
                let mut items = self.params.get(&name).map(values_of).unwrap_or_default();
                for item in values_of(&value) {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                ParameterValue::Array(items)
            } else {
                value
            };
            self.params.insert(name, merged);
        }
        self
    }

    /// Add `value` to `name`, or take it out if it is already there.
    #[must_use]
    pub fn toggle_param(self, name: &str, value: &str) -> Self {
        let present = self
            .params
            .get(name)
            .is_some_and(|v| values_of(v).iter().any(|item| item == value));
        if present {
            self.remove_values(name, [value])
        } else {
            self.add_params([(name.to_owned(), ParameterValue::from(value))])
        }
    }

    /// Remove parameters by name.
    #[must_use]
    pub fn remove_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.params.remove(name.as_ref());
        }
        self
    }

    /// Remove individual values from an array (or scalar) parameter,
    /// leaving the remaining items as an array.
    #[must_use]
    pub fn remove_values<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(current) = self.params.get(name) else {
            return self;
        };
        let unwanted: Vec<S> = values.into_iter().collect();
        let kept: Vec<String> = values_of(current)
            .into_iter()
            .filter(|item| !unwanted.iter().any(|u| u.as_ref() == item.as_str()))
            .collect();
        self.params.insert(name, kept);
        self
    }

    /// Keep only the named parameters.
    #[must_use]
    pub fn keep_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: Vec<S> = names.into_iter().collect();
        self.params
            .retain(|name, _| keep.iter().any(|k| k.as_ref() == name));
        self
    }

    /// Produce the URL.
    ///
    /// Literal paths get the parameters as a query string; relative literal
    /// paths (no leading `/`, no `//`) are prefixed with the base path.
    /// Anything else goes through [`Router::create_url`].
    ///
    /// # Errors
    ///
    /// See [`Router::create_url`].
    pub fn build(&self, router: &Router) -> Result<String, RouteError> {
        let includes_host = self.path.contains("//");
        if !includes_host && !self.path.contains('.') {
            return router.create_url(&self.path, &self.params);
        }

        let mut params = self.params.clone();
        params.retain(|_, v| !v.is_empty());
        let query = build_query(&params);

        let mut url = if includes_host || self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("{}{}", router.settings().base_path, self.path)
        };
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }
}

fn values_of(value: &ParameterValue) -> Vec<String> {
    match value {
        ParameterValue::Scalar(s) => vec![s.clone()],
        ParameterValue::Array(items) => items.clone(),
        ParameterValue::Pairs(pairs) => pairs.iter().map(|(_, v)| v.clone()).collect(),
        ParameterValue::Missing => Vec::new(),
    }
}

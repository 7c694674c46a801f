//! Matcher: first-match-wins request path → parameters.
//!
//! Groups are tried in table order and rules in group order. The first rule
//! whose pattern matches the whole path wins; its captures are decoded on
//! top of the ambient parameters:
//!
//! 1. array and pairs captures (non-empty spans only)
//! 2. scalar captures that participated (empty strings included)
//! 3. parameters implied by the winning group
//!
//! Later steps overwrite earlier ones, so the precedence is
//! group > scalar captures > pairs/arrays > ambient.
//!
//! A path that matches nothing is `None`, never an error.

use crate::path_group::path_params;
use crate::{ArrayParam, CompiledRule, Params, RouteError, RuleTable};
use regex::Captures;

/// The outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMatch {
    /// Ambient parameters overlaid with everything the route implies.
    pub params: Params,
    /// Path group of the winning rule.
    pub group: String,
    /// Position of the winning rule inside its group.
    pub rule_index: usize,
}

impl RuleTable {
    /// Match `path` (no leading slash, already percent-decoded) against
    /// the table.
    ///
    /// `ambient` seeds the result; `path_identifiers` name the parameters
    /// implied by the winning group's segments.
    ///
    /// # Errors
    ///
    /// Only configuration errors from compiling the table. No match is
    /// `Ok(None)`.
    ///
    /// # Example
    ///
    /// ```
    /// use ruta::{Params, RuleEntry, RuleTable};
    ///
    /// let mut table = RuleTable::new();
    /// table.set_rules([RuleEntry::new("catalog/list", ["list/<tags+>"])]);
    ///
    /// let ids = vec!["_controller".to_string(), "_action".to_string()];
    /// let found = table
    ///     .match_path("list/red-blue", &Params::new(), &ids)
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(found.params.get_array("tags").unwrap(), ["red", "blue"]);
    /// assert_eq!(found.params.get_str("_action"), Some("list"));
    /// ```
    pub fn match_path(
        &self,
        path: &str,
        ambient: &Params,
        path_identifiers: &[String],
    ) -> Result<Option<RequestMatch>, RouteError> {
        for group in self.compile()? {
            for (rule_index, rule) in group.rules().iter().enumerate() {
                let Some(captures) = rule.pattern().captures(path) else {
                    tracing::trace!(group = group.name(), rule = rule.rule(), path, "no match");
                    continue;
                };
                tracing::trace!(group = group.name(), rule = rule.rule(), path, "matched");
                return Ok(Some(RequestMatch {
                    params: extract_params(rule, &captures, ambient, group.name(), path_identifiers),
                    group: group.name().to_owned(),
                    rule_index,
                }));
            }
        }
        Ok(None)
    }
}

/// Decode a successful match into parameters.
pub(crate) fn extract_params(
    rule: &CompiledRule,
    captures: &Captures<'_>,
    ambient: &Params,
    group: &str,
    path_identifiers: &[String],
) -> Params {
    let mut params = ambient.clone();

    for (name, array) in rule.array_params() {
        let Some(span) = captures.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let items = array
            .item_regex
            .find_iter(span)
            .map(|m| m.as_str())
            .filter(|item| !item.is_empty());

        if array.key_regex.is_some() {
            for (key, value) in items.filter_map(|token| split_pair(array, token)) {
                params.insert(key, value);
            }
        } else {
            params.insert(name.clone(), items.map(str::to_owned).collect::<Vec<_>>());
        }
    }

    for spec in rule.params().iter().filter(|p| !p.kind.is_array()) {
        if let Some(m) = captures.name(&spec.name) {
            params.insert(spec.name.clone(), m.as_str());
        }
    }

    params.merge(&path_params(group, path_identifiers));
    params
}

/// Split a `key<delim>value` token. The key is the first match of the key
/// regex; the value is whatever follows the key and one delimiter.
fn split_pair<'t>(array: &ArrayParam, token: &'t str) -> Option<(&'t str, &'t str)> {
    let key = array.key_regex.as_ref()?.find(token)?;
    if key.as_str().is_empty() {
        return None;
    }
    let value = token
        .get(key.end() + array.delimiter.len_utf8()..)
        .unwrap_or("");
    Some((key.as_str(), value))
}

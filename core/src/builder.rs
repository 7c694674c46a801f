//! Builder: path group + parameters → URL, walking the parent-group chain.
//!
//! For each group in the chain (`a/b/c`, `a/b/*`, ..., `*`) every rule is
//! tried in order. A rule is usable when all its required parameters are
//! present; path identifiers and the pairs parameter are exempt from that
//! check. Parameters the rule does not declare either feed the pairs
//! placeholder (when the name is a valid pair key) or the query string.

use crate::encode::{build_query, encode_component};
use crate::path_group::{path_group_chain, path_params};
use crate::rule::TemplatePart;
use crate::{CompiledRule, ParamKind, ParameterSpec, ParameterValue, Params, RouteError, RuleTable};
use std::fmt;

/// A URL produced by [`RuleTable::build`], before route-mode framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltUrl {
    /// The substituted template, percent-encoded, without a leading slash.
    pub path: String,
    /// Leftover parameters as an encoded query string (may be empty).
    pub query: String,
    /// The group whose rule built the URL.
    pub group: String,
}

impl fmt::Display for BuiltUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query)
        }
    }
}

impl RuleTable {
    /// Build a URL for `path_group` from `params`.
    ///
    /// `Missing` values and empty arrays or pairs are ignored. Parameters
    /// implied by `path_group` (see [`crate::path_params`]) fill their
    /// placeholders ahead of caller values.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NoRouteBuildable`] if no rule in the chain accepts the parameters
    /// - [`RouteError::InvalidBuildParameter`] if the chosen rule gets a value of the wrong shape
    /// - configuration errors from compiling the table
    ///
    /// # Example
    ///
    /// ```
    /// use ruta::{Params, RuleEntry, RuleTable};
    ///
    /// let mut table = RuleTable::new();
    /// table.set_rules([RuleEntry::root(["<_controller>/<_action>/<*>"])]);
    ///
    /// let ids = vec!["_controller".to_string(), "_action".to_string()];
    /// let url = table
    ///     .build("news/list", &Params::new().with("page", 2), &ids)
    ///     .unwrap();
    /// assert_eq!(url.to_string(), "news/list/page-2");
    /// ```
    pub fn build(
        &self,
        path_group: &str,
        params: &Params,
        path_identifiers: &[String],
    ) -> Result<BuiltUrl, RouteError> {
        let groups = self.compile()?;

        let mut params = params.clone();
        params.retain(|_, value| !value.is_empty());
        let implied = path_params(path_group, path_identifiers);

        for name in path_group_chain(path_group) {
            let Some(group) = groups.iter().find(|g| g.name() == name) else {
                continue;
            };
            for rule in group.rules() {
                let built = build_with_rule(rule, &params, &implied, path_identifiers)?;
                if let Some((path, query)) = built {
                    return Ok(BuiltUrl {
                        path,
                        query,
                        group: name,
                    });
                }
                tracing::trace!(group = %name, rule = rule.rule(), "rule cannot build, trying next");
            }
        }

        tracing::debug!(path_group, "no rule can build a URL");
        Err(RouteError::NoRouteBuildable {
            path_group: path_group.to_owned(),
        })
    }
}

/// Try one rule. `Ok(None)` means the rule does not apply.
fn build_with_rule(
    rule: &CompiledRule,
    params: &Params,
    implied: &Params,
    path_identifiers: &[String],
) -> Result<Option<(String, String)>, RouteError> {
    let pairs = rule.pairs_param();
    let pairs_name = pairs.map(|p| p.name.as_str());

    let satisfied = rule.required_params().iter().all(|name| {
        params.contains(name) || Some(name.as_str()) == pairs_name || path_identifiers.contains(name)
    });
    if !satisfied {
        return Ok(None);
    }

    let key_matcher = pairs_name.and_then(|name| rule.array_param(name));
    let mut bucket: Vec<(String, String)> = match pairs_name.and_then(|name| params.get(name)) {
        Some(ParameterValue::Pairs(given)) => given.clone(),
        _ => Vec::new(),
    };
    let mut query = Params::new();

    for (name, value) in params {
        if rule.declares(name) {
            continue;
        }
        if key_matcher.is_some_and(|m| m.is_pair_key(name)) {
            match value {
                ParameterValue::Scalar(v) => bucket.push((name.clone(), v.clone())),
                other => {
                    return Err(RouteError::InvalidBuildParameter {
                        name: name.clone(),
                        reason: format!("pair values must be scalars, got {}", other.kind_name()),
                    });
                }
            }
        } else {
            query.insert(name.clone(), value.clone());
        }
    }

    if bucket.is_empty() && pairs.is_some_and(|p| p.kind.is_required()) {
        return Ok(None);
    }

    let mut path = String::new();
    for part in rule.parts() {
        match part {
            TemplatePart::Literal(text) => path.push_str(text),
            TemplatePart::Param(name) => {
                let Some(spec) = rule.param(name) else {
                    continue;
                };
                let value = implied.get(name).or_else(|| params.get(name));
                path.push_str(&render(spec, value, &bucket)?);
            }
        }
    }

    Ok(Some((path, build_query(&query))))
}

fn render(
    spec: &ParameterSpec,
    value: Option<&ParameterValue>,
    bucket: &[(String, String)],
) -> Result<String, RouteError> {
    let delimiter = spec.delimiter.to_string();
    let mismatch = |expected: &str, got: &ParameterValue| RouteError::InvalidBuildParameter {
        name: spec.name.clone(),
        reason: format!("expected {expected}, got {}", got.kind_name()),
    };

    match spec.kind {
        ParamKind::Pairs { .. } => match value {
            None | Some(ParameterValue::Missing | ParameterValue::Pairs(_)) => Ok(bucket
                .iter()
                .flat_map(|(k, v)| [encode_component(k), encode_component(v)])
                .collect::<Vec<_>>()
                .join(&delimiter)),
            Some(other) => Err(mismatch("pairs", other)),
        },
        ParamKind::RequiredArray | ParamKind::OptionalArray => match value {
            None | Some(ParameterValue::Missing) => Ok(String::new()),
            Some(ParameterValue::Array(items)) => Ok(items
                .iter()
                .map(|item| encode_component(item))
                .collect::<Vec<_>>()
                .join(&delimiter)),
            Some(other) => Err(mismatch("an array", other)),
        },
        ParamKind::RequiredScalar | ParamKind::OptionalScalar => match value {
            None | Some(ParameterValue::Missing) => Ok(String::new()),
            Some(ParameterValue::Scalar(s)) => Ok(encode_component(s)),
            Some(other) => Err(mismatch("a scalar", other)),
        },
    }
}

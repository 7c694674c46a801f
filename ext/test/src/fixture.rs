//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the ruta engine. A fixture is a
//! router configuration plus parse, build and round-trip cases:
//!
//! ```yaml
//! name: product_view
//! description: scalar round trip
//! router:
//!   rules:
//!     - group: product/view
//!       rules: ["product/<id>"]
//! parse:
//!   - name: hit
//!     path: product/42
//!     expect:
//!       group: product/view
//!       params: { id: "42" }
//!   - name: miss
//!     path: nope
//!     expect: null
//! build:
//!   - name: direct
//!     group: product/view
//!     params: { id: 42 }
//!     expect: /product/42
//! ```

use crate::round_trip;
use ruta::prelude::*;
use ruta::RouterConfig;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub router: RouterConfig,
    #[serde(default)]
    pub parse: Vec<ParseCase>,
    #[serde(default)]
    pub build: Vec<BuildCase>,
    #[serde(default)]
    pub round_trip: Vec<RoundTripCase>,
}

/// Parse case: a path (or request URI) and the expected match
#[derive(Debug, Deserialize)]
pub struct ParseCase {
    pub name: String,
    /// Explicit path; when absent the path comes from `uri`
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default)]
    pub script_name: String,
    /// `null` expects no match
    pub expect: Option<ParseExpect>,
}

fn default_uri() -> String {
    "/".to_owned()
}

/// Expected match. Only listed params are compared.
#[derive(Debug, Deserialize)]
pub struct ParseExpect {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub rule_index: Option<usize>,
    #[serde(default)]
    pub params: Mapping,
    /// Names that must not be present
    #[serde(default)]
    pub absent: Vec<String>,
}

/// Build case: a path group and params, and the expected URL or error
#[derive(Debug, Deserialize)]
pub struct BuildCase {
    pub name: String,
    pub group: String,
    #[serde(default)]
    pub params: Mapping,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub error: Option<ExpectedError>,
}

/// Expected build failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedError {
    NoRoute,
    InvalidParameter,
}

/// Round-trip case: build, then parse back
#[derive(Debug, Deserialize)]
pub struct RoundTripCase {
    pub name: String,
    pub group: String,
    #[serde(default)]
    pub params: Mapping,
}

// ═══════════════════════════════════════════════════════════════════════════════
// YAML → ruta values
// ═══════════════════════════════════════════════════════════════════════════════

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_text(key: &Value) -> String {
    scalar_text(key).unwrap_or_else(|| format!("{key:?}"))
}

/// Convert a YAML value: scalars, lists of scalars, maps (pairs), `null` (missing)
fn to_parameter_value(value: &Value) -> ParameterValue {
    match value {
        Value::Null => ParameterValue::Missing,
        Value::Sequence(items) => ParameterValue::Array(
            items
                .iter()
                .map(|v| scalar_text(v).unwrap_or_default())
                .collect(),
        ),
        Value::Mapping(map) => ParameterValue::Pairs(
            map.iter()
                .map(|(k, v)| (key_text(k), scalar_text(v).unwrap_or_default()))
                .collect(),
        ),
        other => ParameterValue::Scalar(scalar_text(other).unwrap_or_default()),
    }
}

/// Convert a YAML mapping into ordered params
pub fn to_params(map: &Mapping) -> Params {
    map.iter()
        .map(|(k, v)| (key_text(k), to_parameter_value(v)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl CaseResult {
    fn compare(case_name: &str, expected: String, actual: String) -> Self {
        Self {
            case_name: case_name.to_owned(),
            passed: expected == actual,
            expected,
            actual,
        }
    }
}

impl ParseCase {
    fn run(&self, router: &Router) -> CaseResult {
        let request = Request::new(self.uri.clone()).with_script_name(self.script_name.clone());
        let found = match router.parse(self.path.as_deref(), &request) {
            Ok(found) => found,
            Err(e) => {
                return CaseResult::compare(&self.name, "parse result".into(), format!("error: {e}"))
            }
        };

        match (&self.expect, found) {
            (None, None) => CaseResult::compare(&self.name, "no match".into(), "no match".into()),
            (None, Some(found)) => {
                CaseResult::compare(&self.name, "no match".into(), format!("{found:?}"))
            }
            (Some(_), None) => CaseResult::compare(&self.name, "a match".into(), "no match".into()),
            (Some(expect), Some(found)) => expect.check(&self.name, &found),
        }
    }
}

impl ParseExpect {
    fn check(&self, case_name: &str, found: &RequestMatch) -> CaseResult {
        if let Some(group) = &self.group {
            if *group != found.group {
                return CaseResult::compare(case_name, format!("group {group}"), format!("group {}", found.group));
            }
        }
        if let Some(index) = self.rule_index {
            if index != found.rule_index {
                return CaseResult::compare(
                    case_name,
                    format!("rule {index}"),
                    format!("rule {}", found.rule_index),
                );
            }
        }
        for (name, expected) in &to_params(&self.params) {
            let actual = found.params.get(name);
            if actual != Some(expected) {
                return CaseResult::compare(
                    case_name,
                    format!("{name} = {expected:?}"),
                    format!("{name} = {actual:?}"),
                );
            }
        }
        for name in &self.absent {
            if let Some(value) = found.params.get(name) {
                return CaseResult::compare(
                    case_name,
                    format!("{name} absent"),
                    format!("{name} = {value:?}"),
                );
            }
        }
        CaseResult::compare(case_name, "ok".into(), "ok".into())
    }
}

impl BuildCase {
    fn run(&self, router: &Router) -> CaseResult {
        let expected = match (&self.expect, self.error) {
            (Some(url), _) => url.clone(),
            (None, Some(error)) => format!("{error:?}"),
            (None, None) => "an expectation".into(),
        };
        let actual = match router.create_url(&self.group, &to_params(&self.params)) {
            Ok(url) => url,
            Err(RouteError::NoRouteBuildable { .. }) => format!("{:?}", ExpectedError::NoRoute),
            Err(RouteError::InvalidBuildParameter { .. }) => {
                format!("{:?}", ExpectedError::InvalidParameter)
            }
            Err(e) => format!("error: {e}"),
        };
        CaseResult::compare(&self.name, expected, actual)
    }
}

impl RoundTripCase {
    fn run(&self, router: &Router) -> CaseResult {
        let actual = match round_trip(router, &self.group, &to_params(&self.params)) {
            Ok(_) => "ok".to_owned(),
            Err(e) => e,
        };
        CaseResult::compare(&self.name, "ok".into(), actual)
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    ///
    /// # Errors
    ///
    /// If the fixture's router configuration is invalid.
    pub fn run(&self) -> Result<Vec<CaseResult>, RouteError> {
        let router = Router::from_config(&self.router)?;
        let parse = self.parse.iter().map(|case| case.run(&router));
        let build = self.build.iter().map(|case| case.run(&router));
        let round_trip = self.round_trip.iter().map(|case| case.run(&router));
        Ok(parse.chain(build).chain(round_trip).collect())
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = match self.run() {
            Ok(results) => results,
            Err(e) => panic!("Fixture '{}' has an invalid router: {e}", self.name),
        };
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: inline
router:
  rules:
    - group: product/view
      rules: ["product/<id>"]
parse:
  - name: hit
    path: product/42
    expect:
      group: product/view
      params: { id: "42", _action: view }
  - name: miss
    path: nope
    expect: null
build:
  - name: direct
    group: product/view
    params: { id: 42 }
    expect: /product/42
  - name: missing id
    group: product/view
    error: no_route
round_trip:
  - name: id
    group: product/view
    params: { id: abc }
"#;

    #[test]
    fn inline_fixture_passes() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        let results = fixture.run().unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn failing_case_is_reported() {
        let yaml = FIXTURE.replace("expect: /product/42", "expect: /product/43");
        let fixture = Fixture::from_yaml(&yaml).unwrap();
        let failed: Vec<_> = fixture
            .run()
            .unwrap()
            .into_iter()
            .filter(|r| !r.passed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].case_name, "direct");
        assert_eq!(failed[0].actual, "/product/42");
    }

    #[test]
    fn yaml_values_convert() {
        let map: Mapping = serde_yaml::from_str(
            "{ n: 3, s: x, b: true, list: [a, 1], pairs: { k: v }, gone: null }",
        )
        .unwrap();
        let params = to_params(&map);
        assert_eq!(params.get_str("n"), Some("3"));
        assert_eq!(params.get_str("b"), Some("true"));
        assert_eq!(params.get_array("list").unwrap(), ["a", "1"]);
        assert_eq!(
            params.get("pairs"),
            Some(&ParameterValue::Pairs(vec![("k".into(), "v".into())]))
        );
        assert_eq!(params.get("gone"), Some(&ParameterValue::Missing));
        assert_eq!(params.names().collect::<Vec<_>>(), ["n", "s", "b", "list", "pairs", "gone"]);
    }
}

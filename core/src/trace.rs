//! Match trace types for debugging routing decisions.
//!
//! [`RuleTable::trace`] runs the same first-match-wins walk as
//! [`RuleTable::match_path`] but records every rule it tried, so a
//! misbehaving rule table can be inspected without a debugger.
//!
//! # Example
//!
//! ```
//! use ruta::{Params, RuleEntry, RuleTable};
//!
//! let mut table = RuleTable::new();
//! table.set_rules([RuleEntry::new("a/b", ["x/<id>", "y/<id>"])]);
//!
//! let trace = table.trace("y/1", &Params::new(), &[]).unwrap();
//! assert_eq!(trace.steps.len(), 2);
//! assert!(!trace.steps[0].matched);
//! assert!(trace.steps[1].matched);
//! assert_eq!(trace.result.unwrap().rule_index, 1);
//! ```

use crate::matcher::extract_params;
use crate::{Params, RequestMatch, RouteError, RuleTable};
use std::fmt;

/// Trace of one match run.
///
/// The `result` field always equals what [`RuleTable::match_path`] returns
/// for the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTrace {
    /// The path that was matched.
    pub path: String,
    /// The final result (identical to what `match_path()` returns).
    pub result: Option<RequestMatch>,
    /// Every rule tried, in order. Stops after the first match.
    pub steps: Vec<MatchStep>,
}

/// One rule attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStep {
    /// Path group of the rule.
    pub group: String,
    /// Position of the rule inside its group.
    pub rule_index: usize,
    /// The rule as written.
    pub rule: String,
    /// The compiled regex.
    pub pattern: String,
    /// Did the pattern match?
    pub matched: bool,
}

impl fmt::Display for MatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.matched { "match" } else { "-" };
        write!(
            f,
            "[{}#{}] {} ({}) {mark}",
            self.group, self.rule_index, self.rule, self.pattern
        )
    }
}

impl RuleTable {
    /// Match `path` like [`RuleTable::match_path`], recording each attempt.
    ///
    /// # Errors
    ///
    /// Only configuration errors from compiling the table.
    pub fn trace(
        &self,
        path: &str,
        ambient: &Params,
        path_identifiers: &[String],
    ) -> Result<MatchTrace, RouteError> {
        let mut steps = Vec::new();

        for group in self.compile()? {
            for (rule_index, rule) in group.rules().iter().enumerate() {
                let captures = rule.pattern().captures(path);
                steps.push(MatchStep {
                    group: group.name().to_owned(),
                    rule_index,
                    rule: rule.rule().to_owned(),
                    pattern: rule.pattern().as_str().to_owned(),
                    matched: captures.is_some(),
                });
                if let Some(captures) = captures {
                    let params =
                        extract_params(rule, &captures, ambient, group.name(), path_identifiers);
                    return Ok(MatchTrace {
                        path: path.to_owned(),
                        result: Some(RequestMatch {
                            params,
                            group: group.name().to_owned(),
                            rule_index,
                        }),
                        steps,
                    });
                }
            }
        }

        Ok(MatchTrace {
            path: path.to_owned(),
            result: None,
            steps,
        })
    }
}

//! `RuleTable`: path group → ordered rules, compiled lazily once.
//!
//! Rules are registered as [`RuleEntry`] values and compiled on first use
//! (or eagerly with [`RuleTable::compile`]). The compiled form is cached in
//! a `OnceLock`; every mutation takes `&mut self` and resets the cache, so a
//! shared `&RuleTable` never observes a half-compiled state.

use crate::rule::parse_delimiter;
use crate::{CompiledRule, RouteError, RuleSettings, ROOT_GROUP};
use std::sync::OnceLock;

/// One registration: a path group and the rules that serve it.
///
/// An empty or all-digit group name means the root group `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleEntry {
    /// Path group, e.g. `product/view`.
    pub group: String,
    /// Rule strings in priority order.
    pub rules: Vec<String>,
}

impl RuleEntry {
    /// Create an entry for `group`.
    pub fn new<I, S>(group: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: group.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an entry for the root group `*`.
    pub fn root<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ROOT_GROUP, rules)
    }

    /// The group name after normalization.
    #[must_use]
    pub fn normalized_group(&self) -> &str {
        if self.group.is_empty() || self.group.bytes().all(|b| b.is_ascii_digit()) {
            ROOT_GROUP
        } else {
            &self.group
        }
    }
}

/// A compiled group: its name and its rules in priority order.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    name: String,
    rules: Vec<CompiledRule>,
}

impl RuleGroup {
    /// The path group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Add a rule, replacing an earlier rule with the same pattern in place.
    fn push(&mut self, rule: CompiledRule) {
        let existing = self
            .rules
            .iter_mut()
            .find(|r| r.pattern().as_str() == rule.pattern().as_str());
        match existing {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
    }
}

/// The ordered rule table.
///
/// # Example
///
/// ```
/// use ruta::{RuleEntry, RuleTable};
///
/// let mut table = RuleTable::new();
/// table
///     .append_rules([RuleEntry::new("product/view", ["product/<id>"])])
///     .prepend_rules([RuleEntry::root(["<_controller>/<_action>"])]);
///
/// let groups = table.compile().unwrap();
/// assert_eq!(groups[0].name(), "*");
/// assert_eq!(groups[1].rules()[0].url_template(), "product/<id>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    settings: RuleSettings,
    entries: Vec<RuleEntry>,
    compiled: OnceLock<Result<Vec<RuleGroup>, RouteError>>,
}

impl RuleTable {
    /// Create an empty table with the default delimiter and pairs identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with custom grammar settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail [`RuleSettings::validate`].
    pub fn with_settings(settings: RuleSettings) -> Result<Self, RouteError> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    /// Grammar settings.
    #[must_use]
    pub fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    /// Table delimiter.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.settings.delimiter
    }

    /// Pairs identifier.
    #[must_use]
    pub fn pairs_identifier(&self) -> &str {
        &self.settings.pairs_identifier
    }

    /// Registered entries, uncompiled, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Set the delimiter; it must be exactly one character.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidDelimiter`] otherwise.
    pub fn set_delimiter(&mut self, delimiter: &str) -> Result<&mut Self, RouteError> {
        self.settings.delimiter = parse_delimiter(delimiter)?;
        self.invalidate();
        Ok(self)
    }

    /// Set the name the `<*>` shorthand expands to.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPairsIdentifier`] for an unusable name.
    pub fn set_pairs_identifier(
        &mut self,
        identifier: impl Into<String>,
    ) -> Result<&mut Self, RouteError> {
        let settings = RuleSettings {
            pairs_identifier: identifier.into(),
            ..self.settings.clone()
        };
        settings.validate()?;
        self.settings = settings;
        self.invalidate();
        Ok(self)
    }

    /// Replace all rules.
    pub fn set_rules(&mut self, entries: impl IntoIterator<Item = RuleEntry>) -> &mut Self {
        self.entries = entries.into_iter().collect();
        self.invalidate();
        self
    }

    /// Add rules after the existing ones.
    pub fn append_rules(&mut self, entries: impl IntoIterator<Item = RuleEntry>) -> &mut Self {
        self.entries.extend(entries);
        self.invalidate();
        self
    }

    /// Add rules ahead of the existing ones; they are tried first.
    pub fn prepend_rules(&mut self, entries: impl IntoIterator<Item = RuleEntry>) -> &mut Self {
        let mut merged: Vec<RuleEntry> = entries.into_iter().collect();
        merged.append(&mut self.entries);
        self.entries = merged;
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.compiled = OnceLock::new();
    }

    /// Compile every rule (once) and return the groups in table order.
    ///
    /// Later calls return the cached result, including a cached error.
    ///
    /// # Errors
    ///
    /// The first configuration error encountered while compiling.
    pub fn compile(&self) -> Result<&[RuleGroup], RouteError> {
        self.compiled
            .get_or_init(|| compile_entries(&self.entries, &self.settings))
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Look up a compiled group by name.
    ///
    /// # Errors
    ///
    /// See [`RuleTable::compile`].
    pub fn group(&self, name: &str) -> Result<Option<&RuleGroup>, RouteError> {
        Ok(self.compile()?.iter().find(|g| g.name == name))
    }
}

fn compile_entries(
    entries: &[RuleEntry],
    settings: &RuleSettings,
) -> Result<Vec<RuleGroup>, RouteError> {
    let mut groups: Vec<RuleGroup> = Vec::new();
    let mut rule_count = 0;

    for entry in entries {
        let name = entry.normalized_group();
        let index = match groups.iter().position(|g| g.name == name) {
            Some(i) => i,
            None => {
                groups.push(RuleGroup {
                    name: name.to_owned(),
                    rules: Vec::with_capacity(entry.rules.len()),
                });
                groups.len() - 1
            }
        };
        for rule in &entry.rules {
            let compiled = CompiledRule::compile(rule, settings).inspect_err(|e| {
                tracing::debug!(group = name, error = %e, "rule failed to compile");
            })?;
            groups[index].push(compiled);
            rule_count += 1;
        }
    }

    tracing::debug!(
        groups = groups.len(),
        rules = rule_count,
        delimiter = %settings.delimiter,
        "compiled rule table"
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(group: &RuleGroup) -> Vec<&str> {
        group.rules().iter().map(CompiledRule::url_template).collect()
    }

    #[test]
    fn unnamed_groups_normalize_to_root() {
        assert_eq!(RuleEntry::new("", ["a"]).normalized_group(), "*");
        assert_eq!(RuleEntry::new("0", ["a"]).normalized_group(), "*");
        assert_eq!(RuleEntry::new("a/b", ["a"]).normalized_group(), "a/b");
    }

    #[test]
    fn same_group_merges_at_first_position() {
        let mut table = RuleTable::new();
        table.set_rules([
            RuleEntry::root(["<_controller>"]),
            RuleEntry::new("x/y", ["x/<id>"]),
            RuleEntry::new("", ["<_controller>/<_action>"]),
        ]);

        let groups = table.compile().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name(), "*");
        assert_eq!(templates(&groups[0]), ["<_controller>", "<_controller>/<_action>"]);
        assert_eq!(groups[1].name(), "x/y");
    }

    #[test]
    fn identical_pattern_replaces_in_place() {
        let mut table = RuleTable::new();
        table.set_rules([RuleEntry::new("g", ["a/<x>", "b", "a/<y>"])]);

        let groups = table.compile().unwrap();
        assert_eq!(templates(&groups[0]), ["a/<y>", "b"]);
    }

    #[test]
    fn prepend_puts_rules_first() {
        let mut table = RuleTable::new();
        table.append_rules([RuleEntry::new("g", ["late"])]);
        table.prepend_rules([RuleEntry::new("g", ["early"])]);

        let group = table.group("g").unwrap().unwrap();
        assert_eq!(templates(group), ["early", "late"]);
    }

    #[test]
    fn mutation_resets_cache() {
        let mut table = RuleTable::new();
        table.set_rules([RuleEntry::root(["a"])]);
        assert_eq!(table.compile().unwrap().len(), 1);

        table.append_rules([RuleEntry::new("g", ["b"])]);
        assert_eq!(table.compile().unwrap().len(), 2);
    }

    #[test]
    fn compile_error_is_cached() {
        let mut table = RuleTable::new();
        table.set_rules([RuleEntry::root(["<broken"])]);
        let first = table.compile().unwrap_err();
        let second = table.compile().unwrap_err();
        assert_eq!(first, second);
        assert!(first.is_configuration());
    }

    #[test]
    fn delimiter_change_recompiles() {
        let mut table = RuleTable::new();
        table.set_rules([RuleEntry::root(["<tags+>"])]);
        assert_eq!(table.compile().unwrap()[0].rules()[0].params()[0].delimiter, '-');

        table.set_delimiter(",").unwrap();
        assert_eq!(table.compile().unwrap()[0].rules()[0].params()[0].delimiter, ',');
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut table = RuleTable::new();
        assert!(matches!(
            table.set_delimiter("ab"),
            Err(RouteError::InvalidDelimiter { .. })
        ));
        assert!(matches!(
            table.set_pairs_identifier(""),
            Err(RouteError::InvalidPairsIdentifier { .. })
        ));
        assert_eq!(table.delimiter(), '-');
        assert_eq!(table.pairs_identifier(), "_pairs");
    }

    #[test]
    fn custom_pairs_identifier() {
        let mut table = RuleTable::new();
        table.set_pairs_identifier("_p").unwrap();
        table.set_rules([RuleEntry::root(["<*>"])]);
        let rule = &table.compile().unwrap()[0].rules()[0];
        assert_eq!(rule.url_template(), "<_p>");
    }
}

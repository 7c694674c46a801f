//! Rule grammar: route rule strings compiled into [`CompiledRule`]s.
//!
//! A rule is literal text interleaved with placeholders:
//!
//! | Placeholder | Kind | Example match (`-` delimiter) |
//! |-------------|------|-------------------------------|
//! | `<id>` | required scalar | `42` |
//! | `<id:\d+>` | required scalar, custom regex | `42` |
//! | `<page?>` | optional scalar | `` or `3` |
//! | `<tags+>` | required array | `red-blue` |
//! | `<tags*,>` | optional array, `,` delimiter | `red,blue` |
//! | `<attrs*::\w+>` | optional array, `:` delimiter, item regex | `round:red` |
//! | `<*>` | pairs | `color-red-size-10` |
//!
//! Grammar, parsed by a single-pass tokenizer:
//!
//! ```text
//! placeholder := '<' name [sigil [delim]] [':' regex] '>'
//! name        := word-char+ | '*'         ('*' is the pairs identifier)
//! sigil       := '?' | '+' | '*'
//! delim       := any char but '>'         (':' only when followed by ':' or '>')
//! ```
//!
//! A `<` that is not followed by a name character or `*` is literal text.
//! Literal text is matched verbatim and case-insensitively.

use crate::{RouteError, DEFAULT_DELIMITER, DEFAULT_PAIRS_IDENTIFIER, MAX_RULE_LENGTH};
use regex::{Regex, RegexBuilder};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════════════════

/// Table-wide grammar settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleSettings {
    /// Default delimiter between array items and pair tokens.
    pub delimiter: char,
    /// Name the `<*>` shorthand expands to.
    pub pairs_identifier: String,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            pairs_identifier: DEFAULT_PAIRS_IDENTIFIER.to_owned(),
        }
    }
}

impl RuleSettings {
    /// Create validated settings from a one-character delimiter string.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidDelimiter`] unless `delimiter` is exactly
    /// one character, or [`RouteError::InvalidPairsIdentifier`] for an
    /// unusable identifier.
    pub fn new(delimiter: &str, pairs_identifier: impl Into<String>) -> Result<Self, RouteError> {
        let settings = Self {
            delimiter: parse_delimiter(delimiter)?,
            pairs_identifier: pairs_identifier.into(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check the delimiter and pairs identifier.
    ///
    /// # Errors
    ///
    /// See [`RuleSettings::new`].
    pub fn validate(&self) -> Result<(), RouteError> {
        if matches!(self.delimiter, '/' | '<' | '>') {
            return Err(RouteError::InvalidDelimiter {
                delimiter: self.delimiter.to_string(),
            });
        }
        if !is_valid_name(&self.pairs_identifier) {
            return Err(RouteError::InvalidPairsIdentifier {
                identifier: self.pairs_identifier.clone(),
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_delimiter(delimiter: &str) -> Result<char, RouteError> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !matches!(c, '/' | '<' | '>') => Ok(c),
        _ => Err(RouteError::InvalidDelimiter {
            delimiter: delimiter.to_owned(),
        }),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(is_word_char)
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parameter specs
// ═══════════════════════════════════════════════════════════════════════════════

/// What a placeholder captures and whether building requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `<name>`
    RequiredScalar,
    /// `<name?>`
    OptionalScalar,
    /// `<name+>`
    RequiredArray,
    /// `<name*>`
    OptionalArray,
    /// `<*>` (required) or `<**>` (optional): tokens split into top-level key/value params.
    Pairs {
        /// Whether building needs at least one pair.
        required: bool,
    },
}

impl ParamKind {
    /// Returns `true` if a URL cannot be built without this parameter.
    #[must_use]
    pub fn is_required(self) -> bool {
        match self {
            Self::RequiredScalar | Self::RequiredArray => true,
            Self::OptionalScalar | Self::OptionalArray => false,
            Self::Pairs { required } => required,
        }
    }

    /// Returns `true` for array and pairs placeholders.
    #[must_use]
    pub fn is_array(self) -> bool {
        !matches!(self, Self::RequiredScalar | Self::OptionalScalar)
    }
}

/// One placeholder of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name (the pairs identifier for `<*>`).
    pub name: String,
    /// Kind derived from the sigil.
    pub kind: ParamKind,
    /// Item delimiter; meaningful for array and pairs kinds only.
    pub delimiter: char,
    /// User-supplied regex (value regex, item regex, or pairs key regex).
    pub regex: Option<String>,
}

/// Post-match decoding data for an array or pairs placeholder.
#[derive(Debug, Clone)]
pub struct ArrayParam {
    /// Matches one item (or one `key<delim>value` token) inside the captured span.
    pub item_regex: Regex,
    /// Item delimiter.
    pub delimiter: char,
    /// For pairs: matches the key at the start of a token.
    pub key_regex: Option<Regex>,
}

impl ArrayParam {
    /// Returns `true` if `name` is, in its entirety, the first match of the
    /// pairs key regex. Always `false` for plain arrays.
    #[must_use]
    pub fn is_pair_key(&self, name: &str) -> bool {
        self.key_regex
            .as_ref()
            .and_then(|re| re.find(name))
            .is_some_and(|m| m.start() == 0 && m.end() == name.len())
    }
}

fn escape_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

/// Characters an array item may not contain: the table delimiter and the item delimiter.
fn excluded_chars(table: char, item: char) -> String {
    if table == item {
        escape_char(table)
    } else {
        format!("{}{}", escape_char(table), escape_char(item))
    }
}

impl ParameterSpec {
    /// Regex for one value (scalar), one item (array) or one token (pairs).
    fn item_pattern(&self, settings: &RuleSettings) -> String {
        let excluded = excluded_chars(settings.delimiter, self.delimiter);
        match self.kind {
            ParamKind::RequiredScalar | ParamKind::OptionalScalar => self
                .regex
                .clone()
                .unwrap_or_else(|| format!("[^{}/]*", escape_char(settings.delimiter))),
            ParamKind::RequiredArray | ParamKind::OptionalArray => self
                .regex
                .clone()
                .unwrap_or_else(|| format!("[^{excluded}]*")),
            ParamKind::Pairs { .. } => format!(
                "({}){}[^{excluded}]*",
                self.key_pattern(settings),
                escape_char(self.delimiter)
            ),
        }
    }

    fn key_pattern(&self, settings: &RuleSettings) -> String {
        self.regex.clone().unwrap_or_else(|| {
            format!("[^{}]+", excluded_chars(settings.delimiter, self.delimiter))
        })
    }

    /// The named capture spliced into the rule's pattern.
    fn capture_pattern(&self, settings: &RuleSettings) -> String {
        let item = self.item_pattern(settings);
        if self.kind.is_array() {
            let delim = escape_char(self.delimiter);
            format!("(?P<{}>({item})(?:{delim}({item}))*)", self.name)
        } else {
            format!("(?P<{}>{item})", self.name)
        }
    }

    fn array_param(
        &self,
        rule: &str,
        settings: &RuleSettings,
    ) -> Result<Option<ArrayParam>, RouteError> {
        if !self.kind.is_array() {
            return Ok(None);
        }
        let item_regex = build_regex(rule, &self.item_pattern(settings))?;
        let key_regex = match self.kind {
            ParamKind::Pairs { .. } => Some(build_regex(rule, &self.key_pattern(settings))?),
            _ => None,
        };
        Ok(Some(ArrayParam {
            item_regex,
            delimiter: self.delimiter,
            key_regex,
        }))
    }
}

fn build_regex(rule: &str, pattern: &str) -> Result<Regex, RouteError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| RouteError::InvalidPattern {
            rule: rule.to_owned(),
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tokenizer
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
enum Token<'a> {
    Literal(&'a str),
    Placeholder { spec: ParameterSpec, offset: usize },
}

struct Tokenizer<'a> {
    rule: &'a str,
    pos: usize,
    settings: &'a RuleSettings,
}

impl<'a> Tokenizer<'a> {
    fn new(rule: &'a str, settings: &'a RuleSettings) -> Self {
        Self {
            rule,
            pos: 0,
            settings,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token<'a>>, RouteError> {
        let mut tokens = Vec::new();
        let mut literal_start = 0;

        while let Some(offset) = self.rule[self.pos..].find('<').map(|i| self.pos + i) {
            self.pos = offset + 1;
            if let Some(spec) = self.placeholder(offset)? {
                if literal_start < offset {
                    tokens.push(Token::Literal(&self.rule[literal_start..offset]));
                }
                tokens.push(Token::Placeholder { spec, offset });
                literal_start = self.pos;
            }
        }

        if literal_start < self.rule.len() {
            tokens.push(Token::Literal(&self.rule[literal_start..]));
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.rule[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rule[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.rule[start..self.pos]
    }

    fn error(&self, offset: usize, reason: impl Into<String>) -> RouteError {
        RouteError::InvalidRule {
            rule: self.rule.to_owned(),
            offset,
            reason: reason.into(),
        }
    }

    /// Parse the placeholder opened by the `<` at `start` (cursor just past it).
    ///
    /// Returns `None` when that `<` is literal text.
    fn placeholder(&mut self, start: usize) -> Result<Option<ParameterSpec>, RouteError> {
        let settings = self.settings;

        let name = if self.peek() == Some('*') {
            self.bump();
            settings.pairs_identifier.clone()
        } else {
            let name = self.eat_while(is_word_char);
            if name.is_empty() {
                return Ok(None);
            }
            name.to_owned()
        };
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(start + 1, "parameter names must not start with a digit"));
        }
        let is_pairs = name == settings.pairs_identifier;

        let sigil_offset = self.pos;
        let sigil = match self.peek() {
            Some(c @ ('?' | '+' | '*')) => {
                self.bump();
                Some(c)
            }
            _ => None,
        };
        let kind = match sigil {
            None | Some('+') if is_pairs => ParamKind::Pairs { required: true },
            Some('*') if is_pairs => ParamKind::Pairs { required: false },
            Some(_) if is_pairs => {
                return Err(self.error(
                    sigil_offset,
                    format!("pairs parameter \"{name}\" is always an array; '?' is ambiguous"),
                ));
            }
            None => ParamKind::RequiredScalar,
            Some('?') => ParamKind::OptionalScalar,
            Some('+') => ParamKind::RequiredArray,
            Some(_) => ParamKind::OptionalArray,
        };

        let mut delimiter = settings.delimiter;
        if kind.is_array() {
            match self.peek() {
                None | Some('>') => {}
                Some(':') => {
                    if matches!(self.peek_second(), Some(':' | '>')) {
                        self.bump();
                        delimiter = ':';
                    }
                }
                Some(c) => {
                    self.bump();
                    delimiter = c;
                }
            }
        }

        let regex = if self.peek() == Some(':') {
            self.bump();
            let regex = self.eat_while(|c| c != '>');
            (!regex.is_empty()).then(|| regex.to_owned())
        } else {
            None
        };

        let close = self.pos;
        match self.bump() {
            Some('>') => {}
            Some(c) => {
                return Err(self.error(
                    close,
                    format!(
                        "unexpected '{c}' in placeholder \"{name}\"; expected a sigil (?, +, *), ':' or '>'"
                    ),
                ));
            }
            None => return Err(self.error(start, "unterminated placeholder")),
        }

        Ok(Some(ParameterSpec {
            name,
            kind,
            delimiter,
            regex,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compiled rules
// ═══════════════════════════════════════════════════════════════════════════════

/// A piece of the URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplatePart {
    Literal(String),
    Param(String),
}

/// A rule compiled for both directions: matching and building.
///
/// # Example
///
/// ```
/// use ruta::{CompiledRule, RuleSettings};
///
/// let rule = CompiledRule::compile("item-<id:\\d+>.html", &RuleSettings::default()).unwrap();
/// assert_eq!(rule.url_template(), "item-<id>.html");
/// assert!(rule.pattern().is_match("ITEM-7.HTML"));
/// assert!(!rule.pattern().is_match("item-x.html"));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: String,
    pattern: Regex,
    url_template: String,
    parts: Vec<TemplatePart>,
    params: Vec<ParameterSpec>,
    required_params: Vec<String>,
    array_params: Vec<(String, ArrayParam)>,
}

impl CompiledRule {
    /// Compile one rule string.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidRule`] for grammar violations: unterminated
    ///   placeholder, unknown sigil, `?` on the pairs parameter, duplicate
    ///   placeholder names, names starting with a digit, overlong rules
    /// - [`RouteError::InvalidPattern`] if a user-supplied regex does not compile
    pub fn compile(rule: &str, settings: &RuleSettings) -> Result<Self, RouteError> {
        if rule.len() > MAX_RULE_LENGTH {
            return Err(RouteError::InvalidRule {
                rule: rule.to_owned(),
                offset: MAX_RULE_LENGTH,
                reason: format!(
                    "rule is {} bytes, but maximum allowed is {MAX_RULE_LENGTH}",
                    rule.len()
                ),
            });
        }

        let tokens = Tokenizer::new(rule, settings).tokenize()?;

        let mut pattern = String::with_capacity(rule.len() * 2);
        pattern.push('^');
        let mut parts = Vec::with_capacity(tokens.len());
        let mut params: Vec<ParameterSpec> = Vec::new();
        let mut required_params = Vec::new();
        let mut array_params = Vec::new();

        for token in tokens {
            match token {
                Token::Literal(text) => {
                    pattern.push_str(&regex::escape(text));
                    parts.push(TemplatePart::Literal(text.to_owned()));
                }
                Token::Placeholder { spec, offset } => {
                    if params.iter().any(|p| p.name == spec.name) {
                        return Err(RouteError::InvalidRule {
                            rule: rule.to_owned(),
                            offset,
                            reason: format!("duplicate placeholder \"{}\"", spec.name),
                        });
                    }
                    pattern.push_str(&spec.capture_pattern(settings));
                    if let Some(array) = spec.array_param(rule, settings)? {
                        array_params.push((spec.name.clone(), array));
                    }
                    if spec.kind.is_required() {
                        required_params.push(spec.name.clone());
                    }
                    parts.push(TemplatePart::Param(spec.name.clone()));
                    params.push(spec);
                }
            }
        }
        pattern.push('$');

        let url_template = parts
            .iter()
            .map(|part| match part {
                TemplatePart::Literal(text) => text.clone(),
                TemplatePart::Param(name) => format!("<{name}>"),
            })
            .collect();

        Ok(Self {
            rule: rule.to_owned(),
            pattern: build_regex(rule, &pattern)?,
            url_template,
            parts,
            params,
            required_params,
            array_params,
        })
    }

    /// The rule as written.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Anchored, case-insensitive matching regex.
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// The rule with every placeholder reduced to `<name>`.
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub(crate) fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Placeholders in rule order.
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Placeholder names in rule order.
    pub fn all_params(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Names a URL cannot be built without.
    #[must_use]
    pub fn required_params(&self) -> &[String] {
        &self.required_params
    }

    /// Array and pairs placeholders with their decoding regexes, in rule order.
    #[must_use]
    pub fn array_params(&self) -> &[(String, ArrayParam)] {
        &self.array_params
    }

    /// Look up a placeholder by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Look up the decoding data of an array or pairs placeholder.
    #[must_use]
    pub fn array_param(&self, name: &str) -> Option<&ArrayParam> {
        self.array_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// The pairs placeholder, if the rule has one.
    #[must_use]
    pub fn pairs_param(&self) -> Option<&ParameterSpec> {
        self.params
            .iter()
            .find(|p| matches!(p.kind, ParamKind::Pairs { .. }))
    }

    /// Returns `true` if `name` is a placeholder of this rule.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url_template)
    }
}

//! `ParameterValue` and `Params`: typed, ordered parameter bags
//!
//! Parameters flow through the router in three places: ambient query
//! parameters fed into matching, match results, and build input. All three
//! use [`Params`], an insertion-ordered map with last-write-wins `insert`.
//! Order matters: it decides the order of generated query strings and pair
//! tokens.

use std::fmt;

/// A single parameter value.
///
/// # Example
///
/// ```
/// use ruta::ParameterValue;
///
/// assert_eq!(ParameterValue::from(42), ParameterValue::Scalar("42".into()));
/// assert!(ParameterValue::from(Vec::<String>::new()).is_empty());
/// assert!(!ParameterValue::from("").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// A single string value.
    Scalar(String),
    /// An ordered list of values (array placeholders, repeated query keys).
    Array(Vec<String>),
    /// Key/value pairs destined for the pairs placeholder.
    Pairs(Vec<(String, String)>),
    /// An explicitly absent value; dropped before building.
    Missing,
}

impl ParameterValue {
    /// Returns the scalar value, if this is a scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for `Missing` and for arrays or pairs with no items.
    ///
    /// An empty scalar string is a value, not an absence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Array(items) => items.is_empty(),
            Self::Pairs(pairs) => pairs.is_empty(),
            Self::Missing => true,
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Array(_) => "array",
            Self::Pairs(_) => "pairs",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Array(items) => write!(f, "[{}]", items.join(", ")),
            Self::Pairs(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Missing => write!(f, "(missing)"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<&String> for ParameterValue {
    fn from(s: &String) -> Self {
        Self::Scalar(s.clone())
    }
}

macro_rules! scalar_from_display {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParameterValue {
                fn from(v: $t) -> Self {
                    Self::Scalar(v.to_string())
                }
            }
        )*
    };
}

scalar_from_display!(i32, i64, u32, u64, usize, char);

impl From<Vec<String>> for ParameterValue {
    fn from(items: Vec<String>) -> Self {
        Self::Array(items)
    }
}

impl From<Vec<&str>> for ParameterValue {
    fn from(items: Vec<&str>) -> Self {
        Self::Array(items.into_iter().map(str::to_owned).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParameterValue {
    fn from(items: [&str; N]) -> Self {
        Self::Array(items.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl From<Vec<(String, String)>> for ParameterValue {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl<T: Into<ParameterValue>> From<Option<T>> for ParameterValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Params
// ═══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered parameter map.
///
/// Inserting an existing name replaces its value in place, keeping the
/// original position. Parameter sets are small, so lookups are linear.
///
/// # Example
///
/// ```
/// use ruta::Params;
///
/// let mut params = Params::new().with("b", "1").with("a", "2");
/// params.insert("b", "3");
///
/// let names: Vec<&str> = params.names().collect();
/// assert_eq!(names, ["b", "a"]);
/// assert_eq!(params.get_str("b"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParameterValue)>,
}

impl Params {
    /// Create an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter (builder pattern).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter, returning the value it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Option<ParameterValue> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Get a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Get a scalar parameter by name.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParameterValue::as_str)
    }

    /// Get an array parameter by name.
    #[must_use]
    pub fn get_array(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParameterValue::as_array)
    }

    /// Returns `true` if the name is present (with any value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Remove a parameter, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<ParameterValue> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Keep only the parameters for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&str, &ParameterValue) -> bool) {
        self.entries.retain(|(n, v)| f(n, v));
    }

    /// Insert every parameter of `other`, overwriting same-named ones.
    pub fn merge(&mut self, other: &Params) {
        for (name, value) in other {
            self.insert(name.clone(), value.clone());
        }
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterate over the names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// `name[]=a&name[]=b` and `name[0]=a` collect into an array; plain
    /// repeated keys keep the last value.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let array_name = key
                .strip_suffix(']')
                .and_then(|k| k.split_once('['))
                .map(|(name, _)| name.to_owned());
            match array_name {
                Some(name) => match params.get(&name) {
                    Some(ParameterValue::Array(items)) => {
                        let mut items = items.clone();
                        items.push(value.into_owned());
                        params.insert(name, items);
                    }
                    _ => {
                        params.insert(name, vec![value.into_owned()]);
                    }
                },
                None => {
                    params.insert(key.into_owned(), value.into_owned());
                }
            }
        }
        params
    }
}

/// Borrowing iterator over [`Params`], in insertion order.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, ParameterValue)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a ParameterValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(n, v)| (n, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParameterValue);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Params {
    type Item = (String, ParameterValue);
    type IntoIter = std::vec::IntoIter<(String, ParameterValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

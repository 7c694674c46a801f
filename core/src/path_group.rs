//! Path groups: `controller/action`-style route names and their parent chain.
//!
//! A path group is a slash-separated name such as `catalog/product/view`.
//! Segments may be `*` (wildcard). Groups form a fallback chain ending at the
//! root group `*`:
//!
//! ```text
//! a/b/c → a/b/* → a/*/* → */*/* → * → (end)
//! ```

use crate::{Params, ROOT_GROUP};

/// Compute the next group in the fallback chain, or `None` after the root.
///
/// - `""` → `*`
/// - `*` → `None`
/// - a group starting with `*` → `*`
/// - otherwise the segment just before the first `*` segment (or the last
///   segment if there is none) becomes `*`
///
/// # Example
///
/// ```
/// use ruta::parent_path_group;
///
/// assert_eq!(parent_path_group("a/b/c").as_deref(), Some("a/b/*"));
/// assert_eq!(parent_path_group("a/b/*").as_deref(), Some("a/*/*"));
/// assert_eq!(parent_path_group("*/*/*").as_deref(), Some("*"));
/// assert_eq!(parent_path_group("*"), None);
/// ```
#[must_use]
pub fn parent_path_group(path: &str) -> Option<String> {
    if path.is_empty() {
        return Some(ROOT_GROUP.to_owned());
    }
    if path == ROOT_GROUP {
        return None;
    }
    if path.starts_with('*') {
        return Some(ROOT_GROUP.to_owned());
    }

    let mut segments: Vec<&str> = path.split('/').collect();
    let target = match segments.iter().position(|s| *s == ROOT_GROUP) {
        Some(first_wildcard) => first_wildcard.checked_sub(1)?,
        None => segments.len() - 1,
    };
    segments[target] = ROOT_GROUP;
    Some(segments.join("/"))
}

/// Iterate a group and all of its parents, ending with `*`.
pub(crate) fn path_group_chain(path: &str) -> impl Iterator<Item = String> {
    std::iter::successors(Some(path.to_owned()), |p| parent_path_group(p))
}

/// Parameters implied by a group: the i-th segment is bound to the i-th
/// path identifier. `*` segments bind nothing.
///
/// # Example
///
/// ```
/// use ruta::path_params;
///
/// let ids = ["_controller".to_string(), "_action".to_string()];
/// let params = path_params("product/*", &ids);
/// assert_eq!(params.get_str("_controller"), Some("product"));
/// assert!(!params.contains("_action"));
/// ```
#[must_use]
pub fn path_params(group: &str, path_identifiers: &[String]) -> Params {
    group
        .split('/')
        .zip(path_identifiers)
        .filter(|(segment, _)| *segment != ROOT_GROUP)
        .map(|(segment, identifier)| (identifier.clone(), segment))
        .collect()
}

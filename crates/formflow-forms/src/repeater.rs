//! Repeaters: variable-length lists of sub-field groups.
//!
//! A repeater field holds an ordered list of items, each a [`FormValues`]
//! keyed by sub-field name. Errors and in-flight flags for sub-fields are
//! tracked under formset-style keys: `"<field>-<index>-<sub>"`, e.g.
//! `phones-0-number`. When an item is removed the keys of the items after
//! it shift down by one so they keep pointing at the same item.

use std::collections::BTreeMap;

use crate::value::FormValues;

/// Returns the prefix shared by every key of one repeater item.
pub fn item_prefix(field: &str, index: usize) -> String {
    format!("{field}-{index}")
}

/// Returns the key for one sub-field of one repeater item.
///
/// # Examples
///
/// ```
/// use formflow_forms::repeater::item_key;
///
/// assert_eq!(item_key("phones", 2, "number"), "phones-2-number");
/// ```
pub fn item_key(field: &str, index: usize, sub: &str) -> String {
    format!("{}-{sub}", item_prefix(field, index))
}

/// Splits an item key of `field` into its index and sub-field name.
///
/// Returns `None` for keys that do not belong to `field`.
pub fn parse_item_key<'a>(field: &str, key: &'a str) -> Option<(usize, &'a str)> {
    let rest = key.strip_prefix(field)?.strip_prefix('-')?;
    let (index, sub) = rest.split_once('-')?;
    Some((index.parse().ok()?, sub))
}

/// A fresh item with no sub-field values.
pub fn empty_item() -> FormValues {
    FormValues::new()
}

/// Label for the "add item" control: `"Add "` plus the field label with one
/// trailing `s` removed.
pub fn add_label(label: &str) -> String {
    format!("Add {}", label.strip_suffix('s').unwrap_or(label))
}

/// Re-keys a per-key map after item `removed` of repeater `field` is gone.
///
/// Entries of the removed item are dropped; entries of later items move
/// down one index. Entries of other fields are untouched.
pub fn rekey_after_removal<V>(map: &mut BTreeMap<String, V>, field: &str, removed: usize) {
    let affected: Vec<String> = map
        .keys()
        .filter(|k| parse_item_key(field, k).is_some_and(|(i, _)| i >= removed))
        .cloned()
        .collect();

    let mut moved = Vec::with_capacity(affected.len());
    for key in affected {
        if let Some(entry) = map.remove(&key) {
            if let Some((index, sub)) = parse_item_key(field, &key) {
                if index > removed {
                    moved.push((item_key(field, index - 1, sub), entry));
                }
            }
        }
    }
    map.extend(moved);
}

/// Returns the item keys of `field` present in `map`.
pub fn keys_of<'a, V>(map: &'a BTreeMap<String, V>, field: &str) -> Vec<&'a String> {
    map.keys()
        .filter(|k| parse_item_key(field, k).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_item_key_and_prefix() {
        assert_eq!(item_prefix("phones", 0), "phones-0");
        assert_eq!(item_key("phones", 0, "number"), "phones-0-number");
    }

    #[test]
    fn test_parse_item_key() {
        assert_eq!(parse_item_key("phones", "phones-3-type"), Some((3, "type")));
        assert_eq!(parse_item_key("phones", "phones"), None);
        assert_eq!(parse_item_key("phones", "name"), None);
        assert_eq!(parse_item_key("phones", "phonesx-1-type"), None);
        assert_eq!(parse_item_key("phones", "phones-x-type"), None);
    }

    #[test]
    fn test_parse_item_key_with_dashed_sub_name() {
        assert_eq!(
            parse_item_key("links", "links-0-home-page"),
            Some((0, "home-page"))
        );
    }

    #[test]
    fn test_add_label() {
        assert_eq!(add_label("Phone Numbers"), "Add Phone Number");
        assert_eq!(add_label("Address"), "Add Addres");
        assert_eq!(add_label("Contact"), "Add Contact");
    }

    #[test]
    fn test_rekey_after_removal() {
        let mut map = errors(&[
            ("name", "Name is required"),
            ("phones-0-number", "first"),
            ("phones-1-number", "second"),
            ("phones-2-number", "third"),
            ("phones-2-type", "third type"),
        ]);
        rekey_after_removal(&mut map, "phones", 1);
        assert_eq!(
            map,
            errors(&[
                ("name", "Name is required"),
                ("phones-0-number", "first"),
                ("phones-1-number", "third"),
                ("phones-1-type", "third type"),
            ])
        );
    }

    #[test]
    fn test_rekey_removing_last_item() {
        let mut map = errors(&[("phones-0-number", "only")]);
        rekey_after_removal(&mut map, "phones", 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_keys_of() {
        let map = errors(&[("name", "x"), ("phones-0-number", "y"), ("emails-0-addr", "z")]);
        assert_eq!(keys_of(&map, "phones"), vec!["phones-0-number"]);
    }
}

//! The keyed container behind [`Value::Map`](crate::Value::Map).
//!
//! One insertion-ordered map serves both JSON objects and JSON arrays. Array
//! elements live under their decimal index (`"0"`, `"1"`, ...) and the
//! `array` flag records that the map is meant to be read as a sequence. The
//! dense length (how many of `"0".."n-1"` are present) is cached and kept
//! current by every operation that adds or removes keys.
use core::mem;

use indexmap::{IndexMap, map};

use crate::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    entries: IndexMap<String, Value>,
    array: bool,
    /// Keys `"0".."dense-1"` are present and `"dense"` is not.
    dense: usize,
}

/// Returns the array index a key stands for, if it is a canonical decimal
/// (no sign, no leading zeros).
pub(crate) fn dense_index(key: &str) -> Option<usize> {
    let bytes = key.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) || (bytes.len() > 1 && bytes[0] == b'0') {
        return None;
    }
    key.parse().ok()
}

impl Map {
    /// Creates an empty object-style map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map flagged as an array.
    #[must_use]
    pub fn new_array() -> Self {
        Self {
            entries: IndexMap::new(),
            array: true,
            dense: 0,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
            array: false,
            dense: 0,
        }
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn set_array(&mut self, array: bool) {
        self.array = array;
    }

    /// Number of entries, dense or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the contiguous `"0".."n-1"` key prefix.
    #[must_use]
    pub fn dense_len(&self) -> usize {
        self.dense
    }

    /// Moves the dense length past any indices that are now present.
    fn extend_dense(&mut self) {
        while self.entries.contains_key(self.dense.to_string().as_str()) {
            self.dense += 1;
        }
    }

    /// Call before inserting a key that is not yet present.
    fn note_inserted(&mut self, key: &str) {
        if dense_index(key) == Some(self.dense) {
            self.dense += 1;
            self.extend_dense();
        }
    }

    fn note_removed(&mut self, key: &str) {
        if let Some(i) = dense_index(key).filter(|&i| i < self.dense) {
            self.dense = i;
        }
    }

    /// Whether every key belongs to the dense prefix.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.dense_len() == self.len()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Looks up the element stored under array index `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.entries.get(index.to_string().as_str())
    }

    /// Inserts or replaces `key`. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return self.entries.insert(key, value);
        }
        self.note_inserted(&key);
        self.entries.insert(key, value)
    }

    /// Returns the child under `key`, inserting [`Value::Undefined`] first if it
    /// is missing.
    pub fn entry_or_undefined(&mut self, key: &str) -> &mut Value {
        if !self.entries.contains_key(key) {
            self.note_inserted(key);
        }
        self.entries.entry(key.to_owned()).or_insert(Value::Undefined)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.entries.shift_remove(key)?;
        self.note_removed(key);
        Some(removed)
    }

    /// Removes the element at array index `index`.
    ///
    /// On an array, the dense elements after it move down by one so the array
    /// stays contiguous. On an object this is the same as removing the key
    /// `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        let dense = self.dense;
        let removed = self.entries.shift_remove(index.to_string().as_str())?;
        if !self.array || index >= dense {
            self.note_removed(&index.to_string());
            return Some(removed);
        }
        self.entries = mem::take(&mut self.entries)
            .into_iter()
            .map(|(key, value)| match dense_index(&key) {
                Some(i) if i > index && i < dense => ((i - 1).to_string(), value),
                _ => (key, value),
            })
            .collect();
        self.dense = dense - 1;
        Some(removed)
    }

    /// Appends at the next dense index and marks the map as an array.
    pub fn push(&mut self, value: Value) {
        self.entries.insert(self.dense.to_string(), value);
        self.dense += 1;
        self.extend_dense();
        self.array = true;
    }

    /// The dense prefix in index order.
    pub fn array_values(&self) -> impl Iterator<Item = &Value> {
        (0..self.dense_len()).filter_map(|i| self.get_index(i))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> map::IterMut<'_, String, Value> {
        self.entries.iter_mut()
    }

    pub fn keys(&self) -> map::Keys<'_, String, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> map::Values<'_, String, Value> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dense = 0;
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            array: false,
            dense: 0,
        };
        map.extend_dense();
        map
    }
}

impl FromIterator<Value> for Map {
    /// Collects into an array.
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let entries: IndexMap<String, Value> = iter
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        Self {
            dense: entries.len(),
            entries,
            array: true,
        }
    }
}

impl From<Vec<Value>> for Map {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Map, dense_index};
    use crate::Value;

    fn array_of(n: i32) -> Map {
        (0..n).map(Value::from).collect()
    }

    #[rstest]
    #[case("0", Some(0))]
    #[case("17", Some(17))]
    #[case("007", None)]
    #[case("-1", None)]
    #[case("+1", None)]
    #[case("", None)]
    #[case("1a", None)]
    fn canonical_indices(#[case] key: &str, #[case] expected: Option<usize>) {
        assert_eq!(dense_index(key), expected);
    }

    #[test]
    fn dense_len_stops_at_first_gap() {
        let mut map = array_of(3);
        map.insert("5", Value::Null);
        map.insert("name", Value::from("x"));
        assert_eq!(map.len(), 5);
        assert_eq!(map.dense_len(), 3);
        assert!(!map.is_dense());
    }

    #[test]
    fn push_appends_after_dense_prefix() {
        let mut map = Map::new();
        map.insert("1", Value::from(true));
        map.push(Value::from("first"));
        assert!(map.is_array());
        assert_eq!(map.get("0"), Some(&Value::from("first")));
        map.push(Value::from("third"));
        assert_eq!(map.get("2"), Some(&Value::from("third")));
        assert_eq!(map.dense_len(), 3);
    }

    #[test]
    fn remove_at_shifts_array_elements_down() {
        let mut map = array_of(4);
        assert_eq!(map.remove_at(1), Some(Value::from(1)));
        assert_eq!(map.dense_len(), 3);
        let rest: Vec<_> = map.array_values().cloned().collect();
        assert_eq!(rest, vec![Value::from(0), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn remove_at_on_object_only_drops_the_key() {
        let mut map: Map = [("0", Value::from(0)), ("1", Value::from(1))].into_iter().collect();
        assert_eq!(map.remove_at(0), Some(Value::from(0)));
        assert_eq!(map.dense_len(), 0);
        assert!(map.contains_key("1"));
        assert_eq!(map.remove_at(9), None);
    }

    fn scanned_dense_len(map: &Map) -> usize {
        (0..).take_while(|i: &usize| map.contains_key(&i.to_string())).count()
    }

    #[test]
    fn cached_dense_len_tracks_mixed_edits() {
        let mut map = Map::new();
        map.insert("2", Value::Null);
        map.insert("0", Value::Null);
        assert_eq!(map.dense_len(), 1);
        map.insert("1", Value::Null);
        assert_eq!(map.dense_len(), 3);
        map.insert("1", Value::from(true));
        map.insert("01", Value::Null);
        assert_eq!(map.dense_len(), 3);
        map.remove("1");
        assert_eq!(map.dense_len(), 1);
        map.push(Value::from("a"));
        assert_eq!(map.dense_len(), 3);
        map.remove_at(0);
        assert_eq!(map.dense_len(), scanned_dense_len(&map));
        *map.entry_or_undefined("2") = Value::Null;
        assert_eq!(map.dense_len(), scanned_dense_len(&map));
        map.remove("7");
        map.remove_at(40);
        assert_eq!(map.dense_len(), scanned_dense_len(&map));
        map.clear();
        assert_eq!(map.dense_len(), 0);

        let collected: Map = [("1", Value::Null), ("0", Value::Null), ("x", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(collected.dense_len(), 2);
    }

    #[test]
    fn pushing_many_elements_stays_linear() {
        let mut map = Map::new_array();
        for i in 0..100_000u32 {
            map.push(Value::from(i));
        }
        assert_eq!(map.dense_len(), 100_000);
        assert!(map.is_dense());
        assert_eq!(map.remove_at(0), Some(Value::from(0u32)));
        assert_eq!(map.get_index(99_998), Some(&Value::from(99_999u32)));
        assert_eq!(map.dense_len(), scanned_dense_len(&map));
    }

    #[test]
    fn insertion_order_is_kept_and_ignored_by_equality() {
        let a: Map = [("b", Value::Null), ("a", Value::Null)].into_iter().collect();
        let b: Map = [("a", Value::Null), ("b", Value::Null)].into_iter().collect();
        assert_eq!(a.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn array_flag_takes_part_in_equality() {
        let mut object = array_of(2);
        object.set_array(false);
        assert_ne!(object, array_of(2));
    }

    #[test]
    fn entry_or_undefined_materializes_once() {
        let mut map = Map::new();
        *map.entry_or_undefined("k") = Value::from(1u8);
        assert_eq!(map.entry_or_undefined("k"), &Value::UInt8(1));
        assert_eq!(map.len(), 1);
    }
}

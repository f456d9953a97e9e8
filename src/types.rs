//! Type definitions for emitted CSV rows

use indexmap::{Equivalent, IndexMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key a field is stored under in a [`Row`]
///
/// Header names become [`Key::Name`]; positional keys (headers disabled, or a
/// fixed header list shorter than the row) are [`Key::Index`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    /// Zero-based column position
    Index(usize),
    /// Header name
    Name(String),
}

impl Key {
    /// Borrowed form, used for lookups
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Index(i) => KeyRef::Index(*i),
            Key::Name(s) => KeyRef::Name(s),
        }
    }
}

// Hashing is shared with `KeyRef` so rows can be queried without allocating.
impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key_ref().hash(state)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

/// Borrowed [`Key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRef<'a> {
    /// Zero-based column position
    Index(usize),
    /// Header name
    Name(&'a str),
}

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyRef::Index(i) => {
                state.write_u8(0);
                i.hash(state);
            }
            KeyRef::Name(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

impl Equivalent<Key> for KeyRef<'_> {
    fn equivalent(&self, key: &Key) -> bool {
        *self == key.as_key_ref()
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(s: &'a str) -> Self {
        KeyRef::Name(s)
    }
}

impl From<usize> for KeyRef<'_> {
    fn from(i: usize) -> Self {
        KeyRef::Index(i)
    }
}

impl<'a> From<&'a Key> for KeyRef<'a> {
    fn from(key: &'a Key) -> Self {
        key.as_key_ref()
    }
}

/// A single field value
///
/// Tokenized fields are always [`Value::String`]; the other variants only
/// appear when a substitution table or transform produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null (e.g. `"NA"` substituted away)
    Null,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl Value {
    /// Convert value to string
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One emitted data row: field values keyed by header, in column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Zero-based position among emitted data rows (the header row is not counted)
    pub index: u64,
    values: IndexMap<Key, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new(index: u64) -> Self {
        Row {
            index,
            values: IndexMap::new(),
        }
    }

    /// Create an empty row with room for `columns` fields
    pub(crate) fn with_capacity(index: u64, columns: usize) -> Self {
        Row {
            index,
            values: IndexMap::with_capacity(columns),
        }
    }

    /// Store a value; a repeated key keeps its first position and takes the new value
    pub fn insert(&mut self, key: Key, value: Value) {
        self.values.insert(key, value);
    }

    /// Get value by header name or column index
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::{parse, CsvOptions};
    ///
    /// let rows = parse("name,age\nAda,36", CsvOptions::default()).unwrap();
    /// assert_eq!(rows[0].get("age").and_then(|v| v.as_i64()), Some(36));
    /// ```
    pub fn get<'a, K: Into<KeyRef<'a>>>(&self, key: K) -> Option<&Value> {
        let key: KeyRef<'a> = key.into();
        self.values.get(&key)
    }

    /// Get the text of a string value
    pub fn get_str<'a, K: Into<KeyRef<'a>>>(&self, key: K) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get value at a column position, regardless of its key
    pub fn get_index(&self, col: usize) -> Option<(&Key, &Value)> {
        self.values.get_index(col)
    }

    /// Get number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if row has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(key, value)` pairs in column order
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.values.iter()
    }

    /// Keys in column order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.values.keys()
    }

    /// Convert row to vector of strings
    pub fn to_strings(&self) -> Vec<String> {
        self.values.values().map(Value::as_string).collect()
    }

    /// Take the underlying map
    pub fn into_map(self) -> IndexMap<Key, Value> {
        self.values
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{Key, Row, Value};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    impl Serialize for Key {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Key::Index(i) => serializer.serialize_u64(*i as u64),
                Key::Name(s) => serializer.serialize_str(s),
            }
        }
    }

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::Null => serializer.serialize_none(),
                Value::String(s) => serializer.serialize_str(s),
                Value::Int(i) => serializer.serialize_i64(*i),
                Value::Float(f) => serializer.serialize_f64(*f),
                Value::Bool(b) => serializer.serialize_bool(*b),
            }
        }
    }

    // Rows serialize as plain objects; the index is positional metadata.
    impl Serialize for Row {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self {
                map.serialize_entry(&key.to_string(), value)?;
            }
            map.end()
        }
    }
}

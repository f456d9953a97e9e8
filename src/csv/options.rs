//! Tokenizer configuration

use crate::csv::newline::Newline;
use crate::error::{CsvError, Result};
use crate::types::{Key, Value};
use encoding_rs::Encoding;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Computes a header key from the name found in the header row
pub type HeaderFn = Arc<dyn Fn(&str) -> Key + Send + Sync>;

/// Computes a field value from its raw text and the header key of its column
pub type ValueFn = Arc<dyn Fn(&str, &Key) -> Value + Send + Sync>;

/// How the first row is turned into header keys
#[derive(Clone, Default)]
pub enum HeaderMode {
    /// No header row: the first row is data, keyed by column index
    Disabled,
    /// The first row's fields are the header names
    #[default]
    AutoDetect,
    /// Fixed names by position; columns past the list are keyed by index.
    /// The first row is still consumed as the header row.
    FixedList(Vec<Key>),
    /// Detected names are renamed through the map; unknown names pass through
    RenameMap(HashMap<String, Key>),
    /// Header key computed from each detected name
    Compute(HeaderFn),
}

impl HeaderMode {
    /// Build a [`HeaderMode::Compute`] from a closure
    pub fn compute<F, K>(f: F) -> Self
    where
        F: Fn(&str) -> K + Send + Sync + 'static,
        K: Into<Key>,
    {
        HeaderMode::Compute(Arc::new(move |name| f(name).into()))
    }

    /// False only for [`HeaderMode::Disabled`]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, HeaderMode::Disabled)
    }

    /// Resolve the key for header-row field `raw` at `column`
    pub(crate) fn resolve(&self, raw: &str, column: usize) -> Key {
        match self {
            HeaderMode::Disabled => Key::Index(column),
            HeaderMode::AutoDetect => Key::Name(raw.to_string()),
            HeaderMode::FixedList(names) => names.get(column).cloned().unwrap_or(Key::Index(column)),
            HeaderMode::RenameMap(map) => map
                .get(raw)
                .cloned()
                .unwrap_or_else(|| Key::Name(raw.to_string())),
            HeaderMode::Compute(f) => f(raw),
        }
    }
}

impl fmt::Debug for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMode::Disabled => f.write_str("Disabled"),
            HeaderMode::AutoDetect => f.write_str("AutoDetect"),
            HeaderMode::FixedList(names) => f.debug_tuple("FixedList").field(names).finish(),
            HeaderMode::RenameMap(map) => f.debug_tuple("RenameMap").field(map).finish(),
            HeaderMode::Compute(_) => f.write_str("Compute(<fn>)"),
        }
    }
}

/// How raw field text becomes a [`Value`]
#[derive(Clone, Default)]
pub enum ValueMode {
    /// Keep the raw string
    #[default]
    Raw,
    /// Replace raw strings found in the table; others stay raw
    Substitute(HashMap<String, Value>),
    /// Transform every value
    Transform(ValueFn),
}

impl ValueMode {
    /// Build a [`ValueMode::Transform`] from a closure
    pub fn transform<F, V>(f: F) -> Self
    where
        F: Fn(&str, &Key) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        ValueMode::Transform(Arc::new(move |raw, key| f(raw, key).into()))
    }

    pub(crate) fn resolve(&self, raw: String, key: &Key) -> Value {
        match self {
            ValueMode::Raw => Value::String(raw),
            ValueMode::Substitute(table) => match table.get(&raw) {
                Some(v) => v.clone(),
                None => Value::String(raw),
            },
            ValueMode::Transform(f) => f(&raw, key),
        }
    }
}

impl fmt::Debug for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMode::Raw => f.write_str("Raw"),
            ValueMode::Substitute(table) => f.debug_tuple("Substitute").field(table).finish(),
            ValueMode::Transform(_) => f.write_str("Transform(<fn>)"),
        }
    }
}

/// Whether chunks are text or raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Decided by the kind of the first chunk
    #[default]
    Auto,
    /// `&str` chunks, no decoding
    Text,
    /// Byte chunks, decoded with the configured encoding
    Bytes,
}

/// Options for a parsing session
///
/// # Examples
///
/// ```
/// use csvstream::{CsvOptions, Newline};
///
/// let options = CsvOptions::new()
///     .delimiter(';')
///     .newline(Newline::CrLf)
///     .header_names(["id", "name"]);
///
/// let rows = csvstream::parse("x;y\r\n1;Ada\r\n", options).unwrap();
/// assert_eq!(rows[0].get_str("name"), Some("Ada"));
/// ```
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub(crate) delimiter: char,
    pub(crate) quote: char,
    pub(crate) newline: Newline,
    pub(crate) headers: HeaderMode,
    pub(crate) values: ValueMode,
    pub(crate) input: InputMode,
    pub(crate) encoding: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            quote: '"',
            newline: Newline::Lf,
            headers: HeaderMode::AutoDetect,
            values: ValueMode::Raw,
            input: InputMode::Auto,
            encoding: "utf-8".to_string(),
        }
    }
}

impl CsvOptions {
    /// Default options: `,` delimiter, `"` quote, LF rows, header row, raw values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set field delimiter (builder pattern)
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set quote character (builder pattern)
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Set row terminator (builder pattern)
    pub fn newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    /// Set header handling (builder pattern)
    pub fn headers(mut self, headers: HeaderMode) -> Self {
        self.headers = headers;
        self
    }

    /// Treat the first row as data, keyed by column index
    pub fn no_headers(self) -> Self {
        self.headers(HeaderMode::Disabled)
    }

    /// Use fixed header names by position
    pub fn header_names<I, K>(self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.headers(HeaderMode::FixedList(
            names.into_iter().map(Into::into).collect(),
        ))
    }

    /// Rename detected header names
    pub fn rename_headers<I, S, K>(self, renames: I) -> Self
    where
        I: IntoIterator<Item = (S, K)>,
        S: Into<String>,
        K: Into<Key>,
    {
        self.headers(HeaderMode::RenameMap(
            renames
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        ))
    }

    /// Compute each header key from the detected name
    pub fn compute_headers<F, K>(self, f: F) -> Self
    where
        F: Fn(&str) -> K + Send + Sync + 'static,
        K: Into<Key>,
    {
        self.headers(HeaderMode::compute(f))
    }

    /// Set value handling (builder pattern)
    pub fn values(mut self, values: ValueMode) -> Self {
        self.values = values;
        self
    }

    /// Substitute raw values found in the table
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::{CsvOptions, Value};
    ///
    /// let options = CsvOptions::new().substitute_values([("NA", Value::Null)]);
    /// let rows = csvstream::parse("a,b\nNA,2", options).unwrap();
    /// assert_eq!(rows[0].get("a"), Some(&Value::Null));
    /// ```
    pub fn substitute_values<I, S, V>(self, table: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        self.values(ValueMode::Substitute(
            table
                .into_iter()
                .map(|(raw, v)| (raw.into(), v.into()))
                .collect(),
        ))
    }

    /// Transform every value with `f(raw, header_key)`
    pub fn transform_values<F, V>(self, f: F) -> Self
    where
        F: Fn(&str, &Key) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.values(ValueMode::transform(f))
    }

    /// Declare chunk kind instead of detecting it from the first chunk
    pub fn input(mut self, input: InputMode) -> Self {
        self.input = input;
        self
    }

    /// Encoding label used to decode byte chunks (default `utf-8`)
    pub fn encoding(mut self, label: &str) -> Self {
        self.encoding = label.to_string();
        self
    }

    /// Get the field delimiter
    pub fn get_delimiter(&self) -> char {
        self.delimiter
    }

    /// Get the quote character
    pub fn get_quote(&self) -> char {
        self.quote
    }

    /// Get the row terminator
    pub fn get_newline(&self) -> Newline {
        self.newline
    }

    /// Get the configured input mode
    pub fn get_input(&self) -> InputMode {
        self.input
    }

    /// Check option consistency and resolve the encoding
    pub(crate) fn validate(&self) -> Result<Dialect> {
        if self.delimiter == self.quote {
            return Err(CsvError::ConfigurationError(format!(
                "Delimiter and quote are both {:?}",
                self.delimiter
            )));
        }
        let terminator = self.newline.as_str();
        for (what, ch) in [("Delimiter", self.delimiter), ("Quote", self.quote)] {
            if terminator.contains(ch) {
                return Err(CsvError::ConfigurationError(format!(
                    "{} {:?} collides with newline {}",
                    what, ch, self.newline
                )));
            }
        }

        Ok(Dialect {
            delimiter: self.delimiter.to_string().into_bytes().into_boxed_slice(),
            quote: self.quote.to_string().into_bytes().into_boxed_slice(),
            newline: self.newline,
            encoding: resolve_encoding(&self.encoding)?,
        })
    }
}

/// Validated, immutable form of the structural options
#[derive(Debug, Clone)]
pub(crate) struct Dialect {
    pub delimiter: Box<[u8]>,
    pub quote: Box<[u8]>,
    pub newline: Newline,
    pub encoding: &'static Encoding,
}

/// Look up an encoding label, accepting a few common non-WHATWG spellings
pub(crate) fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase();
    let label = match normalized.as_str() {
        "utf16le" | "ucs2" | "ucs-2" => "utf-16le",
        "binary" => "latin1",
        other => other,
    };
    Encoding::for_label(label.as_bytes()).ok_or_else(|| {
        CsvError::ConfigurationError(format!("Unknown encoding label {:?}", label))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let dialect = CsvOptions::default().validate().unwrap();
        assert_eq!(&*dialect.delimiter, b",");
        assert_eq!(&*dialect.quote, b"\"");
        assert_eq!(dialect.newline, Newline::Lf);
        assert_eq!(dialect.encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn test_delimiter_quote_collision() {
        let err = CsvOptions::new().delimiter('"').validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_newline_collision() {
        let err = CsvOptions::new().delimiter('\r').newline(Newline::Cr).validate();
        assert!(err.is_err());

        let err = CsvOptions::new().quote('\n').validate();
        assert!(err.is_err());

        assert!(CsvOptions::new().delimiter('\t').validate().is_ok());
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!(resolve_encoding("utf8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("UTF16LE").unwrap(), encoding_rs::UTF_16LE);
        assert_eq!(resolve_encoding("latin1").unwrap(), encoding_rs::WINDOWS_1252);
        assert!(resolve_encoding("klingon").unwrap_err().is_configuration());
    }

    #[test]
    fn test_header_resolution() {
        assert_eq!(HeaderMode::AutoDetect.resolve("a", 0), Key::from("a"));
        assert_eq!(HeaderMode::Disabled.resolve("a", 2), Key::Index(2));

        let fixed = HeaderMode::FixedList(vec![Key::from("x")]);
        assert_eq!(fixed.resolve("a", 0), Key::from("x"));
        assert_eq!(fixed.resolve("b", 1), Key::Index(1));

        let rename = CsvOptions::new().rename_headers([("a", "alpha")]).headers;
        assert_eq!(rename.resolve("a", 0), Key::from("alpha"));
        assert_eq!(rename.resolve("b", 1), Key::from("b"));

        let upper = HeaderMode::compute(|name: &str| name.to_uppercase());
        assert_eq!(upper.resolve("city", 0), Key::from("CITY"));
    }

    #[test]
    fn test_value_resolution() {
        let key = Key::from("a");
        assert_eq!(ValueMode::Raw.resolve("1".into(), &key), Value::from("1"));

        let table = CsvOptions::new()
            .substitute_values([("", Value::Null), ("yes", Value::Bool(true))])
            .values;
        assert_eq!(table.resolve(String::new(), &key), Value::Null);
        assert_eq!(table.resolve("yes".into(), &key), Value::Bool(true));
        assert_eq!(table.resolve("no".into(), &key), Value::from("no"));

        let tagged = ValueMode::transform(|raw: &str, key: &Key| format!("{}={}", key, raw));
        assert_eq!(tagged.resolve("1".into(), &key), Value::from("a=1"));
    }
}

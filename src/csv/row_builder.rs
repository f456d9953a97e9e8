//! Header resolution and row assembly

use crate::csv::options::{HeaderMode, ValueMode};
use crate::csv::state::ParseState;
use crate::error::Result;
use crate::sink::RowSink;
use crate::types::{Key, Row};

/// Turns completed fields into header keys or row values
///
/// Holds only the resolved header/value modes; all mutable data lives in
/// [`ParseState`].
#[derive(Debug, Clone)]
pub struct RowBuilder {
    headers: HeaderMode,
    values: ValueMode,
}

impl RowBuilder {
    /// Create a builder for the given modes
    pub fn new(headers: HeaderMode, values: ValueMode) -> Self {
        RowBuilder { headers, values }
    }

    /// Header handling in use
    pub fn header_mode(&self) -> &HeaderMode {
        &self.headers
    }

    /// Accept a completed field at `state.column`
    ///
    /// On the header row this records a header key; otherwise the value is
    /// resolved and stored in the current row.
    pub fn on_field(&self, state: &mut ParseState, raw: String) {
        let column = state.column;

        if state.rows == 0 {
            state.headers.push(self.headers.resolve(&raw, column));
            if self.headers.is_enabled() {
                return;
            }
        }

        let key = state
            .headers
            .get(column)
            .cloned()
            .unwrap_or(Key::Index(column));
        let value = self.values.resolve(raw, &key);
        state.current.insert(key, value);
    }

    /// Finish the current row, emitting it unless it was the header row
    pub fn on_row_end<S: RowSink + ?Sized>(&self, state: &mut ParseState, sink: &mut S) -> Result<()> {
        let is_data = state.rows > 0 || !self.headers.is_enabled();

        state.rows += 1;
        if is_data {
            state.emitted += 1;
        } else {
            tracing::debug!(headers = state.headers.len(), "resolved header row");
        }

        let next = Row::with_capacity(state.emitted, state.headers.len());
        let row = std::mem::replace(&mut state.current, next);
        if is_data {
            sink.push(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn feed_row(builder: &RowBuilder, state: &mut ParseState, fields: &[&str], out: &mut Vec<Row>) {
        for field in fields {
            builder.on_field(state, field.to_string());
            state.column += 1;
        }
        builder.on_row_end(state, out).unwrap();
        state.column = 0;
    }

    #[test]
    fn test_header_row_is_not_emitted() {
        let builder = RowBuilder::new(HeaderMode::AutoDetect, ValueMode::Raw);
        let mut state = ParseState::new();
        let mut out = Vec::new();

        feed_row(&builder, &mut state, &["a", "b"], &mut out);
        assert!(out.is_empty());
        assert_eq!(state.headers(), &[Key::from("a"), Key::from("b")]);

        feed_row(&builder, &mut state, &["1", "2"], &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].index, 0);
        assert_eq!(out[0].get_str("b"), Some("2"));
        assert_eq!(state.rows(), 2);
        assert_eq!(state.emitted(), 1);
    }

    #[test]
    fn test_disabled_headers_emit_first_row() {
        let builder = RowBuilder::new(HeaderMode::Disabled, ValueMode::Raw);
        let mut state = ParseState::new();
        let mut out = Vec::new();

        feed_row(&builder, &mut state, &["1", "2"], &mut out);
        feed_row(&builder, &mut state, &["3", "4", "5"], &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get_str(0), Some("1"));
        assert_eq!(out[1].get_str(2), Some("5"));
        assert_eq!(out[1].index, 1);
    }

    #[test]
    fn test_extra_columns_fall_back_to_index() {
        let builder = RowBuilder::new(HeaderMode::AutoDetect, ValueMode::Raw);
        let mut state = ParseState::new();
        let mut out = Vec::new();

        feed_row(&builder, &mut state, &["a"], &mut out);
        feed_row(&builder, &mut state, &["1", "2"], &mut out);

        assert_eq!(out[0].get_str("a"), Some("1"));
        assert_eq!(out[0].get_str(1), Some("2"));
    }

    #[test]
    fn test_transform_sees_header_key() {
        let values = ValueMode::transform(|raw: &str, key: &Key| match key {
            Key::Name(name) if name == "n" => Value::from(raw.parse::<i64>().ok()),
            _ => Value::from(raw),
        });
        let builder = RowBuilder::new(HeaderMode::AutoDetect, values);
        let mut state = ParseState::new();
        let mut out = Vec::new();

        feed_row(&builder, &mut state, &["n", "s"], &mut out);
        feed_row(&builder, &mut state, &["7", "7"], &mut out);
        feed_row(&builder, &mut state, &["x", "x"], &mut out);

        assert_eq!(out[0].get("n"), Some(&Value::Int(7)));
        assert_eq!(out[0].get("s"), Some(&Value::from("7")));
        assert_eq!(out[1].get("n"), Some(&Value::Null));
    }
}

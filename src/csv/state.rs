//! Mutable state of one parsing session

use crate::types::{Key, Row};

/// Everything a parsing session mutates, in one place
///
/// Owned by exactly one [`Tokenizer`](crate::csv::Tokenizer); the tokenizer
/// and [`RowBuilder`](crate::csv::RowBuilder) step functions take it by
/// `&mut` and never share it between sessions.
#[derive(Debug, Default)]
pub struct ParseState {
    /// Decoded text not yet consumed
    pub(crate) pending: String,
    /// Start of the unflushed text in `pending`
    pub(crate) offset: usize,
    /// Where the next structural search starts in `pending`
    pub(crate) scan: usize,
    /// Inside an open quoted field
    pub(crate) quoted: bool,
    /// Last event was a closing quote ending right at `offset`
    pub(crate) after_close: bool,
    /// Text collected for the current field
    pub(crate) field: String,
    /// Length of `field` at the last structural event; unquoted text after it
    /// is discarded when a quote opens
    pub(crate) field_mark: usize,
    /// Current field contained a quote (so an empty `""` still counts as content)
    pub(crate) field_quoted: bool,
    /// Zero-based column within the current row
    pub(crate) column: usize,
    /// Completed rows, header row included
    pub(crate) rows: u64,
    /// Rows handed to the sink
    pub(crate) emitted: u64,
    /// Resolved header keys; fixed once the first row ends
    pub(crate) headers: Vec<Key>,
    /// Row being assembled
    pub(crate) current: Row,
}

impl ParseState {
    /// Fresh state for a new session
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently inside an open quoted field
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// Zero-based column within the current row
    pub fn column(&self) -> usize {
        self.column
    }

    /// Completed rows, header row included
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Rows handed to the sink
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Resolved header keys (empty until the first row completes)
    pub fn headers(&self) -> &[Key] {
        &self.headers
    }

    /// Text buffered but not yet assigned to a completed field
    pub fn buffered_len(&self) -> usize {
        self.pending.len() - self.offset + self.field.len()
    }

    /// True when the current row has anything worth emitting at end of input
    pub(crate) fn has_partial_row(&self) -> bool {
        !self.field.is_empty() || self.field_quoted || self.column > 0
    }

    /// Drop consumed text from the front of `pending`, returning how many bytes went
    pub(crate) fn compact(&mut self) -> usize {
        let cut = self.offset;
        if cut > 0 {
            self.pending.drain(..cut);
            self.offset = 0;
            self.scan -= cut;
        }
        cut
    }
}

//! Incremental CSV tokenizer
//!
//! Feeding the input in any number of chunks produces the same rows as
//! feeding it at once. Between calls the tokenizer keeps:
//! - undecoded bytes of a split character (in the [`Decoder`]),
//! - a trailing first character of a two-character newline,
//! - the open-quote flag and the partially built field,
//! - the current row and the header list.
//!
//! Scanning is one loop over the buffered text looking for the earliest
//! delimiter, quote or newline. Inside quotes only the quote is structural.

use crate::csv::decoder::{Chunk, Decoder};
use crate::csv::newline::Newline;
use crate::csv::options::{CsvOptions, InputMode};
use crate::csv::row_builder::RowBuilder;
use crate::csv::state::ParseState;
use crate::error::{CsvError, Result};
use crate::sink::RowSink;
use crate::types::Key;
use memchr::memmem::Finder;

/// Structural character kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Quote,
    Delimiter,
    Newline,
}

/// Cached search for one structural needle over the pending buffer
///
/// Remembers the last hit, or how far a miss was searched, so a long field
/// is scanned once rather than once per event.
#[derive(Debug, Clone)]
struct Needle {
    finder: Finder<'static>,
    found: Option<usize>,
    searched_to: usize,
}

impl Needle {
    fn new(bytes: &[u8]) -> Self {
        Needle {
            finder: Finder::new(bytes).into_owned(),
            found: None,
            searched_to: 0,
        }
    }

    fn len(&self) -> usize {
        self.finder.needle().len()
    }

    /// First match at or after `from`; `from` never moves backwards between compactions
    fn find(&mut self, hay: &[u8], from: usize) -> Option<usize> {
        let start = match self.found {
            Some(pos) if pos >= from => return Some(pos),
            Some(_) => from,
            // A match may straddle the end of the previously searched text
            None => from.max(self.searched_to.saturating_sub(self.len() - 1)),
        };

        self.found = hay
            .get(start..)
            .and_then(|rest| self.finder.find(rest))
            .map(|i| i + start);
        self.searched_to = hay.len();
        self.found
    }

    /// Shift cached positions after `cut` bytes were removed from the front
    fn shift(&mut self, cut: usize) {
        match self.found {
            Some(pos) if pos >= cut => self.found = Some(pos - cut),
            Some(_) => {
                self.found = None;
                self.searched_to = 0;
            }
            None => self.searched_to = self.searched_to.saturating_sub(cut),
        }
    }
}

/// The incremental state machine
///
/// # Examples
///
/// ```
/// use csvstream::csv::Tokenizer;
/// use csvstream::CsvOptions;
///
/// let mut tokenizer = Tokenizer::new(CsvOptions::default()).unwrap();
/// let mut rows = Vec::new();
///
/// for chunk in ["na", "me,ci", "ty\nAda,Lon", "don\n\"Grace", "\",NYC"] {
///     tokenizer.feed(chunk, &mut rows).unwrap();
/// }
/// tokenizer.flush(&mut rows).unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].get_str("city"), Some("London"));
/// assert_eq!(rows[1].get_str("name"), Some("Grace"));
/// ```
#[derive(Debug)]
pub struct Tokenizer {
    decoder: Decoder,
    builder: RowBuilder,
    state: ParseState,
    delimiter: Needle,
    quote: Needle,
    newline: Needle,
    quote_char: char,
    line_ending: Newline,
    ended: bool,
}

impl Tokenizer {
    /// Validate `options` and build a tokenizer
    ///
    /// Fails with [`CsvError::ConfigurationError`] when the delimiter, quote
    /// and newline collide or the encoding label is unknown.
    pub fn new(options: CsvOptions) -> Result<Self> {
        let dialect = options.validate()?;

        Ok(Tokenizer {
            decoder: Decoder::new(options.input, dialect.encoding),
            builder: RowBuilder::new(options.headers, options.values),
            state: ParseState::new(),
            delimiter: Needle::new(&dialect.delimiter),
            quote: Needle::new(&dialect.quote),
            newline: Needle::new(dialect.newline.as_str().as_bytes()),
            quote_char: options.quote,
            line_ending: dialect.newline,
            ended: false,
        })
    }

    /// Feed one chunk; rows completed by it are pushed to `sink` before returning
    pub fn feed<'a, C, S>(&mut self, chunk: C, sink: &mut S) -> Result<()>
    where
        C: Into<Chunk<'a>>,
        S: RowSink + ?Sized,
    {
        let chunk = chunk.into();
        if self.ended {
            return Err(CsvError::InvalidState(
                "Cannot feed a tokenizer after flush".to_string(),
            ));
        }

        self.decoder.decode(chunk, &mut self.state.pending)?;
        let before = self.state.emitted;
        self.process(sink)?;
        self.absorb_tail();

        tracing::trace!(
            bytes = chunk.len(),
            rows = self.state.emitted - before,
            buffered = self.state.buffered_len(),
            "fed chunk"
        );
        Ok(())
    }

    /// Signal end of input and emit the trailing row, if any
    ///
    /// An unterminated quoted field is not an error: whatever was buffered
    /// becomes the last field.
    pub fn flush<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.ended {
            return Err(CsvError::InvalidState(
                "Tokenizer already flushed".to_string(),
            ));
        }
        self.ended = true;

        self.decoder.finish(&mut self.state.pending);
        self.process(sink)?;

        let state = &mut self.state;
        if state.quoted {
            tracing::warn!(
                column = state.column,
                row = state.rows,
                "unterminated quoted field at end of input, keeping buffered text"
            );
            state.quoted = false;
        }
        state.field.push_str(&state.pending[state.offset..]);
        state.pending.clear();
        state.offset = 0;
        state.scan = 0;

        if state.has_partial_row() {
            self.complete_field();
            self.complete_row(sink)?;
        }

        tracing::debug!(
            rows = self.state.rows,
            emitted = self.state.emitted,
            "input ended"
        );
        Ok(())
    }

    /// Resolved header keys (empty until the first row completes)
    pub fn headers(&self) -> &[Key] {
        self.state.headers()
    }

    /// Data rows emitted so far
    pub fn rows_emitted(&self) -> u64 {
        self.state.emitted
    }

    /// Input mode, once resolved
    pub fn input_mode(&self) -> InputMode {
        self.decoder.mode()
    }

    /// True after [`Tokenizer::flush`]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Session state, for inspection
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Handle every structural character currently buffered
    fn process<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        while let Some((event, pos)) = self.next_event() {
            match event {
                Event::Quote => self.on_quote(pos),
                Event::Delimiter => {
                    self.take_slice(pos, self.delimiter.len());
                    self.complete_field();
                }
                Event::Newline => {
                    self.take_slice(pos, self.newline.len());
                    self.complete_field();
                    self.complete_row(sink)?;
                }
            }
        }
        Ok(())
    }

    /// Earliest structural character at or after `state.scan`
    fn next_event(&mut self) -> Option<(Event, usize)> {
        let hay = self.state.pending.as_bytes();
        let from = self.state.scan;

        let quote = self.quote.find(hay, from);
        if self.state.quoted {
            // Delimiters and newlines are field content until the quote closes
            return quote.map(|pos| (Event::Quote, pos));
        }
        let delimiter = self.delimiter.find(hay, from);
        let newline = self.newline.find(hay, from);

        [
            (Event::Quote, quote),
            (Event::Delimiter, delimiter),
            (Event::Newline, newline),
        ]
        .into_iter()
        .filter_map(|(event, pos)| pos.map(|pos| (event, pos)))
        .min_by_key(|&(_, pos)| pos)
    }

    fn on_quote(&mut self, pos: usize) {
        let state = &mut self.state;

        if state.quoted {
            state.field.push_str(&state.pending[state.offset..pos]);
            state.quoted = false;
            state.after_close = true;
        } else {
            if state.after_close && pos == state.offset {
                // `""`: a quote reopened right after closing is one literal quote
                state.field.push(self.quote_char);
            } else {
                // Opening does not flush: unquoted text since the last event is dropped,
                // including any absorbed from earlier chunks
                state.field.truncate(state.field_mark);
            }
            state.quoted = true;
            state.after_close = false;
        }

        state.field_quoted = true;
        state.field_mark = state.field.len();
        state.offset = pos + self.quote.len();
        state.scan = state.offset;
    }

    /// Move text up to `pos` into the field and step over a `len`-byte separator
    fn take_slice(&mut self, pos: usize, len: usize) {
        let state = &mut self.state;
        state.field.push_str(&state.pending[state.offset..pos]);
        state.offset = pos + len;
        state.scan = state.offset;
    }

    fn complete_field(&mut self) {
        let state = &mut self.state;
        let raw = std::mem::take(&mut state.field);
        self.builder.on_field(state, raw);
        state.column += 1;
        state.field_mark = 0;
        state.field_quoted = false;
        state.after_close = false;
    }

    fn complete_row<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.state.column = 0;
        self.builder.on_row_end(&mut self.state, sink)
    }

    /// Move leftover text into the field and compact the buffer
    ///
    /// Everything after the last structural character is field content,
    /// except a trailing first half of a two-character newline, which has to
    /// wait for the next chunk.
    fn absorb_tail(&mut self) {
        let state = &mut self.state;
        let mut end = state.pending.len();
        if !state.quoted
            && self.line_ending.byte_len() > 1
            && state.pending.ends_with(self.line_ending.first_char())
        {
            end -= 1;
        }

        if end > state.offset {
            state.field.push_str(&state.pending[state.offset..end]);
            state.offset = end;
            state.after_close = false;
        }
        state.scan = state.scan.max(state.offset);

        let cut = state.compact();
        if cut > 0 {
            self.delimiter.shift(cut);
            self.quote.shift(cut);
            self.newline.shift(cut);
        }
    }
}

//! # csvstream
//!
//! Incremental CSV tokenizer. Feed text or byte chunks of any size, split at
//! any point, and get exactly the rows a single pass over the whole input
//! would give.
//!
//! ## Features
//!
//! - **Chunk invariance** - splits inside quoted fields, multi-byte characters
//!   or two-character newlines are carried over to the next chunk
//! - **Push or pull** - [`CsvStream`] pushes rows into a [`RowSink`];
//!   [`CsvReader`] and [`AsyncCsvReader`] pull them from a source
//! - **Configurable dialect** - delimiter, quote, newline (LF, CR, CRLF, LFCR)
//!   and any `encoding_rs` encoding
//! - **Header and value mapping** - detected, fixed, renamed or computed
//!   headers; substitution tables or transforms for values
//!
//! ## Quick Start
//!
//! ```
//! use csvstream::{parse, CsvOptions};
//!
//! let rows = parse("a,b,c\n1,2,3\n4,5,6", CsvOptions::default()).unwrap();
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].get_str("c"), Some("6"));
//! ```
//!
//! ## Streaming
//!
//! ```
//! use csvstream::{CsvOptions, CsvStream};
//! use std::sync::mpsc;
//! use std::thread;
//!
//! // A bounded channel blocks the producer while the consumer catches up
//! let (tx, rx) = mpsc::sync_channel::<csvstream::Row>(16);
//! let consumer = thread::spawn(move || rx.iter().count());
//!
//! let mut stream = CsvStream::new(CsvOptions::default(), tx).unwrap();
//! stream.feed(b"id\n1\n2".as_slice()).unwrap();
//! stream.feed(b"\n3\n".as_slice()).unwrap();
//! stream.end().unwrap();
//! drop(stream);
//!
//! assert_eq!(consumer.join().unwrap(), 3);
//! ```

pub mod csv;
pub mod csv_reader;
pub mod error;
pub mod sink;
pub mod stream;
pub mod types;

#[cfg(feature = "tokio")]
pub mod async_reader;

pub use csv::{Chunk, CsvOptions, HeaderMode, InputMode, Newline, Tokenizer, ValueMode};
pub use csv_reader::CsvReader;
pub use error::{CsvError, Result};
pub use sink::RowSink;
pub use stream::CsvStream;
pub use types::{Key, KeyRef, Row, Value};

#[cfg(feature = "tokio")]
pub use async_reader::AsyncCsvReader;

/// Parse a complete text input
pub fn parse(input: &str, options: CsvOptions) -> Result<Vec<Row>> {
    run(Chunk::Text(input), options)
}

/// Parse a complete byte input, decoded with the configured encoding
///
/// # Examples
///
/// ```
/// use csvstream::{parse_bytes, CsvOptions};
///
/// let rows = parse_bytes(b"k\n\xff\xfe", CsvOptions::new().encoding("latin1")).unwrap();
/// assert_eq!(rows[0].get_str("k"), Some("ÿþ"));
/// ```
pub fn parse_bytes(input: &[u8], options: CsvOptions) -> Result<Vec<Row>> {
    run(Chunk::Bytes(input), options)
}

/// Parse several independent inputs in parallel, one session per input
#[cfg(feature = "parallel")]
pub fn parse_many(inputs: &[&str], options: CsvOptions) -> Vec<Result<Vec<Row>>> {
    use rayon::prelude::*;

    inputs
        .par_iter()
        .map(|input| parse(input, options.clone()))
        .collect()
}

fn run(chunk: Chunk<'_>, options: CsvOptions) -> Result<Vec<Row>> {
    let mut tokenizer = Tokenizer::new(options)?;
    let mut rows = Vec::new();
    tokenizer.feed(chunk, &mut rows)?;
    tokenizer.flush(&mut rows)?;
    Ok(rows)
}

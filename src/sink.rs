//! Row consumers
//!
//! Every entry point (batch [`parse`](crate::parse), [`CsvStream`](crate::CsvStream),
//! the pull readers) drives the same tokenizer and hands rows to a [`RowSink`].
//!
//! A bounded [`std::sync::mpsc::SyncSender`] gives backpressure: when the
//! consumer falls behind, `push` blocks and the producer stops feeding.
//!
//! ```
//! use csvstream::{sink, CsvOptions, CsvStream};
//!
//! let mut names = Vec::new();
//! let mut stream = CsvStream::new(
//!     CsvOptions::default(),
//!     sink::from_fn(|row| {
//!         names.push(row.get_str("name").unwrap_or_default().to_string());
//!         Ok(())
//!     }),
//! )
//! .unwrap();
//! stream.feed("name\nAda\nGrace\n").unwrap();
//! stream.end().unwrap();
//! drop(stream);
//!
//! assert_eq!(names, ["Ada", "Grace"]);
//! ```

use crate::error::{CsvError, Result};
use crate::types::Row;
use std::collections::VecDeque;
use std::sync::mpsc;

/// Receives rows in the order they complete
pub trait RowSink {
    /// Accept one row; an error ends the session
    fn push(&mut self, row: Row) -> Result<()>;
}

impl RowSink for Vec<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        Vec::push(self, row);
        Ok(())
    }
}

impl RowSink for VecDeque<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        self.push_back(row);
        Ok(())
    }
}

impl RowSink for mpsc::Sender<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        self.send(row)
            .map_err(|_| CsvError::SinkClosed("Row receiver dropped".to_string()))
    }
}

impl RowSink for mpsc::SyncSender<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        self.send(row)
            .map_err(|_| CsvError::SinkClosed("Row receiver dropped".to_string()))
    }
}

#[cfg(feature = "tokio")]
impl RowSink for tokio::sync::mpsc::UnboundedSender<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        self.send(row)
            .map_err(|_| CsvError::SinkClosed("Row receiver dropped".to_string()))
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn push(&mut self, row: Row) -> Result<()> {
        (**self).push(row)
    }
}

impl<S: RowSink + ?Sized> RowSink for Box<S> {
    fn push(&mut self, row: Row) -> Result<()> {
        (**self).push(row)
    }
}

/// Sink backed by a closure, see [`from_fn`]
pub struct FnSink<F>(F);

impl<F> RowSink for FnSink<F>
where
    F: FnMut(Row) -> Result<()>,
{
    fn push(&mut self, row: Row) -> Result<()> {
        (self.0)(row)
    }
}

/// Wrap a closure as a [`RowSink`]
pub fn from_fn<F>(f: F) -> FnSink<F>
where
    F: FnMut(Row) -> Result<()>,
{
    FnSink(f)
}

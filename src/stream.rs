//! Push-style parsing session

use crate::csv::{Chunk, CsvOptions, Tokenizer};
use crate::error::{CsvError, Result};
use crate::sink::RowSink;
use crate::types::Key;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Open,
    Ended,
    Failed,
}

/// A tokenizer bound to a row sink
///
/// Chunks go in through [`CsvStream::feed`]; each completed row is pushed to
/// the sink before `feed` returns. Any error is terminal: later calls fail
/// with [`CsvError::InvalidState`].
///
/// # Examples
///
/// ```
/// use csvstream::{CsvOptions, CsvStream};
///
/// let mut stream = CsvStream::new(CsvOptions::default(), Vec::new()).unwrap();
/// stream.feed("id,name\n1,Ada\n2,Gra").unwrap();
/// assert_eq!(stream.rows_emitted(), 1);
///
/// stream.feed("ce\n").unwrap();
/// let rows = stream.finish().unwrap();
/// assert_eq!(rows[1].get_str("name"), Some("Grace"));
/// ```
///
/// Byte sources can be copied straight in, since the stream is also an
/// [`io::Write`]:
///
/// ```
/// use csvstream::{CsvOptions, CsvStream};
///
/// let mut stream = CsvStream::new(CsvOptions::new().no_headers(), Vec::new()).unwrap();
/// std::io::copy(&mut &b"a,b\nc,d\n"[..], &mut stream).unwrap();
/// assert_eq!(stream.finish().unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct CsvStream<S: RowSink> {
    tokenizer: Tokenizer,
    sink: S,
    status: Status,
}

impl<S: RowSink> CsvStream<S> {
    /// Create a session; invalid options fail here, before any input
    pub fn new(options: CsvOptions, sink: S) -> Result<Self> {
        Ok(CsvStream {
            tokenizer: Tokenizer::new(options)?,
            sink,
            status: Status::Open,
        })
    }

    /// Feed one text or byte chunk
    pub fn feed<'a, C: Into<Chunk<'a>>>(&mut self, chunk: C) -> Result<()> {
        self.check_open()?;
        let result = self.tokenizer.feed(chunk, &mut self.sink);
        self.settle(result)
    }

    /// Signal end of input, emitting the trailing partial row
    pub fn end(&mut self) -> Result<()> {
        self.check_open()?;
        let result = self.tokenizer.flush(&mut self.sink);
        if result.is_ok() {
            self.status = Status::Ended;
        }
        self.settle(result)
    }

    /// End the input and return the sink
    pub fn finish(mut self) -> Result<S> {
        self.end()?;
        Ok(self.sink)
    }

    /// Borrow the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink, e.g. to drain collected rows between chunks
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Take the sink without ending the input
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Resolved header keys
    pub fn headers(&self) -> &[Key] {
        self.tokenizer.headers()
    }

    /// Data rows pushed so far
    pub fn rows_emitted(&self) -> u64 {
        self.tokenizer.rows_emitted()
    }

    /// True once [`CsvStream::end`] succeeded
    pub fn is_ended(&self) -> bool {
        self.status == Status::Ended
    }

    /// True after an error
    pub fn is_failed(&self) -> bool {
        self.status == Status::Failed
    }

    fn check_open(&self) -> Result<()> {
        match self.status {
            Status::Open => Ok(()),
            Status::Ended => Err(CsvError::InvalidState("Stream already ended".to_string())),
            Status::Failed => Err(CsvError::InvalidState(
                "Stream failed earlier and cannot continue".to_string(),
            )),
        }
    }

    fn settle(&mut self, result: Result<()>) -> Result<()> {
        if let Err(ref e) = result {
            tracing::debug!(error = %e, rows = self.rows_emitted(), "csv stream failed");
            self.status = Status::Failed;
        }
        result
    }
}

impl<S: RowSink> io::Write for CsvStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.feed(buf) {
            Ok(()) => Ok(buf.len()),
            Err(CsvError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }

    // Rows are pushed as soon as they complete; nothing is held back here
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink;
    use crate::types::Row;
    use std::io::Write;
    use std::sync::mpsc;

    #[test]
    fn test_feed_and_finish() {
        let mut stream = CsvStream::new(CsvOptions::default(), Vec::new()).unwrap();
        stream.feed("a,b\n1,").unwrap();
        assert!(stream.sink().is_empty());
        assert_eq!(stream.headers(), &[Key::from("a"), Key::from("b")]);

        stream.feed("2").unwrap();
        let rows = stream.finish().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("b"), Some("2"));
    }

    #[test]
    fn test_drain_between_chunks() {
        let mut stream = CsvStream::new(CsvOptions::new().no_headers(), Vec::new()).unwrap();
        stream.feed("1\n2\n").unwrap();
        let first: Vec<Row> = stream.sink_mut().drain(..).collect();
        stream.feed("3\n").unwrap();
        stream.end().unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(stream.sink()[0].index, 2);
        assert!(stream.is_ended());
    }

    #[test]
    fn test_feed_after_end() {
        let mut stream = CsvStream::new(CsvOptions::default(), Vec::new()).unwrap();
        stream.end().unwrap();
        assert!(matches!(stream.feed("x"), Err(CsvError::InvalidState(_))));
        assert!(matches!(stream.end(), Err(CsvError::InvalidState(_))));
        assert!(!stream.is_failed());
    }

    #[test]
    fn test_sink_error_is_terminal() {
        let (tx, rx) = mpsc::channel::<Row>();
        drop(rx);
        let mut stream = CsvStream::new(CsvOptions::new().no_headers(), tx).unwrap();

        assert!(matches!(stream.feed("a\n"), Err(CsvError::SinkClosed(_))));
        assert!(stream.is_failed());
        assert!(matches!(stream.feed("b\n"), Err(CsvError::InvalidState(_))));
        assert!(matches!(stream.end(), Err(CsvError::InvalidState(_))));
    }

    #[test]
    fn test_mixed_chunks_fail_the_stream() {
        let mut stream = CsvStream::new(CsvOptions::default(), Vec::new()).unwrap();
        stream.feed("a\n").unwrap();
        assert!(matches!(
            stream.feed(b"b\n"),
            Err(CsvError::TokenizationError(_))
        ));
        assert!(stream.is_failed());
    }

    #[test]
    fn test_invalid_options() {
        let err = CsvStream::new(CsvOptions::new().encoding("nope"), Vec::new()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_write_impl() {
        let mut count = 0;
        let mut stream = CsvStream::new(
            CsvOptions::default(),
            sink::from_fn(|_row| {
                count += 1;
                Ok(())
            }),
        )
        .unwrap();

        stream.write_all("x\n1\n".as_bytes()).unwrap();
        stream.write_all(&[0xE2, 0x82]).unwrap();
        stream.write_all(&[0xAC, b'\n']).unwrap();
        stream.flush().unwrap();
        stream.end().unwrap();
        drop(stream);

        assert_eq!(count, 2);
    }

    #[test]
    fn test_write_after_text_chunk_is_invalid_data() {
        let mut stream = CsvStream::new(CsvOptions::default(), Vec::new()).unwrap();
        stream.feed("a\n").unwrap();
        let err = stream.write(b"b").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

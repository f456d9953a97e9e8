//! Pull-style CSV reading over any [`std::io::Read`]

use crate::csv::{CsvOptions, InputMode, Tokenizer};
use crate::error::{CsvError, Result};
use crate::types::{Key, Row};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Default read size
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Pull readers hand the tokenizer raw bytes; `Text` cannot work for them
pub(crate) fn bytes_options(options: CsvOptions) -> Result<CsvOptions> {
    match options.get_input() {
        InputMode::Text => Err(CsvError::ConfigurationError(
            "Readers produce byte chunks, input mode Text is not supported".to_string(),
        )),
        _ => Ok(options.input(InputMode::Bytes)),
    }
}

/// CSV reader with streaming capabilities
///
/// Reads the source in fixed-size chunks and yields rows one by one. Memory
/// use is bounded by the chunk size plus the longest row.
///
/// # Examples
///
/// ```
/// use csvstream::{CsvOptions, CsvReader};
///
/// let data = "name,city\nAda,London\nGrace,\"New York\"\n";
/// let mut reader = CsvReader::from_reader(data.as_bytes(), CsvOptions::default()).unwrap();
///
/// let mut cities = Vec::new();
/// for row_result in reader.rows() {
///     let row = row_result.unwrap();
///     cities.push(row.get_str("city").unwrap().to_string());
/// }
/// assert_eq!(cities, ["London", "New York"]);
/// ```
///
/// # Reading a file
///
/// ```no_run
/// use csvstream::{CsvOptions, CsvReader};
///
/// let mut reader = CsvReader::open("data.csv", CsvOptions::new().encoding("latin1")).unwrap();
///
/// while let Some(row) = reader.read_row().unwrap() {
///     println!("{:?}", row.to_strings());
/// }
/// ```
pub struct CsvReader<R: Read> {
    source: R,
    tokenizer: Tokenizer,
    buffer: Vec<u8>,
    ready: VecDeque<Row>,
    row_count: u64,
    eof: bool,
    failed: bool,
}

impl CsvReader<File> {
    /// Open a CSV file
    pub fn open<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CsvError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open CSV file {}: {}", path.display(), e),
            ))
        })?;
        Self::from_reader(file, options)
    }
}

impl<R: Read> CsvReader<R> {
    /// Wrap a byte source
    ///
    /// Fails with [`CsvError::ConfigurationError`] for invalid options or
    /// [`InputMode::Text`].
    pub fn from_reader(source: R, options: CsvOptions) -> Result<Self> {
        Ok(CsvReader {
            source,
            tokenizer: Tokenizer::new(bytes_options(options)?)?,
            buffer: vec![0; CHUNK_SIZE],
            ready: VecDeque::new(),
            row_count: 0,
            eof: false,
            failed: false,
        })
    }

    /// Set read size in bytes (builder pattern)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.buffer.resize(size.max(1), 0);
        self
    }

    /// Read the next data row
    ///
    /// Returns `Ok(None)` once the source is exhausted. After an error every
    /// call fails with [`CsvError::InvalidState`].
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if self.failed {
            return Err(CsvError::InvalidState(
                "Reader failed earlier and cannot continue".to_string(),
            ));
        }
        loop {
            if let Some(row) = self.ready.pop_front() {
                self.row_count += 1;
                return Ok(Some(row));
            }
            if self.eof {
                return Ok(None);
            }
            if let Err(e) = self.fill() {
                tracing::debug!(error = %e, rows = self.row_count, "csv reader failed");
                self.failed = true;
                return Err(e);
            }
        }
    }

    /// Get iterator over rows
    pub fn rows(&mut self) -> CsvRowIterator<'_, R> {
        CsvRowIterator {
            reader: self,
            done: false,
        }
    }

    /// Get header keys, once the header row has been read
    pub fn headers(&self) -> Option<&[Key]> {
        let headers = self.tokenizer.headers();
        if headers.is_empty() {
            None
        } else {
            Some(headers)
        }
    }

    /// Get the number of rows returned so far
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Feed one chunk from the source, or flush at end of input
    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.source.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            self.eof = true;
            self.tokenizer.flush(&mut self.ready)
        } else {
            self.tokenizer.feed(&self.buffer[..n], &mut self.ready)
        }
    }
}

/// Iterator over CSV rows; stops after the first error
pub struct CsvRowIterator<'a, R: Read> {
    reader: &'a mut CsvReader<R>,
    done: bool,
}

impl<R: Read> Iterator for CsvRowIterator<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Yields at most `step` bytes per read
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_plain_csv() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"Name,Age,City\nAlice,30,NYC\nBob,25,SF\n")?;

        let mut reader = CsvReader::open(file.path(), CsvOptions::default())?;
        assert_eq!(reader.headers(), None);

        let mut rows = vec![];
        for row_result in reader.rows() {
            rows.push(row_result?);
        }

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_strings(), vec!["Alice", "30", "NYC"]);
        assert_eq!(rows[1].get_str("City"), Some("SF"));
        assert_eq!(
            reader.headers(),
            Some(&[Key::from("Name"), Key::from("Age"), Key::from("City")][..])
        );
        assert_eq!(reader.row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_trickled_multibyte() -> Result<()> {
        let data = "k,v\n\"á\nb\",€\n".as_bytes();
        let source = Trickle { data, step: 1 };
        let mut reader = CsvReader::from_reader(source, CsvOptions::default())?.chunk_size(3);

        let row = reader.read_row()?.unwrap();
        assert_eq!(row.get_str("k"), Some("á\nb"));
        assert_eq!(row.get_str("v"), Some("€"));
        assert!(reader.read_row()?.is_none());
        assert!(reader.read_row()?.is_none());
        Ok(())
    }

    #[test]
    fn test_latin1_file() -> Result<()> {
        let source: &[u8] = b"caf\xe9,na\xefve\n";
        let options = CsvOptions::new().no_headers().encoding("latin1");
        let rows: Vec<Row> = CsvReader::from_reader(source, options)?
            .rows()
            .collect::<Result<_>>()?;
        assert_eq!(rows[0].to_strings(), vec!["café", "naïve"]);
        Ok(())
    }

    /// Fails once after yielding `head`, then serves `tail`
    struct FlakySource<'a> {
        head: &'a [u8],
        tail: &'a [u8],
        failed: bool,
    }

    impl<'a> Read for FlakySource<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let data: &mut &'a [u8] = if !self.head.is_empty() {
                &mut self.head
            } else if !self.failed {
                self.failed = true;
                return Err(std::io::Error::other("connection reset"));
            } else {
                &mut self.tail
            };
            let chunk: &'a [u8] = *data;
            let n = buf.len().min(chunk.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            *data = &chunk[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_error_is_terminal() -> Result<()> {
        let source = FlakySource {
            head: b"a\n1\n\"par",
            tail: b"tial\"\n2\n",
            failed: false,
        };
        let mut reader = CsvReader::from_reader(source, CsvOptions::default())?;

        assert_eq!(reader.read_row()?.unwrap().get_str("a"), Some("1"));
        assert!(matches!(reader.read_row(), Err(CsvError::Io(_))));
        assert!(matches!(reader.read_row(), Err(CsvError::InvalidState(_))));

        let rest: Vec<_> = reader.rows().collect();
        assert_eq!(rest.len(), 1);
        assert!(matches!(rest[0], Err(CsvError::InvalidState(_))));
        assert_eq!(reader.row_count(), 1);
        Ok(())
    }

    #[test]
    fn test_text_mode_rejected() {
        let source: &[u8] = b"";
        let err = CsvReader::from_reader(source, CsvOptions::new().input(InputMode::Text));
        assert!(matches!(err, Err(CsvError::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::open("/nonexistent/dir/data.csv", CsvOptions::default());
        assert!(matches!(err, Err(CsvError::Io(_))));
    }
}

//! Async CSV reading over a tokio [`AsyncRead`]

use crate::csv::{CsvOptions, Tokenizer};
use crate::csv_reader::{bytes_options, CHUNK_SIZE};
use crate::error::{CsvError, Result};
use crate::types::{Key, Row};
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Async counterpart of [`CsvReader`](crate::CsvReader)
///
/// # Examples
///
/// ```
/// use csvstream::{AsyncCsvReader, CsvOptions};
///
/// # run();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn run() {
/// let data: &[u8] = b"id,name\n1,Ada\n2,Grace\n";
/// let mut reader = AsyncCsvReader::new(data, CsvOptions::default()).unwrap();
///
/// while let Some(row) = reader.next_row().await.unwrap() {
///     println!("{}", row.get_str("name").unwrap());
/// }
/// # }
/// ```
pub struct AsyncCsvReader<R> {
    source: R,
    tokenizer: Tokenizer,
    buffer: Vec<u8>,
    ready: VecDeque<Row>,
    eof: bool,
    failed: bool,
}

impl<R: AsyncRead + Unpin> AsyncCsvReader<R> {
    /// Wrap an async byte source
    pub fn new(source: R, options: CsvOptions) -> Result<Self> {
        Ok(AsyncCsvReader {
            source,
            tokenizer: Tokenizer::new(bytes_options(options)?)?,
            buffer: vec![0; CHUNK_SIZE],
            ready: VecDeque::new(),
            eof: false,
            failed: false,
        })
    }

    /// Set read size in bytes (builder pattern)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.buffer.resize(size.max(1), 0);
        self
    }

    /// Next data row, or `None` at end of input
    ///
    /// After an error every call fails with [`CsvError::InvalidState`].
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        if self.failed {
            return Err(CsvError::InvalidState(
                "Reader failed earlier and cannot continue".to_string(),
            ));
        }
        loop {
            if let Some(row) = self.ready.pop_front() {
                return Ok(Some(row));
            }
            if self.eof {
                return Ok(None);
            }
            if let Err(e) = self.fill().await {
                tracing::debug!(error = %e, "async csv reader failed");
                self.failed = true;
                return Err(e);
            }
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let n = self.source.read(&mut self.buffer).await?;
        if n == 0 {
            self.eof = true;
            self.tokenizer.flush(&mut self.ready)
        } else {
            self.tokenizer.feed(&self.buffer[..n], &mut self.ready)
        }
    }

    /// Read every remaining row
    pub async fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Header keys, once the header row has been read
    pub fn headers(&self) -> Option<&[Key]> {
        let headers = self.tokenizer.headers();
        if headers.is_empty() {
            None
        } else {
            Some(headers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_rows() {
        let data: &[u8] = "a;b\n1;\"x;y\"\n2;€\n".as_bytes();
        let reader = AsyncCsvReader::new(data, CsvOptions::new().delimiter(';'))
            .unwrap()
            .chunk_size(2);

        let rows = reader.collect_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("b"), Some("x;y"));
        assert_eq!(rows[1].get_str("b"), Some("€"));
    }

    #[tokio::test]
    async fn test_duplex_source() {
        use tokio::io::AsyncWriteExt;

        let (mut tx, rx) = tokio::io::duplex(4);
        let writer = tokio::spawn(async move {
            tx.write_all(b"n\n1\n2\n3").await.unwrap();
        });

        let mut reader = AsyncCsvReader::new(rx, CsvOptions::default()).unwrap();
        let mut seen = Vec::new();
        while let Some(row) = reader.next_row().await.unwrap() {
            seen.push(row.get_str("n").unwrap().to_string());
        }
        writer.await.unwrap();

        assert_eq!(seen, ["1", "2", "3"]);
        assert_eq!(reader.headers(), Some(&[Key::from("n")][..]));
    }

    #[tokio::test]
    async fn test_io_error_propagates() {
        let source = failing_reader();
        let mut reader = AsyncCsvReader::new(source, CsvOptions::default()).unwrap();
        assert!(matches!(reader.next_row().await, Err(CsvError::Io(_))));
        assert!(matches!(
            reader.next_row().await,
            Err(CsvError::InvalidState(_))
        ));
    }

    fn failing_reader() -> impl AsyncRead + Unpin {
        struct Failing;
        impl AsyncRead for Failing {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::other("boom")))
            }
        }
        Failing
    }
}

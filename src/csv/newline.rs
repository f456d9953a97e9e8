//! Row terminators

use crate::error::{CsvError, Result};
use std::fmt;
use std::str::FromStr;

/// Row terminator variant
///
/// Only the configured sequence ends a row. With [`Newline::CrLf`] a bare
/// `\r` is field content; with [`Newline::Lf`] a `\r` before the `\n` stays
/// at the end of the last field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Newline {
    /// `\n`
    #[default]
    Lf,
    /// `\r`
    Cr,
    /// `\r\n`
    CrLf,
    /// `\n\r`
    LfCr,
}

impl Newline {
    /// The terminator text
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::Cr => "\r",
            Newline::CrLf => "\r\n",
            Newline::LfCr => "\n\r",
        }
    }

    /// First character of the terminator (must differ from delimiter and quote)
    pub fn first_char(&self) -> char {
        match self {
            Newline::Lf | Newline::LfCr => '\n',
            Newline::Cr | Newline::CrLf => '\r',
        }
    }

    /// Terminator length in bytes
    pub fn byte_len(&self) -> usize {
        self.as_str().len()
    }

    /// Option name (`lf`, `cr`, `crlf`, `lfcr`)
    pub fn name(&self) -> &'static str {
        match self {
            Newline::Lf => "lf",
            Newline::Cr => "cr",
            Newline::CrLf => "crlf",
            Newline::LfCr => "lfcr",
        }
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the option names in any case, or the literal terminator text
impl FromStr for Newline {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lf" | "\n" => Ok(Newline::Lf),
            "cr" | "\r" => Ok(Newline::Cr),
            "crlf" | "\r\n" => Ok(Newline::CrLf),
            "lfcr" | "\n\r" => Ok(Newline::LfCr),
            _ => Err(CsvError::ConfigurationError(format!(
                "Unsupported newline {:?}, expected one of lf, cr, crlf, lfcr",
                s
            ))),
        }
    }
}

//! CSV tokenizing: options, decoding, the state machine and row assembly

mod decoder;
mod newline;
mod options;
mod row_builder;
mod state;
mod tokenizer;

pub use decoder::{Chunk, Decoder};
pub use newline::Newline;
pub use options::{CsvOptions, HeaderFn, HeaderMode, InputMode, ValueFn, ValueMode};
pub use row_builder::RowBuilder;
pub use state::ParseState;
pub use tokenizer::Tokenizer;

//! Scanning
//!
//! Turns emd text into tokens and reads typed values from them.
//!
//! - [`token`]: the logos token set and [`tokenize`], which tags each token
//!   with its line.
//! - [`scanner`]: the [`Scanner`], a stack of tokenized inputs with `$NAME`
//!   constant expansion and the `scan_*` readers the parser calls.
//!
//! The grammar is small enough that all lookahead the parser needs is one
//! token, so inputs are tokenized eagerly and read through a cursor.

pub mod scanner;
pub mod token;

pub use scanner::{Scanner, STRING_INPUT_LABEL};
pub use token::{tokenize, Lexeme, Token};

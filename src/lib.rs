pub mod api;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod reader;

pub use api::{decode, decode_reader, decode_unchecked, decode_with_options};
pub use ast::*;
pub use error::*;
pub use parser::{DecodeOptions, Decoder};

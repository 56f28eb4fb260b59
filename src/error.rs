//! # Error Types
//!
//! This module defines all error types for the ABC decoder.
//!
//! Every failure aborts the decode of the whole document; there is no partial result.
//!
//! ## Error Types
//! - `Io` - The underlying stream failed, including premature end of input
//! - `NotAnAbcFile` - Missing or malformed `%abc` line, or a file header not followed by a blank line
//! - `MissingReferenceNumber` / `MissingTitle` / `MissingKey` - Tune header structure violations
//! - `MalformedMeter` - `M:` field that is not `top/bottom`
//! - `MalformedDuration` - A `/` in a note length with no denominator digits
//! - `InvalidReferenceNumber` - `X:` field that is not an unsigned integer
//! - `NoPrecedingUnit` - Broken rhythm (`<` or `>`) with nothing before it in the note group
//!
//! Unknown information fields and free-text lines are *not* errors.
//!
//! ## Usage
//! ```rust
//! use abc::{decode, AbcError};
//!
//! match decode(b"hello\n") {
//!     Ok(document) => println!("{} tunes", document.tunes.len()),
//!     Err(AbcError::NotAnAbcFile(cause)) => eprintln!("not ABC: {}", cause),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbcError {
    /// The underlying stream failed.
    ///
    /// Running out of input before a line, field or delimiter is complete is
    /// reported here with [`io::ErrorKind::UnexpectedEof`].
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input does not look like an ABC file.
    ///
    /// # Example
    /// ```
    /// # use abc::AbcError;
    /// let err = AbcError::NotAnAbcFile("first line does not start with %abc".to_string());
    /// assert_eq!(err.to_string(), "Not an ABC file: first line does not start with %abc");
    /// ```
    #[error("Not an ABC file: {0}")]
    NotAnAbcFile(String),

    /// A tune header did not start with an `X:` field.
    #[error("Tune header at line {line} must start with a reference number (X:) field")]
    MissingReferenceNumber { line: usize },

    /// The second field of a tune header was not a non-empty `T:` field.
    #[error("Tune {reference} at line {line}: second header field must be the title (T:)")]
    MissingTitle { line: usize, reference: u64 },

    /// A blank line ended a tune header before its `K:` field.
    #[error("Tune {reference} at line {line}: tune header ended without a key (K:) field")]
    MissingKey { line: usize, reference: u64 },

    /// # Example
    /// ```
    /// # use abc::AbcError;
    /// let err = AbcError::MalformedMeter { line: 3, value: "C".to_string() };
    /// assert_eq!(err.to_string(), "Malformed meter 'C' at line 3: expected top/bottom");
    /// ```
    #[error("Malformed meter '{value}' at line {line}: expected top/bottom")]
    MalformedMeter { line: usize, value: String },

    #[error("Malformed duration at line {line}, column {column}: '/' without a denominator")]
    MalformedDuration { line: usize, column: usize },

    #[error("Invalid reference number '{value}' at line {line}")]
    InvalidReferenceNumber { line: usize, value: String },

    /// Broken rhythm with an empty current note group.
    ///
    /// # Example
    /// ```
    /// # use abc::AbcError;
    /// let err = AbcError::NoPrecedingUnit { line: 4, column: 1 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Broken rhythm at line 4, column 1 has no preceding note in its group"
    /// );
    /// ```
    #[error("Broken rhythm at line {line}, column {column} has no preceding note in its group")]
    NoPrecedingUnit { line: usize, column: usize },
}

impl AbcError {
    /// True for every variant except [`AbcError::Io`].
    pub fn is_format_error(&self) -> bool {
        !matches!(self, AbcError::Io(_))
    }

    pub(crate) fn unexpected_eof(what: &str) -> Self {
        AbcError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("unexpected end of input while reading {}", what),
        ))
    }
}

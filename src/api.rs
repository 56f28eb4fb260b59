//! # Public API
//!
//! This module contains the main entry points for the ABC decoder library.
//!
//! ## Decoding Functions
//!
//! - [`decode()`] - Full decode, requiring the `%abc-<version>` first line
//! - [`decode_unchecked()`] - Skip the first-line check (useful for fragments)
//! - [`decode_with_options()`] - Explicit [`DecodeOptions`]
//! - [`decode_reader()`] - Read everything from an [`io::Read`] first
//!
//! ## Typical Usage
//!
//! ```rust
//! use abc::decode;
//!
//! let source = b"%abc-2.1
//! X:1
//! T:The Kesh
//! M:6/8
//! K:G
//! GAG GAB|ABA ABd|
//! ";
//!
//! let document = decode(source)?;
//! assert_eq!(document.tunes[0].title, "The Kesh");
//! # Ok::<(), abc::AbcError>(())
//! ```

use crate::{AbcError, DecodeOptions, Decoder, Document};
use std::io;

/// Decode a complete ABC file.
///
/// # Pipeline
/// 1. Skip a byte-order mark
/// 2. Check the `%abc-<version>` line
/// 3. Read the optional file header
/// 4. Read each tune header and tune body
///
/// # Errors
/// Returns [`AbcError`] if the input is not ABC, is structurally invalid, or
/// ends in the middle of a construct.
pub fn decode(source: &[u8]) -> Result<Document, AbcError> {
    decode_with_options(source, DecodeOptions::default())
}

/// Decode without requiring the `%abc` first line.
///
/// # Example
/// ```rust
/// let document = abc::decode_unchecked(b"X:1\nT:Scale\nK:C\nCDEF GABc|\n")?;
/// assert_eq!(document.tunes[0].units().count(), 8);
/// # Ok::<(), abc::AbcError>(())
/// ```
pub fn decode_unchecked(source: &[u8]) -> Result<Document, AbcError> {
    decode_with_options(source, DecodeOptions::unchecked())
}

pub fn decode_with_options(source: &[u8], options: DecodeOptions) -> Result<Document, AbcError> {
    Decoder::new(source, options).decode()
}

/// Reads `reader` to the end, then decodes. Read failures surface as
/// [`AbcError::Io`].
pub fn decode_reader<R: io::Read>(mut reader: R, options: DecodeOptions) -> Result<Document, AbcError> {
    let mut source = Vec::new();
    reader.read_to_end(&mut source)?;
    decode_with_options(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"))
        }
    }

    #[test]
    fn test_decode_reader() {
        let source: &[u8] = b"%abc-2.1\nX:1\nT:Reader\nK:D\nDFA|\n";
        let document = decode_reader(source, DecodeOptions::default()).unwrap();
        assert_eq!(document.tunes[0].key, "D");
    }

    #[test]
    fn test_decode_reader_propagates_io_errors() {
        match decode_reader(FailingReader, DecodeOptions::default()) {
            Err(AbcError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_requires_version_line() {
        let source = b"X:1\nT:No header\nK:C\nC|\n";
        assert!(matches!(decode(source), Err(AbcError::NotAnAbcFile(_))));
        assert!(decode_unchecked(source).is_ok());
    }
}

//! # Decoder
//!
//! Recursive-descent decoder for ABC source.
//!
//! ## Pipeline
//! ```text
//! skip BOM → [%abc-<version> line] → skip comments
//!          → [file header → blank line]
//!          → { tune header (X: T: ... K:) → tune body }*
//! ```
//!
//! The `%abc` line check can be turned off with [`DecodeOptions`] for
//! fragments that do not carry it.
//!
//! ## Related Modules
//! - `fields` - Information fields (`X:`, `T:`, `M:`, `[K:D]`, ...)
//! - `body` - Music lines: notes, rests, chords, barlines, broken rhythm
//! - `duration` - Note lengths and broken-rhythm scaling

mod body;
pub mod duration;
mod fields;

use crate::ast::Document;
use crate::error::AbcError;
use crate::reader::Reader;
use duration::BrokenRhythm;
use serde::{Deserialize, Serialize};

const MAGIC_NUMBER: &[u8] = b"%abc";

/// Decoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DecodeOptions {
    /// Require and parse the `%abc-<version>` first line.
    pub check_version_line: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            check_version_line: true,
        }
    }
}

impl DecodeOptions {
    /// Options for fragments without the `%abc` line.
    pub fn unchecked() -> Self {
        Self {
            check_version_line: false,
        }
    }
}

/// Field whose value a `+:` line extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContinuableField {
    Discography,
    History,
    Words,
}

/// Mutable state carried across the recursive-descent calls.
#[derive(Debug, Default)]
pub(crate) struct ParserState {
    pub(crate) in_file_header: bool,
    pub(crate) tune_header_done: bool,
    pub(crate) last_field: Option<ContinuableField>,
    pub(crate) broken_rhythm: BrokenRhythm,
    /// Annotation text waiting for the next unit.
    pub(crate) pending_annotation: Option<String>,
}

/// Single-use decoder over a complete input buffer.
pub struct Decoder<'a> {
    pub(crate) reader: Reader<'a>,
    options: DecodeOptions,
    pub(crate) state: ParserState,
    pub(crate) document: Document,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            reader: Reader::new(input),
            options,
            state: ParserState::default(),
            document: Document::default(),
        }
    }

    /// Decodes the whole input. Any error aborts the decode; no partial
    /// document is returned.
    pub fn decode(mut self) -> Result<Document, AbcError> {
        self.reader.skip_bom();

        if self.options.check_version_line {
            self.read_version_line()?;
        }

        self.reader.skip_blank_and_comment_lines();
        if self.read_file_header()? {
            self.read_header_separator()?;
        }

        let mut first_tune = true;
        loop {
            self.reader.skip_blank_and_comment_lines();
            if self.reader.is_eof() {
                break;
            }
            if !first_tune && !self.reader.starts_with(b"X:") {
                log::debug!("line {}: skipping free text between tunes", self.reader.line());
                self.reader.skip_line();
                continue;
            }
            self.read_tune_header()?;
            self.read_tune_body()?;
            first_tune = false;
        }

        if let Some(annotation) = self.state.pending_annotation.take() {
            log::debug!("annotation '{}' has no unit to attach to", annotation);
        }
        log::info!("decoded {} tune(s)", self.document.tunes.len());
        Ok(self.document)
    }

    /// Checks the `%abc[-<version>]` first line.
    fn read_version_line(&mut self) -> Result<(), AbcError> {
        let line = self.reader.read_line_raw()?;
        if line.len() < MAGIC_NUMBER.len() {
            return Err(AbcError::NotAnAbcFile("first line too short".to_string()));
        }
        if !line.starts_with(MAGIC_NUMBER) {
            return Err(AbcError::NotAnAbcFile(
                "first line does not start with %abc".to_string(),
            ));
        }

        let rest = &line[MAGIC_NUMBER.len()..];
        let rest = rest.strip_prefix(b"-").unwrap_or(rest);
        let version = String::from_utf8_lossy(rest);
        let version = version.trim();
        if version.is_empty() {
            return Ok(());
        }

        let version: f32 = version.parse().map_err(|_| {
            AbcError::NotAnAbcFile(format!("could not parse version number '{}'", version))
        })?;
        if version <= 2.0 {
            log::warn!("abc version {} is older than 2.1", version);
        }
        self.document.version = Some(version);
        Ok(())
    }

    /// Reads the optional file header. Returns whether one was present.
    fn read_file_header(&mut self) -> Result<bool, AbcError> {
        match self.reader.peek() {
            None | Some(b'X') => return Ok(false),
            Some(_) => {}
        }

        self.state.in_file_header = true;
        loop {
            self.read_information_field(false)?;
            if self.reader.is_eof() || self.reader.at_line_end() {
                break;
            }
        }
        self.state.in_file_header = false;
        Ok(true)
    }

    /// A file header must be followed by exactly one empty line.
    fn read_header_separator(&mut self) -> Result<(), AbcError> {
        let line = self.reader.read_line_raw()?;
        if !line.iter().all(u8::is_ascii_whitespace) {
            return Err(AbcError::NotAnAbcFile(
                "file header was not followed by an empty line".to_string(),
            ));
        }
        Ok(())
    }

    /// `X:` first, `T:` second, then fields until `K:`.
    fn read_tune_header(&mut self) -> Result<(), AbcError> {
        let line = self.reader.line();
        let before = self.document.tunes.len();

        self.read_information_field(false)?;
        if self.document.tunes.len() == before {
            return Err(AbcError::MissingReferenceNumber { line });
        }

        self.read_information_field(false)?;
        let reference = self.current_reference();
        if self
            .document
            .current_tune_mut()
            .is_some_and(|tune| tune.title.is_empty())
        {
            return Err(AbcError::MissingTitle { line, reference });
        }

        while !self.state.tune_header_done {
            self.reader.skip_comment_lines();
            if self.reader.is_eof() {
                return Err(AbcError::unexpected_eof("a tune header"));
            }
            if self.reader.at_line_end() {
                return Err(AbcError::MissingKey {
                    line: self.reader.line(),
                    reference,
                });
            }
            self.read_information_field(false)?;
        }
        Ok(())
    }

    fn current_reference(&self) -> u64 {
        self.document
            .tunes
            .last()
            .map_or(0, |tune| tune.reference_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Meter;

    fn decode(source: &str) -> Result<Document, AbcError> {
        Decoder::new(source.as_bytes(), DecodeOptions::default()).decode()
    }

    fn decode_unchecked(source: &str) -> Result<Document, AbcError> {
        Decoder::new(source.as_bytes(), DecodeOptions::unchecked()).decode()
    }

    #[test]
    fn test_version_line() {
        let document = decode("%abc-2.1\nX:1\nT:Tune\nK:C\nABC\n").unwrap();
        assert_eq!(document.version, Some(2.1));
        assert!(!document.has_outdated_version());
        assert_eq!(document.tunes.len(), 1);
    }

    #[test]
    fn test_version_line_without_version() {
        let document = decode("%abc\nX:1\nT:Tune\nK:C\nABC\n").unwrap();
        assert_eq!(document.version, None);
    }

    #[test]
    fn test_old_version_is_only_advisory() {
        let document = decode("%abc-1.6\nX:1\nT:Tune\nK:C\nABC\n").unwrap();
        assert!(document.has_outdated_version());
    }

    #[test]
    fn test_not_an_abc_file() {
        assert!(matches!(decode("hello\n"), Err(AbcError::NotAnAbcFile(_))));
        assert!(matches!(decode("%ab\n"), Err(AbcError::NotAnAbcFile(_))));
        assert!(matches!(
            decode("%abc-two\nX:1\n"),
            Err(AbcError::NotAnAbcFile(_))
        ));
    }

    #[test]
    fn test_unchecked_skips_version_line() {
        let document = decode_unchecked("X:1\nT:Tune\nK:C\nABC\n").unwrap();
        assert_eq!(document.tunes[0].reference_number, 1);
    }

    #[test]
    fn test_bom_is_skipped() {
        let document = decode("\u{FEFF}%abc-2.1\nX:1\nT:Tune\nK:C\nABC\n").unwrap();
        assert_eq!(document.tunes.len(), 1);
    }

    #[test]
    fn test_file_header_only() {
        let document = decode_unchecked("M:3/4\nC:Trad\n\n").unwrap();
        assert_eq!(document.metadata.meter, Some(Meter { top: 3, bottom: 4 }));
        assert_eq!(document.metadata.composer.as_deref(), Some("Trad"));
        assert!(document.tunes.is_empty());
    }

    #[test]
    fn test_file_header_must_end_with_blank_line() {
        match decode_unchecked("C:Trad\n") {
            Err(AbcError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_before_file_header() {
        let document = decode("%abc-2.1\n% collection\n\nO:Ireland\n\nX:1\nT:Tune\nK:G\nGAB\n").unwrap();
        assert_eq!(document.metadata.origin.as_deref(), Some("Ireland"));
        assert_eq!(document.tunes[0].metadata.origin, None);
    }

    #[test]
    fn test_missing_reference_number() {
        match decode_unchecked("C:Trad\n\nT:Title\nK:G\nGAB\n") {
            Err(AbcError::MissingReferenceNumber { line }) => assert_eq!(line, 3),
            other => panic!("Expected MissingReferenceNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_title() {
        match decode_unchecked("X:4\nK:G\nGAB\n") {
            Err(AbcError::MissingTitle { reference, .. }) => assert_eq!(reference, 4),
            other => panic!("Expected MissingTitle, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_key() {
        match decode_unchecked("X:1\nT:Title\nC:Trad\n\nGAB\n") {
            Err(AbcError::MissingKey { line, reference }) => {
                assert_eq!((line, reference), (4, 1));
            }
            other => panic!("Expected MissingKey, got {:?}", other),
        }
    }

    #[test]
    fn test_tune_header_cut_short() {
        let err = decode_unchecked("X:1\nT:Title\nC:Trad\n").unwrap_err();
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_multiple_tunes() {
        let source = "X:1\nT:One\nK:C\nCDE|\n\nX:2\nT:Two\nK:G\nGAB|\n";
        let document = decode_unchecked(source).unwrap();
        assert_eq!(document.tunes.len(), 2);
        assert_eq!(document.tunes[0].title, "One");
        assert_eq!(document.tunes[1].title, "Two");
        assert_eq!(document.tunes[1].key, "G");
    }

    #[test]
    fn test_free_text_between_tunes_is_skipped() {
        let source = "X:1\nT:One\nK:C\nCDE\n\nSome words about the next tune.\n\nX:2\nT:Two\nK:G\nGAB\n";
        let document = decode_unchecked(source).unwrap();
        assert_eq!(document.tunes.len(), 2);
    }

    #[test]
    fn test_tune_without_body_still_has_a_measure() {
        let document = decode_unchecked("X:1\nT:Empty\nK:C\n").unwrap();
        let tune = &document.tunes[0];
        assert_eq!(tune.measures.len(), 1);
        assert_eq!(tune.measures[0].note_groups.len(), 1);
    }

    #[test]
    fn test_options_from_yaml() {
        let options: DecodeOptions = serde_yaml::from_str("check-version-line: false").unwrap();
        assert_eq!(options, DecodeOptions::unchecked());
        let options: DecodeOptions = serde_yaml::from_str("{}").unwrap();
        assert_eq!(options, DecodeOptions::default());
    }
}

use crate::error::AbcError;
use crate::lexer::Lookahead;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cuts `line` at the first `%` and trims surrounding whitespace.
fn trim_line(line: &[u8]) -> String {
    let text = match line.iter().position(|&b| b == b'%') {
        Some(comment) => &line[..comment],
        None => line,
    };
    String::from_utf8_lossy(text).trim().to_string()
}

/// Forward-only cursor over the input bytes.
///
/// Backtracking is never needed beyond peeking, so "pushing back" a byte just
/// means not consuming it.
pub struct Reader<'a> {
    input: &'a [u8],
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn remaining(&self) -> &'a [u8] {
        &self.input[self.position.min(self.input.len())..]
    }

    pub fn peek(&self) -> Option<u8> {
        self.remaining().first().copied()
    }

    pub fn lookahead(&self) -> Option<Lookahead> {
        Lookahead::new(self.remaining())
    }

    /// Like [`Reader::lookahead`], but running out of input is an error.
    pub fn peek_token(&self) -> Result<Lookahead, AbcError> {
        self.lookahead()
            .ok_or_else(|| AbcError::unexpected_eof("the next token"))
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.remaining().starts_with(prefix)
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.position += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            if self.advance().is_none() {
                break;
            }
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, AbcError> {
        self.advance().ok_or_else(|| AbcError::unexpected_eof("a byte"))
    }

    /// Consumes the byte when it is the next one.
    pub fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a leading U+FEFF; otherwise leaves the cursor where it is.
    pub fn skip_bom(&mut self) {
        if self.position == 0 && self.starts_with(BOM) {
            // The mark is not text, so it does not move the column either.
            self.position = BOM.len();
        }
    }

    /// True when the cursor sits on `\n` or `\r\n`.
    pub fn at_line_end(&self) -> bool {
        self.starts_with(b"\n") || self.starts_with(b"\r\n")
    }

    /// Reads through the next `\n` and returns the line without its terminator
    /// (a trailing `\r` is dropped too).
    pub fn read_line_raw(&mut self) -> Result<&'a [u8], AbcError> {
        let rest = self.remaining();
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| AbcError::unexpected_eof("a line"))?;
        let line = &rest[..end];
        self.advance_by(end + 1);
        Ok(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Reads a line, cuts it at the first `%` and trims surrounding whitespace.
    pub fn read_line_trimmed(&mut self) -> Result<String, AbcError> {
        let line = self.read_line_raw()?;
        Ok(trim_line(line))
    }

    /// Like [`Reader::read_line_trimmed`], but the last line of the input may
    /// lack its terminator.
    pub fn read_final_line_trimmed(&mut self) -> String {
        let rest = self.remaining();
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let line = &rest[..end];
        self.skip_line();
        trim_line(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Consumes the rest of the current line, terminator included. Unlike
    /// [`Reader::read_line_raw`] a missing final terminator is fine here.
    pub fn skip_line(&mut self) {
        while let Some(b) = self.advance() {
            if b == b'\n' {
                break;
            }
        }
    }

    /// Reads up to and including `close` and returns the text before it.
    /// The opening delimiter must already have been consumed.
    pub fn read_delimited(&mut self, close: u8) -> Result<String, AbcError> {
        let rest = self.remaining();
        let end = rest.iter().position(|&b| b == close).ok_or_else(|| {
            AbcError::unexpected_eof(&format!("text delimited by '{}'", close as char))
        })?;
        let text = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.advance_by(end + 1);
        Ok(text)
    }

    /// Skips whole lines that start with `%`.
    pub fn skip_comment_lines(&mut self) {
        while self.peek() == Some(b'%') {
            self.skip_line();
        }
    }

    /// Skips comment lines and empty lines.
    pub fn skip_blank_and_comment_lines(&mut self) {
        loop {
            self.skip_comment_lines();
            if self.at_line_end() {
                self.skip_line();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_line_strips_comment_and_whitespace() {
        let mut reader = Reader::new(b"  T:Paddy O'Rafferty  % a jig\nK:D\n");
        assert_eq!(reader.read_line_trimmed().unwrap(), "T:Paddy O'Rafferty");
        assert_eq!(reader.line(), 2);
        assert_eq!(reader.read_line_trimmed().unwrap(), "K:D");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_line_crlf() {
        let mut reader = Reader::new(b"C:Trad\r\n");
        assert_eq!(reader.read_line_raw().unwrap(), b"C:Trad");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_line_without_terminator_fails() {
        let mut reader = Reader::new(b"K:G");
        let err = reader.read_line_trimmed().unwrap_err();
        match err {
            AbcError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_final_line_may_lack_terminator() {
        let mut reader = Reader::new(b"w:la la % verse\nw:da");
        assert_eq!(reader.read_final_line_trimmed(), "w:la la");
        assert_eq!(reader.line(), 2);
        assert_eq!(reader.read_final_line_trimmed(), "w:da");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_delimited() {
        let mut reader = Reader::new(b"\"Am\"A2");
        assert_eq!(reader.read_byte().unwrap(), b'"');
        assert_eq!(reader.read_delimited(b'"').unwrap(), "Am");
        assert_eq!(reader.peek(), Some(b'A'));
        assert_eq!(reader.column(), 5);
    }

    #[test]
    fn test_read_delimited_unterminated() {
        let mut reader = Reader::new(b"CEG\n");
        assert!(reader.read_delimited(b']').is_err());
        // Nothing was consumed.
        assert_eq!(reader.peek(), Some(b'C'));
    }

    #[test]
    fn test_skip_bom() {
        let mut reader = Reader::new("\u{FEFF}X:1\n".as_bytes());
        reader.skip_bom();
        assert_eq!(reader.peek(), Some(b'X'));

        let mut plain = Reader::new(b"X:1\n");
        plain.skip_bom();
        assert_eq!(plain.peek(), Some(b'X'));
    }

    #[test]
    fn test_skip_comment_lines() {
        let mut reader = Reader::new(b"% one\n%two\nA B\n");
        reader.skip_comment_lines();
        assert_eq!(reader.peek(), Some(b'A'));
        assert_eq!(reader.line(), 3);
    }

    #[test]
    fn test_many_comment_lines_do_not_recurse() {
        let input = "%\n".repeat(100_000) + "X:1\n";
        let mut reader = Reader::new(input.as_bytes());
        reader.skip_comment_lines();
        assert!(reader.starts_with(b"X:"));
    }

    #[test]
    fn test_skip_blank_and_comment_lines() {
        let mut reader = Reader::new(b"\n% c\n\r\n\nX:2\n");
        reader.skip_blank_and_comment_lines();
        assert!(reader.starts_with(b"X:2"));
    }

    #[test]
    fn test_peek_token_at_eof() {
        let reader = Reader::new(b"");
        assert!(reader.peek_token().is_err());
        assert!(reader.lookahead().is_none());
    }
}

use crate::error::AbcError;
use crate::reader::Reader;

/// One-shot length change armed by `>` or `<` for the unit that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokenRhythm {
    #[default]
    None,
    HalveNext,
    DoubleNext,
}

impl BrokenRhythm {
    /// Scales `duration` by the pending modifier and disarms it.
    pub fn apply(&mut self, duration: f64) -> f64 {
        let scaled = match self {
            BrokenRhythm::None => duration,
            BrokenRhythm::HalveNext => duration / 2.0,
            BrokenRhythm::DoubleNext => duration * 2.0,
        };
        *self = BrokenRhythm::None;
        scaled
    }
}

fn read_digits(reader: &mut Reader) -> Option<f64> {
    let mut digits = String::new();
    while let Some(b) = reader.peek().filter(u8::is_ascii_digit) {
        digits.push(b as char);
        reader.eat(b);
    }
    // A run of ASCII digits always parses as a float.
    digits.parse().ok()
}

/// Reads the optional length after a note, rest or chord.
///
/// `""` is 1, `2` is 2, `/2` is 0.5, `3/4` is 0.75. In a fraction a zero
/// numerator counts as 1, so `0/2` is 0.5. A `/` with no digits after it, or
/// a zero denominator, is an error. The first byte that is not part of the
/// length is left unread, and the end of input simply ends the length.
pub fn read_duration(reader: &mut Reader) -> Result<f64, AbcError> {
    let numerator = read_digits(reader);

    if reader.peek() != Some(b'/') {
        return Ok(numerator.unwrap_or(1.0));
    }
    let (line, column) = (reader.line(), reader.column());
    reader.eat(b'/');

    let denominator = read_digits(reader)
        .filter(|d| *d != 0.0)
        .ok_or(AbcError::MalformedDuration { line, column })?;
    let numerator = numerator.filter(|n| *n != 0.0).unwrap_or(1.0);
    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duration(s: &str) -> Result<f64, AbcError> {
        read_duration(&mut Reader::new(s.as_bytes()))
    }

    #[test]
    fn test_default_duration() {
        assert_eq!(duration("").unwrap(), 1.0);
        assert_eq!(duration(" B").unwrap(), 1.0);
    }

    #[test]
    fn test_integer_duration() {
        assert_eq!(duration("2").unwrap(), 2.0);
        assert_eq!(duration("12|").unwrap(), 12.0);
    }

    #[test]
    fn test_fraction_durations() {
        assert_eq!(duration("/2").unwrap(), 0.5);
        assert_eq!(duration("3/4").unwrap(), 0.75);
        assert_eq!(duration("3/2B").unwrap(), 1.5);
    }

    #[test]
    fn test_slash_without_denominator_is_malformed() {
        match duration("/") {
            Err(AbcError::MalformedDuration { line, column }) => {
                assert_eq!((line, column), (1, 1));
            }
            other => panic!("Expected MalformedDuration, got {:?}", other),
        }
        assert!(duration("3/ B").is_err());
    }

    #[test]
    fn test_zero_numerator_counts_as_one() {
        assert_eq!(duration("0/2").unwrap(), 0.5);
        assert_eq!(duration("0").unwrap(), 0.0);
    }

    #[test]
    fn test_zero_denominator_is_malformed() {
        match duration("3/0") {
            Err(AbcError::MalformedDuration { line, column }) => {
                assert_eq!((line, column), (1, 2));
            }
            other => panic!("Expected MalformedDuration, got {:?}", other),
        }
        assert!(duration("/00").is_err());
    }

    #[test]
    fn test_trailing_byte_is_not_consumed() {
        let mut reader = Reader::new(b"3/4>");
        assert_eq!(read_duration(&mut reader).unwrap(), 0.75);
        assert_eq!(reader.peek(), Some(b'>'));

        let mut reader = Reader::new(b"B");
        assert_eq!(read_duration(&mut reader).unwrap(), 1.0);
        assert_eq!(reader.peek(), Some(b'B'));
    }

    #[test]
    fn test_broken_rhythm_is_one_shot() {
        let mut pending = BrokenRhythm::HalveNext;
        assert_eq!(pending.apply(2.0), 1.0);
        assert_eq!(pending, BrokenRhythm::None);
        assert_eq!(pending.apply(2.0), 2.0);

        let mut pending = BrokenRhythm::DoubleNext;
        assert_eq!(pending.apply(0.5), 1.0);
        assert_eq!(pending.apply(0.5), 0.5);
    }
}

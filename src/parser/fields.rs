use super::{ContinuableField, Decoder};
use crate::ast::{Metadata, Meter, Tune};
use crate::error::AbcError;

/// What reading one information-field unit produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldLine {
    /// A `Letter:value` field was dispatched.
    Field,
    /// Text without the `Letter:` shape.
    Text(String),
    /// The cursor was on an empty line; nothing was consumed.
    Blank,
}

/// Splits `Letter:value`. Anything else is free text.
pub(crate) fn split_field(text: &str) -> Option<(u8, &str)> {
    let bytes = text.as_bytes();
    match bytes {
        [letter, b':', ..] if letter.is_ascii() => Some((*letter, &text[2..])),
        _ => None,
    }
}

/// Parses `top/bottom`.
pub(crate) fn parse_meter(value: &str, line: usize) -> Result<Meter, AbcError> {
    let malformed = || AbcError::MalformedMeter {
        line,
        value: value.to_string(),
    };
    let (top, bottom) = value.split_once('/').ok_or_else(malformed)?;
    let top = top.trim().parse().map_err(|_| malformed())?;
    let bottom = bottom.trim().parse().map_err(|_| malformed())?;
    Ok(Meter { top, bottom })
}

fn append_line(target: &mut Option<String>, value: &str) {
    let text = target.get_or_insert_with(String::new);
    text.push('\n');
    text.push_str(value);
}

impl<'a> Decoder<'a> {
    /// Reads one information field, either a whole line or (when `inline`) a
    /// bracketed `[Letter:value]` with the cursor on the `[`.
    pub(crate) fn read_information_field(&mut self, inline: bool) -> Result<FieldLine, AbcError> {
        let (line, text) = if inline {
            let line = self.reader.line();
            self.reader.read_byte()?;
            (line, self.reader.read_delimited(b']')?)
        } else {
            self.reader.skip_comment_lines();
            if self.reader.is_eof() || self.reader.at_line_end() {
                return Ok(FieldLine::Blank);
            }
            (self.reader.line(), self.reader.read_line_trimmed()?)
        };
        self.dispatch_field_text(text, line)
    }

    /// Reads a whole information-field line inside a tune body. Unlike header
    /// lines, the last line of the input may lack its terminator.
    pub(crate) fn read_body_information_field(&mut self) -> Result<FieldLine, AbcError> {
        let line = self.reader.line();
        let text = self.reader.read_final_line_trimmed();
        self.dispatch_field_text(text, line)
    }

    fn dispatch_field_text(&mut self, text: String, line: usize) -> Result<FieldLine, AbcError> {
        if let Some((letter, value)) = split_field(&text) {
            self.apply_field(letter, value, line)?;
            return Ok(FieldLine::Field);
        }
        log::debug!("line {}: free text '{}'", line, text);
        Ok(FieldLine::Text(text))
    }

    /// File-scope metadata while in the file header, otherwise the current tune's.
    fn metadata_mut(&mut self) -> Option<&mut Metadata> {
        if self.state.in_file_header {
            Some(&mut self.document.metadata)
        } else {
            self.document.current_tune_mut().map(|tune| &mut tune.metadata)
        }
    }

    fn set_metadata(&mut self, letter: u8, value: &str, line: usize) {
        let Some(metadata) = self.metadata_mut() else {
            log::warn!("line {}: {}: field outside of any tune", line, letter as char);
            return;
        };
        let slot = match letter {
            b'A' => &mut metadata.area,
            b'B' => &mut metadata.book,
            b'C' => &mut metadata.composer,
            b'D' => &mut metadata.discography,
            b'F' => &mut metadata.file_url,
            b'G' => &mut metadata.group,
            b'H' => &mut metadata.history,
            b'N' => &mut metadata.notes,
            b'O' => &mut metadata.origin,
            b'R' => &mut metadata.rhythm,
            b'r' => &mut metadata.remark,
            b'S' => &mut metadata.source,
            b'Z' => &mut metadata.transcription,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    pub(crate) fn apply_field(&mut self, letter: u8, value: &str, line: usize) -> Result<(), AbcError> {
        match letter {
            b'X' => {
                let reference: u64 = value.trim().parse().map_err(|_| AbcError::InvalidReferenceNumber {
                    line,
                    value: value.to_string(),
                })?;
                if let Some(annotation) = self.state.pending_annotation.take() {
                    log::debug!("annotation '{}' has no unit to attach to", annotation);
                }
                self.state.broken_rhythm = Default::default();
                self.state.tune_header_done = false;
                self.document.tunes.push(Tune::new(reference));
            }
            b'T' => match self.document.current_tune_mut() {
                Some(tune) if tune.title.is_empty() => tune.title = value.to_string(),
                Some(tune) => {
                    tune.title.push_str(" \n");
                    tune.title.push_str(value);
                }
                None => log::warn!("line {}: title outside of any tune", line),
            },
            b'K' => match self.document.current_tune_mut() {
                Some(tune) => {
                    tune.key = value.to_string();
                    self.state.tune_header_done = true;
                }
                None => log::warn!("line {}: key outside of any tune", line),
            },
            b'M' => {
                let meter = parse_meter(value, line)?;
                if self.state.in_file_header {
                    self.document.metadata.meter = Some(meter);
                } else if let Some(tune) = self.document.current_tune_mut() {
                    if self.state.tune_header_done {
                        tune.current_measure_mut().meter = Some(meter);
                    } else {
                        tune.metadata.meter = Some(meter);
                    }
                }
            }
            b'A' | b'B' | b'C' | b'F' | b'G' | b'N' | b'O' | b'R' | b'r' | b'S' | b'Z' => {
                self.set_metadata(letter, value, line);
            }
            b'D' | b'H' => {
                self.set_metadata(letter, value, line);
                self.state.last_field = Some(if letter == b'D' {
                    ContinuableField::Discography
                } else {
                    ContinuableField::History
                });
            }
            b'W' | b'w' => {
                match self.document.current_tune_mut() {
                    Some(tune) => tune.words = Some(value.to_string()),
                    None => log::warn!("line {}: words outside of any tune", line),
                }
                self.state.last_field = Some(ContinuableField::Words);
            }
            b'+' => self.continue_field(value, line),
            b'I' | b'L' | b'm' | b'Q' | b's' | b'U' | b'V' | b'P' => {
                log::debug!("line {}: {}: field is not modelled", line, letter as char);
            }
            _ => {
                log::debug!("line {}: ignoring unknown field {}:", line, letter as char);
            }
        }
        Ok(())
    }

    /// `+:` appends to the last discography, history or words field.
    fn continue_field(&mut self, value: &str, line: usize) {
        let target = match self.state.last_field {
            Some(ContinuableField::Words) => self
                .document
                .current_tune_mut()
                .map(|tune| &mut tune.words),
            Some(ContinuableField::Discography) => {
                self.metadata_mut().map(|metadata| &mut metadata.discography)
            }
            Some(ContinuableField::History) => {
                self.metadata_mut().map(|metadata| &mut metadata.history)
            }
            None => None,
        };
        match target {
            Some(target) => append_line(target, value),
            None => log::debug!("line {}: continuation with nothing to continue", line),
        }
    }
}

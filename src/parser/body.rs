use super::duration;
use super::fields::FieldLine;
use super::Decoder;
use crate::ast::{Measure, NoteGroup, Unit};
use crate::error::AbcError;
use crate::lexer::Element;

impl<'a> Decoder<'a> {
    /// Reads music lines until a blank line, the next `X:` line, or the end of
    /// input. The tune gets its first measure up front, so even an empty body
    /// leaves one measure with one note group.
    pub(crate) fn read_tune_body(&mut self) -> Result<(), AbcError> {
        let Some(tune) = self.document.current_tune_mut() else {
            return Ok(());
        };
        tune.measures = vec![Measure::new()];

        loop {
            self.reader.skip_comment_lines();
            if self.reader.is_eof() || self.reader.at_line_end() || self.reader.starts_with(b"X:") {
                return Ok(());
            }
            if !self.read_music_line()? {
                return Ok(());
            }
        }
    }

    /// One line of the body: a lone information field, or a run of elements.
    /// Returns `false` when the line did not end on a line terminator.
    fn read_music_line(&mut self) -> Result<bool, AbcError> {
        if self.reader.peek_token()?.is_tune_body_info_field() {
            self.read_body_information_field()?;
            return Ok(true);
        }

        while let Some(element) = self.reader.lookahead().and_then(|t| t.element()) {
            self.read_element(element)?;
        }
        Ok(self.finish_line())
    }

    fn finish_line(&mut self) -> bool {
        let (line, column) = (self.reader.line(), self.reader.column());
        match self.reader.peek() {
            None => false,
            Some(b'%') => {
                self.reader.skip_line();
                true
            }
            Some(b'\n') => {
                self.reader.skip_line();
                true
            }
            Some(b'\r') if self.reader.at_line_end() => {
                self.reader.skip_line();
                true
            }
            Some(b) => {
                self.reader.eat(b);
                log::warn!(
                    "line {}, column {}: unexpected '{}', ending tune body",
                    line,
                    column,
                    b as char
                );
                false
            }
        }
    }

    fn read_element(&mut self, element: Element) -> Result<(), AbcError> {
        match element {
            Element::Note => self.read_note(),
            Element::Rest => {
                self.reader.read_byte()?;
                let duration = self.read_duration()?;
                self.push_unit(Unit::rest(duration));
                Ok(())
            }
            Element::Annotation => self.read_annotation(),
            Element::Space => {
                self.reader.read_byte()?;
                if let Some(tune) = self.document.current_tune_mut() {
                    tune.current_measure_mut().note_groups.push(NoteGroup::default());
                }
                Ok(())
            }
            Element::Barline => self.read_barline(),
            Element::Repeat => {
                self.reader.read_byte()?;
                let section = self.reader.read_byte()?;
                log::debug!(
                    "line {}: repeat section {} is not modelled",
                    self.reader.line(),
                    section as char
                );
                Ok(())
            }
            Element::Bracket => self.read_bracket(),
            Element::BrokenRhythm => self.read_broken_rhythm(),
        }
    }

    /// Length after a note, rest or chord, scaled by any pending broken rhythm.
    fn read_duration(&mut self) -> Result<f64, AbcError> {
        let parsed = duration::read_duration(&mut self.reader)?;
        Ok(self.state.broken_rhythm.apply(parsed))
    }

    /// Appends to the current note group, attaching any pending annotation.
    fn push_unit(&mut self, mut unit: Unit) {
        let annotation = self.state.pending_annotation.take();
        if annotation.is_some() {
            unit.set_annotation(annotation);
        }
        if let Some(tune) = self.document.current_tune_mut() {
            tune.current_measure_mut().current_group_mut().units.push(unit);
        }
    }

    /// Pitch letter followed by any octave markers, e.g. `c''` or `C,`.
    fn read_pitch(&mut self) -> Result<Option<String>, AbcError> {
        let letter = self.reader.read_byte()?;
        if !letter.is_ascii_alphabetic() {
            log::warn!(
                "line {}: octave marker '{}' without a note",
                self.reader.line(),
                letter as char
            );
            return Ok(None);
        }
        let mut pitch = String::from(letter as char);
        while let Some(marker) = self.reader.peek().filter(|b| *b == b'\'' || *b == b',') {
            pitch.push(marker as char);
            self.reader.eat(marker);
        }
        Ok(Some(pitch))
    }

    fn read_note(&mut self) -> Result<(), AbcError> {
        let Some(pitch) = self.read_pitch()? else {
            return Ok(());
        };
        let duration = self.read_duration()?;
        self.push_unit(Unit::note(pitch, duration));
        Ok(())
    }

    /// `"text"` is held until the next unit is appended.
    fn read_annotation(&mut self) -> Result<(), AbcError> {
        self.reader.read_byte()?;
        let text = self.reader.read_delimited(b'"')?;
        match &mut self.state.pending_annotation {
            Some(pending) => {
                pending.push('\n');
                pending.push_str(&text);
            }
            None => self.state.pending_annotation = Some(text),
        }
        Ok(())
    }

    /// `[K:D]` is an inline field, `[CEG]2` a chord.
    fn read_bracket(&mut self) -> Result<(), AbcError> {
        let FieldLine::Text(chord) = self.read_information_field(true)? else {
            return Ok(());
        };
        let chord = chord.trim();
        if chord.is_empty() {
            log::debug!("line {}: empty chord", self.reader.line());
            return Ok(());
        }
        let duration = self.read_duration()?;
        self.push_unit(Unit::chord(chord, duration));
        Ok(())
    }

    /// `|`, `||`, `[|`, `|]`, `:|`, `|:`. The first byte closes the current
    /// measure, a second byte (if any) marks how the new one starts.
    fn read_barline(&mut self) -> Result<(), AbcError> {
        let marker = self.reader.read_byte()?;
        let token = self.reader.lookahead();
        let Some(tune) = self.document.current_tune_mut() else {
            return Ok(());
        };

        let closed = tune.current_measure_mut();
        match marker {
            b'[' => closed.thick_end = true,
            b':' => closed.repeat_end = true,
            _ => {}
        }

        let mut opened = Measure::new();
        match token.map(|t| t.first()) {
            Some(b'|') => {
                opened.barline_start = true;
                self.reader.eat(b'|');
                if self.reader.eat(b':') {
                    opened.repeat_start = true;
                }
            }
            Some(b'[') if token.is_some_and(|t| !t.is_inline_field()) => {
                opened.thick_start = true;
                self.reader.eat(b'[');
            }
            Some(b':') => {
                opened.repeat_start = true;
                self.reader.eat(b':');
            }
            Some(b']') => {
                closed.thick_end = true;
                self.reader.eat(b']');
            }
            _ => {}
        }
        tune.measures.push(opened);
        Ok(())
    }

    /// `>` lengthens the previous unit and shortens the next; `<` the reverse.
    fn read_broken_rhythm(&mut self) -> Result<(), AbcError> {
        let (line, column) = (self.reader.line(), self.reader.column());
        let symbol = self.reader.read_byte()?;
        let previous = self
            .document
            .current_tune_mut()
            .and_then(|tune| tune.current_measure_mut().current_group_mut().units.last_mut())
            .ok_or(AbcError::NoPrecedingUnit { line, column })?;

        if symbol == b'>' {
            previous.set_duration(previous.duration() * 2.0);
            self.state.broken_rhythm = duration::BrokenRhythm::HalveNext;
        } else {
            previous.set_duration(previous.duration() / 2.0);
            self.state.broken_rhythm = duration::BrokenRhythm::DoubleNext;
        }
        Ok(())
    }
}

/// Grammar alternatives the classifier can recognise at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Note,
    Rest,
    Annotation,
    Chord,
    Barline,
    InlineField,
    Repeat,
    BrokenRhythm,
    Space,
    TuneBodyInfoField,
}

/// The element a body parser should read next, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Note,
    Rest,
    Annotation,
    Space,
    Barline,
    Repeat,
    /// `[` that opens an inline field or a chord; the content decides which.
    Bracket,
    BrokenRhythm,
}

/// Up to two bytes of lookahead. Classifying never consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookahead {
    first: u8,
    second: Option<u8>,
}

fn is_pitch_letter(b: u8) -> bool {
    matches!(b, b'A'..=b'G' | b'a'..=b'g')
}

fn is_octave_marker(b: u8) -> bool {
    b == b'\'' || b == b','
}

impl Lookahead {
    /// `None` when there is no byte left to look at.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        let first = *bytes.first()?;
        Some(Self {
            first,
            second: bytes.get(1).copied(),
        })
    }

    pub fn first(&self) -> u8 {
        self.first
    }

    pub fn second(&self) -> Option<u8> {
        self.second
    }

    fn token_is(&self, token: &[u8; 2]) -> bool {
        self.first == token[0] && self.second == Some(token[1])
    }

    pub fn is_comment(&self) -> bool {
        self.first == b'%'
    }

    pub fn is_newline(&self) -> bool {
        self.first == b'\n' || self.first == b'\r'
    }

    pub fn is_rest(&self) -> bool {
        self.first == b'z'
    }

    pub fn is_pitch(&self) -> bool {
        is_pitch_letter(self.first) || is_octave_marker(self.first)
    }

    pub fn is_note(&self) -> bool {
        self.is_rest() || self.is_pitch()
    }

    pub fn is_annotation(&self) -> bool {
        self.first == b'"'
    }

    /// `[` with a pitch letter in the window.
    pub fn is_chord(&self) -> bool {
        self.first == b'[' && self.second.is_some_and(is_pitch_letter)
    }

    pub fn is_barline(&self) -> bool {
        self.first == b'|'
            || [b"||", b"[|", b"|]", b":|", b"|:"]
                .iter()
                .any(|token| self.token_is(token))
    }

    pub fn is_inline_field(&self) -> bool {
        self.first == b'[' && self.second != Some(b'|')
    }

    /// Numbered repeat section, `[1` or `[2`.
    pub fn is_repeat(&self) -> bool {
        self.first == b'[' && matches!(self.second, Some(b'1') | Some(b'2'))
    }

    pub fn is_broken_rhythm(&self) -> bool {
        self.first == b'<' || self.first == b'>'
    }

    pub fn is_space(&self) -> bool {
        self.first == b' '
    }

    pub fn is_digit(&self) -> bool {
        self.first.is_ascii_digit()
    }

    /// An upper-case letter, `w` or the `+` continuation followed by `:`.
    pub fn is_tune_body_info_field(&self) -> bool {
        (self.first.is_ascii_uppercase() || self.first == b'w' || self.first == b'+')
            && self.second == Some(b':')
    }

    pub fn is_element(&self) -> bool {
        self.is_note()
            || self.is_annotation()
            || self.is_barline()
            || self.is_space()
            || self.is_inline_field()
            || self.is_repeat()
            || self.is_chord()
            || self.is_broken_rhythm()
    }

    /// Every category the window matches.
    pub fn categories(&self) -> Vec<Category> {
        let checks: [(bool, Category); 10] = [
            (self.is_note(), Category::Note),
            (self.is_rest(), Category::Rest),
            (self.is_annotation(), Category::Annotation),
            (self.is_chord(), Category::Chord),
            (self.is_barline(), Category::Barline),
            (self.is_inline_field(), Category::InlineField),
            (self.is_repeat(), Category::Repeat),
            (self.is_broken_rhythm(), Category::BrokenRhythm),
            (self.is_space(), Category::Space),
            (self.is_tune_body_info_field(), Category::TuneBodyInfoField),
        ];
        checks
            .into_iter()
            .filter_map(|(matched, category)| matched.then_some(category))
            .collect()
    }

    /// Picks the element to read. Repeat markers are checked before the
    /// bracket case since the inline-field test matches them too.
    pub fn element(&self) -> Option<Element> {
        if self.is_note() {
            Some(if self.is_rest() { Element::Rest } else { Element::Note })
        } else if self.is_annotation() {
            Some(Element::Annotation)
        } else if self.is_space() {
            Some(Element::Space)
        } else if self.is_barline() {
            Some(Element::Barline)
        } else if self.is_repeat() {
            Some(Element::Repeat)
        } else if self.is_inline_field() || self.is_chord() {
            Some(Element::Bracket)
        } else if self.is_broken_rhythm() {
            Some(Element::BrokenRhythm)
        } else {
            None
        }
    }
}

//! # Document Model
//!
//! This module defines the structures the decoder builds from ABC source.
//!
//! ## Type Hierarchy
//! ```text
//! Document
//!   ├── version: Option<f32>          (from the %abc-<version> line)
//!   ├── Metadata                      (file-scope defaults)
//!   └── Vec<Tune>
//!         ├── reference_number, title, key, words
//!         ├── Metadata                (tune-scope values)
//!         └── Vec<Measure>              (never empty)
//!               ├── meter override, repeat/thick/barline edge flags
//!               └── Vec<NoteGroup>      (never empty)
//!                     └── Vec<Unit> (Note | Rest | Chord)
//! ```
//!
//! ## Key Concepts
//!
//! ### Scopes
//! Fields written in the file header live in [`Document::metadata`]; the same
//! fields written inside a tune header live in [`Tune::metadata`]. Nothing is
//! copied down at decode time, consumers decide which one wins
//! (see [`Document::effective_meter`]).
//!
//! ### Durations
//! A unit's duration is a multiple of the unit note length: `A2` is 2.0,
//! `A/2` is 0.5, `A3/4` is 0.75. Broken rhythm (`>` / `<`) rescales the unit
//! before it after the fact, which is why [`Unit::set_duration`] exists.
//!
//! ### Ownership
//! Strict tree: every node exclusively owns its children and nothing points
//! back up.

use serde::{Deserialize, Serialize};

/// Meter (time signature), e.g. `M:6/8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub top: u64,
    pub bottom: u64,
}

/// Optional fields shared by the file header and tune headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>, // A:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<String>, // B:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>, // C:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discography: Option<String>, // D:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>, // F:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>, // G:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>, // H:
    /// Reserved: `L:` lines are recognised but not stored, so this stays `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_note_length: Option<String>, // L:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter: Option<Meter>, // M:
    /// Reserved: `m:` lines are recognised but not stored, so this stays `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_definition: Option<String>, // m:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>, // N:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>, // O:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhythm: Option<String>, // R:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>, // r:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>, // S:
    /// Reserved: `U:` lines are recognised but not stored, so this stays `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_defined: Option<String>, // U:
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>, // Z:
}

/// A decoded ABC file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "abcVersion", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<f32>,
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default)]
    pub tunes: Vec<Tune>,
}

impl Document {
    /// True when the `%abc-<version>` line named a revision older than 2.1.
    pub fn has_outdated_version(&self) -> bool {
        matches!(self.version, Some(v) if v <= 2.0)
    }

    /// The meter a tune starts in: its own `M:` field, or the file default.
    pub fn effective_meter(&self, tune: &Tune) -> Option<Meter> {
        tune.metadata.meter.or(self.metadata.meter)
    }

    pub fn current_tune_mut(&mut self) -> Option<&mut Tune> {
        self.tunes.last_mut()
    }
}

/// One tune: an `X:` header up to `K:`, then the music body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tune {
    pub reference_number: u64,
    pub title: String,
    pub key: String,
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<String>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Tune {
    pub fn new(reference_number: u64) -> Self {
        Self {
            reference_number,
            ..Self::default()
        }
    }

    /// The measure currently being filled, created if the tune has none yet.
    pub fn current_measure_mut(&mut self) -> &mut Measure {
        if self.measures.is_empty() {
            self.measures.push(Measure::new());
        }
        let last = self.measures.len() - 1;
        &mut self.measures[last]
    }

    /// All units of the tune in source order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.measures
            .iter()
            .flat_map(|m| m.note_groups.iter())
            .flat_map(|g| g.units.iter())
    }
}

/// The stretch of music between two barlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    /// Set only when a mid-tune `M:` field changes the meter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter: Option<Meter>,
    #[serde(default)]
    pub repeat_start: bool,
    #[serde(default)]
    pub repeat_end: bool,
    #[serde(default)]
    pub thick_start: bool,
    #[serde(default)]
    pub thick_end: bool,
    #[serde(default)]
    pub barline_start: bool,
    pub note_groups: Vec<NoteGroup>,
}

impl Measure {
    /// A measure holding a single empty note group.
    pub fn new() -> Self {
        Self {
            meter: None,
            repeat_start: false,
            repeat_end: false,
            thick_start: false,
            thick_end: false,
            barline_start: false,
            note_groups: vec![NoteGroup::default()],
        }
    }

    pub fn current_group_mut(&mut self) -> &mut NoteGroup {
        if self.note_groups.is_empty() {
            self.note_groups.push(NoteGroup::default());
        }
        let last = self.note_groups.len() - 1;
        &mut self.note_groups[last]
    }

    /// Sum of the durations of every unit in the measure.
    pub fn duration(&self) -> f64 {
        self.note_groups
            .iter()
            .flat_map(|g| g.units.iter())
            .map(Unit::duration)
            .sum()
    }
}

impl Default for Measure {
    fn default() -> Self {
        Self::new()
    }
}

/// Units written without whitespace between them, beamed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteGroup {
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl NoteGroup {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// A single pitch, e.g. `c'` or `G,,`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Pitch letter plus octave markers.
    pub value: String,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rest {
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Notes sounded together, `[CEG]`. A chord has one duration for all its notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub value: String,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Anything playable that takes up time in a measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Unit {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
}

impl Unit {
    pub const REST_SYMBOL: &'static str = "z";

    pub fn note(value: impl Into<String>, duration: f64) -> Self {
        Unit::Note(Note {
            value: value.into(),
            duration,
            annotation: None,
        })
    }

    pub fn rest(duration: f64) -> Self {
        Unit::Rest(Rest {
            duration,
            annotation: None,
        })
    }

    pub fn chord(value: impl Into<String>, duration: f64) -> Self {
        Unit::Chord(Chord {
            value: value.into(),
            duration,
            annotation: None,
        })
    }

    /// Source text of the unit: the pitch, the chord's notes, or `z`.
    pub fn value(&self) -> &str {
        match self {
            Unit::Note(note) => &note.value,
            Unit::Rest(_) => Self::REST_SYMBOL,
            Unit::Chord(chord) => &chord.value,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            Unit::Note(note) => note.duration,
            Unit::Rest(rest) => rest.duration,
            Unit::Chord(chord) => chord.duration,
        }
    }

    pub fn set_duration(&mut self, duration: f64) {
        match self {
            Unit::Note(note) => note.duration = duration,
            Unit::Rest(rest) => rest.duration = duration,
            Unit::Chord(chord) => chord.duration = duration,
        }
    }

    pub fn annotation(&self) -> Option<&str> {
        match self {
            Unit::Note(note) => note.annotation.as_deref(),
            Unit::Rest(rest) => rest.annotation.as_deref(),
            Unit::Chord(chord) => chord.annotation.as_deref(),
        }
    }

    pub fn set_annotation(&mut self, annotation: Option<String>) {
        match self {
            Unit::Note(note) => note.annotation = annotation,
            Unit::Rest(rest) => rest.annotation = annotation,
            Unit::Chord(chord) => chord.annotation = annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_measure_has_one_empty_group() {
        let measure = Measure::new();
        assert_eq!(measure.note_groups.len(), 1);
        assert!(measure.note_groups[0].is_empty());
        assert!(!measure.barline_start);
    }

    #[test]
    fn test_current_measure_is_created_on_demand() {
        let mut tune = Tune::new(3);
        assert!(tune.measures.is_empty());
        tune.current_measure_mut().thick_end = true;
        assert_eq!(tune.measures.len(), 1);
        assert!(tune.measures[0].thick_end);
    }

    #[test]
    fn test_unit_accessors() {
        let mut unit = Unit::chord("CEG", 2.0);
        assert_eq!(unit.value(), "CEG");
        unit.set_duration(unit.duration() / 2.0);
        assert_eq!(unit.duration(), 1.0);

        assert_eq!(Unit::rest(1.0).value(), "z");
    }

    #[test]
    fn test_effective_meter_prefers_tune() {
        let mut document = Document::default();
        document.metadata.meter = Some(Meter { top: 4, bottom: 4 });
        let mut tune = Tune::new(1);
        assert_eq!(document.effective_meter(&tune), Some(Meter { top: 4, bottom: 4 }));
        tune.metadata.meter = Some(Meter { top: 6, bottom: 8 });
        assert_eq!(document.effective_meter(&tune), Some(Meter { top: 6, bottom: 8 }));
    }

    #[test]
    fn test_outdated_version() {
        let mut document = Document::default();
        assert!(!document.has_outdated_version());
        document.version = Some(2.0);
        assert!(document.has_outdated_version());
        document.version = Some(2.1);
        assert!(!document.has_outdated_version());
    }

    #[test]
    fn test_measure_duration() {
        let mut measure = Measure::new();
        measure.current_group_mut().units.push(Unit::note("A", 1.5));
        measure.note_groups.push(NoteGroup {
            units: vec![Unit::note("B", 0.5), Unit::rest(2.0)],
        });
        assert_eq!(measure.duration(), 4.0);
    }
}

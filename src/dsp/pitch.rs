//! Pitch mapping — note names, MIDI numbers and frequencies.
//!
//! Quantizes a frequency to the nearest equal-tempered note (A4 = 440 Hz)
//! and converts note names back to their canonical frequency. All functions
//! here are pure and total: out-of-range input maps to [`NoteName::NoNote`]
//! rather than an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Reference tuning for A4 (MIDI 69).
pub const A4_FREQUENCY: f64 = 440.0;
pub const A4_MIDI: i32 = 69;

/// Lowest representable pitch, C-1.
pub const LOWEST_MIDI: i32 = 0;
/// Highest representable pitch, B10 (about 31.6 kHz).
pub const HIGHEST_MIDI: i32 = 143;

/// Text shown for "no note", both for silent pattern cells and for
/// sub-threshold or undefined frequencies.
pub const NO_NOTE: &str = "--";

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        self as i32
    }

    /// Pitch class for a semitone index; wraps modulo 12.
    pub fn from_semitone(semitone: i32) -> Self {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        NOTE_NAMES[self as usize]
    }
}

/// A pitch class in a specific octave (scientific pitch notation, C4 = MIDI 60).
///
/// Parsed and quantized pitches always lie in
/// `LOWEST_MIDI..=HIGHEST_MIDI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: i8) -> Self {
        Pitch { class, octave }
    }

    /// Pitch for a MIDI note number, `None` outside C-1..=B10.
    pub fn from_midi(midi: i32) -> Option<Self> {
        if !(LOWEST_MIDI..=HIGHEST_MIDI).contains(&midi) {
            return None;
        }
        Some(Pitch {
            class: PitchClass::from_semitone(midi),
            octave: (midi.div_euclid(12) - 1) as i8,
        })
    }

    pub fn midi(&self) -> i32 {
        (i32::from(self.octave) + 1) * 12 + self.class.semitone()
    }

    /// Canonical equal-tempered frequency of this pitch.
    pub fn frequency(&self) -> f64 {
        midi_to_frequency(self.midi(), A4_FREQUENCY)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.class.name();
        // "C-1" would read back as tracker-style C1.
        if self.octave < 0 && name.len() == 1 {
            write!(f, "{name}-{}", self.octave)
        } else {
            write!(f, "{name}{}", self.octave)
        }
    }
}

/// Parse a note name: `C4`, `F#3`, `Bb5`, or tracker-style `C-4`.
///
/// A `-` directly after the letter is the tracker "natural" marker, so
/// `C-1` is C1. Negative octaves need an explicit accidental slot
/// (`C--1`, `C#-1`).
impl FromStr for Pitch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let base = match chars.next() {
            Some('C') | Some('c') => 0,
            Some('D') | Some('d') => 2,
            Some('E') | Some('e') => 4,
            Some('F') | Some('f') => 5,
            Some('G') | Some('g') => 7,
            Some('A') | Some('a') => 9,
            Some('B') | Some('b') => 11,
            _ => return Err(format!("invalid note name '{s}'")),
        };

        let rest = chars.as_str();
        let (shift, octave_str) = match rest.as_bytes().first() {
            Some(b'#') => (1, &rest[1..]),
            Some(b'b') => (-1, &rest[1..]),
            Some(b'-') => (0, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i8 = octave_str
            .parse()
            .map_err(|_| format!("invalid octave in note name '{s}'"))?;

        // B#3 is C4, Cb4 is B3: resolve through MIDI so the octave carries.
        let midi = (i32::from(octave) + 1) * 12 + base + shift;
        Pitch::from_midi(midi).ok_or_else(|| format!("note '{s}' is outside C-1..B10"))
    }
}

impl TryFrom<String> for Pitch {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(p: Pitch) -> Self {
        p.to_string()
    }
}

/// Result of quantizing a frequency: a note, or the "no note" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    Note(Pitch),
    NoNote,
}

impl NoteName {
    pub fn pitch(&self) -> Option<Pitch> {
        match self {
            NoteName::Note(p) => Some(*p),
            NoteName::NoNote => None,
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, NoteName::Note(_))
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteName::Note(p) => write!(f, "{p}"),
            NoteName::NoNote => f.write_str(NO_NOTE),
        }
    }
}

impl Serialize for NoteName {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Quantize a frequency to the nearest note name.
///
/// Zero, negative, NaN and infinite frequencies give [`NoteName::NoNote`],
/// as do frequencies that round outside C-1..B10.
pub fn frequency_to_note(freq_hz: f64) -> NoteName {
    if !freq_hz.is_finite() || freq_hz <= 0.0 {
        return NoteName::NoNote;
    }
    let midi = A4_MIDI as f64 + (12.0 * (freq_hz / A4_FREQUENCY).log2()).round();
    if midi < LOWEST_MIDI as f64 || midi > HIGHEST_MIDI as f64 {
        return NoteName::NoNote;
    }
    Pitch::from_midi(midi as i32).map_or(NoteName::NoNote, NoteName::Note)
}

/// Parse a note name into a MIDI note number.
pub fn note_to_midi(note: &str) -> Option<i32> {
    note.parse::<Pitch>().ok().map(|p| p.midi())
}

/// Convert a MIDI note number to frequency using the given tuning pitch.
///
/// Formula: `tuning_pitch * 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi - A4_MIDI) as f64 / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_and_a5() {
        assert_eq!(frequency_to_note(440.0).to_string(), "A4");
        assert_eq!(frequency_to_note(880.0).to_string(), "A5");
    }

    #[test]
    fn undefined_frequency_is_no_note() {
        assert_eq!(frequency_to_note(0.0), NoteName::NoNote);
        assert_eq!(frequency_to_note(-12.0), NoteName::NoNote);
        assert_eq!(frequency_to_note(f64::NAN), NoteName::NoNote);
        assert_eq!(frequency_to_note(f64::INFINITY), NoteName::NoNote);
        assert_eq!(frequency_to_note(0.0).to_string(), NO_NOTE);
    }

    #[test]
    fn middle_c() {
        assert_eq!(frequency_to_note(261.63).to_string(), "C4");
        assert_eq!(note_to_midi("C4"), Some(60));
    }

    #[test]
    fn quantizes_to_nearest_semitone() {
        // 452 Hz is ~47 cents sharp of A4, still A4.
        assert_eq!(frequency_to_note(452.0).to_string(), "A4");
        // 455 Hz is ~58 cents sharp, rounds to A#4.
        assert_eq!(frequency_to_note(455.0).to_string(), "A#4");
    }

    #[test]
    fn round_trip_through_frequency_table() {
        for midi in 0..=127 {
            let pitch = Pitch::from_midi(midi).unwrap();
            assert_eq!(
                frequency_to_note(pitch.frequency()),
                NoteName::Note(pitch),
                "round trip failed for {pitch}"
            );
        }
    }

    #[test]
    fn range_ends() {
        let low = Pitch::from_midi(LOWEST_MIDI).unwrap();
        assert_eq!((low.class, low.octave), (PitchClass::C, -1));
        let high = Pitch::from_midi(HIGHEST_MIDI).unwrap();
        assert_eq!((high.class, high.octave), (PitchClass::B, 10));
        assert_eq!(Pitch::from_midi(-1), None);
        assert_eq!(Pitch::from_midi(HIGHEST_MIDI + 1), None);
    }

    #[test]
    fn out_of_range_note_names_rejected() {
        assert!("C10000".parse::<Pitch>().is_err());
        assert!("C2147483646".parse::<Pitch>().is_err());
        assert!("C127".parse::<Pitch>().is_err());
        assert!("Cb-1".parse::<Pitch>().is_err());
        assert!("C11".parse::<Pitch>().is_err());
        assert_eq!("B10".parse::<Pitch>().unwrap().midi(), HIGHEST_MIDI);
        assert_eq!("C--1".parse::<Pitch>().unwrap().midi(), LOWEST_MIDI);
        let lowest = Pitch::new(PitchClass::C, -1);
        assert_eq!(lowest.to_string(), "C--1");
        assert_eq!(lowest.to_string().parse::<Pitch>().unwrap(), lowest);
        assert!(serde_json::from_str::<Pitch>("\"C10000\"").is_err());
    }

    #[test]
    fn extreme_frequencies_are_no_note() {
        assert_eq!(frequency_to_note(1e300), NoteName::NoNote);
        assert_eq!(frequency_to_note(1e-300), NoteName::NoNote);
        assert_eq!(frequency_to_note(1.0), NoteName::NoNote);
        assert!(frequency_to_note(20_000.0).is_note());
    }

    #[test]
    fn parse_variants() {
        assert_eq!("C#4".parse::<Pitch>().unwrap().midi(), 61);
        assert_eq!("Db4".parse::<Pitch>().unwrap().midi(), 61);
        assert_eq!("C-4".parse::<Pitch>().unwrap().midi(), 60);
        assert_eq!("B#3".parse::<Pitch>().unwrap().to_string(), "C4");
        assert_eq!("Cb4".parse::<Pitch>().unwrap().to_string(), "B3");
        assert_eq!("C#-1".parse::<Pitch>().unwrap().midi(), 1);
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("--".parse::<Pitch>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let p: Pitch = serde_json::from_str("\"F#3\"").unwrap();
        assert_eq!(p, Pitch::new(PitchClass::FSharp, 3));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"F#3\"");
    }

    #[test]
    fn midi_frequency_reference() {
        assert!((midi_to_frequency(69, 440.0) - 440.0).abs() < 1e-9);
        assert!((midi_to_frequency(81, 440.0) - 880.0).abs() < 1e-9);
        assert!((midi_to_frequency(69, 432.0) - 432.0).abs() < 1e-9);
    }
}

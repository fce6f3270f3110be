//! Pattern data model — a fixed grid of note events per channel and step.
//!
//! Patterns arrive from the editor as JSON:
//!
//! ```json
//! { "channels": [
//!     [ { "note": "C-4", "instrument": 1, "velocity": 0.8 }, { "note": "--" }, ... ],
//!     ...
//! ] }
//! ```
//!
//! Every row must have the same number of steps. Silent cells are written
//! `"--"` (or omitted note / `null`).

use serde::{Deserialize, Serialize};

use crate::dsp::pitch::Pitch;
use crate::error::{Error, Result};

/// Channel count of the reference editor grid.
pub const DEFAULT_CHANNELS: usize = 8;
/// Step count of the reference editor grid.
pub const DEFAULT_STEPS: usize = 64;

/// Opaque instrument slot carried through from the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(pub u16);

/// One cell of the pattern grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteEvent {
    /// `None` is silence.
    #[serde(rename = "note", with = "note_text")]
    pub pitch: Option<Pitch>,
    pub instrument: InstrumentId,
    /// Gain in [0, 1]; out-of-range JSON values are clamped on read.
    #[serde(deserialize_with = "deserialize_velocity")]
    pub velocity: f32,
}

impl NoteEvent {
    pub fn silence() -> Self {
        NoteEvent {
            pitch: None,
            instrument: InstrumentId::default(),
            velocity: 1.0,
        }
    }

    /// A sounding note; velocity is clamped to [0, 1].
    pub fn note(pitch: Pitch, instrument: InstrumentId, velocity: f32) -> Self {
        NoteEvent {
            pitch: Some(pitch),
            instrument,
            velocity: clamp_velocity(velocity),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.pitch.is_none()
    }
}

fn clamp_velocity(velocity: f32) -> f32 {
    if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) }
}

fn deserialize_velocity<'de, D>(d: D) -> std::result::Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    f32::deserialize(d).map(clamp_velocity)
}

impl Default for NoteEvent {
    fn default() -> Self {
        NoteEvent::silence()
    }
}

/// `channels × steps` grid of note events with no holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatternRows", into = "PatternRows")]
pub struct Pattern {
    channels: usize,
    steps: usize,
    /// Row-major by channel: `cells[channel * steps + step]`.
    cells: Vec<NoteEvent>,
}

#[derive(Serialize, Deserialize)]
struct PatternRows {
    channels: Vec<Vec<NoteEvent>>,
}

impl Pattern {
    /// All-silent pattern of the given dimensions.
    pub fn new(channels: usize, steps: usize) -> Result<Self> {
        if channels == 0 || steps == 0 {
            return Err(Error::InvalidPattern(format!(
                "dimensions must be non-zero, got {channels}x{steps}"
            )));
        }
        Ok(Pattern {
            channels,
            steps,
            cells: vec![NoteEvent::silence(); channels * steps],
        })
    }

    /// Build from one row of events per channel; rows must be equal length.
    pub fn from_rows(rows: Vec<Vec<NoteEvent>>) -> Result<Self> {
        let channels = rows.len();
        let steps = rows.first().map_or(0, Vec::len);
        let mut pattern = Pattern::new(channels, steps)?;
        for (c, row) in rows.into_iter().enumerate() {
            if row.len() != steps {
                return Err(Error::InvalidPattern(format!(
                    "channel {c} has {} steps, expected {steps}",
                    row.len()
                )));
            }
            pattern.cells[c * steps..(c + 1) * steps].copy_from_slice(&row);
        }
        Ok(pattern)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn get(&self, channel: usize, step: usize) -> Option<&NoteEvent> {
        if channel >= self.channels || step >= self.steps {
            return None;
        }
        self.cells.get(channel * self.steps + step)
    }

    /// Replace one cell wholesale.
    pub fn set(&mut self, channel: usize, step: usize, event: NoteEvent) -> Result<()> {
        if channel >= self.channels || step >= self.steps {
            return Err(Error::InvalidPattern(format!(
                "cell ({channel}, {step}) outside {}x{} grid",
                self.channels, self.steps
            )));
        }
        self.cells[channel * self.steps + step] = event;
        Ok(())
    }

    /// Events for one channel, in step order.
    pub fn row(&self, channel: usize) -> &[NoteEvent] {
        let start = (channel * self.steps).min(self.cells.len());
        let end = ((channel + 1) * self.steps).min(self.cells.len());
        &self.cells[start..end]
    }

    /// Non-silent cells as `(channel, step, event)`, channel-major.
    pub fn notes(&self) -> impl Iterator<Item = (usize, usize, &NoteEvent)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_silent())
            .map(|(i, e)| (i / self.steps, i % self.steps, e))
    }

    pub fn is_silent(&self) -> bool {
        self.cells.iter().all(NoteEvent::is_silent)
    }
}

impl TryFrom<PatternRows> for Pattern {
    type Error = Error;

    fn try_from(rows: PatternRows) -> Result<Self> {
        Pattern::from_rows(rows.channels)
    }
}

impl From<Pattern> for PatternRows {
    fn from(p: Pattern) -> Self {
        PatternRows {
            channels: p.cells.chunks(p.steps).map(<[NoteEvent]>::to_vec).collect(),
        }
    }
}

/// Note text in pattern JSON: `"C-4"`/`"C#4"` for a pitch, `"--"` for silence.
mod note_text {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::dsp::pitch::{NO_NOTE, Pitch};

    pub fn serialize<S: Serializer>(pitch: &Option<Pitch>, s: S) -> Result<S::Ok, S::Error> {
        match pitch {
            Some(p) => s.collect_str(p),
            None => s.serialize_str(NO_NOTE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Pitch>, D::Error> {
        let text = Option::<String>::deserialize(d)?;
        match text.as_deref().map(str::trim) {
            None | Some("") | Some(NO_NOTE) | Some("---") => Ok(None),
            Some(t) => t.parse::<Pitch>().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::pitch::PitchClass;

    fn c4() -> Pitch {
        Pitch::new(PitchClass::C, 4)
    }

    #[test]
    fn new_pattern_has_every_cell() {
        let p = Pattern::new(DEFAULT_CHANNELS, DEFAULT_STEPS).unwrap();
        assert!(p.is_silent());
        for c in 0..DEFAULT_CHANNELS {
            assert_eq!(p.row(c).len(), DEFAULT_STEPS);
        }
        assert!(p.get(7, 63).is_some());
        assert!(p.get(8, 0).is_none());
        assert!(p.get(0, 64).is_none());
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Pattern::new(0, 64).is_err());
        assert!(Pattern::new(8, 0).is_err());
        assert!(Pattern::from_rows(vec![]).is_err());
    }

    #[test]
    fn ragged_rows_rejected() {
        let rows = vec![vec![NoteEvent::silence(); 4], vec![NoteEvent::silence(); 3]];
        assert!(matches!(Pattern::from_rows(rows), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn set_and_iterate_notes() {
        let mut p = Pattern::new(2, 4).unwrap();
        p.set(1, 2, NoteEvent::note(c4(), InstrumentId(3), 0.5)).unwrap();
        p.set(0, 3, NoteEvent::note(c4(), InstrumentId(1), 1.0)).unwrap();
        let notes: Vec<_> = p.notes().map(|(c, s, _)| (c, s)).collect();
        assert_eq!(notes, vec![(0, 3), (1, 2)]);
        assert!(p.set(2, 0, NoteEvent::silence()).is_err());
    }

    #[test]
    fn velocity_clamped() {
        assert_eq!(NoteEvent::note(c4(), InstrumentId(0), 3.0).velocity, 1.0);
        assert_eq!(NoteEvent::note(c4(), InstrumentId(0), -1.0).velocity, 0.0);
    }

    #[test]
    fn json_velocity_clamped() {
        let json = r#"{"channels":[[
            {"note":"C-4","instrument":1,"velocity":7.5},
            {"note":"D-4","instrument":1,"velocity":-3.0},
            {"note":"E-4","instrument":1,"velocity":0.4}
        ]]}"#;
        let p = Pattern::from_json(json).unwrap();
        let velocities: Vec<f32> = p.row(0).iter().map(|e| e.velocity).collect();
        assert_eq!(velocities, vec![1.0, 0.0, 0.4]);
    }

    #[test]
    fn parses_editor_json() {
        let json = r#"{ "channels": [
            [ { "note": "C-4", "instrument": 1, "velocity": 0.8 }, { "note": "--" } ],
            [ { "note": null }, { "note": "A#3", "instrument": 2 } ]
        ] }"#;
        let p = Pattern::from_json(json).unwrap();
        assert_eq!(p.channels(), 2);
        assert_eq!(p.steps(), 2);
        let first = p.get(0, 0).unwrap();
        assert_eq!(first.pitch, Some(c4()));
        assert_eq!(first.instrument, InstrumentId(1));
        assert_eq!(first.velocity, 0.8);
        assert!(p.get(0, 1).unwrap().is_silent());
        assert!(p.get(1, 0).unwrap().is_silent());
        assert_eq!(p.get(1, 1).unwrap().velocity, 1.0);
    }

    #[test]
    fn json_round_trip() {
        let mut p = Pattern::new(3, 5).unwrap();
        p.set(2, 4, NoteEvent::note(c4(), InstrumentId(9), 0.25)).unwrap();
        let back = Pattern::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn bad_note_text_is_error() {
        let json = r#"{ "channels": [[ { "note": "X9" } ]] }"#;
        assert!(matches!(Pattern::from_json(json), Err(Error::Json(_))));
    }
}

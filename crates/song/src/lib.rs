//! The immutable song-data graph the scheduler reads from.
//!
//! Instruments, sequences, notes and song parts live in flat arenas and are
//! referenced by small integer handles. Nothing here changes once a [`Song`]
//! is built; playback state (part anchors, per-note dedup) is owned by the
//! scheduler.

mod builder;
mod description;

use std::sync::Arc;

use loopseq_time::{TimeError, TimeSignature};
use serde::{Deserialize, Serialize};

pub use builder::{NoteData, SongBuilder};
pub use description::{
    InstrumentDescription, SequenceDescription, SongDescription, SongPartDescription,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstrumentId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SequenceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartId(pub usize);

/// Song-wide index of a note, in `0..Song::note_count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NoteId(pub usize);

/// Opaque reference to an output sink owned by the audio backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputHandle(pub u64);

/// Reference into the backend's sample storage. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(Arc<str>);

impl SampleId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Instrument {
    pub id: InstrumentId,
    pub key: String,
    pub output: OutputHandle,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,
    /// Offset in seconds from the start of the song part playing it
    pub time: f64,
    pub sample: SampleId,
    pub volume: f32,
}

/// Ordered notes played by exactly one instrument. A sequence can be
/// reused by several song parts.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub id: SequenceId,
    pub key: String,
    pub instrument: InstrumentId,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone)]
pub struct SongPart {
    pub id: PartId,
    pub key: String,
    /// Duration of one loop, in seconds
    pub length: f64,
    /// Indexed by `InstrumentId`; the first sequence of each list is the active one.
    sequences_by_instrument: Vec<Vec<SequenceId>>,
}

impl SongPart {
    pub fn sequences_for(&self, instrument: InstrumentId) -> &[SequenceId] {
        self.sequences_by_instrument
            .get(instrument.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct Song {
    tempo: f64,
    signature: TimeSignature,
    instruments: Vec<Instrument>,
    sequences: Vec<Sequence>,
    parts: Vec<SongPart>,
    note_count: usize,
}

impl Song {
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn parts(&self) -> &[SongPart] {
        &self.parts
    }

    pub fn note_count(&self) -> usize {
        self.note_count
    }

    pub fn part(&self, id: PartId) -> Option<&SongPart> {
        self.parts.get(id.0)
    }

    pub fn sequence(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequences.get(id.0)
    }

    pub fn instrument(&self, id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(id.0)
    }

    pub fn part_id(&self, key: &str) -> Option<PartId> {
        self.parts.iter().find(|p| p.key == key).map(|p| p.id)
    }

    pub fn instrument_id(&self, key: &str) -> Option<InstrumentId> {
        self.instruments.iter().find(|i| i.key == key).map(|i| i.id)
    }

    pub fn sequence_id(&self, key: &str) -> Option<SequenceId> {
        self.sequences.iter().find(|s| s.key == key).map(|s| s.id)
    }

    /// The sequence `instrument` plays during `part`, or `None` when the
    /// instrument is silent in that part.
    pub fn active_sequence(&self, part: PartId, instrument: InstrumentId) -> Option<&Sequence> {
        let first = *self.part(part)?.sequences_for(instrument).first()?;
        self.sequence(first)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SongError {
    #[error("tempo must be positive, got {0}")]
    InvalidTempo(f64),

    #[error("duplicate instrument id '{0}'")]
    DuplicateInstrument(String),

    #[error("duplicate sequence id '{0}'")]
    DuplicateSequence(String),

    #[error("duplicate song part id '{0}'")]
    DuplicatePart(String),

    #[error("'{referenced_by}' references unknown instrument '{instrument}'")]
    UnknownInstrument {
        referenced_by: String,
        instrument: String,
    },

    #[error("song part '{part}' references unknown sequence '{sequence}'")]
    UnknownSequence { part: String, sequence: String },

    #[error("sequence '{sequence}' is assigned to incorrect instrument '{instrument}' in song part '{part}'")]
    SequenceInstrumentMismatch {
        part: String,
        sequence: String,
        instrument: String,
    },

    #[error("no sequence ids defined for instrument '{instrument}' in song part '{part}'")]
    EmptySequenceList { part: String, instrument: String },

    #[error("song part '{part}' has invalid length {length}")]
    InvalidPartLength { part: String, length: f64 },

    #[error("note in sequence '{sequence}' has invalid time {time}")]
    InvalidNoteTime { sequence: String, time: f64 },

    #[error(transparent)]
    Time(#[from] TimeError),
}

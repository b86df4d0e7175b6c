use std::collections::HashMap;

use loopseq_time::TimeSignature;
use serde::{Deserialize, Serialize};

use crate::{
    Instrument, InstrumentId, Note, NoteId, OutputHandle, PartId, SampleId, Sequence, SequenceId,
    Song, SongError, SongPart,
};

/// A note as handed over by a song-data provider, before it gets a [`NoteId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    pub time: f64,
    pub sample_id: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl NoteData {
    pub fn new(time: f64, sample_id: impl Into<String>) -> Self {
        Self {
            time,
            sample_id: sample_id.into(),
            volume: default_volume(),
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

struct PendingSequence {
    key: String,
    instrument: String,
    notes: Vec<NoteData>,
}

struct PendingPart {
    key: String,
    length: f64,
    assignments: Vec<(String, Vec<String>)>,
}

/// Collects song data by string keys and resolves it into a validated [`Song`].
pub struct SongBuilder {
    tempo: f64,
    signature: TimeSignature,
    instruments: Vec<(String, OutputHandle)>,
    sequences: Vec<PendingSequence>,
    parts: Vec<PendingPart>,
}

impl SongBuilder {
    pub fn new(tempo: f64) -> Self {
        Self {
            tempo,
            signature: TimeSignature::default(),
            instruments: Vec::new(),
            sequences: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: TimeSignature) -> Self {
        self.signature = signature;
        self
    }

    pub fn instrument(mut self, key: impl Into<String>, output: OutputHandle) -> Self {
        self.instruments.push((key.into(), output));
        self
    }

    pub fn sequence(
        mut self,
        key: impl Into<String>,
        instrument: impl Into<String>,
        notes: impl IntoIterator<Item = NoteData>,
    ) -> Self {
        self.sequences.push(PendingSequence {
            key: key.into(),
            instrument: instrument.into(),
            notes: notes.into_iter().collect(),
        });
        self
    }

    /// Adds a song part of `length` seconds. Each assignment maps an
    /// instrument key to the sequence keys it plays, default first.
    pub fn part<I, S>(mut self, key: impl Into<String>, length: f64, assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let assignments = assignments
            .into_iter()
            .map(|(instrument, sequences)| {
                (
                    instrument.into(),
                    sequences.into_iter().map(Into::into).collect(),
                )
            })
            .collect();

        self.parts.push(PendingPart {
            key: key.into(),
            length,
            assignments,
        });
        self
    }

    pub fn build(self) -> Result<Song, SongError> {
        if !(self.tempo.is_finite() && self.tempo > 0.0) {
            return Err(SongError::InvalidTempo(self.tempo));
        }

        let mut instrument_ids: HashMap<String, InstrumentId> = HashMap::new();
        let mut instruments = Vec::with_capacity(self.instruments.len());
        for (key, output) in self.instruments {
            let id = InstrumentId(instruments.len());
            if instrument_ids.insert(key.clone(), id).is_some() {
                return Err(SongError::DuplicateInstrument(key));
            }
            instruments.push(Instrument { id, key, output });
        }

        let mut sequence_ids: HashMap<String, SequenceId> = HashMap::new();
        let mut sequences = Vec::with_capacity(self.sequences.len());
        let mut note_count = 0;
        for pending in self.sequences {
            let id = SequenceId(sequences.len());
            if sequence_ids.insert(pending.key.clone(), id).is_some() {
                return Err(SongError::DuplicateSequence(pending.key));
            }

            let instrument = *instrument_ids.get(&pending.instrument).ok_or_else(|| {
                SongError::UnknownInstrument {
                    referenced_by: pending.key.clone(),
                    instrument: pending.instrument.clone(),
                }
            })?;

            let mut notes = Vec::with_capacity(pending.notes.len());
            for data in pending.notes {
                if !(data.time.is_finite() && data.time >= 0.0) {
                    return Err(SongError::InvalidNoteTime {
                        sequence: pending.key,
                        time: data.time,
                    });
                }
                notes.push(Note {
                    id: NoteId(note_count),
                    time: data.time,
                    sample: SampleId::new(&data.sample_id),
                    volume: data.volume,
                });
                note_count += 1;
            }

            sequences.push(Sequence {
                id,
                key: pending.key,
                instrument,
                notes,
            });
        }

        let mut part_keys: HashMap<String, PartId> = HashMap::new();
        let mut parts = Vec::with_capacity(self.parts.len());
        for pending in self.parts {
            let id = PartId(parts.len());
            if part_keys.insert(pending.key.clone(), id).is_some() {
                return Err(SongError::DuplicatePart(pending.key));
            }

            if !(pending.length.is_finite() && pending.length > 0.0) {
                return Err(SongError::InvalidPartLength {
                    part: pending.key,
                    length: pending.length,
                });
            }

            let mut sequences_by_instrument = vec![Vec::new(); instruments.len()];
            for (instrument_key, sequence_keys) in pending.assignments {
                let instrument = *instrument_ids.get(&instrument_key).ok_or_else(|| {
                    SongError::UnknownInstrument {
                        referenced_by: pending.key.clone(),
                        instrument: instrument_key.clone(),
                    }
                })?;

                if sequence_keys.is_empty() {
                    return Err(SongError::EmptySequenceList {
                        part: pending.key,
                        instrument: instrument_key,
                    });
                }

                for sequence_key in sequence_keys {
                    let sequence_id = *sequence_ids.get(&sequence_key).ok_or_else(|| {
                        SongError::UnknownSequence {
                            part: pending.key.clone(),
                            sequence: sequence_key.clone(),
                        }
                    })?;

                    if sequences[sequence_id.0].instrument != instrument {
                        return Err(SongError::SequenceInstrumentMismatch {
                            part: pending.key,
                            sequence: sequence_key,
                            instrument: instrument_key,
                        });
                    }

                    sequences_by_instrument[instrument.0].push(sequence_id);
                }
            }

            parts.push(SongPart {
                id,
                key: pending.key,
                length: pending.length,
                sequences_by_instrument,
            });
        }

        log::debug!(
            "built song: {} instruments, {} sequences, {} notes, {} parts",
            instruments.len(),
            sequences.len(),
            note_count,
            parts.len()
        );

        Ok(Song {
            tempo: self.tempo,
            signature: self.signature,
            instruments,
            sequences,
            parts,
            note_count,
        })
    }
}

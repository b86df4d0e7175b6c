use std::collections::BTreeMap;

use loopseq_time::{MusicalTime, TimeSignature};
use serde::{Deserialize, Serialize};

use crate::{NoteData, OutputHandle, Song, SongBuilder, SongError};

/// Song data in the shape a provider hands it over: everything referenced by
/// string ids, part lengths written as musical time (`"bars.beats.subdivisions"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDescription {
    pub tempo: f64,
    #[serde(default = "default_time_signature")]
    pub time_signature: (u32, u32),
    pub instruments: Vec<InstrumentDescription>,
    pub sequences: Vec<SequenceDescription>,
    pub parts: Vec<SongPartDescription>,
}

fn default_time_signature() -> (u32, u32) {
    TimeSignature::default().into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDescription {
    pub id: String,
    #[serde(default)]
    pub output: OutputHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDescription {
    pub id: String,
    pub instrument_id: String,
    pub notes: Vec<NoteData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPartDescription {
    pub id: String,
    pub length: String,
    pub sequence_ids_by_instrument_id: BTreeMap<String, Vec<String>>,
}

impl SongDescription {
    pub fn build(&self) -> Result<Song, SongError> {
        let signature = TimeSignature::try_from(self.time_signature)?;

        let mut builder = SongBuilder::new(self.tempo).signature(signature);

        for instrument in &self.instruments {
            builder = builder.instrument(&instrument.id, instrument.output);
        }

        for sequence in &self.sequences {
            builder = builder.sequence(
                &sequence.id,
                &sequence.instrument_id,
                sequence.notes.iter().cloned(),
            );
        }

        for part in &self.parts {
            let length = MusicalTime::parse_with_signature(&part.length, signature)?;
            builder = builder.part(
                &part.id,
                length.to_seconds(self.tempo),
                part.sequence_ids_by_instrument_id
                    .iter()
                    .map(|(instrument, sequences)| (instrument.clone(), sequences.clone())),
            );
        }

        builder.build()
    }
}

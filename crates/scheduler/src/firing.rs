use loopseq_song::{InstrumentId, NoteId, OutputHandle, PartId, SampleId};
use serde::Serialize;

/// A note that must sound at `song_time`, produced for one loop iteration
/// of one song part.
///
/// The renderer plays it at `transport_origin + song_time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFiring {
    pub instrument: InstrumentId,
    pub output: OutputHandle,
    pub note: NoteId,
    pub sample: SampleId,
    pub volume: f32,
    /// Absolute song time in seconds
    pub song_time: f64,
    pub part: PartId,
    pub iteration: u64,
}

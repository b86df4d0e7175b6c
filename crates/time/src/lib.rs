//! Musical time: bars, beats and subdivisions under a time signature, and
//! conversion to and from wall-clock seconds at a given tempo.

pub mod musical_time;
pub mod signature;

pub use musical_time::MusicalTime;
pub use signature::TimeSignature;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("cannot combine musical times with signatures {left} and {right}")]
    SignatureMismatch {
        left: TimeSignature,
        right: TimeSignature,
    },

    #[error("invalid time signature {beats_per_bar}x{subdivisions_per_beat}")]
    InvalidSignature {
        beats_per_bar: u32,
        subdivisions_per_beat: u32,
    },

    #[error("cannot parse musical time from '{0}'")]
    Parse(String),
}

use serde::Serialize;

use crate::TimeError;

/// How a bar is divided: beats per bar, and subdivisions per beat.
///
/// Both components are non-zero; normalization divides by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSignature {
    beats_per_bar: u32,
    subdivisions_per_beat: u32,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        beats_per_bar: 4,
        subdivisions_per_beat: 4,
    };

    pub fn new(beats_per_bar: u32, subdivisions_per_beat: u32) -> Result<Self, TimeError> {
        if beats_per_bar == 0 || subdivisions_per_beat == 0 {
            return Err(TimeError::InvalidSignature {
                beats_per_bar,
                subdivisions_per_beat,
            });
        }

        Ok(Self {
            beats_per_bar,
            subdivisions_per_beat,
        })
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn subdivisions_per_beat(&self) -> u32 {
        self.subdivisions_per_beat
    }

    pub fn subdivisions_per_bar(&self) -> i64 {
        self.beats_per_bar as i64 * self.subdivisions_per_beat as i64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON
    }
}

impl TryFrom<(u32, u32)> for TimeSignature {
    type Error = TimeError;

    fn try_from((beats_per_bar, subdivisions_per_beat): (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(beats_per_bar, subdivisions_per_beat)
    }
}

impl From<TimeSignature> for (u32, u32) {
    fn from(ts: TimeSignature) -> Self {
        (ts.beats_per_bar, ts.subdivisions_per_beat)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.beats_per_bar, self.subdivisions_per_beat)
    }
}

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::{TimeError, TimeSignature};

/// A position in bars, beats and subdivisions under a time signature.
///
/// Values are always normalized: `0 <= beats < beats_per_bar` and
/// `0 <= subdivisions < subdivisions_per_beat`, with overflow carried into
/// beats and then bars. Arithmetic and ordering work on the flattened
/// [`total_subdivisions`](Self::total_subdivisions) value, and only between
/// values that share a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MusicalTime {
    bars: i64,
    beats: i64,
    subdivisions: i64,
    signature: TimeSignature,
}

impl MusicalTime {
    pub const ZERO: MusicalTime = MusicalTime {
        bars: 0,
        beats: 0,
        subdivisions: 0,
        signature: TimeSignature::COMMON,
    };

    /// Creates a time in common (4/4, sixteenths) signature.
    pub fn new(bars: i64, beats: i64, subdivisions: i64) -> Self {
        Self::with_signature(bars, beats, subdivisions, TimeSignature::COMMON)
    }

    pub fn with_signature(
        bars: i64,
        beats: i64,
        subdivisions: i64,
        signature: TimeSignature,
    ) -> Self {
        Self {
            bars,
            beats,
            subdivisions,
            signature,
        }
        .normalize()
    }

    pub fn from_total_subdivisions(total: i64, signature: TimeSignature) -> Self {
        Self::with_signature(0, 0, total, signature)
    }

    /// Carries subdivision overflow into beats, and beat overflow into bars.
    ///
    /// Floored division keeps beats and subdivisions non-negative for
    /// negative totals. The flattened value is unchanged.
    pub fn normalize(self) -> Self {
        let per_beat = self.signature.subdivisions_per_beat() as i64;
        let per_bar = self.signature.beats_per_bar() as i64;

        let subdivisions = self.subdivisions.rem_euclid(per_beat);
        let beats = self.beats + self.subdivisions.div_euclid(per_beat);
        let bars = self.bars + beats.div_euclid(per_bar);

        Self {
            bars,
            beats: beats.rem_euclid(per_bar),
            subdivisions,
            signature: self.signature,
        }
    }

    pub fn bars(&self) -> i64 {
        self.bars
    }

    pub fn beats(&self) -> i64 {
        self.beats
    }

    pub fn subdivisions(&self) -> i64 {
        self.subdivisions
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn total_subdivisions(&self) -> i64 {
        self.bars * self.signature.subdivisions_per_bar()
            + self.beats * self.signature.subdivisions_per_beat() as i64
            + self.subdivisions
    }

    pub fn to_beats(&self) -> f64 {
        self.total_subdivisions() as f64 / self.signature.subdivisions_per_beat() as f64
    }

    pub fn to_bars(&self) -> f64 {
        self.to_beats() / self.signature.beats_per_bar() as f64
    }

    pub fn to_seconds(&self, tempo: f64) -> f64 {
        self.to_beats() * 60.0 / tempo
    }

    /// Converts seconds to musical time, flooring to whole subdivisions.
    ///
    /// Not an exact inverse of [`to_seconds`](Self::to_seconds): the result
    /// never lies after `seconds`, and is at most one subdivision before it.
    /// Fails with [`TimeError::InvalidSignature`] for zero subdivisions.
    pub fn from_seconds(
        seconds: f64,
        tempo: f64,
        subdivisions_per_beat: u32,
    ) -> Result<Self, TimeError> {
        let signature = TimeSignature::new(
            TimeSignature::COMMON.beats_per_bar(),
            subdivisions_per_beat,
        )?;
        Ok(Self::from_seconds_with_signature(seconds, tempo, signature))
    }

    pub fn from_seconds_with_signature(seconds: f64, tempo: f64, signature: TimeSignature) -> Self {
        let subdivisions_per_second = tempo * signature.subdivisions_per_beat() as f64 / 60.0;
        let total = (seconds * subdivisions_per_second).floor() as i64;
        Self::from_total_subdivisions(total, signature)
    }

    fn check_signature(&self, other: &MusicalTime) -> Result<(), TimeError> {
        if self.signature != other.signature {
            return Err(TimeError::SignatureMismatch {
                left: self.signature,
                right: other.signature,
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &MusicalTime) -> Result<MusicalTime, TimeError> {
        self.check_signature(other)?;
        Ok(Self::from_total_subdivisions(
            self.total_subdivisions() + other.total_subdivisions(),
            self.signature,
        ))
    }

    pub fn subtract(&self, other: &MusicalTime) -> Result<MusicalTime, TimeError> {
        self.check_signature(other)?;
        Ok(Self::from_total_subdivisions(
            self.total_subdivisions() - other.total_subdivisions(),
            self.signature,
        ))
    }

    pub fn multiply(&self, factor: i64) -> MusicalTime {
        Self::from_total_subdivisions(self.total_subdivisions() * factor, self.signature)
    }

    /// Human readable form, counting bars, beats and subdivisions from 1.
    pub fn to_one_based_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.bars + 1,
            self.beats + 1,
            self.subdivisions + 1
        )
    }

    /// Parses `"bars.beats.subdivisions"` under the given signature.
    pub fn parse_with_signature(value: &str, signature: TimeSignature) -> Result<Self, TimeError> {
        let parts: Vec<&str> = value.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(TimeError::Parse(value.to_string()));
        }

        let mut fields = [0i64; 3];
        for (field, part) in fields.iter_mut().zip(&parts) {
            *field = part
                .parse()
                .map_err(|_| TimeError::Parse(value.to_string()))?;
        }

        Ok(Self::with_signature(
            fields[0], fields[1], fields[2], signature,
        ))
    }
}

impl Default for MusicalTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for MusicalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.signature != other.signature {
            return None;
        }
        Some(self.total_subdivisions().cmp(&other.total_subdivisions()))
    }
}

impl std::ops::Mul<i64> for MusicalTime {
    type Output = MusicalTime;

    fn mul(self, factor: i64) -> MusicalTime {
        self.multiply(factor)
    }
}

impl FromStr for MusicalTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_signature(s, TimeSignature::COMMON)
    }
}

impl std::fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.bars, self.beats, self.subdivisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(beats_per_bar: u32, subdivisions_per_beat: u32) -> TimeSignature {
        TimeSignature::new(beats_per_bar, subdivisions_per_beat).expect("valid signature")
    }

    #[test]
    fn test_construct() {
        let time = MusicalTime::with_signature(1, 2, 3, signature(4, 5));

        assert_eq!(time.bars(), 1);
        assert_eq!(time.beats(), 2);
        assert_eq!(time.subdivisions(), 3);
        assert_eq!(time.signature().beats_per_bar(), 4);
        assert_eq!(time.signature().subdivisions_per_beat(), 5);
    }

    #[test]
    fn test_normalize_carries_overflow() {
        let time = MusicalTime::new(0, 5, 9);

        // 9 sixteenths = 2 beats + 1, 7 beats = 1 bar + 3
        assert_eq!(time.bars(), 1);
        assert_eq!(time.beats(), 3);
        assert_eq!(time.subdivisions(), 1);
        assert_eq!(time.total_subdivisions(), 5 * 4 + 9);
    }

    #[test]
    fn test_normalize_preserves_total_for_many_inputs() {
        for bpb in 1..=7u32 {
            for spb in 1..=6u32 {
                let ts = signature(bpb, spb);
                for bars in -2..3i64 {
                    for beats in -9..10i64 {
                        for subs in -13..14i64 {
                            let raw_total = bars * ts.subdivisions_per_bar()
                                + beats * spb as i64
                                + subs;
                            let time = MusicalTime::with_signature(bars, beats, subs, ts);

                            assert!(time.beats() >= 0 && time.beats() < bpb as i64);
                            assert!(time.subdivisions() >= 0 && time.subdivisions() < spb as i64);
                            assert_eq!(time.total_subdivisions(), raw_total);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let time = MusicalTime::new(2, 7, 17);
        assert_eq!(time.normalize(), time);
    }

    #[test]
    fn test_negative_total_normalizes_with_floor() {
        let time = MusicalTime::from_total_subdivisions(-1, TimeSignature::COMMON);
        assert_eq!(time.bars(), -1);
        assert_eq!(time.beats(), 3);
        assert_eq!(time.subdivisions(), 3);
    }

    #[test]
    fn test_to_seconds() {
        // one bar of 4/4 at 120 bpm is two seconds
        assert_eq!(MusicalTime::new(1, 0, 0).to_seconds(120.0), 2.0);
        assert_eq!(MusicalTime::new(0, 1, 0).to_seconds(120.0), 0.5);
        assert_eq!(MusicalTime::new(0, 0, 1).to_seconds(120.0), 0.125);
    }

    #[test]
    fn test_to_seconds_is_monotonic() {
        let mut previous = f64::NEG_INFINITY;
        for total in -40..200 {
            let seconds =
                MusicalTime::from_total_subdivisions(total, TimeSignature::COMMON).to_seconds(97.0);
            assert!(seconds > previous);
            previous = seconds;
        }
    }

    #[test]
    fn test_from_seconds_floors() {
        // 0.2s at 120 bpm is 1.6 sixteenths
        let time = MusicalTime::from_seconds(0.2, 120.0, 4).expect("valid signature");
        assert_eq!(time.total_subdivisions(), 1);
    }

    #[test]
    fn test_from_seconds_never_exceeds_input() {
        let ts = signature(3, 6);
        for tempo in [60.0, 93.5, 120.0, 174.0] {
            let subdivision_seconds = 60.0 / tempo / 6.0;
            for total in 0..300 {
                let time = MusicalTime::from_total_subdivisions(total, ts);
                let seconds = time.to_seconds(tempo);
                let back = MusicalTime::from_seconds_with_signature(seconds, tempo, ts);

                assert!(back.total_subdivisions() <= time.total_subdivisions());
                assert!(seconds - back.to_seconds(tempo) < subdivision_seconds + 1e-9);
            }
        }
    }

    #[test]
    fn test_from_seconds_uses_subdivisions_per_beat() {
        let time = MusicalTime::from_seconds(1.0, 60.0, 8).expect("valid signature");
        assert_eq!(time.signature().subdivisions_per_beat(), 8);
        assert_eq!(time.beats(), 1);
        assert_eq!(time.subdivisions(), 0);
    }

    #[test]
    fn test_from_seconds_rejects_zero_subdivisions() {
        assert_eq!(
            MusicalTime::from_seconds(1.0, 60.0, 0),
            Err(TimeError::InvalidSignature {
                beats_per_bar: 4,
                subdivisions_per_beat: 0,
            })
        );
    }

    #[test]
    fn test_add_and_subtract() {
        let a = MusicalTime::new(1, 3, 2);
        let b = MusicalTime::new(0, 1, 3);

        let sum = a.add(&b).expect("same signature");
        assert_eq!(sum, MusicalTime::new(2, 1, 1));

        let diff = sum.subtract(&b).expect("same signature");
        assert_eq!(diff, a);
    }

    #[test]
    fn test_signature_mismatch_is_an_error() {
        let a = MusicalTime::new(1, 0, 0);
        let b = MusicalTime::with_signature(1, 0, 0, signature(3, 4));

        assert!(matches!(a.add(&b), Err(TimeError::SignatureMismatch { .. })));
        assert!(matches!(
            a.subtract(&b),
            Err(TimeError::SignatureMismatch { .. })
        ));
        assert_ne!(a, b);
        assert_eq!(a.partial_cmp(&b), None);
    }

    #[test]
    fn test_multiply_keeps_signature() {
        let ts = signature(3, 4);
        let time = MusicalTime::with_signature(0, 2, 1, ts);
        let tripled = time * 3;

        assert_eq!(tripled.total_subdivisions(), 27);
        assert_eq!(tripled.signature(), ts);
        assert_eq!(tripled.bars(), 2);
    }

    #[test]
    fn test_ordering() {
        let a = MusicalTime::new(0, 3, 3);
        let b = MusicalTime::new(1, 0, 0);
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn test_float_forms() {
        let time = MusicalTime::new(1, 2, 2);
        assert_eq!(time.to_beats(), 6.5);
        assert_eq!(time.to_bars(), 1.625);
    }

    #[test]
    fn test_string_forms() {
        let time = MusicalTime::new(1, 2, 0);
        assert_eq!(time.to_string(), "1.2.0");
        assert_eq!(time.to_one_based_string(), "2.3.1");
    }

    #[test]
    fn test_parse() {
        let time: MusicalTime = "2.0.0".parse().expect("parse");
        assert_eq!(time.total_subdivisions(), 32);

        let time = MusicalTime::parse_with_signature("0.5.0", signature(3, 4)).expect("parse");
        assert_eq!(time.bars(), 1);
        assert_eq!(time.beats(), 2);

        assert!(matches!(
            "1.2".parse::<MusicalTime>(),
            Err(TimeError::Parse(_))
        ));
        assert!(matches!(
            "1.x.0".parse::<MusicalTime>(),
            Err(TimeError::Parse(_))
        ));
    }
}

use loopseq_song::{Instrument, PartId, Song};

use crate::state::{ScheduleState, iteration_at};
use crate::{NoteFiring, SchedulerError};

/// The half-open span `[start, end)` of song time scanned in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(song_time: f64, look_ahead: f64) -> Self {
        Self {
            start: song_time,
            end: song_time + look_ahead,
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// One loop iteration of a song part that the window reaches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartIteration {
    pub part: PartId,
    pub iteration: u64,
    /// Absolute song time at which this iteration starts
    pub start_time: f64,
}

/// End of the current part's loop iteration containing `time`: the earliest
/// point a queued part can start.
pub(crate) fn current_part_end(
    song: &Song,
    state: &ScheduleState,
    time: f64,
) -> Result<f64, SchedulerError> {
    let current = state.current().ok_or(SchedulerError::NoActivePart)?;
    let part = song.part(current).ok_or(SchedulerError::NoActivePart)?;
    let start = state.anchor(current).ok_or(SchedulerError::NoActivePart)?;

    Ok(start + (iteration_at(time, start, part.length) + 1) as f64 * part.length)
}

/// Walks from the current part's iteration containing `window.start` to the
/// last iteration starting inside the window, switching to the queued part
/// once. Reads anchors only; a queued part without an anchor ends the walk.
pub(crate) fn part_iterations(
    song: &Song,
    state: &ScheduleState,
    window: Window,
    max_iterations: usize,
) -> Result<Vec<PartIteration>, SchedulerError> {
    let current = state.current().ok_or(SchedulerError::NoActivePart)?;
    let current_part = song.part(current).ok_or(SchedulerError::NoActivePart)?;
    let current_start = state.anchor(current).ok_or(SchedulerError::NoActivePart)?;

    let mut iterations = Vec::new();
    let mut part_id = current;
    let mut iteration = iteration_at(window.start, current_start, current_part.length);
    let mut switched = false;

    for _ in 0..max_iterations {
        let (Some(part), Some(anchor)) = (song.part(part_id), state.anchor(part_id)) else {
            log::debug!("song part {:?} has no start time yet, ending walk", part_id);
            break;
        };

        let start_time = anchor + iteration as f64 * part.length;
        if start_time > window.end {
            break;
        }

        iterations.push(PartIteration {
            part: part_id,
            iteration,
            start_time,
        });

        if !(part.length > 0.0) {
            break;
        }

        match state.next() {
            Some(next) if !switched => {
                part_id = next;
                iteration = 0;
                switched = true;
            }
            _ => iteration += 1,
        }
    }

    Ok(iterations)
}

/// Appends the firings of one instrument for the given part iterations,
/// skipping notes already scheduled for that part at the same or a later
/// iteration. An instrument without a sequence in a part is silent there.
pub(crate) fn collect_instrument(
    song: &Song,
    state: &mut ScheduleState,
    iterations: &[PartIteration],
    window: Window,
    instrument: &Instrument,
    firings: &mut Vec<NoteFiring>,
) {
    for part_iteration in iterations {
        let Some(sequence) = song.active_sequence(part_iteration.part, instrument.id) else {
            continue;
        };

        for note in &sequence.notes {
            let song_time = note.time + part_iteration.start_time;
            if !window.contains(song_time) {
                continue;
            }

            if !state.claim(part_iteration.part, note.id, part_iteration.iteration) {
                log::trace!(
                    "note {:?} already scheduled for {:?} iteration {}",
                    note.id,
                    part_iteration.part,
                    part_iteration.iteration
                );
                continue;
            }

            log::trace!(
                "schedule {} note {:?} at {song_time}",
                instrument.key,
                note.id
            );
            firings.push(NoteFiring {
                instrument: instrument.id,
                output: instrument.output,
                note: note.id,
                sample: note.sample.clone(),
                volume: note.volume,
                song_time,
                part: part_iteration.part,
                iteration: part_iteration.iteration,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::two_part_song;

    fn state_playing(song: &Song, current: PartId, anchor: f64) -> ScheduleState {
        let mut state = ScheduleState::new(song);
        state.set_current(Some(current));
        state.set_anchor(current, anchor);
        state
    }

    #[test]
    fn test_window_is_half_open() {
        let window = Window::new(4.0, 1.5);
        assert!(window.contains(4.0));
        assert!(window.contains(5.49));
        assert!(!window.contains(5.5));
        assert!(!window.contains(3.99));
    }

    #[test]
    fn test_walk_without_next_part() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let state = state_playing(&song, a, 0.0);

        let iterations =
            part_iterations(&song, &state, Window::new(3.0, 1.5), 10).expect("walk");

        assert_eq!(
            iterations,
            vec![
                PartIteration { part: a, iteration: 0, start_time: 0.0 },
                PartIteration { part: a, iteration: 1, start_time: 4.0 },
            ]
        );
    }

    #[test]
    fn test_walk_is_bounded_by_max_iterations() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let state = state_playing(&song, a, 0.0);

        let iterations =
            part_iterations(&song, &state, Window::new(0.0, 100.0), 3).expect("walk");
        assert_eq!(iterations.len(), 3);
        assert_eq!(iterations[2].iteration, 2);
    }

    #[test]
    fn test_walk_switches_to_anchored_next_part() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let b = song.part_id("B").expect("B");
        let mut state = state_playing(&song, a, 0.0);
        state.set_next(Some(b));
        state.set_anchor(b, 4.0);

        let iterations =
            part_iterations(&song, &state, Window::new(3.0, 3.5), 10).expect("walk");

        assert_eq!(
            iterations,
            vec![
                PartIteration { part: a, iteration: 0, start_time: 0.0 },
                PartIteration { part: b, iteration: 0, start_time: 4.0 },
                PartIteration { part: b, iteration: 1, start_time: 6.0 },
            ]
        );
    }

    #[test]
    fn test_walk_stops_at_unanchored_next_part() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let b = song.part_id("B").expect("B");
        let mut state = state_playing(&song, a, 0.0);
        state.set_next(Some(b));

        let iterations =
            part_iterations(&song, &state, Window::new(3.0, 1.5), 10).expect("walk");
        assert_eq!(iterations.len(), 1);
        assert_eq!(iterations[0].part, a);
    }

    #[test]
    fn test_walk_clamps_iteration_before_anchor() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let state = state_playing(&song, a, 8.0);

        let iterations =
            part_iterations(&song, &state, Window::new(7.0, 1.5), 10).expect("walk");
        assert_eq!(
            iterations,
            vec![PartIteration { part: a, iteration: 0, start_time: 8.0 }]
        );
    }

    #[test]
    fn test_walk_without_current_part_fails() {
        let song = two_part_song();
        let state = ScheduleState::new(&song);
        assert_eq!(
            part_iterations(&song, &state, Window::new(0.0, 1.5), 10),
            Err(SchedulerError::NoActivePart)
        );
    }

    #[test]
    fn test_current_part_end() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let state = state_playing(&song, a, 2.0);

        assert_eq!(current_part_end(&song, &state, 2.0), Ok(6.0));
        assert_eq!(current_part_end(&song, &state, 9.5), Ok(10.0));
    }

    #[test]
    fn test_collect_skips_silent_instrument_and_claims_once() {
        let song = two_part_song();
        let a = song.part_id("A").expect("A");
        let b = song.part_id("B").expect("B");
        let bass = &song.instruments()[1];
        let mut state = state_playing(&song, b, 0.0);
        let window = Window::new(0.0, 1.5);
        let iterations = part_iterations(&song, &state, window, 10).expect("walk");

        let mut firings = Vec::new();
        collect_instrument(&song, &mut state, &iterations, window, bass, &mut firings);
        assert!(firings.is_empty());

        let mut state = state_playing(&song, a, 0.0);
        let iterations = part_iterations(&song, &state, window, 10).expect("walk");
        collect_instrument(&song, &mut state, &iterations, window, bass, &mut firings);
        collect_instrument(&song, &mut state, &iterations, window, bass, &mut firings);
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].song_time, 1.0);
        assert_eq!(firings[0].part, a);
        assert_eq!(firings[0].output, bass.output);
    }
}

use std::collections::HashMap;

use loopseq_song::{NoteId, PartId, Song};

/// Mutable playback state, kept apart from the immutable [`Song`].
///
/// Holds the current and queued part, the anchor (absolute start time) of
/// every part, and per part the last loop iteration each of its notes was
/// scheduled for. Only notes a part has actually scheduled take up space.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    current: Option<PartId>,
    next: Option<PartId>,
    anchors: Vec<Option<f64>>,
    last_scheduled: Vec<HashMap<NoteId, u64>>,
    note_count: usize,
    /// Outgoing part of a swap seen outside a pass; cleared by the next pass
    stale: Option<PartId>,
}

impl ScheduleState {
    pub fn new(song: &Song) -> Self {
        let part_count = song.parts().len();
        Self {
            current: None,
            next: None,
            anchors: vec![None; part_count],
            last_scheduled: vec![HashMap::new(); part_count],
            note_count: song.note_count(),
            stale: None,
        }
    }

    pub fn current(&self) -> Option<PartId> {
        self.current
    }

    pub fn next(&self) -> Option<PartId> {
        self.next
    }

    pub(crate) fn set_current(&mut self, part: Option<PartId>) {
        self.current = part;
    }

    pub(crate) fn set_next(&mut self, part: Option<PartId>) {
        self.next = part;
    }

    /// Absolute song time at which iteration 0 of `part` began, or `None`
    /// while the part is unanchored.
    pub fn anchor(&self, part: PartId) -> Option<f64> {
        self.anchors.get(part.0).copied().flatten()
    }

    pub(crate) fn set_anchor(&mut self, part: PartId, start_time: f64) {
        if let Some(anchor) = self.anchors.get_mut(part.0) {
            *anchor = Some(start_time);
        }
    }

    pub(crate) fn unanchor(&mut self, part: PartId) {
        if let Some(anchor) = self.anchors.get_mut(part.0) {
            *anchor = None;
        }
    }

    /// Anchors `part` at `start_time` unless it already has an anchor.
    /// Returns whether the anchor was set.
    pub(crate) fn anchor_if_needed(&mut self, part: PartId, start_time: f64) -> bool {
        match self.anchors.get_mut(part.0) {
            Some(anchor) if anchor.is_none() => {
                *anchor = Some(start_time);
                true
            }
            _ => false,
        }
    }

    pub fn last_scheduled(&self, part: PartId, note: NoteId) -> Option<u64> {
        self.last_scheduled
            .get(part.0)
            .and_then(|notes| notes.get(&note))
            .copied()
    }

    /// Number of `(part, note)` entries currently held.
    pub fn dedup_len(&self) -> usize {
        self.last_scheduled.iter().map(HashMap::len).sum()
    }

    /// Marks `note` as scheduled for `iteration` of `part`. Returns false when
    /// it was already scheduled for this iteration or a later one.
    pub(crate) fn claim(&mut self, part: PartId, note: NoteId, iteration: u64) -> bool {
        if note.0 >= self.note_count {
            return false;
        }
        let Some(notes) = self.last_scheduled.get_mut(part.0) else {
            return false;
        };

        match notes.get(&note) {
            Some(&last) if last >= iteration => false,
            _ => {
                notes.insert(note, iteration);
                true
            }
        }
    }

    /// Remembers `part` as swapped out; its dedup state is dropped by
    /// [`clear_stale`](Self::clear_stale).
    pub(crate) fn mark_stale(&mut self, part: PartId) {
        self.stale = Some(part);
    }

    pub(crate) fn clear_stale(&mut self) {
        if let Some(part) = self.stale.take() {
            self.clear_part(part);
        }
    }

    pub fn stale(&self) -> Option<PartId> {
        self.stale
    }

    pub(crate) fn clear_part(&mut self, part: PartId) {
        if let Some(notes) = self.last_scheduled.get_mut(part.0) {
            notes.clear();
        }
    }

    /// Forgets all playback state so the next start replays from iteration 0.
    pub(crate) fn reset(&mut self) {
        self.current = None;
        self.next = None;
        self.anchors.fill(None);
        self.last_scheduled.iter_mut().for_each(HashMap::clear);
        self.stale = None;
    }
}

/// Zero-based loop iteration of a part of `length` seconds anchored at
/// `start` that contains `time`. Clamped to 0 for times before the anchor.
pub(crate) fn iteration_at(time: f64, start: f64, length: f64) -> u64 {
    if !(length > 0.0) {
        return 0;
    }
    let iteration = ((time - start) / length).floor();
    if iteration > 0.0 { iteration as u64 } else { 0 }
}

use std::collections::VecDeque;
use std::sync::Arc;

use loopseq_song::{PartId, Song};
use loopseq_time::MusicalTime;
use rtrb::Consumer;

use crate::event::EventListeners;
use crate::state::iteration_at;
use crate::window::{self, Window};
use crate::{
    NoteFiring, ScheduleState, SchedulerConfig, SchedulerError, SchedulerEvent, TransportReadout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

/// Decides, pass by pass, which notes of a looping song must be triggered.
///
/// Song time is measured in seconds from `play_start_time`, the transport
/// time at which playback started. All mutation happens through `&mut self`,
/// so a host sharing the scheduler between threads wraps it in a single
/// lock and passes can never overlap.
pub struct Scheduler {
    song: Arc<Song>,
    config: SchedulerConfig,
    state: ScheduleState,
    playback_state: PlaybackState,
    play_start_time: f64,
    recent_ticks: VecDeque<f64>,
    listeners: EventListeners,
}

impl Scheduler {
    pub fn new(song: Arc<Song>, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        let state = ScheduleState::new(&song);

        Ok(Self {
            song,
            config,
            state,
            playback_state: PlaybackState::Idle,
            play_start_time: 0.0,
            recent_ticks: VecDeque::new(),
            listeners: EventListeners::default(),
        })
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state.is_playing()
    }

    pub fn play_start_time(&self) -> f64 {
        self.play_start_time
    }

    pub fn current_part(&self) -> Option<PartId> {
        self.state.current()
    }

    pub fn next_part(&self) -> Option<PartId> {
        self.state.next()
    }

    pub fn recent_tick_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent_ticks.iter().copied()
    }

    /// Registers a lifecycle listener. Events are dropped for a listener
    /// whose queue is full.
    pub fn subscribe(&mut self) -> Consumer<SchedulerEvent> {
        self.listeners.subscribe()
    }

    /// Starts playback with the part `part_key` at song time 0.
    ///
    /// `transport_now` becomes the origin all song times are measured from.
    /// Returns the firings of the immediate pass at song time 0; periodic
    /// passes are up to the host.
    pub fn start(
        &mut self,
        part_key: &str,
        transport_now: f64,
    ) -> Result<Vec<NoteFiring>, SchedulerError> {
        if self.is_playing() {
            log::warn!("start('{part_key}') ignored: already playing");
            return Err(SchedulerError::AlreadyPlaying);
        }

        let part = self
            .song
            .part_id(part_key)
            .ok_or_else(|| SchedulerError::PartNotFound(part_key.to_string()))?;

        self.play_start_time = transport_now;
        self.state.set_anchor(part, 0.0);
        self.state.set_current(Some(part));
        self.state.set_next(None);
        self.playback_state = PlaybackState::Playing;

        log::info!("play started with song part '{part_key}' at transport time {transport_now}");

        let firings = self.schedule(0.0)?;
        self.listeners.emit(SchedulerEvent::PlayStarted);
        Ok(firings)
    }

    /// Stops playback and forgets all per-part dedup state, so that the
    /// next start replays from the beginning. A no-op when idle.
    pub fn stop(&mut self) {
        if !self.is_playing() {
            log::debug!("stop ignored: not playing");
            return;
        }

        self.state.reset();
        self.recent_ticks.clear();
        self.playback_state = PlaybackState::Idle;

        log::info!("play stopped");
        self.listeners.emit(SchedulerEvent::PlayStopped);
    }

    /// Queues `part` to follow the current part. Its start time is resolved
    /// by a later pass, at the end of the current part's loop iteration.
    pub fn queue_next_part(&mut self, part: Option<PartId>) -> Result<(), SchedulerError> {
        let part = part.ok_or(SchedulerError::NoPartGiven)?;
        if self.song.part(part).is_none() {
            return Err(SchedulerError::PartNotFound(format!("{part:?}")));
        }

        let current = self.state.current().ok_or(SchedulerError::NoActivePart)?;
        if self.state.next().is_some() {
            log::warn!("cannot queue {part:?}: a next part is already set");
            return Err(SchedulerError::AlreadyQueued);
        }
        if part == current {
            log::warn!("cannot queue {part:?}: it is the current part");
            return Err(SchedulerError::SameAsCurrent);
        }

        self.state.unanchor(part);
        self.state.set_next(Some(part));
        log::info!("queued song part '{}'", self.part_key(part));
        Ok(())
    }

    /// Runs one scheduling pass over `[song_time, song_time + look_ahead)`.
    pub fn schedule(&mut self, song_time: f64) -> Result<Vec<NoteFiring>, SchedulerError> {
        if self.state.current().is_none() {
            return Err(SchedulerError::NoActivePart);
        }

        log::debug!("schedule for song time {song_time}");
        self.record_tick(song_time);
        self.state.clear_stale();
        if let Some(outgoing) = self.check_for_part_swap(song_time) {
            self.state.clear_part(outgoing);
        }

        let window = Window::new(song_time, self.config.look_ahead_seconds);
        self.anchor_next_part(window)?;

        let iterations = window::part_iterations(
            &self.song,
            &self.state,
            window,
            self.config.max_part_iterations,
        )?;

        let mut firings = Vec::new();
        for instrument in self.song.instruments() {
            window::collect_instrument(
                &self.song,
                &mut self.state,
                &iterations,
                window,
                instrument,
                &mut firings,
            );
        }

        log::debug!(
            "scheduled {} notes in [{}, {})",
            firings.len(),
            window.start,
            window.end
        );
        Ok(firings)
    }

    /// Runs exactly one pass with explicitly given parts, for deterministic
    /// tests. Starts no timer and emits no events.
    ///
    /// A next part that differs from the one already queued is unanchored.
    pub fn test_schedule(
        &mut self,
        song_time: f64,
        current_part_key: &str,
        current_part_start_time: f64,
        next_part_key: Option<&str>,
    ) -> Result<Vec<NoteFiring>, SchedulerError> {
        let current = self
            .song
            .part_id(current_part_key)
            .ok_or_else(|| SchedulerError::PartNotFound(current_part_key.to_string()))?;

        let next = next_part_key
            .map(|key| {
                self.song
                    .part_id(key)
                    .ok_or_else(|| SchedulerError::PartNotFound(key.to_string()))
            })
            .transpose()?;

        if next == Some(current) {
            return Err(SchedulerError::SameAsCurrent);
        }

        self.state.set_anchor(current, current_part_start_time);
        if let Some(next) = next {
            if self.state.next() != Some(next) {
                self.state.unanchor(next);
            }
        }
        self.state.set_current(Some(current));
        self.state.set_next(next);

        self.schedule(song_time)
    }

    /// Builds a transport snapshot at `transport_now`.
    ///
    /// Runs the part swap check so the reported current part is correct
    /// between passes. Dedup state is left alone: a part swapped out here is
    /// cleared at the start of the next [`schedule`](Self::schedule) pass.
    pub fn readout(&mut self, transport_now: f64) -> Result<TransportReadout, SchedulerError> {
        if !self.is_playing() {
            return Err(SchedulerError::NoActivePart);
        }

        let play_time = transport_now - self.play_start_time;
        if let Some(outgoing) = self.check_for_part_swap(play_time) {
            self.state.mark_stale(outgoing);
        }

        let current = self.state.current().ok_or(SchedulerError::NoActivePart)?;
        let part = self.song.part(current).ok_or(SchedulerError::NoActivePart)?;
        let start = self.state.anchor(current).ok_or(SchedulerError::NoActivePart)?;

        let loops = (play_time - start) / part.length;
        let progress = if loops > 0.0 { loops.fract() } else { 0.0 };

        Ok(TransportReadout {
            play_time_seconds: play_time,
            current_part: current,
            next_part: self.state.next(),
            play_music_time: MusicalTime::from_seconds_with_signature(
                play_time.max(0.0),
                self.song.tempo(),
                self.song.signature(),
            ),
            current_part_iteration: iteration_at(play_time, start, part.length),
            current_part_progress: progress,
            look_ahead_seconds: self.config.look_ahead_seconds,
            recent_tick_times: self.recent_ticks.iter().copied().collect(),
        })
    }

    /// Promotes the queued part once the song reaches its anchored start.
    /// Returns the outgoing part when a swap happened.
    fn check_for_part_swap(&mut self, song_time: f64) -> Option<PartId> {
        let current = self.state.current()?;
        let next = self.state.next()?;
        let next_start = self.state.anchor(next)?;
        if song_time < next_start {
            return None;
        }

        log::info!(
            "swap song part '{}' -> '{}' at {song_time}",
            self.part_key(current),
            self.part_key(next)
        );
        self.state.set_current(Some(next));
        self.state.set_next(None);
        Some(current)
    }

    /// The one place a pass changes anchors: a queued part without a start
    /// time starts at the end of the current part's loop iteration, as soon
    /// as the walk would reach it.
    fn anchor_next_part(&mut self, window: Window) -> Result<(), SchedulerError> {
        let Some(next) = self.state.next() else {
            return Ok(());
        };
        if self.state.anchor(next).is_some() || self.config.max_part_iterations < 2 {
            return Ok(());
        }

        let current = self.state.current().ok_or(SchedulerError::NoActivePart)?;
        let part = self.song.part(current).ok_or(SchedulerError::NoActivePart)?;
        let start = self.state.anchor(current).ok_or(SchedulerError::NoActivePart)?;
        let iteration_start =
            start + iteration_at(window.start, start, part.length) as f64 * part.length;
        if iteration_start > window.end {
            return Ok(());
        }

        let next_start = window::current_part_end(&self.song, &self.state, window.start)?;
        if self.state.anchor_if_needed(next, next_start) {
            log::info!(
                "setting start time of '{}' to {next_start}",
                self.part_key(next)
            );
        }
        Ok(())
    }

    fn record_tick(&mut self, song_time: f64) {
        self.recent_ticks.push_back(song_time);
        while self.recent_ticks.len() > self.config.tick_history {
            self.recent_ticks.pop_front();
        }
    }

    fn part_key(&self, part: PartId) -> &str {
        self.song.part(part).map(|p| p.key.as_str()).unwrap_or("?")
    }
}

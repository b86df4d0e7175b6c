//! Lookahead note scheduler for looping song parts.
//!
//! Each pass scans `[song_time, song_time + look_ahead)` over the current
//! song part (and a queued next part, once its start is known) and returns
//! every note that must sound in that window exactly once. The scheduler
//! never produces audio; the caller hands the firings to a renderer.

mod config;
mod event;
mod firing;
mod readout;
mod scheduler;
mod state;
mod window;

#[cfg(test)]
mod testing;

pub use config::SchedulerConfig;
pub use event::SchedulerEvent;
pub use firing::NoteFiring;
pub use readout::TransportReadout;
pub use scheduler::{PlaybackState, Scheduler};
pub use state::ScheduleState;
pub use window::{PartIteration, Window};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("no song part found with id '{0}'")]
    PartNotFound(String),

    #[error("already playing")]
    AlreadyPlaying,

    #[error("a next song part is already queued")]
    AlreadyQueued,

    #[error("cannot queue the song part that is currently playing")]
    SameAsCurrent,

    #[error("no song part given")]
    NoPartGiven,

    #[error("no active song part")]
    NoActivePart,

    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),
}

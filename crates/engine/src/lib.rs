//! Wall-clock host for the lookahead scheduler: a clock, a periodic worker
//! thread, and the renderer that receives each pass's firings.

mod clock;
mod renderer;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use renderer::Renderer;
pub use transport::Transport;

use loopseq_scheduler::SchedulerError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("scheduler lock poisoned")]
    LockPoisoned,
    #[error("failed to spawn scheduler worker: {0}")]
    Spawn(#[from] std::io::Error),
}

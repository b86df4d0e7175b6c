use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, select};
use loopseq_scheduler::{Scheduler, SchedulerError, SchedulerEvent, TransportReadout};
use rtrb::Consumer;

use crate::{Clock, EngineError, Renderer};

struct Core<R> {
    scheduler: Scheduler,
    renderer: R,
}

struct Shared<C, R> {
    clock: C,
    core: Mutex<Core<R>>,
}

impl<C: Clock, R: Renderer> Shared<C, R> {
    fn lock(&self) -> Result<MutexGuard<'_, Core<R>>, EngineError> {
        self.core.lock().map_err(|_| EngineError::LockPoisoned)
    }

    /// One periodic pass. Returns false once playback has stopped.
    fn tick(&self) -> bool {
        let mut core = match self.lock() {
            Ok(core) => core,
            Err(err) => {
                log::error!("scheduler tick aborted: {err}");
                return false;
            }
        };

        if !core.scheduler.is_playing() {
            return false;
        }

        let origin = core.scheduler.play_start_time();
        let song_time = self.clock.now() - origin;
        match core.scheduler.schedule(song_time) {
            Ok(firings) => core.renderer.on_firings_ready(&firings, origin),
            Err(err) => log::error!("scheduling pass at {song_time} failed: {err}"),
        }
        true
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives a [`Scheduler`] on a fixed wall-clock interval and hands every
/// pass's firings to a [`Renderer`].
///
/// Scheduler and renderer sit behind one lock: periodic passes, readouts and
/// control calls are serialized, and [`stop`](Self::stop) waits for an
/// in-flight pass before clearing state.
pub struct Transport<C: Clock, R: Renderer> {
    shared: Arc<Shared<C, R>>,
    worker: Option<Worker>,
}

impl<C: Clock, R: Renderer> Transport<C, R> {
    pub fn new(scheduler: Scheduler, clock: C, renderer: R) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                core: Mutex::new(Core {
                    scheduler,
                    renderer,
                }),
            }),
            worker: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.shared.clock
    }

    pub fn is_playing(&self) -> Result<bool, EngineError> {
        Ok(self.shared.lock()?.scheduler.is_playing())
    }

    /// Starts playback with `part_key`, renders the immediate pass, and
    /// begins periodic scheduling.
    pub fn start(&mut self, part_key: &str) -> Result<(), EngineError> {
        let interval = {
            let mut core = self.shared.lock()?;
            let origin = self.shared.clock.now();
            let firings = core.scheduler.start(part_key, origin)?;
            core.renderer.on_firings_ready(&firings, origin);
            core.scheduler.config().schedule_interval()
        };

        // a worker left over from an earlier run has already seen Idle
        self.join_worker();

        let (stop, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("loopseq-scheduler".to_string())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if !shared.tick() {
                                break;
                            }
                        }
                    }
                }
                log::debug!("scheduler worker exiting");
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { stop, handle });
                Ok(())
            }
            Err(err) => {
                let mut core = self.shared.lock()?;
                core.scheduler.stop();
                core.renderer.stop_all();
                Err(EngineError::Spawn(err))
            }
        }
    }

    /// Stops playback. Blocks until any in-flight pass has finished, then
    /// clears scheduler state and joins the worker. Safe to call when idle.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        {
            let mut core = self.shared.lock()?;
            if core.scheduler.is_playing() {
                core.scheduler.stop();
                core.renderer.stop_all();
            }
        }

        self.join_worker();
        Ok(())
    }

    fn join_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let _ = worker.stop.try_send(());
        if worker.handle.join().is_err() {
            log::error!("scheduler worker panicked");
        }
    }

    pub fn queue_next_part(&self, part_key: &str) -> Result<(), EngineError> {
        let mut core = self.shared.lock()?;
        let part = core
            .scheduler
            .song()
            .part_id(part_key)
            .ok_or_else(|| SchedulerError::PartNotFound(part_key.to_string()))?;
        core.scheduler.queue_next_part(Some(part))?;
        Ok(())
    }

    pub fn readout(&self) -> Result<TransportReadout, EngineError> {
        let mut core = self.shared.lock()?;
        Ok(core.scheduler.readout(self.shared.clock.now())?)
    }

    /// Like [`readout`](Self::readout), but returns `None` instead of
    /// waiting when a pass is in progress.
    pub fn try_readout(&self) -> Option<Result<TransportReadout, EngineError>> {
        let mut core = match self.shared.core.try_lock() {
            Ok(core) => core,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(_)) => return Some(Err(EngineError::LockPoisoned)),
        };
        Some(
            core.scheduler
                .readout(self.shared.clock.now())
                .map_err(EngineError::from),
        )
    }

    pub fn subscribe(&self) -> Result<Consumer<SchedulerEvent>, EngineError> {
        Ok(self.shared.lock()?.scheduler.subscribe())
    }

    /// Runs `f` with exclusive access to the scheduler.
    pub fn with_scheduler<T>(&self, f: impl FnOnce(&mut Scheduler) -> T) -> Result<T, EngineError> {
        let mut core = self.shared.lock()?;
        Ok(f(&mut core.scheduler))
    }
}

impl<C: Clock, R: Renderer> Drop for Transport<C, R> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("failed to stop transport: {err}");
        }
    }
}

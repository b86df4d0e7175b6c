mod config;
mod demo;

use std::sync::Arc;
use std::time::Instant;

use loopseq_engine::{SystemClock, Transport};
use loopseq_scheduler::{NoteFiring, Scheduler};

use config::Config;

fn log_firings(firings: &[NoteFiring], transport_origin: f64) {
    for firing in firings {
        log::info!(
            "t={:.3} output={} sample={} volume={:.2}",
            transport_origin + firing.song_time,
            firing.output.0,
            firing.sample,
            firing.volume
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load();
    let song = Arc::new(demo::demo_song()?);
    let scheduler = Scheduler::new(song, config.scheduler.clone())?;

    let mut transport = Transport::new(scheduler, SystemClock::new(), log_firings);
    let mut events = transport.subscribe()?;

    transport.start(&config.start_part)?;

    let started = Instant::now();
    let run = config.run_duration();
    let mut queued = config.next_part.is_none();

    while started.elapsed() < run {
        std::thread::sleep(config.readout_interval());

        while let Ok(event) = events.pop() {
            log::info!("event: {event:?}");
        }

        if !queued && started.elapsed() >= run / 2 {
            if let Some(next) = &config.next_part {
                if let Err(err) = transport.queue_next_part(next) {
                    log::warn!("could not queue '{next}': {err}");
                }
            }
            queued = true;
        }

        match transport.try_readout() {
            Some(Ok(readout)) => println!(
                "{:>7.3}s  {}  part {:?} #{}  {:>3.0}%",
                readout.play_time_seconds,
                readout.play_music_time.to_one_based_string(),
                readout.current_part,
                readout.current_part_iteration,
                readout.current_part_progress * 100.0
            ),
            Some(Err(err)) => log::warn!("readout failed: {err}"),
            None => {}
        }
    }

    transport.stop()?;
    while let Ok(event) = events.pop() {
        log::info!("event: {event:?}");
    }

    Ok(())
}

use loopseq_song::PartId;
use loopseq_time::MusicalTime;
use serde::Serialize;

/// Snapshot of the transport for display and telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportReadout {
    pub play_time_seconds: f64,
    pub current_part: PartId,
    pub next_part: Option<PartId>,
    pub play_music_time: MusicalTime,
    pub current_part_iteration: u64,
    /// Position inside the current iteration, in `0.0..1.0`
    pub current_part_progress: f64,
    pub look_ahead_seconds: f64,
    pub recent_tick_times: Vec<f64>,
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SchedulerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Size of the window scanned on every pass, in seconds
    pub look_ahead_seconds: f64,
    /// Wall-clock time between periodic passes; shorter than the lookahead
    /// so consecutive windows overlap
    pub schedule_interval_seconds: f64,
    /// Upper bound on the part iterations walked in a single pass
    pub max_part_iterations: usize,
    /// Number of recent pass times kept for the transport readout
    pub tick_history: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            look_ahead_seconds: 1.5,
            schedule_interval_seconds: 1.0,
            max_part_iterations: 10,
            tick_history: 3,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if !(self.look_ahead_seconds.is_finite() && self.look_ahead_seconds > 0.0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "look_ahead_seconds must be positive, got {}",
                self.look_ahead_seconds
            )));
        }

        if !(self.schedule_interval_seconds > 0.0
            && self.schedule_interval_seconds < self.look_ahead_seconds)
        {
            return Err(SchedulerError::InvalidConfig(format!(
                "schedule_interval_seconds must be positive and shorter than the lookahead ({}), got {}",
                self.look_ahead_seconds, self.schedule_interval_seconds
            )));
        }

        if self.max_part_iterations == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_part_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs_f64(self.schedule_interval_seconds)
    }
}

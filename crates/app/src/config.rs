use loopseq_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    /// How often the transport readout is polled and printed
    pub readout_interval_ms: u64,
    /// How long the demo plays before stopping
    pub run_seconds: f64,
    /// Song part to start with, and the one queued halfway through
    pub start_part: String,
    pub next_part: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            readout_interval_ms: 250,
            run_seconds: 12.0,
            start_part: "intro".to_string(),
            next_part: Some("verse".to_string()),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("loopseq").join("config.toml"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Reads the config at `path`. A missing or unparsable file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };

        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring invalid config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path =
            Self::config_path().ok_or_else(|| anyhow::anyhow!("no config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn readout_interval(&self) -> Duration {
        Duration::from_millis(self.readout_interval_ms)
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs_f64(self.run_seconds.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("loopseq").join("config.toml");

        let mut config = Config::default();
        config.scheduler.look_ahead_seconds = 0.5;
        config.scheduler.schedule_interval_seconds = 0.1;
        config.next_part = Some("outro".to_string());
        config.save_to(&path).expect("save");

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "run_seconds = 3.0\n\n[scheduler]\nlook_ahead_seconds = 2.0\n",
        )
        .expect("write");

        let config = Config::load_from(&path);
        assert_eq!(config.run_seconds, 3.0);
        assert_eq!(config.scheduler.look_ahead_seconds, 2.0);
        assert_eq!(config.scheduler.schedule_interval_seconds, 1.0);
        assert_eq!(config.readout_interval_ms, 250);
        assert_eq!(config.start_part, "intro");
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "run_seconds = \"soon\"").expect("write");

        assert_eq!(Config::load_from(&path), Config::default());
    }
}

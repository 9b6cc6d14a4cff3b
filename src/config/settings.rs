use std::fs;
use std::path::PathBuf;
use directories::ProjectDirs;
use serde::{Serialize, Deserialize};

const CONFIG_FILE: &str = "engine.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Think tick period for entities, in milliseconds
    pub think_interval_ms: u64,
    /// Maximum number of catch-up invocations a stalled interval may
    /// replay in one scheduler pass before the remainder is dropped
    pub max_catchup: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            think_interval_ms: 50,
            max_catchup: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    /// World units an actor advances toward its destination per movement
    /// tick. Must cover a full run step per think tick, otherwise held
    /// input outpaces movement and the action buffer backlogs.
    pub step_size: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self { step_size: 8.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Coalesced action-buffer flush period, in milliseconds
    pub flush_interval_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self { flush_interval_ms: 2000 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    pub scheduler: SchedulerSettings,
    pub movement: MovementSettings,
    pub network: NetworkSettings,
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "parlor", "parlor")
        .map(|proj| proj.config_dir().join(CONFIG_FILE))
}

pub fn save_settings(settings: &EngineSettings) -> std::io::Result<()> {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(settings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, toml)?;
    }
    Ok(())
}

pub fn load_settings() -> Option<EngineSettings> {
    if let Some(path) = config_path() {
        if let Ok(data) = fs::read_to_string(path) {
            if let Ok(settings) = toml::from_str::<EngineSettings>(&data) {
                return Some(settings);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let settings = EngineSettings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: EngineSettings = toml::from_str(&text).unwrap();
        assert_eq!(back.scheduler.think_interval_ms, 50);
        assert_eq!(back.scheduler.max_catchup, 10);
        assert_eq!(back.network.flush_interval_ms, 2000);
    }
}

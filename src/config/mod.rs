pub mod settings;

pub use settings::{
    EngineSettings, MovementSettings, NetworkSettings, SchedulerSettings,
    load_settings, save_settings,
};

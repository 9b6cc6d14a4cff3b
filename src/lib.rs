// Parlor: client engine for a 2D multiplayer visual chatroom
// Local prediction and remote replay share one action-buffer state machine

pub mod utils;
pub mod config;
pub mod scheduler;
pub mod protocol;
pub mod network;
pub mod world;

// Re-export commonly used types for convenience
pub use config::{EngineSettings, load_settings, save_settings};
pub use protocol::{BufferedActionController, Command};
pub use scheduler::Timers;
pub use world::{Action, Actor, Avatar, Direction, Speed, World};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

pub mod logging;
pub mod math;

pub use math::{step_toward, WorldPos};

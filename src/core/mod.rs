pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use clock::GameClock;
pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use ids::IdGenerator;

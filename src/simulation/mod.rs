pub mod tick;

pub use tick::run_simulation_tick;

// kiln-rs: single-zone kiln controller

pub mod config;
pub mod control;
pub mod enclosure;
pub mod firing;
pub mod hardware;
pub mod kiln;
pub mod process_log;
pub mod web;

pub use config::{ConfigError, KilnConfig};
pub use control::{ControlLoop, TickReport};
pub use kiln::{KilnController, KilnStatus, Telemetry};

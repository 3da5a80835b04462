pub mod macros;
mod provider;

pub use provider::{Telemetry, init, shutdown};

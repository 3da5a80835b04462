pub mod config;
pub mod lifecycle;
pub mod pipeline;
pub mod span;

pub use lifecycle::{context, shutdown, startup};

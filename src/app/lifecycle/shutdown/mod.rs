mod shutdown;
pub mod tasks;

pub use shutdown::build_shutdown_pipeline;

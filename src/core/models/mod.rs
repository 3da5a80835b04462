pub mod agreement;
pub mod settlement;

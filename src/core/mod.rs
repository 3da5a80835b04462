pub mod auction;
pub mod config_manager;
pub mod demand;
pub mod directory;
pub mod firestore;
pub mod models;
pub mod observability;
pub mod ortb;
pub mod pipeline;
pub mod settlement;

pub mod auction_pipeline;
pub mod config_load;
pub mod firestore;
pub mod observability;
pub mod partner_directory;
pub mod settlement;
pub mod start_server;

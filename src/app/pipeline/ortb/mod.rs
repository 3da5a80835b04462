mod context;
mod pipeline;
mod tasks;

pub use context::AuctionContext;
pub use pipeline::{assemble_pipeline, build_auction_pipeline};

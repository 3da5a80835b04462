mod coordinator;
pub mod money;
mod outcome;
mod response;
mod selection;

pub use coordinator::AuctionCoordinator;
pub use outcome::{AuctionOutcome, Win};
pub use response::build_bid_response;
pub use selection::{Candidate, select_winner};

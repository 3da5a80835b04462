mod client;
mod solicitor;

pub use client::{DemandClient, DemandClientConfig};
pub use solicitor::{BidSolicitor, SolicitationError};

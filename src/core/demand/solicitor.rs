use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::{Bid, BidRequest};
use async_trait::async_trait;
use strum::IntoStaticStr;
use thiserror::Error;

/// Any reason a partner did not produce a usable bid. All variants
/// exclude only that partner from the auction in progress.
#[derive(Debug, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SolicitationError {
    #[error("failed to encode bid request: {0}")]
    Encode(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("partner returned non-success status {0}")]
    Status(u16),
    #[error("malformed bid response: {0}")]
    Malformed(String),
    #[error("partner returned no bid")]
    NoBid,
    #[error("no response before the auction deadline")]
    Timeout,
}

impl SolicitationError {
    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

/// Outbound call to a single demand partner
#[async_trait]
pub trait BidSolicitor: Send + Sync {
    /// Send `req` to the partner's endpoint and return the one bid it
    /// contributes, being the first bid of its first seat
    async fn solicit(&self, partner: &AgreementRecord, req: &BidRequest)
    -> Result<Bid, SolicitationError>;
}

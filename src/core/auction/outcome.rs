use crate::core::models::agreement::AgreementRecord;
use crate::core::ortb::Bid;
use rust_decimal::Decimal;
use std::sync::Arc;

/// The single winning partner of an auction
#[derive(Debug, Clone, PartialEq)]
pub struct Win {
    pub partner: Arc<AgreementRecord>,
    /// What the partner bid, retained internally
    pub clearing_price: Decimal,
    /// The unmodified floor the publisher sent
    pub publisher_floor: Decimal,
    /// The partner's bid as received
    pub bid: Bid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuctionOutcome {
    NoFill,
    Win(Win),
}

impl AuctionOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, AuctionOutcome::Win(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuctionOutcome::NoFill => "no_fill",
            AuctionOutcome::Win(_) => "win",
        }
    }
}

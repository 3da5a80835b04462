use crate::core::auction::outcome::Win;
use crate::core::ortb::{BidRequest, BidResponse, BidResponseBuilder, SeatBidBuilder};
use anyhow::anyhow;

/// Publisher facing response for a won auction. The winning bid is
/// returned as the partner sent it, except that its price is replaced
/// with the publisher's own floor so the clearing price never leaves
/// the exchange.
pub fn build_bid_response(req: &BidRequest, win: &Win) -> Result<BidResponse, anyhow::Error> {
    let floor = req
        .first_floor()
        .ok_or_else(|| anyhow!("won auction for request {} without impressions", req.id))?;

    let mut bid = win.bid.clone();
    bid.price = floor;

    let seat = SeatBidBuilder::default().bid(vec![bid]).build()?;

    Ok(BidResponseBuilder::default()
        .id(req.id.clone())
        .seatbid(vec![seat])
        .build()?)
}

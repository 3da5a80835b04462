/// Pipeline handling an inbound openrtb request through partner
/// lookup, the auction and the publisher response
pub mod ortb;

//! Minimal OpenRTB 2.x document model.
//!
//! The exchange only interprets a handful of fields (request id, imp
//! floors, response bids and their prices). Everything else is carried
//! verbatim in the flattened `ext` maps so that partners and publishers
//! receive the documents unmodified apart from the fields we own.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod state;

pub use state::{RejectReason, ResponseState};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct Imp {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub bidfloor: f64,
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct BidRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub imp: Vec<Imp>,
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

impl BidRequest {
    /// Floor of the first impression, the only one the auction prices
    pub fn first_floor(&self) -> Option<f64> {
        self.imp.first().map(|imp| imp.bidfloor)
    }

    /// Clone of this request carrying `floor` on the first impression
    pub fn with_first_floor(&self, floor: f64) -> BidRequest {
        let mut req = self.clone();

        if let Some(imp) = req.imp.first_mut() {
            imp.bidfloor = floor;
        }

        req
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct Bid {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub impid: String,
    pub price: f64,
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct SeatBid {
    #[serde(default)]
    pub bid: Vec<Bid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct BidResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub seatbid: Vec<SeatBid>,
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

impl BidResponse {
    /// The first bid of the first seat, which is the only
    /// bid a partner may contribute to a single imp auction
    pub fn first_bid(&self) -> Option<&Bid> {
        self.seatbid.first().and_then(|seat| seat.bid.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_floor_override() {
        let raw = json!({
            "id": "req-1",
            "imp": [
                {"id": "1", "bidfloor": 10.0, "banner": {"w": 300, "h": 250}},
                {"id": "2", "bidfloor": 3.0}
            ],
            "site": {"domain": "example.com"},
            "tmax": 120
        });

        let req: BidRequest = serde_json::from_value(raw).unwrap();
        let partner_req = req.with_first_floor(11.0);
        let out = serde_json::to_value(&partner_req).unwrap();

        assert_eq!(out["imp"][0]["bidfloor"], json!(11.0));
        assert_eq!(out["imp"][0]["banner"]["w"], json!(300));
        assert_eq!(out["imp"][1]["bidfloor"], json!(3.0));
        assert_eq!(out["site"]["domain"], json!("example.com"));
        assert_eq!(out["tmax"], json!(120));
        assert_eq!(req.first_floor(), Some(10.0), "source request is untouched");
    }

    #[test]
    fn test_missing_floor_defaults_to_zero() {
        let req: BidRequest = serde_json::from_value(json!({"id": "r", "imp": [{"id": "1"}]})).unwrap();

        assert_eq!(req.first_floor(), Some(0.0));
    }

    #[test]
    fn test_no_imps_has_no_floor() {
        let req: BidRequest = serde_json::from_value(json!({"id": "r"})).unwrap();

        assert_eq!(req.first_floor(), None);
        assert!(req.with_first_floor(5.0).imp.is_empty());
    }

    #[test]
    fn test_first_bid_of_first_seat() {
        let res: BidResponse = serde_json::from_value(json!({
            "id": "r",
            "seatbid": [
                {"seat": "a", "bid": [{"id": "b1", "impid": "1", "price": 2.5, "adm": "<div/>"}, {"id": "b2", "price": 9.0}]},
                {"seat": "b", "bid": [{"id": "b3", "price": 50.0}]}
            ]
        }))
        .unwrap();

        let bid = res.first_bid().unwrap();
        assert_eq!(bid.id, "b1");
        assert_eq!(bid.price, 2.5);
        assert_eq!(bid.ext["adm"], json!("<div/>"));
    }

    #[test]
    fn test_empty_seatbid_has_no_bid() {
        let res: BidResponse = serde_json::from_value(json!({"id": "r", "seatbid": [{"bid": []}]})).unwrap();

        assert!(res.first_bid().is_none());
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Economics of a single won auction. Append-only, written
/// at most once per auction which produced a winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub ssp_id: String,
    pub dsp_id: String,
    /// The floor the publisher sent, which is also the price they are shown
    #[serde(rename = "ssp_bidfloor", with = "rust_decimal::serde::float")]
    pub publisher_floor: Decimal,
    /// What the winning partner bid
    #[serde(rename = "dsp_price", with = "rust_decimal::serde::float")]
    pub clearing_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission: Decimal,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl SettlementRecord {
    /// A record stamped with the current time
    pub fn new(
        ssp_id: &str,
        dsp_id: &str,
        publisher_floor: Decimal,
        clearing_price: Decimal,
        commission: Decimal,
    ) -> Self {
        SettlementRecord {
            ssp_id: ssp_id.to_string(),
            dsp_id: dsp_id.to_string(),
            publisher_floor,
            clearing_price,
            commission,
            timestamp: Utc::now(),
        }
    }

    /// Platform revenue retained on this trade
    pub fn margin(&self) -> Decimal {
        self.clearing_price - self.publisher_floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_sink_column_names() {
        let record = SettlementRecord::new(
            "ssp",
            "dsp",
            Decimal::new(1000, 2),
            Decimal::new(125, 1),
            Decimal::new(2, 1),
        );

        let doc = serde_json::to_value(&record).unwrap();

        assert_eq!(doc["ssp_id"], "ssp");
        assert_eq!(doc["dsp_id"], "dsp");
        assert_eq!(doc["ssp_bidfloor"], 10.0);
        assert_eq!(doc["dsp_price"], 12.5);
        assert_eq!(doc["commission"], 0.2);
        assert!(doc.get("timestamp").is_some());
    }
}

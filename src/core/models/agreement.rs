use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A standing commercial relationship between a publisher (ssp)
/// and a demand partner (dsp). Provisioned out of band and
/// read-only to the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct AgreementRecord {
    pub ssp_id: String,
    pub dsp_id: String,
    /// Multiplicative markup applied to the publisher floor,
    /// e.g. 0.2 raises a $10 floor to $12 for this partner
    #[serde(with = "rust_decimal::serde::float")]
    pub commission: Decimal,
    /// Where bid requests for this partner are POSTed
    pub dsp_url: String,
}

impl AgreementRecord {
    /// Commission must be a non-negative markup
    pub fn is_valid(&self) -> bool {
        self.commission >= Decimal::ZERO
    }
}

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on floors and prices compared or persisted
pub const MONEY_DP: u32 = 3;

/// Round to [`MONEY_DP`] places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// The floor a single partner is asked to beat: the publisher floor
/// marked up by that partner's commission
///
/// # Example
/// A $10.00 floor with a 0.2 commission becomes $12.000
///
/// `None` when the marked up floor falls outside the decimal range.
pub fn partner_floor(publisher_floor: Decimal, commission: Decimal) -> Option<Decimal> {
    Decimal::ONE
        .checked_add(commission)
        .and_then(|markup| publisher_floor.checked_mul(markup))
        .map(round_money)
}

/// Lift a wire price into a decimal, `None` for NaN, infinities or
/// values outside the decimal range. Parses the shortest round-trip
/// representation so 11.01 on the wire is exactly 11.01 here.
pub fn from_wire(price: f64) -> Option<Decimal> {
    if !price.is_finite() {
        return None;
    }

    price.to_string().parse::<Decimal>().ok()
}

/// Lower a decimal back onto the wire
pub fn to_wire(price: Decimal) -> f64 {
    price.to_f64().unwrap_or_default()
}

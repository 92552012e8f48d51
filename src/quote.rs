//! Quote model — pure pricing arithmetic.
//!
//! The remote service owns authoritative pricing; the client only adds the
//! locally selected add-on fee and derives the deposit. All arithmetic is
//! exact `Decimal`; rounding to two places happens in display formatting
//! only.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::draft::SetupOption;

/// Deposit due now, as a fraction of the final total.
pub const DEPOSIT_RATE: Decimal = dec!(0.5);

/// Sets threshold at which the server grants a bundle discount.
pub const DISCOUNT_SET_THRESHOLD: u32 = 4;

/// Server-computed pricing for the requested items/dates, before add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseQuote {
    /// Total price quoted by the service.
    pub total_price: Decimal,
    /// Discount already folded into `total_price`, if any.
    pub discount_applied: Option<Decimal>,
    /// Number of full table-and-chair sets the discount was based on.
    pub full_sets_applied: u32,
}

impl BaseQuote {
    /// Whether the discount line should be shown to the customer.
    pub fn discount_visible(&self) -> bool {
        self.full_sets_applied >= DISCOUNT_SET_THRESHOLD && self.discount_applied.is_some()
    }
}

/// Final pricing shown at the add-ons/review steps.
///
/// `total` and `deposit` are always derived in [`Quote::compute`]; they are
/// never settable independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub base_price: Decimal,
    pub add_on_fee: Decimal,
    pub total: Decimal,
    pub deposit: Decimal,
}

impl Quote {
    /// Combine the cached base quote with the selected add-on fee.
    pub fn compute(base_price: Decimal, add_on_fee: Decimal) -> Self {
        let total = base_price + add_on_fee;
        Self {
            base_price,
            add_on_fee,
            total,
            deposit: total * DEPOSIT_RATE,
        }
    }

    pub fn total_display(&self) -> String {
        format_money(self.total)
    }

    pub fn deposit_display(&self) -> String {
        format_money(self.deposit)
    }
}

/// Fee for the selected setup option, or zero when nothing is selected yet.
///
/// Absence of a selection is a valid transient state (validation gates it
/// before the quote is committed), so this never errors.
pub fn resolve_setup_fee(option: Option<SetupOption>) -> Decimal {
    option.map(|o| o.fee()).unwrap_or(Decimal::ZERO)
}

/// Format a decimal amount as `$X.YY` for display.
///
/// Half-cents round away from zero, the way customers expect on a bill;
/// the default `round_dp` would round 16.665 down to 16.66.
pub fn format_money(amount: Decimal) -> String {
    format!(
        "${:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

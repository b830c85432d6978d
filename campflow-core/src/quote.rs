use crate::stay::StayRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inputs a quote is keyed by. Any change to one of these fields makes a
/// previously fetched quote stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteRequest {
    pub campground_id: Uuid,
    pub site_id: Option<Uuid>,
    pub site_class_id: Uuid,
    pub stay: StayRequest,
    pub promo_code: Option<String>,
    pub referral_code: Option<String>,
    pub tax_waiver_signed: bool,
}

/// A server-computed price breakdown for a stay, or a locally computed
/// estimate when live pricing is unavailable (`is_estimate`).
///
/// All amounts are integer cents; no floating point touches money.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub per_night_cents: i64,
    pub nights: i64,
    pub base_subtotal_cents: i64,
    /// Seasonal rules adjustment, sign and magnitude verbatim from pricing.
    pub rules_delta_cents: i64,
    pub discount_cents: i64,
    pub referral_discount_cents: i64,
    pub taxes_cents: i64,
    pub total_cents: i64,
    pub total_after_discount_cents: i64,
    pub total_with_taxes_cents: i64,
    pub tax_waiver_required: bool,
    pub policy_requirements: Vec<String>,
    pub is_estimate: bool,
}

impl Quote {
    /// Re-derive the dependent totals so the invariants hold regardless of
    /// what the pricing service sent:
    /// `total_after_discount = max(0, total - discounts)` and
    /// `total_with_taxes = total_after_discount + taxes`.
    pub fn normalized(mut self) -> Quote {
        let discounts = self.discount_cents + self.referral_discount_cents;
        self.total_after_discount_cents = (self.total_cents - discounts).max(0);
        self.total_with_taxes_cents = self.total_after_discount_cents + self.taxes_cents;
        self
    }

    /// Deterministic local estimate used while the live quote is loading,
    /// failed, or no specific site is resolved yet. Taxes use the configured
    /// fallback rate in basis points, rounded half-up in integer math.
    pub fn fallback(per_night_cents: i64, nights: i64, fallback_tax_rate_bp: u32) -> Quote {
        let subtotal = per_night_cents * nights;
        let taxes = (subtotal * i64::from(fallback_tax_rate_bp) + 5_000) / 10_000;
        Quote {
            per_night_cents,
            nights,
            base_subtotal_cents: subtotal,
            rules_delta_cents: 0,
            discount_cents: 0,
            referral_discount_cents: 0,
            taxes_cents: taxes,
            total_cents: subtotal,
            total_after_discount_cents: subtotal,
            total_with_taxes_cents: subtotal + taxes,
            tax_waiver_required: false,
            policy_requirements: Vec::new(),
            is_estimate: true,
        }
        .normalized()
    }
}

/// One display line of the price breakdown. Order is significant:
/// base, adjustments, discounts, site-lock fee, taxes, pass-through fee,
/// charity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdownLine {
    pub label: String,
    pub amount_cents: i64,
    pub is_discount: bool,
    pub is_tax: bool,
}

impl PriceBreakdownLine {
    pub fn charge(label: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            label: label.into(),
            amount_cents,
            is_discount: false,
            is_tax: false,
        }
    }

    pub fn discount(label: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            label: label.into(),
            amount_cents: -amount_cents.abs(),
            is_discount: true,
            is_tax: false,
        }
    }

    pub fn tax(label: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            label: label.into(),
            amount_cents,
            is_discount: false,
            is_tax: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_estimate_math() {
        // 3 nights at $50.00 with a 10% fallback tax rate
        let quote = Quote::fallback(5000, 3, 1000);
        assert!(quote.is_estimate);
        assert_eq!(quote.base_subtotal_cents, 15_000);
        assert_eq!(quote.taxes_cents, 1_500);
        assert_eq!(quote.total_with_taxes_cents, 16_500);
    }

    #[test]
    fn test_fallback_tax_rounding_is_half_up() {
        // 333 * 825bp = 27.4725 -> 27
        let quote = Quote::fallback(333, 1, 825);
        assert_eq!(quote.taxes_cents, 27);
        // 350 * 825bp = 28.875 -> 29
        let quote = Quote::fallback(350, 1, 825);
        assert_eq!(quote.taxes_cents, 29);
    }

    #[test]
    fn test_normalized_clamps_discount_overflow() {
        let quote = Quote {
            per_night_cents: 1000,
            nights: 1,
            base_subtotal_cents: 1000,
            rules_delta_cents: 0,
            discount_cents: 5000,
            referral_discount_cents: 0,
            taxes_cents: 80,
            total_cents: 1000,
            total_after_discount_cents: 0,
            total_with_taxes_cents: 0,
            tax_waiver_required: false,
            policy_requirements: vec![],
            is_estimate: false,
        }
        .normalized();
        assert_eq!(quote.total_after_discount_cents, 0);
        assert_eq!(quote.total_with_taxes_cents, 80);
    }
}

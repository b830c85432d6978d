//! Price composition: merges a quote (live or estimated) with discounts,
//! fees, taxes, and the optional charity round-up into an ordered breakdown
//! and a single total. All arithmetic is integer cents.

use campflow_core::config::{BookingRules, FeeMode};
use campflow_core::guest::AppliedPromo;
use campflow_core::quote::{PriceBreakdownLine, Quote};
use serde::{Deserialize, Serialize};

/// Everything the composer needs besides the quote itself.
#[derive(Debug, Clone)]
pub struct CompositionInput<'a> {
    pub quote: &'a Quote,
    /// Promo explicitly applied by the guest; ignored when the quote itself
    /// already reports a discount (avoids double counting).
    pub promo: Option<&'a AppliedPromo>,
    /// A specific site was chosen (as opposed to auto-assign).
    pub site_chosen: bool,
    /// The guest/operator opted to pay the site-selection fee.
    pub pay_lock_fee: bool,
    pub charity_round_up: bool,
    pub rules: &'a BookingRules,
}

/// The composed display projection plus the resolved amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedTotal {
    /// Ordered: base, adjustments, discounts, site-lock fee, taxes,
    /// pass-through fee, charity.
    pub lines: Vec<PriceBreakdownLine>,
    pub total_cents: i64,
    pub lock_fee_cents: i64,
    /// Guest-facing service fee ($0 when absorbed).
    pub guest_fee_cents: i64,
    /// What the operator actually owes, visible internally even when
    /// absorbed.
    pub internal_fee_cents: i64,
    pub charity_cents: i64,
    pub tax_waiver_required: bool,
    pub is_estimate: bool,
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

pub fn compose(input: &CompositionInput<'_>) -> PricedTotal {
    let quote = input.quote;
    let mut lines = Vec::new();

    lines.push(PriceBreakdownLine::charge(
        format!(
            "{} x {} night{}",
            format_cents(quote.per_night_cents),
            quote.nights,
            if quote.nights == 1 { "" } else { "s" }
        ),
        quote.base_subtotal_cents,
    ));

    // Seasonal rules delta, sign and magnitude verbatim from the quote.
    if quote.rules_delta_cents > 0 {
        lines.push(PriceBreakdownLine::charge(
            "Peak season adjustment",
            quote.rules_delta_cents,
        ));
    } else if quote.rules_delta_cents < 0 {
        lines.push(PriceBreakdownLine::discount(
            "Off-season discount",
            quote.rules_delta_cents,
        ));
    }

    // A quote-reported discount takes precedence over the locally tracked
    // promo amount.
    let promo_discount = if quote.discount_cents > 0 {
        lines.push(PriceBreakdownLine::discount(
            "Discount",
            quote.discount_cents,
        ));
        quote.discount_cents
    } else if let Some(promo) = input.promo {
        lines.push(PriceBreakdownLine::discount(
            format!("Promo {}", promo.code),
            promo.discount_cents,
        ));
        promo.discount_cents
    } else {
        0
    };

    let referral_discount = quote.referral_discount_cents;
    if referral_discount > 0 {
        lines.push(PriceBreakdownLine::discount(
            "Referral discount",
            referral_discount,
        ));
    }

    // Site-lock fee applies only to an explicitly chosen site where the fee
    // was not waived.
    let lock_fee_cents = if input.site_chosen && input.pay_lock_fee {
        input.rules.site_lock_fee_cents.max(0)
    } else {
        0
    };
    if lock_fee_cents > 0 {
        lines.push(PriceBreakdownLine::charge("Site lock fee", lock_fee_cents));
    }

    if quote.taxes_cents != 0 {
        lines.push(PriceBreakdownLine::tax("Taxes", quote.taxes_cents));
    }

    // Pass-through service fee: shown to the guest or absorbed (guest sees
    // $0.00, the internal amount is kept for operator visibility).
    let configured_fee = input.rules.per_booking_fee_cents.max(0);
    let (guest_fee_cents, internal_fee_cents) = match input.rules.fee_mode {
        FeeMode::PassThrough => (configured_fee, configured_fee),
        FeeMode::Absorbed => (0, configured_fee),
    };
    if configured_fee > 0 {
        lines.push(PriceBreakdownLine::charge("Service fee", guest_fee_cents));
    }

    let total_after_discount = (quote.total_cents - promo_discount - referral_discount).max(0);
    let pre_charity = total_after_discount + quote.taxes_cents + guest_fee_cents + lock_fee_cents;

    // Charity round-up: strictly additive, rounds up to the next whole
    // dollar, never discounted.
    let charity_cents = if input.charity_round_up {
        (100 - pre_charity.rem_euclid(100)) % 100
    } else {
        0
    };
    if charity_cents > 0 {
        lines.push(PriceBreakdownLine::charge(
            "Round-up for charity",
            charity_cents,
        ));
    }

    PricedTotal {
        lines,
        total_cents: pre_charity + charity_cents,
        lock_fee_cents,
        guest_fee_cents,
        internal_fee_cents,
        charity_cents,
        tax_waiver_required: quote.tax_waiver_required,
        is_estimate: quote.is_estimate,
    }
}

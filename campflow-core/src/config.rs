use serde::{Deserialize, Serialize};

/// Whether the per-booking service fee is shown to the guest or absorbed by
/// the operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeeMode {
    PassThrough,
    Absorbed,
}

/// Tunable business rules for the booking flow. Loaded from layered config
/// files plus environment overrides (see campflow-session).
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRules {
    /// Tax rate used for fallback estimates, in basis points (825 = 8.25%).
    #[serde(default = "default_fallback_tax_rate_bp")]
    pub fallback_tax_rate_bp: u32,
    /// How far the next-opening probe looks past the requested arrival.
    #[serde(default = "default_lookahead_days")]
    pub availability_lookahead_days: u32,
    #[serde(default = "default_hold_seconds")]
    pub hold_seconds: u64,
    /// Idle time before the abandoned-cart signal fires.
    #[serde(default = "default_abandonment_seconds")]
    pub abandonment_delay_seconds: u64,
    /// Fee for locking a specific site instead of auto-assign.
    #[serde(default)]
    pub site_lock_fee_cents: i64,
    /// Per-booking service fee; campground-level override of the billing
    /// plan default is resolved before it reaches this struct.
    #[serde(default)]
    pub per_booking_fee_cents: i64,
    #[serde(default = "default_fee_mode")]
    pub fee_mode: FeeMode,
    #[serde(default = "default_debounce_ms")]
    pub session_save_debounce_ms: u64,
}

fn default_fallback_tax_rate_bp() -> u32 {
    0
}

fn default_lookahead_days() -> u32 {
    7
}

fn default_hold_seconds() -> u64 {
    600
}

fn default_abandonment_seconds() -> u64 {
    900
}

fn default_fee_mode() -> FeeMode {
    FeeMode::PassThrough
}

fn default_debounce_ms() -> u64 {
    400
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            fallback_tax_rate_bp: default_fallback_tax_rate_bp(),
            availability_lookahead_days: default_lookahead_days(),
            hold_seconds: default_hold_seconds(),
            abandonment_delay_seconds: default_abandonment_seconds(),
            site_lock_fee_cents: 0,
            per_booking_fee_cents: 0,
            fee_mode: default_fee_mode(),
            session_save_debounce_ms: default_debounce_ms(),
        }
    }
}

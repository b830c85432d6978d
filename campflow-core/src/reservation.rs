use crate::guest::{GuestDraft, PaymentMethod};
use crate::stay::StayRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Everything submitted atomically to create a reservation: the accumulated
/// guest draft, the stay, the resolved site/class, and the computed total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub campground_id: Uuid,
    pub guest: GuestDraft,
    pub stay: StayRequest,
    /// `None` means auto-assign; the backend picks a site in the class.
    pub site_id: Option<Uuid>,
    pub site_class_id: Uuid,
    /// Carried so the backend can validate/release the advisory hold.
    pub hold_id: Option<Uuid>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub defer_payment: bool,
}

/// A persisted reservation. `Pending` until payment confirms (card/ACH) or
/// immediately `Confirmed` for settled-in-person methods when payment is not
/// deferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub campground_id: Uuid,
    pub site_id: Option<Uuid>,
    pub site_class_id: Uuid,
    pub status: ReservationStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn update_status(&mut self, status: ReservationStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Locally generated proof of booking for in-person settled methods; no
/// gateway round-trip exists to produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub reservation_id: Uuid,
    pub method: PaymentMethod,
    pub total_cents: i64,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    pub fn issue(reservation_id: Uuid, method: PaymentMethod, total_cents: i64) -> Self {
        Self {
            reservation_id,
            method,
            total_cents,
            issued_at: Utc::now(),
        }
    }
}

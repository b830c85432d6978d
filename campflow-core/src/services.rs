//! Collaborator contracts. Availability, pricing, holds, reservations, and
//! the abandoned-cart collector are external services consumed through these
//! traits; the engine never talks to storage or the network directly.

use crate::error::ApiError;
use crate::guest::{AppliedPromo, ContactPatch};
use crate::hold::Hold;
use crate::quote::{Quote, QuoteRequest};
use crate::reservation::{Reservation, ReservationDraft};
use crate::site::SiteRecord;
use crate::stay::StayRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Raw site records for the requested date range. Unavailable sites are
    /// included with their status so callers can render "booked" badges.
    async fn get_availability(
        &self,
        campground_id: Uuid,
        stay: &StayRequest,
    ) -> Result<Vec<SiteRecord>, ApiError>;
}

#[async_trait]
pub trait PricingApi: Send + Sync {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError>;

    async fn validate_promo_code(
        &self,
        campground_id: Uuid,
        code: &str,
        base_total_cents: i64,
    ) -> Result<AppliedPromo, ApiError>;
}

#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Request a short-lived exclusive claim on a specific site.
    async fn create_hold(
        &self,
        campground_id: Uuid,
        site_id: Uuid,
        stay: &StayRequest,
    ) -> Result<Hold, ApiError>;
}

#[async_trait]
pub trait ReservationApi: Send + Sync {
    async fn create_reservation(&self, draft: &ReservationDraft) -> Result<Reservation, ApiError>;

    async fn update_reservation(
        &self,
        id: Uuid,
        patch: &ContactPatch,
    ) -> Result<Reservation, ApiError>;

    async fn cancel_reservation(&self, id: Uuid) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AbandonmentSink: Send + Sync {
    async fn report_abandoned_cart(
        &self,
        campground_id: Uuid,
        contact: &ContactPatch,
        at: DateTime<Utc>,
    ) -> Result<(), ApiError>;
}

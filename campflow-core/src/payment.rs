use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payment intent created against a reservation. The hosted payment UI
/// consumes the client secret; this engine only coordinates creation and
/// reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's ID (e.g. pi_123)
    pub id: String,
    pub reservation_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent scoped to a reservation.
    async fn create_intent(
        &self,
        reservation_id: Uuid,
        amount_cents: i64,
        guest_email: &str,
    ) -> Result<PaymentIntent, ApiError>;

    /// Tell the backend a confirmed intent settled, so reservation status
    /// can be reconciled. Best-effort; webhooks catch up if this fails.
    async fn confirm_intent(&self, intent_id: &str, reservation_id: Uuid) -> Result<(), ApiError>;
}

use campflow_core::hold::Hold;
use campflow_core::services::InventoryApi;
use campflow_core::stay::StayRequest;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// mm:ss countdown for an active hold, recomputed on a one-second tick.
/// Reaches "Expired" exactly at the expiry instant and never goes negative.
pub fn countdown_label(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> String {
    let remaining = (expires_at - now).num_seconds();
    if remaining <= 0 {
        return "Expired".to_string();
    }
    format!("{:02}:{:02}", remaining / 60, remaining % 60)
}

/// Requests and tracks the single advisory hold of an in-progress checkout.
/// Hold acquisition is best-effort: a failure is logged and checkout
/// proceeds without one, leaving conflict resolution to the backend at
/// reservation-creation time.
pub struct HoldManager {
    inventory: Arc<dyn InventoryApi>,
    active: Option<Hold>,
}

impl HoldManager {
    pub fn new(inventory: Arc<dyn InventoryApi>) -> Self {
        Self {
            inventory,
            active: None,
        }
    }

    /// Acquire a hold for the site, reusing an unexpired one for the same
    /// site. An expired hold is never assumed valid; a fresh one is
    /// requested.
    pub async fn acquire(
        &mut self,
        campground_id: Uuid,
        site_id: Uuid,
        stay: &StayRequest,
    ) -> Option<Hold> {
        let now = Utc::now();
        if let Some(hold) = &self.active {
            if hold.site_id == site_id && !hold.is_expired(now) {
                return Some(hold.clone());
            }
        }
        self.active = None;

        match self.inventory.create_hold(campground_id, site_id, stay).await {
            Ok(hold) => {
                tracing::info!(hold_id = %hold.id, %site_id, "site held");
                self.active = Some(hold.clone());
                Some(hold)
            }
            Err(error) => {
                tracing::warn!(%error, %site_id, "hold request failed, proceeding without hold");
                None
            }
        }
    }

    /// The current hold, if it has not yet lapsed.
    pub fn active(&self, now: DateTime<Utc>) -> Option<&Hold> {
        self.active.as_ref().filter(|h| !h.is_expired(now))
    }

    /// Forget the hold locally (reservation completed or site deselected).
    /// The inventory-side lifecycle lapses on its own.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

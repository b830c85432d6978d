//! The reservation/payment saga: pre-submit contact update, reservation
//! creation, payment-timing branch, intent creation, external confirmation
//! hand-off, and reconciliation, with compensation (reservation cancel) on
//! user abandonment. Stage ordering lives in the pure [`apply`] transition
//! function; the [`CheckoutSaga`] driver performs the effects.

use campflow_core::error::{ApiError, BookingError};
use campflow_core::payment::PaymentGateway;
use campflow_core::reservation::{Receipt, ReservationDraft};
use campflow_core::services::ReservationApi;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SagaStage {
    ContactUpdate,
    ReservationCreate,
    IntentCreate,
    Confirmation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SagaState {
    Idle,
    ReservationCreated {
        reservation_id: Uuid,
    },
    AwaitingConfirmation {
        reservation_id: Uuid,
        intent_id: String,
        client_secret: String,
    },
    Completed {
        reservation_id: Uuid,
    },
    Cancelled {
        reservation_id: Uuid,
    },
    Failed {
        stage: SagaStage,
        /// Retained so a retry can reuse the pending reservation instead of
        /// creating a duplicate.
        reservation_id: Option<Uuid>,
    },
}

impl SagaState {
    pub fn reservation_id(&self) -> Option<Uuid> {
        match self {
            SagaState::Idle => None,
            SagaState::ReservationCreated { reservation_id }
            | SagaState::AwaitingConfirmation { reservation_id, .. }
            | SagaState::Completed { reservation_id }
            | SagaState::Cancelled { reservation_id } => Some(*reservation_id),
            SagaState::Failed { reservation_id, .. } => *reservation_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed { .. } | SagaState::Cancelled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaEvent {
    ReservationCreated(Uuid),
    ReservationFailed,
    /// Deferred or in-person payment: no gateway round-trip.
    SettledLocally,
    IntentCreated {
        intent_id: String,
        client_secret: String,
    },
    IntentFailed,
    ConfirmationSucceeded,
    ConfirmationFailed,
    UserCancelled,
}

/// Pure transition function. Events that do not apply to the current state
/// leave it unchanged; `Cancelled` is only reachable through explicit
/// compensation, never from a transient error.
pub fn apply(state: SagaState, event: SagaEvent) -> SagaState {
    match (state, event) {
        (SagaState::Idle, SagaEvent::ReservationCreated(id)) => {
            SagaState::ReservationCreated { reservation_id: id }
        }
        (SagaState::Idle, SagaEvent::ReservationFailed) => SagaState::Failed {
            stage: SagaStage::ReservationCreate,
            reservation_id: None,
        },
        // Retry after a failed attempt reuses the retained reservation.
        (
            SagaState::Failed {
                reservation_id: Some(id),
                ..
            },
            SagaEvent::ReservationCreated(_),
        ) => SagaState::ReservationCreated { reservation_id: id },
        (
            SagaState::Failed {
                reservation_id: None,
                ..
            },
            SagaEvent::ReservationCreated(id),
        ) => SagaState::ReservationCreated { reservation_id: id },
        (SagaState::Failed { reservation_id: None, .. }, SagaEvent::ReservationFailed) => {
            SagaState::Failed {
                stage: SagaStage::ReservationCreate,
                reservation_id: None,
            }
        }
        (SagaState::ReservationCreated { reservation_id }, SagaEvent::SettledLocally) => {
            SagaState::Completed { reservation_id }
        }
        (
            SagaState::ReservationCreated { reservation_id },
            SagaEvent::IntentCreated {
                intent_id,
                client_secret,
            },
        ) => SagaState::AwaitingConfirmation {
            reservation_id,
            intent_id,
            client_secret,
        },
        (SagaState::ReservationCreated { reservation_id }, SagaEvent::IntentFailed) => {
            SagaState::Failed {
                stage: SagaStage::IntentCreate,
                reservation_id: Some(reservation_id),
            }
        }
        (
            SagaState::AwaitingConfirmation { reservation_id, .. },
            SagaEvent::ConfirmationSucceeded,
        ) => SagaState::Completed { reservation_id },
        // Confirmation failure is retryable in place; the intent stays
        // usable and no compensation runs.
        (state @ SagaState::AwaitingConfirmation { .. }, SagaEvent::ConfirmationFailed) => state,
        // A retried begin issues a fresh intent; the replacement id and
        // secret must win or reconciliation targets the superseded intent.
        (
            SagaState::AwaitingConfirmation { reservation_id, .. },
            SagaEvent::IntentCreated {
                intent_id,
                client_secret,
            },
        ) => SagaState::AwaitingConfirmation {
            reservation_id,
            intent_id,
            client_secret,
        },
        (SagaState::ReservationCreated { reservation_id }, SagaEvent::UserCancelled)
        | (SagaState::AwaitingConfirmation { reservation_id, .. }, SagaEvent::UserCancelled) => {
            SagaState::Cancelled { reservation_id }
        }
        (
            SagaState::Failed {
                reservation_id: Some(reservation_id),
                ..
            },
            SagaEvent::UserCancelled,
        ) => SagaState::Cancelled { reservation_id },
        (state, _) => state,
    }
}

/// What the caller does next after `begin`.
#[derive(Debug, Clone)]
pub enum SagaProgress {
    /// Hand the client secret to the hosted payment UI, then report the
    /// outcome via `confirm_external_success` / `confirmation_failed` /
    /// `abandon`.
    AwaitingExternalConfirmation { client_secret: String },
    /// "Pay later": the reservation stands pending awaiting offline
    /// settlement.
    CompletedPendingInvoice { reservation_id: Uuid },
    /// Cash/check/folio settled at the desk; receipt generated locally.
    CompletedInPerson { receipt: Receipt },
}

pub struct CheckoutSaga {
    reservations: Arc<dyn ReservationApi>,
    gateway: Arc<dyn PaymentGateway>,
    state: SagaState,
}

impl CheckoutSaga {
    pub fn new(reservations: Arc<dyn ReservationApi>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            reservations,
            gateway,
            state: SagaState::Idle,
        }
    }

    pub fn state(&self) -> &SagaState {
        &self.state
    }

    pub fn reservation_id(&self) -> Option<Uuid> {
        self.state.reservation_id()
    }

    fn transition(&mut self, event: SagaEvent) {
        let next = apply(self.state.clone(), event);
        if next != self.state {
            tracing::info!(from = ?self.state, to = ?next, "saga transition");
            self.state = next;
        }
    }

    /// Run the saga up to the external confirmation hand-off (or to
    /// completion for locally settled methods). Each stage's failure
    /// short-circuits the rest and surfaces a stage-specific error.
    pub async fn begin(
        &mut self,
        draft: &ReservationDraft,
        contact_dirty: bool,
    ) -> Result<SagaProgress, BookingError> {
        if self.state.is_terminal() {
            return Err(BookingError::validation(
                "saga",
                "checkout already finished; start a new booking",
            ));
        }

        // A failed earlier attempt may have left a pending reservation
        // behind; reuse it rather than create a duplicate.
        let retained = self.state.reservation_id();

        // Stage 1: pre-submit contact update. Non-fatal; logged, never
        // blocking.
        if contact_dirty {
            if let Some(id) = retained {
                if let Err(error) = self
                    .reservations
                    .update_reservation(id, &draft.guest.contact_patch())
                    .await
                {
                    tracing::warn!(%error, reservation_id = %id, "pre-submit contact update failed");
                }
            }
        }

        // Stage 2: reservation creation.
        let reservation_id = match retained {
            Some(id) => {
                self.transition(SagaEvent::ReservationCreated(id));
                id
            }
            None => match self.reservations.create_reservation(draft).await {
                Ok(reservation) => {
                    self.transition(SagaEvent::ReservationCreated(reservation.id));
                    reservation.id
                }
                Err(error) => {
                    self.transition(SagaEvent::ReservationFailed);
                    return Err(map_reservation_error(error));
                }
            },
        };

        // Stage 3: branch on payment timing.
        if draft.defer_payment {
            self.transition(SagaEvent::SettledLocally);
            return Ok(SagaProgress::CompletedPendingInvoice { reservation_id });
        }
        if draft.payment_method.settles_in_person() {
            self.transition(SagaEvent::SettledLocally);
            let receipt = Receipt::issue(reservation_id, draft.payment_method, draft.total_cents);
            return Ok(SagaProgress::CompletedInPerson { receipt });
        }

        // Stage 4: payment-intent creation, scoped to the reservation.
        let intent = match self
            .gateway
            .create_intent(reservation_id, draft.total_cents, &draft.guest.email)
            .await
        {
            Ok(intent) => intent,
            Err(error) => {
                self.transition(SagaEvent::IntentFailed);
                return Err(BookingError::PaymentInitialization(error.to_string()));
            }
        };
        let client_secret = match intent.client_secret {
            Some(secret) => secret,
            None => {
                self.transition(SagaEvent::IntentFailed);
                return Err(BookingError::PaymentInitialization(
                    "gateway returned no client secret".to_string(),
                ));
            }
        };

        self.transition(SagaEvent::IntentCreated {
            intent_id: intent.id,
            client_secret: client_secret.clone(),
        });
        Ok(SagaProgress::AwaitingExternalConfirmation { client_secret })
    }

    /// Stage 5, success path: the hosted payment UI confirmed. Reconcile
    /// with the backend best-effort; a reconciliation failure is logged and
    /// the saga still completes, trusting webhooks to catch up.
    pub async fn confirm_external_success(&mut self) -> Result<Uuid, BookingError> {
        let (reservation_id, intent_id) = match &self.state {
            SagaState::AwaitingConfirmation {
                reservation_id,
                intent_id,
                ..
            } => (*reservation_id, intent_id.clone()),
            _ => {
                return Err(BookingError::PaymentConfirmation(
                    "no payment awaiting confirmation".to_string(),
                ))
            }
        };

        if let Err(error) = self.gateway.confirm_intent(&intent_id, reservation_id).await {
            tracing::warn!(%error, %reservation_id, "payment reconciliation failed; relying on webhooks");
        }
        self.transition(SagaEvent::ConfirmationSucceeded);
        Ok(reservation_id)
    }

    /// Stage 5, failure path: the hosted UI reported a declined/failed
    /// confirmation. Retry is permitted; nothing is compensated.
    pub fn confirmation_failed(&mut self, reason: impl Into<String>) -> BookingError {
        self.transition(SagaEvent::ConfirmationFailed);
        BookingError::PaymentConfirmation(reason.into())
    }

    /// Compensating action: the user abandoned payment before confirmation.
    /// Cancels the reservation (best-effort, errors swallowed) so inventory
    /// is released and no pending booking is orphaned.
    pub async fn abandon(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if let Some(id) = self.state.reservation_id() {
            if let Err(error) = self.reservations.cancel_reservation(id).await {
                tracing::warn!(%error, reservation_id = %id, "compensating cancel failed");
            } else {
                tracing::info!(reservation_id = %id, "reservation cancelled after abandoned payment");
            }
        }
        self.transition(SagaEvent::UserCancelled);
    }
}

fn map_reservation_error(error: ApiError) -> BookingError {
    match error {
        ApiError::Conflict(message) => BookingError::AvailabilityConflict(message),
        other => BookingError::ReservationCreation(other.to_string()),
    }
}

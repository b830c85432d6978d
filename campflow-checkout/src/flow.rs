//! The booking flow façade: owns the step machine, the guest draft, the
//! selected stay/site, and wires the matcher, quote service, hold manager,
//! and saga together for a single checkout session.

use crate::fetch::{FetchKind, FetchTracker};
use crate::hold::HoldManager;
use crate::saga::{CheckoutSaga, SagaProgress, SagaState};
use crate::steps::{step_errors, BookingStep, FlowVariant, StepContext, StepMachine};
use campflow_catalog::availability::{AvailabilityMatcher, SiteFilterOptions, SiteMatch};
use campflow_catalog::pricing::{compose, CompositionInput, PricedTotal};
use campflow_catalog::quote::QuoteService;
use campflow_core::config::BookingRules;
use campflow_core::error::{BookingError, FieldError};
use campflow_core::guest::{AppliedPromo, GuestDraft};
use campflow_core::payment::PaymentGateway;
use campflow_core::quote::QuoteRequest;
use campflow_core::reservation::ReservationDraft;
use campflow_core::services::{CatalogApi, InventoryApi, PricingApi, ReservationApi};
use campflow_core::site::{SiteClass, SiteRecord};
use campflow_core::stay::StayRequest;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Collaborator handles injected at flow start.
#[derive(Clone)]
pub struct FlowDeps {
    pub catalog: Arc<dyn CatalogApi>,
    pub pricing: Arc<dyn PricingApi>,
    pub inventory: Arc<dyn InventoryApi>,
    pub reservations: Arc<dyn ReservationApi>,
    pub gateway: Arc<dyn PaymentGateway>,
}

/// The guest-entered portion of flow state, serialized for session
/// persistence. Server-derived data (quotes, matches, holds) is never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowSnapshot {
    pub guest: GuestDraft,
    pub stay: Option<StayRequest>,
    pub site_id: Option<Uuid>,
    pub site_class_id: Option<Uuid>,
    pub step: BookingStep,
}

impl FlowSnapshot {
    /// Non-trivial prior progress worth offering a resume for: identity
    /// started, a site chosen, or dates entered.
    pub fn has_progress(&self) -> bool {
        self.guest.has_identity_started() || self.site_id.is_some() || self.stay.is_some()
    }
}

pub struct BookingFlow {
    campground_id: Uuid,
    rules: BookingRules,
    steps: StepMachine,
    guest: GuestDraft,
    stay: Option<StayRequest>,
    site: Option<SiteRecord>,
    /// Site identity carried over from a restored snapshot, re-selected
    /// once the next availability refresh proves it still matches.
    pending_site_id: Option<Uuid>,
    site_class_id: Option<Uuid>,
    classes: HashMap<Uuid, SiteClass>,
    matcher: AvailabilityMatcher,
    quotes: QuoteService,
    pricing: Arc<dyn PricingApi>,
    holds: HoldManager,
    saga: CheckoutSaga,
    fetches: FetchTracker,
    last_match: Option<SiteMatch>,
    tax_waiver_required: bool,
    forms_required: bool,
    payment_confirmed: bool,
    contact_dirty: bool,
}

// Builds a StepContext from the flow's fields. A macro instead of a &self
// method so `steps` can be borrowed mutably alongside it.
macro_rules! step_context {
    ($flow:expr) => {
        StepContext {
            stay: $flow.stay.as_ref(),
            guest: &$flow.guest,
            site_id: $flow.site.as_ref().map(|s| s.id),
            site_class_id: $flow
                .site_class_id
                .or_else(|| $flow.site.as_ref().map(|s| s.site_class_id)),
            tax_waiver_required: $flow.tax_waiver_required,
            forms_required: $flow.forms_required,
            payment_confirmed: $flow.payment_confirmed,
        }
    };
}

impl BookingFlow {
    pub fn new(
        campground_id: Uuid,
        variant: FlowVariant,
        rules: BookingRules,
        deps: FlowDeps,
        classes: Vec<SiteClass>,
    ) -> Self {
        let matcher = AvailabilityMatcher::new(deps.catalog, rules.availability_lookahead_days);
        let quotes = QuoteService::new(deps.pricing.clone(), rules.fallback_tax_rate_bp);
        let holds = HoldManager::new(deps.inventory);
        let saga = CheckoutSaga::new(deps.reservations, deps.gateway);
        Self {
            campground_id,
            rules,
            steps: StepMachine::new(variant),
            guest: GuestDraft::default(),
            stay: None,
            site: None,
            pending_site_id: None,
            site_class_id: None,
            classes: classes.into_iter().map(|c| (c.id, c)).collect(),
            matcher,
            quotes,
            pricing: deps.pricing,
            holds,
            saga,
            fetches: FetchTracker::new(),
            last_match: None,
            tax_waiver_required: false,
            forms_required: false,
            payment_confirmed: false,
            contact_dirty: false,
        }
    }

    /// Rehydrate a flow from a persisted snapshot after the guest chose to
    /// resume. The site record itself is re-resolved on the next
    /// availability refresh; only its identity survives reloads, held
    /// pending until the refresh confirms the site still matches.
    pub fn restore(&mut self, snapshot: FlowSnapshot, variant: FlowVariant) {
        self.guest = snapshot.guest;
        self.stay = snapshot.stay;
        self.pending_site_id = snapshot.site_id;
        self.site_class_id = snapshot.site_class_id;
        self.steps = StepMachine::resume_at(variant, snapshot.step);
        self.fetches.invalidate(FetchKind::Availability);
        self.fetches.invalidate(FetchKind::Quote);
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            guest: self.guest.clone(),
            stay: self.stay.clone(),
            site_id: self.site.as_ref().map(|s| s.id).or(self.pending_site_id),
            site_class_id: self.site_class_id,
            step: self.steps.current(),
        }
    }

    pub fn current_step(&self) -> BookingStep {
        self.steps.current()
    }

    pub fn guest(&self) -> &GuestDraft {
        &self.guest
    }

    pub fn stay(&self) -> Option<&StayRequest> {
        self.stay.as_ref()
    }

    pub fn selected_site(&self) -> Option<&SiteRecord> {
        self.site.as_ref()
    }

    pub fn saga_state(&self) -> &SagaState {
        self.saga.state()
    }

    pub fn last_match(&self) -> Option<&SiteMatch> {
        self.last_match.as_ref()
    }

    /// Replace the stay. Invalidates availability, quote, and promo
    /// interest; a previously selected site no longer applies to new dates.
    pub fn set_stay(&mut self, stay: StayRequest) -> Vec<FieldError> {
        let errors = match stay.validate() {
            Ok(()) => vec![],
            Err(BookingError::Validation { field, message }) => {
                vec![FieldError::new(field, message)]
            }
            Err(_) => vec![],
        };
        self.stay = Some(stay);
        self.site = None;
        self.pending_site_id = None;
        self.holds.clear();
        self.last_match = None;
        self.fetches.invalidate(FetchKind::Availability);
        self.fetches.invalidate(FetchKind::Quote);
        self.quotes.invalidate();
        errors
    }

    /// Mutate the guest draft. Marks contact dirty for the saga's
    /// pre-submit update and re-runs the current step's validation so stale
    /// errors clear immediately.
    pub fn update_guest(&mut self, edit: impl FnOnce(&mut GuestDraft)) -> Vec<FieldError> {
        edit(&mut self.guest);
        self.contact_dirty = true;
        // Promo/waiver/referral changes alter the quote key.
        self.fetches.invalidate(FetchKind::Quote);
        step_errors(self.steps.current(), &step_context!(self))
    }

    pub fn set_requirements(&mut self, tax_waiver_required: bool, forms_required: bool) {
        self.tax_waiver_required = tax_waiver_required;
        self.forms_required = forms_required;
    }

    /// Fetch and filter availability for the current stay. Returns `None`
    /// when the response was superseded by a newer request mid-flight.
    pub async fn refresh_availability(
        &mut self,
        opts: SiteFilterOptions,
    ) -> Result<Option<SiteMatch>, BookingError> {
        let stay = self
            .stay
            .clone()
            .ok_or_else(|| BookingError::validation("dates", "choose dates first"))?;
        let ticket = self.fetches.begin(FetchKind::Availability);
        let result = self
            .matcher
            .search(
                self.campground_id,
                &stay,
                &self.classes,
                self.guest.accessibility_required,
                opts,
            )
            .await
            .map_err(|e| BookingError::AvailabilityConflict(e.to_string()))?;
        if !self.fetches.is_current(ticket) {
            tracing::debug!("discarding stale availability response");
            return Ok(None);
        }
        self.last_match = Some(result.clone());
        // A restored selection is honored only while the site still matches.
        if let Some(pending) = self.pending_site_id.take() {
            if let Some(site) = result.sites.iter().find(|s| s.id == pending) {
                self.site_class_id = Some(site.site_class_id);
                self.site = Some(site.clone());
            } else {
                tracing::info!(site_id = %pending, "restored site selection no longer matches");
            }
        }
        Ok(Some(result))
    }

    /// Choose a specific site. The site must be in the last match so a
    /// stale card click cannot select inventory that filtered out.
    pub fn select_site(&mut self, site_id: Uuid) -> Result<(), BookingError> {
        let site = self
            .last_match
            .as_ref()
            .and_then(|m| m.sites.iter().find(|s| s.id == site_id))
            .cloned()
            .ok_or_else(|| {
                BookingError::AvailabilityConflict("site is no longer in the results".to_string())
            })?;
        self.site_class_id = Some(site.site_class_id);
        self.site = Some(site);
        self.pending_site_id = None;
        self.fetches.invalidate(FetchKind::Quote);
        self.quotes.invalidate();
        Ok(())
    }

    /// Auto-assign within a class instead of locking a specific site.
    pub fn select_class(&mut self, class_id: Uuid) -> Result<(), BookingError> {
        if !self.classes.contains_key(&class_id) {
            return Err(BookingError::validation("site_class", "unknown site class"));
        }
        self.site = None;
        self.pending_site_id = None;
        self.holds.clear();
        self.site_class_id = Some(class_id);
        self.fetches.invalidate(FetchKind::Quote);
        self.quotes.invalidate();
        Ok(())
    }

    fn quote_request(&self) -> Result<QuoteRequest, BookingError> {
        let stay = self
            .stay
            .clone()
            .ok_or_else(|| BookingError::validation("dates", "choose dates first"))?;
        let site_class_id = self
            .site_class_id
            .or_else(|| self.site.as_ref().map(|s| s.site_class_id))
            .ok_or_else(|| BookingError::validation("site", "choose a site or site type first"))?;
        Ok(QuoteRequest {
            campground_id: self.campground_id,
            site_id: self.site.as_ref().map(|s| s.id),
            site_class_id,
            stay,
            promo_code: self.guest.applied_promo.as_ref().map(|p| p.code.clone()),
            referral_code: self.guest.referral_code.clone(),
            tax_waiver_signed: self.guest.tax_waiver_signed,
        })
    }

    fn fallback_per_night(&self) -> i64 {
        let class = self
            .site_class_id
            .and_then(|id| self.classes.get(&id))
            .or_else(|| {
                self.site
                    .as_ref()
                    .and_then(|s| self.classes.get(&s.site_class_id))
            });
        self.site
            .as_ref()
            .and_then(|s| s.resolved_rate_cents(class))
            .or(class.map(|c| c.default_rate_cents))
            .unwrap_or(0)
    }

    /// Current composed price: live quote when possible, otherwise a
    /// flagged estimate.
    pub async fn current_total(&mut self) -> Result<PricedTotal, BookingError> {
        let request = self.quote_request()?;
        let fallback_rate = self.fallback_per_night();
        let quote = self.quotes.quote(request, fallback_rate).await;
        self.tax_waiver_required = quote.tax_waiver_required;
        let total = compose(&CompositionInput {
            quote: &quote,
            promo: self.guest.applied_promo.as_ref(),
            site_chosen: self.site.is_some(),
            pay_lock_fee: self.guest.pay_site_lock_fee,
            charity_round_up: self.guest.charity_round_up,
            rules: &self.rules,
        });
        Ok(total)
    }

    /// Validate and apply a promo code. Rejection is surfaced inline and
    /// never blocks checkout.
    pub async fn apply_promo(&mut self, code: &str) -> Result<AppliedPromo, BookingError> {
        let base_total = self.current_total().await?.total_cents;
        let ticket = self.fetches.begin(FetchKind::Promo);
        let promo = self
            .pricing
            .validate_promo_code(self.campground_id, code, base_total)
            .await
            .map_err(|e| BookingError::PromoInvalid(e.to_string()))?;
        if !self.fetches.is_current(ticket) {
            return Err(BookingError::PromoInvalid(
                "code changed while validating".to_string(),
            ));
        }
        self.guest.applied_promo = Some(promo.clone());
        self.fetches.invalidate(FetchKind::Quote);
        self.quotes.invalidate();
        Ok(promo)
    }

    /// Remove an applied promo; pricing returns to the pre-promo total.
    pub fn remove_promo(&mut self) {
        self.guest.applied_promo = None;
        self.guest.promo_code_entry = None;
        self.fetches.invalidate(FetchKind::Quote);
        self.quotes.invalidate();
    }

    pub fn step_errors(&self) -> Vec<FieldError> {
        step_errors(self.steps.current(), &step_context!(self))
    }

    pub fn advance(&mut self) -> Result<BookingStep, BookingError> {
        let ctx = step_context!(self);
        self.steps.advance(&ctx)
    }

    pub fn back(&mut self) -> Option<BookingStep> {
        self.steps.back()
    }

    /// Begin the payment saga from the Payment step: hold the chosen site
    /// (best-effort), then create the reservation and, for gateway methods,
    /// the payment intent.
    pub async fn begin_payment(&mut self) -> Result<SagaProgress, BookingError> {
        if self.steps.current() != BookingStep::Payment {
            return Err(BookingError::validation(
                "step",
                "payment can only start from the payment step",
            ));
        }
        let stay = self
            .stay
            .clone()
            .ok_or_else(|| BookingError::validation("dates", "choose dates first"))?;
        let payment_method = self
            .guest
            .payment_method
            .ok_or_else(|| BookingError::validation("payment_method", "choose how to pay"))?;

        let hold_id = match self.site.as_ref().map(|s| s.id) {
            Some(site_id) => self
                .holds
                .acquire(self.campground_id, site_id, &stay)
                .await
                .map(|h| h.id),
            None => None,
        };

        let total = self.current_total().await?;
        let site_class_id = self
            .site_class_id
            .or_else(|| self.site.as_ref().map(|s| s.site_class_id))
            .ok_or_else(|| BookingError::validation("site", "choose a site or site type first"))?;
        let draft = ReservationDraft {
            campground_id: self.campground_id,
            guest: self.guest.clone(),
            stay,
            site_id: self.site.as_ref().map(|s| s.id),
            site_class_id,
            hold_id,
            total_cents: total.total_cents,
            payment_method,
            defer_payment: self.guest.defer_payment,
        };

        let progress = self.saga.begin(&draft, self.contact_dirty).await?;
        self.contact_dirty = false;
        if !matches!(progress, SagaProgress::AwaitingExternalConfirmation { .. }) {
            self.finish();
        }
        Ok(progress)
    }

    /// The hosted payment UI confirmed; reconcile and move to Complete.
    pub async fn confirm_payment(&mut self) -> Result<Uuid, BookingError> {
        let reservation_id = self.saga.confirm_external_success().await?;
        self.finish();
        Ok(reservation_id)
    }

    /// The hosted payment UI reported failure; retry is permitted.
    pub fn payment_failed(&mut self, reason: impl Into<String>) -> BookingError {
        self.saga.confirmation_failed(reason)
    }

    /// The guest dismissed payment before confirming: compensate by
    /// cancelling the reservation.
    pub async fn cancel_payment(&mut self) {
        self.saga.abandon().await;
        self.holds.clear();
    }

    pub fn hold_countdown(&self) -> Option<String> {
        let now = Utc::now();
        self.holds
            .active(now)
            .map(|h| crate::hold::countdown_label(now, h.expires_at))
    }

    fn finish(&mut self) {
        self.payment_confirmed = true;
        self.holds.clear();
        while !self.steps.is_complete() {
            let ctx = step_context!(self);
            if self.steps.advance(&ctx).is_err() {
                break;
            }
        }
    }
}

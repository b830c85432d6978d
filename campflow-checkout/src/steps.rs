use campflow_core::error::{BookingError, FieldError};
use campflow_core::guest::GuestDraft;
use campflow_core::stay::StayRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The checkout steps, in order. `Complete` is terminal for the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Dates,
    Site,
    Details,
    Payment,
    Complete,
}

/// The four-step flow walks every step; the three-step variant collapses
/// date and site selection into a single screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    FourStep,
    ThreeStep,
}

impl FlowVariant {
    pub fn sequence(&self) -> &'static [BookingStep] {
        match self {
            FlowVariant::FourStep => &[
                BookingStep::Dates,
                BookingStep::Site,
                BookingStep::Details,
                BookingStep::Payment,
                BookingStep::Complete,
            ],
            FlowVariant::ThreeStep => &[
                BookingStep::Site,
                BookingStep::Details,
                BookingStep::Payment,
                BookingStep::Complete,
            ],
        }
    }
}

/// What step validation looks at. Borrowed from the flow so validation stays
/// a pure function of current state.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub stay: Option<&'a StayRequest>,
    pub guest: &'a GuestDraft,
    pub site_id: Option<Uuid>,
    pub site_class_id: Option<Uuid>,
    pub tax_waiver_required: bool,
    pub forms_required: bool,
    pub payment_confirmed: bool,
}

fn date_errors(ctx: &StepContext<'_>) -> Vec<FieldError> {
    match ctx.stay {
        None => vec![FieldError::new("dates", "Choose arrival and departure dates")],
        Some(stay) => match stay.validate() {
            Ok(()) => vec![],
            Err(BookingError::Validation { field, message }) => {
                vec![FieldError::new(field, message)]
            }
            Err(_) => vec![],
        },
    }
}

fn site_errors(ctx: &StepContext<'_>) -> Vec<FieldError> {
    if ctx.site_id.is_none() && ctx.site_class_id.is_none() {
        vec![FieldError::new("site", "Choose a site or a site type")]
    } else {
        vec![]
    }
}

fn details_errors(ctx: &StepContext<'_>) -> Vec<FieldError> {
    let mut errors = ctx.guest.identity_errors();
    if ctx.tax_waiver_required && !ctx.guest.tax_waiver_signed {
        errors.push(FieldError::new(
            "tax_waiver",
            "The tax waiver must be signed before payment",
        ));
    }
    if !ctx.guest.policies_accepted {
        errors.push(FieldError::new(
            "policies",
            "Campground policies must be accepted",
        ));
    }
    if ctx.forms_required && !ctx.guest.supplemental_forms_complete {
        errors.push(FieldError::new(
            "forms",
            "Required forms are not complete",
        ));
    }
    errors
}

/// Inline errors for a single step as currently filled in. Re-run on every
/// field change so stale messages clear immediately rather than at submit.
pub fn step_errors(step: BookingStep, ctx: &StepContext<'_>) -> Vec<FieldError> {
    match step {
        BookingStep::Dates => date_errors(ctx),
        BookingStep::Site => site_errors(ctx),
        BookingStep::Details => details_errors(ctx),
        BookingStep::Payment | BookingStep::Complete => vec![],
    }
}

/// Everything that must already hold to enter a step: the union of all
/// prior steps' gates.
fn entry_errors(target: BookingStep, ctx: &StepContext<'_>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match target {
        BookingStep::Dates => {}
        BookingStep::Site => errors.extend(date_errors(ctx)),
        BookingStep::Details => {
            errors.extend(date_errors(ctx));
            errors.extend(site_errors(ctx));
        }
        BookingStep::Payment => {
            errors.extend(date_errors(ctx));
            errors.extend(site_errors(ctx));
            errors.extend(details_errors(ctx));
        }
        BookingStep::Complete => {
            if !ctx.payment_confirmed {
                errors.push(FieldError::new("payment", "Payment has not been confirmed"));
            }
        }
    }
    errors
}

/// Owns the current step. Forward transitions are gated on validation;
/// backward navigation is unconditional and discards nothing.
#[derive(Debug, Clone)]
pub struct StepMachine {
    variant: FlowVariant,
    index: usize,
}

impl StepMachine {
    pub fn new(variant: FlowVariant) -> Self {
        Self { variant, index: 0 }
    }

    /// Resume at a previously persisted step, if it exists in this variant.
    pub fn resume_at(variant: FlowVariant, step: BookingStep) -> Self {
        let index = variant
            .sequence()
            .iter()
            .position(|s| *s == step)
            .unwrap_or(0);
        Self { variant, index }
    }

    pub fn current(&self) -> BookingStep {
        self.variant.sequence()[self.index]
    }

    pub fn is_complete(&self) -> bool {
        self.current() == BookingStep::Complete
    }

    /// Move forward one step if the next step's entry gate passes.
    pub fn advance(&mut self, ctx: &StepContext<'_>) -> Result<BookingStep, BookingError> {
        let sequence = self.variant.sequence();
        if self.index + 1 >= sequence.len() {
            return Ok(self.current());
        }
        let target = sequence[self.index + 1];
        let errors = entry_errors(target, ctx);
        if let Some(first) = errors.into_iter().next() {
            return Err(BookingError::Validation {
                field: first.field,
                message: first.message,
            });
        }
        self.index += 1;
        tracing::debug!(step = ?self.current(), "advanced to step");
        Ok(self.current())
    }

    /// Move backward unconditionally. `Complete` is terminal; re-entering
    /// the flow starts a new instance instead.
    pub fn back(&mut self) -> Option<BookingStep> {
        if self.index == 0 || self.is_complete() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }
}

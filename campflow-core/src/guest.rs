use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the guest intends to pay. Card and ACH go through the payment
/// gateway; cash, check, and folio settle in person with a locally issued
/// receipt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Ach,
    Cash,
    Check,
    Folio,
}

impl PaymentMethod {
    pub fn settles_in_person(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash | PaymentMethod::Check | PaymentMethod::Folio
        )
    }

    pub fn requires_gateway(&self) -> bool {
        matches!(self, PaymentMethod::Card | PaymentMethod::Ach)
    }
}

/// A promo code that has been validated and explicitly applied. A code that
/// was merely typed into the field never affects pricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedPromo {
    pub code: String,
    pub promotion_id: Option<Uuid>,
    pub discount_cents: i64,
}

/// Contact/address fields as a patch, used by the saga's pre-submit update
/// and by the abandoned-cart report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

/// Everything the guest (or staff operator) enters across steps. Created
/// empty at flow start, persisted after every change, cleared on successful
/// booking or explicit discard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuestDraft {
    pub guest_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    // Staff-entered address, only collected on operator flows.
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub accessibility_required: bool,
    pub stay_reason: Option<String>,
    /// Code typed into the promo field; pricing only reacts to
    /// `applied_promo`.
    pub promo_code_entry: Option<String>,
    pub applied_promo: Option<AppliedPromo>,
    pub referral_code: Option<String>,
    pub tax_waiver_signed: bool,
    pub policies_accepted: bool,
    pub supplemental_forms_complete: bool,
    pub charity_round_up: bool,
    pub pay_site_lock_fee: bool,
    pub payment_method: Option<PaymentMethod>,
    pub defer_payment: bool,
}

impl GuestDraft {
    /// Identity gate for entering the payment step.
    pub fn identity_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("first_name", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("last_name", "Last name is required"));
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !self.email.contains('@') {
            errors.push(FieldError::new("email", "Email does not look valid"));
        }
        errors
    }

    pub fn identity_valid(&self) -> bool {
        self.identity_errors().is_empty()
    }

    /// Usable contact information, the arming condition for the
    /// abandoned-cart timer.
    pub fn has_contact(&self) -> bool {
        !self.email.trim().is_empty() || !self.phone.trim().is_empty()
    }

    /// Whether identity entry has started at all (resume detection).
    pub fn has_identity_started(&self) -> bool {
        self.guest_id.is_some()
            || !self.first_name.trim().is_empty()
            || !self.email.trim().is_empty()
    }

    pub fn contact_patch(&self) -> ContactPatch {
        let some_if_present = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        ContactPatch {
            first_name: some_if_present(&self.first_name),
            last_name: some_if_present(&self.last_name),
            email: some_if_present(&self.email),
            phone: some_if_present(&self.phone),
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        let mut draft = GuestDraft::default();
        assert!(!draft.identity_valid());
        draft.first_name = "Ada".into();
        draft.last_name = "Lovelace".into();
        draft.email = "ada".into();
        let errors = draft.identity_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
        draft.email = "ada@example.com".into();
        assert!(draft.identity_valid());
    }

    #[test]
    fn test_contact_arming() {
        let mut draft = GuestDraft::default();
        assert!(!draft.has_contact());
        draft.phone = "555-0100".into();
        assert!(draft.has_contact());
    }

    #[test]
    fn test_payment_method_timing() {
        assert!(PaymentMethod::Card.requires_gateway());
        assert!(PaymentMethod::Ach.requires_gateway());
        assert!(PaymentMethod::Cash.settles_in_person());
        assert!(PaymentMethod::Folio.settles_in_person());
        assert!(!PaymentMethod::Check.requires_gateway());
    }
}

pub mod availability;
pub mod pricing;
pub mod quote;

pub use availability::{AvailabilityMatcher, ClassAvailability, SiteFilterOptions, SiteMatch};
pub use pricing::{compose, CompositionInput, PricedTotal};
pub use quote::QuoteService;

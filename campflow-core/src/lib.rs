pub mod config;
pub mod error;
pub mod guest;
pub mod hold;
pub mod payment;
pub mod quote;
pub mod reservation;
pub mod services;
pub mod site;
pub mod stay;

pub use config::{BookingRules, FeeMode};
pub use error::{ApiError, BookingError};

pub type BookingResult<T> = Result<T, BookingError>;

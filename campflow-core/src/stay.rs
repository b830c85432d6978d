use crate::error::BookingError;
use crate::site::SiteType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The guest's requested stay: date range, site type, and party/equipment
/// composition. Every availability and quote call is keyed off this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StayRequest {
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub site_type: SiteType,
    pub adults: u32,
    pub children: u32,
    pub pet_count: u32,
    pub pet_types: Vec<String>,
    pub rig_type: Option<String>,
    pub rig_length_ft: Option<u32>,
}

impl StayRequest {
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.departure <= self.arrival {
            return Err(BookingError::validation(
                "departure",
                "departure must be after arrival",
            ));
        }
        if self.adults == 0 {
            return Err(BookingError::validation(
                "adults",
                "at least one adult is required",
            ));
        }
        Ok(())
    }

    /// Number of nights, never less than 1. Callers should have validated
    /// the range first; an inverted range still yields 1 rather than a
    /// negative count.
    pub fn nights(&self) -> i64 {
        (self.departure - self.arrival).num_days().max(1)
    }

    pub fn party_size(&self) -> u32 {
        self.adults + self.children
    }

    /// Whether the declared rig implies RV occupancy, which makes the
    /// rig-length constraint apply during site filtering.
    pub fn rig_is_rv(&self) -> bool {
        self.rig_type
            .as_deref()
            .map(|r| SiteType::normalize(r) == SiteType::Rv)
            .unwrap_or(false)
    }

    /// Shift both dates forward by `days`, holding the night count constant.
    pub fn shifted(&self, days: i64) -> StayRequest {
        let mut shifted = self.clone();
        shifted.arrival += chrono::Duration::days(days);
        shifted.departure += chrono::Duration::days(days);
        shifted
    }
}

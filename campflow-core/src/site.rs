use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical site types. Catalog records arrive with free-form type strings
/// ("trailer", "van", ...) which are collapsed onto this set before any
/// filtering happens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    Rv,
    Tent,
    Cabin,
    Glamping,
    Yurt,
    Group,
    Car,
    Other,
}

impl SiteType {
    /// Normalize a raw catalog type string. Unknown or empty values map to
    /// `Other` rather than failing.
    pub fn normalize(raw: &str) -> SiteType {
        match raw.trim().to_lowercase().as_str() {
            "rv" | "trailer" | "travel_trailer" | "fifth_wheel" | "motorhome" => SiteType::Rv,
            "tent" => SiteType::Tent,
            "cabin" => SiteType::Cabin,
            "glamping" => SiteType::Glamping,
            "yurt" => SiteType::Yurt,
            "group" => SiteType::Group,
            "car" | "van" | "vehicle" => SiteType::Car,
            _ => SiteType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::Rv => "rv",
            SiteType::Tent => "tent",
            SiteType::Cabin => "cabin",
            SiteType::Glamping => "glamping",
            SiteType::Yurt => "yurt",
            SiteType::Group => "group",
            SiteType::Car => "car",
            SiteType::Other => "other",
        }
    }
}

impl std::fmt::Display for SiteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    Available,
    Booked,
    Maintenance,
    Locked,
}

/// A bookable unit within a campground. Read-only input to this engine;
/// catalog state is only ever changed through hold/reservation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: Uuid,
    pub name: String,
    pub site_number: String,
    pub site_class_id: Uuid,
    pub site_type: SiteType,
    pub status: SiteStatus,
    pub default_rate_cents: Option<i64>,
    pub rig_max_length_ft: Option<u32>,
    pub accessible: Option<bool>,
}

impl SiteRecord {
    /// Site-level rig limit wins over the class default.
    pub fn resolved_rig_max_length(&self, class: Option<&SiteClass>) -> Option<u32> {
        self.rig_max_length_ft
            .or_else(|| class.and_then(|c| c.rig_max_length_ft))
    }

    /// Accessible if flagged at either the site or the class level.
    pub fn is_accessible(&self, class: Option<&SiteClass>) -> bool {
        self.accessible.unwrap_or(false) || class.map(|c| c.accessible).unwrap_or(false)
    }

    /// Per-night rate, falling back to the class default.
    pub fn resolved_rate_cents(&self, class: Option<&SiteClass>) -> Option<i64> {
        self.default_rate_cents
            .or_else(|| class.map(|c| c.default_rate_cents))
    }
}

/// Utility hookups advertised on a site class.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Hookups {
    pub water: bool,
    pub electric: bool,
    pub sewer: bool,
}

/// The category a site belongs to: shared rate, type, and amenities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteClass {
    pub id: Uuid,
    pub name: String,
    pub site_type: SiteType,
    pub default_rate_cents: i64,
    pub max_occupancy: u32,
    pub hookups: Hookups,
    pub pet_friendly: bool,
    pub accessible: bool,
    pub rig_max_length_ft: Option<u32>,
    pub photo_url: Option<String>,
}

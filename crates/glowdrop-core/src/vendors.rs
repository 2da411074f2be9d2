use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingTier {
    Economy,
    #[default]
    Standard,
    Premium,
}

impl std::fmt::Display for PricingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingTier::Economy => write!(f, "ECONOMY"),
            PricingTier::Standard => write!(f, "STANDARD"),
            PricingTier::Premium => write!(f, "PREMIUM"),
        }
    }
}

/// A retail location from the vendor catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    /// Stable across catalog refreshes.
    pub id: String,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 0.0 to 5.0.
    #[serde(default)]
    pub rating_average: f64,
    #[serde(default)]
    pub rating_count: u32,
    #[serde(default)]
    pub category_tags: BTreeSet<String>,
    #[serde(default)]
    pub pricing_tier: PricingTier,
    /// Typical fulfillment time; lower is faster.
    #[serde(default)]
    pub velocity_minutes: Option<u32>,
    /// Zone assignment stored with the catalog record. Used when the vendor's
    /// postal code is not in the geo-zone index.
    #[serde(default)]
    pub area_id: Option<String>,
}

impl Vendor {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Check the fields the catalog relies on.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("vendor id must be non-empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("vendor '{}' has an empty name", self.id));
        }
        if !crate::is_valid_postal_code(&self.postal_code) {
            return Err(format!(
                "vendor '{}' has invalid postal code '{}'",
                self.id, self.postal_code
            ));
        }
        if !self.coordinates().is_valid() {
            return Err(format!(
                "vendor '{}' has out-of-range coordinates ({}, {})",
                self.id, self.latitude, self.longitude
            ));
        }
        if !(0.0..=5.0).contains(&self.rating_average) {
            return Err(format!(
                "vendor '{}' has rating {} outside 0.0..=5.0",
                self.id, self.rating_average
            ));
        }
        Ok(())
    }
}

/// Case-insensitive name-substring deny-list for national chain retailers.
///
/// Catalog records do not carry a trustworthy chain flag, so chain status is
/// derived from the vendor name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainDenyList {
    needles: Vec<String>,
}

impl ChainDenyList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let needles = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { needles }
    }

    #[must_use]
    pub fn matches(&self, vendor_name: &str) -> bool {
        let name = vendor_name.to_lowercase();
        self.needles
            .iter()
            .any(|needle| name.contains(needle.as_str()))
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.needles
    }
}

/// A vendor annotated for one discovery query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedVendor {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub distance_miles: f64,
    pub resolved_area_id: Option<String>,
    pub is_unmapped_postal_code: bool,
    pub is_chain_retailer: bool,
}

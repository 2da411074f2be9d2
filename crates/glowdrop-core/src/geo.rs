//! Geo-zone reference data: postal codes, their coordinates, and the areas
//! they belong to.
//!
//! Lookups are exact-match reads over immutable data. A missing postal code
//! is an ordinary outcome and surfaces as `None`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `true` when both components are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two points in miles (haversine formula).
#[must_use]
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaKind {
    Neighborhood,
    Suburb,
    Region,
}

impl std::fmt::Display for AreaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaKind::Neighborhood => write!(f, "NEIGHBORHOOD"),
            AreaKind::Suburb => write!(f, "SUBURB"),
            AreaKind::Region => write!(f, "REGION"),
        }
    }
}

impl std::str::FromStr for AreaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEIGHBORHOOD" => Ok(AreaKind::Neighborhood),
            "SUBURB" => Ok(AreaKind::Suburb),
            "REGION" => Ok(AreaKind::Region),
            other => Err(format!(
                "unknown area kind '{other}'; expected NEIGHBORHOOD, SUBURB or REGION"
            )),
        }
    }
}

/// One postal code's geographic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalZoneEntry {
    pub code: String,
    pub city: String,
    pub state: String,
    pub neighborhood_label: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_id: String,
}

impl PostalZoneEntry {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// An administrative grouping of postal codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub city: String,
    pub display_name: String,
    pub kind: AreaKind,
    /// Ordered member postal codes.
    pub member_codes: Vec<String>,
}

/// Lookup table between postal codes, coordinates and areas.
#[derive(Debug, Clone, Default)]
pub struct GeoZoneIndex {
    entries: HashMap<String, PostalZoneEntry>,
    areas: Vec<Area>,
    area_positions: HashMap<String, usize>,
}

impl GeoZoneIndex {
    /// Build an index, checking that codes and area ids are unique and that
    /// every area member code points back at its area.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first violation found.
    pub fn new(entries: Vec<PostalZoneEntry>, areas: Vec<Area>) -> Result<Self, ValidationError> {
        let mut by_code = HashMap::with_capacity(entries.len());
        for entry in entries {
            if !entry.coordinates().is_valid() {
                return Err(ValidationError(format!(
                    "postal code {} has out-of-range coordinates ({}, {})",
                    entry.code, entry.latitude, entry.longitude
                )));
            }
            let code = entry.code.clone();
            if by_code.insert(code.clone(), entry).is_some() {
                return Err(ValidationError(format!("duplicate postal code {code}")));
            }
        }

        let mut area_positions = HashMap::with_capacity(areas.len());
        for (pos, area) in areas.iter().enumerate() {
            if area_positions.insert(area.id.clone(), pos).is_some() {
                return Err(ValidationError(format!("duplicate area id '{}'", area.id)));
            }
        }

        for area in &areas {
            let mut seen = HashSet::new();
            for code in &area.member_codes {
                if !seen.insert(code.as_str()) {
                    return Err(ValidationError(format!(
                        "area '{}' lists member code {code} twice",
                        area.id
                    )));
                }
                match by_code.get(code) {
                    None => {
                        return Err(ValidationError(format!(
                            "area '{}' lists unknown postal code {code}",
                            area.id
                        )))
                    }
                    Some(entry) if entry.area_id != area.id => {
                        return Err(ValidationError(format!(
                            "area '{}' lists postal code {code}, which belongs to area '{}'",
                            area.id, entry.area_id
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self {
            entries: by_code,
            areas,
            area_positions,
        })
    }

    #[must_use]
    pub fn coordinates_of(&self, code: &str) -> Option<Coordinates> {
        self.entries.get(code).map(PostalZoneEntry::coordinates)
    }

    /// The area a postal code belongs to. `None` when the code is unknown or
    /// its `area_id` does not name a configured area.
    #[must_use]
    pub fn area_of(&self, code: &str) -> Option<&Area> {
        let entry = self.entries.get(code)?;
        self.area(&entry.area_id)
    }

    #[must_use]
    pub fn all_areas(&self) -> &[Area] {
        &self.areas
    }

    #[must_use]
    pub fn entry(&self, code: &str) -> Option<&PostalZoneEntry> {
        self.entries.get(code)
    }

    #[must_use]
    pub fn area(&self, id: &str) -> Option<&Area> {
        self.area_positions.get(id).map(|&pos| &self.areas[pos])
    }

    #[must_use]
    pub fn postal_code_count(&self) -> usize {
        self.entries.len()
    }

    /// Consume the index, returning its entries (sorted by code) and areas.
    #[must_use]
    pub fn into_parts(self) -> (Vec<PostalZoneEntry>, Vec<Area>) {
        let mut entries: Vec<PostalZoneEntry> = self.entries.into_values().collect();
        entries.sort_by(|a, b| a.code.cmp(&b.code));
        (entries, self.areas)
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::geo::{Area, GeoZoneIndex, PostalZoneEntry};
use crate::vendors::Vendor;
use crate::{ConfigError, ValidationError};

/// Houston launch dataset compiled into the binary, used when no reference
/// data path is configured.
pub const EMBEDDED_REFERENCE_DATA: &str = include_str!("../data/houston.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceData {
    pub postal_codes: Vec<PostalZoneEntry>,
    pub areas: Vec<Area>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
}

impl ReferenceData {
    /// Validate and assemble into a [`Catalog`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for malformed postal codes, index
    /// invariant violations, or invalid vendors.
    pub fn into_catalog(self) -> Result<Catalog, ValidationError> {
        for entry in &self.postal_codes {
            if !crate::is_valid_postal_code(&entry.code) {
                return Err(ValidationError(format!(
                    "invalid postal code '{}'",
                    entry.code
                )));
            }
            if entry.area_id.trim().is_empty() {
                return Err(ValidationError(format!(
                    "postal code {} has an empty area id",
                    entry.code
                )));
            }
        }
        let index = GeoZoneIndex::new(self.postal_codes, self.areas)?;
        Catalog::new(index, self.vendors)
    }
}

/// Parse reference data from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::ReferenceFileParse`] when the YAML is malformed.
pub fn parse_reference_data(yaml: &str) -> Result<ReferenceData, ConfigError> {
    serde_yaml::from_str(yaml).map_err(ConfigError::ReferenceFileParse)
}

/// Load reference data from a YAML file and validate it.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_reference_data(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReferenceFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let catalog = parse_reference_data(&content)?.into_catalog()?;
    tracing::info!(
        path = %path.display(),
        postal_codes = catalog.index().postal_code_count(),
        areas = catalog.index().all_areas().len(),
        vendors = catalog.vendors().len(),
        "loaded reference data"
    );
    Ok(catalog)
}

/// Load from `path` when given, otherwise from [`EMBEDDED_REFERENCE_DATA`].
///
/// # Errors
///
/// See [`load_reference_data`].
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, ConfigError> {
    match path {
        Some(path) => load_reference_data(path),
        None => Ok(parse_reference_data(EMBEDDED_REFERENCE_DATA)?.into_catalog()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dataset_is_valid() {
        let catalog = load_catalog(None).expect("embedded data loads");
        assert!(catalog.index().postal_code_count() >= 10);
        assert!(!catalog.vendors().is_empty());
        let third_ward = catalog.index().area_of("77004").expect("77004 mapped");
        assert!(third_ward.member_codes.iter().any(|c| c == "77004"));
    }

    #[test]
    fn embedded_dataset_has_an_unmapped_vendor() {
        let catalog = load_catalog(None).expect("embedded data loads");
        assert!(catalog
            .vendors()
            .iter()
            .any(|v| catalog.index().entry(&v.postal_code).is_none() && v.area_id.is_some()));
    }

    #[test]
    fn rejects_malformed_postal_code() {
        let yaml = r"
postal_codes:
  - code: '7700'
    city: Houston
    state: TX
    neighborhood_label: Third Ward
    latitude: 29.72
    longitude: -95.36
    area_id: third-ward
areas: []
";
        let err = parse_reference_data(yaml)
            .expect("parses")
            .into_catalog()
            .unwrap_err();
        assert!(err.0.contains("invalid postal code '7700'"));
    }

    #[test]
    fn rejects_area_member_mismatch() {
        let yaml = r"
postal_codes:
  - code: '77004'
    city: Houston
    state: TX
    neighborhood_label: Third Ward
    latitude: 29.72
    longitude: -95.36
    area_id: third-ward
areas:
  - id: montrose
    city: Houston
    display_name: Montrose
    kind: NEIGHBORHOOD
    member_codes: ['77004']
";
        let err = parse_reference_data(yaml)
            .expect("parses")
            .into_catalog()
            .unwrap_err();
        assert!(err.0.contains("belongs to area 'third-ward'"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_reference_data(Path::new("/nonexistent/glowdrop.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReferenceFileIo { .. }));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_reference_data("postal_codes: [").unwrap_err();
        assert!(matches!(err, ConfigError::ReferenceFileParse(_)));
    }
}

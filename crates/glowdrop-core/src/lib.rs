pub mod app_config;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod geo;
pub mod import;
pub mod pricing;
pub mod reference;
pub mod vendors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{Catalog, CatalogStore};
pub use config::{load_app_config, load_app_config_from_env};
pub use discovery::{discover, DiscoveryOutcome, DiscoveryQuery, DiscoverySettings};
pub use geo::{haversine_miles, Area, AreaKind, Coordinates, GeoZoneIndex, PostalZoneEntry};
pub use import::{parse_area_records, parse_vendor_records, AreaRecord, ImportError};
pub use pricing::{
    display_price_range, quote, CartLine, FeeQuote, FeeSchedule, PriceRange, PricingError,
    QuoteTarget,
};
pub use reference::{load_catalog, load_reference_data, ReferenceData};
pub use vendors::{ChainDenyList, PricingTier, RankedVendor, Vendor};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read reference data file {path}: {source}")]
    ReferenceFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse reference data: {0}")]
    ReferenceFileParse(#[from] serde_yaml::Error),

    #[error("reference data validation failed: {0}")]
    Validation(String),
}

/// A structural problem found while validating reference data or catalog
/// contents. Carries a human-readable description of the first offending
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::Validation(err.0)
    }
}

/// Returns `true` when `code` is a five-digit US postal code.
#[must_use]
pub fn is_valid_postal_code(code: &str) -> bool {
    use std::sync::LazyLock;

    static POSTAL_CODE: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^\d{5}$").expect("static regex compiles"));

    POSTAL_CODE.is_match(code)
}

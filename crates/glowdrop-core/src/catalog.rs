//! The shared reference-data snapshot and the store that swaps it.
//!
//! Readers take an `Arc<Catalog>` and compute without holding any lock.
//! Bulk imports build a complete replacement catalog under the write lock and
//! swap it in only when the whole batch is valid.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::discovery::{discover, DiscoveryOutcome, DiscoveryQuery, DiscoverySettings};
use crate::geo::{haversine_miles, GeoZoneIndex};
use crate::import::{parse_area_records, parse_vendor_records, AreaRecord, ImportError};
use crate::pricing::QuoteTarget;
use crate::vendors::Vendor;
use crate::ValidationError;

#[derive(Debug, Clone)]
pub struct Catalog {
    index: GeoZoneIndex,
    vendors: Vec<Vendor>,
    generation: u64,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a vendor record is invalid or a vendor
    /// id is repeated.
    pub fn new(index: GeoZoneIndex, vendors: Vec<Vendor>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(vendors.len());
        for vendor in &vendors {
            vendor.validate().map_err(ValidationError)?;
            if !seen.insert(vendor.id.as_str()) {
                let message = format!("duplicate vendor id '{}'", vendor.id);
                return Err(ValidationError(message));
            }
        }
        Ok(Self {
            index,
            vendors,
            generation: 0,
        })
    }

    #[must_use]
    pub fn index(&self) -> &GeoZoneIndex {
        &self.index
    }

    #[must_use]
    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    #[must_use]
    pub fn vendor(&self, id: &str) -> Option<&Vendor> {
        self.vendors.iter().find(|v| v.id == id)
    }

    /// Incremented by every successful bulk import.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn discover(
        &self,
        query: &DiscoveryQuery,
        settings: &DiscoverySettings,
    ) -> DiscoveryOutcome {
        discover(&self.index, &self.vendors, query, settings)
    }

    /// Quote inputs for `vendor`. With a customer postal code the distance is
    /// measured from that code (or the hub, when unmapped); without one the
    /// distance is left unknown.
    #[must_use]
    pub fn quote_target(
        &self,
        vendor: &Vendor,
        customer_code: Option<&str>,
        settings: &DiscoverySettings,
    ) -> QuoteTarget {
        let distance_miles = customer_code.map(|code| {
            let origin = self.index.coordinates_of(code).unwrap_or(settings.hub);
            haversine_miles(origin, vendor.coordinates())
        });
        QuoteTarget {
            distance_miles,
            velocity_minutes: vendor.velocity_minutes,
        }
    }

    /// Copy of this catalog with `records` upserted into the area table.
    ///
    /// Each member code is reassigned to its new area and removed from the
    /// area that previously held it. A code dropped from an existing area must
    /// be claimed by another area in the same batch.
    fn with_areas(&self, records: &[AreaRecord]) -> Result<Self, ImportError> {
        let (mut entries, mut areas) = self.index.clone().into_parts();
        let mut claimed: HashMap<&str, (&str, usize)> = HashMap::new();
        let mut released: Vec<(String, &AreaRecord)> = Vec::new();

        for record in records {
            if let Some(existing) = areas.iter().find(|a| a.id == record.area.id) {
                let dropped = existing
                    .member_codes
                    .iter()
                    .filter(|c| !record.area.member_codes.contains(c))
                    .map(|c| (c.clone(), record));
                released.extend(dropped);
            }

            for code in &record.area.member_codes {
                if let Some((other_id, other_line)) =
                    claimed.insert(code.as_str(), (record.area.id.as_str(), record.line))
                {
                    return Err(ImportError::new(
                        record.line,
                        format!(
                            "postal code {code} is already assigned to area '{other_id}' on line {other_line}"
                        ),
                    ));
                }

                let Some(entry) = entries.iter_mut().find(|e| &e.code == code) else {
                    return Err(ImportError::new(
                        record.line,
                        format!("postal code {code} is not in the geo-zone index"),
                    ));
                };

                if entry.area_id != record.area.id {
                    if let Some(previous) = areas.iter_mut().find(|a| a.id == entry.area_id) {
                        previous.member_codes.retain(|c| c != code);
                    }
                    entry.area_id.clone_from(&record.area.id);
                }
            }

            match areas.iter_mut().find(|a| a.id == record.area.id) {
                Some(existing) => *existing = record.area.clone(),
                None => areas.push(record.area.clone()),
            }
        }

        for (code, record) in &released {
            let orphaned = entries
                .iter()
                .any(|e| &e.code == code && e.area_id == record.area.id);
            if orphaned {
                return Err(ImportError::new(
                    record.line,
                    format!(
                        "postal code {code} would be left without an area; list it under another area in the same import"
                    ),
                ));
            }
        }

        let first_line = records.first().map_or(1, |r| r.line);
        let index = GeoZoneIndex::new(entries, areas)
            .map_err(|e| ImportError::new(first_line, e.0))?;

        Ok(Self {
            index,
            vendors: self.vendors.clone(),
            generation: self.generation + 1,
        })
    }

    /// Copy of this catalog with `incoming` upserted by vendor id. Existing
    /// vendors keep their position; new vendors are appended.
    fn with_vendors(&self, incoming: Vec<Vendor>) -> Self {
        let mut vendors = self.vendors.clone();
        for vendor in incoming {
            match vendors.iter_mut().find(|v| v.id == vendor.id) {
                Some(existing) => *existing = vendor,
                None => vendors.push(vendor),
            }
        }
        Self {
            index: self.index.clone(),
            vendors,
            generation: self.generation + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    generation: u64,
    customer_code: String,
    radius_bits: u64,
    include_chains: bool,
}

impl CacheKey {
    fn new(generation: u64, query: &DiscoveryQuery) -> Self {
        Self {
            generation,
            customer_code: query.customer_code.clone(),
            radius_bits: query.radius_miles.to_bits(),
            include_chains: query.include_chains,
        }
    }
}

/// Thread-safe owner of the current [`Catalog`] and the discovery memo.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
    settings: DiscoverySettings,
    cache: Mutex<HashMap<CacheKey, Arc<DiscoveryOutcome>>>,
    cache_max_entries: usize,
}

impl CatalogStore {
    #[must_use]
    pub fn new(catalog: Catalog, settings: DiscoverySettings, cache_max_entries: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            settings,
            cache: Mutex::new(HashMap::new()),
            cache_max_entries,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Memoized discovery against the current snapshot.
    #[must_use]
    pub fn discover(&self, query: &DiscoveryQuery) -> Arc<DiscoveryOutcome> {
        let catalog = self.snapshot();
        let key = CacheKey::new(catalog.generation(), query);

        if let Some(hit) = self.lock_cache().get(&key) {
            tracing::trace!(postal_code = %query.customer_code, "discovery cache hit");
            return Arc::clone(hit);
        }

        let outcome = Arc::new(catalog.discover(query, &self.settings));

        if self.cache_max_entries > 0 {
            let mut cache = self.lock_cache();
            if cache.len() >= self.cache_max_entries {
                cache.clear();
            }
            cache.insert(key, Arc::clone(&outcome));
        }

        outcome
    }

    /// Parse and apply an area bulk import. Nothing is applied unless every
    /// line is valid.
    ///
    /// # Errors
    ///
    /// Returns the first [`ImportError`] with its line number.
    pub fn import_areas(&self, payload: &str) -> Result<usize, ImportError> {
        let records = parse_area_records(payload).inspect_err(|e| {
            tracing::warn!(line = e.line, reason = %e.reason, "area import rejected");
        })?;
        let count = records.len();
        self.replace_with(|catalog| catalog.with_areas(&records))
            .inspect_err(|e| {
                tracing::warn!(line = e.line, reason = %e.reason, "area import rejected");
            })?;
        tracing::info!(count, "area import applied");
        Ok(count)
    }

    /// Parse and apply a vendor bulk import (one JSON vendor per line).
    ///
    /// # Errors
    ///
    /// Returns the first [`ImportError`] with its line number.
    pub fn import_vendors(&self, payload: &str) -> Result<usize, ImportError> {
        let vendors = parse_vendor_records(payload).inspect_err(|e| {
            tracing::warn!(line = e.line, reason = %e.reason, "vendor import rejected");
        })?;
        let count = vendors.len();
        self.replace_with(|catalog| Ok(catalog.with_vendors(vendors)))?;
        tracing::info!(count, "vendor import applied");
        Ok(count)
    }

    #[must_use]
    pub fn cached_queries(&self) -> usize {
        self.lock_cache().len()
    }

    fn replace_with<F>(&self, build: F) -> Result<(), ImportError>
    where
        F: FnOnce(&Catalog) -> Result<Catalog, ImportError>,
    {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = build(&current)?;
        *current = Arc::new(next);
        self.lock_cache().clear();
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<DiscoveryOutcome>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

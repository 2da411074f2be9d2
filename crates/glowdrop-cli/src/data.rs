//! Reference data checks and bulk imports.
//!
//! Imports run against the catalog loaded for this process and report what
//! would change; nothing is written back to the reference file.

use std::path::Path;

use anyhow::Context;
use glowdrop_core::{AppConfig, Catalog, CatalogStore};

pub(crate) fn run_import_areas(store: &CatalogStore, file: &Path) -> anyhow::Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("reading area import {}", file.display()))?;
    let count = store
        .import_areas(&payload)
        .with_context(|| format!("area import {} rejected", file.display()))?;

    let catalog = store.snapshot();
    println!(
        "imported {count} area(s); catalog now has {} areas",
        catalog.index().all_areas().len()
    );
    let empty: Vec<&str> = catalog
        .index()
        .all_areas()
        .iter()
        .filter(|area| area.member_codes.is_empty())
        .map(|area| area.id.as_str())
        .collect();
    if !empty.is_empty() {
        println!("areas left without postal codes: {}", empty.join(", "));
    }

    Ok(())
}

pub(crate) fn run_import_vendors(store: &CatalogStore, file: &Path) -> anyhow::Result<()> {
    let payload = std::fs::read_to_string(file)
        .with_context(|| format!("reading vendor import {}", file.display()))?;
    let before = store.snapshot().vendors().len();
    let count = store
        .import_vendors(&payload)
        .with_context(|| format!("vendor import {} rejected", file.display()))?;
    let after = store.snapshot().vendors().len();

    println!(
        "imported {count} vendor(s): {} new, {} updated",
        after - before,
        count - (after - before)
    );

    Ok(())
}

/// Summarize the loaded reference data and flag records discovery will
/// treat specially.
pub(crate) fn run_check_data(catalog: &Catalog, config: &AppConfig) {
    let index = catalog.index();
    let settings = config.discovery_settings();

    println!(
        "{} postal codes, {} areas, {} vendors",
        index.postal_code_count(),
        index.all_areas().len(),
        catalog.vendors().len()
    );

    for vendor in catalog.vendors() {
        if index.coordinates_of(&vendor.postal_code).is_none() {
            println!(
                "  {} {}: postal code {} not indexed; falls back to area {}",
                vendor.id,
                vendor.name,
                vendor.postal_code,
                vendor.area_id.as_deref().unwrap_or("-")
            );
        }
        if settings.chains.matches(&vendor.name) {
            println!(
                "  {} {}: chain retailer, hidden by default",
                vendor.id, vendor.name
            );
        }
    }

    tracing::info!(generation = catalog.generation(), "reference data check complete");
}

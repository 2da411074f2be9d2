//! Geo-zone index queries.

use glowdrop_core::Catalog;

/// Print every area in configuration order.
///
/// # Errors
///
/// Returns an error only if JSON output fails to serialize.
pub(crate) fn run_areas(catalog: &Catalog, json: bool) -> anyhow::Result<()> {
    let areas = catalog.index().all_areas();

    if json {
        println!("{}", serde_json::to_string_pretty(areas)?);
        return Ok(());
    }

    println!(
        "{:<22}{:<26}{:<14}{:<10}CODES",
        "ID", "NAME", "KIND", "CITY"
    );
    for area in areas {
        println!(
            "{:<22}{:<26}{:<14}{:<10}{}",
            area.id,
            area.display_name,
            area.kind.to_string(),
            area.city,
            area.member_codes.join("|")
        );
    }

    Ok(())
}

/// Print the index entry and owning area for one postal code.
///
/// # Errors
///
/// Returns an error if the code is malformed or not in the index.
pub(crate) fn run_lookup(catalog: &Catalog, code: &str, json: bool) -> anyhow::Result<()> {
    if !glowdrop_core::is_valid_postal_code(code) {
        anyhow::bail!("'{code}' is not a five-digit postal code");
    }
    let entry = catalog
        .index()
        .entry(code)
        .ok_or_else(|| anyhow::anyhow!("postal code {code} is not in the service index"))?;
    let area = catalog.index().area_of(code);

    if json {
        let value = serde_json::json!({ "entry": entry, "area": area });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {}, {} ({})",
        entry.code, entry.city, entry.state, entry.neighborhood_label
    );
    println!("  at {:.4}, {:.4}", entry.latitude, entry.longitude);
    match area {
        Some(area) => println!("  area: {} [{}] {}", area.id, area.kind, area.display_name),
        None => println!("  area: none"),
    }

    Ok(())
}

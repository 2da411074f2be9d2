use glowdrop_core::{CatalogStore, DiscoveryQuery};

/// Rank vendors within `radius` miles of `postal_code`.
///
/// # Errors
///
/// Returns an error if the postal code is malformed or the radius is not one
/// of the configured radii.
pub(crate) fn run_discover(
    store: &CatalogStore,
    allowed_radii: &[u32],
    postal_code: &str,
    radius: u32,
    include_chains: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !glowdrop_core::is_valid_postal_code(postal_code) {
        anyhow::bail!("'{postal_code}' is not a five-digit postal code");
    }
    if !allowed_radii.contains(&radius) {
        anyhow::bail!("radius {radius} must be one of {allowed_radii:?}");
    }

    let query = DiscoveryQuery::new(postal_code, f64::from(radius)).with_chains(include_chains);
    let outcome = store.discover(&query);

    if json {
        println!("{}", serde_json::to_string_pretty(outcome.as_ref())?);
        return Ok(());
    }

    if !outcome.location_resolved {
        println!("postal code {postal_code} is not in the service index; searching from the hub");
    }
    if outcome.vendors.is_empty() {
        println!("no vendors within {radius} mi");
        return Ok(());
    }

    println!(
        "{:<4}{:<10}{:<32}{:<8}{:<8}{:<22}FLAGS",
        "#", "ID", "NAME", "MILES", "RATING", "AREA"
    );
    for (rank, ranked) in outcome.vendors.iter().enumerate() {
        let mut flags = Vec::new();
        if ranked.vendor.postal_code == postal_code {
            flags.push("same-code");
        }
        if ranked.is_unmapped_postal_code {
            flags.push("unmapped");
        }
        if ranked.is_chain_retailer {
            flags.push("chain");
        }
        println!(
            "{:<4}{:<10}{:<32}{:<8.2}{:<8.1}{:<22}{}",
            rank + 1,
            ranked.vendor.id,
            ranked.vendor.name,
            ranked.distance_miles,
            ranked.vendor.rating_average,
            ranked.resolved_area_id.as_deref().unwrap_or("-"),
            flags.join(",")
        );
    }

    Ok(())
}

use std::str::FromStr;

use glowdrop_core::{
    display_price_range, quote, AppConfig, CartLine, Catalog, FeeSchedule, PriceRange,
};
use rust_decimal::Decimal;

/// Parse a `--line` value of the form `UNIT_PRICE_HIGH:QUANTITY`.
///
/// Quantity sign is left to the quote itself so the error names the line.
pub(crate) fn parse_cart_line(raw: &str) -> Result<CartLine, String> {
    let (price, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PRICE:QUANTITY, got '{raw}'"))?;
    let unit_price_high = Decimal::from_str(price.trim())
        .map_err(|e| format!("invalid unit price '{price}': {e}"))?;
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
    Ok(CartLine {
        unit_price_high,
        quantity,
    })
}

/// Print the fee breakdown for a cart at `vendor_id`.
///
/// # Errors
///
/// Returns an error if the vendor is unknown or any cart line is invalid.
pub(crate) fn run_quote(
    catalog: &Catalog,
    config: &AppConfig,
    vendor_id: &str,
    postal_code: Option<&str>,
    lines: &[CartLine],
    json: bool,
) -> anyhow::Result<()> {
    let vendor = catalog
        .vendor(vendor_id)
        .ok_or_else(|| anyhow::anyhow!("vendor '{vendor_id}' not found"))?;
    let target = catalog.quote_target(vendor, postal_code, &config.discovery_settings());
    let fees = quote(lines, &target, &FeeSchedule::default())?.rounded();

    if json {
        println!("{}", serde_json::to_string_pretty(&fees)?);
        return Ok(());
    }

    println!("{} ({})", vendor.name, vendor.id);
    match target.distance_miles {
        Some(miles) => println!("distance: {miles:.2} mi"),
        None => println!("distance: unknown"),
    }
    println!(
        "{:<26}{:>10}",
        "shelf price estimate", fees.shelf_price_estimate
    );
    println!("{:<26}{:>10}", "runner fee", fees.runner_fee);
    println!("{:<26}{:>10}", "service fee", fees.service_fee);
    println!("{:<26}{:>10}", "urgency surcharge", fees.urgency_surcharge);
    println!(
        "{:<26}{:>10}",
        "authorization hold", fees.authorization_hold_total
    );

    Ok(())
}

/// Print a vendor-adjusted display price range.
///
/// # Errors
///
/// Returns an error if the vendor is unknown or the range is invalid.
pub(crate) fn run_display_price(
    catalog: &Catalog,
    vendor_id: &str,
    min: Decimal,
    max: Decimal,
    json: bool,
) -> anyhow::Result<()> {
    let vendor = catalog
        .vendor(vendor_id)
        .ok_or_else(|| anyhow::anyhow!("vendor '{vendor_id}' not found"))?;
    let range = display_price_range(
        PriceRange { min, max },
        vendor.pricing_tier,
        vendor.velocity_minutes,
        &FeeSchedule::default(),
    )?
    .rounded();

    if json {
        println!("{}", serde_json::to_string_pretty(&range)?);
    } else {
        println!(
            "{} [{}]: {} - {}",
            vendor.name, vendor.pricing_tier, range.min, range.max
        );
    }

    Ok(())
}

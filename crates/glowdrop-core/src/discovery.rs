//! Vendor discovery: filter, annotate and rank vendors for a customer postal
//! code.
//!
//! Discovery never fails. An unknown customer postal code is placed at the
//! network hub and reported through [`DiscoveryOutcome::location_resolved`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::{haversine_miles, Coordinates, GeoZoneIndex};
use crate::vendors::{ChainDenyList, RankedVendor, Vendor};

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryQuery {
    pub customer_code: String,
    pub radius_miles: f64,
    pub include_chains: bool,
}

impl DiscoveryQuery {
    pub fn new(customer_code: impl Into<String>, radius_miles: f64) -> Self {
        Self {
            customer_code: customer_code.into(),
            radius_miles,
            include_chains: false,
        }
    }

    #[must_use]
    pub fn with_chains(mut self, include_chains: bool) -> Self {
        self.include_chains = include_chains;
        self
    }
}

/// Process-wide discovery parameters, injected by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    /// Where customers with an unrecognized postal code are placed.
    pub hub: Coordinates,
    pub chains: ChainDenyList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryOutcome {
    pub vendors: Vec<RankedVendor>,
    /// `false` when the customer postal code was not in the index and the hub
    /// coordinate was used instead.
    pub location_resolved: bool,
    pub customer_area_id: Option<String>,
}

/// One tier of the ranking comparator. Tiers are applied in [`RANKING`]
/// order; a later tier only breaks ties left by the earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankKey {
    ExactPostalCode,
    SameArea,
    Distance,
}

const RANKING: [RankKey; 3] = [
    RankKey::ExactPostalCode,
    RankKey::SameArea,
    RankKey::Distance,
];

struct RankContext<'a> {
    customer_code: &'a str,
    customer_area_id: Option<&'a str>,
}

impl RankKey {
    fn compare(self, ctx: &RankContext<'_>, a: &RankedVendor, b: &RankedVendor) -> Ordering {
        match self {
            RankKey::ExactPostalCode => {
                let a_hit = a.vendor.postal_code == ctx.customer_code;
                let b_hit = b.vendor.postal_code == ctx.customer_code;
                b_hit.cmp(&a_hit)
            }
            RankKey::SameArea => {
                let a_hit = same_area(ctx.customer_area_id, a.resolved_area_id.as_deref());
                let b_hit = same_area(ctx.customer_area_id, b.resolved_area_id.as_deref());
                b_hit.cmp(&a_hit)
            }
            RankKey::Distance => a.distance_miles.total_cmp(&b.distance_miles),
        }
    }
}

fn same_area(customer: Option<&str>, vendor: Option<&str>) -> bool {
    matches!((customer, vendor), (Some(c), Some(v)) if c == v)
}

fn rank(ctx: &RankContext<'_>, a: &RankedVendor, b: &RankedVendor) -> Ordering {
    RANKING.iter().fold(Ordering::Equal, |acc, key| {
        acc.then_with(|| key.compare(ctx, a, b))
    })
}

fn annotate(
    index: &GeoZoneIndex,
    origin: Coordinates,
    vendor: &Vendor,
    is_chain: bool,
) -> RankedVendor {
    let distance_miles = haversine_miles(origin, vendor.coordinates());
    let (resolved_area_id, is_unmapped_postal_code) = match index.entry(&vendor.postal_code) {
        Some(entry) => (Some(entry.area_id.clone()), false),
        None => (vendor.area_id.clone(), true),
    };

    RankedVendor {
        vendor: vendor.clone(),
        distance_miles,
        resolved_area_id,
        is_unmapped_postal_code,
        is_chain_retailer: is_chain,
    }
}

/// Rank `vendors` for a customer.
///
/// A negative or NaN radius matches nothing and yields an empty list.
#[must_use]
pub fn discover(
    index: &GeoZoneIndex,
    vendors: &[Vendor],
    query: &DiscoveryQuery,
    settings: &DiscoverySettings,
) -> DiscoveryOutcome {
    let resolved = index.coordinates_of(&query.customer_code);
    let location_resolved = resolved.is_some();
    let origin = resolved.unwrap_or_else(|| {
        tracing::debug!(
            postal_code = %query.customer_code,
            "customer postal code not in index; using hub coordinates"
        );
        settings.hub
    });
    let customer_area_id = index.area_of(&query.customer_code).map(|a| a.id.clone());

    let mut ranked: Vec<RankedVendor> = vendors
        .iter()
        .filter_map(|vendor| {
            let is_chain = settings.chains.matches(&vendor.name);
            if is_chain && !query.include_chains {
                return None;
            }
            Some(annotate(index, origin, vendor, is_chain))
        })
        .filter(|ranked| ranked.distance_miles <= query.radius_miles)
        .collect();

    let ctx = RankContext {
        customer_code: &query.customer_code,
        customer_area_id: customer_area_id.as_deref(),
    };
    // Vec::sort_by is stable: equal keys keep catalog order.
    ranked.sort_by(|a, b| rank(&ctx, a, b));

    DiscoveryOutcome {
        vendors: ranked,
        location_resolved,
        customer_area_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::sample_index;
    use crate::vendors::tests::vendor;

    fn settings() -> DiscoverySettings {
        DiscoverySettings {
            hub: Coordinates::new(29.7604, -95.3698),
            chains: ChainDenyList::new(["ulta", "sally beauty"]),
        }
    }

    fn ids(outcome: &DiscoveryOutcome) -> Vec<&str> {
        outcome
            .vendors
            .iter()
            .map(|r| r.vendor.id.as_str())
            .collect()
    }

    #[test]
    fn exact_postal_code_match_ranks_first_regardless_of_distance() {
        let index = sample_index();
        // Same area (77021 is Third Ward) and very close to the customer.
        let near = vendor("near", "Near Shop", "77021", 29.7240, -95.3630);
        // Exact code, but further from the 77004 centroid.
        let exact = vendor("exact", "Exact Shop", "77004", 29.7050, -95.3500);
        let outcome = discover(
            &index,
            &[near, exact],
            &DiscoveryQuery::new("77004", 5.0),
            &settings(),
        );
        assert_eq!(ids(&outcome), vec!["exact", "near"]);
        assert!(outcome.vendors[0].distance_miles > outcome.vendors[1].distance_miles);
    }

    #[test]
    fn same_area_ranks_before_closer_vendor_in_other_area() {
        let index = sample_index();
        let other_area = vendor("downtown", "Downtown Shop", "77002", 29.7300, -95.3640);
        let same_area = vendor("ward", "Ward Shop", "77021", 29.6960, -95.3560);
        let outcome = discover(
            &index,
            &[other_area, same_area],
            &DiscoveryQuery::new("77004", 10.0),
            &settings(),
        );
        assert_eq!(ids(&outcome), vec!["ward", "downtown"]);
    }

    #[test]
    fn different_areas_without_exact_match_sort_by_distance() {
        let index = sample_index();
        let far = vendor("montrose", "Montrose Shop", "77006", 29.7410, -95.3910);
        let close = vendor("downtown", "Downtown Shop", "77002", 29.7300, -95.3640);
        let outcome = discover(
            &index,
            &[far, close],
            &DiscoveryQuery::new("77004", 10.0),
            &settings(),
        );
        assert_eq!(ids(&outcome), vec!["downtown", "montrose"]);
    }

    #[test]
    fn never_returns_vendor_beyond_radius() {
        let index = sample_index();
        let inside = vendor("in", "Inside", "77004", 29.7245, -95.3636);
        let outside = vendor("out", "Pearland Shop", "77584", 29.5590, -95.3200);
        let outcome = discover(
            &index,
            &[inside, outside],
            &DiscoveryQuery::new("77004", 3.0),
            &settings(),
        );
        assert_eq!(ids(&outcome), vec!["in"]);
        assert!(outcome.vendors.iter().all(|r| r.distance_miles <= 3.0));
    }

    #[test]
    fn vendor_exactly_on_radius_is_kept() {
        let index = sample_index();
        let edge = vendor("edge", "Edge Shop", "77006", 29.7410, -95.3910);
        let origin = index.coordinates_of("77004").expect("customer code");
        let boundary = haversine_miles(origin, edge.coordinates());
        let vendors = [edge];

        let at_boundary = discover(
            &index,
            &vendors,
            &DiscoveryQuery::new("77004", boundary),
            &settings(),
        );
        assert_eq!(ids(&at_boundary), vec!["edge"]);
        assert_eq!(at_boundary.vendors[0].distance_miles, boundary);

        let short_radius = discover(
            &index,
            &vendors,
            &DiscoveryQuery::new("77004", boundary - 1e-9),
            &settings(),
        );
        assert!(short_radius.vendors.is_empty());
    }

    #[test]
    fn chains_excluded_by_default_and_included_on_request() {
        let index = sample_index();
        let vendors = vec![
            vendor("indie", "Crowned Beauty Supply", "77004", 29.7245, -95.3636),
            vendor("chain", "ULTA Beauty", "77004", 29.7250, -95.3640),
        ];

        let without = discover(
            &index,
            &vendors,
            &DiscoveryQuery::new("77004", 5.0),
            &settings(),
        );
        assert_eq!(ids(&without), vec!["indie"]);

        let with = discover(
            &index,
            &vendors,
            &DiscoveryQuery::new("77004", 5.0).with_chains(true),
            &settings(),
        );
        assert!(ids(&without).iter().all(|id| ids(&with).contains(id)));
        let chain = with
            .vendors
            .iter()
            .find(|r| r.vendor.id == "chain")
            .expect("chain present when included");
        assert!(chain.is_chain_retailer);
    }

    #[test]
    fn unknown_customer_code_falls_back_to_hub() {
        let index = sample_index();
        let downtown = vendor("downtown", "Downtown Shop", "77002", 29.7604, -95.3698);
        let outcome = discover(
            &index,
            &[downtown],
            &DiscoveryQuery::new("00000", 1.0),
            &settings(),
        );
        assert!(!outcome.location_resolved);
        assert!(outcome.customer_area_id.is_none());
        assert_eq!(ids(&outcome), vec!["downtown"]);
        assert!(outcome.vendors[0].distance_miles < 0.01);
    }

    #[test]
    fn unmapped_vendor_code_keeps_stored_area() {
        let index = sample_index();
        let mut stale = vendor("stale", "Stale Shop", "77099", 29.7245, -95.3636);
        stale.area_id = Some("third-ward".to_string());
        let outcome = discover(
            &index,
            &[stale],
            &DiscoveryQuery::new("77004", 5.0),
            &settings(),
        );
        let ranked = &outcome.vendors[0];
        assert!(ranked.is_unmapped_postal_code);
        assert_eq!(ranked.resolved_area_id.as_deref(), Some("third-ward"));
    }

    #[test]
    fn resolved_area_overrides_stale_stored_area() {
        let index = sample_index();
        let mut moved = vendor("moved", "Moved Shop", "77006", 29.7410, -95.3910);
        moved.area_id = Some("third-ward".to_string());
        let outcome = discover(
            &index,
            &[moved],
            &DiscoveryQuery::new("77004", 5.0),
            &settings(),
        );
        let ranked = &outcome.vendors[0];
        assert!(!ranked.is_unmapped_postal_code);
        assert_eq!(ranked.resolved_area_id.as_deref(), Some("montrose"));
    }

    #[test]
    fn equal_keys_keep_catalog_order() {
        let index = sample_index();
        let a = vendor("a", "Twin A", "77004", 29.7245, -95.3636);
        let b = vendor("b", "Twin B", "77004", 29.7245, -95.3636);
        let query = DiscoveryQuery::new("77004", 5.0);
        let first = discover(&index, &[a.clone(), b.clone()], &query, &settings());
        let second = discover(&index, &[a, b], &query, &settings());
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(first, second);
    }

    #[test]
    fn nan_radius_matches_nothing() {
        let index = sample_index();
        let v = vendor("v", "Shop", "77004", 29.7245, -95.3636);
        let outcome = discover(
            &index,
            &[v],
            &DiscoveryQuery::new("77004", f64::NAN),
            &settings(),
        );
        assert!(outcome.vendors.is_empty());
    }
}

use serde::Serialize;

use crate::entities::machinery;
use crate::utils::geo::haversine_distance;

/// Radius applied when a requester location is given without one
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 20.0;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive fragment of the machinery name
    pub name: Option<String>,
    /// Requester (latitude, longitude)
    pub origin: Option<(f64, f64)>,
    pub radius_km: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SearchQuery {
    pub fn radius_km(&self) -> f64 {
        self.radius_km.unwrap_or(DEFAULT_SEARCH_RADIUS_KM)
    }

    fn price_matches(&self, price: f64) -> bool {
        self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub listing: machinery::Model,
    /// Distance to the requester, present only for location searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Filter a catalog snapshot down to the listings a requester can rent.
///
/// Unavailable listings are always dropped. With an origin, listings without
/// coordinates or further away than the radius are dropped too. Catalog
/// order is preserved.
pub fn search_listings<I>(catalog: I, query: &SearchQuery) -> Vec<SearchHit>
where
    I: IntoIterator<Item = machinery::Model>,
{
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase);
    let radius_km = query.radius_km();

    catalog
        .into_iter()
        .filter(|m| m.is_available)
        .filter(|m| query.price_matches(m.price_per_hour))
        .filter(|m| {
            name.as_deref()
                .is_none_or(|n| m.name.to_lowercase().contains(n))
        })
        .filter_map(|m| match query.origin {
            None => Some(SearchHit {
                listing: m,
                distance_km: None,
            }),
            Some((lat, lng)) => {
                let (m_lat, m_lng) = m.location()?;
                let distance = haversine_distance(lat, lng, m_lat, m_lng);
                (distance <= radius_km).then(|| SearchHit {
                    listing: m,
                    distance_km: Some(distance),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::listing;

    fn catalog() -> Vec<machinery::Model> {
        let mut hidden = listing(20.30, 85.83, 150.0);
        hidden.is_available = false;

        let mut unlocated = listing(0.0, 0.0, 120.0);
        unlocated.latitude = None;
        unlocated.longitude = None;

        let mut harvester = listing(20.46, 85.88, 900.0);
        harvester.name = "Combine Harvester".to_string();

        vec![
            listing(20.2961, 85.8245, 100.0),
            hidden,
            unlocated,
            harvester,
            listing(19.81, 85.83, 300.0),
            listing(28.61, 77.20, 50.0),
        ]
    }

    #[test]
    fn test_never_returns_unavailable_listings() {
        let queries = [
            SearchQuery::default(),
            SearchQuery {
                origin: Some((20.30, 85.83)),
                radius_km: Some(10_000.0),
                ..Default::default()
            },
            SearchQuery {
                min_price: Some(0.0),
                max_price: Some(1_000.0),
                ..Default::default()
            },
        ];

        for query in &queries {
            let hits = search_listings(catalog(), query);
            assert!(!hits.is_empty());
            assert!(hits.iter().all(|h| h.listing.is_available));
        }
    }

    #[test]
    fn test_no_filters_keeps_catalog_order() {
        let catalog = catalog();
        let expected: Vec<_> = catalog
            .iter()
            .filter(|m| m.is_available)
            .map(|m| m.id)
            .collect();

        let hits = search_listings(catalog, &SearchQuery::default());
        let ids: Vec<_> = hits.iter().map(|h| h.listing.id).collect();
        assert_eq!(ids, expected);
        assert!(hits.iter().all(|h| h.distance_km.is_none()));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let query = SearchQuery {
            min_price: Some(100.0),
            max_price: Some(300.0),
            ..Default::default()
        };

        let hits = search_listings(catalog(), &query);
        let prices: Vec<_> = hits.iter().map(|h| h.listing.price_per_hour).collect();
        assert_eq!(prices, vec![100.0, 120.0, 300.0]);
    }

    #[test]
    fn test_lower_bound_holds_for_every_hit() {
        for min in [0.0, 50.0, 101.0, 500.0, 10_000.0] {
            let query = SearchQuery {
                min_price: Some(min),
                ..Default::default()
            };
            let hits = search_listings(catalog(), &query);
            assert!(hits.iter().all(|h| h.listing.price_per_hour >= min));
        }
    }

    #[test]
    fn test_radius_holds_for_every_hit() {
        let origin = (20.2961, 85.8245);

        for radius in [0.5, 5.0, 25.0, 60.0, 2_000.0] {
            let query = SearchQuery {
                origin: Some(origin),
                radius_km: Some(radius),
                ..Default::default()
            };
            for hit in search_listings(catalog(), &query) {
                let (lat, lng) = hit.listing.location().unwrap();
                let distance = haversine_distance(origin.0, origin.1, lat, lng);
                assert!(distance <= radius);
                assert_eq!(hit.distance_km, Some(distance));
            }
        }
    }

    #[test]
    fn test_location_search_drops_unlocated_listings() {
        let query = SearchQuery {
            origin: Some((0.0, 0.0)),
            radius_km: Some(100_000.0),
            ..Default::default()
        };

        let hits = search_listings(catalog(), &query);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| h.listing.location().is_some()));
    }

    #[test]
    fn test_default_radius_is_twenty_km() {
        // Cuttack harvester is ~19 km away, Puri tractor ~54 km
        let query = SearchQuery {
            origin: Some((20.2961, 85.8245)),
            ..Default::default()
        };

        let hits = search_listings(catalog(), &query);
        let prices: Vec<_> = hits.iter().map(|h| h.listing.price_per_hour).collect();
        assert_eq!(prices, vec![100.0, 900.0]);
    }

    #[test]
    fn test_same_point_is_included_with_zero_distance() {
        let query = SearchQuery {
            origin: Some((0.0, 0.0)),
            radius_km: Some(1.0),
            ..Default::default()
        };

        let hits = search_listings(vec![listing(0.0, 0.0, 100.0)], &query);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].distance_km.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_distant_listing_is_excluded() {
        let query = SearchQuery {
            origin: Some((10.0, 10.0)),
            radius_km: Some(20.0),
            ..Default::default()
        };

        let hits = search_listings(vec![listing(0.0, 0.0, 100.0)], &query);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let query = SearchQuery {
            name: Some("  harvester ".to_string()),
            ..Default::default()
        };

        let hits = search_listings(catalog(), &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].listing.name, "Combine Harvester");
    }

    #[test]
    fn test_empty_catalog_is_not_an_error() {
        assert!(search_listings(Vec::new(), &SearchQuery::default()).is_empty());
    }
}

//! In-memory catalog of candidate sites with precomputed analytics.

use std::collections::BTreeMap;

use site_map_analytics_models::{Cluster, ProximityTier, Site};
use site_map_geometry::GeoPoint;

/// Read-only collection of catalogued sites.
///
/// Sites keep the order they were loaded in; [`Site::id`] is expected to
/// be the position in that order.
#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl SiteCatalog {
    /// Wraps loaded sites.
    ///
    /// Sites whose stored counts decrease as the radius grows are kept but
    /// logged, since such values cannot come from nested buffers.
    #[must_use]
    pub fn new(sites: Vec<Site>) -> Self {
        for site in sites.iter().filter(|site| !site.features.is_monotonic()) {
            log::warn!(
                "Site {} ({}) has non-monotonic proximity counts: {:?}",
                site.id,
                site.address,
                site.features.counts()
            );
        }

        log::debug!("Loaded site catalog with {} sites", sites.len());

        Self { sites }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Looks up a site by identifier.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Site> {
        self.sites
            .get(id)
            .filter(|site| site.id == id)
            .or_else(|| self.sites.iter().find(|site| site.id == id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Sites whose stored cluster is in `clusters`. An empty selection
    /// returns every site.
    pub fn filter_by_clusters<'a>(
        &'a self,
        clusters: &'a [Cluster],
    ) -> impl Iterator<Item = &'a Site> + 'a {
        self.sites
            .iter()
            .filter(move |site| clusters.is_empty() || clusters.contains(&site.cluster))
    }

    /// Sites with at least `min` calls within the given tier.
    pub fn filter_by_min_count(
        &self,
        tier: ProximityTier,
        min: u64,
    ) -> impl Iterator<Item = &Site> {
        self.sites
            .iter()
            .filter(move |site| site.features.count(tier) >= min)
    }

    /// Number of sites per cluster. Every cluster is present, possibly
    /// with a zero count.
    #[must_use]
    pub fn cluster_summary(&self) -> BTreeMap<Cluster, usize> {
        let mut summary: BTreeMap<Cluster, usize> =
            Cluster::all().iter().map(|cluster| (*cluster, 0)).collect();

        for site in &self.sites {
            *summary.entry(site.cluster).or_default() += 1;
        }

        summary
    }

    /// Finds the catalogued site at `point`.
    ///
    /// A site matches when both its latitude and longitude are within
    /// `tolerance_deg` of the point. When several sites match, the closest
    /// one (in degree space) wins, then the lowest identifier.
    #[must_use]
    pub fn find_match(&self, point: GeoPoint, tolerance_deg: f64) -> Option<&Site> {
        self.sites
            .iter()
            .filter(|site| {
                (site.point.lat - point.lat).abs() <= tolerance_deg
                    && (site.point.lon - point.lon).abs() <= tolerance_deg
            })
            .map(|site| {
                let d_lat = site.point.lat - point.lat;
                let d_lon = site.point.lon - point.lon;
                (d_lat.hypot(d_lon), site)
            })
            .min_by(|(a, site_a), (b, site_b)| a.total_cmp(b).then(site_a.id.cmp(&site_b.id)))
            .map(|(_, site)| site)
    }
}

#[cfg(test)]
mod tests {
    use site_map_analytics_models::FeatureVector;

    use super::*;

    fn site(id: usize, lat: f64, lon: f64, cluster: Cluster, counts: [u64; 4]) -> Site {
        Site {
            id,
            point: GeoPoint::new(lat, lon),
            site_type: "Library".to_string(),
            address: format!("{id} Main St"),
            city: "Tacoma".to_string(),
            cluster,
            features: FeatureVector::new(counts, 100.0, 10.0),
        }
    }

    fn catalog() -> SiteCatalog {
        SiteCatalog::new(vec![
            site(0, 47.2529, -122.4443, Cluster::One, [3, 10, 25, 40]),
            site(1, 47.2300, -122.4700, Cluster::Two, [0, 1, 4, 9]),
            site(2, 47.2100, -122.4100, Cluster::One, [8, 12, 30, 51]),
            site(3, 47.2600, -122.5000, Cluster::One, [1, 1, 2, 2]),
        ])
    }

    #[test]
    fn exact_click_matches_site() {
        let catalog = catalog();
        let found = catalog
            .find_match(GeoPoint::new(47.2529, -122.4443), 1e-4)
            .unwrap();
        assert_eq!(found.id, 0);
    }

    #[test]
    fn match_respects_tolerance_per_axis() {
        let catalog = catalog();
        assert_eq!(
            catalog
                .find_match(GeoPoint::new(47.25295, -122.44435), 1e-4)
                .map(|site| site.id),
            Some(0)
        );
        assert!(
            catalog
                .find_match(GeoPoint::new(47.2529, -122.4453), 1e-4)
                .is_none()
        );
    }

    #[test]
    fn closest_of_several_matches_wins() {
        let catalog = SiteCatalog::new(vec![
            site(0, 0.000_08, 0.0, Cluster::One, [0; 4]),
            site(1, 0.000_02, 0.0, Cluster::Two, [0; 4]),
            site(2, -0.000_02, 0.0, Cluster::Three, [0; 4]),
        ]);
        // Sites 1 and 2 are equally close; the lower identifier wins.
        let found = catalog
            .find_match(GeoPoint::new(0.0, 0.0), 1e-4)
            .unwrap();
        assert_eq!(found.id, 1);
    }

    #[test]
    fn empty_catalog_never_matches() {
        let catalog = SiteCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.find_match(GeoPoint::new(0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn filters_by_cluster_selection() {
        let catalog = catalog();

        let ones: Vec<usize> = catalog
            .filter_by_clusters(&[Cluster::One])
            .map(|site| site.id)
            .collect();
        assert_eq!(ones, vec![0, 2, 3]);

        let none_selected: Vec<usize> = catalog.filter_by_clusters(&[]).map(|site| site.id).collect();
        assert_eq!(none_selected, vec![0, 1, 2, 3]);

        assert_eq!(catalog.filter_by_clusters(&[Cluster::Three]).count(), 0);
    }

    #[test]
    fn filters_by_minimum_count() {
        let catalog = catalog();
        let busy: Vec<usize> = catalog
            .filter_by_min_count(ProximityTier::M3000, 40)
            .map(|site| site.id)
            .collect();
        assert_eq!(busy, vec![0, 2]);
        assert_eq!(catalog.filter_by_min_count(ProximityTier::M500, 0).count(), 4);
    }

    #[test]
    fn summary_includes_every_cluster() {
        let summary = catalog().cluster_summary();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[&Cluster::One], 3);
        assert_eq!(summary[&Cluster::Two], 1);
        assert_eq!(summary[&Cluster::Three], 0);
    }

    #[test]
    fn get_by_identifier() {
        let catalog = catalog();
        assert_eq!(catalog.get(2).map(|site| site.cluster), Some(Cluster::One));
        assert!(catalog.get(9).is_none());
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.iter().count(), 4);
    }

    #[test]
    fn get_falls_back_when_ids_are_not_positional() {
        let catalog = SiteCatalog::new(vec![site(7, 1.0, 1.0, Cluster::Two, [0; 4])]);
        assert_eq!(catalog.get(7).map(|site| site.id), Some(7));
        assert!(catalog.get(0).is_none());
    }
}

//! Plain-text rendering of sites, click results and dataset summaries.

use std::fmt::Write as _;

use site_map_analytics::{AnalysisResult, Cluster, FeatureVector, Site, SiteCatalog};
use site_map_analytics_models::FEATURE_NAMES;
use site_map_source::{Dataset, LayerKind};

pub fn print_site_table<'a>(sites: impl Iterator<Item = &'a Site>) {
    println!(
        "{:>5}  {:<7}  {:<20}  {:<32}  {:>6}  {:>6}",
        "ID", "CLUSTER", "TYPE", "ADDRESS", "N@500", "N@3000"
    );
    println!("{}", "-".repeat(86));

    let mut shown = 0usize;
    for site in sites {
        println!(
            "{:>5}  {:<7}  {:<20}  {:<32}  {:>6}  {:>6}",
            site.id,
            site.cluster,
            truncate(&site.site_type, 20),
            truncate(&site.address, 32),
            site.features.nearby_count_500,
            site.features.nearby_count_3000
        );
        shown += 1;
    }

    println!();
    println!("{shown} sites");
}

pub fn format_site(site: &Site) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Site {}", site.id);
    let _ = writeln!(out, "  Type:      {}", site.site_type);
    let _ = writeln!(out, "  Address:   {}", site.address);
    let _ = writeln!(out, "  City:      {}", site.city);
    let _ = writeln!(out, "  Latitude:  {:.6}", site.point.lat);
    let _ = writeln!(out, "  Longitude: {:.6}", site.point.lon);
    write_cluster(&mut out, site.cluster);
    write_features(&mut out, &site.features);
    out
}

/// Renders a click result. Matched sites also show their descriptive
/// attributes from the catalog.
pub fn format_result(result: &AnalysisResult, catalog: &SiteCatalog) -> String {
    let mut out = String::new();

    match result.site_id().and_then(|id| catalog.get(id)) {
        Some(site) => {
            let _ = writeln!(
                out,
                "Matched site {}: {} at {}",
                site.id, site.site_type, site.address
            );
        }
        None => {
            let _ = writeln!(out, "New location {}", result.point());
        }
    }

    write_cluster(&mut out, result.cluster());
    write_features(&mut out, result.features());
    out
}

pub fn format_summary(dataset: &Dataset) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Layers");
    for kind in LayerKind::all() {
        let _ = writeln!(out, "  {:<8} {}", kind.as_ref(), dataset.layer_size(*kind));
    }

    let _ = writeln!(out, "Sites per cluster");
    for (cluster, count) in dataset.catalog.cluster_summary() {
        let _ = writeln!(
            out,
            "  {:<16} {:>5}  ({})",
            cluster.layer_name(),
            count,
            cluster.color()
        );
    }

    out
}

fn write_cluster(out: &mut String, cluster: Cluster) {
    let _ = writeln!(out, "  Cluster:   {cluster} ({})", cluster.color());
}

fn write_features(out: &mut String, features: &FeatureVector) {
    for (name, value) in FEATURE_NAMES.iter().zip(features.to_array()) {
        if name.starts_with("Nearby_Count") {
            let _ = writeln!(out, "  {name:<25} {value:.0}");
        } else {
            let _ = writeln!(out, "  {name:<25} {value:.2} m");
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    }
}

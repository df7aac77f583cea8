//! Declarative map plan: one destination marker, one marker and curved
//! arc per exporter, and a three-entry size legend.
//!
//! Marker radius and arc weight scale with sqrt(value) relative to the
//! series maximum, so visual area tracks value. Placement runs stepwise
//! under a render-generation token; steps whose token has been
//! superseded are discarded rather than placed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::ReporterTotal;
use crate::data::CountryCentroid;
use crate::render::format_compact;
use crate::render::theme::{Palette, Theme};
use crate::state::Metric;

/// Token issued per render from a shared counter. In-flight placement
/// checks `is_current` before each step; a newer render invalidates all
/// older tokens, so stale work no-ops instead of being torn down.
#[derive(Debug, Clone)]
pub struct RenderToken {
    id: u64,
    counter: Arc<AtomicU64>,
}

impl RenderToken {
    pub fn issue(counter: &Arc<AtomicU64>) -> Self {
        let id = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            id,
            counter: Arc::clone(counter),
        }
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationMarker {
    pub iso3: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMarker {
    pub iso3: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// sqrt(value) / sqrt(max value), in [0, 1].
    pub scale: f64,
    pub radius: f64,
    pub value: f64,
    pub tooltip: String,
}

/// Quadratic arc from exporter to destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowArc {
    pub from: [f64; 2],
    pub control: [f64; 2],
    pub to: [f64; 2],
    pub weight: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub radius: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeLegend {
    pub entries: Vec<LegendEntry>,
    pub unit: String,
}

/// The whole map view, replaced wholesale each render. An empty plan
/// (no destination) clears the previous view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapPlan {
    pub theme: String,
    pub destination: Option<DestinationMarker>,
    pub markers: Vec<FlowMarker>,
    pub arcs: Vec<FlowArc>,
    pub legend: Option<SizeLegend>,
    /// Points the front end should fit into view.
    pub bounds: Vec<[f64; 2]>,
}

impl MapPlan {
    pub fn empty(theme: Theme) -> Self {
        Self {
            theme: theme.as_str().to_string(),
            destination: None,
            markers: Vec::new(),
            arcs: Vec::new(),
            legend: None,
            bounds: Vec::new(),
        }
    }
}

fn arc_between(src: &CountryCentroid, dest: &CountryCentroid, weight: f64, color: &str) -> FlowArc {
    let mid_lat = (src.lat + dest.lat) / 2.0 + (src.lon - dest.lon).abs() * 0.12;
    let mid_lon = (src.lon + dest.lon) / 2.0;
    FlowArc {
        from: [src.lat, src.lon],
        control: [mid_lat, mid_lon],
        to: [dest.lat, dest.lon],
        weight,
        color: color.to_string(),
    }
}

pub fn build_map(
    token: &RenderToken,
    partner: Option<&str>,
    top: &[ReporterTotal],
    metric: Metric,
    centroids: &HashMap<String, CountryCentroid>,
    theme: Theme,
    palette: &Palette,
) -> MapPlan {
    let mut plan = MapPlan::empty(theme);

    let dest = match partner.and_then(|p| centroids.get(p)) {
        Some(d) if !top.is_empty() => d,
        _ => return plan,
    };

    let max_val = top.iter().map(|g| g.total).fold(1.0_f64, f64::max);
    let max_scaled = max_val.sqrt();

    plan.bounds.push([dest.lat, dest.lon]);
    plan.destination = Some(DestinationMarker {
        iso3: dest.iso3.clone(),
        name: dest.name.clone(),
        lat: dest.lat,
        lon: dest.lon,
        radius: 12.0,
        color: palette.target.to_string(),
    });

    for g in top {
        // A newer render supersedes this one; drop the remaining steps.
        if !token.is_current() {
            break;
        }
        let Some(src) = centroids.get(&g.iso3) else {
            continue;
        };
        let scale = g.total.max(0.0).sqrt() / max_scaled;
        plan.bounds.push([src.lat, src.lon]);
        plan.arcs
            .push(arc_between(src, dest, 1.5 + 5.0 * scale, palette.primary));
        plan.markers.push(FlowMarker {
            iso3: g.iso3.clone(),
            name: src.name.clone(),
            lat: src.lat,
            lon: src.lon,
            scale,
            radius: 5.0 + 14.0 * scale,
            value: g.total,
            tooltip: format!("{}: {} {}", src.name, format_compact(g.total), metric.unit()),
        });
    }

    plan.legend = Some(SizeLegend {
        entries: vec![
            LegendEntry {
                radius: 19.0,
                label: format_compact(max_val),
            },
            LegendEntry {
                radius: 12.0,
                label: format_compact(max_val * 0.25),
            },
            LegendEntry {
                radius: 5.0,
                label: "Min".to_string(),
            },
        ],
        unit: metric.unit().to_string(),
    });

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::theme::palette;

    fn centroid(iso3: &str, name: &str, lat: f64, lon: f64) -> CountryCentroid {
        CountryCentroid {
            iso3: iso3.to_string(),
            name: name.to_string(),
            lat,
            lon,
        }
    }

    fn world() -> HashMap<String, CountryCentroid> {
        let mut m = HashMap::new();
        m.insert("USA".to_string(), centroid("USA", "United States", 39.8, -98.6));
        m.insert("MAR".to_string(), centroid("MAR", "Morocco", 31.8, -7.1));
        m.insert("ESP".to_string(), centroid("ESP", "Spain", 40.2, -3.6));
        m
    }

    fn totals(pairs: &[(&str, f64)]) -> Vec<ReporterTotal> {
        pairs
            .iter()
            .map(|(c, v)| ReporterTotal {
                iso3: c.to_string(),
                total: *v,
            })
            .collect()
    }

    fn token() -> (RenderToken, Arc<AtomicU64>) {
        let counter = Arc::new(AtomicU64::new(0));
        (RenderToken::issue(&counter), counter)
    }

    #[test]
    fn sizing_is_area_proportional() {
        let (tok, _c) = token();
        let plan = build_map(
            &tok,
            Some("USA"),
            &totals(&[("MAR", 100.0), ("ESP", 25.0)]),
            Metric::ValueUsd,
            &world(),
            Theme::Light,
            palette(Theme::Light),
        );
        assert_eq!(plan.markers.len(), 2);
        let ratio = plan.markers[0].scale / plan.markers[1].scale;
        assert!((ratio - 2.0).abs() < 1e-9, "sqrt(100)/sqrt(25) = 2, got {}", ratio);
        assert!((plan.markers[0].radius - 19.0).abs() < 1e-9);
        assert!((plan.markers[1].radius - 12.0).abs() < 1e-9);
        assert!((plan.arcs[0].weight - 6.5).abs() < 1e-9);
    }

    #[test]
    fn no_destination_or_empty_series_renders_nothing() {
        let (tok, _c) = token();
        let plan = build_map(
            &tok,
            None,
            &totals(&[("MAR", 100.0)]),
            Metric::ValueUsd,
            &world(),
            Theme::Dark,
            palette(Theme::Dark),
        );
        assert!(plan.destination.is_none() && plan.markers.is_empty());

        let plan = build_map(
            &tok,
            Some("USA"),
            &[],
            Metric::ValueUsd,
            &world(),
            Theme::Dark,
            palette(Theme::Dark),
        );
        assert!(plan.destination.is_none(), "empty series clears the map");
    }

    #[test]
    fn exporter_without_centroid_is_skipped() {
        let (tok, _c) = token();
        let plan = build_map(
            &tok,
            Some("USA"),
            &totals(&[("MAR", 100.0), ("XXX", 50.0)]),
            Metric::ValueUsd,
            &world(),
            Theme::Light,
            palette(Theme::Light),
        );
        assert_eq!(plan.markers.len(), 1);
        assert_eq!(plan.markers[0].iso3, "MAR");
    }

    #[test]
    fn stale_token_discards_remaining_placement() {
        let counter = Arc::new(AtomicU64::new(0));
        let old = RenderToken::issue(&counter);
        let _new = RenderToken::issue(&counter);
        assert!(!old.is_current());
        let plan = build_map(
            &old,
            Some("USA"),
            &totals(&[("MAR", 100.0), ("ESP", 25.0)]),
            Metric::ValueUsd,
            &world(),
            Theme::Light,
            palette(Theme::Light),
        );
        assert!(plan.markers.is_empty(), "stale render places nothing");
        assert!(plan.destination.is_some(), "clearing still happened first");
    }

    #[test]
    fn arc_control_point_bows_toward_higher_latitude() {
        let src = centroid("MAR", "Morocco", 31.8, -7.1);
        let dest = centroid("USA", "United States", 39.8, -98.6);
        let arc = arc_between(&src, &dest, 2.0, "#000");
        let mid_lat = (31.8 + 39.8) / 2.0 + (-7.1_f64 - -98.6).abs() * 0.12;
        assert!((arc.control[0] - mid_lat).abs() < 1e-9);
        assert!((arc.control[1] - (-7.1 + -98.6) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn legend_has_three_reference_sizes() {
        let (tok, _c) = token();
        let plan = build_map(
            &tok,
            Some("USA"),
            &totals(&[("MAR", 1_000_000.0)]),
            Metric::QuantityMt,
            &world(),
            Theme::Light,
            palette(Theme::Light),
        );
        let legend = plan.legend.unwrap();
        assert_eq!(legend.entries.len(), 3);
        assert_eq!(legend.entries[0].label, "1.0M");
        assert_eq!(legend.entries[1].label, "250.0K");
        assert_eq!(legend.entries[2].label, "Min");
        assert_eq!(legend.unit, "MT");
    }
}

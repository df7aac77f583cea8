//! Render specifications for the three visual surfaces.
//!
//! Nothing here draws. Each builder turns aggregated data into a
//! serializable description — Plotly-shaped traces and layout for the
//! two charts, a declarative plan for the map — that a thin front end
//! renders wholesale.

pub mod bar;
pub mod line;
pub mod map;
pub mod theme;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::ReporterRank;
use crate::data::CountryCentroid;
use crate::state::{FilterSelection, Metric};

/// Display name for a code, falling back to the raw code when no
/// centroid entry exists.
pub fn display_name(centroids: &HashMap<String, CountryCentroid>, iso3: &str) -> String {
    centroids
        .get(iso3)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| iso3.to_string())
}

/// Compact human number: 1.2B / 3.4M / 5.6K / 42.
pub fn format_compact(n: f64) -> String {
    if n >= 1e9 {
        format!("{:.1}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.1}M", n / 1e6)
    } else if n >= 1e3 {
        format!("{:.1}K", n / 1e3)
    } else {
        format!("{:.0}", n)
    }
}

/// Card titles for the three surfaces, derived from the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTitles {
    pub map: String,
    pub bar: String,
    pub line: String,
}

pub fn view_titles(
    sel: &FilterSelection,
    centroids: &HashMap<String, CountryCentroid>,
) -> ViewTitles {
    let metric_label = sel.metric.label();
    let top_label = format!("Top {}", sel.top_n);
    match &sel.partner {
        Some(partner) => {
            let importer = display_name(centroids, partner);
            ViewTitles {
                map: format!("{} Export Sources to {} — {}", top_label, importer, metric_label),
                bar: format!("{} Exporters to {}", top_label, importer),
                line: format!("Imports to {} Over Time — {}", importer, metric_label),
            }
        }
        None => ViewTitles {
            map: format!("Top Export Sources — {}", metric_label),
            bar: format!("{} Exporters", top_label),
            line: format!("Over Time — {}", metric_label),
        },
    }
}

/// The focus-country summary card (value, rank, unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusCard {
    pub iso3: String,
    pub value: String,
    pub rank: String,
    pub unit: String,
}

pub fn focus_card(rank: &ReporterRank, metric: Metric) -> FocusCard {
    let (value, rank_label) = if rank.value > 0.0 {
        let label = match rank.rank {
            Some(r) => format!("Rank #{} of {}", r, rank.qualifying),
            None => "Not ranked".to_string(),
        };
        (format_compact(rank.value), label)
    } else {
        ("N/A".to_string(), format!("No imports from {}", rank.iso3))
    };
    FocusCard {
        iso3: rank.iso3.clone(),
        value,
        rank: rank_label,
        unit: metric.unit().to_string(),
    }
}

/// Everything one pipeline run produces. Each field replaces the
/// previous render of its surface wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutput {
    pub titles: ViewTitles,
    pub bar: bar::BarChartSpec,
    pub line: line::LineChartSpec,
    pub map: map::MapPlan,
    pub focus: FocusCard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_formatting() {
        assert_eq!(format_compact(1_234_000_000.0), "1.2B");
        assert_eq!(format_compact(3_400_000.0), "3.4M");
        assert_eq!(format_compact(5_600.0), "5.6K");
        assert_eq!(format_compact(42.4), "42");
    }

    #[test]
    fn titles_with_and_without_partner() {
        let mut centroids = HashMap::new();
        centroids.insert(
            "USA".to_string(),
            CountryCentroid {
                iso3: "USA".to_string(),
                name: "United States".to_string(),
                lat: 39.8,
                lon: -98.6,
            },
        );
        let mut sel = FilterSelection::default();
        let t = view_titles(&sel, &centroids);
        assert_eq!(t.bar, "Top 10 Exporters");

        sel.partner = Some("USA".to_string());
        let t = view_titles(&sel, &centroids);
        assert_eq!(t.bar, "Top 10 Exporters to United States");
        assert!(t.line.starts_with("Imports to United States"));

        // Unknown partner falls back to the raw code.
        sel.partner = Some("XYZ".to_string());
        let t = view_titles(&sel, &centroids);
        assert_eq!(t.bar, "Top 10 Exporters to XYZ");
    }

    #[test]
    fn focus_card_states() {
        let ranked = ReporterRank {
            iso3: "USA".to_string(),
            value: 2_500_000.0,
            rank: Some(3),
            qualifying: 7,
        };
        let card = focus_card(&ranked, Metric::ValueUsd);
        assert_eq!(card.value, "2.5M");
        assert_eq!(card.rank, "Rank #3 of 7");
        assert_eq!(card.unit, "USD");

        let absent = ReporterRank {
            iso3: "USA".to_string(),
            value: 0.0,
            rank: None,
            qualifying: 4,
        };
        let card = focus_card(&absent, Metric::QuantityMt);
        assert_eq!(card.value, "N/A");
        assert_eq!(card.rank, "No imports from USA");
        assert_eq!(card.unit, "MT");
    }
}

//! Application state: configuration, the active filter selection, and
//! the line-chart toggle pair. All of it lives in one explicit state
//! object owned by the controller; nothing is ambient.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::{CountryCentroid, FlowRecord};
use crate::render::theme::Theme;

#[derive(Debug, Clone)]
pub struct Config {
    pub centroids_source: String,
    pub flows_source: String,
    pub out_dir: String,
    pub sqlite_path: String,
    pub focus_iso3: String,
    pub default_top_n: usize,
    pub interactive: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            centroids_source: std::env::var("CENTROIDS_URL")
                .unwrap_or_else(|_| "data/Country_Centroid.ISO.with_xy.csv".to_string()),
            flows_source: std::env::var("FLOWS_URL")
                .unwrap_or_else(|_| "data/flows_agg.csv".to_string()),
            out_dir: std::env::var("OUT_DIR").unwrap_or_else(|_| "out/render".to_string()),
            sqlite_path: std::env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "flowboard.db".to_string()),
            focus_iso3: std::env::var("FOCUS_ISO3").unwrap_or_else(|_| "USA".to_string()),
            default_top_n: std::env::var("DEFAULT_TOP_N")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            interactive: std::env::var("INTERACTIVE")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false),
        }
    }
}

/// The metric a view sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ValueUsd,
    QuantityMt,
}

impl Metric {
    pub fn of(&self, r: &FlowRecord) -> f64 {
        match self {
            Metric::ValueUsd => r.value_usd,
            Metric::QuantityMt => r.quantity_mt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::ValueUsd => "value_usd",
            Metric::QuantityMt => "quantity_mt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "value_usd" => Some(Metric::ValueUsd),
            "quantity_mt" => Some(Metric::QuantityMt),
            _ => None,
        }
    }

    /// Short unit for cards and legends.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::ValueUsd => "USD",
            Metric::QuantityMt => "MT",
        }
    }

    /// Bar-chart axis title.
    pub fn axis_title(&self) -> &'static str {
        match self {
            Metric::ValueUsd => "Trade Value (USD)",
            Metric::QuantityMt => "Quantity (MT)",
        }
    }

    /// Longer label used in view titles.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::ValueUsd => "Value (USD)",
            Metric::QuantityMt => "Quantity (MT)",
        }
    }
}

/// The five active filter values plus top-N, rebuilt on every UI event.
/// `None` means match-all for that field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub partner: Option<String>,
    pub year: Option<i32>,
    pub product: Option<String>,
    pub temperature: Option<String>,
    pub metric: Metric,
    pub top_n: usize,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            partner: None,
            year: None,
            product: None,
            temperature: None,
            metric: Metric::ValueUsd,
            top_n: 10,
        }
    }
}

/// The total/breakdown toggle pair for the line chart.
///
/// Invariant: at least one is true. Turning one on turns the other off;
/// turning the last one off snaps total back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineToggles {
    pub show_total: bool,
    pub show_breakdown: bool,
}

impl Default for LineToggles {
    fn default() -> Self {
        Self {
            show_total: true,
            show_breakdown: false,
        }
    }
}

impl LineToggles {
    pub fn set_total(&mut self, on: bool) {
        self.show_total = on;
        if on {
            self.show_breakdown = false;
        }
        self.enforce();
    }

    pub fn set_breakdown(&mut self, on: bool) {
        self.show_breakdown = on;
        if on {
            self.show_total = false;
        }
        self.enforce();
    }

    fn enforce(&mut self) {
        if !self.show_total && !self.show_breakdown {
            self.show_total = true;
        }
    }
}

/// Everything the pipeline reads: the immutable datasets plus the
/// mutable selection/toggle/theme state.
pub struct AppState {
    pub flows: Vec<FlowRecord>,
    pub centroids: HashMap<String, CountryCentroid>,
    pub filters: FilterSelection,
    pub toggles: LineToggles,
    pub theme: Theme,
    /// Bumped on every render; stale map placement steps check it.
    pub render_generation: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        flows: Vec<FlowRecord>,
        centroids: HashMap<String, CountryCentroid>,
        theme: Theme,
        default_top_n: usize,
    ) -> Self {
        Self {
            flows,
            centroids,
            filters: FilterSelection {
                top_n: default_top_n,
                ..FilterSelection::default()
            },
            toggles: LineToggles::default(),
            theme,
            render_generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_breakdown_disables_total() {
        let mut t = LineToggles::default();
        assert!(t.show_total && !t.show_breakdown);
        t.set_breakdown(true);
        assert!(!t.show_total && t.show_breakdown);
    }

    #[test]
    fn toggles_never_both_false() {
        let mut t = LineToggles::default();
        t.set_breakdown(true);
        t.set_breakdown(false);
        assert!(t.show_total && !t.show_breakdown, "total forced back on");

        let mut t = LineToggles::default();
        t.set_total(false);
        assert!(t.show_total, "disabling the only visible series is refused");
    }

    #[test]
    fn toggle_total_disables_breakdown() {
        let mut t = LineToggles::default();
        t.set_breakdown(true);
        t.set_total(true);
        assert!(t.show_total && !t.show_breakdown);
    }

    #[test]
    fn default_selection_matches_reset_contract() {
        let f = FilterSelection::default();
        assert!(f.partner.is_none() && f.year.is_none());
        assert!(f.product.is_none() && f.temperature.is_none());
        assert_eq!(f.top_n, 10);
        assert_eq!(f.metric, Metric::ValueUsd);
    }

    #[test]
    fn metric_labels() {
        assert_eq!(Metric::ValueUsd.unit(), "USD");
        assert_eq!(Metric::QuantityMt.axis_title(), "Quantity (MT)");
        assert_eq!(Metric::parse("value_usd"), Some(Metric::ValueUsd));
        assert_eq!(Metric::parse("nope"), None);
    }
}

//! Horizontal bar spec for the top-N exporters.
//!
//! Order is reversed so the largest value plots at the top, and each bar
//! samples the gradient proportionally to its position: the top bar gets
//! the end of the gradient.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::ReporterTotal;
use crate::data::CountryCentroid;
use crate::render::display_name;
use crate::render::theme::Palette;
use crate::state::Metric;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarTrace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub orientation: String,
    pub x: Vec<f64>,
    pub y: Vec<String>,
    pub marker: BarMarker,
    pub hovertemplate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarMarker {
    pub color: Vec<String>,
    pub line: MarkerLine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerLine {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarLayout {
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font_color: String,
    pub xaxis_title: String,
    pub gridcolor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarChartSpec {
    pub traces: Vec<BarTrace>,
    pub layout: BarLayout,
}

pub fn build_bar(
    top: &[ReporterTotal],
    metric: Metric,
    centroids: &HashMap<String, CountryCentroid>,
    palette: &Palette,
) -> BarChartSpec {
    let y: Vec<String> = top
        .iter()
        .rev()
        .map(|g| display_name(centroids, &g.iso3))
        .collect();
    let x: Vec<f64> = top.iter().rev().map(|g| g.total).collect();

    let stops = palette.bar_gradient.len() - 1;
    let denom = x.len().saturating_sub(1).max(1);
    let color: Vec<String> = (0..x.len())
        .map(|i| palette.bar_gradient[i * stops / denom].to_string())
        .collect();

    let traces = if x.is_empty() {
        Vec::new()
    } else {
        vec![BarTrace {
            trace_type: "bar".to_string(),
            orientation: "h".to_string(),
            x,
            y,
            marker: BarMarker {
                color,
                line: MarkerLine {
                    color: "rgba(255,255,255,0.2)".to_string(),
                    width: 1.0,
                },
            },
            hovertemplate: "<b>%{y}</b><br>%{x:,.0f}<extra></extra>".to_string(),
        }]
    };

    BarChartSpec {
        traces,
        layout: BarLayout {
            paper_bgcolor: palette.paper.to_string(),
            plot_bgcolor: palette.paper.to_string(),
            font_color: palette.text.to_string(),
            xaxis_title: metric.axis_title().to_string(),
            gridcolor: palette.grid.to_string(),
        },
    }
}

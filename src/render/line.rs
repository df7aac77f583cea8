//! Time-series spec: a TOTAL line and/or per-country breakdown lines
//! over every year observed in the (year-unscoped) filter set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::CountryCentroid;
use crate::render::display_name;
use crate::render::theme::Palette;
use crate::state::{LineToggles, Metric};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTrace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub mode: String,
    pub name: String,
    pub x: Vec<i32>,
    pub y: Vec<f64>,
    pub color: String,
    pub width: f64,
    pub marker_size: f64,
    pub hovertemplate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineLayout {
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font_color: String,
    pub gridcolor: String,
    pub yaxis_title: String,
    /// Always [0, 1.1 * max], with a floor so an all-zero set still
    /// yields a non-degenerate axis.
    pub yaxis_range: [f64; 2],
    pub rangeslider: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineChartSpec {
    pub traces: Vec<LineTrace>,
    pub layout: LineLayout,
}

pub struct LineInputs<'a> {
    pub years: &'a [i32],
    pub totals: &'a [f64],
    /// (reporter code, dense per-year sums), top-N order.
    pub breakdown: &'a [(String, Vec<f64>)],
}

pub fn build_line(
    inputs: &LineInputs,
    toggles: LineToggles,
    metric: Metric,
    centroids: &HashMap<String, CountryCentroid>,
    palette: &Palette,
) -> LineChartSpec {
    let mut traces = Vec::new();

    if toggles.show_total {
        traces.push(LineTrace {
            trace_type: "scatter".to_string(),
            mode: "lines+markers".to_string(),
            name: "TOTAL".to_string(),
            x: inputs.years.to_vec(),
            y: inputs.totals.to_vec(),
            color: palette.total.to_string(),
            width: 3.0,
            marker_size: 6.0,
            hovertemplate: "<b>TOTAL</b><br>%{x}: %{y:,.0f}<extra></extra>".to_string(),
        });
    }

    if toggles.show_breakdown {
        for (i, (iso3, series)) in inputs.breakdown.iter().enumerate() {
            let name = display_name(centroids, iso3);
            traces.push(LineTrace {
                trace_type: "scatter".to_string(),
                mode: "lines+markers".to_string(),
                hovertemplate: format!("<b>{}</b><br>%{{x}}: %{{y:,.0f}}<extra></extra>", name),
                name,
                x: inputs.years.to_vec(),
                y: series.clone(),
                color: palette.lines[i % palette.lines.len()].to_string(),
                width: 2.0,
                marker_size: 5.0,
            });
        }
    }

    let max_y = traces
        .iter()
        .flat_map(|t| t.y.iter().copied())
        .fold(1.0_f64, f64::max);

    LineChartSpec {
        traces,
        layout: LineLayout {
            paper_bgcolor: palette.paper.to_string(),
            plot_bgcolor: palette.paper.to_string(),
            font_color: palette.text.to_string(),
            gridcolor: palette.grid.to_string(),
            yaxis_title: metric.unit().to_string(),
            yaxis_range: [0.0, max_y * 1.1],
            rangeslider: true,
        },
    }
}

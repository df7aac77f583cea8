//! Grouping and summation over filtered flow rows: top-N reporters,
//! single-country rank, and dense per-year series.
//!
//! Metric values are finite by the load-boundary invariant, so float
//! comparisons here never see NaN.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::FlowRecord;
use crate::state::Metric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterTotal {
    pub iso3: String,
    pub total: f64,
}

/// Sum the metric per reporter, preserving first-encounter order so the
/// later stable sort breaks ties predictably.
fn group_totals(rows: &[&FlowRecord], metric: Metric) -> Vec<ReporterTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ReporterTotal> = Vec::new();
    for r in rows {
        if r.reporter_iso3.is_empty() {
            continue;
        }
        match index.get(r.reporter_iso3.as_str()) {
            Some(&i) => groups[i].total += metric.of(r),
            None => {
                index.insert(r.reporter_iso3.as_str(), groups.len());
                groups.push(ReporterTotal {
                    iso3: r.reporter_iso3.clone(),
                    total: metric.of(r),
                });
            }
        }
    }
    groups
}

fn sorted_positive(rows: &[&FlowRecord], metric: Metric) -> Vec<ReporterTotal> {
    let mut groups = group_totals(rows, metric);
    groups.retain(|g| g.total > 0.0);
    // stable: ties keep encounter order
    groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    groups
}

/// Top-N reporters by summed metric: groups with sum <= 0 are dropped,
/// result is descending and at most `n` long.
pub fn top_reporters(rows: &[&FlowRecord], metric: Metric, n: usize) -> Vec<ReporterTotal> {
    let mut groups = sorted_positive(rows, metric);
    groups.truncate(n);
    groups
}

/// Rank of one country within the full (non-truncated) sorted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterRank {
    pub iso3: String,
    pub value: f64,
    /// 1-based; `None` when the country's sum is <= 0 or absent.
    pub rank: Option<usize>,
    /// How many countries qualify (sum > 0) under the current filters.
    pub qualifying: usize,
}

pub fn reporter_rank(rows: &[&FlowRecord], metric: Metric, iso3: &str) -> ReporterRank {
    let sorted = sorted_positive(rows, metric);
    let rank = sorted.iter().position(|g| g.iso3 == iso3).map(|i| i + 1);
    let value = group_totals(rows, metric)
        .iter()
        .find(|g| g.iso3 == iso3)
        .map(|g| g.total)
        .unwrap_or(0.0);
    ReporterRank {
        iso3: iso3.to_string(),
        value,
        rank,
        qualifying: sorted.len(),
    }
}

/// Distinct years in the set, ascending. The dense-series functions
/// below produce one entry per year in this set, zero-filled.
pub fn observed_years(rows: &[&FlowRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = Vec::new();
    for r in rows {
        if !years.contains(&r.year) {
            years.push(r.year);
        }
    }
    years.sort_unstable();
    years
}

/// Sum of the metric per year over the whole set, aligned with `years`.
pub fn totals_by_year(rows: &[&FlowRecord], metric: Metric, years: &[i32]) -> Vec<f64> {
    let index: HashMap<i32, usize> = years.iter().enumerate().map(|(i, &y)| (y, i)).collect();
    let mut totals = vec![0.0; years.len()];
    for r in rows {
        if let Some(&i) = index.get(&r.year) {
            totals[i] += metric.of(r);
        }
    }
    totals
}

/// Per-year sums for each named reporter, one dense series per reporter
/// in the order given (normally the top-N order).
pub fn breakdown_by_year(
    rows: &[&FlowRecord],
    metric: Metric,
    years: &[i32],
    reporters: &[String],
) -> Vec<Vec<f64>> {
    let year_index: HashMap<i32, usize> = years.iter().enumerate().map(|(i, &y)| (y, i)).collect();
    let reporter_index: HashMap<&str, usize> = reporters
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut series = vec![vec![0.0; years.len()]; reporters.len()];
    for r in rows {
        let (Some(&ri), Some(&yi)) = (
            reporter_index.get(r.reporter_iso3.as_str()),
            year_index.get(&r.year),
        ) else {
            continue;
        };
        series[ri][yi] += metric.of(r);
    }
    series
}

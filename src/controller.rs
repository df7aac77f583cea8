//! The controller: one UI event in, one full pipeline run out.
//!
//! Every event re-runs filter → aggregate → render for all three
//! surfaces plus the focus card; there is no partial invalidation. The
//! controller owns the application state and the preference store.

use anyhow::Result;
use serde_json::json;

use crate::aggregate::{
    breakdown_by_year, observed_years, reporter_rank, top_reporters, totals_by_year,
};
use crate::data::{CountryCentroid, FlowRecord};
use crate::filter::{apply_filters, YearScope};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::render::bar::build_bar;
use crate::render::line::{build_line, LineInputs};
use crate::render::map::{build_map, RenderToken};
use crate::render::theme::{palette, Theme};
use crate::render::{focus_card, view_titles, RenderOutput};
use crate::state::{AppState, Config, FilterSelection, Metric};
use crate::storage::PrefStore;
use std::collections::HashMap;

/// A change notification from one of the UI controls.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    PartnerChanged(Option<String>),
    YearChanged(Option<i32>),
    ProductChanged(Option<String>),
    TemperatureChanged(Option<String>),
    TopNChanged(usize),
    MetricChanged(Metric),
    TotalToggled(bool),
    BreakdownToggled(bool),
    ThemeToggled,
    Reset,
}

impl UiEvent {
    /// Parse a line command from the interactive loop. `-` clears an
    /// optional filter.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        let optional = |s: &str| {
            if s.is_empty() || s == "-" {
                None
            } else {
                Some(s.to_string())
            }
        };
        match cmd {
            "partner" => Ok(UiEvent::PartnerChanged(optional(rest))),
            "year" => match optional(rest) {
                None => Ok(UiEvent::YearChanged(None)),
                Some(v) => v
                    .parse::<i32>()
                    .map(|y| UiEvent::YearChanged(Some(y)))
                    .map_err(|_| format!("bad year: {}", v)),
            },
            "product" => Ok(UiEvent::ProductChanged(optional(rest))),
            "temp" => Ok(UiEvent::TemperatureChanged(optional(rest))),
            "topn" => rest
                .parse::<usize>()
                .map(UiEvent::TopNChanged)
                .map_err(|_| format!("bad topn: {}", rest)),
            "metric" => Metric::parse(rest)
                .map(UiEvent::MetricChanged)
                .ok_or_else(|| format!("bad metric: {}", rest)),
            "total" => parse_switch(rest).map(UiEvent::TotalToggled),
            "breakdown" => parse_switch(rest).map(UiEvent::BreakdownToggled),
            "theme" => Ok(UiEvent::ThemeToggled),
            "reset" => Ok(UiEvent::Reset),
            _ => Err(format!("unknown command: {}", cmd)),
        }
    }
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(format!("expected on|off, got {}", s)),
    }
}

pub struct Controller {
    state: AppState,
    store: PrefStore,
    focus_iso3: String,
    default_top_n: usize,
}

impl Controller {
    /// Builds the controller from loaded datasets, restoring the
    /// persisted theme (default: light).
    pub fn new(
        flows: Vec<FlowRecord>,
        centroids: HashMap<String, CountryCentroid>,
        cfg: &Config,
        store: PrefStore,
    ) -> Result<Self> {
        let theme = store.load_theme()?.unwrap_or(Theme::Light);
        Ok(Self {
            state: AppState::new(flows, centroids, theme, cfg.default_top_n),
            store,
            focus_iso3: cfg.focus_iso3.clone(),
            default_top_n: cfg.default_top_n,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply one event and re-run the whole pipeline.
    pub fn handle(&mut self, event: UiEvent) -> Result<RenderOutput> {
        log(
            Level::Debug,
            Domain::Control,
            "ui_event",
            obj(&[("event", v_str(&format!("{:?}", event)))]),
        );
        match event {
            UiEvent::PartnerChanged(v) => self.state.filters.partner = v,
            UiEvent::YearChanged(v) => self.state.filters.year = v,
            UiEvent::ProductChanged(v) => self.state.filters.product = v,
            UiEvent::TemperatureChanged(v) => self.state.filters.temperature = v,
            UiEvent::TopNChanged(n) => self.state.filters.top_n = n.max(1),
            UiEvent::MetricChanged(m) => self.state.filters.metric = m,
            UiEvent::TotalToggled(on) => self.state.toggles.set_total(on),
            UiEvent::BreakdownToggled(on) => self.state.toggles.set_breakdown(on),
            UiEvent::ThemeToggled => {
                let next = self.state.theme.toggled();
                self.store.save_theme(next)?;
                self.state.theme = next;
                log(
                    Level::Info,
                    Domain::Control,
                    "theme_changed",
                    obj(&[("theme", v_str(next.as_str()))]),
                );
            }
            UiEvent::Reset => {
                self.state.filters = FilterSelection {
                    top_n: self.default_top_n,
                    ..FilterSelection::default()
                };
                self.state.toggles = Default::default();
            }
        }
        Ok(self.render())
    }

    /// Filter → aggregate → render, all three surfaces.
    pub fn render(&self) -> RenderOutput {
        let state = &self.state;
        let sel = &state.filters;
        let pal = palette(state.theme);

        let year_scoped = apply_filters(&state.flows, sel, YearScope::Selected);
        let all_years = apply_filters(&state.flows, sel, YearScope::AllYears);
        log(
            Level::Debug,
            Domain::Filter,
            "filtered",
            obj(&[
                ("year_scoped", v_num(year_scoped.len() as f64)),
                ("all_years", v_num(all_years.len() as f64)),
            ]),
        );

        let top = top_reporters(&year_scoped, sel.metric, sel.top_n);

        let years = observed_years(&all_years);
        let totals = totals_by_year(&all_years, sel.metric, &years);
        let line_top = top_reporters(&all_years, sel.metric, sel.top_n);
        let names: Vec<String> = line_top.iter().map(|g| g.iso3.clone()).collect();
        let breakdown: Vec<(String, Vec<f64>)> = names
            .iter()
            .cloned()
            .zip(breakdown_by_year(&all_years, sel.metric, &years, &names))
            .collect();

        let rank = reporter_rank(&year_scoped, sel.metric, &self.focus_iso3);

        // Each render supersedes any still-placing map from the last one.
        let token = RenderToken::issue(&state.render_generation);
        let map = build_map(
            &token,
            sel.partner.as_deref(),
            &top,
            sel.metric,
            &state.centroids,
            state.theme,
            pal,
        );

        let output = RenderOutput {
            titles: view_titles(sel, &state.centroids),
            bar: build_bar(&top, sel.metric, &state.centroids, pal),
            line: build_line(
                &LineInputs {
                    years: &years,
                    totals: &totals,
                    breakdown: &breakdown,
                },
                state.toggles,
                sel.metric,
                &state.centroids,
                pal,
            ),
            map,
            focus: focus_card(&rank, sel.metric),
        };

        log(
            Level::Info,
            Domain::Render,
            "rendered",
            obj(&[
                ("bars", v_num(top.len() as f64)),
                ("years", v_num(years.len() as f64)),
                ("map_markers", v_num(output.map.markers.len() as f64)),
                ("theme", v_str(state.theme.as_str())),
                ("selection", json!(sel)),
            ]),
        );
        output
    }
}

//! Light/dark themes and their fixed color palettes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Per-theme colors. The bar gradient runs low-value to high-value; the
/// line colors cycle per breakdown series.
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub target: &'static str,
    pub text: &'static str,
    pub grid: &'static str,
    pub paper: &'static str,
    pub bar_gradient: [&'static str; 10],
    pub lines: [&'static str; 10],
    pub total: &'static str,
}

static DARK: Palette = Palette {
    primary: "#2d7fc4",
    secondary: "#0F4878",
    target: "#ef4444",
    text: "#ffffff",
    grid: "rgba(255,255,255,0.1)",
    paper: "rgba(0,0,0,0)",
    bar_gradient: [
        "#05293F", "#0a3a5c", "#0F4878", "#1a6ba8", "#2d7fc4", "#4a9ed6", "#6bb3e0", "#8cc8ea",
        "#adddf4", "#ceeeff",
    ],
    lines: [
        "#2d7fc4", "#ef4444", "#22c55e", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
        "#f97316", "#6366f1",
    ],
    total: "#ffffff",
};

static LIGHT: Palette = Palette {
    primary: "#0F4878",
    secondary: "#05293F",
    target: "#dc2626",
    text: "#05293F",
    grid: "rgba(0,0,0,0.1)",
    paper: "rgba(0,0,0,0)",
    bar_gradient: [
        "#ceeeff", "#adddf4", "#8cc8ea", "#6bb3e0", "#4a9ed6", "#2d7fc4", "#1a6ba8", "#0F4878",
        "#0a3a5c", "#05293F",
    ],
    lines: [
        "#0F4878", "#dc2626", "#16a34a", "#d97706", "#7c3aed", "#db2777", "#0891b2", "#65a30d",
        "#ea580c", "#4f46e5",
    ],
    total: "#05293F",
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Light => &LIGHT,
        Theme::Dark => &DARK,
    }
}

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ColorScheme;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub font_family: String,
    pub fill: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyleRule {
    /// Relation this rule applies to. `None` or `"none"` marks the catch-all rule.
    pub label: Option<String>,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default)]
    pub dasharray: Option<String>,
    pub linecap: LineCap,
    /// Width of the wider "case" stroke drawn beneath the edge; 0 disables it.
    #[serde(default)]
    pub case_width: f64,
    pub case_color: String,
}

impl EdgeStyleRule {
    pub fn is_default(&self) -> bool {
        matches!(self.label.as_deref(), None | Some("none"))
    }

    /// Used when a sheet carries no catch-all rule.
    pub fn fallback() -> Self {
        edge_rule(None, "#c1c1c1", 2.0, Some("2,8"), LineCap::Square, 0.0, "#c1c1c1")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyleRule {
    pub label: String,
    pub color: String,
    /// Symbol asset reference, resolved through a [`crate::symbols::SymbolStore`].
    #[serde(default)]
    pub symbol: Option<String>,
}

impl NodeStyleRule {
    pub fn fallback() -> Self {
        Self {
            label: String::new(),
            color: "#cccccc".to_string(),
            symbol: None,
        }
    }
}

/// A named visual theme. Rule order is significant: the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub name: String,
    pub title: Typography,
    pub label: Typography,
    pub background: Background,
    pub edges: Vec<EdgeStyleRule>,
    pub nodes: Vec<NodeStyleRule>,
}

impl StyleSheet {
    pub fn colour() -> &'static StyleSheet {
        &COLOUR
    }

    pub fn print() -> &'static StyleSheet {
        &PRINT
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::StyleSheet {
            message: err.to_string(),
        })
    }
}

pub fn sheet_for(scheme: ColorScheme) -> &'static StyleSheet {
    match scheme {
        ColorScheme::Color => StyleSheet::colour(),
        ColorScheme::Print => StyleSheet::print(),
    }
}

pub fn load_style_sheet(path: &Path) -> Result<StyleSheet> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    StyleSheet::from_json(&contents)
}

const CHRONOTOPE_SYMBOLS: [(&str, &str); 12] = [
    ("anti-idyll", "anti_idyll.svg"),
    ("castle", "castle.svg"),
    ("distortion", "distortion.svg"),
    ("encounter", "encounter.svg"),
    ("idyll", "idyll.svg"),
    ("metanarrative", "metalepsis.svg"),
    ("parlour", "parlour.svg"),
    ("public square", "public_square.svg"),
    ("road", "road.svg"),
    ("threshold", "threshold.svg"),
    ("provincial town", "town.svg"),
    ("wilderness", "wilderness.svg"),
];

const COLOUR_NODE_FILLS: [&str; 12] = [
    "#ddfdea", "#8df8b7", "#e96cc8", "#c686e9", "#0affb8", "#7b8feb", "#ffee48", "#ffcc44",
    "#ff7f33", "#9f54ff", "#ffe79f", "#5fc613",
];

const PRINT_NODE_FILLS: [&str; 12] = [
    "#f0f0f0", "#e0e0e0", "#d0d0d0", "#c0c0c0", "#b0b0b0", "#a0a0a0", "#909090", "#808080",
    "#707070", "#606060", "#505050", "#404040",
];

// (label, stroke, width, dasharray, linecap, case width, case color)
type EdgeRow = (
    Option<&'static str>,
    &'static str,
    f64,
    Option<&'static str>,
    LineCap,
    f64,
    &'static str,
);

const COLOUR_EDGES: [EdgeRow; 12] = [
    (Some("direct"), "#525252", 1.0, None, LineCap::Round, 3.0, "#c686e9"),
    (Some("indirect"), "#525252", 1.0, Some("6,6"), LineCap::Round, 3.0, "#c686e9"),
    (Some("interrupt"), "#ff7f33", 2.0, Some("20,10"), LineCap::Round, 0.0, "#ff7f33"),
    (Some("jump"), "#ff7f33", 2.0, Some("40,10"), LineCap::Square, 0.0, "#ff7f33"),
    (Some("charshift"), "#00caff", 2.0, Some("40,10"), LineCap::Square, 0.0, "#00caff"),
    (Some("metaphor"), "#00caff", 2.0, Some("20,5"), LineCap::Square, 0.0, "#00caff"),
    (Some("projection"), "#ff7f33", 2.0, Some("10,40"), LineCap::Square, 0.0, "#ff7f33"),
    (Some("metatextual"), "#5fc613", 2.0, Some("2,8"), LineCap::Square, 0.0, "#5fc613"),
    (Some("paratextual"), "#5fc613", 2.0, Some("2,20"), LineCap::Square, 0.0, "#5fc613"),
    (Some("intratextual"), "#5fc613", 2.0, Some("2,5,2,30"), LineCap::Square, 0.0, "#5fc613"),
    (Some("none"), "#c1c1c1", 2.0, Some("2,8"), LineCap::Square, 0.0, "#c1c1c1"),
    (None, "#c1c1c1", 2.0, Some("2,8"), LineCap::Square, 0.0, "#c1c1c1"),
];

const PRINT_EDGES: [EdgeRow; 12] = [
    (Some("direct"), "#000000", 2.0, None, LineCap::Round, 0.0, "#000000"),
    (Some("indirect"), "#000000", 2.0, Some("6,6"), LineCap::Round, 0.0, "#000000"),
    (Some("interrupt"), "#000000", 2.0, Some("20,10"), LineCap::Round, 0.0, "#000000"),
    (Some("jump"), "#000000", 2.0, Some("40,10"), LineCap::Square, 0.0, "#000000"),
    (Some("charshift"), "#666666", 2.0, Some("40,10"), LineCap::Square, 0.0, "#666666"),
    (Some("metaphor"), "#666666", 2.0, Some("20,5"), LineCap::Square, 0.0, "#666666"),
    (Some("projection"), "#000000", 2.0, Some("10,40"), LineCap::Square, 0.0, "#000000"),
    (Some("metatextual"), "#999999", 2.0, Some("2,8"), LineCap::Square, 0.0, "#999999"),
    (Some("paratextual"), "#999999", 2.0, Some("2,20"), LineCap::Square, 0.0, "#999999"),
    (Some("intratextual"), "#999999", 2.0, Some("2,5,2,30"), LineCap::Square, 0.0, "#999999"),
    (Some("none"), "#cccccc", 2.0, Some("2,8"), LineCap::Square, 0.0, "#cccccc"),
    (None, "#cccccc", 2.0, Some("2,8"), LineCap::Square, 0.0, "#cccccc"),
];

static COLOUR: Lazy<StyleSheet> = Lazy::new(|| StyleSheet {
    name: "colour".to_string(),
    title: Typography {
        font_family: "'Baskerville', serif".to_string(),
        fill: "#dbdbdb".to_string(),
        size: 64.0,
    },
    label: Typography {
        font_family: "'Helvetica Neue', sans-serif".to_string(),
        fill: "#dbdbdb".to_string(),
        size: 0.6,
    },
    background: Background {
        color: "#525252".to_string(),
        opacity: 0.6,
    },
    edges: edge_rules(&COLOUR_EDGES),
    nodes: node_rules("colour", &COLOUR_NODE_FILLS),
});

static PRINT: Lazy<StyleSheet> = Lazy::new(|| StyleSheet {
    name: "print".to_string(),
    title: Typography {
        font_family: "'Baskerville', serif".to_string(),
        fill: "#000000".to_string(),
        size: 64.0,
    },
    label: Typography {
        font_family: "'Helvetica Neue', sans-serif".to_string(),
        fill: "#000000".to_string(),
        size: 0.6,
    },
    background: Background {
        color: "#ffffff".to_string(),
        opacity: 1.0,
    },
    edges: edge_rules(&PRINT_EDGES),
    nodes: node_rules("greyscale", &PRINT_NODE_FILLS),
});

fn edge_rules(rows: &[EdgeRow]) -> Vec<EdgeStyleRule> {
    rows.iter()
        .map(|&(label, stroke, width, dash, cap, case_width, case_color)| {
            edge_rule(label, stroke, width, dash, cap, case_width, case_color)
        })
        .collect()
}

fn edge_rule(
    label: Option<&str>,
    stroke: &str,
    stroke_width: f64,
    dasharray: Option<&str>,
    linecap: LineCap,
    case_width: f64,
    case_color: &str,
) -> EdgeStyleRule {
    EdgeStyleRule {
        label: label.map(str::to_string),
        stroke: stroke.to_string(),
        stroke_width,
        dasharray: dasharray.map(str::to_string),
        linecap,
        case_width,
        case_color: case_color.to_string(),
    }
}

fn node_rules(symbol_dir: &str, fills: &[&str; 12]) -> Vec<NodeStyleRule> {
    CHRONOTOPE_SYMBOLS
        .iter()
        .zip(fills.iter())
        .map(|((label, file), fill)| NodeStyleRule {
            label: label.to_string(),
            color: fill.to_string(),
            symbol: Some(format!("{symbol_dir}/{file}")),
        })
        .collect()
}

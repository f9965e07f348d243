use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    #[default]
    Below,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    #[serde(alias = "colour")]
    Color,
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Circle,
    Square,
    Diamond,
    Hexagon,
}

/// Options for one render. Field names follow the camelCase option names accepted by
/// the render request interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Edge length of the square canvas, in user units.
    pub size: f64,
    /// Multiplier applied on top of the fit-to-canvas scale.
    pub scale: f64,
    pub curved: bool,
    pub label_position: LabelPosition,
    pub node_scale: f64,
    pub color_scheme: ColorScheme,
    /// Multiplier for every edge stroke width.
    pub edge_width: f64,
    /// Accepted for compatibility; arrow heads are not drawn.
    pub show_arrows: bool,
    pub node_opacity: f64,
    pub edge_opacity: f64,
    /// Label font size in `em`; the style sheet's label size when unset.
    pub label_size: Option<f64>,
    pub background_color: Option<String>,
    pub node_stroke_width: f64,
    pub node_stroke_color: String,
    pub label_color: Option<String>,
    pub show_shadows: bool,
    pub show_grid: bool,
    pub grid_size: f64,
    pub export_scale: f64,
    pub curve_strength: f64,
    pub node_shape: NodeShape,
    /// Tint applied to symbol artwork; symbols keep their own colors when unset.
    pub symbol_color: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 1000.0,
            scale: 1.0,
            curved: true,
            label_position: LabelPosition::Below,
            node_scale: 1.0,
            color_scheme: ColorScheme::Color,
            edge_width: 1.0,
            show_arrows: false,
            node_opacity: 1.0,
            edge_opacity: 1.0,
            label_size: None,
            background_color: None,
            node_stroke_width: 2.0,
            node_stroke_color: "white".to_string(),
            label_color: None,
            show_shadows: false,
            show_grid: false,
            grid_size: 50.0,
            export_scale: 1.0,
            curve_strength: 0.6,
            node_shape: NodeShape::Circle,
            symbol_color: None,
        }
    }
}

impl RenderConfig {
    /// Parses a JSON or JSON5 options object. Missing fields keep their defaults.
    pub fn from_json(contents: &str) -> anyhow::Result<Self> {
        let config = match serde_json::from_str::<RenderConfig>(contents) {
            Ok(config) => config,
            Err(json_err) => json5::from_str::<RenderConfig>(contents).map_err(|json5_err| {
                anyhow::anyhow!("invalid render config: {json_err} (as JSON5: {json5_err})")
            })?,
        };
        Ok(config.sanitized())
    }

    /// Replaces values that would make the render meaningless with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = RenderConfig::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let non_negative = |value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };
        self.size = positive(self.size, defaults.size);
        self.export_scale = positive(self.export_scale, defaults.export_scale);
        self.grid_size = positive(self.grid_size, defaults.grid_size);
        self.node_scale = positive(self.node_scale, defaults.node_scale);
        self.edge_width = non_negative(self.edge_width, defaults.edge_width);
        self.node_stroke_width = non_negative(self.node_stroke_width, defaults.node_stroke_width);
        self.curve_strength = non_negative(self.curve_strength, defaults.curve_strength);
        self.label_size = self
            .label_size
            .filter(|size| size.is_finite() && *size > 0.0);
        if !self.scale.is_finite() {
            self.scale = defaults.scale;
        }
        self.node_opacity = clamp_unit(self.node_opacity);
        self.edge_opacity = clamp_unit(self.edge_opacity);
        self
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    RenderConfig::from_json(&contents)
}

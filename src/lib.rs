#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod layout_dump;
#[cfg(feature = "cli")]
pub mod logging;
pub mod parser;
pub mod render;
pub mod style;
pub mod symbols;
pub mod theme;
pub mod validate;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ColorScheme, LabelPosition, NodeShape, RenderConfig, load_config};
pub use error::{Error, Result};
pub use graph::GraphDocument;
pub use layout::{Layout, compute_layout};
pub use parser::parse_graphml;
pub use render::render_svg;
pub use symbols::{DirSymbolStore, MemorySymbolStore, NoSymbols, SymbolStore};
pub use theme::{StyleSheet, sheet_for};
pub use validate::{Finding, Severity, validate_xml};

/// Parses `input` and renders it with the built-in sheet selected by the config's
/// color scheme.
pub fn render_graphml(input: &str, config: &RenderConfig, symbols: &dyn SymbolStore) -> Result<String> {
    render_graphml_with_sheet(input, config, sheet_for(config.color_scheme), symbols)
}

pub fn render_graphml_with_sheet(
    input: &str,
    config: &RenderConfig,
    sheet: &StyleSheet,
    symbols: &dyn SymbolStore,
) -> Result<String> {
    let mut graph = parse_graphml(input)?;
    let layout = compute_layout(&mut graph, sheet, config);
    Ok(render_svg(&layout, sheet, config, symbols))
}

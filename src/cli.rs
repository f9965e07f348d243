use crate::config::{ColorScheme, LabelPosition, NodeShape, RenderConfig, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::logging::{LogFormat, init_logging};
use crate::parser::parse_graphml;
use crate::render::{render_svg, write_output_svg};
use crate::symbols::{DirSymbolStore, NoSymbols, SymbolStore};
use crate::theme::{StyleSheet, load_style_sheet, sheet_for};
use crate::validate::{has_errors, validate_xml};
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "chronotope", version, about = "Chronotopic cartography renderer (GraphML to SVG)")]
pub struct Cli {
    /// Log level or filter directive (trace|debug|info|warn|error)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a GraphML document to SVG or PNG
    Render(RenderArgs),
    /// Check a chronotope XML document and report errors and warnings
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input file (.graphml) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Render options as JSON/JSON5 (camelCase keys, e.g. {"curved": false})
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Directory holding symbol artwork (e.g. colour/road.svg)
    #[arg(long = "symbols")]
    pub symbols: Option<PathBuf>,

    /// Custom style sheet JSON replacing the built-in color scheme
    #[arg(long = "stylesheet")]
    pub stylesheet: Option<PathBuf>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Command line values taking precedence over the config file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    #[arg(short = 's', long)]
    pub size: Option<f64>,
    #[arg(long)]
    pub scale: Option<f64>,
    /// Draw straight edges instead of curves
    #[arg(long)]
    pub straight: bool,
    #[arg(long, value_enum)]
    pub label_position: Option<LabelPosition>,
    #[arg(long)]
    pub node_scale: Option<f64>,
    #[arg(long, value_enum)]
    pub color_scheme: Option<ColorScheme>,
    #[arg(long)]
    pub edge_width: Option<f64>,
    #[arg(long)]
    pub curve_strength: Option<f64>,
    #[arg(long, value_enum)]
    pub node_shape: Option<NodeShape>,
    #[arg(long)]
    pub show_grid: bool,
    #[arg(long)]
    pub show_shadows: bool,
    #[arg(long)]
    pub symbol_color: Option<String>,
    #[arg(long)]
    pub export_scale: Option<f64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: RenderConfig) -> RenderConfig {
        if let Some(v) = self.size {
            config.size = v;
        }
        if let Some(v) = self.scale {
            config.scale = v;
        }
        if self.straight {
            config.curved = false;
        }
        if let Some(v) = self.label_position {
            config.label_position = v;
        }
        if let Some(v) = self.node_scale {
            config.node_scale = v;
        }
        if let Some(v) = self.color_scheme {
            config.color_scheme = v;
        }
        if let Some(v) = self.edge_width {
            config.edge_width = v;
        }
        if let Some(v) = self.curve_strength {
            config.curve_strength = v;
        }
        if let Some(v) = self.node_shape {
            config.node_shape = v;
        }
        if self.show_grid {
            config.show_grid = true;
        }
        if self.show_shadows {
            config.show_shadows = true;
        }
        if let Some(v) = &self.symbol_color {
            config.symbol_color = Some(v.clone());
        }
        if let Some(v) = self.export_scale {
            config.export_scale = v;
        }
        config.sanitized()
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Print findings as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl ValueEnum for LabelPosition {
    fn value_variants<'a>() -> &'a [Self] {
        &[LabelPosition::Below, LabelPosition::Center]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(match self {
            LabelPosition::Below => "below",
            LabelPosition::Center => "center",
        }))
    }
}

impl ValueEnum for ColorScheme {
    fn value_variants<'a>() -> &'a [Self] {
        &[ColorScheme::Color, ColorScheme::Print]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            ColorScheme::Color => clap::builder::PossibleValue::new("color").alias("colour"),
            ColorScheme::Print => clap::builder::PossibleValue::new("print"),
        })
    }
}

impl ValueEnum for NodeShape {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            NodeShape::Circle,
            NodeShape::Square,
            NodeShape::Diamond,
            NodeShape::Hexagon,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(match self {
            NodeShape::Circle => "circle",
            NodeShape::Square => "square",
            NodeShape::Diamond => "diamond",
            NodeShape::Hexagon => "hexagon",
        }))
    }
}

/// Runs the command line front end and returns the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_level.as_deref(), cli.log_format) {
        eprintln!("warning: logging disabled: {err}");
    }

    match cli.command {
        Command::Render(args) => {
            render_command(&args)?;
            Ok(0)
        }
        Command::Validate(args) => validate_command(&args),
    }
}

fn render_command(args: &RenderArgs) -> Result<()> {
    let config = args.overrides.apply(load_config(args.config.as_deref())?);
    let custom_sheet = args
        .stylesheet
        .as_deref()
        .map(load_style_sheet)
        .transpose()?;
    let sheet: &StyleSheet = custom_sheet
        .as_ref()
        .unwrap_or_else(|| sheet_for(config.color_scheme));
    let symbols: Box<dyn SymbolStore> = match &args.symbols {
        Some(root) => Box::new(DirSymbolStore::new(root)),
        None => Box::new(NoSymbols),
    };

    let input = read_input(args.input.as_deref())?;
    let mut graph = parse_graphml(&input)?;
    let layout = compute_layout(&mut graph, sheet, &config);
    if layout.skipped_edges > 0 {
        tracing::info!(skipped = layout.skipped_edges, "edges with unknown endpoints were not drawn");
    }
    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &layout, &graph)?;
    }
    let svg = render_svg(&layout, sheet, &config, symbols.as_ref());

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref()),
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path) -> Result<()> {
    crate::render::write_output_png(svg, output)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn validate_command(args: &ValidateArgs) -> Result<i32> {
    let input = read_input(args.input.as_deref())?;
    let findings = validate_xml(&input);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else if findings.is_empty() {
        println!("No problems found");
    } else {
        for finding in &findings {
            println!("{finding}");
        }
    }
    Ok(if has_errors(&findings) { 1 } else { 0 })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_flags() {
        let cli = Cli::try_parse_from([
            "chronotope",
            "render",
            "-i",
            "map.graphml",
            "--straight",
            "--color-scheme",
            "colour",
            "--node-shape",
            "diamond",
            "--size",
            "500",
        ])
        .expect("valid arguments");
        let Command::Render(args) = cli.command else {
            panic!("expected render command");
        };
        let config = args.overrides.apply(RenderConfig::default());
        assert!(!config.curved);
        assert_eq!(config.color_scheme, ColorScheme::Color);
        assert_eq!(config.node_shape, NodeShape::Diamond);
        assert_eq!(config.size, 500.0);
    }

    #[test]
    fn overrides_keep_file_values_when_absent() {
        let file = RenderConfig {
            show_grid: true,
            curve_strength: 0.9,
            ..RenderConfig::default()
        };
        let config = ConfigOverrides::default().apply(file.clone());
        assert_eq!(config, file);
    }

    #[test]
    fn validate_subcommand_accepts_json_flag() {
        let cli = Cli::try_parse_from(["chronotope", "--log-level", "debug", "validate", "--json"])
            .expect("valid arguments");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { json: true, .. })));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
    }
}

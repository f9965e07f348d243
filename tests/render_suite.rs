use std::path::{Path, PathBuf};

use chronotope_renderer::layout_dump::LayoutDump;
use chronotope_renderer::parser::parse_graphml_file;
use chronotope_renderer::{
    ColorScheme, Error, MemorySymbolStore, NoSymbols, RenderConfig, StyleSheet, compute_layout,
    parse_graphml, render_graphml, render_graphml_with_sheet, render_svg, sheet_for,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture read failed")
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.starts_with("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.ends_with("</svg>"), "{fixture}: missing </svg tag");
    roxmltree::Document::parse(svg).unwrap_or_else(|err| panic!("{fixture}: invalid XML: {err}"));
}

fn layout_dump(input: &str, config: &RenderConfig) -> LayoutDump {
    let mut graph = parse_graphml(input).expect("parse failed");
    let layout = compute_layout(&mut graph, sheet_for(config.color_scheme), config);
    LayoutDump::from_layout(&layout, &graph)
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let fixtures = [
        "two_nodes.graphml",
        "novel_map.graphml",
        "legacy_keys.graphml",
        "single_node.graphml",
        "empty.graphml",
    ];
    for scheme in [ColorScheme::Color, ColorScheme::Print] {
        for curved in [true, false] {
            let config = RenderConfig {
                color_scheme: scheme,
                curved,
                show_grid: true,
                show_shadows: true,
                ..RenderConfig::default()
            };
            for name in fixtures {
                let svg = render_graphml(&fixture(name), &config, &NoSymbols)
                    .unwrap_or_else(|err| panic!("{name}: {err}"));
                assert_valid_svg(&svg, name);
            }
        }
    }
}

#[test]
fn two_node_direct_edge_is_a_sampled_curve() {
    let svg = render_graphml(&fixture("two_nodes.graphml"), &RenderConfig::default(), &NoSymbols)
        .expect("render failed");
    let doc = roxmltree::Document::parse(&svg).expect("valid svg");

    let edges: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("path") && n.attribute("class") == Some("edge"))
        .collect();
    assert_eq!(edges.len(), 1);
    let edge = edges[0];
    assert_eq!(edge.attribute("stroke"), Some("#525252"));
    assert_eq!(edge.attribute("data-relation"), Some("direct"));

    let d = edge.attribute("d").expect("path data");
    assert_eq!(d.matches('M').count(), 1);
    assert_eq!(d.matches('L').count(), 99);
    // Curve runs between the two fitted node centers.
    assert!(d.starts_with("M 100.00 100.00 "));
    assert!(d.ends_with(" L 900.00 900.00"));

    let labels: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(labels, ["Home", "Road"]);
}

#[test]
fn color_schemes_share_positions_but_not_paint() {
    let input = fixture("novel_map.graphml");
    let colour = RenderConfig::default();
    let print = RenderConfig {
        color_scheme: ColorScheme::Print,
        ..RenderConfig::default()
    };

    let colour_svg = render_graphml(&input, &colour, &NoSymbols).expect("render failed");
    let print_svg = render_graphml(&input, &print, &NoSymbols).expect("render failed");
    assert!(colour_svg.contains("fill=\"#525252\" fill-opacity=\"0.60\""));
    assert!(print_svg.contains("fill=\"#ffffff\" fill-opacity=\"1.00\""));
    assert_ne!(colour_svg, print_svg);

    let colour_dump = layout_dump(&input, &colour);
    let print_dump = layout_dump(&input, &print);
    let positions = |dump: &LayoutDump| -> Vec<(String, f64, f64)> {
        dump.nodes.iter().map(|n| (n.id.clone(), n.x, n.y)).collect()
    };
    assert_eq!(positions(&colour_dump), positions(&print_dump));

    let jump = |dump: &LayoutDump| {
        dump.edges
            .iter()
            .find(|e| e.relation == "jump")
            .map(|e| e.stroke.clone())
            .expect("jump edge")
    };
    assert_eq!(jump(&colour_dump), "#ff7f33");
    assert_eq!(jump(&print_dump), "#000000");
}

#[test]
fn edges_to_unknown_nodes_are_not_drawn() {
    let input = fixture("novel_map.graphml");
    let dump = layout_dump(&input, &RenderConfig::default());
    assert_eq!(dump.nodes.len(), 5);
    assert_eq!(dump.edges.len(), 6);
    assert_eq!(dump.skipped_edges, ["e5"]);
    assert!(dump.edges.iter().all(|e| e.target != "Lighthouse"));

    let untyped = dump
        .edges
        .iter()
        .find(|e| e.source == "Moor" && e.target == "Vicarage")
        .expect("edge without relation");
    assert_eq!(untyped.relation, "none");
    assert_eq!(untyped.stroke, "#c1c1c1");

    let svg = render_graphml(&input, &RenderConfig::default(), &NoSymbols).expect("render failed");
    assert_eq!(svg.matches("class=\"edge\"").count(), 6);
    assert!(svg.contains(">Letters &amp; Notes</text>"));
}

#[test]
fn legacy_keys_drive_size_and_relation() {
    let dump = layout_dump(&fixture("legacy_keys.graphml"), &RenderConfig::default());
    let castle = dump.nodes.iter().find(|n| n.id == "castle").expect("castle");
    let threshold = dump.nodes.iter().find(|n| n.id == "threshold").expect("threshold");
    assert_eq!(castle.radius, 25.0);
    assert_eq!(threshold.radius, 10.0);
    assert_eq!(castle.style, "castle");
    assert_eq!(threshold.style, "threshold");
    assert_eq!(dump.edges[0].relation, "charshift");
    assert_eq!(dump.edges[0].stroke, "#00caff");
}

#[test]
fn single_node_keeps_raw_coordinates() {
    let dump = layout_dump(&fixture("single_node.graphml"), &RenderConfig::default());
    assert_eq!(dump.nodes.len(), 1);
    assert_eq!((dump.nodes[0].x, dump.nodes[0].y), (300.0, 250.0));
    assert_eq!(dump.nodes[0].style, "wilderness");
}

#[test]
fn empty_graph_renders_background_only() {
    let svg = render_graphml(&fixture("empty.graphml"), &RenderConfig::default(), &NoSymbols)
        .expect("render failed");
    assert!(svg.contains("<g class=\"edges\"></g>"));
    assert!(svg.contains("<g class=\"nodes\"></g>"));
}

#[test]
fn rendering_is_deterministic() {
    let input = fixture("novel_map.graphml");
    let store = MemorySymbolStore::new().with(
        "colour/parlour.svg",
        "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect width=\"4\" height=\"4\" fill=\"#123456\"/></svg>",
    );
    let config = RenderConfig {
        show_grid: true,
        symbol_color: Some("#ffffff".to_string()),
        ..RenderConfig::default()
    };
    let first = render_graphml(&input, &config, &store).expect("render failed");
    let second = render_graphml(&input, &config, &store).expect("render failed");
    assert_eq!(first, second);
    assert_eq!(first.matches("<image").count(), 1);
}

#[test]
fn straight_mode_draws_center_to_center_lines() {
    let config = RenderConfig {
        curved: false,
        ..RenderConfig::default()
    };
    let sheet = sheet_for(config.color_scheme);
    let mut graph = parse_graphml(&fixture("two_nodes.graphml")).expect("parse failed");
    let layout = compute_layout(&mut graph, sheet, &config);
    let svg = render_svg(&layout, sheet, &config, &NoSymbols);
    assert!(svg.contains("x1=\"100.00\" y1=\"100.00\" x2=\"900.00\" y2=\"900.00\""));
    assert!(!svg.contains("<path"));
}

#[test]
fn malformed_xml_is_a_syntax_error() {
    let err = render_graphml("<graphml><graph>", &RenderConfig::default(), &NoSymbols)
        .expect_err("unterminated document");
    assert!(matches!(err, Error::Syntax(_)));
}

#[test]
fn fixtures_load_from_disk() {
    let graph = parse_graphml_file(&fixture_path("novel_map.graphml")).expect("fixture parses");
    assert_eq!(graph.nodes.len(), 5);
    assert_eq!(graph.edges.len(), 7);

    let err = parse_graphml_file(&fixture_path("missing.graphml")).expect_err("no such file");
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn custom_sheet_replaces_builtin_rules() {
    let mut sheet: StyleSheet = StyleSheet::colour().clone();
    sheet.background.color = "#fdf6e3".to_string();
    for rule in sheet.edges.iter_mut().filter(|rule| rule.label.as_deref() == Some("direct")) {
        rule.stroke = "#268bd2".to_string();
    }
    let json = serde_json::to_string(&sheet).expect("serialize sheet");
    let sheet = StyleSheet::from_json(&json).expect("sheet parses");

    let svg = render_graphml_with_sheet(
        &fixture("two_nodes.graphml"),
        &RenderConfig::default(),
        &sheet,
        &NoSymbols,
    )
    .expect("render failed");
    assert!(svg.contains("fill=\"#fdf6e3\""));
    assert!(svg.contains("stroke=\"#268bd2\""));
    assert!(!svg.contains("stroke=\"#525252\""));
}

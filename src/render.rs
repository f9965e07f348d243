use crate::config::{LabelPosition, NodeShape, RenderConfig};
use crate::geometry::Point;
use crate::layout::{EdgeLayout, Layout, NodeLayout};
use crate::symbols::{SymbolStore, prepare_symbol};
use crate::theme::StyleSheet;
use anyhow::Result;
use std::path::Path;

/// Gap between the bottom of a node and a label placed below it.
pub const LABEL_GAP: f64 = 15.0;
pub const SHADOW_FILTER_ID: &str = "node-shadow";
const GRID_OPACITY: f64 = 0.15;
/// Smallest grid interval, in viewBox units.
pub const MIN_GRID_STEP: f64 = 1.0;
/// Upper bound on grid lines drawn along each axis.
pub const MAX_GRID_LINES: f64 = 1000.0;

pub fn render_svg(
    layout: &Layout,
    sheet: &StyleSheet,
    config: &RenderConfig,
    symbols: &dyn SymbolStore,
) -> String {
    let span = tracing::debug_span!("render_svg", nodes = layout.nodes.len(), edges = layout.edges.len());
    let _enter = span.enter();

    let mut svg = String::new();
    let size = layout.size;
    let out_size = size * config.export_scale;
    let background = config
        .background_color
        .as_deref()
        .unwrap_or(&sheet.background.color);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_size:.2}\" height=\"{out_size:.2}\" viewBox=\"0 0 {size:.2} {size:.2}\">",
    ));

    svg.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{size:.2}\" height=\"{size:.2}\" fill=\"{}\" fill-opacity=\"{:.2}\"/>",
        escape_xml(background),
        sheet.background.opacity
    ));

    if config.show_grid {
        svg.push_str(&grid_svg(size, config, sheet));
    }

    if config.show_shadows {
        svg.push_str("<defs>");
        svg.push_str(&format!(
            "<filter id=\"{SHADOW_FILTER_ID}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\
<feGaussianBlur in=\"SourceAlpha\" stdDeviation=\"3\"/>\
<feOffset dx=\"2\" dy=\"2\" result=\"offsetblur\"/>\
<feFlood flood-color=\"#000000\" flood-opacity=\"0.3\"/>\
<feComposite in2=\"offsetblur\" operator=\"in\"/>\
<feMerge><feMergeNode/><feMergeNode in=\"SourceGraphic\"/></feMerge>\
</filter>"
        ));
        svg.push_str("</defs>");
    }

    svg.push_str("<g class=\"edges\">");
    for edge in &layout.edges {
        svg.push_str(&edge_svg(edge, config));
    }
    svg.push_str("</g>");

    if config.show_shadows {
        svg.push_str(&format!("<g class=\"nodes\" filter=\"url(#{SHADOW_FILTER_ID})\">"));
    } else {
        svg.push_str("<g class=\"nodes\">");
    }
    for node in &layout.nodes {
        svg.push_str(&node_svg(node, sheet, config, background, symbols));
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

fn grid_svg(size: f64, config: &RenderConfig, sheet: &StyleSheet) -> String {
    let requested = config.grid_size * config.export_scale;
    let step = requested.max(MIN_GRID_STEP).max(size / MAX_GRID_LINES);
    if step > requested {
        tracing::debug!(requested, step, "grid interval too small, widened");
    }
    let mut grid = format!(
        "<g class=\"grid\" stroke=\"{}\" stroke-width=\"0.5\" opacity=\"{GRID_OPACITY:.2}\">",
        escape_xml(config.label_color.as_deref().unwrap_or(&sheet.label.fill))
    );
    let mut offset = step;
    while offset < size {
        grid.push_str(&format!(
            "<line x1=\"{offset:.2}\" y1=\"0\" x2=\"{offset:.2}\" y2=\"{size:.2}\"/><line x1=\"0\" y1=\"{offset:.2}\" x2=\"{size:.2}\" y2=\"{offset:.2}\"/>"
        ));
        offset += step;
    }
    grid.push_str("</g>");
    grid
}

fn edge_svg(edge: &EdgeLayout, config: &RenderConfig) -> String {
    let style = &edge.style;
    let dash = style
        .dasharray
        .as_deref()
        .map(|d| format!(" stroke-dasharray=\"{}\"", escape_xml(d)))
        .unwrap_or_default();
    let linecap = style.linecap.as_str();
    let opacity = config.edge_opacity;
    let width = style.stroke_width * config.edge_width;

    if !edge.curved {
        let (Some(start), Some(end)) = (edge.points.first(), edge.points.last()) else {
            return String::new();
        };
        return format!(
            "<line class=\"edge\" data-relation=\"{}\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{width:.2}\" stroke-linecap=\"{linecap}\" stroke-opacity=\"{opacity:.2}\"{dash}/>",
            escape_xml(&edge.relation),
            start.x,
            start.y,
            end.x,
            end.y,
            escape_xml(&style.stroke),
        );
    }

    let d = points_to_path(&edge.points);
    let mut out = String::new();
    if style.case_width > 0.0 {
        out.push_str(&format!(
            "<path class=\"edge-case\" d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linecap=\"{linecap}\" stroke-opacity=\"{opacity:.2}\"{dash}/>",
            escape_xml(&style.case_color),
            style.case_width * config.edge_width,
        ));
    }
    out.push_str(&format!(
        "<path class=\"edge\" data-relation=\"{}\" d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width:.2}\" stroke-linecap=\"{linecap}\" stroke-opacity=\"{opacity:.2}\"{dash}/>",
        escape_xml(&edge.relation),
        escape_xml(&style.stroke),
    ));
    out
}

fn node_svg(
    node: &NodeLayout,
    sheet: &StyleSheet,
    config: &RenderConfig,
    background: &str,
    symbols: &dyn SymbolStore,
) -> String {
    let mut out = String::new();
    let c = node.center;
    let r = node.radius;

    out.push_str(&shape_svg(
        config.node_shape,
        c,
        r,
        &format!("fill=\"{}\" stroke=\"none\"", escape_xml(background)),
    ));

    let symbol = node.style.symbol.as_deref().map(|name| {
        prepare_symbol(symbols, name, config.symbol_color.as_deref())
    });
    match symbol {
        Some(Ok(href)) => {
            out.push_str(&format!(
                "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" opacity=\"{:.2}\" href=\"{href}\"/>",
                c.x - r,
                c.y - r,
                r * 2.0,
                r * 2.0,
                config.node_opacity,
            ));
        }
        failed => {
            if let Some(Err(err)) = failed {
                tracing::debug!(node = node.id.as_str(), error = %err, "symbol unavailable, drawing shape");
            }
            out.push_str(&shape_svg(
                config.node_shape,
                c,
                r,
                &format!(
                    "fill=\"{}\" fill-opacity=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\"",
                    escape_xml(&node.style.color),
                    config.node_opacity,
                    escape_xml(&config.node_stroke_color),
                    config.node_stroke_width,
                ),
            ));
        }
    }

    let (label_y, baseline) = match config.label_position {
        LabelPosition::Below => (c.y + r + LABEL_GAP, ""),
        LabelPosition::Center => (c.y, " dominant-baseline=\"middle\""),
    };
    let label_size = config.label_size.unwrap_or(sheet.label.size);
    let label_color = config.label_color.as_deref().unwrap_or(&sheet.label.fill);
    out.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{label_y:.2}\" text-anchor=\"middle\"{baseline} font-family=\"{}\" font-size=\"{label_size}em\" fill=\"{}\">{}</text>",
        c.x,
        escape_xml(&sheet.label.font_family),
        escape_xml(label_color),
        escape_xml(&node.label)
    ));
    out
}

fn shape_svg(shape: NodeShape, c: Point, r: f64, paint: &str) -> String {
    match shape {
        NodeShape::Circle => format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r:.2}\" {paint}/>",
            c.x, c.y
        ),
        NodeShape::Square => format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {paint}/>",
            c.x - r,
            c.y - r,
            r * 2.0,
            r * 2.0
        ),
        NodeShape::Diamond => {
            let points = [
                Point::new(c.x, c.y - r),
                Point::new(c.x + r, c.y),
                Point::new(c.x, c.y + r),
                Point::new(c.x - r, c.y),
            ];
            format!("<polygon points=\"{}\" {paint}/>", polygon_points(&points))
        }
        NodeShape::Hexagon => {
            let points: Vec<Point> = (0..6)
                .map(|i| {
                    let angle = std::f64::consts::FRAC_PI_3 * i as f64;
                    Point::new(c.x + r * angle.cos(), c.y + r * angle.sin())
                })
                .collect();
            format!("<polygon points=\"{}\" {paint}/>", polygon_points(&points))
        }
    }
}

fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn points_to_path(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterizes `svg` at its declared `width`/`height`, which already include the export
/// scale, and returns the encoded PNG.
#[cfg(feature = "png")]
pub fn render_png(svg: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    Ok(pixmap.encode_png()?)
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path) -> Result<()> {
    std::fs::write(output, render_png(svg)?)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorScheme;
    use crate::graph::{EdgeRecord, GraphDocument, NodeRecord};
    use crate::layout::compute_layout;
    use crate::symbols::{MemorySymbolStore, NoSymbols};
    use crate::theme::sheet_for;

    fn graph() -> GraphDocument {
        let mut graph = GraphDocument::new();
        for (id, x, y, kind) in [("Home", 0.0, 0.0, "idyll"), ("Road", 40.0, 30.0, "road")] {
            let mut node = NodeRecord::new(id);
            node.attributes.insert("x".to_string(), format!("{x}"));
            node.attributes.insert("y".to_string(), format!("{y}"));
            node.attributes.insert("type".to_string(), kind.to_string());
            graph.insert_node(node);
        }
        let mut edge = EdgeRecord::new("e0", "Home", "Road");
        edge.attributes.insert("relation".to_string(), "direct".to_string());
        graph.edges.push(edge);
        graph
    }

    fn render(config: &RenderConfig, symbols: &dyn SymbolStore) -> String {
        let sheet = sheet_for(config.color_scheme);
        let mut graph = graph();
        let layout = compute_layout(&mut graph, sheet, config);
        render_svg(&layout, sheet, config, symbols)
    }

    #[test]
    fn layers_are_emitted_in_order() {
        let config = RenderConfig {
            show_grid: true,
            show_shadows: true,
            ..RenderConfig::default()
        };
        let svg = render(&config, &NoSymbols);
        let background = svg.find("<rect x=\"0\" y=\"0\"").expect("background");
        let grid = svg.find("class=\"grid\"").expect("grid");
        let defs = svg.find("<defs>").expect("defs");
        let edges = svg.find("class=\"edges\"").expect("edges");
        let nodes = svg.find("class=\"nodes\"").expect("nodes");
        assert!(background < grid && grid < defs && defs < edges && edges < nodes);
        assert!(svg.contains("filter=\"url(#node-shadow)\""));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn curved_direct_edge_has_case_and_main_stroke() {
        let svg = render(&RenderConfig::default(), &NoSymbols);
        assert_eq!(svg.matches("class=\"edge\"").count(), 1);
        assert_eq!(svg.matches("class=\"edge-case\"").count(), 1);
        assert!(svg.contains("stroke=\"#c686e9\" stroke-width=\"3.00\""));
        assert!(svg.contains("stroke=\"#525252\" stroke-width=\"1.00\""));
    }

    #[test]
    fn straight_edges_use_a_single_line() {
        let config = RenderConfig {
            curved: false,
            edge_width: 2.0,
            ..RenderConfig::default()
        };
        let svg = render(&config, &NoSymbols);
        assert_eq!(svg.matches("<line class=\"edge\"").count(), 1);
        assert!(!svg.contains("edge-case"));
        assert!(svg.contains("stroke-width=\"2.00\""));
    }

    #[test]
    fn missing_symbols_fall_back_to_colored_shapes() {
        let svg = render(&RenderConfig::default(), &NoSymbols);
        assert!(svg.contains("fill=\"#0affb8\""));
        assert!(svg.contains("fill=\"#ff7f33\""));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn symbols_are_embedded_and_tinted() {
        let store = MemorySymbolStore::new().with(
            "colour/road.svg",
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><circle r=\"1\" fill=\"#111111\"/></svg>",
        );
        let config = RenderConfig {
            symbol_color: Some("#abcdef".to_string()),
            ..RenderConfig::default()
        };
        let svg = render(&config, &store);
        assert_eq!(svg.matches("<image").count(), 1);
        let expected = crate::symbols::data_uri(
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><circle r=\"1\" fill=\"#abcdef\"/></svg>".as_bytes(),
        );
        assert!(svg.contains(&expected));
    }

    #[test]
    fn label_placement() {
        let below = render(&RenderConfig::default(), &NoSymbols);
        assert!(!below.contains("dominant-baseline"));
        let center = render(
            &RenderConfig {
                label_position: LabelPosition::Center,
                ..RenderConfig::default()
            },
            &NoSymbols,
        );
        assert_eq!(center.matches("dominant-baseline=\"middle\"").count(), 2);
    }

    #[test]
    fn shapes_follow_config() {
        for (shape, tag) in [
            (NodeShape::Circle, "<circle"),
            (NodeShape::Square, "<rect x=\""),
            (NodeShape::Diamond, "<polygon"),
            (NodeShape::Hexagon, "<polygon"),
        ] {
            let config = RenderConfig {
                node_shape: shape,
                ..RenderConfig::default()
            };
            let svg = render(&config, &NoSymbols);
            // background mask and fallback fill for both nodes
            assert!(svg.matches(tag).count() >= 4, "{shape:?}");
        }
    }

    #[test]
    fn hexagon_vertices() {
        let svg = shape_svg(NodeShape::Hexagon, Point::new(0.0, 0.0), 10.0, "");
        assert!(svg.starts_with("<polygon points=\"10.00,0.00 5.00,8.66 -5.00,8.66 -10.00,0.00"));
    }

    #[test]
    fn export_scale_and_overrides() {
        let config = RenderConfig {
            export_scale: 2.0,
            background_color: Some("#101010".to_string()),
            color_scheme: ColorScheme::Print,
            ..RenderConfig::default()
        };
        let svg = render(&config, &NoSymbols);
        assert!(svg.contains("width=\"2000.00\" height=\"2000.00\" viewBox=\"0 0 1000.00 1000.00\""));
        assert!(svg.contains("fill=\"#101010\""));
        assert!(!svg.contains("#ffffff"));
    }

    fn grid_line_offsets(svg: &str) -> Vec<String> {
        let doc = roxmltree::Document::parse(svg).expect("valid svg");
        let grid = doc
            .descendants()
            .find(|n| n.attribute("class") == Some("grid"))
            .expect("grid group");
        grid.children()
            .filter(|n| n.has_tag_name("line") && n.attribute("y1") == Some("0"))
            .filter_map(|n| n.attribute("x1").map(str::to_string))
            .collect()
    }

    #[test]
    fn grid_interval_follows_grid_size_and_export_scale() {
        let config = RenderConfig {
            show_grid: true,
            grid_size: 50.0,
            export_scale: 2.0,
            ..RenderConfig::default()
        };
        let svg = render(&config, &NoSymbols);
        let expected: Vec<String> = (1..10).map(|i| format!("{:.2}", i as f64 * 100.0)).collect();
        assert_eq!(grid_line_offsets(&svg), expected);
    }

    #[test]
    fn tiny_grid_sizes_are_widened() {
        for grid_size in [1e-9, 0.001, 0.5] {
            let config = RenderConfig {
                show_grid: true,
                grid_size,
                ..RenderConfig::default()
            };
            let svg = render(&config, &NoSymbols);
            let offsets = grid_line_offsets(&svg);
            assert_eq!(offsets.len(), 999, "grid_size {grid_size}");
            assert_eq!(offsets[0], "1.00");
        }

        let huge = RenderConfig {
            show_grid: true,
            size: 1.0e6,
            grid_size: 1.0,
            ..RenderConfig::default()
        };
        let svg = render(&huge, &NoSymbols);
        assert_eq!(grid_line_offsets(&svg).len(), 999);
    }

    #[test]
    fn shadow_filter_primitives() {
        let config = RenderConfig {
            show_shadows: true,
            ..RenderConfig::default()
        };
        let svg = render(&config, &NoSymbols);
        let doc = roxmltree::Document::parse(&svg).expect("valid svg");
        let filter = doc
            .descendants()
            .find(|n| n.has_tag_name("filter") && n.attribute("id") == Some(SHADOW_FILTER_ID))
            .expect("shadow filter");
        let chain: Vec<&str> = filter
            .children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(
            chain,
            ["feGaussianBlur", "feOffset", "feFlood", "feComposite", "feMerge"]
        );
        let merge = filter.last_element_child().expect("feMerge");
        let inputs: Vec<Option<&str>> = merge.children().map(|n| n.attribute("in")).collect();
        assert_eq!(inputs, [None, Some("SourceGraphic")]);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_size_matches_scaled_svg() {
        let config = RenderConfig {
            size: 100.0,
            export_scale: 2.0,
            ..RenderConfig::default()
        };
        let png = render_png(&render(&config, &NoSymbols)).expect("rasterizes");
        assert_eq!(&png[12..16], b"IHDR");
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        assert_eq!((width, height), (200, 200));
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}

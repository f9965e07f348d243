//! Fits node positions into the canvas and builds per-edge geometry.

use serde::Serialize;

use crate::config::RenderConfig;
use crate::curve::curved_edge;
use crate::geometry::Point;
use crate::graph::GraphDocument;
use crate::style::resolve_styles;
use crate::theme::{EdgeStyleRule, NodeStyleRule, StyleSheet};

/// Share of the canvas the graph's bounding box is scaled to.
pub const FIT_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Scale and translation mapping document coordinates onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub source_center: Point,
    pub target_center: Point,
}

impl FitTransform {
    /// `None` when the bounding box has no area; such graphs keep their raw coordinates.
    pub fn new(bounds: &Bounds, canvas_size: f64, global_scale: f64) -> Option<Self> {
        if bounds.is_degenerate() {
            return None;
        }
        let fit = canvas_size * FIT_FRACTION;
        let scale = (fit / bounds.width()).min(fit / bounds.height()) * global_scale;
        Some(Self {
            scale,
            source_center: bounds.center(),
            target_center: Point::new(canvas_size / 2.0, canvas_size / 2.0),
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.source_center.x) * self.scale + self.target_center.x,
            (p.y - self.source_center.y) * self.scale + self.target_center.y,
        )
    }
}

/// Writes canvas positions into every node of `graph`.
pub fn normalize_positions(graph: &mut GraphDocument, canvas_size: f64, global_scale: f64) {
    let keys = &graph.keys;
    let raw: Vec<Point> = graph
        .nodes
        .values()
        .map(|node| node.raw_position(keys))
        .collect();
    let transform = Bounds::of(raw.iter().copied())
        .and_then(|bounds| FitTransform::new(&bounds, canvas_size, global_scale));
    if transform.is_none() && !raw.is_empty() {
        tracing::debug!("degenerate bounding box, keeping raw coordinates");
    }
    for (node, p) in graph.nodes.values_mut().zip(raw) {
        node.position = Some(match &transform {
            Some(t) => t.apply(p),
            None => p,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub center: Point,
    pub radius: f64,
    pub style: NodeStyleRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub curved: bool,
    pub points: Vec<Point>,
    pub style: EdgeStyleRule,
}

/// Everything the renderer draws, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub size: f64,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    /// Edges left out because an endpoint is not a known node.
    pub skipped_edges: usize,
}

pub fn compute_layout(graph: &mut GraphDocument, sheet: &StyleSheet, config: &RenderConfig) -> Layout {
    let span = tracing::debug_span!("compute_layout", nodes = graph.nodes.len(), edges = graph.edges.len());
    let _enter = span.enter();

    resolve_styles(graph, sheet);
    normalize_positions(graph, config.size, config.scale);

    let keys = &graph.keys;
    let nodes: Vec<NodeLayout> = graph
        .nodes
        .values()
        .map(|node| NodeLayout {
            id: node.id.clone(),
            label: node.id.clone(),
            center: node.position.unwrap_or_default(),
            radius: node.size(keys) * config.node_scale,
            style: node.style.clone().unwrap_or_else(NodeStyleRule::fallback),
        })
        .collect();

    let mut edges = Vec::with_capacity(graph.edges.len());
    let mut skipped_edges = 0;
    for edge in &graph.edges {
        let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target)) else {
            tracing::debug!(
                edge = edge.id.as_str(),
                source = edge.source.as_str(),
                target = edge.target.as_str(),
                "edge references an unknown node, skipped"
            );
            skipped_edges += 1;
            continue;
        };
        let start = source.position.unwrap_or_default();
        let end = target.position.unwrap_or_default();
        let points = if config.curved {
            curved_edge(start, end, config.curve_strength)
        } else {
            vec![start, end]
        };
        edges.push(EdgeLayout {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            relation: edge.relation(keys).to_string(),
            curved: config.curved,
            points,
            style: edge.style.clone().unwrap_or_else(EdgeStyleRule::fallback),
        });
    }

    if config.show_arrows {
        tracing::debug!("arrow heads requested but not drawn");
    }

    Layout {
        size: config.size,
        nodes,
        edges,
        skipped_edges,
    }
}

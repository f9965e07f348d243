use crate::graph::GraphDocument;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub size: f64,
    pub keys: Vec<KeyDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub skipped_edges: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KeyDump {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub style: String,
    pub fill: String,
    pub symbol: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub stroke: String,
    pub curved: bool,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, graph: &GraphDocument) -> Self {
        let mut keys: Vec<KeyDump> = graph
            .nodes
            .values()
            .flat_map(|node| node.attributes.keys())
            .chain(graph.edges.iter().flat_map(|edge| edge.attributes.keys()))
            .filter_map(|id| graph.keys.get(id))
            .map(|key| KeyDump {
                id: key.id.clone(),
                name: key.name.clone(),
            })
            .collect();
        keys.sort_by(|a, b| a.id.cmp(&b.id));
        keys.dedup_by(|a, b| a.id == b.id);

        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.center.x,
                y: node.center.y,
                radius: node.radius,
                style: node.style.label.clone(),
                fill: node.style.color.clone(),
                symbol: node.style.symbol.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                relation: edge.relation.clone(),
                stroke: edge.style.stroke.clone(),
                curved: edge.curved,
                points: edge.points.iter().map(|p| [p.x, p.y]).collect(),
            })
            .collect();

        let skipped_edges = graph
            .edges
            .iter()
            .filter(|edge| !graph.is_resolvable(edge))
            .map(|edge| edge.id.clone())
            .collect();

        LayoutDump {
            size: layout.size,
            keys,
            nodes,
            edges,
            skipped_edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, graph: &GraphDocument) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

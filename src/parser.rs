use roxmltree::{Document, Node};
use std::path::Path;

use crate::error::{Error, Result};
use crate::graph::{EdgeRecord, GraphDocument, KeyDef, KeyDomain, NodeRecord};

pub const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Parses a GraphML document into a [`GraphDocument`].
///
/// Only malformed XML is an error. Elements missing their identifying attributes are
/// skipped, and edges pointing at unknown nodes are kept for the renderer to ignore.
pub fn parse_graphml(input: &str) -> Result<GraphDocument> {
    let span = tracing::debug_span!("parse_graphml", input_len = input.len());
    let _enter = span.enter();

    let doc = Document::parse(input)?;
    let mut graph = GraphDocument::new();

    for key in doc.descendants().filter(|n| is_graphml(n, "key")) {
        let Some(id) = key.attribute("id") else {
            tracing::warn!(line = line_of(&doc, &key), "key without id ignored");
            continue;
        };
        graph.keys.insert(KeyDef {
            id: id.to_string(),
            name: key.attribute("attr.name").unwrap_or(id).to_string(),
            value_type: key.attribute("attr.type").unwrap_or("string").to_string(),
            domain: KeyDomain::from_token(key.attribute("for").unwrap_or("node")),
        });
    }

    for element in doc.descendants().filter(|n| is_graphml(n, "node")) {
        let Some(id) = element.attribute("id") else {
            tracing::warn!(line = line_of(&doc, &element), "node without id ignored");
            continue;
        };
        let mut node = NodeRecord::new(id);
        collect_data(&element, &mut node.attributes);
        graph.insert_node(node);
    }

    for (position, element) in doc
        .descendants()
        .filter(|n| is_graphml(n, "edge"))
        .enumerate()
    {
        let (Some(source), Some(target)) = (element.attribute("source"), element.attribute("target"))
        else {
            tracing::warn!(
                line = line_of(&doc, &element),
                "edge without source or target ignored"
            );
            continue;
        };
        let id = element
            .attribute("id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("e{position}"));
        let mut edge = EdgeRecord::new(id, source, target);
        collect_data(&element, &mut edge.attributes);
        graph.edges.push(edge);
    }

    tracing::debug!(
        keys = graph.keys.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "parsed graph"
    );
    Ok(graph)
}

pub fn parse_graphml_file(path: &Path) -> Result<GraphDocument> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_graphml(&contents)
}

fn is_graphml(node: &Node, name: &str) -> bool {
    if !node.is_element() {
        return false;
    }
    let tag = node.tag_name();
    tag.name() == name && matches!(tag.namespace(), None | Some(GRAPHML_NS))
}

fn collect_data(element: &Node, into: &mut indexmap::IndexMap<String, String>) {
    for data in element.children().filter(|n| is_graphml(n, "data")) {
        if let Some(key) = data.attribute("key") {
            let value: String = data
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            into.insert(key.to_string(), value);
        }
    }
}

fn line_of(doc: &Document, node: &Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}

//! Resolution of graph elements to style sheet rules.

use crate::graph::{GraphDocument, KeyDictionary, KeyDomain, NodeRecord};
use crate::theme::{EdgeStyleRule, NodeStyleRule, StyleSheet};

/// Attribute names that declare a node's chronotope.
pub const NODE_TYPE_KEYS: [&str; 2] = ["type", "chronotope"];

/// Rule for an edge relation: the first exact label match in sheet order, else the
/// sheet's first catch-all rule, else a built-in grey dashed rule.
pub fn resolve_edge_style(sheet: &StyleSheet, relation: &str) -> EdgeStyleRule {
    if let Some(rule) = sheet
        .edges
        .iter()
        .find(|rule| rule.label.as_deref() == Some(relation))
    {
        return rule.clone();
    }
    tracing::debug!(relation, "no edge rule for relation, using default");
    sheet
        .edges
        .iter()
        .find(|rule| rule.is_default())
        .cloned()
        .unwrap_or_else(EdgeStyleRule::fallback)
}

/// Rule for a node.
///
/// A declared type key (see [`NODE_TYPE_KEYS`]) is authoritative when the node carries
/// it. Otherwise every raw attribute value, the id included, is tested against the rule
/// labels and the first rule in sheet order matching any of them wins.
pub fn resolve_node_style(sheet: &StyleSheet, keys: &KeyDictionary, node: &NodeRecord) -> NodeStyleRule {
    let matched = match declared_type(keys, node) {
        Some(node_type) => sheet.nodes.iter().find(|rule| rule.label == node_type),
        None => {
            let values: Vec<&str> = std::iter::once(node.id.as_str())
                .chain(node.attributes.values().map(String::as_str))
                .collect();
            sheet
                .nodes
                .iter()
                .find(|rule| values.contains(&rule.label.as_str()))
        }
    };
    match matched {
        Some(rule) => rule.clone(),
        None => {
            tracing::debug!(node = node.id.as_str(), "no node rule matched, using default");
            NodeStyleRule::fallback()
        }
    }
}

/// Assigns resolved styles to every node and edge of `graph`.
pub fn resolve_styles(graph: &mut GraphDocument, sheet: &StyleSheet) {
    let keys = &graph.keys;
    for node in graph.nodes.values_mut() {
        node.style = Some(resolve_node_style(sheet, keys, node));
    }
    for edge in graph.edges.iter_mut() {
        edge.style = Some(resolve_edge_style(sheet, edge.relation(keys)));
    }
}

fn declared_type<'a>(keys: &KeyDictionary, node: &'a NodeRecord) -> Option<&'a str> {
    NODE_TYPE_KEYS.iter().find_map(|name| {
        keys.id_for(name, KeyDomain::Node)
            .and_then(|id| node.attributes.get(id))
            .map(|value| value.trim())
    })
}

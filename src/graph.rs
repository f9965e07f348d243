use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::geometry::Point;
use crate::theme::{EdgeStyleRule, NodeStyleRule};

/// Key id used by older exports for the node size attribute.
pub const LEGACY_SIZE_KEY: &str = "d3";
/// Key id used by older exports for the edge relation attribute.
pub const LEGACY_RELATION_KEY: &str = "d2";
pub const DEFAULT_NODE_SIZE: f64 = 10.0;
pub const NO_RELATION: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyDomain {
    Node,
    Edge,
    Graph,
    All,
}

impl KeyDomain {
    pub fn from_token(token: &str) -> Self {
        match token {
            "edge" => Self::Edge,
            "graph" => Self::Graph,
            "all" => Self::All,
            _ => Self::Node,
        }
    }

    fn covers(self, other: KeyDomain) -> bool {
        self == KeyDomain::All || self == other
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyDef {
    pub id: String,
    pub name: String,
    pub value_type: String,
    pub domain: KeyDomain,
}

/// Attribute definitions declared by the document's `key` elements.
#[derive(Debug, Clone, Default)]
pub struct KeyDictionary {
    keys: BTreeMap<String, KeyDef>,
}

impl KeyDictionary {
    pub fn insert(&mut self, key: KeyDef) {
        self.keys.insert(key.id.clone(), key);
    }

    pub fn get(&self, id: &str) -> Option<&KeyDef> {
        self.keys.get(id)
    }

    /// Id of the key declaring attribute `name` for `domain`, if any.
    pub fn id_for(&self, name: &str, domain: KeyDomain) -> Option<&str> {
        self.keys
            .values()
            .find(|key| key.name == name && key.domain.covers(domain))
            .map(|key| key.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: String,
    /// Raw `data` values keyed by key id, in document order.
    pub attributes: IndexMap<String, String>,
    pub position: Option<Point>,
    pub style: Option<NodeStyleRule>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: IndexMap::new(),
            position: None,
            style: None,
        }
    }

    /// Raw value of attribute `name`: looked up through the key dictionary first, then
    /// by using the name itself as key id.
    pub fn attribute<'a>(&'a self, keys: &KeyDictionary, name: &str) -> Option<&'a str> {
        lookup(&self.attributes, keys, name, KeyDomain::Node)
    }

    /// Numeric attribute; absent or malformed values read as zero.
    pub fn number(&self, keys: &KeyDictionary, name: &str) -> f64 {
        self.attribute(keys, name)
            .map(|raw| coerce_number(&self.id, name, raw))
            .unwrap_or(0.0)
    }

    /// Position as written in the document, before normalization.
    pub fn raw_position(&self, keys: &KeyDictionary) -> Point {
        Point::new(self.number(keys, "x"), self.number(keys, "y"))
    }

    pub fn size(&self, keys: &KeyDictionary) -> f64 {
        match self
            .attribute(keys, "size")
            .or_else(|| self.attributes.get(LEGACY_SIZE_KEY).map(String::as_str))
        {
            Some(raw) => coerce_number(&self.id, "size", raw),
            None => DEFAULT_NODE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    pub attributes: IndexMap<String, String>,
    pub style: Option<EdgeStyleRule>,
}

impl EdgeRecord {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            attributes: IndexMap::new(),
            style: None,
        }
    }

    pub fn attribute<'a>(&'a self, keys: &KeyDictionary, name: &str) -> Option<&'a str> {
        lookup(&self.attributes, keys, name, KeyDomain::Edge)
    }

    /// Relation label, `"none"` when the edge carries none.
    pub fn relation<'a>(&'a self, keys: &KeyDictionary) -> &'a str {
        self.attribute(keys, "relation")
            .or_else(|| self.attributes.get(LEGACY_RELATION_KEY).map(String::as_str))
            .unwrap_or(NO_RELATION)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphDocument {
    pub keys: KeyDictionary,
    pub nodes: IndexMap<String, NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing the data of an earlier node with the same id in place.
    pub fn insert_node(&mut self, node: NodeRecord) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    /// True when both ends of `edge` exist in the node mapping.
    pub fn is_resolvable(&self, edge: &EdgeRecord) -> bool {
        self.nodes.contains_key(&edge.source) && self.nodes.contains_key(&edge.target)
    }
}

fn lookup<'a>(
    attributes: &'a IndexMap<String, String>,
    keys: &KeyDictionary,
    name: &str,
    domain: KeyDomain,
) -> Option<&'a str> {
    keys.id_for(name, domain)
        .and_then(|id| attributes.get(id))
        .or_else(|| attributes.get(name))
        .map(String::as_str)
}

fn coerce_number(owner: &str, name: &str, raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(element = owner, attribute = name, value = raw, "non-numeric attribute, using 0");
            0.0
        }
    }
}

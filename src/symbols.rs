//! Symbol artwork lookup and recoloring.
//!
//! Symbols are small SVG documents addressed by the reference stored in a node rule,
//! e.g. `colour/road.svg`. Stores are read only and may be shared between renders.

use base64::Engine as _;
use roxmltree::{Document, Node, NodeType};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use xmlwriter::{Indent, XmlWriter};

use crate::error::SymbolError;

pub trait SymbolStore: Send + Sync {
    /// Raw bytes of the symbol named `name`, or `None` when it does not exist.
    fn load(&self, name: &str) -> Option<Cow<'_, [u8]>>;
}

/// A store without any symbols; every node falls back to a colored shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolStore for NoSymbols {
    fn load(&self, _name: &str) -> Option<Cow<'_, [u8]>> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySymbolStore {
    symbols: BTreeMap<String, Vec<u8>>,
}

impl MemorySymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.symbols.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl SymbolStore for MemorySymbolStore {
    fn load(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.symbols
            .get(name)
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }
}

/// Symbols stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirSymbolStore {
    root: PathBuf,
}

impl DirSymbolStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }
}

impl SymbolStore for DirSymbolStore {
    fn load(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let path = self.resolve(name)?;
        std::fs::read(&path).ok().map(Cow::Owned)
    }
}

/// Loads, checks and optionally tints a symbol, returning an SVG `data:` URI.
pub fn prepare_symbol(store: &dyn SymbolStore, name: &str, tint: Option<&str>) -> Result<String, SymbolError> {
    let bytes = store
        .load(name)
        .ok_or_else(|| SymbolError::NotFound(name.to_string()))?;
    let text = std::str::from_utf8(&bytes).map_err(|_| SymbolError::Encoding {
        name: name.to_string(),
    })?;
    let doc = Document::parse(text).map_err(|err| SymbolError::Malformed {
        name: name.to_string(),
        message: err.to_string(),
    })?;
    let svg = match tint {
        Some(color) => Cow::Owned(write_recolored(&doc, color)),
        None => Cow::Borrowed(text),
    };
    Ok(data_uri(svg.as_bytes()))
}

/// Replaces fill and stroke colors of an SVG document with `color`.
///
/// `none` values are kept so that transparent regions stay transparent.
pub fn recolor_svg(svg: &str, color: &str) -> Result<String, roxmltree::Error> {
    let doc = Document::parse(svg)?;
    Ok(write_recolored(&doc, color))
}

pub fn data_uri(svg: &[u8]) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

const PAINT_PROPERTIES: [&str; 2] = ["fill", "stroke"];

fn write_recolored(doc: &Document, color: &str) -> String {
    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: false,
        indent: Indent::None,
        attributes_indent: Indent::None,
    });
    write_element(&doc.root_element(), color, &mut xml);
    xml.end_document()
}

fn write_element(node: &Node, color: &str, xml: &mut XmlWriter) {
    xml.start_element(&qualified_name(node, node.tag_name().namespace(), node.tag_name().name()));

    for ns in declared_namespaces(*node) {
        match ns.name() {
            Some(prefix) => xml.write_attribute(&format!("xmlns:{prefix}"), &escape_markup(ns.uri())),
            None => xml.write_attribute("xmlns", &escape_markup(ns.uri())),
        }
    }

    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(uri) => qualified_name(node, Some(uri), attr.name()),
            None => attr.name().to_string(),
        };
        let value: Cow<str> = match attr.name() {
            "fill" | "stroke" if attr.namespace().is_none() => recolor_paint(attr.value(), color),
            "style" if attr.namespace().is_none() => Cow::Owned(recolor_style(attr.value(), color)),
            _ => Cow::Borrowed(attr.value()),
        };
        xml.write_attribute(&name, &escape_markup(&value));
    }

    for child in node.children() {
        match child.node_type() {
            NodeType::Element => write_element(&child, color, xml),
            // `write_text` escapes `<` only.
            NodeType::Text => xml.write_text(&child.text().unwrap_or_default().replace('&', "&amp;")),
            _ => {}
        }
    }
    xml.end_element();
}

/// Namespace declarations that are new at `node`: everything in scope at the root,
/// and only bindings the parent does not already carry below it.
fn declared_namespaces<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = &'a roxmltree::Namespace<'input>> {
    let parent = node.parent_element();
    node.namespaces().filter(move |ns| {
        if ns.name() == Some("xml") {
            return false;
        }
        parent.is_none_or(|p| !p.namespaces().any(|pns| pns == *ns))
    })
}

fn qualified_name(node: &Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn recolor_paint<'a>(value: &'a str, color: &str) -> Cow<'a, str> {
    if value.trim().eq_ignore_ascii_case("none") {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(color.to_string())
    }
}

fn recolor_style(style: &str, color: &str) -> String {
    simplecss::DeclarationTokenizer::from(style)
        .map(|decl| {
            let value = if PAINT_PROPERTIES.contains(&decl.name) {
                recolor_paint(decl.value, color)
            } else {
                Cow::Borrowed(decl.value)
            };
            if decl.important {
                format!("{}:{value} !important", decl.name)
            } else {
                format!("{}:{value}", decl.name)
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

// xmlwriter escapes quotes in attribute values but leaves `&` and `<` alone.
fn escape_markup(input: &str) -> String {
    input.replace('&', "&amp;").replace('<', "&lt;")
}

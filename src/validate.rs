//! Advisory checks for chronotope XML (`topos`, `connection`, `toporef`).
//!
//! Findings never block rendering; they are reported to the author of the document.

use roxmltree::{Document, Node};
use serde::Serialize;
use std::fmt;

pub const CHRONOTOPES: [&str; 12] = [
    "anti-idyll",
    "castle",
    "distortion",
    "encounter",
    "idyll",
    "metanarrative",
    "parlour",
    "public square",
    "road",
    "threshold",
    "provincial town",
    "wilderness",
];

pub const RELATIONS: [&str; 10] = [
    "direct",
    "indirect",
    "interrupt",
    "jump",
    "charshift",
    "projection",
    "metatextual",
    "paratextual",
    "intratextual",
    "metaphor",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl Finding {
    fn at(severity: Severity, category: &str, line: u32, message: String) -> Self {
        Self {
            severity,
            category: category.to_string(),
            line: Some(line),
            message: format!("Line {line}: {message}"),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.category, self.message)
    }
}

pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

/// Checks a chronotope document, returning findings ordered by source line.
pub fn validate_xml(content: &str) -> Vec<Finding> {
    let doc = match Document::parse(content) {
        Ok(doc) => doc,
        Err(err) => {
            return vec![Finding {
                severity: Severity::Error,
                category: "syntax".to_string(),
                line: None,
                message: format!("XML Syntax Error: {err}"),
            }];
        }
    };

    let mut findings = Vec::new();
    let mut frame_names: Vec<&str> = Vec::new();

    for topos in elements(&doc, "topos") {
        let line = line_of(&doc, &topos);
        match topos.attribute("type") {
            None => findings.push(missing(line, "topos", "type")),
            Some(kind) if !CHRONOTOPES.contains(&kind) => findings.push(Finding::at(
                Severity::Warning,
                "topos",
                line,
                format!(
                    "Unknown chronotope type \"{kind}\". Valid types: {}",
                    CHRONOTOPES.join(", ")
                ),
            )),
            Some(_) => {}
        }
        match topos.attribute("framename") {
            None => findings.push(missing(line, "topos", "framename")),
            Some(name) => frame_names.push(name),
        }
    }

    let connections: Vec<Node> = elements(&doc, "connection").collect();
    for connection in &connections {
        let line = line_of(&doc, connection);
        for attr in ["source", "target"] {
            if connection.attribute(attr).is_none() {
                findings.push(missing(line, "connection", attr));
            }
        }
        match connection.attribute("relation") {
            None => findings.push(missing(line, "connection", "relation")),
            Some(relation) => check_relation(&mut findings, "connection", line, relation),
        }
    }

    for connection in &connections {
        let line = line_of(&doc, connection);
        for attr in ["source", "target"] {
            if let Some(name) = connection.attribute(attr) {
                if !frame_names.contains(&name) {
                    findings.push(Finding::at(
                        Severity::Error,
                        "reference",
                        line,
                        format!("Connection {attr} \"{name}\" does not match any topos framename"),
                    ));
                }
            }
        }
    }

    for toporef in elements(&doc, "toporef") {
        let line = line_of(&doc, &toporef);
        if toporef.attribute("role").is_none() {
            findings.push(missing(line, "toporef", "role"));
        }
        match toporef.attribute("relation") {
            Some(relation) => check_relation(&mut findings, "toporef", line, relation),
            None if !toporef.has_attribute("sequence") => {
                findings.push(missing(line, "toporef", "relation"));
            }
            None => {}
        }
    }

    findings.sort_by_key(|f| f.line.unwrap_or(0));
    findings
}

fn elements<'a, 'input>(
    doc: &'a Document<'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn line_of(doc: &Document, node: &Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}

fn missing(line: u32, element: &str, attr: &str) -> Finding {
    Finding::at(
        Severity::Error,
        element,
        line,
        format!("<{element}> missing required \"{attr}\" attribute"),
    )
}

fn check_relation(findings: &mut Vec<Finding>, category: &str, line: u32, relation: &str) {
    if !RELATIONS.contains(&relation) {
        findings.push(Finding::at(
            Severity::Warning,
            category,
            line,
            format!(
                "Unknown relation type \"{relation}\". Valid types: {}",
                RELATIONS.join(", ")
            ),
        ));
    }
}

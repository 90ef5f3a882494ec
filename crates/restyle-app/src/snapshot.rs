//! Page snapshots.
//!
//! A snapshot is the JSON hand-off from the HTML and CSS parsers: the DOM
//! and the already-parsed stylesheets of one page.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use restyle_css::{Rule, StyleSources, Stylesheet, presentational_hints, user_agent_stylesheet};
use restyle_dom::{Document, NodeId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub document: Document,
    /// Replaces the built-in user-agent sheet when present.
    #[serde(default)]
    pub user_agent: Option<Stylesheet>,
    #[serde(default)]
    pub user: Option<Stylesheet>,
    /// Author sheets in cascade order.
    #[serde(default)]
    pub author: Vec<Stylesheet>,
    /// Parsed `style` attributes.
    #[serde(default)]
    pub inline: HashMap<NodeId, Vec<Rule>>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text)?;
        snapshot.document.validate()?;
        Ok(snapshot)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Split into the document and the cascade inputs, adding the
    /// presentational hints of the document.
    pub fn into_sources(self) -> (Document, StyleSources) {
        let hints = presentational_hints(&self.document);
        let sources = StyleSources {
            user_agent: self.user_agent.unwrap_or_else(user_agent_stylesheet),
            user: self.user,
            author: self.author,
            inline: self.inline,
            hints,
        };
        (self.document, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"{
        "document": {
            "root": 0,
            "nodes": [
                { "kind": "document", "parent": null, "children": [1] },
                { "kind": { "element": { "tag": "html", "attributes": [] } },
                  "parent": 0, "children": [2] },
                { "kind": { "element": { "tag": "body", "attributes": [
                    { "name": "bgcolor", "value": "#fff" }
                ] } }, "parent": 1, "children": [3] },
                { "kind": { "element": { "tag": "P", "attributes": [] } },
                  "parent": 2, "children": [4] },
                { "kind": { "text": "Hello" }, "parent": 3, "children": [] }
            ]
        },
        "author": [{
            "medias": [{
                "name": "all",
                "elements": [{ "selector_rules": {
                    "selectors": [{ "parts": [[{ "element": "p" }, null]] }],
                    "rules": [{ "name": "font-weight", "value": [{ "ident": "bold" }] }]
                } }]
            }]
        }],
        "inline": { "3": [{ "name": "color", "value": [{ "ident": "red" }], "important": true }] }
    }"##;

    #[test]
    fn parses_a_page() {
        let snapshot = Snapshot::from_json(PAGE).unwrap();
        assert_eq!(snapshot.document.nodes.len(), 5);
        assert_eq!(snapshot.author.len(), 1);
        assert_eq!(snapshot.author[0].rule_count(), 1);
        assert!(snapshot.inline[&3][0].important);
    }

    #[test]
    fn sources_carry_default_sheet_and_hints() {
        let (doc, sources) = Snapshot::from_json(PAGE).unwrap().into_sources();
        assert!(doc.element(2).is_some_and(|e| e.is("body")));
        assert_eq!(sources.user_agent, user_agent_stylesheet());
        assert_eq!(sources.hints[&2][0].name.as_str(), "background-color");
        assert!(sources.user.is_none());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Snapshot::from_json("{}").is_err());
        assert!(Snapshot::from_json("not json").is_err());
    }

    #[test]
    fn rejects_dangling_children() {
        let text = r#"{"document": {"root": 0, "nodes": [
            {"kind": "document", "parent": null, "children": [7]}
        ]}}"#;
        let err = Snapshot::from_json(text).unwrap_err();
        assert!(err.to_string().contains("child 7 out of range"), "{err}");
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, NodeId, NodeKind};

/// Serialized page as handed over by the host (or saved by the CLI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    pub root: SnapshotNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
        #[serde(
            default,
            rename = "shadowRoot",
            skip_serializing_if = "Option::is_none"
        )]
        shadow_root: Option<Vec<SnapshotNode>>,
    },
    Text {
        text: String,
    },
}

impl SnapshotNode {
    pub fn element(tag: &str, children: Vec<SnapshotNode>) -> Self {
        SnapshotNode::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            value: None,
            children,
            shadow_root: None,
        }
    }

    pub fn text(text: &str) -> Self {
        SnapshotNode::Text {
            text: text.to_string(),
        }
    }

    fn tag(&self) -> Option<&str> {
        match self {
            SnapshotNode::Element { tag, .. } => Some(tag.as_str()),
            SnapshotNode::Text { .. } => None,
        }
    }
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Document {
    /// Builds a live document from a snapshot. A snapshot rooted at `<body>`
    /// (or any other element) is wrapped so the document always has
    /// `<html><body>`.
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Document {
        let root = match snapshot.root.tag() {
            Some("html") => snapshot.root.clone(),
            Some("body") => SnapshotNode::element("html", vec![snapshot.root.clone()]),
            _ => SnapshotNode::element(
                "html",
                vec![SnapshotNode::element("body", vec![snapshot.root.clone()])],
            ),
        };

        let mut nodes = Vec::new();
        let root_id = build_node(&mut nodes, &root);
        let mut doc = Document::from_parts(nodes, root_id);
        if let Some(url) = &snapshot.url {
            doc.set_url(url);
        }
        doc
    }

    /// Serializes the connected tree back into a snapshot.
    pub fn to_snapshot(&self, title: &str) -> PageSnapshot {
        PageSnapshot {
            url: self.url().map(str::to_string),
            title: title.to_string(),
            root: self.snapshot_node(self.root()),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        let Some(node) = self.node(id) else {
            return SnapshotNode::text("");
        };
        match &node.kind {
            NodeKind::Text(text) => SnapshotNode::text(text),
            NodeKind::Element {
                tag,
                attributes,
                value,
            } => SnapshotNode::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                value: value.clone(),
                children: node
                    .children()
                    .iter()
                    .map(|c| self.snapshot_node(*c))
                    .collect(),
                shadow_root: node.shadow_root().map(|s| {
                    self.children(s)
                        .iter()
                        .map(|c| self.snapshot_node(*c))
                        .collect()
                }),
            },
            // Shadow roots are emitted through their host.
            NodeKind::ShadowRoot => SnapshotNode::text(""),
        }
    }
}

fn build_node(nodes: &mut Vec<crate::dom::document::Node>, snap: &SnapshotNode) -> NodeId {
    match snap {
        SnapshotNode::Text { text } => Document::push_node(nodes, NodeKind::Text(text.clone())),
        SnapshotNode::Element {
            tag,
            attributes,
            value,
            children,
            shadow_root,
        } => {
            let id = Document::push_node(
                nodes,
                NodeKind::Element {
                    tag: tag.to_ascii_lowercase(),
                    attributes: attributes
                        .iter()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                        .collect(),
                    value: value.clone(),
                },
            );
            for child in children {
                let child_id = build_node(nodes, child);
                Document::link(nodes, id, child_id);
            }
            if let Some(shadow_children) = shadow_root {
                let shadow = Document::push_node(nodes, NodeKind::ShadowRoot);
                Document::link_shadow(nodes, id, shadow);
                for child in shadow_children {
                    let child_id = build_node(nodes, child);
                    Document::link(nodes, shadow, child_id);
                }
            }
            id
        }
    }
}

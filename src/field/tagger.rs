use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, NodeId};

/// A user rule naming fields to include or exclude. Any populated property
/// that matches makes the whole rule match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_value: Option<String>,
    /// Substring of the element's selector path (see [`selector_path`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// What a rule is matched against.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIdentifiers {
    pub id: Option<String>,
    pub tag_name: String,
    pub classes: Vec<String>,
    pub name: Option<String>,
    pub placeholder: Option<String>,
    pub data_attributes: BTreeMap<String, String>,
    pub path: String,
}

impl FieldIdentifiers {
    pub fn of(doc: &Document, node: NodeId) -> Self {
        let attr = |name: &str| doc.attribute(node, name).map(str::to_string);
        let data_attributes = doc
            .attributes(node)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter(|(k, _)| k.starts_with("data-"))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        FieldIdentifiers {
            id: attr("id").filter(|v| !v.is_empty()),
            tag_name: doc.tag(node).unwrap_or_default().to_string(),
            classes: attr("class")
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            name: attr("name"),
            placeholder: attr("placeholder"),
            data_attributes,
            path: selector_path(doc, node),
        }
    }
}

impl FieldRule {
    pub fn matches(&self, ids: &FieldIdentifiers) -> bool {
        if self.id.is_some() && self.id == ids.id {
            return true;
        }
        if let Some(class) = &self.class_name {
            if ids.classes.contains(class) {
                return true;
            }
        }
        if self.name.is_some() && self.name == ids.name {
            return true;
        }
        if let Some(tag) = &self.tag_name {
            if tag.eq_ignore_ascii_case(&ids.tag_name) {
                return true;
            }
        }
        if self.placeholder.is_some() && self.placeholder == ids.placeholder {
            return true;
        }
        if let (Some(attr), Some(value)) = (&self.data_attribute, &self.data_value) {
            if ids.data_attributes.get(attr) == Some(value) {
                return true;
            }
        }
        if let Some(path) = &self.path {
            if !path.is_empty() && ids.path.contains(path.as_str()) {
                return true;
            }
        }
        false
    }
}

/// Include/exclude gate applied on top of the editable classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFilter {
    pub excluded: Vec<FieldRule>,
    pub included: Vec<FieldRule>,
}

impl ElementFilter {
    pub fn new(excluded: Vec<FieldRule>, included: Vec<FieldRule>) -> Self {
        Self { excluded, included }
    }

    pub fn should_process(&self, doc: &Document, node: NodeId) -> bool {
        if self.excluded.is_empty() && self.included.is_empty() {
            return true;
        }

        let ids = FieldIdentifiers::of(doc, node);
        if self.excluded.iter().any(|r| r.matches(&ids)) {
            return false;
        }
        if !self.included.is_empty() {
            return self.included.iter().any(|r| r.matches(&ids));
        }
        true
    }
}

/// CSS-like path used by path rules, e.g. `div.thread > form#reply > textarea`.
/// Stops at the first ancestor with an id.
pub fn selector_path(doc: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);

    while let Some(n) = current {
        if n == doc.body() || n == doc.root() {
            break;
        }
        let Some(tag) = doc.tag(n) else {
            break;
        };
        let mut segment = tag.to_string();
        if let Some(id) = doc.attribute(n, "id").filter(|v| !v.is_empty()) {
            segment.push('#');
            segment.push_str(id);
            segments.push(segment);
            break;
        }
        if let Some(class) = doc.attribute(n, "class") {
            for c in class.split_whitespace() {
                segment.push('.');
                segment.push_str(c);
            }
        }
        segments.push(segment);
        current = doc.parent_element(n);
    }

    segments.reverse();
    segments.join(" > ")
}

use crate::dom::document::{Document, NodeId};

/// One compound selector, e.g. `div.entry[data-testid="tweet"]`.
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

/// A parsed selector list: comma-separated chains joined by the descendant
/// combinator. Other combinators and pseudo-classes are not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    chains: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(input: &str) -> Option<Selector> {
        let mut chains = Vec::new();
        for part in input.split(',') {
            let chain = part
                .split_whitespace()
                .map(parse_compound)
                .collect::<Option<Vec<_>>>()?;
            if chain.is_empty() {
                return None;
            }
            chains.push(chain);
        }
        Some(Selector { chains })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.chains.iter().any(|chain| matches_chain(doc, node, chain))
    }
}

impl Document {
    /// Connected elements matching `selector`, in document order. An
    /// unparsable selector matches nothing.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(self.root())
            .into_iter()
            .filter(|n| self.is_element(*n) && selector.matches(self, *n))
            .collect()
    }
}

fn matches_chain(doc: &Document, node: NodeId, chain: &[Compound]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !matches_compound(doc, node, last) {
        return false;
    }
    let mut ancestor = doc.parent_element(node);
    for compound in rest.iter().rev() {
        loop {
            match ancestor {
                Some(a) if matches_compound(doc, a, compound) => {
                    ancestor = doc.parent_element(a);
                    break;
                }
                Some(a) => ancestor = doc.parent_element(a),
                None => return false,
            }
        }
    }
    true
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if doc.tag(node) != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if doc.attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_attr = doc.attribute(node, "class").unwrap_or("");
        let classes: Vec<&str> = class_attr.split_whitespace().collect();
        if !compound.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
    }
    compound.attributes.iter().all(|(name, expected)| {
        match (doc.attribute(node, name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        }
    })
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && !matches!(chars[*i], '.' | '#' | '[') {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let class = read_ident(&mut i);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '#' => {
                i += 1;
                let id = read_ident(&mut i);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attributes.push(parse_attribute(&inner)?);
                i = close + 1;
            }
            '*' => i += 1,
            _ => {
                let tag = read_ident(&mut i);
                compound.tag = Some(tag.to_ascii_lowercase());
            }
        }
    }
    Some(compound)
}

fn parse_attribute(inner: &str) -> Option<(String, Option<String>)> {
    match inner.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Some((name.to_ascii_lowercase(), Some(value.to_string())))
        }
        None => {
            let name = inner.trim();
            if name.is_empty() {
                None
            } else {
                Some((name.to_ascii_lowercase(), None))
            }
        }
    }
}

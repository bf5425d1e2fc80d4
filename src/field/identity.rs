use crate::dom::document::{Document, NodeId};

/// Key handed out for elements that cannot be located relative to `<body>`
/// (detached nodes, `<body>` itself, nodes under `<head>`). Usage is never
/// recorded against it.
pub const UNROOTED_KEY: &str = "element_unrooted";

/// Stable key for per-element preferences.
///
/// Priority: non-empty `id`, then non-empty `name`, then a hash of the
/// structural path from `<body>` down to the element.
pub fn key_for(doc: &Document, node: NodeId) -> String {
    if let Some(id) = non_empty(doc.attribute(node, "id")) {
        return id.to_string();
    }
    if let Some(name) = non_empty(doc.attribute(node, "name")) {
        return name.to_string();
    }

    match structural_path(doc, node) {
        Some(path) => format!("element_{}", path_hash(&path).unsigned_abs()),
        None => UNROOTED_KEY.to_string(),
    }
}

pub fn is_persistable(key: &str) -> bool {
    key != UNROOTED_KEY
}

/// `tag:nth-child(n)` segments from just below `<body>` down to `node`,
/// joined by `" > "`. Shadow roots are crossed into their host; the child
/// index is 1-based among element siblings.
pub fn structural_path(doc: &Document, node: NodeId) -> Option<String> {
    let body = doc.body();
    let mut segments = Vec::new();
    let mut current = node;

    while current != body {
        let tag = doc.tag(current)?;
        let container = doc.parent(current)?;
        let index = doc
            .element_children(container)
            .iter()
            .position(|c| *c == current)?
            + 1;
        segments.push(format!("{}:nth-child({})", tag, index));

        current = if doc.is_shadow_root(container) {
            doc.parent(container)?
        } else {
            container
        };
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join(" > "))
}

/// 32-bit polynomial rolling hash (`h = h * 31 + unit`) over UTF-16 code
/// units with wrapping arithmetic. Persisted keys depend on this staying
/// bit-for-bit identical to the userscript's `(h << 5) - h + charCode`.
pub fn path_hash(path: &str) -> i32 {
    path.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

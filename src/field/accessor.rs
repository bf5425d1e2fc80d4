use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::field::classifier::{EditableKind, editable_kind};

pub const INPUT_EVENT: &str = "input";

/// Current text of an editable element. Rich-editable regions yield their
/// rendered plain text; markup is not round-tripped.
pub fn read(doc: &Document, node: NodeId) -> String {
    match editable_kind(doc, node) {
        Some(EditableKind::PlainText | EditableKind::Multiline) => {
            doc.value(node).unwrap_or_default().to_string()
        }
        Some(EditableKind::RichEditable) => doc.inner_text(node),
        None => String::new(),
    }
}

/// Replace the element's text and dispatch a bubbling `input` event so the
/// host page's own listeners pick the change up.
///
/// Returns `false` without touching anything when the element is no longer
/// attached or is not editable.
pub fn write(doc: &mut Document, node: NodeId, text: &str) -> bool {
    if !doc.is_connected(node) {
        debug!(node = node.index(), "skipping write to detached element");
        return false;
    }

    match editable_kind(doc, node) {
        Some(EditableKind::PlainText | EditableKind::Multiline) => doc.set_value(node, text),
        Some(EditableKind::RichEditable) => doc.set_inner_text(node, text),
        None => return false,
    }

    doc.dispatch_input(node);
    true
}

use crate::dom::document::{Document, NodeId};

/// The three kinds of text surface the rewriter can operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableKind {
    /// `<input type="text">`
    PlainText,
    /// `<textarea>`
    Multiline,
    /// Any element carrying an explicit `contenteditable` attribute.
    RichEditable,
}

/// Classify `node` as a rewritable text surface, or `None`.
///
/// Only the literal `contenteditable` attribute counts. Descendants of an
/// editable region inherit editability in a browser, but treating them as
/// separate surfaces produces false positives on nested rich-text markup.
pub fn editable_kind(doc: &Document, node: NodeId) -> Option<EditableKind> {
    let tag = doc.tag(node)?;

    match tag {
        "textarea" => return Some(EditableKind::Multiline),
        "input" if is_text_input(doc.attribute(node, "type")) => {
            return Some(EditableKind::PlainText);
        }
        _ => {}
    }

    if is_content_editable(doc.attribute(node, "contenteditable")) {
        return Some(EditableKind::RichEditable);
    }

    None
}

pub fn is_editable(doc: &Document, node: NodeId) -> bool {
    editable_kind(doc, node).is_some()
}

/// Input types a browser recognizes besides `text`. Anything else, including
/// an empty or misspelled type, reports itself as `text`.
const NON_TEXT_INPUT_TYPES: &[&str] = &[
    "button",
    "checkbox",
    "color",
    "date",
    "datetime-local",
    "email",
    "file",
    "hidden",
    "image",
    "month",
    "number",
    "password",
    "radio",
    "range",
    "reset",
    "search",
    "submit",
    "tel",
    "time",
    "url",
    "week",
];

fn is_text_input(input_type: Option<&str>) -> bool {
    match input_type.map(|t| t.trim().to_ascii_lowercase()) {
        None => true,
        Some(t) => !NON_TEXT_INPUT_TYPES.contains(&t.as_str()),
    }
}

fn is_content_editable(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        // `contenteditable=""` is the same as `contenteditable="true"`
        Some(v) => matches!(v.as_str(), "" | "true" | "plaintext-only"),
        None => false,
    }
}

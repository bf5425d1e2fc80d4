use crate::dom::document::NodeId;

/// A key press as seen by a document-level `keydown` listener.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn new(key: &str) -> Self {
        KeyPress {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Focus,
    Click,
    ContextMenu,
    Blur,
    KeyDown(KeyPress),
}

/// A host-page event delivered to the document-root listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
}

impl DomEvent {
    pub fn focus(target: NodeId) -> Self {
        DomEvent { kind: EventKind::Focus, target }
    }

    pub fn click(target: NodeId) -> Self {
        DomEvent { kind: EventKind::Click, target }
    }

    pub fn context_menu(target: NodeId) -> Self {
        DomEvent { kind: EventKind::ContextMenu, target }
    }

    pub fn blur(target: NodeId) -> Self {
        DomEvent { kind: EventKind::Blur, target }
    }

    pub fn key_down(target: NodeId, key: KeyPress) -> Self {
        DomEvent { kind: EventKind::KeyDown(key), target }
    }
}

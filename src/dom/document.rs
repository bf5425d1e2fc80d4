use std::collections::BTreeMap;

/// Handle to a node inside a [`Document`]. Ids stay valid after the node is
/// detached; only [`Document::is_connected`] tells whether it is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        /// Live `value` of form controls. `None` for everything else.
        value: Option<String>,
    },
    Text(String),
    ShadowRoot,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
}

/// A synthetic event dispatched by this tool onto a host element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub event_type: String,
    pub bubbles: bool,
}

/// In-memory host document.
///
/// The root node is `<html>` and always has a `<body>` child. Shadow roots
/// hang off their host: walking `parent()` from inside a shadow tree crosses
/// into the host, which is how composed event paths behave in a browser.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    url: Option<String>,
    dispatched: Vec<DispatchedEvent>,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            url: None,
            dispatched: Vec::new(),
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.root = root;
        doc.body = body;
        doc.append_child(root, body);
        doc
    }

    /// Builds a document around an existing `<html>` root. Used by the
    /// snapshot loader; the first `<body>` found becomes the body.
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        let mut doc = Document {
            nodes,
            root,
            body: root,
            url: None,
            dispatched: Vec::new(),
        };
        let body = doc
            .element_children(root)
            .into_iter()
            .find(|id| doc.tag(*id) == Some("body"));
        match body {
            Some(body) => doc.body = body,
            None => {
                let body = doc.create_element("body");
                doc.append_child(root, body);
                doc.body = body;
            }
        }
        doc
    }

    pub(crate) fn blank_node(kind: NodeKind) -> Node {
        Node {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
        }
    }

    pub(crate) fn push_node(nodes: &mut Vec<Node>, kind: NodeKind) -> NodeId {
        nodes.push(Self::blank_node(kind));
        NodeId(nodes.len() - 1)
    }

    pub(crate) fn link(nodes: &mut [Node], parent: NodeId, child: NodeId) {
        nodes[child.0].parent = Some(parent);
        nodes[parent.0].children.push(child);
    }

    pub(crate) fn link_shadow(nodes: &mut [Node], host: NodeId, shadow: NodeId) {
        nodes[shadow.0].parent = Some(host);
        nodes[host.0].shadow_root = Some(shadow);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// `location.href` of the page, when known.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = Some(url.to_string());
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        Self::push_node(
            &mut self.nodes,
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attributes: BTreeMap::new(),
                value: None,
            },
        )
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        Self::push_node(&mut self.nodes, NodeKind::Text(text.to_string()))
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        Self::link(&mut self.nodes, parent, child);
    }

    /// Detaches `node` (and its subtree) from the tree.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) else {
            return;
        };
        let p = &mut self.nodes[parent.0];
        if p.shadow_root == Some(node) {
            p.shadow_root = None;
        } else {
            p.children.retain(|c| *c != node);
        }
        self.nodes[node.0].parent = None;
    }

    /// Attaches (or returns the existing) shadow root of `host`.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(existing) = self.nodes[host.0].shadow_root {
            return existing;
        }
        let shadow = Self::push_node(&mut self.nodes, NodeKind::ShadowRoot);
        Self::link_shadow(&mut self.nodes, host, shadow);
        shadow
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.nodes.get(host.0).and_then(|n| n.shadow_root)
    }

    /// Composed parent: the parent of a shadow root is its host.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    /// Nearest ancestor that is an element, skipping shadow roots.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.parent(node)?;
        while !self.is_element(current) {
            current = self.parent(current)?;
        }
        Some(current)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0).map(|n| &n.kind),
            Some(NodeKind::Element { .. })
        )
    }

    pub fn is_shadow_root(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0).map(|n| &n.kind),
            Some(NodeKind::ShadowRoot)
        )
    }

    /// Lowercased tag name, `None` for text nodes and shadow roots.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                attributes.get(&name.to_ascii_lowercase()).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> Option<&BTreeMap<String, String>> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element { attributes, .. }) =
            self.nodes.get_mut(node.0).map(|n| &mut n.kind)
        {
            attributes.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    /// Current value of a form control. Falls back to the `value` attribute
    /// when the control was never edited.
    pub fn value(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element {
                value, attributes, ..
            }) => value
                .as_deref()
                .or_else(|| attributes.get("value").map(String::as_str)),
            _ => None,
        }
    }

    pub fn set_value(&mut self, node: NodeId, text: &str) {
        if let Some(NodeKind::Element { value, .. }) =
            self.nodes.get_mut(node.0).map(|n| &mut n.kind)
        {
            *value = Some(text.to_string());
        }
    }

    /// True when the composed ancestor chain reaches the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        if node.0 >= self.nodes.len() {
            return false;
        }
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.is_connected(node)
    }

    /// Rendered plain text: descendant text nodes in order, `<br>` as newline.
    pub fn inner_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        for child in self.children(node) {
            match &self.nodes[child.0].kind {
                NodeKind::Text(t) => out.push_str(t),
                NodeKind::Element { tag, .. } if tag == "br" => out.push('\n'),
                NodeKind::Element { .. } => self.collect_text(*child, out),
                NodeKind::ShadowRoot => {}
            }
        }
    }

    /// Replaces all children with `text`, turning newlines into `<br>`.
    pub fn set_inner_text(&mut self, node: NodeId, text: &str) {
        for child in self.children(node).to_vec() {
            self.remove(child);
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let br = self.create_element("br");
                Self::link(&mut self.nodes, node, br);
            }
            if !line.is_empty() {
                let t = self.create_text(line);
                Self::link(&mut self.nodes, node, t);
            }
        }
    }

    /// Records a synthetic event on `target`.
    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str, bubbles: bool) {
        self.dispatched.push(DispatchedEvent {
            target,
            event_type: event_type.to_string(),
            bubbles,
        });
    }

    /// Bubbling `input` notification, as a host framework would observe it.
    pub fn dispatch_input(&mut self, target: NodeId) {
        self.dispatch_event(target, "input", true);
    }

    pub fn dispatched_events(&self) -> &[DispatchedEvent] {
        &self.dispatched
    }

    /// Events a listener on `observer` would have received: those targeted at
    /// it, plus bubbling events from its composed descendants.
    pub fn events_observed_by(&self, observer: NodeId) -> Vec<&DispatchedEvent> {
        self.dispatched
            .iter()
            .filter(|e| {
                e.target == observer || (e.bubbles && self.is_ancestor(observer, e.target))
            })
            .collect()
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// All connected nodes in document order (shadow trees right after their host).
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(node, &mut out);
        out
    }

    fn walk(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(shadow) = self.shadow_root(node) {
            out.push(shadow);
            self.walk(shadow, out);
        }
        for child in self.children(node) {
            out.push(*child);
            self.walk(*child, out);
        }
    }

    /// Finds the first connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }
}

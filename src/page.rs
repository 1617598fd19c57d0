//! In-memory page tree: the live structure the locator walks, capture
//! reads, and replay mutates.
//!
//! Nodes live in a slab arena; removal leaves holes so stale `NodeId`s
//! resolve to nothing instead of aliasing a new element.

use crate::element::Element;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A signal synthesized during replay, appended in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticSignal {
    Click { node: NodeId },
    Input { node: NodeId },
    Change { node: NodeId },
    Key { node: NodeId, key: String },
}

#[derive(Debug, Clone)]
pub struct PageTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    viewport: (f64, f64),
    dispatched: Vec<SyntheticSignal>,
}

impl PageTree {
    pub fn new() -> Self {
        let root = Node {
            element: Element::new("html"),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
            viewport: (1280.0, 720.0),
            dispatched: Vec::new(),
        }
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.node_mut(id).map(|n| &mut n.element)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// Append `element` as the last child of `parent`. A dead parent
    /// leaves the new node detached rather than failing.
    pub fn insert(&mut self, parent: NodeId, element: Element) -> NodeId {
        let attach = self.is_alive(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            element,
            parent: attach.then_some(parent),
            children: Vec::new(),
        }));
        if attach {
            if let Some(p) = self.node_mut(parent) {
                p.children.push(id);
            }
        }
        id
    }

    /// Insert `element` as the immediately preceding sibling of `sibling`.
    /// Returns `None` for a dead sibling or the document root.
    pub fn insert_before(&mut self, sibling: NodeId, element: Element) -> Option<NodeId> {
        let parent = self.parent(sibling)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            element,
            parent: Some(parent),
            children: Vec::new(),
        }));
        let p = self.node_mut(parent)?;
        let pos = p.children.iter().position(|&c| c == sibling)?;
        p.children.insert(pos, id);
        Some(id)
    }

    /// Unlink a subtree from its parent, keeping its nodes alive.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|&c| c != id);
            }
            if let Some(n) = self.node_mut(id) {
                n.parent = None;
            }
        }
    }

    /// Remove a subtree entirely. Slots are cleared, so stale ids held
    /// elsewhere (e.g. registry entries) stop resolving.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(|n| n.take()) {
                pending.extend(node.children);
            }
        }
    }

    /// All live elements in document order (preorder from the root).
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// First element carrying the given stable identifier, in document order.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|&n| self.element(n).and_then(|e| e.id.as_deref()) == Some(id))
    }

    // Mutation entry points used by replay.

    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        let el = self
            .element_mut(id)
            .ok_or_else(|| Error::dispatch_failed("set_value", "element is gone"))?;
        if !el.is_editable() {
            return Err(Error::dispatch_failed("set_value", "element is not editable"));
        }
        el.value = Some(value.to_string());
        Ok(())
    }

    pub fn set_selection(&mut self, id: NodeId, start: u32, end: u32) -> Result<()> {
        let el = self
            .element_mut(id)
            .ok_or_else(|| Error::dispatch_failed("set_selection", "element is gone"))?;
        if !el.is_text_capable() {
            return Err(Error::dispatch_failed(
                "set_selection",
                "element has no selection range",
            ));
        }
        el.selection = Some((start, end));
        Ok(())
    }

    pub fn set_selected_index(&mut self, id: NodeId, index: i32) -> Result<()> {
        let el = self
            .element_mut(id)
            .ok_or_else(|| Error::dispatch_failed("set_selected_index", "element is gone"))?;
        if !el.is_select() {
            return Err(Error::dispatch_failed(
                "set_selected_index",
                "element is not a selection control",
            ));
        }
        el.selected_index = Some(index);
        if index >= 0 {
            if let Some(option) = el.options.get(index as usize) {
                el.value = Some(option.clone());
            }
        }
        Ok(())
    }

    pub fn set_scroll(&mut self, id: NodeId, top: f64, left: f64) -> Result<()> {
        let el = self
            .element_mut(id)
            .ok_or_else(|| Error::dispatch_failed("set_scroll", "element is gone"))?;
        el.scroll_top = top;
        el.scroll_left = left;
        Ok(())
    }

    /// Scroll the document so the element's center lands on the viewport
    /// center. No-op for a dead node.
    pub fn scroll_into_view(&mut self, id: NodeId) {
        let Some(center) = self.element(id).map(|e| e.bounds.center()) else {
            return;
        };
        let (vw, vh) = self.viewport;
        let root = self.root;
        if let Some(el) = self.element_mut(root) {
            el.scroll_top = (center.1 - vh / 2.0).max(0.0);
            el.scroll_left = (center.0 - vw / 2.0).max(0.0);
        }
    }

    // Synthetic dispatch. Replay uses these; the log lets embedders and
    // tests observe exactly what was synthesized.

    pub fn click(&mut self, id: NodeId) -> Result<()> {
        let el = self
            .element(id)
            .ok_or_else(|| Error::dispatch_failed("click", "element is gone"))?;
        if el.disabled {
            return Err(Error::dispatch_failed("click", "element is disabled"));
        }
        self.dispatched.push(SyntheticSignal::Click { node: id });
        Ok(())
    }

    pub fn dispatch_input(&mut self, id: NodeId) -> Result<()> {
        if !self.is_alive(id) {
            return Err(Error::dispatch_failed("input", "element is gone"));
        }
        self.dispatched.push(SyntheticSignal::Input { node: id });
        Ok(())
    }

    pub fn dispatch_change(&mut self, id: NodeId) -> Result<()> {
        if !self.is_alive(id) {
            return Err(Error::dispatch_failed("change", "element is gone"));
        }
        self.dispatched.push(SyntheticSignal::Change { node: id });
        Ok(())
    }

    pub fn dispatch_key(&mut self, id: NodeId, key: &str) -> Result<()> {
        if !self.is_alive(id) {
            return Err(Error::dispatch_failed("key", "element is gone"));
        }
        self.dispatched.push(SyntheticSignal::Key {
            node: id,
            key: key.to_string(),
        });
        Ok(())
    }

    pub fn dispatched(&self) -> &[SyntheticSignal] {
        &self.dispatched
    }

    pub fn take_dispatched(&mut self) -> Vec<SyntheticSignal> {
        std::mem::take(&mut self.dispatched)
    }

    /// Load a page fixture from its nested JSON form.
    pub fn from_json(s: &str) -> Result<Self> {
        let raw: PageJson =
            serde_json::from_str(s).map_err(|e| Error::page_invalid(&e.to_string()))?;
        let mut tree = Self::new().with_viewport(raw.width, raw.height);
        {
            let root = tree.root;
            if let Some(el) = tree.element_mut(root) {
                *el = raw.root.element;
            }
        }
        let root = tree.root;
        for child in raw.root.children {
            build(&mut tree, root, child);
        }
        Ok(tree)
    }
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

fn build(tree: &mut PageTree, parent: NodeId, raw: NodeJson) {
    let id = tree.insert(parent, raw.element);
    for child in raw.children {
        build(tree, id, child);
    }
}

#[derive(Serialize, Deserialize)]
struct NodeJson {
    #[serde(flatten)]
    element: Element,
    #[serde(default)]
    children: Vec<NodeJson>,
}

#[derive(Serialize, Deserialize)]
struct PageJson {
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    root: NodeJson,
}

fn default_width() -> f64 {
    1280.0
}

fn default_height() -> f64 {
    720.0
}

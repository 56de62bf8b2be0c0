//! The document: node arena, tree operations, queries and page state.

use std::collections::{HashMap, VecDeque};

use indextree::{Arena, NodeId};
use tracing::debug;

use crate::error::{DomError, DomResult};
use crate::event::{Event, EventTarget, EventType, Installed};
use crate::markup::{self, FragmentNode};
use crate::node::{Element, NodeKind, Rect};
use crate::selector::Selector;
use crate::timer::TimerQueue;

/// Page visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// A headless document.
pub struct Document {
    pub(crate) arena: Arena<NodeKind>,
    root: NodeId,
    body: NodeId,
    pub(crate) listeners: HashMap<EventTarget, Vec<Installed>>,
    pub(crate) next_listener: u64,
    pub(crate) queue: VecDeque<Event>,
    pub(crate) dispatching: bool,
    pub(crate) timers: TimerQueue,
    pub(crate) media_nodes: Vec<NodeId>,
    pub(crate) fullscreen: Option<NodeId>,
    visibility: Visibility,
    hash: String,
    title: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.count())
            .field("listeners", &self.total_listeners())
            .field("pending_timers", &self.pending_timers())
            .field("now", &self.now())
            .finish()
    }
}

impl Document {
    /// An empty document with `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeKind::Document);
        let html = arena.new_node(NodeKind::Element(Box::new(Element::new("html"))));
        let body = arena.new_node(NodeKind::Element(Box::new(Element::new("body"))));
        root.append(html, &mut arena);
        html.append(body, &mut arena);

        Self {
            arena,
            root,
            body,
            listeners: HashMap::new(),
            next_listener: 0,
            queue: VecDeque::new(),
            dispatching: false,
            timers: TimerQueue::default(),
            media_nodes: Vec::new(),
            fullscreen: None,
            visibility: Visibility::Visible,
            hash: String::new(),
            title: String::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    // ---- node access -------------------------------------------------

    /// Whether the node still exists in the arena.
    pub fn is_alive(&self, node: NodeId) -> bool {
        !node.is_removed(&self.arena) && self.arena.get(node).is_some()
    }

    /// Whether the node is attached under the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_alive(node) && node.ancestors(&self.arena).any(|n| n == self.root)
    }

    fn kind(&self, node: NodeId) -> DomResult<&NodeKind> {
        if !self.is_alive(node) {
            return Err(DomError::StaleNode(node));
        }
        self.arena
            .get(node)
            .map(|n| n.get())
            .ok_or(DomError::StaleNode(node))
    }

    pub fn element(&self, node: NodeId) -> DomResult<&Element> {
        self.kind(node)?
            .as_element()
            .ok_or(DomError::NotAnElement(node))
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> DomResult<&mut Element> {
        if !self.is_alive(node) {
            return Err(DomError::StaleNode(node));
        }
        self.arena
            .get_mut(node)
            .ok_or(DomError::StaleNode(node))?
            .get_mut()
            .as_element_mut()
            .ok_or(DomError::NotAnElement(node))
    }

    pub fn tag(&self, node: NodeId) -> DomResult<&str> {
        Ok(self.element(node)?.tag())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_alive(node) {
            return None;
        }
        self.arena.get(node)?.parent()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_alive(node) {
            return Vec::new();
        }
        node.children(&self.arena).collect()
    }

    /// Element children only.
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .into_iter()
            .filter(|&child| self.element(child).is_ok())
            .collect()
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_alive(node) && node.ancestors(&self.arena).any(|n| n == ancestor)
    }

    // ---- construction ------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Element::new(tag);
        let is_media = element.media.is_some();
        let node = self.arena.new_node(NodeKind::Element(Box::new(element)));
        if is_media {
            self.media_nodes.push(node);
        }
        node
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeKind::Text(text.to_string()))
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if matches!(self.kind(parent)?, NodeKind::Text(_)) {
            return Err(DomError::Hierarchy { parent, child });
        }
        self.kind(child)?;
        if child == parent || parent.ancestors(&self.arena).any(|n| n == child) {
            return Err(DomError::Hierarchy { parent, child });
        }

        child.detach(&mut self.arena);
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|_| DomError::Hierarchy { parent, child })
    }

    /// Detach `node` from its parent, keeping it (and its listeners) alive.
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        self.kind(node)?;
        node.detach(&mut self.arena);
        Ok(())
    }

    /// Destroy `node` and its subtree. Listeners on destroyed nodes go with
    /// them.
    pub fn remove_node(&mut self, node: NodeId) -> DomResult<()> {
        self.kind(node)?;
        if node == self.root || node == self.body {
            return Err(DomError::NotSupported("removing the document body".into()));
        }
        let doomed: Vec<NodeId> = node.descendants(&self.arena).collect();
        for &gone in &doomed {
            self.drop_listeners_for(gone);
            if self.fullscreen == Some(gone) {
                self.fullscreen = None;
            }
        }
        node.remove_subtree(&mut self.arena);
        self.media_nodes.retain(|n| !doomed.contains(n));
        Ok(())
    }

    /// Destroy every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) -> DomResult<()> {
        for child in self.children(node) {
            self.remove_node(child)?;
        }
        Ok(())
    }

    /// Parse `fragment` and append the result to `parent`, returning the
    /// top-level nodes created. Whitespace-only text runs are dropped.
    pub fn insert_markup(&mut self, parent: NodeId, fragment: &str) -> DomResult<Vec<NodeId>> {
        self.kind(parent)?;
        markup::parse_fragment(fragment)
            .iter()
            .map(|node| self.graft(parent, node))
            .collect()
    }

    fn graft(&mut self, parent: NodeId, fragment: &FragmentNode) -> DomResult<NodeId> {
        let node = match fragment {
            FragmentNode::Text(text) => self.create_text(text),
            FragmentNode::Element {
                name,
                attrs,
                children,
            } => {
                let node = self.create_element(name);
                let el = self.element_mut(node)?;
                for (attr, value) in attrs {
                    el.set_attr(attr, value);
                }
                for child in children {
                    self.graft(node, child)?;
                }
                node
            }
        };
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Replace the children of `node` with a parsed fragment (`innerHTML =`).
    pub fn set_inner_markup(&mut self, node: NodeId, fragment: &str) -> DomResult<Vec<NodeId>> {
        self.clear_children(node)?;
        self.insert_markup(node, fragment)
    }

    /// Serialize the children of `node`.
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.serialize_into(child, &mut out);
        }
        out
    }

    /// Serialize `node` itself.
    pub fn outer_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(node, &mut out);
        out
    }

    fn serialize_into(&self, node: NodeId, out: &mut String) {
        let Ok(kind) = self.kind(node) else {
            return;
        };
        match kind {
            NodeKind::Document => {
                for child in self.children(node) {
                    self.serialize_into(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                if !el.classes.is_empty() {
                    out.push_str(&format!(" class=\"{}\"", escape(&el.classes.join(" "), true)));
                }
                for (name, value) in &el.attrs {
                    out.push_str(&format!(" {name}=\"{}\"", escape(value, true)));
                }
                if !el.style.is_empty() {
                    let style: Vec<String> =
                        el.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    out.push_str(&format!(" style=\"{}\"", escape(&style.join("; "), true)));
                }
                out.push('>');
                if el.is_void() {
                    return;
                }
                for child in self.children(node) {
                    self.serialize_into(child, out);
                }
                out.push_str(&format!("</{}>", el.tag()));
            }
        }
    }

    // ---- text ----------------------------------------------------------

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        if !self.is_alive(node) {
            return String::new();
        }
        node.descendants(&self.arena)
            .filter_map(|n| match self.arena.get(n).map(|n| n.get()) {
                Some(NodeKind::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        self.element(node)?;
        self.clear_children(node)?;
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(node, child)?;
        }
        Ok(())
    }

    // ---- attributes, classes, style --------------------------------------

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        let el = self.element(node).ok()?;
        match name {
            "class" => (!el.classes.is_empty()).then(|| el.classes.join(" ")),
            _ => el.attr(name).map(str::to_string),
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        let el = self.element_mut(node)?;
        match name {
            "class" => el.classes.clear(),
            "style" => el.style.clear(),
            _ => el.attrs.retain(|(k, _)| k != name),
        }
        Ok(())
    }

    /// `className = value`.
    pub fn set_class_name(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        self.element_mut(node)?.set_class_name(value);
        Ok(())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_ok_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        let el = self.element_mut(node)?;
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        self.element_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.element(node).ok()?.style.get(property).cloned()
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> DomResult<()> {
        let el = self.element_mut(node)?;
        if value.is_empty() {
            el.style.remove(property);
        } else {
            el.style.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Whether `node` or an ancestor has `display: none`.
    pub fn is_displayed(&self, node: NodeId) -> bool {
        self.is_alive(node)
            && node.ancestors(&self.arena).all(|n| {
                self.element(n)
                    .map(|el| el.style.get("display").map(String::as_str) != Some("none"))
                    .unwrap_or(true)
            })
    }

    /// Form control value.
    pub fn value(&self, node: NodeId) -> DomResult<&str> {
        Ok(&self.element(node)?.value)
    }

    /// Set a form control value, as user input would.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        self.element_mut(node)?.value = value.to_string();
        Ok(())
    }

    pub fn rect(&self, node: NodeId) -> DomResult<Rect> {
        Ok(self.element(node)?.rect)
    }

    /// Assign a layout box. There is no layout engine; callers place
    /// elements explicitly.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> DomResult<()> {
        self.element_mut(node)?.rect = rect;
        Ok(())
    }

    // ---- queries -------------------------------------------------------

    /// First descendant of `scope` (excluding `scope`) matching `selector`.
    pub fn query(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_parsed(scope, &selector))
    }

    pub(crate) fn query_parsed(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        if !self.is_alive(scope) {
            return None;
        }
        scope
            .descendants(&self.arena)
            .skip(1)
            .find(|&n| selector.matches(&self.arena, n))
    }

    /// Every descendant of `scope` matching `selector`, in document order.
    pub fn query_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_all_parsed(scope, &selector))
    }

    pub(crate) fn query_all_parsed(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        if !self.is_alive(scope) {
            return Vec::new();
        }
        scope
            .descendants(&self.arena)
            .skip(1)
            .filter(|&n| selector.matches(&self.arena, n))
            .collect()
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        if !self.is_alive(node) {
            return Err(DomError::StaleNode(node));
        }
        Ok(node
            .ancestors(&self.arena)
            .find(|&n| selector.matches(&self.arena, n)))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.root.descendants(&self.arena).find(|&n| {
            self.arena
                .get(n)
                .and_then(|n| n.get().as_element())
                .is_some_and(|el| el.id() == Some(id))
        })
    }

    // ---- page state and navigation -------------------------------------

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Change page visibility, raising `visibilitychange` on the document.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        if self.visibility == visibility {
            return;
        }
        self.visibility = visibility;
        debug!(?visibility, "visibility changed");
        self.dispatch(Event::new(EventType::VisibilityChange, EventTarget::Document));
    }

    pub fn location_hash(&self) -> &str {
        &self.hash
    }

    /// Change the location hash, raising `hashchange` when it differs.
    pub fn set_location_hash(&mut self, hash: &str) {
        let hash = hash.trim_start_matches('#');
        if self.hash == hash {
            return;
        }
        self.hash = hash.to_string();
        self.dispatch(Event::new(EventType::HashChange, EventTarget::Window));
    }

    /// History traversal: raises `popstate`.
    pub fn history_back(&mut self) {
        self.dispatch(Event::new(EventType::PopState, EventTarget::Window));
    }

    /// Leave the page: `beforeunload` then `pagehide`.
    pub fn navigate_away(&mut self) {
        debug!("navigating away");
        self.dispatch(Event::new(EventType::BeforeUnload, EventTarget::Window));
        self.dispatch(Event::new(EventType::PageHide, EventTarget::Window));
    }

    /// Signal that the initial document has been parsed.
    pub fn content_loaded(&mut self) {
        self.dispatch(Event::new(EventType::DomContentLoaded, EventTarget::Document));
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

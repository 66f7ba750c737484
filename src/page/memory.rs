//! In-memory document
//!
//! A small arena-backed element tree implementing [`Page`]. Used by the CLI
//! demo (loaded from a JSON outline) and throughout the tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::selector::{Selector, SelectorNode};
use super::{ElementRef, Page};

const SENTENCE_MARK_STYLE: &str = "rgba(255,215,0,0.3)";

/// Serializable description of a page subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutline {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<PageOutline>,
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        style: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    attached: bool,
    /// Bumped each time the slot is reused, so old handles stay stale.
    generation: u32,
}

#[derive(Debug)]
struct Dom {
    nodes: Vec<Node>,
    root: usize,
    body: usize,
    free: Vec<usize>,
    scrolled: Option<ElementRef>,
}

impl Dom {
    fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: 0,
            body: 0,
            free: Vec::new(),
            scrolled: None,
        };
        dom.root = dom.alloc(None, element_kind("html", &[]));
        dom.push(dom.root, element_kind("head", &[]));
        dom.body = dom.push(dom.root, element_kind("body", &[]));
        dom
    }

    fn alloc(&mut self, parent: Option<usize>, kind: NodeKind) -> usize {
        let node = Node {
            kind,
            parent,
            children: Vec::new(),
            attached: true,
            generation: 0,
        };
        match self.free.pop() {
            Some(idx) => {
                let generation = self.nodes[idx].generation.wrapping_add(1);
                self.nodes[idx] = Node { generation, ..node };
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Marks a detached slot reusable. Each slot must be released once.
    fn release(&mut self, idx: usize) {
        self.nodes[idx].attached = false;
        self.free.push(idx);
    }

    fn handle(&self, idx: usize) -> ElementRef {
        ElementRef::new((u64::from(self.nodes[idx].generation) << 32) | idx as u64)
    }

    fn push(&mut self, parent: usize, kind: NodeKind) -> usize {
        let idx = self.alloc(Some(parent), kind);
        self.nodes[parent].children.push(idx);
        idx
    }

    fn insert(&mut self, parent: usize, at: usize, kind: NodeKind) -> usize {
        let idx = self.alloc(Some(parent), kind);
        let children = &mut self.nodes[parent].children;
        children.insert(at.min(children.len()), idx);
        idx
    }

    /// Resolves a handle to a live element.
    fn element(&self, el: ElementRef) -> Option<usize> {
        let idx = usize::try_from(el.id() & u64::from(u32::MAX)).ok()?;
        let generation = (el.id() >> 32) as u32;
        let node = self.nodes.get(idx)?;
        (node.attached && node.generation == generation && matches!(node.kind, NodeKind::Element { .. }))
            .then_some(idx)
    }

    fn is_element(&self, idx: usize) -> bool {
        matches!(self.nodes[idx].kind, NodeKind::Element { .. })
    }

    fn attrs(&self, idx: usize) -> Option<&BTreeMap<String, String>> {
        match self.nodes[idx].kind {
            NodeKind::Element { ref attrs, .. } => Some(attrs),
            NodeKind::Text(_) => None,
        }
    }

    fn attrs_mut(&mut self, idx: usize) -> Option<&mut BTreeMap<String, String>> {
        match self.nodes[idx].kind {
            NodeKind::Element { ref mut attrs, .. } => Some(attrs),
            NodeKind::Text(_) => None,
        }
    }

    /// Preorder walk below `idx`, excluding `idx` itself.
    fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[idx].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    fn text_of(&self, idx: usize) -> String {
        if let NodeKind::Text(ref text) = self.nodes[idx].kind {
            return text.clone();
        }
        self.descendants(idx)
            .into_iter()
            .filter_map(|i| match self.nodes[i].kind {
                NodeKind::Text(ref text) => Some(text.as_str()),
                NodeKind::Element { .. } => None,
            })
            .collect()
    }

    fn detach(&mut self, idx: usize) {
        if let Some(parent) = self.nodes[idx].parent.take() {
            self.nodes[parent].children.retain(|&c| c != idx);
        }
        let subtree = self.descendants(idx);
        self.release(idx);
        for child in subtree {
            self.release(child);
        }
    }

    /// Merges adjacent text children and drops empty ones, recursively.
    fn normalize(&mut self, idx: usize) {
        let children = std::mem::take(&mut self.nodes[idx].children);
        let mut kept: Vec<usize> = Vec::with_capacity(children.len());
        for child in children {
            let text = match self.nodes[child].kind {
                NodeKind::Text(ref text) => Some(text.clone()),
                NodeKind::Element { .. } => None,
            };
            match text {
                Some(text) if text.is_empty() => self.release(child),
                Some(text) => {
                    let merged = match kept.last() {
                        Some(&prev) => match self.nodes[prev].kind {
                            NodeKind::Text(ref mut prev_text) => {
                                prev_text.push_str(&text);
                                true
                            }
                            NodeKind::Element { .. } => false,
                        },
                        None => false,
                    };
                    if merged {
                        self.release(child);
                    } else {
                        kept.push(child);
                    }
                }
                None => {
                    self.normalize(child);
                    kept.push(child);
                }
            }
        }
        self.nodes[idx].children = kept;
    }

    fn matches(&self, idx: usize, selector: &Selector) -> bool {
        self.is_element(idx) && selector.matches(&NodeView { dom: self, idx })
    }
}

fn element_kind(tag: &str, attrs: &[(&str, &str)]) -> NodeKind {
    NodeKind::Element {
        tag: tag.to_ascii_lowercase(),
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        style: BTreeMap::new(),
    }
}

struct NodeView<'a> {
    dom: &'a Dom,
    idx: usize,
}

impl<'a> SelectorNode for NodeView<'a> {
    fn tag(&self) -> Option<&str> {
        match self.dom.nodes[self.idx].kind {
            NodeKind::Element { ref tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.dom
            .attrs(self.idx)
            .and_then(|attrs| attrs.get(name))
            .map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|list| list.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn parent(&self) -> Option<Self> {
        self.dom.nodes[self.idx].parent.map(|idx| NodeView {
            dom: self.dom,
            idx,
        })
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

/// Arena-backed [`Page`] implementation.
#[derive(Debug)]
pub struct InMemoryPage {
    dom: Mutex<Dom>,
}

impl Default for InMemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPage {
    /// Creates an empty `html > head + body` document.
    pub fn new() -> Self {
        Self {
            dom: Mutex::new(Dom::new()),
        }
    }

    /// Builds a document whose body holds `outline`.
    pub fn from_outline(outline: &[PageOutline]) -> Self {
        let page = Self::new();
        {
            let mut dom = page.dom();
            let body = dom.body;
            for node in outline {
                append_outline(&mut dom, body, node);
            }
        }
        page
    }

    /// Appends an element under `parent`, or under `body` when `parent` is
    /// stale.
    pub fn append_element(&self, parent: ElementRef, tag: &str, attrs: &[(&str, &str)]) -> ElementRef {
        let mut dom = self.dom();
        let parent = dom.element(parent).unwrap_or(dom.body);
        let idx = dom.push(parent, element_kind(tag, attrs));
        dom.handle(idx)
    }

    pub fn append_text(&self, parent: ElementRef, text: &str) {
        let mut dom = self.dom();
        if let Some(parent) = dom.element(parent) {
            dom.push(parent, NodeKind::Text(text.to_string()));
        }
    }

    /// Most recent element scrolled into view.
    pub fn last_scrolled(&self) -> Option<ElementRef> {
        self.dom().scrolled
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn append_outline(dom: &mut Dom, parent: usize, node: &PageOutline) {
    let attrs: Vec<(&str, &str)> = node
        .attrs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let idx = dom.push(parent, element_kind(&node.tag, &attrs));
    if let Some(ref text) = node.text {
        dom.push(idx, NodeKind::Text(text.clone()));
    }
    for child in &node.children {
        append_outline(dom, idx, child);
    }
}

impl Page for InMemoryPage {
    fn query_all(&self, selector: &str) -> Vec<ElementRef> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let dom = self.dom();
        std::iter::once(dom.root)
            .chain(dom.descendants(dom.root))
            .filter(|&idx| dom.matches(idx, &selector))
            .map(|idx| dom.handle(idx))
            .collect()
    }

    fn query_within(&self, scope: ElementRef, selector: &str) -> Option<ElementRef> {
        let selector = parse_selector(selector)?;
        let dom = self.dom();
        let scope = dom.element(scope)?;
        dom.descendants(scope)
            .into_iter()
            .find(|&idx| dom.matches(idx, &selector))
            .map(|idx| dom.handle(idx))
    }

    fn closest(&self, el: ElementRef, selector: &str) -> Option<ElementRef> {
        let selector = parse_selector(selector)?;
        let dom = self.dom();
        let mut current = dom.element(el);
        while let Some(idx) = current {
            if dom.matches(idx, &selector) {
                return Some(dom.handle(idx));
            }
            current = dom.nodes[idx].parent;
        }
        None
    }

    fn root(&self) -> ElementRef {
        let dom = self.dom();
        dom.handle(dom.root)
    }

    fn body(&self) -> Option<ElementRef> {
        let dom = self.dom();
        dom.nodes[dom.body]
            .attached
            .then(|| dom.handle(dom.body))
    }

    fn parent(&self, el: ElementRef) -> Option<ElementRef> {
        let dom = self.dom();
        let idx = dom.element(el)?;
        dom.nodes[idx].parent.map(|p| dom.handle(p))
    }

    fn is_attached(&self, el: ElementRef) -> bool {
        self.dom().element(el).is_some()
    }

    fn tag_name(&self, el: ElementRef) -> Option<String> {
        let dom = self.dom();
        let idx = dom.element(el)?;
        NodeView { dom: &*dom, idx }.tag().map(str::to_string)
    }

    fn attribute(&self, el: ElementRef, name: &str) -> Option<String> {
        let dom = self.dom();
        let idx = dom.element(el)?;
        dom.attrs(idx)?.get(name).cloned()
    }

    fn set_attribute(&self, el: ElementRef, name: &str, value: &str) {
        let mut dom = self.dom();
        if let Some(idx) = dom.element(el) {
            if let Some(attrs) = dom.attrs_mut(idx) {
                attrs.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn inner_text(&self, el: ElementRef) -> Option<String> {
        let dom = self.dom();
        let idx = dom.element(el)?;
        Some(dom.text_of(idx))
    }

    fn set_text(&self, el: ElementRef, text: &str) {
        let mut dom = self.dom();
        let Some(idx) = dom.element(el) else {
            return;
        };
        for child in dom.nodes[idx].children.clone() {
            dom.detach(child);
        }
        dom.push(idx, NodeKind::Text(text.to_string()));
    }

    fn has_class(&self, el: ElementRef, class: &str) -> bool {
        let dom = self.dom();
        dom.element(el)
            .map(|idx| NodeView { dom: &*dom, idx }.has_class(class))
            .unwrap_or(false)
    }

    fn add_class(&self, el: ElementRef, class: &str) {
        let mut dom = self.dom();
        let Some(attrs) = dom.element(el).and_then(|idx| dom.attrs_mut(idx)) else {
            return;
        };
        let list = attrs.entry("class".to_string()).or_default();
        if !list.split_whitespace().any(|c| c == class) {
            if !list.is_empty() {
                list.push(' ');
            }
            list.push_str(class);
        }
    }

    fn remove_class(&self, el: ElementRef, class: &str) {
        let mut dom = self.dom();
        let Some(attrs) = dom.element(el).and_then(|idx| dom.attrs_mut(idx)) else {
            return;
        };
        if let Some(list) = attrs.get_mut("class") {
            *list = list
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
            if list.is_empty() {
                attrs.remove("class");
            }
        }
    }

    fn toggle_class(&self, el: ElementRef, class: &str) -> bool {
        if self.has_class(el, class) {
            self.remove_class(el, class);
            false
        } else {
            self.add_class(el, class);
            self.has_class(el, class)
        }
    }

    fn set_style(&self, el: ElementRef, property: &str, value: &str) {
        let mut dom = self.dom();
        if let Some(idx) = dom.element(el) {
            if let NodeKind::Element { ref mut style, .. } = dom.nodes[idx].kind {
                style.insert(property.to_string(), value.to_string());
            }
        }
    }

    fn style(&self, el: ElementRef, property: &str) -> Option<String> {
        let dom = self.dom();
        let idx = dom.element(el)?;
        match dom.nodes[idx].kind {
            NodeKind::Element { ref style, .. } => style.get(property).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    fn scroll_into_view(&self, el: ElementRef) {
        let mut dom = self.dom();
        if dom.element(el).is_some() {
            dom.scrolled = Some(el);
        }
    }

    fn create_element(&self, parent: ElementRef, tag: &str) -> Option<ElementRef> {
        let mut dom = self.dom();
        let parent = dom.element(parent)?;
        let idx = dom.push(parent, element_kind(tag, &[]));
        Some(dom.handle(idx))
    }

    fn remove(&self, el: ElementRef) -> bool {
        let mut dom = self.dom();
        match dom.element(el) {
            Some(idx) if idx != dom.root => {
                dom.detach(idx);
                true
            }
            _ => false,
        }
    }

    fn mark_text(&self, container: ElementRef, needle: &str, class: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        let mut dom = self.dom();
        let Some(container) = dom.element(container) else {
            return false;
        };

        let found = dom.descendants(container).into_iter().find_map(|idx| {
            match dom.nodes[idx].kind {
                NodeKind::Text(ref text) => text.find(needle).map(|start| (idx, start)),
                NodeKind::Element { .. } => None,
            }
        });
        let Some((text_idx, start)) = found else {
            return false;
        };
        let Some(parent) = dom.nodes[text_idx].parent else {
            return false;
        };
        let Some(position) = dom.nodes[parent].children.iter().position(|&c| c == text_idx) else {
            return false;
        };

        let full = match dom.nodes[text_idx].kind {
            NodeKind::Text(ref mut text) => std::mem::take(text),
            NodeKind::Element { .. } => return false,
        };
        let (before, rest) = full.split_at(start);
        let after = &rest[needle.len()..];
        dom.nodes[text_idx].kind = NodeKind::Text(before.to_string());

        let span = dom.insert(parent, position + 1, element_kind("span", &[("class", class)]));
        if let NodeKind::Element { ref mut style, .. } = dom.nodes[span].kind {
            style.insert("background".to_string(), SENTENCE_MARK_STYLE.to_string());
            style.insert("border-radius".to_string(), "4px".to_string());
        }
        dom.push(span, NodeKind::Text(needle.to_string()));
        if !after.is_empty() {
            dom.insert(parent, position + 2, NodeKind::Text(after.to_string()));
        }
        true
    }

    fn unmark_text(&self, container: ElementRef, class: &str) {
        let Some(selector) = parse_selector(&format!("span.{class}")) else {
            return;
        };
        let mut dom = self.dom();
        let Some(container) = dom.element(container) else {
            return;
        };

        let marks: Vec<ElementRef> = dom
            .descendants(container)
            .into_iter()
            .filter(|&idx| dom.matches(idx, &selector))
            .map(|idx| dom.handle(idx))
            .collect();
        for mark in marks {
            // An outer mark may already have taken this one with it.
            let Some(mark) = dom.element(mark) else {
                continue;
            };
            let text = dom.text_of(mark);
            let Some(parent) = dom.nodes[mark].parent else {
                continue;
            };
            let position = dom.nodes[parent]
                .children
                .iter()
                .position(|&c| c == mark)
                .unwrap_or(0);
            dom.detach(mark);
            dom.insert(parent, position, NodeKind::Text(text));
        }
        dom.normalize(container);
    }
}

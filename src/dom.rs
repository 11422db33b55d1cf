use std::collections::BTreeMap;

/// The attribute source tokens carry their comma-separated symbols in.
pub const SYMBOLS_ATTR: &str = "data-symbols";

/// Opaque handle for an element in a `Document`.  Handles are only
/// meaningful for the document that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn new(index: usize) -> Self {
        ElementId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// The subset of CSS selectors we need to find the containers a click
/// happened inside of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector<'s> {
    Tag(&'s str),
    Class(&'s str),
    HasAttr(&'s str),
}

/// The page the menu and highlighting operate on.  This is everything we
/// need from a DOM; the rendering side of things lives elsewhere.
pub trait Document {
    /// All elements in document order.
    fn elements(&self) -> Vec<ElementId>;
    fn tag_name(&self, elem: ElementId) -> &str;
    fn attr(&self, elem: ElementId, name: &str) -> Option<&str>;
    fn has_class(&self, elem: ElementId, class: &str) -> bool;
    /// The concatenated text of the element and all of its descendants.
    fn text_content(&self, elem: ElementId) -> String;
    fn parent(&self, elem: ElementId) -> Option<ElementId>;
    fn first_child(&self, elem: ElementId) -> Option<ElementId>;
    fn previous_sibling(&self, elem: ElementId) -> Option<ElementId>;
    fn get_element_by_id(&self, id: &str) -> Option<ElementId>;
    /// Adding a class an element already has is a no-op.
    fn add_classes(&mut self, elem: ElementId, classes: &[String]);
    fn remove_classes(&mut self, elem: ElementId, classes: &[String]);

    /// The element's id, treating an empty id as no id.
    fn element_id(&self, elem: ElementId) -> Option<&str> {
        self.attr(elem, "id").filter(|id| !id.is_empty())
    }

    fn symbols_attr(&self, elem: ElementId) -> Option<&str> {
        self.attr(elem, SYMBOLS_ATTR)
    }

    fn matches(&self, elem: ElementId, selector: Selector) -> bool {
        match selector {
            Selector::Tag(tag) => self.tag_name(elem) == tag,
            Selector::Class(class) => self.has_class(elem, class),
            Selector::HasAttr(name) => self.attr(elem, name).is_some(),
        }
    }

    /// Like DOM `closest`: the element itself or its nearest ancestor that
    /// matches.
    fn closest(&self, elem: ElementId, selector: Selector) -> Option<ElementId> {
        let mut cur = Some(elem);
        while let Some(candidate) = cur {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            cur = self.parent(candidate);
        }
        None
    }

    fn closest_symbol_token(&self, elem: ElementId) -> Option<ElementId> {
        self.closest(elem, Selector::HasAttr(SYMBOLS_ATTR))
    }

    /// `span[data-symbols]` in document order.
    fn symbol_spans(&self) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|elem| {
                self.tag_name(*elem) == "span" && self.attr(*elem, SYMBOLS_ATTR).is_some()
            })
            .collect()
    }
}

#[derive(Debug)]
struct DomNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl DomNode {
    fn new(tag: &str, parent: Option<ElementId>) -> Self {
        DomNode {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            classes: vec![],
            text: String::new(),
            parent,
            children: vec![],
        }
    }
}

/// A minimal in-memory document.  Each element holds its own text ahead of
/// its children, which is all our source listings and diagrams need.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

impl Default for DomTree {
    fn default() -> Self {
        DomTree::new()
    }
}

impl DomTree {
    /// A document with just a `body`.
    pub fn new() -> Self {
        DomTree {
            nodes: vec![DomNode::new("body", None)],
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn node(&self, elem: ElementId) -> &DomNode {
        &self.nodes[elem.0]
    }

    fn node_mut(&mut self, elem: ElementId) -> &mut DomNode {
        &mut self.nodes[elem.0]
    }

    pub fn append(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let elem = ElementId(self.nodes.len());
        self.nodes.push(DomNode::new(tag, Some(parent)));
        self.node_mut(parent).children.push(elem);
        elem
    }

    pub fn set_attr(&mut self, elem: ElementId, name: &str, value: &str) -> &mut Self {
        if name == "class" {
            self.node_mut(elem).classes = value.split_whitespace().map(String::from).collect();
        } else {
            self.node_mut(elem)
                .attrs
                .insert(name.to_string(), value.to_string());
        }
        self
    }

    pub fn set_id(&mut self, elem: ElementId, id: &str) -> &mut Self {
        self.set_attr(elem, "id", id)
    }

    pub fn set_text(&mut self, elem: ElementId, text: &str) -> &mut Self {
        self.node_mut(elem).text = text.to_string();
        self
    }

    /// Append a source token: `<span data-symbols="...">text</span>`.
    pub fn append_symbol_span(&mut self, parent: ElementId, symbols: &str, text: &str) -> ElementId {
        let span = self.append(parent, "span");
        self.set_attr(span, SYMBOLS_ATTR, symbols).set_text(span, text);
        span
    }

    pub fn class_list(&self, elem: ElementId) -> &[String] {
        &self.node(elem).classes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_preorder(&self, elem: ElementId, out: &mut Vec<ElementId>) {
        out.push(elem);
        for child in &self.node(elem).children {
            self.collect_preorder(*child, out);
        }
    }

    fn collect_text(&self, elem: ElementId, out: &mut String) {
        let node = self.node(elem);
        out.push_str(&node.text);
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }
}

impl Document for DomTree {
    fn elements(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect_preorder(self.root(), &mut out);
        out
    }

    fn tag_name(&self, elem: ElementId) -> &str {
        &self.node(elem).tag
    }

    fn attr(&self, elem: ElementId, name: &str) -> Option<&str> {
        self.node(elem).attrs.get(name).map(|value| value.as_str())
    }

    fn has_class(&self, elem: ElementId, class: &str) -> bool {
        self.node(elem).classes.iter().any(|c| c == class)
    }

    fn text_content(&self, elem: ElementId) -> String {
        let mut text = String::new();
        self.collect_text(elem, &mut text);
        text
    }

    fn parent(&self, elem: ElementId) -> Option<ElementId> {
        self.node(elem).parent
    }

    fn first_child(&self, elem: ElementId) -> Option<ElementId> {
        self.node(elem).children.first().copied()
    }

    fn previous_sibling(&self, elem: ElementId) -> Option<ElementId> {
        let parent = self.parent(elem)?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|sib| *sib == elem)?;
        if pos == 0 {
            None
        } else {
            Some(siblings[pos - 1])
        }
    }

    fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        if id.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|elem| self.attr(*elem, "id") == Some(id))
    }

    fn add_classes(&mut self, elem: ElementId, classes: &[String]) {
        let node = self.node_mut(elem);
        for class in classes {
            if !node.classes.contains(class) {
                node.classes.push(class.clone());
            }
        }
    }

    fn remove_classes(&mut self, elem: ElementId, classes: &[String]) {
        self.node_mut(elem)
            .classes
            .retain(|class| !classes.contains(class));
    }
}

use ustr::{ustr, Ustr, UstrSet};

use crate::dom::{Document, ElementId};
use crate::file_format::graph_extra::GraphAdjacency;

pub const HOVERED_CLASS: &str = "hovered";
pub const CUR_NODE_CLASS: &str = "hovered-cur-node";
pub const IN_NODE_CLASS: &str = "hovered-in-node";
pub const OUT_NODE_CLASS: &str = "hovered-out-node";
pub const IN_EDGE_CLASS: &str = "hovered-in-edge";
pub const OUT_EDGE_CLASS: &str = "hovered-out-edge";

/// Table-like diagram nodes put their id on a wrapping `g` with this prefix.
pub const TABLE_ROW_ID_PREFIX: &str = "a_";

/// Only the primary button clears a sticky highlight; scrolling with the
/// middle button shouldn't.
pub const PRIMARY_BUTTON: i16 = 0;

/// Split a `data-symbols` attribute value.  `"?"` is a legacy sentinel the
/// page uses for "no symbols" that we preserve without knowing its origin.
pub fn symbols_from_string(symbol_str: Option<&str>) -> Vec<Ustr> {
    match symbol_str {
        None | Some("") | Some("?") => vec![],
        Some(symbol_str) => symbol_str.split(',').map(ustr).collect(),
    }
}

/// Highlighting of every occurrence of the hovered symbol in the source
/// listing plus, for diagrams, the hovered node's neighborhood.
#[derive(Debug, Default)]
pub struct Hover {
    items: Vec<ElementId>,
    /// Diagram elements we styled along with exactly the classes we added,
    /// because those elements can also carry classes that aren't ours.
    graph_items: Vec<(ElementId, Vec<String>)>,
    hovered_elem: Option<ElementId>,
    sticky: bool,
}

impl Hover {
    pub fn new() -> Self {
        Hover::default()
    }

    pub fn items(&self) -> &[ElementId] {
        &self.items
    }

    pub fn graph_items(&self) -> &[(ElementId, Vec<String>)] {
        &self.graph_items
    }

    pub fn hovered_elem(&self) -> Option<ElementId> {
        self.hovered_elem
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Spans whose text is exactly `visible_token` and which share at least
    /// one symbol with `symbols`.  The text check alone would also catch
    /// unrelated tokens that happen to be spelled the same.
    pub fn find_references<D: Document + ?Sized>(
        doc: &D,
        symbols: &[Ustr],
        visible_token: &str,
    ) -> Vec<ElementId> {
        if symbols.is_empty() {
            return vec![];
        }
        let wanted: UstrSet = symbols.iter().copied().collect();
        doc.symbol_spans()
            .into_iter()
            .filter(|span| {
                doc.text_content(*span) == visible_token
                    && symbols_from_string(doc.symbols_attr(*span))
                        .iter()
                        .any(|sym| wanted.contains(sym))
            })
            .collect()
    }

    pub fn deactivate<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let hovered = [HOVERED_CLASS.to_string()];
        for item in self.items.drain(..) {
            doc.remove_classes(item, &hovered);
        }
        self.hovered_elem = None;
        self.sticky = false;
    }

    pub fn activate<D: Document + ?Sized>(&mut self, doc: &mut D, symbols: &[Ustr], visible_token: &str) {
        self.deactivate(doc);
        self.items = Self::find_references(doc, symbols, visible_token);
        trace!(count = self.items.len(), token = visible_token, "highlighting");
        let hovered = [HOVERED_CLASS.to_string()];
        for item in &self.items {
            doc.add_classes(*item, &hovered);
        }
    }

    fn style_graph_element<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        elem: ElementId,
        classes: Vec<String>,
    ) {
        doc.add_classes(elem, &classes);
        self.graph_items.push((elem, classes));
    }

    /// Neighbors are found by id, or for table rows via their `a_` wrapper's
    /// only child.  Anything we can't find is skipped.
    fn style_graph_neighbor<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        target_id: &str,
        classes: Vec<String>,
    ) {
        let target = match doc.get_element_by_id(target_id) {
            Some(target) => Some(target),
            None => doc
                .get_element_by_id(&format!("{}{}", TABLE_ROW_ID_PREFIX, target_id))
                .and_then(|wrapper| doc.first_child(wrapper)),
        };
        match target {
            Some(target) => self.style_graph_element(doc, target, classes),
            None => trace!(id = target_id, "diagram neighbor not in document"),
        }
    }

    pub fn activate_diagram<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        graph: &GraphAdjacency,
        elem: ElementId,
    ) {
        self.deactivate_diagram(doc);

        let raw_id = match doc
            .element_id(elem)
            .or_else(|| doc.parent(elem).and_then(|parent| doc.element_id(parent)))
        {
            Some(id) => id.to_string(),
            None => {
                trace!(elem = elem.index(), "diagram element without an id");
                return;
            }
        };
        let id = raw_id
            .strip_prefix(TABLE_ROW_ID_PREFIX)
            .unwrap_or(&raw_id);
        let node_extra = match graph.node(id) {
            Some(node_extra) => node_extra,
            None => {
                trace!(id, "no adjacency for diagram node");
                return;
            }
        };

        self.style_graph_element(doc, elem, vec![CUR_NODE_CLASS.to_string()]);

        for (nid, classes) in &node_extra.in_nodes {
            let classes = if classes.is_empty() {
                vec![IN_NODE_CLASS.to_string()]
            } else {
                classes.clone()
            };
            self.style_graph_neighbor(doc, nid, classes);
        }
        for (nid, classes) in &node_extra.out_nodes {
            let classes = if classes.is_empty() {
                vec![OUT_NODE_CLASS.to_string()]
            } else {
                classes.clone()
            };
            self.style_graph_neighbor(doc, nid, classes);
        }
        for eid in &node_extra.in_edges {
            self.style_graph_neighbor(doc, eid, vec![IN_EDGE_CLASS.to_string()]);
        }
        for eid in &node_extra.out_edges {
            self.style_graph_neighbor(doc, eid, vec![OUT_EDGE_CLASS.to_string()]);
        }
    }

    pub fn deactivate_diagram<D: Document + ?Sized>(&mut self, doc: &mut D) {
        for (item, classes) in self.graph_items.drain(..) {
            doc.remove_classes(item, &classes);
        }
    }

    /// Highlight and stay highlighted until the next primary mouse-down.
    /// Hiding the menu is the caller's business since we don't own it.
    pub fn sticky_highlight<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        symbols: &[Ustr],
        visible_token: &str,
    ) {
        self.activate(doc, symbols, visible_token);
        self.sticky = true;
    }

    pub fn handle_mouse_down<D: Document + ?Sized>(&mut self, doc: &mut D, button: i16) {
        if self.sticky && button == PRIMARY_BUTTON {
            self.deactivate_diagram(doc);
            self.deactivate(doc);
        }
    }

    /// `target` is whatever the pointer is over.  Nothing happens while a
    /// menu is up or a sticky highlight is in place.
    pub fn handle_mouse_move<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        graph: Option<&GraphAdjacency>,
        target: Option<ElementId>,
        menu_active: bool,
    ) {
        if menu_active || self.sticky {
            return;
        }

        let elem = target.and_then(|target| doc.closest_symbol_token(target));
        if elem == self.hovered_elem {
            return;
        }
        let elem = match elem {
            Some(elem) => elem,
            None => {
                self.deactivate_diagram(doc);
                self.deactivate(doc);
                return;
            }
        };

        let symbols = symbols_from_string(doc.symbols_attr(elem));
        if doc.tag_name(elem) == "g" {
            if let Some(graph) = graph {
                self.activate_diagram(doc, graph, elem);
            }
        }

        let text = doc.text_content(elem);
        self.activate(doc, &symbols, &text);
        self.hovered_elem = Some(elem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use serde_json::json;

    fn classes(doc: &DomTree, elem: ElementId) -> Vec<&str> {
        doc.class_list(elem).iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn test_symbols_from_string() {
        assert!(symbols_from_string(None).is_empty());
        assert!(symbols_from_string(Some("")).is_empty());
        assert!(symbols_from_string(Some("?")).is_empty());
        assert_eq!(
            symbols_from_string(Some("S1,S2")),
            vec![ustr("S1"), ustr("S2")]
        );
    }

    /// Three `foo` tokens, two of which are the same symbol, plus an
    /// unrelated `bar`.
    fn listing() -> (DomTree, Vec<ElementId>) {
        let mut doc = DomTree::new();
        let code = doc.append(doc.root(), "code");
        let spans = vec![
            doc.append_symbol_span(code, "S1", "foo"),
            doc.append_symbol_span(code, "S2", "foo"),
            doc.append_symbol_span(code, "S0,S1", "foo"),
            doc.append_symbol_span(code, "S1", "bar"),
            doc.append_symbol_span(code, "?", "foo"),
        ];
        (doc, spans)
    }

    #[test]
    fn test_activate_requires_text_and_symbol_match() {
        let (mut doc, spans) = listing();
        let mut hover = Hover::new();
        hover.activate(&mut doc, &[ustr("S1")], "foo");
        assert_eq!(hover.items(), &[spans[0], spans[2]]);
        assert_eq!(classes(&doc, spans[0]), vec!["hovered"]);
        assert!(classes(&doc, spans[1]).is_empty());
        assert!(classes(&doc, spans[3]).is_empty());

        hover.deactivate(&mut doc);
        assert!(hover.items().is_empty());
        assert!(spans.iter().all(|span| doc.class_list(*span).is_empty()));
    }

    #[test]
    fn test_no_symbols_highlights_nothing() {
        let (mut doc, _) = listing();
        let mut hover = Hover::new();
        hover.activate(&mut doc, &[], "foo");
        assert!(hover.items().is_empty());
    }

    #[test]
    fn test_mouse_move_memoizes_and_clears() {
        let (mut doc, spans) = listing();
        let mut hover = Hover::new();
        hover.handle_mouse_move(&mut doc, None, Some(spans[1]), false);
        assert_eq!(hover.items(), &[spans[1]]);
        assert_eq!(hover.hovered_elem(), Some(spans[1]));

        // Same element again: nothing is recomputed, even if someone else
        // cleared our styling in the meantime.
        doc.remove_classes(spans[1], &[HOVERED_CLASS.to_string()]);
        hover.handle_mouse_move(&mut doc, None, Some(spans[1]), false);
        assert!(doc.class_list(spans[1]).is_empty());

        // Moving off of symbols clears everything.
        let root = doc.root();
        hover.handle_mouse_move(&mut doc, None, Some(root), false);
        assert!(hover.items().is_empty());
        assert_eq!(hover.hovered_elem(), None);
    }

    #[test]
    fn test_mouse_move_ignored_while_menu_open() {
        let (mut doc, spans) = listing();
        let mut hover = Hover::new();
        hover.handle_mouse_move(&mut doc, None, Some(spans[0]), true);
        assert!(hover.items().is_empty());
        assert_eq!(hover.hovered_elem(), None);
    }

    #[test]
    fn test_sticky_survives_moves_until_primary_mouse_down() {
        let (mut doc, spans) = listing();
        let mut hover = Hover::new();
        hover.sticky_highlight(&mut doc, &[ustr("S1")], "foo");
        assert!(hover.is_sticky());

        hover.handle_mouse_move(&mut doc, None, Some(spans[1]), false);
        hover.handle_mouse_move(&mut doc, None, None, false);
        assert_eq!(hover.items(), &[spans[0], spans[2]]);

        // Middle button doesn't count.
        hover.handle_mouse_down(&mut doc, 1);
        assert!(hover.is_sticky());
        assert_eq!(classes(&doc, spans[2]), vec!["hovered"]);

        hover.handle_mouse_down(&mut doc, PRIMARY_BUTTON);
        assert!(!hover.is_sticky());
        assert!(hover.items().is_empty());
        assert!(classes(&doc, spans[2]).is_empty());
    }

    /// A diagram where node `N1` has two in-neighbors (one a plain node, one a
    /// table row) and one out-edge.
    fn diagram() -> (DomTree, GraphAdjacency, ElementId, Vec<ElementId>) {
        let mut doc = DomTree::new();
        let svg = doc.append(doc.root(), "svg");

        let n1 = doc.append(svg, "g");
        doc.set_id(n1, "N1")
            .set_attr(n1, "data-symbols", "S1")
            .set_attr(n1, "class", "node");
        let label = doc.append(n1, "text");
        doc.set_text(label, "Foo::run");

        let n2 = doc.append(svg, "g");
        doc.set_id(n2, "N2").set_attr(n2, "class", "node");

        let wrapper = doc.append(svg, "g");
        doc.set_id(wrapper, "a_N3");
        let row = doc.append(wrapper, "g");
        doc.set_attr(row, "class", "row");

        let edge = doc.append(svg, "g");
        doc.set_id(edge, "E1");

        let graph = GraphAdjacency::from_json_str(
            &json!([{
                "nodes": {
                    "N1": {
                        "in_nodes": [["N2", []], ["N3", []], ["MISSING", []]],
                        "out_nodes": [],
                        "in_edges": [],
                        "out_edges": ["E1"],
                    },
                },
            }])
            .to_string(),
        )
        .unwrap();

        (doc, graph, n1, vec![n2, row, edge])
    }

    #[test]
    fn test_activate_diagram_is_fully_reverted() {
        let (mut doc, graph, n1, others) = diagram();
        let mut hover = Hover::new();
        hover.activate_diagram(&mut doc, &graph, n1);

        assert_eq!(classes(&doc, n1), vec!["node", "hovered-cur-node"]);
        assert_eq!(classes(&doc, others[0]), vec!["node", "hovered-in-node"]);
        assert_eq!(classes(&doc, others[1]), vec!["row", "hovered-in-node"]);
        assert_eq!(classes(&doc, others[2]), vec!["hovered-out-edge"]);
        // The node itself plus the three neighbors we could find.
        assert_eq!(hover.graph_items().len(), 4);

        hover.deactivate_diagram(&mut doc);
        assert!(hover.graph_items().is_empty());
        assert_eq!(classes(&doc, n1), vec!["node"]);
        assert_eq!(classes(&doc, others[0]), vec!["node"]);
        assert_eq!(classes(&doc, others[1]), vec!["row"]);
        assert!(classes(&doc, others[2]).is_empty());
    }

    #[test]
    fn test_activate_diagram_via_child_and_custom_classes() {
        let (mut doc, _, n1, others) = diagram();
        let graph = GraphAdjacency::from_json_str(
            r#"{ "nodes": { "N1": { "out_nodes": [["N2", ["hovered-subclass"]]] } } }"#,
        )
        .unwrap();
        let mut hover = Hover::new();
        // An element without an id falls back to its parent's.
        let label = doc.first_child(n1).unwrap();
        hover.activate_diagram(&mut doc, &graph, label);
        assert_eq!(classes(&doc, label), vec!["hovered-cur-node"]);
        assert_eq!(classes(&doc, others[0]), vec!["node", "hovered-subclass"]);
    }

    #[test]
    fn test_activate_diagram_unknown_node_is_noop() {
        let (mut doc, graph, _, others) = diagram();
        let mut hover = Hover::new();
        hover.activate_diagram(&mut doc, &graph, others[0]);
        assert!(hover.graph_items().is_empty());
        assert_eq!(classes(&doc, others[0]), vec!["node"]);
    }

    #[test]
    fn test_hovering_diagram_node() {
        let (mut doc, graph, n1, others) = diagram();
        let code = doc.append(doc.root(), "code");
        let span = doc.append_symbol_span(code, "S1", "Foo::run");
        let mut hover = Hover::new();

        let label = doc.first_child(n1).unwrap();
        hover.handle_mouse_move(&mut doc, Some(&graph), Some(label), false);
        assert_eq!(hover.hovered_elem(), Some(n1));
        assert_eq!(hover.items(), &[span]);
        assert_eq!(classes(&doc, others[2]), vec!["hovered-out-edge"]);

        hover.handle_mouse_move(&mut doc, Some(&graph), None, false);
        assert!(hover.graph_items().is_empty());
        assert!(classes(&doc, span).is_empty());
    }
}

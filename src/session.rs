use ustr::Ustr;

use crate::context_menu::{ClickContext, ContextMenu, NoopSink, SelectedTokenSink};
use crate::dom::{Document, ElementId};
use crate::file_format::config::{RouteContext, Settings};
use crate::file_format::graph_extra::GraphAdjacency;
use crate::file_format::sym_info::SymbolIndex;
use crate::hover::Hover;
use crate::menu::resolver::SymbolActionResolver;
use crate::menu::MenuAction;

/// One page's worth of interaction state.  The menu and the hover engine are
/// the only things that change; the index, the diagram adjacency and the
/// settings are read-only for the life of the page.
pub struct Session<D: Document> {
    doc: D,
    index: SymbolIndex,
    graph: Option<GraphAdjacency>,
    settings: Settings,
    route: RouteContext,
    menu: ContextMenu,
    hover: Hover,
    sink: Box<dyn SelectedTokenSink>,
}

impl<D: Document> Session<D> {
    pub fn new(doc: D, index: SymbolIndex, settings: Settings, route: RouteContext) -> Self {
        Session {
            doc,
            index,
            graph: None,
            settings,
            route,
            menu: ContextMenu::new(),
            hover: Hover::new(),
            sink: Box::new(NoopSink),
        }
    }

    /// Only diagram pages have adjacency data.
    pub fn with_graph(mut self, graph: GraphAdjacency) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn SelectedTokenSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn doc(&self) -> &D {
        &self.doc
    }

    pub fn menu(&self) -> &ContextMenu {
        &self.menu
    }

    pub fn hover(&self) -> &Hover {
        &self.hover
    }

    pub fn on_click(&mut self, click: &ClickContext) -> bool {
        let resolver = SymbolActionResolver::new(&self.index, &self.settings, &self.route);
        self.menu
            .try_show_on_click(&mut self.doc, &resolver, click, &mut *self.sink)
    }

    pub fn on_mouse_move(&mut self, target: Option<ElementId>) {
        self.hover.handle_mouse_move(
            &mut self.doc,
            self.graph.as_ref(),
            target,
            self.menu.is_active(),
        );
    }

    /// Mouse-downs on the menu itself are swallowed so its links keep
    /// working; anywhere else hides the menu.
    pub fn on_mouse_down(&mut self, button: i16, on_menu: bool) {
        if on_menu {
            return;
        }
        self.menu.hide();
        self.hover.handle_mouse_down(&mut self.doc, button);
    }

    /// Coming back to the page through the history cache shouldn't resurrect
    /// a stale menu.
    pub fn on_page_show(&mut self) {
        self.menu.hide();
    }

    /// Click on an action row of the current menu.  Returns whether an action
    /// actually ran.
    pub fn activate_row(&mut self, row: usize) -> bool {
        match self.menu.take_action(row) {
            Some(MenuAction::StickyHighlight {
                symbols,
                token_text,
            }) => {
                self.sticky_highlight(&symbols, &token_text);
                true
            }
            None => false,
        }
    }

    pub fn sticky_highlight(&mut self, symbols: &[Ustr], visible_token: &str) {
        self.menu.hide();
        self.hover
            .sticky_highlight(&mut self.doc, symbols, visible_token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::menu::MenuIcon;
    use serde_json::json;

    struct Page {
        session: Session<DomTree>,
        spans: Vec<ElementId>,
    }

    /// `foo` used twice and an unrelated `foo` in a different scope.
    fn page() -> Page {
        let mut doc = DomTree::new();
        let code = doc.append(doc.root(), "code");
        let spans = vec![
            doc.append_symbol_span(code, "S_foo", "foo"),
            doc.append_symbol_span(code, "S_other_foo", "foo"),
            doc.append_symbol_span(code, "S_foo", "foo"),
        ];
        let index = SymbolIndex::from_value(json!({
            "S_foo": { "sym": "S_foo", "pretty": "foo", "jumps": { "def": "a.cpp#1" } },
        }))
        .unwrap();
        let session = Session::new(
            doc,
            index,
            Settings::default(),
            RouteContext::new("tests").with_source_path("b.cpp"),
        );
        Page { session, spans }
    }

    fn hovered(page: &Page) -> Vec<ElementId> {
        page.spans
            .iter()
            .copied()
            .filter(|span| page.session.doc().has_class(*span, "hovered"))
            .collect()
    }

    #[test]
    fn test_hover_is_suppressed_while_menu_is_open() {
        let mut page = page();
        assert!(page.session.on_click(&ClickContext::new(page.spans[0])));
        page.session.on_mouse_move(Some(page.spans[0]));
        assert!(hovered(&page).is_empty());

        page.session.on_mouse_down(0, false);
        assert!(!page.session.menu().is_active());
        page.session.on_mouse_move(Some(page.spans[0]));
        assert_eq!(hovered(&page), vec![page.spans[0], page.spans[2]]);
    }

    #[test]
    fn test_sticky_highlight_from_menu() {
        let mut page = page();
        page.session.on_click(&ClickContext::new(page.spans[2]));
        let row = page
            .session
            .menu()
            .rows()
            .iter()
            .position(|row| row.item.icon == MenuIcon::Tasks)
            .unwrap();

        // Mouse-downs on the menu don't dismiss it.
        page.session.on_mouse_down(0, true);
        assert!(page.session.menu().is_active());

        assert!(page.session.activate_row(row));
        assert!(!page.session.menu().is_active());
        assert!(page.session.hover().is_sticky());
        assert_eq!(hovered(&page), vec![page.spans[0], page.spans[2]]);
        // Armed once.
        assert!(!page.session.activate_row(row));

        // Hovering the unrelated token changes nothing.
        page.session.on_mouse_move(Some(page.spans[1]));
        assert_eq!(hovered(&page), vec![page.spans[0], page.spans[2]]);

        // Non-primary buttons hide nothing either.
        page.session.on_mouse_down(1, false);
        assert_eq!(hovered(&page), vec![page.spans[0], page.spans[2]]);

        page.session.on_mouse_down(0, false);
        assert!(hovered(&page).is_empty());
        assert!(!page.session.hover().is_sticky());
    }

    struct CountingSink(std::rc::Rc<std::cell::Cell<usize>>);

    impl SelectedTokenSink for CountingSink {
        fn on_selected_token_changed(&mut self, _token: Option<ElementId>) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_diagram_page() {
        let mut doc = DomTree::new();
        let svg = doc.append(doc.root(), "svg");
        let node = doc.append(svg, "g");
        doc.set_id(node, "Gnode1").set_attr(node, "data-symbols", "S_foo");
        let caller = doc.append(svg, "g");
        doc.set_id(caller, "Gnode2");
        let graph = GraphAdjacency::from_json_str(
            r#"{ "nodes": { "Gnode1": { "in_nodes": [["Gnode2", []]] } } }"#,
        )
        .unwrap();
        let notified = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut session = Session::new(
            doc,
            SymbolIndex::default(),
            Settings::all_enabled(),
            RouteContext::new("tests"),
        )
        .with_graph(graph)
        .with_sink(Box::new(CountingSink(notified.clone())));

        session.on_mouse_move(Some(node));
        assert!(session.doc().has_class(caller, "hovered-in-node"));
        session.on_mouse_move(None);
        assert!(!session.doc().has_class(caller, "hovered-in-node"));

        // Unknown symbols still get a sticky highlight offer, and the fancy
        // bar selects the node.
        assert!(session.on_click(&ClickContext::new(node)));
        assert_eq!(notified.get(), 1);
        assert_eq!(session.menu().rows().len(), 1);
    }

    #[test]
    fn test_page_show_hides_menu() {
        let mut page = page();
        page.session.on_click(&ClickContext::new(page.spans[0]));
        assert!(page.session.menu().is_active());
        page.session.on_page_show();
        assert!(!page.session.menu().is_active());
    }
}

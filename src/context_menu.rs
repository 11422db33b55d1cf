use crate::dom::{Document, ElementId, Selector};
use crate::menu::resolver::{SymbolActionResolver, SymbolToken};
use crate::menu::{layout_rows, MenuAction, MenuItem, MenuTarget, RowBoundary};

/// Class applied to the fancy-bar's selected token.
pub const SELECTED_CLASS: &str = "selected";

/// Clicks outside of these never produce a menu: source listings, diagrams,
/// breadcrumbs and the symbol tree.
const SYMBOL_CONTAINERS: [Selector<'static>; 4] = [
    Selector::Tag("code"),
    Selector::Tag("svg"),
    Selector::Class("breadcrumbs"),
    Selector::Class("symbol-tree-table"),
];

const LINE_NUMBER_ATTR: &str = "data-line-number";

/// Gets told whenever the fancy-bar's selected token changes.
pub trait SelectedTokenSink {
    fn on_selected_token_changed(&mut self, token: Option<ElementId>);
}

pub struct NoopSink;

impl SelectedTokenSink for NoopSink {
    fn on_selected_token_changed(&mut self, _token: Option<ElementId>) {}
}

/// Everything about a click that isn't in the document itself.
#[derive(Clone, Debug)]
pub struct ClickContext {
    pub target: ElementId,
    /// Clicking while text is selected is probably the user selecting
    /// things, and a menu would undo that.
    pub selection_collapsed: bool,
    pub on_panel: bool,
    /// The word under the caret, see `target_word`.
    pub target_word: Option<String>,
}

impl ClickContext {
    pub fn new(target: ElementId) -> Self {
        ClickContext {
            target,
            selection_collapsed: true,
            on_panel: false,
            target_word: None,
        }
    }

    pub fn with_target_word(mut self, word: &str) -> Self {
        self.target_word = Some(word.to_string());
        self
    }
}

#[derive(Clone, Debug)]
pub struct MenuRow {
    pub item: MenuItem,
    pub boundary: RowBoundary,
    /// Actions only fire once per rendering of the row.
    armed: bool,
}

impl MenuRow {
    pub fn row_classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["contextmenu-row"];
        classes.extend(self.boundary.css_class());
        classes
    }

    pub fn link_classes(&self) -> Vec<String> {
        vec!["contextmenu-link".to_string(), self.item.icon.css_class()]
    }

    /// Actions get a dummy href so they still render as links.
    pub fn link_href(&self) -> &str {
        self.item.href().unwrap_or("#")
    }
}

#[derive(Debug, Default)]
pub struct ContextMenu {
    selected_token: Option<ElementId>,
    rows: Vec<MenuRow>,
    active: bool,
}

impl ContextMenu {
    pub fn new() -> Self {
        ContextMenu::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hide(&mut self) {
        self.active = false;
    }

    pub fn rows(&self) -> &[MenuRow] {
        &self.rows
    }

    pub fn selected_token(&self) -> Option<ElementId> {
        self.selected_token
    }

    /// The source line the click was on, as a jump-style location, found via
    /// the line number element that precedes each line's `code`.
    fn clicked_line<D: Document + ?Sized>(
        doc: &D,
        resolver: &SymbolActionResolver,
        target: ElementId,
    ) -> Option<String> {
        let line = doc.closest(target, Selector::Tag("code"))?;
        let line_number = doc.previous_sibling(line)?;
        let lineno = doc.attr(line_number, LINE_NUMBER_ATTR)?;
        resolver.route().line_location(lineno)
    }

    /// Returns whether a menu is now showing.
    pub fn try_show_on_click<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        resolver: &SymbolActionResolver,
        click: &ClickContext,
        sink: &mut dyn SelectedTokenSink,
    ) -> bool {
        let fancy_bar = resolver.settings().fancy_bar.enabled;
        if fancy_bar && !click.on_panel {
            if let Some(selected) = self.selected_token.take() {
                doc.remove_classes(selected, &[SELECTED_CLASS.to_string()]);
                sink.on_selected_token_changed(None);
            }
        }

        if !click.selection_collapsed {
            return false;
        }
        if !SYMBOL_CONTAINERS
            .iter()
            .any(|selector| doc.closest(click.target, *selector).is_some())
        {
            return false;
        }

        let clicked_line = Self::clicked_line(&*doc, resolver, click.target);

        let token = match doc.closest_symbol_token(click.target) {
            Some(elem) => {
                if fancy_bar {
                    self.selected_token = Some(elem);
                    doc.add_classes(elem, &[SELECTED_CLASS.to_string()]);
                    sink.on_selected_token_changed(Some(elem));
                }
                Some(SymbolToken::from_attribute(
                    doc.symbols_attr(elem).unwrap_or_default(),
                    &doc.text_content(elem),
                ))
            }
            None => None,
        };

        let items = resolver.resolve_menu(
            token.as_ref(),
            clicked_line.as_deref(),
            click.target_word.as_deref(),
        );
        if items.is_empty() {
            return false;
        }

        let boundaries = layout_rows(&items);
        self.rows = items
            .into_iter()
            .zip(boundaries)
            .map(|(item, boundary)| MenuRow {
                item,
                boundary,
                armed: true,
            })
            .collect();
        self.active = true;
        debug!(rows = self.rows.len(), line = ?clicked_line, "showing context menu");
        true
    }

    /// The in-page action behind a row, the first time it's asked for.
    pub fn take_action(&mut self, row: usize) -> Option<MenuAction> {
        let row = self.rows.get_mut(row)?;
        if !row.armed {
            return None;
        }
        match &row.item.target {
            MenuTarget::Action(action) => {
                row.armed = false;
                Some(action.clone())
            }
            MenuTarget::Href(_) => None,
        }
    }
}

/// Where to put a menu of a known height for a click.  Coordinates are in
/// CSS pixels; `top` and `left` are document-relative, `bottom` is measured
/// up from the bottom of the viewport-sized box the page sits in.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuPlacement {
    pub left: f64,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub max_height: Option<f64>,
    /// Opens upward from the click.
    pub flipped: bool,
}

impl MenuPlacement {
    /// Open downward.  If that overflows and there's more room above, open
    /// upward instead; whichever way it opens, clamp the height to the room
    /// available when it still overflows.
    pub fn compute(
        client_x: f64,
        client_y: f64,
        scroll_x: f64,
        scroll_y: f64,
        viewport_height: f64,
        menu_height: f64,
    ) -> Self {
        let x = client_x + scroll_x;
        let y = client_y + scroll_y;
        let space_below = viewport_height - client_y;
        let space_above = viewport_height - space_below;

        let mut placement = MenuPlacement {
            left: x,
            top: Some(y),
            bottom: None,
            max_height: None,
            flipped: false,
        };
        if menu_height > space_below {
            if space_above > space_below {
                placement.flipped = true;
                placement.top = None;
                placement.bottom = Some(viewport_height - y);
                if menu_height > space_above {
                    placement.max_height = Some(space_above);
                }
            } else {
                placement.max_height = Some(space_below);
            }
        }
        placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::file_format::config::{RouteContext, Settings};
    use crate::file_format::sym_info::SymbolIndex;
    use crate::menu::{MenuIcon, MenuSection};
    use serde_json::json;
    use ustr::ustr;

    #[derive(Default)]
    struct RecordingSink(Vec<Option<ElementId>>);

    impl SelectedTokenSink for RecordingSink {
        fn on_selected_token_changed(&mut self, token: Option<ElementId>) {
            self.0.push(token);
        }
    }

    fn index() -> SymbolIndex {
        SymbolIndex::from_value(json!({
            "S_foo": {
                "sym": "S_foo",
                "pretty": "ns::foo",
                "jumps": { "def": "a.cpp#3", "decl": "a.h#1" },
            },
        }))
        .unwrap()
    }

    /// A two-line listing: line 2 uses `foo`, line 3 defines it.
    fn listing() -> (DomTree, ElementId, ElementId, ElementId) {
        let mut doc = DomTree::new();
        let mut lines = vec![];
        for lineno in &["2", "3"] {
            let number = doc.append(doc.root(), "div");
            doc.set_attr(number, "data-line-number", lineno);
            lines.push(doc.append(doc.root(), "code"));
        }
        let use_span = doc.append_symbol_span(lines[0], "S_foo", "foo");
        let def_span = doc.append_symbol_span(lines[1], "S_foo", "foo");
        let outside = doc.append(doc.root(), "p");
        (doc, use_span, def_span, outside)
    }

    fn route() -> RouteContext {
        RouteContext::new("tests").with_source_path("a.cpp")
    }

    #[test]
    fn test_click_on_use() {
        let (mut doc, use_span, _, _) = listing();
        let index = index();
        let settings = Settings::default();
        let route = route();
        let resolver = SymbolActionResolver::new(&index, &settings, &route);
        let mut menu = ContextMenu::new();

        let click = ClickContext::new(use_span).with_target_word("foo");
        assert!(menu.try_show_on_click(&mut doc, &resolver, &click, &mut NoopSink));
        assert!(menu.is_active());
        let hrefs: Vec<_> = menu.rows().iter().map(|row| row.link_href()).collect();
        assert_eq!(
            hrefs,
            vec![
                "/tests/source/a.cpp#3",
                "/tests/source/a.h#1",
                "/tests/search?q=symbol:S_foo&redirect=false",
                "/tests/search?q=foo&redirect=false",
                "#",
            ]
        );
        assert_eq!(menu.rows()[0].row_classes(), vec!["contextmenu-row"]);
        assert_eq!(
            menu.rows()[1].row_classes(),
            vec!["contextmenu-row", "contextmenu-same-section"]
        );
        assert_eq!(
            menu.rows()[2].row_classes(),
            vec!["contextmenu-row", "contextmenu-new-section"]
        );
        assert_eq!(
            menu.rows()[4].link_classes(),
            vec!["contextmenu-link", "icon-tasks"]
        );

        menu.hide();
        assert!(!menu.is_active());
    }

    #[test]
    fn test_click_on_definition_line_skips_self_jump() {
        let (mut doc, _, def_span, _) = listing();
        let index = index();
        let settings = Settings::default();
        let route = route();
        let resolver = SymbolActionResolver::new(&index, &settings, &route);
        let mut menu = ContextMenu::new();

        assert!(menu.try_show_on_click(&mut doc, &resolver, &ClickContext::new(def_span), &mut NoopSink));
        let jumps: Vec<_> = menu
            .rows()
            .iter()
            .filter(|row| row.item.section == MenuSection::Jumps)
            .map(|row| row.link_href())
            .collect();
        assert_eq!(jumps, vec!["/tests/source/a.h#1"]);
    }

    #[test]
    fn test_no_menu_outside_containers_or_with_selection() {
        let (mut doc, use_span, _, outside) = listing();
        let index = index();
        let settings = Settings::default();
        let route = route();
        let resolver = SymbolActionResolver::new(&index, &settings, &route);
        let mut menu = ContextMenu::new();

        let click = ClickContext::new(outside).with_target_word("foo");
        assert!(!menu.try_show_on_click(&mut doc, &resolver, &click, &mut NoopSink));

        let mut click = ClickContext::new(use_span);
        click.selection_collapsed = false;
        assert!(!menu.try_show_on_click(&mut doc, &resolver, &click, &mut NoopSink));
        assert!(!menu.is_active());
    }

    #[test]
    fn test_fancy_bar_selection() {
        let (mut doc, use_span, def_span, _) = listing();
        let index = index();
        let settings = Settings::all_enabled();
        let route = route();
        let resolver = SymbolActionResolver::new(&index, &settings, &route);
        let mut menu = ContextMenu::new();
        let mut sink = RecordingSink::default();

        menu.try_show_on_click(&mut doc, &resolver, &ClickContext::new(use_span), &mut sink);
        assert_eq!(menu.selected_token(), Some(use_span));
        assert!(doc.has_class(use_span, SELECTED_CLASS));

        // Clicks on the panel leave the selection alone.
        let mut panel_click = ClickContext::new(doc.root());
        panel_click.on_panel = true;
        menu.try_show_on_click(&mut doc, &resolver, &panel_click, &mut sink);
        assert_eq!(menu.selected_token(), Some(use_span));

        menu.try_show_on_click(&mut doc, &resolver, &ClickContext::new(def_span), &mut sink);
        assert_eq!(menu.selected_token(), Some(def_span));
        assert!(!doc.has_class(use_span, SELECTED_CLASS));
        assert_eq!(sink.0, vec![Some(use_span), None, Some(def_span)]);
    }

    #[test]
    fn test_action_fires_once() {
        let (mut doc, use_span, _, _) = listing();
        let index = index();
        let settings = Settings::default();
        let route = route();
        let resolver = SymbolActionResolver::new(&index, &settings, &route);
        let mut menu = ContextMenu::new();
        menu.try_show_on_click(&mut doc, &resolver, &ClickContext::new(use_span), &mut NoopSink);

        let sticky_row = menu
            .rows()
            .iter()
            .position(|row| row.item.icon == MenuIcon::Tasks)
            .unwrap();
        assert_eq!(
            menu.take_action(sticky_row),
            Some(MenuAction::StickyHighlight {
                symbols: vec![ustr("S_foo")],
                token_text: "foo".to_string(),
            })
        );
        assert_eq!(menu.take_action(sticky_row), None);
        // Links have no action, and neither do rows that don't exist.
        assert_eq!(menu.take_action(0), None);
        assert_eq!(menu.take_action(99), None);
    }

    #[test]
    fn test_placement_opens_downward() {
        let placement = MenuPlacement::compute(10.0, 100.0, 0.0, 500.0, 800.0, 200.0);
        assert_eq!(
            placement,
            MenuPlacement {
                left: 10.0,
                top: Some(600.0),
                bottom: None,
                max_height: None,
                flipped: false,
            }
        );
    }

    #[test]
    fn test_placement_flips_and_constrains() {
        // 100px below the click, 700px above it.
        let placement = MenuPlacement::compute(0.0, 700.0, 0.0, 0.0, 800.0, 300.0);
        assert!(placement.flipped);
        assert_eq!(placement.top, None);
        assert_eq!(placement.bottom, Some(100.0));
        assert_eq!(placement.max_height, None);

        let placement = MenuPlacement::compute(0.0, 700.0, 0.0, 0.0, 800.0, 750.0);
        assert!(placement.flipped);
        assert_eq!(placement.max_height, Some(700.0));

        // More room below than above, so just constrain.
        let placement = MenuPlacement::compute(0.0, 300.0, 0.0, 0.0, 800.0, 600.0);
        assert!(!placement.flipped);
        assert_eq!(placement.top, Some(300.0));
        assert_eq!(placement.max_height, Some(500.0));
    }
}

use std::collections::HashSet;

use serde::Serialize;
use ustr::Ustr;

use crate::links::{fmt_html, text_search_link};

pub mod resolver;

/// Sections group related items; the renderer draws a separator whenever the
/// section changes from one row to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuSection {
    Jumps,
    SymbolSearches,
    Layout,
    TextSearches,
    Highlights,
    Diagrams,
}

/// Icons are named after the `icon-*` CSS classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuIcon {
    ExportAlt,
    Export,
    Search,
    Docs,
    Brush,
    Font,
    Tasks,
}

impl MenuIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuIcon::ExportAlt => "export-alt",
            MenuIcon::Export => "export",
            MenuIcon::Search => "search",
            MenuIcon::Docs => "docs",
            MenuIcon::Brush => "brush",
            MenuIcon::Font => "font",
            MenuIcon::Tasks => "tasks",
        }
    }

    pub fn css_class(&self) -> String {
        format!("icon-{}", self.as_str())
    }
}

/// In-page actions a menu item can trigger instead of navigating.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MenuAction {
    /// Highlight every occurrence of the clicked token and keep it highlighted
    /// until the next primary-button mouse-down.  This carries the token's
    /// original symbols and text, not anything derived from them.
    StickyHighlight {
        symbols: Vec<Ustr>,
        token_text: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuTarget {
    Href(String),
    Action(MenuAction),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub html: String,
    #[serde(flatten)]
    pub target: MenuTarget,
    pub icon: MenuIcon,
    pub section: MenuSection,
}

/// Every field of a `MenuItem`, borrowed.  Two items with the same key are
/// the same item as far as the user is concerned.
pub type MenuItemKey<'a> = (&'a str, &'a MenuTarget, MenuIcon, MenuSection);

impl MenuItem {
    pub fn link(html: String, href: String, icon: MenuIcon, section: MenuSection) -> Self {
        MenuItem {
            html,
            target: MenuTarget::Href(href),
            icon,
            section,
        }
    }

    pub fn action(html: String, action: MenuAction, icon: MenuIcon, section: MenuSection) -> Self {
        MenuItem {
            html,
            target: MenuTarget::Action(action),
            icon,
            section,
        }
    }

    /// The plain substring search offered for whatever word was under the
    /// caret.
    pub fn text_search(tree: &str, word: &str) -> Self {
        MenuItem::link(
            fmt_html("Search for the substring <strong>_</strong>", word),
            text_search_link(tree, word),
            MenuIcon::Font,
            MenuSection::TextSearches,
        )
    }

    pub fn key(&self) -> MenuItemKey<'_> {
        (&self.html, &self.target, self.icon, self.section)
    }

    pub fn href(&self) -> Option<&str> {
        match &self.target {
            MenuTarget::Href(href) => Some(href),
            MenuTarget::Action(_) => None,
        }
    }
}

/// Menu items are accumulated into these groups and the groups are always
/// concatenated in this order, so that the jumps people have muscle memory
/// for stay at the top and experimental things stay at the bottom.
#[derive(Debug, Default)]
pub struct MenuGroups {
    pub jumps: Vec<MenuItem>,
    pub searches: Vec<MenuItem>,
    pub sticky: Vec<MenuItem>,
    pub extra: Vec<MenuItem>,
}

impl MenuGroups {
    /// Flatten the groups, slotting the text search (if any) in after the
    /// symbol searches, and drop duplicates.
    pub fn finish(self, text_search: Option<MenuItem>) -> Vec<MenuItem> {
        let MenuGroups {
            jumps,
            searches,
            sticky,
            extra,
        } = self;
        let items = jumps
            .into_iter()
            .chain(searches)
            .chain(text_search)
            .chain(sticky)
            .chain(extra)
            .collect();
        dedup_menu_items(items)
    }
}

/// Remove structurally identical items, keeping the first occurrence.  This
/// happens in practice for IDL interfaces and methods whose pretty names are
/// the same as their C++ implementation's, and for diagram links that unify
/// on the pretty name.
pub fn dedup_menu_items(items: Vec<MenuItem>) -> Vec<MenuItem> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        items.iter().map(|item| seen.insert(item.key())).collect()
    };
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| if keep { Some(item) } else { None })
        .collect()
}

/// How a row relates to the one above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowBoundary {
    First,
    SameSection,
    NewSection,
}

impl RowBoundary {
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            RowBoundary::First => None,
            RowBoundary::SameSection => Some("contextmenu-same-section"),
            RowBoundary::NewSection => Some("contextmenu-new-section"),
        }
    }
}

pub fn layout_rows(items: &[MenuItem]) -> Vec<RowBoundary> {
    let mut last_section = None;
    items
        .iter()
        .map(|item| {
            let boundary = match last_section {
                None => RowBoundary::First,
                Some(section) if section == item.section => RowBoundary::SameSection,
                Some(_) => RowBoundary::NewSection,
            };
            last_section = Some(item.section);
            boundary
        })
        .collect()
}

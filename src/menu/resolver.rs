use itertools::Itertools;
use ustr::{Ustr, UstrSet};

use super::{MenuAction, MenuGroups, MenuIcon, MenuItem, MenuSection};
use crate::file_format::config::{RouteContext, Settings};
use crate::file_format::sym_info::{JumpKind, SymbolIndex, SymbolInfo};
use crate::links::{fmt_html, fmt_lang, source_link, symbol_search_link, DiagramQuery};
use crate::utils::owned_or_borrowed::OwnedOrBorrowed;

/// The index builder only emits override roll-up data when there are at most
/// this many overrides, and we check again here rather than trusting that.
/// Beyond two, listing overrides in a menu stops being helpful.
pub const MAX_OVERRIDE_ROLLUP: usize = 2;

/// Slot languages whose analysis is too soupy to diagram.
const UNDIAGRAMMABLE_SLOT_LANGS: &[&str] = &["js"];

/// The token the user clicked on: the raw symbols from its `data-symbols`
/// attribute plus its visible text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolToken {
    pub symbols: Vec<Ustr>,
    pub text: String,
}

impl SymbolToken {
    pub fn new(symbols: Vec<Ustr>, text: &str) -> Self {
        SymbolToken {
            symbols,
            text: text.to_string(),
        }
    }

    /// Click handling uses the attribute verbatim, without the hover logic's
    /// `?` special-case.
    pub fn from_attribute(symbols_attr: &str, text: &str) -> Self {
        SymbolToken::new(symbols_attr.split(',').map(ustr::ustr).collect(), text)
    }
}

/// The first pass over the clicked symbols is a two-state machine.  While
/// collecting, everything valid is kept.  The first symbol whose definition is
/// the line the user clicked on locks us into definition mode: whatever we
/// had collected is thrown away and only symbols defined on that line are
/// kept from then on.
///
/// This exists for constructors: clicking on a constructor's definition also
/// gives us all of the implicit constructors that it invokes, which we
/// attribute to the same line, and those are just noise there.  Platform
/// variants of a symbol aren't affected because they all define the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FilterState {
    Collecting,
    DefinitionLocked,
}

#[derive(Debug, PartialEq, Eq)]
enum Admission {
    Keep,
    ResetAndKeep,
    Drop,
}

impl FilterState {
    fn admit(&mut self, defines_clicked_line: bool) -> Admission {
        match (*self, defines_clicked_line) {
            (FilterState::Collecting, true) => {
                *self = FilterState::DefinitionLocked;
                Admission::ResetAndKeep
            }
            (FilterState::Collecting, false) => Admission::Keep,
            (FilterState::DefinitionLocked, true) => Admission::Keep,
            (FilterState::DefinitionLocked, false) => Admission::Drop,
        }
    }
}

fn jump_template(kind: JumpKind) -> &'static str {
    match kind {
        JumpKind::Idl => "Go to IDL definition of <strong>_</strong>",
        JumpKind::Def => "Go to definition of <strong>_</strong>",
        JumpKind::Decl => "Go to declaration of <strong>_</strong>",
    }
}

fn jump_icon(kind: JumpKind) -> MenuIcon {
    match kind {
        JumpKind::Idl | JumpKind::Def => MenuIcon::ExportAlt,
        JumpKind::Decl => MenuIcon::Export,
    }
}

fn lang_suffix(lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(" {}", fmt_lang(lang)),
        None => String::new(),
    }
}

/// Derives the context menu for a clicked token from SYM_INFO.
pub struct SymbolActionResolver<'a> {
    index: &'a SymbolIndex,
    settings: &'a Settings,
    route: &'a RouteContext,
}

impl<'a> SymbolActionResolver<'a> {
    pub fn new(index: &'a SymbolIndex, settings: &'a Settings, route: &'a RouteContext) -> Self {
        SymbolActionResolver {
            index,
            settings,
            route,
        }
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn route(&self) -> &'a RouteContext {
        self.route
    }

    /// Everything a click produces: the symbol-derived items (if a symbol
    /// token was clicked) plus the substring search for the word under the
    /// caret (if any).  An empty result means no menu should be shown.
    pub fn resolve_menu(
        &self,
        token: Option<&SymbolToken>,
        clicked_line: Option<&str>,
        target_word: Option<&str>,
    ) -> Vec<MenuItem> {
        let groups = match token {
            Some(token) => self.resolve_groups(token, clicked_line),
            None => MenuGroups::default(),
        };
        let text_search = target_word.map(|word| MenuItem::text_search(&self.route.tree, word));
        let items = groups.finish(text_search);
        debug!(count = items.len(), "resolved context menu");
        items
    }

    /// The deduplicated symbol-derived menu for a clicked token.
    pub fn resolve(&self, token: &SymbolToken, clicked_line: Option<&str>) -> Vec<MenuItem> {
        self.resolve_groups(token, clicked_line).finish(None)
    }

    pub fn resolve_groups(&self, token: &SymbolToken, clicked_line: Option<&str>) -> MenuGroups {
        let mut groups = MenuGroups::default();

        let filtered = self.filter_symbols(&token.symbols, clicked_line);
        trace!(
            clicked = ?filtered.iter().map(|(sym, info)| (sym.as_str(), info.pretty.as_str())).collect::<Vec<_>>(),
            "symbols surviving the definition filter"
        );

        {
            let mut expander = Expander {
                index: self.index,
                settings: self.settings,
                tree: &self.route.tree,
                clicked_line,
                groups: &mut groups,
            };
            for (sym, info) in &filtered {
                expander.expand(*sym, info);
            }
        }

        groups.sticky.push(MenuItem::action(
            "Sticky highlight".to_string(),
            MenuAction::StickyHighlight {
                symbols: token.symbols.clone(),
                token_text: token.text.clone(),
            },
            MenuIcon::Tasks,
            MenuSection::Highlights,
        ));

        groups
    }

    /// Pass 1: look up, validate and de-duplicate the raw symbols, then apply
    /// the definition filter.
    fn filter_symbols(
        &self,
        raw: &[Ustr],
        clicked_line: Option<&str>,
    ) -> Vec<(Ustr, OwnedOrBorrowed<'a, SymbolInfo>)> {
        let index: &'a SymbolIndex = self.index;
        let mut seen = UstrSet::default();
        let mut state = FilterState::Collecting;
        let mut kept: Vec<(Ustr, OwnedOrBorrowed<'a, SymbolInfo>)> = vec![];

        for sym in raw {
            if !seen.insert(*sym) {
                continue;
            }
            let info = match index.lookup(sym) {
                Some(info) => info,
                None => continue,
            };
            let defines_clicked_line =
                clicked_line.map_or(false, |line| info.jumps.defines_location(line));
            match state.admit(defines_clicked_line) {
                Admission::ResetAndKeep => {
                    trace!(sym = %sym, dropped = kept.len(), "clicked on a definition line");
                    kept.clear();
                    kept.push((*sym, info));
                }
                Admission::Keep => kept.push((*sym, info)),
                Admission::Drop => {
                    trace!(sym = %sym, "not defined on the clicked line");
                }
            }
        }

        kept
    }
}

/// Pass 2 state for a single resolution.
struct Expander<'r, 'a> {
    index: &'a SymbolIndex,
    settings: &'a Settings,
    tree: &'r str,
    clicked_line: Option<&'r str>,
    groups: &'r mut MenuGroups,
}

impl<'r, 'a> Expander<'r, 'a> {
    fn push_jump(&mut self, kind: JumpKind, target: &str, label: &str) {
        // Never offer to jump to where the user already is.
        if Some(target) == self.clicked_line {
            return;
        }
        self.groups.jumps.push(MenuItem::link(
            fmt_html(jump_template(kind), label),
            source_link(self.tree, target),
            jump_icon(kind),
            MenuSection::Jumps,
        ));
    }

    fn jumpify(&mut self, info: &SymbolInfo, label: &str) {
        for (kind, target) in info.jumps.iter() {
            self.push_jump(kind, target, label);
        }
    }

    /// Just the definition; used where a declaration would only crowd the
    /// menu, like the recv handler for a send or an override.
    fn direct_def_jumpify(&mut self, info: &SymbolInfo, label: &str) {
        if let Some(target) = info.jumps.get(JumpKind::Def) {
            self.push_jump(JumpKind::Def, target, label);
        }
    }

    /// For XPIDL in particular we want to be able to go straight from an
    /// interface method to its implementation(s) rather than the pure virtual
    /// declaration.  This is a single step, not a graph traversal.
    fn override_jumpify(&mut self, info: &SymbolInfo) {
        let overridden_by = info.overridden_by();
        if overridden_by.is_empty() || overridden_by.len() > MAX_OVERRIDE_ROLLUP {
            if !overridden_by.is_empty() {
                trace!(sym = %info.sym, count = overridden_by.len(), "too many overrides to roll up");
            }
            return;
        }
        let index = self.index;
        let sole = overridden_by.len() == 1;
        for over in overridden_by {
            let over_info = match index.get(&over.sym()) {
                Some(over_info) => over_info,
                None => continue,
            };
            let label = if sole {
                format!("Sole Override {}", over_info.pretty)
            } else {
                format!("Override {}", over_info.pretty)
            };
            self.direct_def_jumpify(over_info, &label);
        }
    }

    fn expand(&mut self, sym: Ustr, info: &SymbolInfo) {
        let index: &'a SymbolIndex = self.index;

        // Diagrams need structured data, and we'd rather diagram the language
        // bindings of an IDL symbol than the IDL symbol itself.
        let mut diagrammable: Vec<&SymbolInfo> = vec![];
        if let Some(meta) = &info.meta {
            if !meta.is_idl() {
                diagrammable.push(info);
            }
        }

        // (label, symbol-or-comma-list) pairs.
        let mut searches: Vec<(String, String)> = vec![];

        let owner = info.slot_owner().and_then(|slot_owner| {
            match index.get(&slot_owner.sym).filter(|owner| owner.is_valid()) {
                Some(owner) => Some((slot_owner, owner)),
                None => {
                    trace!(sym = %sym, owner = %slot_owner.sym, "unresolvable slot owner");
                    None
                }
            }
        });

        match owner {
            Some((slot_owner, owner)) => {
                // Describe ourselves the same way our owner's binding slot
                // would describe us.
                let impl_kind = owner.impl_kind_label();
                let lang = lang_suffix(slot_owner.lang());
                let canon_label = format!(
                    "{}{} {} {}",
                    impl_kind, lang, slot_owner.slot_kind, info.pretty
                );
                self.jumpify(info, &canon_label);
                searches.push((canon_label, sym.to_string()));
                self.jumpify(owner, &owner.pretty);

                // From an IPC send, offer to go straight to the recv.
                if slot_owner.slot_kind.as_str() == "send" {
                    for slot in owner.binding_slots() {
                        if slot.slot_kind.as_str() != "recv" {
                            continue;
                        }
                        if let Some(recv) = index.get(&slot.sym) {
                            if !recv.pretty.is_empty() {
                                let label = format!(
                                    "{}{} {} {}",
                                    impl_kind, lang, slot.slot_kind, recv.pretty
                                );
                                self.direct_def_jumpify(recv, &label);
                            }
                        }
                    }
                }
            }
            None => {
                self.jumpify(info, &info.pretty);
                searches.push((info.pretty.clone(), sym.to_string()));
            }
        }

        if let Some(meta) = &info.meta {
            if !meta.binding_slots.is_empty() {
                let impl_kind = meta.impl_kind_label();
                let mut all_search_syms: Vec<Ustr> = vec![];

                for slot in &meta.binding_slots {
                    let slot_info = match index.get(&slot.sym) {
                        Some(slot_info) if !slot_info.sym.is_empty() => slot_info,
                        _ => {
                            trace!(sym = %sym, slot = %slot.sym, "unresolvable binding slot");
                            continue;
                        }
                    };

                    let lang = slot.lang();
                    if let Some(lang) = lang {
                        if !UNDIAGRAMMABLE_SLOT_LANGS.contains(&lang) {
                            diagrammable.push(slot_info);
                        }
                    }

                    // Favor the slot's pretty if it has one.
                    let effective_pretty = if slot_info.pretty.is_empty() {
                        &info.pretty
                    } else {
                        &slot_info.pretty
                    };
                    let slot_label = format!(
                        "{}{} {} {}",
                        impl_kind,
                        lang_suffix(lang),
                        slot.slot_kind,
                        effective_pretty
                    );
                    searches.push((slot_label.clone(), slot.sym.to_string()));
                    all_search_syms.push(slot.sym);

                    self.jumpify(slot_info, &slot_label);
                    // Browsing XPIDL, the C++ binding is a pure virtual decl
                    // upgraded to a def, so its overrides are what's useful.
                    self.override_jumpify(slot_info);
                }

                // Multiple bindings get a single roll-up search too.
                if all_search_syms.len() > 1 {
                    if meta.is_idl() {
                        // Searching for the synthetic IDL symbol alone only
                        // gives upsells, so the roll-up replaces the default
                        // search but leads with the IDL symbol.
                        if !searches.is_empty() {
                            searches.remove(0);
                        }
                        all_search_syms.insert(0, sym);
                    }
                    let rollup_label = match meta.kind_str() {
                        Some(kind) => format!("{} {} {}", impl_kind, kind, info.pretty),
                        None => format!("{} {}", impl_kind, info.pretty),
                    };
                    searches.push((rollup_label, all_search_syms.iter().join(",")));
                }
            }
        }

        self.override_jumpify(info);

        for (label, syms) in searches {
            self.groups.searches.push(MenuItem::link(
                fmt_html("Search for <strong>_</strong>", &label),
                symbol_search_link(self.tree, &syms),
                MenuIcon::Search,
                MenuSection::SymbolSearches,
            ));
        }

        if self.settings.semantic_info.enabled {
            for candidate in &diagrammable {
                if candidate
                    .meta
                    .as_ref()
                    .map_or(false, |meta| meta.is_field_bearing_aggregate())
                {
                    self.groups.searches.push(MenuItem::link(
                        fmt_html("Class layout of <strong>_</strong>", &candidate.pretty),
                        DiagramQuery::FieldLayout.link(self.tree, &candidate.pretty),
                        MenuIcon::Docs,
                        MenuSection::Layout,
                    ));
                }
            }
        }

        if self.settings.diagramming.enabled {
            for candidate in &diagrammable {
                self.push_diagrams(candidate);
            }
        }
    }

    fn push_diagrams(&mut self, candidate: &SymbolInfo) {
        let mut queries = vec![
            (DiagramQuery::CallsTo, "Uses diagram of <strong>_</strong>"),
            (DiagramQuery::CallsFrom, "Calls diagram of <strong>_</strong>"),
        ];
        if let Some(meta) = &candidate.meta {
            if meta.is_field_bearing_aggregate() {
                queries.push((DiagramQuery::ClassDiagram, "Class diagram of <strong>_</strong>"));
            }
            if meta.has_inheritance() {
                queries.push((
                    DiagramQuery::InheritanceDiagram,
                    "Inheritance diagram of <strong>_</strong>",
                ));
            }
        }
        for (query, template) in queries {
            self.groups.extra.push(MenuItem::link(
                fmt_html(template, &candidate.pretty),
                query.link(self.tree, &candidate.pretty),
                MenuIcon::Brush,
                MenuSection::Diagrams,
            ));
        }
    }
}

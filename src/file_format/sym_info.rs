use std::fs::read_to_string;
use std::path::Path;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ustr::{ustr, Ustr, UstrMap};

use crate::error::Result;
use crate::utils::owned_or_borrowed::OwnedOrBorrowed;

/// Identifiers with this prefix are pseudo-symbols that stand for "the start
/// of a file" and are never present in the index.
pub const PSEUDO_FILE_PREFIX: &str = "FILE_";

fn empty_ustr() -> Ustr {
    ustr("")
}

/// The kinds of jump a jumpref can carry.  We always consider them in the
/// order of `JumpKind::ORDER` so that menus list the IDL definition first,
/// then the definition, then the declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Idl,
    Def,
    Decl,
}

impl JumpKind {
    pub const ORDER: [JumpKind; 3] = [JumpKind::Idl, JumpKind::Def, JumpKind::Decl];
}

/// Jump targets as `"<path>#<line>"` strings.  The crossref converter only
/// emits a jump when there's exactly one hit for it, so there's at most one of
/// each kind.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jumps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<String>,
}

impl Jumps {
    pub fn get(&self, kind: JumpKind) -> Option<&str> {
        match kind {
            JumpKind::Idl => self.idl.as_deref(),
            JumpKind::Def => self.def.as_deref(),
            JumpKind::Decl => self.decl.as_deref(),
        }
    }

    /// Present jumps in `JumpKind::ORDER`.
    pub fn iter(&self) -> impl Iterator<Item = (JumpKind, &str)> + '_ {
        JumpKind::ORDER
            .iter()
            .filter_map(move |kind| self.get(*kind).map(|target| (*kind, target)))
    }

    /// Is the given location the IDL definition or the definition of this
    /// symbol?  Declarations deliberately don't count.
    pub fn defines_location(&self, location: &str) -> bool {
        self.get(JumpKind::Idl) == Some(location) || self.get(JumpKind::Def) == Some(location)
    }

    pub fn is_empty(&self) -> bool {
        self.idl.is_none() && self.def.is_none() && self.decl.is_none()
    }
}

/// Symbol references in "meta" show up either as bare symbol strings
/// (`overriddenBy`) or as structured objects with at least a `sym` (`supers`,
/// `overrides` and friends include the `pretty` too).  We only ever need the
/// symbol.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SymbolRef {
    Bare(Ustr),
    Structured { sym: Ustr },
}

impl SymbolRef {
    pub fn sym(&self) -> Ustr {
        match self {
            SymbolRef::Bare(sym) => *sym,
            SymbolRef::Structured { sym } => *sym,
        }
    }
}

/// A binding slot edge, used both for `slotOwner` (pointing from a language
/// binding up to the abstract symbol) and for each of the `bindingSlots`
/// (pointing from the abstract symbol down to its bindings).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingSlotInfo {
    pub sym: Ustr,
    pub slot_kind: Ustr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_lang: Option<Ustr>,
}

impl BindingSlotInfo {
    /// The slot language when there is a non-empty one.
    pub fn lang(&self) -> Option<&str> {
        self.slot_lang
            .as_ref()
            .map(|lang| lang.as_str())
            .filter(|lang| !lang.is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impl_kind: Option<Ustr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Ustr>,
    /// We only care whether there are fields, not what they are.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<SymbolRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overridden_by: Vec<SymbolRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supers: Vec<SymbolRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subclasses: Vec<SymbolRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_owner: Option<BindingSlotInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binding_slots: Vec<BindingSlotInfo>,
}

impl SymbolMeta {
    pub fn is_idl(&self) -> bool {
        self.impl_kind.map_or(false, |kind| kind.as_str() == "idl")
    }

    /// The implementation kind as it's shown to users in labels: "IDL" for
    /// IDL symbols, otherwise the raw kind, defaulting to "impl".
    pub fn impl_kind_label(&self) -> &str {
        match self.impl_kind.as_ref().map(|kind| kind.as_str()) {
            Some("idl") => "IDL",
            Some(kind) if !kind.is_empty() => kind,
            _ => "impl",
        }
    }

    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_ref().map(|kind| kind.as_str())
    }

    /// Classes and structs that actually have fields can be laid out and
    /// class-diagrammed.
    pub fn is_field_bearing_aggregate(&self) -> bool {
        matches!(self.kind_str(), Some("class") | Some("struct")) && !self.fields.is_empty()
    }

    /// Methods in an override hierarchy and classes in an inheritance
    /// hierarchy get inheritance diagrams.
    pub fn has_inheritance(&self) -> bool {
        match self.kind_str() {
            Some("method") => !self.overrides.is_empty() || !self.overridden_by.is_empty(),
            Some("class") => !self.supers.is_empty() || !self.subclasses.is_empty(),
            _ => false,
        }
    }
}

/// The per-symbol "jumpref" representation as produced for SYM_INFO.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SymbolInfo {
    #[serde(default = "empty_ustr")]
    pub sym: Ustr,
    #[serde(default)]
    pub pretty: String,
    #[serde(default, skip_serializing_if = "Jumps::is_empty")]
    pub jumps: Jumps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SymbolMeta>,
}

impl SymbolInfo {
    /// no_crossref data can produce records lacking self-identification;
    /// those are not useful and must be ignored wherever they'd be consulted.
    pub fn is_valid(&self) -> bool {
        !self.sym.is_empty() && !self.pretty.is_empty()
    }

    pub fn impl_kind_label(&self) -> &str {
        self.meta.as_ref().map_or("impl", |meta| meta.impl_kind_label())
    }

    pub fn overridden_by(&self) -> &[SymbolRef] {
        self.meta
            .as_ref()
            .map_or(&[][..], |meta| meta.overridden_by.as_slice())
    }

    pub fn binding_slots(&self) -> &[BindingSlotInfo] {
        self.meta
            .as_ref()
            .map_or(&[][..], |meta| meta.binding_slots.as_slice())
    }

    pub fn slot_owner(&self) -> Option<&BindingSlotInfo> {
        self.meta.as_ref().and_then(|meta| meta.slot_owner.as_ref())
    }
}

/// Undo the `@XX` escaping used when a file path gets embedded in a symbol.
pub fn at_unescape(text: &str) -> String {
    lazy_static! {
        static ref AT_ESCAPE_REGEX: Regex = Regex::new(r"@([0-9A-F][0-9A-F])").unwrap();
    }
    AT_ESCAPE_REGEX
        .replace_all(text, |caps: &Captures| {
            // Two hex digits always fit in a u8.
            match u8::from_str_radix(&caps[1], 16) {
                Ok(byte) => char::from(byte).to_string(),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Synthesize the jumpref for a `FILE_` pseudo-symbol: it's named after the
/// file and jumps to its first line.
pub fn generate_pseudo_file_sym_info(sym: Ustr) -> SymbolInfo {
    // Only the one prefix; a root file may itself be named `FILE_something`.
    let raw = sym.as_str();
    let file = at_unescape(raw.strip_prefix(PSEUDO_FILE_PREFIX).unwrap_or(raw));
    SymbolInfo {
        sym,
        jumps: Jumps {
            def: Some(format!("{}#1", file)),
            ..Jumps::default()
        },
        pretty: file,
        meta: None,
    }
}

/// Read-only SYM_INFO table.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    syms: UstrMap<SymbolInfo>,
}

impl SymbolIndex {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let syms: UstrMap<SymbolInfo> = serde_json::from_str(json)?;
        Ok(SymbolIndex { syms })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let syms: UstrMap<SymbolInfo> = serde_json::from_value(value)?;
        Ok(SymbolIndex { syms })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }

    /// Raw table lookup with no pseudo-file synthesis and no validity check.
    pub fn get(&self, sym: &Ustr) -> Option<&SymbolInfo> {
        self.syms.get(sym)
    }

    /// Lookup for symbols the user actually clicked on: falls back to
    /// pseudo-file synthesis and hides invalid records.
    pub fn lookup(&self, sym: &Ustr) -> Option<OwnedOrBorrowed<'_, SymbolInfo>> {
        let info = match self.syms.get(sym) {
            Some(info) => OwnedOrBorrowed::Borrowed(info),
            None if sym.starts_with(PSEUDO_FILE_PREFIX) => {
                OwnedOrBorrowed::Owned(generate_pseudo_file_sym_info(*sym))
            }
            None => {
                trace!(sym = %sym, "unknown symbol");
                return None;
            }
        };
        if !info.is_valid() {
            trace!(sym = %sym, "ignoring symbol without sym/pretty");
            return None;
        }
        Some(info)
    }
}

use crate::url_encode::encode_uri_component;

/// Diagrams are always requested with this traversal depth.
pub const DIAGRAM_DEPTH: u32 = 4;

pub fn source_link(tree: &str, location: &str) -> String {
    format!("/{}/source/{}", tree, location)
}

/// `syms` may be a single symbol or a comma-joined list of them.
pub fn symbol_search_link(tree: &str, syms: &str) -> String {
    format!(
        "/{}/search?q=symbol:{}&redirect=false",
        tree,
        encode_uri_component(syms)
    )
}

pub fn text_search_link(tree: &str, text: &str) -> String {
    format!(
        "/{}/search?q={}&redirect=false",
        tree,
        encode_uri_component(text)
    )
}

pub fn query_link(tree: &str, query: &str) -> String {
    format!("/{}/query/default?q={}", tree, encode_uri_component(query))
}

/// HTML-escape `data` and substitute it for the first `_` in `template`.
pub fn fmt_html(template: &str, data: &str) -> String {
    let escaped = data
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;");
    template.replacen('_', &escaped, 1)
}

/// Binding slot languages are shown upper-cased, except that "cpp" reads
/// better as "C++".
pub fn fmt_lang(lang: &str) -> String {
    let lang = lang.to_uppercase();
    if lang == "CPP" {
        "C++".to_string()
    } else {
        lang
    }
}

/// The query verbs we know how to offer from the menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagramQuery {
    CallsTo,
    CallsFrom,
    ClassDiagram,
    InheritanceDiagram,
    FieldLayout,
}

impl DiagramQuery {
    pub fn verb(&self) -> &'static str {
        match self {
            DiagramQuery::CallsTo => "calls-to",
            DiagramQuery::CallsFrom => "calls-from",
            DiagramQuery::ClassDiagram => "class-diagram",
            DiagramQuery::InheritanceDiagram => "inheritance-diagram",
            DiagramQuery::FieldLayout => "field-layout",
        }
    }

    /// We use the pretty identifier rather than the symbol because it's more
    /// stable and more readable, at the cost of merging overloads.
    pub fn query_string(&self, pretty: &str) -> String {
        match self {
            DiagramQuery::FieldLayout => format!("{}:'{}'", self.verb(), pretty),
            _ => format!("{}:'{}' depth:{}", self.verb(), pretty, DIAGRAM_DEPTH),
        }
    }

    pub fn link(&self, tree: &str, pretty: &str) -> String {
        query_link(tree, &self.query_string(pretty))
    }
}

#[test]
fn test_fmt_html() {
    assert_eq!(
        fmt_html("Go to definition of <strong>_</strong>", "operator<"),
        "Go to definition of <strong>operator&lt;</strong>"
    );
    // Only the first placeholder is replaced, and underscores in the data
    // survive.
    assert_eq!(fmt_html("_ and _", "a_b"), "a_b and _");
    assert_eq!(fmt_html("_", "\"'&"), "&quot;&#039;&amp;");
}

#[test]
fn test_fmt_lang() {
    assert_eq!(fmt_lang("cpp"), "C++");
    assert_eq!(fmt_lang("js"), "JS");
    assert_eq!(fmt_lang("rust"), "RUST");
}

#[test]
fn test_links() {
    assert_eq!(
        source_link("mozilla-central", "dom/base/nsINode.h#20"),
        "/mozilla-central/source/dom/base/nsINode.h#20"
    );
    assert_eq!(
        symbol_search_link("tests", "_ZN1A,_ZN1B"),
        "/tests/search?q=symbol:_ZN1A%2C_ZN1B&redirect=false"
    );
    assert_eq!(
        text_search_link("tests", "mFoo"),
        "/tests/search?q=mFoo&redirect=false"
    );
    assert_eq!(
        DiagramQuery::CallsFrom.link("tests", "Foo::Bar"),
        "/tests/query/default?q=calls-from%3A'Foo%3A%3ABar'%20depth%3A4"
    );
    assert_eq!(
        DiagramQuery::FieldLayout.query_string("Foo"),
        "field-layout:'Foo'"
    );
}

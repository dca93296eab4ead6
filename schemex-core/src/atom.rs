//! The schema tree's atoms, grounded in
//! `include/neos/language/schema_node_atom.hpp`.

use std::cell::RefCell;
use std::collections::HashMap;

use slotmap::new_key_type;

use crate::concept::ConceptRef;

new_key_type! {
    /// Arena index for an atom. Ancestry and cross-references (`parent`,
    /// `expects`, `tokens`, concept references) are all `AtomId`s rather
    /// than pointers.
    pub struct AtomId;
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                                                       ║
║                                  Atom                                 ║
║                                  ¯¯¯¯                                 ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// The tagged sum replacing the source's class hierarchy + RTTI-style
/// `is_X()/as_X()`.
#[derive(Debug)]
pub enum Atom {
    Node(NodeAtom),
    Terminal(TerminalKind),
    /// A canonicalized, non-owning reference to a concept. At most one
    /// concept atom exists per concept per schema.
    Concept(ConceptRef),
}

impl Atom {
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeAtom> {
        match self {
            Atom::Node(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_node_mut(&mut self) -> Option<&mut NodeAtom> {
        match self {
            Atom::Node(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_terminal(&self) -> Option<&TerminalKind> {
        match self {
            Atom::Terminal(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_concept(&self) -> Option<&ConceptRef> {
        match self {
            Atom::Concept(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Atom::Node(n) => &n.symbol,
            Atom::Terminal(t) => t.symbol(),
            Atom::Concept(c) => c.name(),
        }
    }
}

/// A leaf carrying a `terminal_kind`.
#[derive(Debug, Clone)]
pub enum TerminalKind {
    /// End-of-tokens fallback, tried once the `tokens` list is exhausted
    /// without a match.
    Default,
    /// Literal byte sequence that must match exactly.
    String(Vec<u8>),
    Error,
    Ignore,
    Next,
    Continue,
    Done,
}

impl TerminalKind {
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            TerminalKind::Default => "default",
            TerminalKind::String(s) => {
                std::str::from_utf8(s).unwrap_or("<invalid-utf8-literal>")
            }
            TerminalKind::Error => "error",
            TerminalKind::Ignore => "ignore",
            TerminalKind::Next => "next",
            TerminalKind::Continue => "continue",
            TerminalKind::Done => "done",
        }
    }

    /// Byte length of the matched literal, used by the `String` terminal
    /// rewind correction in `parse_tokens` (`compiler.cpp:263-266`).
    #[must_use]
    pub fn literal_len(&self) -> usize {
        match self {
            TerminalKind::String(s) => s.len(),
            _ => 0,
        }
    }
}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                NodeAtom                                ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// An interior schema element, ported from `schema_node_atom.hpp`.
#[derive(Debug)]
pub struct NodeAtom {
    pub symbol: String,
    pub parent: Option<AtomId>,
    pub is_a: Vec<ConceptRef>,
    pub expects: Vec<AtomId>,
    pub tokens: Vec<(AtomId, AtomId)>,
    children: Vec<(String, AtomId)>,
    /// Memoized `find_token` results, keyed by candidate `AtomId`.
    /// `None` means "scanned, no match" (a cached miss, not an absent
    /// entry) — mirrors `token_cache_t` in `schema_node_atom.hpp`.
    pub token_cache: RefCell<HashMap<AtomId, Option<usize>>>,
    pub is_tokens_node: bool,
}

impl NodeAtom {
    #[must_use]
    pub fn new(symbol: impl Into<String>, parent: Option<AtomId>) -> Self {
        Self {
            symbol: symbol.into(),
            parent,
            is_a: Vec::new(),
            expects: Vec::new(),
            tokens: Vec::new(),
            children: Vec::new(),
            token_cache: RefCell::new(HashMap::new()),
            is_tokens_node: false,
        }
    }

    /// Inserts a child, preserving insertion order; panics on a duplicate
    /// symbol.
    pub fn insert_child(&mut self, symbol: impl Into<String>, id: AtomId) {
        let symbol = symbol.into();
        assert!(
            self.child(&symbol).is_none(),
            "duplicate child symbol {symbol:?}"
        );
        self.children.push((symbol, id));
    }

    #[must_use]
    pub fn child(&self, symbol: &str) -> Option<AtomId> {
        self.children
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, id)| *id)
    }

    #[must_use]
    pub fn children(&self) -> &[(String, AtomId)] {
        &self.children
    }

    /// True if `concept` is in `is_a`, or `is_a` contains a concept that
    /// `concept` is an ancestor of (`schema_node_atom.hpp`'s `is_concept`).
    #[must_use]
    pub fn is_concept(&self, concept: &ConceptRef) -> bool {
        self.is_a
            .iter()
            .any(|c| c == concept || concept.is_ancestor_of(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn children_preserve_insertion_order() {
        let mut ids: SlotMap<AtomId, ()> = SlotMap::with_key();
        let mut node = NodeAtom::new("root", None);
        let a = ids.insert(());
        let b = ids.insert(());
        node.insert_child("b", b);
        node.insert_child("a", a);
        let order: Vec<_> = node.children().iter().map(|(s, _)| s.clone()).collect();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    #[should_panic(expected = "duplicate child symbol")]
    fn duplicate_child_symbol_panics() {
        let mut ids: SlotMap<AtomId, ()> = SlotMap::with_key();
        let mut node = NodeAtom::new("root", None);
        let a = ids.insert(());
        let b = ids.insert(());
        node.insert_child("a", a);
        node.insert_child("a", b);
    }
}

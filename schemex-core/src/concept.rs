//! The concept registry contract and the `Concept` capability interface,
//! grounded in `include/neos/language/i_concept.hpp`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::atom::Atom;

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                                                       ║
║                                Concept                                ║
║                                ¯¯¯¯¯¯¯                                ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Which of the two compiler passes a primitive is currently running.
///
/// A concept's consumption must be pure on `Probe`: same inputs, same
/// outputs, no externally visible side effects. `Emit` may log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Probe,
    Emit,
}

/// Where a concept's emit entry lands relative to its match's children.
///
/// Named after `emit_type` in `i_concept.hpp`: `Postfix` concepts are
/// staged after the child match completes, `Infix` concepts are staged
/// between their inputs, before recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitAs {
    Postfix,
    Infix,
}

/// A named semantic classifier with consumption behavior.
///
/// Implementors do not need to worry about concept identity or ancestry
/// bookkeeping directly — once registered, a concept is wrapped in a
/// [`ConceptRef`], which is the handle the rest of the engine passes
/// around and which carries [`ConceptRef::is_ancestor_of`].
#[allow(unused_variables)]
pub trait Concept: Send + Sync + fmt::Debug {
    /// Dotted name, e.g. `math.universal.number.digit`.
    fn name(&self) -> &str;

    /// The concept's parent in the concept forest, if any.
    fn parent(&self) -> Option<ConceptRef>;

    fn emit_as(&self) -> EmitAs;

    /// Attempt to consume a token from `remaining`. Returns
    /// `(bytes_consumed, consumed)`; an empty `remaining` slice stands in
    /// for end-of-source (there is no separate pointer-nullity case to
    /// special-case, unlike the `i_concept.hpp` source iterator overloads).
    fn consume_token(&self, pass: Pass, remaining: &[u8]) -> (usize, bool);

    /// As [`Concept::consume_token`], but passes the atom this concept was
    /// matched against, for concepts that need to inspect it.
    fn consume_atom(&self, pass: Pass, atom: &Atom, remaining: &[u8]) -> (usize, bool);
}

/// A placeholder concept registered as a pure classification marker.
///
/// `consume_token`/`consume_atom` always report `consumed = false`; this
/// is how `schemex-concepts` represents `language.statement`,
/// `language.whitespace`, and friends
/// (`original_source/concepts/src/core/language.cpp:83-88`).
#[derive(Debug)]
pub struct Unimplemented {
    name: String,
    parent: Option<ConceptRef>,
    emit_as: EmitAs,
}

impl Unimplemented {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<ConceptRef>) -> Self {
        Self::with_emit_as(name, parent, EmitAs::Postfix)
    }

    /// As [`Unimplemented::new`], but with an explicit [`EmitAs`] — the
    /// grounding source lets a placeholder concept be declared `Infix`
    /// (`math.universal.cpp:75`, `math.universal.number.point`) even
    /// though it has no consumption behavior of its own yet.
    #[must_use]
    pub fn with_emit_as(name: impl Into<String>, parent: Option<ConceptRef>, emit_as: EmitAs) -> Self {
        Self {
            name: name.into(),
            parent,
            emit_as,
        }
    }
}

impl Concept for Unimplemented {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<ConceptRef> {
        self.parent.clone()
    }

    fn emit_as(&self) -> EmitAs {
        self.emit_as
    }

    fn consume_token(&self, _pass: Pass, _remaining: &[u8]) -> (usize, bool) {
        (0, false)
    }

    fn consume_atom(&self, _pass: Pass, _atom: &Atom, _remaining: &[u8]) -> (usize, bool) {
        (0, false)
    }
}

/// A canonicalized, cheaply-cloneable handle to a registered [`Concept`].
///
/// Concept atoms hold one of these rather than the raw `Arc<dyn
/// Concept>`, so that identity comparisons — the kind `find_token` needs
/// — go through [`ConceptRef::is_ancestor_of`] / `PartialEq`, both backed
/// by [`Arc::ptr_eq`], never by name.
#[derive(Clone, Debug)]
pub struct ConceptRef(Arc<dyn Concept>);

impl ConceptRef {
    #[must_use]
    pub fn new(concept: Arc<dyn Concept>) -> Self {
        Self(concept)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    #[must_use]
    pub fn parent(&self) -> Option<ConceptRef> {
        self.0.parent()
    }

    #[must_use]
    pub fn emit_as(&self) -> EmitAs {
        self.0.emit_as()
    }

    pub fn consume_token(&self, pass: Pass, remaining: &[u8]) -> (usize, bool) {
        self.0.consume_token(pass, remaining)
    }

    pub fn consume_atom(&self, pass: Pass, atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.0.consume_atom(pass, atom, remaining)
    }

    /// Transitive containment in the concept forest (`i_concept::is_ancestor_of`,
    /// `i_concept.hpp:66-76`): walk `child`'s parent chain looking for `self`.
    #[must_use]
    pub fn is_ancestor_of(&self, child: &ConceptRef) -> bool {
        let mut current = child.parent();
        while let Some(p) = current {
            if Arc::ptr_eq(&p.0, &self.0) {
                return true;
            }
            current = p.parent();
        }
        false
    }
}

impl PartialEq for ConceptRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for ConceptRef {}

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                                                       ║
║                            ConceptRegistry                            ║
║                            ¯¯¯¯¯¯¯¯¯¯¯¯¯¯¯¯¯                          ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// The union of loaded concept libraries.
///
/// Lookup is exact dotted name, no wildcards. Registration order is
/// preserved and observable via [`ConceptRegistry::registration_order`];
/// if two libraries export the same name, the first registered wins.
#[derive(Default, Debug)]
pub struct ConceptRegistry {
    by_name: HashMap<String, ConceptRef>,
    order: Vec<String>,
}

impl ConceptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `concept`, returning the canonical [`ConceptRef`] for its
    /// name. If a concept with the same name is already registered, the
    /// existing one is returned unchanged — first registered wins.
    pub fn register(&mut self, concept: Arc<dyn Concept>) -> ConceptRef {
        let name = concept.name().to_string();
        if let Some(existing) = self.by_name.get(&name) {
            return existing.clone();
        }
        let concept_ref = ConceptRef::new(concept);
        self.order.push(name.clone());
        self.by_name.insert(name, concept_ref.clone());
        concept_ref
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<ConceptRef> {
        self.by_name.get(name).cloned()
    }

    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: &str, descendant: &str) -> bool {
        match (self.find(ancestor), self.find(descendant)) {
            (Some(a), Some(d)) => a.is_ancestor_of(&d),
            _ => false,
        }
    }

    /// Registration order, first registered first.
    #[must_use]
    pub fn registration_order(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf {
        name: &'static str,
        parent: Option<ConceptRef>,
    }

    impl Concept for Leaf {
        fn name(&self) -> &str {
            self.name
        }
        fn parent(&self) -> Option<ConceptRef> {
            self.parent.clone()
        }
        fn emit_as(&self) -> EmitAs {
            EmitAs::Postfix
        }
        fn consume_token(&self, _pass: Pass, remaining: &[u8]) -> (usize, bool) {
            match remaining.first() {
                Some(b) if *b == b'x' => (1, true),
                _ => (0, false),
            }
        }
        fn consume_atom(&self, _pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
            self.consume_token(_pass, remaining)
        }
    }

    #[test]
    fn first_registered_wins() {
        let mut reg = ConceptRegistry::new();
        let first = reg.register(Arc::new(Leaf {
            name: "a",
            parent: None,
        }));
        let second = reg.register(Arc::new(Leaf {
            name: "a",
            parent: None,
        }));
        assert_eq!(first, second);
        assert_eq!(reg.registration_order(), &["a".to_string()]);
    }

    #[test]
    fn ancestry_is_transitive_by_identity_not_name() {
        let mut reg = ConceptRegistry::new();
        let root = reg.register(Arc::new(Leaf {
            name: "language",
            parent: None,
        }));
        let mid = reg.register(Arc::new(Leaf {
            name: "language.character",
            parent: Some(root.clone()),
        }));
        let leaf = reg.register(Arc::new(Leaf {
            name: "language.character.utf8",
            parent: Some(mid.clone()),
        }));
        assert!(root.is_ancestor_of(&leaf));
        assert!(mid.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&root));
        assert!(reg.is_ancestor_of("language", "language.character.utf8"));
    }
}

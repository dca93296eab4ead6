//! Owning storage for all atoms in a schema: ancestry follow-pointers
//! become indices into an arena owning all atoms, grounded in the
//! `slotmap`-backed schema store pattern from `grill-core/src/schema.rs`.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::atom::{Atom, AtomId, NodeAtom, TerminalKind};
use crate::concept::ConceptRef;

/// Owns every [`Atom`] in a schema. Concept atoms are canonicalized here:
/// at most one concept atom exists per concept per schema.
#[derive(Debug, Default)]
pub struct Arena {
    atoms: SlotMap<AtomId, Atom>,
    concept_atoms: HashMap<ConceptName, AtomId>,
}

/// Identity key for canonicalizing concept atoms, backed by the
/// concept's own pointer identity via [`ConceptRef`]'s `PartialEq`.
/// `HashMap` still needs `Hash`, so this wraps the concept's dotted name
/// purely as a hash bucket key — equality at lookup time is re-checked
/// against the stored [`ConceptRef`] by identity, not by this key alone,
/// since two distinct concepts could in principle share a name across
/// libraries that were never merged into one registry.
type ConceptName = String;

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, node: NodeAtom) -> AtomId {
        self.atoms.insert(Atom::Node(node))
    }

    pub fn insert_terminal(&mut self, terminal: TerminalKind) -> AtomId {
        self.atoms.insert(Atom::Terminal(terminal))
    }

    /// Returns the canonical concept atom for `concept`, creating it on
    /// first reference and canonicalizing it for reuse by later references
    /// to the same concept.
    pub fn concept_atom(&mut self, concept: ConceptRef) -> AtomId {
        if let Some(&existing) = self.concept_atoms.get(concept.name()) {
            if self.atoms[existing]
                .as_concept()
                .is_some_and(|c| *c == concept)
            {
                return existing;
            }
        }
        let name = concept.name().to_string();
        let id = self.atoms.insert(Atom::Concept(concept));
        self.concept_atoms.insert(name, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn get_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    #[must_use]
    pub fn node(&self, id: AtomId) -> Option<&NodeAtom> {
        self.get(id).and_then(Atom::as_node)
    }

    pub fn node_mut(&mut self, id: AtomId) -> Option<&mut NodeAtom> {
        self.get_mut(id).and_then(Atom::as_node_mut)
    }

    fn parent_of(&self, id: AtomId) -> Option<AtomId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Schema-tree ancestry (distinct from [`ConceptRef::is_ancestor_of`],
    /// which walks the *concept* forest): is `ancestor` somewhere up
    /// `descendant`'s `parent` chain? Grounds `parse_tokens`'s
    /// `aAtom.is_ancestor_of(token)` check, `compiler.cpp:203`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: AtomId, descendant: AtomId) -> bool {
        let mut current = self.parent_of(descendant);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// Direct parent check, grounding `aAtom.is_parent_of(matchedTokenValue)`
    /// (`compiler.cpp:216`).
    #[must_use]
    pub fn is_parent_of(&self, parent_candidate: AtomId, child: AtomId) -> bool {
        self.parent_of(child) == Some(parent_candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{Concept, EmitAs, Pass};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Stub(&'static str);
    impl Concept for Stub {
        fn name(&self) -> &str {
            self.0
        }
        fn parent(&self) -> Option<ConceptRef> {
            None
        }
        fn emit_as(&self) -> EmitAs {
            EmitAs::Postfix
        }
        fn consume_token(&self, _pass: Pass, _remaining: &[u8]) -> (usize, bool) {
            (0, false)
        }
        fn consume_atom(&self, _pass: Pass, _atom: &Atom, _remaining: &[u8]) -> (usize, bool) {
            (0, false)
        }
    }

    #[test]
    fn concept_atoms_are_canonicalized() {
        let mut arena = Arena::new();
        let concept = ConceptRef::new(Arc::new(Stub("math.universal.number.digit")));
        let a = arena.concept_atom(concept.clone());
        let b = arena.concept_atom(concept);
        assert_eq!(a, b);
    }

    #[test]
    fn tree_ancestry_walks_node_parent_links() {
        let mut arena = Arena::new();
        let root = arena.insert_node(NodeAtom::new("root", None));
        let mid = arena.insert_node(NodeAtom::new("root.mid", Some(root)));
        let leaf = arena.insert_node(NodeAtom::new("root.mid.leaf", Some(mid)));
        assert!(arena.is_ancestor_of(root, leaf));
        assert!(arena.is_parent_of(mid, leaf));
        assert!(!arena.is_parent_of(root, leaf));
    }
}

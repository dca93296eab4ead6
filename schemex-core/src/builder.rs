//! Programmatic schema-tree construction, grounded loosely in the
//! builder pattern of `grill-core/src/lib.rs`'s `Build<C, K>`:
//! `#[must_use]` methods that accumulate state and a terminal `build()`
//! that validates and hands back an immutable value. Schema JSON
//! deserialization lives outside this crate; a future schema-document
//! loader would sit on top of this and call the same `resolve_*` methods
//! this module uses internally.

use std::collections::HashMap;

use crate::arena::Arena;
use crate::atom::{AtomId, NodeAtom, TerminalKind};
use crate::concept::ConceptRegistry;
use crate::error::{LoadError, UnresolvedReference};
use crate::schema::{Schema, SchemaMeta};

/// Resolves a dotted reference: prefer an existing schema atom reachable
/// by path, falling back to a concept atom created on demand and
/// canonicalized.
fn resolve(
    by_path: &HashMap<String, AtomId>,
    registry: &ConceptRegistry,
    arena: &mut Arena,
    fully_qualified_name: &str,
) -> Option<AtomId> {
    if let Some(&id) = by_path.get(fully_qualified_name) {
        return Some(id);
    }
    registry
        .find(fully_qualified_name)
        .map(|concept| arena.concept_atom(concept))
}

/// Accumulates a schema tree node by node. Unlike `grill-core`'s
/// `Build<C, K>`, there is no source/URI loading here — a caller adds
/// nodes and terminals directly and wires `expect`/`tokens` references
/// either by `AtomId` (already resolved) or by dotted name (resolved at
/// [`SchemaBuilder::build`] time).
pub struct SchemaBuilder {
    arena: Arena,
    registry: ConceptRegistry,
    meta: SchemaMeta,
    libraries: Vec<String>,
    root: AtomId,
    by_path: HashMap<String, AtomId>,
    pending: Vec<PendingRef>,
}

enum PendingRef {
    Expect {
        owner: AtomId,
        leaf_name: String,
        fully_qualified_name: String,
    },
    TokenLhs {
        owner: AtomId,
        index: usize,
        leaf_name: String,
        fully_qualified_name: String,
    },
    TokenRhs {
        owner: AtomId,
        index: usize,
        leaf_name: String,
        fully_qualified_name: String,
    },
}

impl SchemaBuilder {
    #[must_use]
    pub fn new(registry: ConceptRegistry) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert_node(NodeAtom::new("", None));
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), root);
        Self {
            arena,
            registry,
            meta: SchemaMeta::default(),
            libraries: Vec::new(),
            root,
            by_path,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> AtomId {
        self.root
    }

    #[must_use]
    pub fn meta_mut(&mut self) -> &mut SchemaMeta {
        &mut self.meta
    }

    pub fn assert_library(&mut self, name: impl Into<String>) {
        self.libraries.push(name.into());
    }

    #[must_use]
    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ConceptRegistry {
        &mut self.registry
    }

    /// Adds a child node under `parent`, returning its `AtomId`. `path`
    /// is the new node's dotted path, used for later by-name resolution.
    pub fn add_node(&mut self, parent: AtomId, path: impl Into<String>) -> AtomId {
        let path = path.into();
        let id = self.arena.insert_node(NodeAtom::new(path.clone(), Some(parent)));
        if let Some(parent_node) = self.arena.node_mut(parent) {
            let leaf = path.rsplit('.').next().unwrap_or(&path).to_string();
            parent_node.insert_child(leaf, id);
        }
        self.by_path.insert(path, id);
        id
    }

    pub fn add_terminal(&mut self, kind: TerminalKind) -> AtomId {
        self.arena.insert_terminal(kind)
    }

    /// Returns the canonical concept atom for `concept_name`, creating it
    /// on demand — a convenience for callers that want to wire a concept
    /// into `tokens`/`expects` directly rather than through
    /// [`SchemaBuilder::add_token_by_name`]'s lazy by-name resolution.
    pub fn concept_atom(&mut self, concept_name: &str) -> Result<AtomId, LoadError> {
        self.registry
            .find(concept_name)
            .map(|concept| self.arena.concept_atom(concept))
            .ok_or_else(|| LoadError::MissingLibrary {
                library: concept_name.to_string(),
            })
    }

    /// `is_a` classification, by already-registered concept name; fails
    /// if the concept is unknown.
    pub fn set_is_a(&mut self, node: AtomId, concept_names: &[&str]) -> Result<(), LoadError> {
        let mut resolved = Vec::with_capacity(concept_names.len());
        for &name in concept_names {
            let concept = self
                .registry
                .find(name)
                .ok_or_else(|| LoadError::MissingLibrary {
                    library: name.to_string(),
                })?;
            resolved.push(concept);
        }
        if let Some(n) = self.arena.node_mut(node) {
            n.is_a = resolved;
        }
        Ok(())
    }

    /// Appends an already-resolved alternative to `node`'s `expects` list.
    pub fn add_expect(&mut self, node: AtomId, expected: AtomId) {
        if let Some(n) = self.arena.node_mut(node) {
            n.expects.push(expected);
        }
    }

    /// Appends an `expects` alternative resolved by dotted name at
    /// [`SchemaBuilder::build`] time.
    pub fn add_expect_by_name(&mut self, node: AtomId, leaf_name: &str, fully_qualified_name: &str) {
        self.pending.push(PendingRef::Expect {
            owner: node,
            leaf_name: leaf_name.to_string(),
            fully_qualified_name: fully_qualified_name.to_string(),
        });
    }

    /// Appends an already-resolved `(lhs, rhs)` pair to `node`'s `tokens`
    /// list. Order is significant — it is the tie-break between
    /// alternatives that both match.
    pub fn add_token(&mut self, node: AtomId, lhs: AtomId, rhs: AtomId) {
        if let Some(n) = self.arena.node_mut(node) {
            n.tokens.push((lhs, rhs));
        }
    }

    /// Appends a `(lhs, rhs)` pair where either side is resolved by
    /// dotted name at [`SchemaBuilder::build`] time. Pass `None` for a
    /// side that is already an `AtomId` via [`SchemaBuilder::add_token`]
    /// semantics is not supported here; use the by-name form for both
    /// sides together since they share one `tokens` slot.
    pub fn add_token_by_name(
        &mut self,
        node: AtomId,
        lhs_leaf: &str,
        lhs_fqn: &str,
        rhs_leaf: &str,
        rhs_fqn: &str,
    ) {
        let index = self.arena.node(node).map_or(0, |n| n.tokens.len());
        if let Some(n) = self.arena.node_mut(node) {
            // placeholder pair, patched in `build()` once both sides resolve
            n.tokens.push((node, node));
        }
        self.pending.push(PendingRef::TokenLhs {
            owner: node,
            index,
            leaf_name: lhs_leaf.to_string(),
            fully_qualified_name: lhs_fqn.to_string(),
        });
        self.pending.push(PendingRef::TokenRhs {
            owner: node,
            index,
            leaf_name: rhs_leaf.to_string(),
            fully_qualified_name: rhs_fqn.to_string(),
        });
    }

    pub fn mark_is_tokens_node(&mut self, node: AtomId) {
        if let Some(n) = self.arena.node_mut(node) {
            n.is_tokens_node = true;
        }
    }

    /// Resolves every pending by-name reference and hands back the
    /// finished [`Schema`]. Any residual unresolved reference fails the
    /// whole build with the complete offender list.
    pub fn build(mut self) -> Result<Schema, LoadError> {
        let mut offenders = Vec::new();
        for pending in std::mem::take(&mut self.pending) {
            match pending {
                PendingRef::Expect {
                    owner,
                    leaf_name,
                    fully_qualified_name,
                } => {
                    match resolve(&self.by_path, &self.registry, &mut self.arena, &fully_qualified_name) {
                        Some(id) => {
                            if let Some(n) = self.arena.node_mut(owner) {
                                n.expects.push(id);
                            }
                        }
                        None => offenders.push(UnresolvedReference {
                            leaf_name,
                            fully_qualified_name,
                        }),
                    }
                }
                PendingRef::TokenLhs {
                    owner,
                    index,
                    leaf_name,
                    fully_qualified_name,
                } => match resolve(&self.by_path, &self.registry, &mut self.arena, &fully_qualified_name) {
                    Some(id) => {
                        if let Some(n) = self.arena.node_mut(owner) {
                            n.tokens[index].0 = id;
                        }
                    }
                    None => offenders.push(UnresolvedReference {
                        leaf_name,
                        fully_qualified_name,
                    }),
                },
                PendingRef::TokenRhs {
                    owner,
                    index,
                    leaf_name,
                    fully_qualified_name,
                } => match resolve(&self.by_path, &self.registry, &mut self.arena, &fully_qualified_name) {
                    Some(id) => {
                        if let Some(n) = self.arena.node_mut(owner) {
                            n.tokens[index].1 = id;
                        }
                    }
                    None => offenders.push(UnresolvedReference {
                        leaf_name,
                        fully_qualified_name,
                    }),
                },
            }
        }
        if !offenders.is_empty() {
            return Err(LoadError::UnresolvedReferences(offenders));
        }
        Ok(Schema {
            arena: self.arena,
            registry: self.registry,
            meta: self.meta,
            libraries: self.libraries,
            root: self.root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::TerminalKind;

    #[test]
    fn unresolved_reference_fails_with_offender_list() {
        let mut builder = SchemaBuilder::new(ConceptRegistry::new());
        let root = builder.root();
        builder.add_expect_by_name(root, "missing", "language.does_not_exist");
        let err = builder.build().unwrap_err();
        match err {
            LoadError::UnresolvedReferences(offenders) => {
                assert_eq!(offenders.len(), 1);
                assert_eq!(offenders[0].fully_qualified_name, "language.does_not_exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resolves_named_token_pair_to_schema_atoms() {
        let mut builder = SchemaBuilder::new(ConceptRegistry::new());
        let root = builder.root();
        let lhs = builder.add_terminal(TerminalKind::String(b"if".to_vec()));
        let rhs = builder.add_terminal(TerminalKind::Done);
        builder.by_path.insert("lhs_ref".to_string(), lhs);
        builder.by_path.insert("rhs_ref".to_string(), rhs);
        let node = builder.add_node(root, "rule");
        builder.add_token_by_name(node, "lhs", "lhs_ref", "rhs", "rhs_ref");
        let schema = builder.build().unwrap();
        let rule = schema.arena().node(node).unwrap();
        assert_eq!(rule.tokens.len(), 1);
        assert_eq!(rule.tokens[0], (lhs, rhs));
    }
}

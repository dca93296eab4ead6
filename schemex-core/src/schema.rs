//! The schema tree as a whole: language metadata, the resolved atom
//! arena, and the concept registry a schema was loaded against.

use std::num::NonZeroU32;

use crate::arena::Arena;
use crate::atom::AtomId;
use crate::concept::ConceptRegistry;

/// Language metadata carried at the schema root.
///
/// This is the in-memory shape only; filling it in from a schema
/// document is a collaborator's job — schema JSON deserialization lives
/// outside this crate.
#[derive(Debug, Clone)]
pub struct SchemaMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub version: Option<String>,
    pub file_extensions: Vec<String>,
    /// `None` means the schema document left the key unset;
    /// [`crate::compiler::effective_recursion_limit`] falls back to 256 in
    /// that case. See `DESIGN.md`.
    pub parser_recursion_limit: Option<NonZeroU32>,
}

impl Default for SchemaMeta {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            copyright: None,
            version: None,
            file_extensions: Vec::new(),
            parser_recursion_limit: None,
        }
    }
}

/// A fully-loaded, immutable schema: the resolved atom tree plus the
/// concept registry it was resolved against. The atom graph is a tree
/// with additional cross-references, not a DAG.
#[derive(Debug)]
pub struct Schema {
    pub(crate) arena: Arena,
    pub(crate) registry: ConceptRegistry,
    pub meta: SchemaMeta,
    pub libraries: Vec<String>,
    pub root: AtomId,
}

impl Schema {
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[must_use]
    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }
}

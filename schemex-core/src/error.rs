//! The five-category error taxonomy, implemented with `thiserror` rather
//! than hand-rolled `impl std::error::Error`, following the workspace
//! dependency used in `grill-json-schema/src/keyword/type_.rs`; this crate
//! uses it directly rather than the `snafu` crate seen elsewhere in
//! `grill-core/src/error.rs`.

use std::fmt;

/// An `(expect-name, fully-qualified-name)` pair that failed to resolve
/// during schema load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub leaf_name: String,
    pub fully_qualified_name: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.leaf_name, self.fully_qualified_name)
    }
}

/// Category 1: schema load errors. Fatal at load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unresolved references: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    UnresolvedReferences(Vec<UnresolvedReference>),

    #[error("unknown keyword {keyword:?} at node {node_symbol:?}")]
    UnknownKeyword {
        node_symbol: String,
        keyword: String,
    },

    #[error("library not loaded: {library}")]
    MissingLibrary { library: String },
}

/// Category 2: parse syntax errors. The only user-visible failure mode
/// of a well-formed pipeline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("({reason}) line {line}, col {col}")]
pub struct ParseError {
    pub reason: String,
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

/// Category 3: recursion-limit exceeded. Fatal; distinguishable from
/// `NoMatch`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("recursion limit {limit} exceeded at {atom_symbol:?} (offset {offset})")]
pub struct RecursionError {
    pub limit: u32,
    pub atom_symbol: String,
    pub offset: usize,
}

/// Category 5: internal invariant violation — e.g. `parent()` requested
/// on the root atom, matching `i_concept::no_parent` in
/// `include/neos/language/i_concept.hpp:45`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no parent: {atom_symbol:?} has no parent atom")]
pub struct NoParent {
    pub atom_symbol: String,
}

/// The top-level error surfaced by [`crate::compiler::Compiler::compile`],
/// unifying categories 1, 3, 4, and 5 (category 2 is reported separately
/// per translation unit via [`ParseError`], since a parse failure is the
/// expected, recoverable-by-abandoning-the-unit outcome, not an abrupt
/// failure of the whole compile).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Recursion(#[from] RecursionError),

    #[error(transparent)]
    NoParent(#[from] NoParent),

    /// Category 4: host errors — I/O, file not found, etc. — raised by
    /// collaborators and surfaced verbatim.
    #[error("host error: {0}")]
    Host(#[source] Box<dyn std::error::Error + Send + Sync>),
}

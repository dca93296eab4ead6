//! `schemex-core` — a data-driven, two-pass recursive-descent parsing
//! engine. A schema describes a grammar as a tree of atoms; [`Compiler`]
//! walks that tree against a source buffer, staging matched concepts into
//! an emit buffer that only survives when the enclosing frame actually
//! succeeds.
//!
//! The engine itself carries no notion of any particular language —
//! `schemex-concepts` is where concrete concepts (digits, whitespace,
//! string literals, ...) live.

pub mod arena;
pub mod atom;
pub mod builder;
pub mod compiler;
pub mod concept;
pub mod emit;
pub mod error;
pub mod parse_result;
pub mod parser;
pub mod reporter;
pub mod schema;

pub use arena::Arena;
pub use atom::{Atom, AtomId, NodeAtom, TerminalKind};
pub use builder::SchemaBuilder;
pub use compiler::{Compiler, Program, TranslationUnit};
pub use concept::{Concept, ConceptRef, ConceptRegistry, EmitAs, Pass, Unimplemented};
pub use emit::{EmitBuffer, EmitEntry, EmitScope};
pub use error::{EngineError, LoadError, NoParent, ParseError, RecursionError, UnresolvedReference};
pub use parse_result::{Action, ParseResult};
pub use parser::Parser;
pub use schema::{Schema, SchemaMeta};

/// Byte offset into a source buffer. A type alias rather than a newtype —
/// the engine never does arithmetic on it beyond addition/comparison, and
/// every other crate in this workspace already speaks `usize` (`slotmap`
/// keys, `Vec` indices); wrapping it would just add `.0`s without buying
/// any type safety the tests don't already cover.
pub type SourceOffset = usize;

/// Re-exported so downstream crates constructing [`atom::AtomId`]-keyed
/// collections don't need a direct `slotmap` dependency of their own.
pub use slotmap::Key;

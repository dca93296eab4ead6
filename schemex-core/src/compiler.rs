//! The compiler facade, grounded in `compiler::compile`
//! (`compiler.cpp:91-118`): the outer loop that drives
//! [`crate::parser::Parser::parse`] across a whole translation unit's
//! source, one top-level `Emit` invocation per remaining chunk.

use std::any::Any;
use std::time::{Duration, Instant};

use crate::concept::Pass;
use crate::emit::EmitEntry;
use crate::error::ParseError;
use crate::parse_result::Action;
use crate::parser::Parser;
use crate::reporter;
use crate::schema::{Schema, SchemaMeta};
use crate::SourceOffset;

/// A schema whose document left `parser_recursion_limit` unset gets the
/// richer limit of 256, rather than some smaller pre-load floor. See
/// `DESIGN.md` for the reasoning.
#[must_use]
pub fn effective_recursion_limit(meta: &SchemaMeta) -> u32 {
    meta.parser_recursion_limit.map_or(256, std::num::NonZeroU32::get)
}

/// One unit of source text compiled against a [`Schema`].
///
/// `collaborator_state` is intentionally untyped: a concept library may
/// stash per-unit bookkeeping here (a symbol table under construction,
/// say) without `schemex-core` needing to know its shape — schema
/// document loading and code generation both happen outside this crate,
/// and this is the seam a collaborator hangs them off of.
pub struct TranslationUnit {
    pub name: String,
    pub source: Vec<u8>,
    pub collaborator_state: Option<Box<dyn Any + Send + Sync>>,
}

impl TranslationUnit {
    #[must_use]
    pub fn new(name: impl Into<String>, source: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source,
            collaborator_state: None,
        }
    }
}

impl std::fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("name", &self.name)
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// The result of compiling one [`TranslationUnit`]: the committed emit
/// sequence on success, or the first [`ParseError`] encountered.
#[derive(Debug)]
pub enum UnitOutcome {
    Emitted(Vec<EmitEntry>),
    Failed(ParseError),
}

/// An ordered collection of compiled units plus whatever opaque
/// cross-unit artifact a collaborator builds up (a linked symbol table, a
/// bytecode buffer, ...). `schemex-core` owns only the per-unit emit
/// sequences; what a downstream consumer does with them is its business.
pub struct Program {
    pub units: Vec<(String, UnitOutcome)>,
    pub artifact: Option<Box<dyn Any + Send + Sync>>,
    pub elapsed: Duration,
}

impl Program {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.units
            .iter()
            .all(|(_, outcome)| matches!(outcome, UnitOutcome::Emitted(_)))
    }

    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &ParseError)> {
        self.units
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                UnitOutcome::Failed(err) => Some((name.as_str(), err)),
                UnitOutcome::Emitted(_) => None,
            })
            .collect()
    }
}

/// Drives one or more [`TranslationUnit`]s through the parser against a
/// single [`Schema`]. Owns the `trace`/`trace_emits` flags that gate
/// `tracing` instrumentation inside [`crate::parser::Parser`].
pub struct Compiler<'a> {
    schema: &'a Schema,
    trace: bool,
    trace_emits: bool,
}

impl<'a> Compiler<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            trace: false,
            trace_emits: false,
        }
    }

    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    #[must_use]
    pub fn with_trace_emits(mut self, trace_emits: bool) -> Self {
        self.trace_emits = trace_emits;
        self
    }

    /// Compiles every unit in `units`, driving each one's top-level
    /// `parse(Emit, root, cursor)` loop until its source is exhausted or a
    /// parse failure is hit (`compiler.cpp:91-118`). An empty schema
    /// against empty source is vacuously successful.
    pub fn compile(&self, units: Vec<TranslationUnit>) -> Program {
        let start = Instant::now();
        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            let outcome = self.compile_unit(&unit);
            results.push((unit.name, outcome));
        }
        Program {
            units: results,
            artifact: None,
            elapsed: start.elapsed(),
        }
    }

    fn compile_unit(&self, unit: &TranslationUnit) -> UnitOutcome {
        let mut parser = Parser::new(self.schema, &unit.source);
        parser.set_trace(self.trace);
        parser.set_trace_emits(self.trace_emits);

        let mut cursor: SourceOffset = 0;
        while cursor < unit.source.len() {
            parser.reset_deepest_probe(cursor);
            match parser.parse(Pass::Emit, self.schema.root, cursor) {
                Ok(result) if result.action == Action::NoMatch => {
                    return UnitOutcome::Failed(reporter::report(
                        &unit.source,
                        parser.deepest_probe(),
                        "no match",
                    ));
                }
                Ok(result) if result.source == cursor => {
                    // Zero-width success short of end-of-source: the grammar
                    // is exhausted but input remains. Report rather than spin.
                    return UnitOutcome::Failed(reporter::report(
                        &unit.source,
                        parser.deepest_probe(),
                        "no progress",
                    ));
                }
                Ok(result) => cursor = result.source,
                Err(recursion_error) => {
                    return UnitOutcome::Failed(reporter::report(
                        &unit.source,
                        recursion_error.offset,
                        recursion_error.to_string(),
                    ));
                }
            }
        }
        UnitOutcome::Emitted(parser.emit_buffer().drain())
    }
}

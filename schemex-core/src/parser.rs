//! The parser engine, "the heart" of the system.
//! Grounded line-for-line in `src/compiler.cpp`'s
//! `parse`/`parse_expect`/`parse_tokens`/`parse_token_match`/`parse_token`/
//! `consume_token`/`consume_concept_token`/`consume_concept_atom`.

use std::cell::Cell;

use crate::arena::Arena;
use crate::atom::{Atom, AtomId, TerminalKind};
use crate::concept::{ConceptRef, EmitAs, Pass};
use crate::emit::{EmitBuffer, EmitEntry};
use crate::error::RecursionError;
use crate::parse_result::{Action, ParseResult};
use crate::schema::Schema;
use crate::SourceOffset;

/// One translation unit's parsing context: the schema it is parsed
/// against, the source buffer, the emit buffer it stages into, and the
/// bookkeeping the engine needs across a whole top-level `compile` loop
/// (deepest-probe tracking, recursion bounding).
///
/// Shared mutable bookkeeping (`deepest_probe`, recursion `depth`, the
/// packrat scan counter) lives behind `Cell` so every parsing primitive
/// can take `&self` — recursive descent methods calling each other need
/// concurrent read access to the same `Parser`, which a `&mut self`
/// receiver cannot give them without threading an explicit borrow
/// through every call.
pub struct Parser<'a> {
    schema: &'a Schema,
    source: &'a [u8],
    emit_buffer: EmitBuffer,
    deepest_probe: Cell<SourceOffset>,
    depth: Cell<u32>,
    recursion_limit: u32,
    trace: bool,
    trace_emits: bool,
    scan_count: Cell<u64>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema, source: &'a [u8]) -> Self {
        Self {
            schema,
            source,
            emit_buffer: EmitBuffer::new(),
            deepest_probe: Cell::new(0),
            depth: Cell::new(0),
            recursion_limit: crate::compiler::effective_recursion_limit(&schema.meta),
            trace: false,
            trace_emits: false,
            scan_count: Cell::new(0),
        }
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn set_trace_emits(&mut self, trace_emits: bool) {
        self.trace_emits = trace_emits;
    }

    #[must_use]
    pub fn emit_buffer(&self) -> &EmitBuffer {
        &self.emit_buffer
    }

    /// Number of times `find_token`'s linear scan actually ran (i.e.
    /// cache misses) — exposed purely for packrat-reuse instrumentation.
    #[must_use]
    pub fn token_scan_count(&self) -> u64 {
        self.scan_count.get()
    }

    /// Resets the deepest-probe tracker to `cursor`; called once per
    /// top-level `parse` invocation by `Compiler::compile`
    /// (`compiler.cpp:103`, `iDeepestProbe = std::nullopt`).
    pub fn reset_deepest_probe(&self, cursor: SourceOffset) {
        self.deepest_probe.set(cursor);
    }

    #[must_use]
    pub fn deepest_probe(&self) -> SourceOffset {
        self.deepest_probe.get()
    }

    fn note_deepest_probe(&self, offset: SourceOffset) {
        if offset > self.deepest_probe.get() {
            self.deepest_probe.set(offset);
        }
    }

    fn arena(&self) -> &Arena {
        self.schema.arena()
    }

    fn symbol_of(&self, id: AtomId) -> String {
        self.arena()
            .get(id)
            .map(Atom::symbol)
            .unwrap_or("?")
            .to_string()
    }

    fn enter_recursion(&self, atom_symbol: &str, offset: SourceOffset) -> Result<RecursionGuard<'_, 'a>, RecursionError> {
        let depth = self.depth.get() + 1;
        if depth > self.recursion_limit {
            return Err(RecursionError {
                limit: self.recursion_limit,
                atom_symbol: atom_symbol.to_string(),
                offset,
            });
        }
        self.depth.set(depth);
        Ok(RecursionGuard { parser: self })
    }

    fn trace_enter(&self, primitive: &str, symbol: &str) {
        if self.trace {
            tracing::trace!(depth = self.depth.get(), primitive, atom = symbol, "parse primitive entered");
        }
    }

    fn trace_push(&self, via: &str, concept: &ConceptRef, start: SourceOffset, end: SourceOffset) {
        if self.trace_emits {
            tracing::trace!(via, concept = concept.name(), start, end, "emit staged");
        }
    }

    /// Commit iff `pass == Emit` and the frame succeeded (action is
    /// neither `NoMatch` nor `Error`); otherwise the scope's `Drop`
    /// truncates back to its mark.
    fn finish_scope(&self, pass: Pass, scope: &crate::emit::EmitScope<'_>, result: &ParseResult) {
        if pass == Pass::Emit && !matches!(result.action, Action::NoMatch | Action::Error) {
            scope.commit();
        }
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ╔═══════════════════════════════════════════════════════════════════════╗
    ║                                  parse                                 ║
    ╚═══════════════════════════════════════════════════════════════════════╝
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// `node` must name a [`crate::atom::NodeAtom`].
    pub fn parse(&self, pass: Pass, node: AtomId, src: SourceOffset) -> Result<ParseResult, RecursionError> {
        let symbol = self.symbol_of(node);
        let _guard = self.enter_recursion(&symbol, src)?;
        if pass == Pass::Emit {
            let probe = self.parse(Pass::Probe, node, src)?;
            if probe.action == Action::NoMatch {
                return Ok(probe);
            }
        }
        self.trace_enter("parse", &symbol);
        let scope = self.emit_buffer.open_scope();

        let expecting = self
            .arena()
            .node(node)
            .is_some_and(|n| !n.expects.is_empty());

        let result = if src < self.source.len() {
            if expecting {
                let expects = self.arena().node(node).expect("node atom").expects.clone();
                let mut result = ParseResult::no_match(src);
                for expected in expects {
                    result = self.parse_expect(pass, node, expected, src)?;
                    if result.action == Action::Consumed || result.is_finished() {
                        self.finish_scope(pass, &scope, &result);
                        return Ok(result);
                    }
                    self.note_deepest_probe(result.source);
                }
                result
            } else {
                self.parse_tokens(pass, node, src)?
            }
        } else if expecting {
            ParseResult::no_match(src)
        } else {
            ParseResult::consumed_at(src)
        };

        self.finish_scope(pass, &scope, &result);
        Ok(result)
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                              parse_expect                             ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// Tries one alternative from a node's `expects` list.
    fn parse_expect(
        &self,
        pass: Pass,
        node: AtomId,
        expected: AtomId,
        src: SourceOffset,
    ) -> Result<ParseResult, RecursionError> {
        let symbol = self.symbol_of(node);
        let _guard = self.enter_recursion(&symbol, src)?;
        if pass == Pass::Emit {
            let probe = self.parse_expect(Pass::Probe, node, expected, src)?;
            if probe.action == Action::NoMatch {
                return Ok(probe);
            }
        }
        self.trace_enter("parse_expect", &symbol);
        let scope = self.emit_buffer.open_scope();

        let result = match self.arena().get(expected) {
            Some(Atom::Node(_)) => {
                let attempt = self.parse(pass, expected, src)?;
                if attempt.action == Action::NoMatch {
                    attempt
                } else {
                    let matched = self.parse_token_match(pass, node, expected, attempt.source, true, false)?;
                    if matched.action == Action::Consumed || matched.is_finished() {
                        matched
                    } else {
                        ParseResult::no_match(src)
                    }
                }
            }
            Some(Atom::Terminal(_)) => self.parse_token(pass, node, expected, src)?,
            // Consume as a concept token. The grounding C++ draft has no
            // branch for this case; see DESIGN.md for the reasoning.
            Some(Atom::Concept(_)) => self.consume_token(pass, expected, src)?,
            None => ParseResult::no_match(src),
        };

        self.finish_scope(pass, &scope, &result);
        Ok(result)
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                              parse_tokens                             ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// The greedy token loop — the densest part of the engine. Deviations
    /// from the literal `compiler.cpp:183-305` are noted inline; each one
    /// trades an ambiguous, seemingly non-terminating corner of that draft
    /// for guaranteed forward progress.
    fn parse_tokens(&self, pass: Pass, node: AtomId, src: SourceOffset) -> Result<ParseResult, RecursionError> {
        let symbol = self.symbol_of(node);
        let _guard = self.enter_recursion(&symbol, src)?;
        if pass == Pass::Emit {
            let probe = self.parse_tokens(Pass::Probe, node, src)?;
            if probe.action == Action::NoMatch {
                return Ok(probe);
            }
        }
        self.trace_enter("parse_tokens", &symbol);
        let scope = self.emit_buffer.open_scope();

        let token_count = self.arena().node(node).map_or(0, |n| n.tokens.len());
        let mut current_source = src;
        let mut iter_index = 0usize;

        let result = 'outer: loop {
            if !(current_source < self.source.len() && iter_index < token_count) {
                break ParseResult::new(
                    current_source,
                    if current_source != src {
                        Action::Consumed
                    } else {
                        Action::NoMatch
                    },
                );
            }

            let (token, token_value) = self.arena().node(node).expect("node atom").tokens[iter_index];

            let attempt = self.parse_token(pass, node, token, current_source)?;
            self.note_deepest_probe(attempt.source);

            if attempt.is_finished() {
                if self.arena().is_ancestor_of(node, token) {
                    break attempt;
                }
                current_source = attempt.source;
                iter_index = 0;
                continue 'outer;
            }

            let ate_some = attempt.action == Action::Consumed;
            if ate_some {
                let value_is_terminal = matches!(self.arena().get(token_value), Some(Atom::Terminal(_)));
                if !value_is_terminal {
                    let try_source = attempt.source;
                    let mut inner = attempt;
                    if self.arena().is_parent_of(node, token_value) {
                        inner = self.parse_token(pass, node, token_value, try_source)?;
                    }
                    if inner.is_finished() {
                        break inner;
                    }
                    let made_progress = inner.action == Action::Consumed && inner.source != try_source;
                    let is_parent = self.arena().is_parent_of(node, token_value);
                    if made_progress || (inner.action == Action::Consumed && !is_parent) {
                        let mut matched = inner;
                        if matches!(self.arena().get(token_value), Some(Atom::Node(_))) {
                            matched = self.parse_token_match(pass, token_value, token, inner.source, false, false)?;
                        }
                        if matched.is_finished() {
                            self.consume_token(pass, token_value, matched.source)?;
                            break matched;
                        }
                        if matched.action == Action::Consumed {
                            matched = self.parse_token_match(pass, node, token_value, matched.source, true, true)?;
                            if matched.is_finished() {
                                break matched;
                            }
                        }
                        if matched.action == Action::Consumed {
                            current_source = matched.source;
                            iter_index = 0;
                            continue 'outer;
                        } else if matched.action != Action::Ignored && matched.action != Action::Continue {
                            break matched;
                        }
                        // Ignored/Continue without progress: advance rather
                        // than retry the same candidate forever.
                        iter_index += 1;
                    } else if inner.action == Action::Consumed {
                        iter_index += 1;
                    } else {
                        break inner;
                    }
                } else {
                    let mut r = self.parse_token(pass, node, token_value, attempt.source)?;
                    match r.action {
                        Action::Done | Action::ForNext => break r,
                        Action::Ignored | Action::Continue => {
                            current_source = r.source;
                            iter_index = 0;
                            continue 'outer;
                        }
                        Action::NoMatch => {
                            if let Some(Atom::Terminal(TerminalKind::String(literal))) = self.arena().get(token) {
                                r.source = r.source.saturating_sub(literal.len());
                            }
                            break r;
                        }
                        Action::Error => break ParseResult::no_match(r.source),
                        Action::Consumed => {
                            current_source = r.source;
                            iter_index += 1;
                        }
                    }
                }
            } else {
                iter_index += 1;
            }

            if iter_index >= token_count && token_count > 0 {
                let (last_lhs, last_rhs) = self.arena().node(node).expect("node atom").tokens[token_count - 1];
                if matches!(self.arena().get(last_lhs), Some(Atom::Terminal(TerminalKind::Default))) {
                    let r = self.parse_token(pass, node, last_rhs, current_source)?;
                    match r.action {
                        Action::Done | Action::ForNext => break r,
                        Action::Consumed => current_source = r.source,
                        Action::Ignored => {
                            if !ate_some && current_source == r.source {
                                current_source += 1;
                            }
                        }
                        Action::NoMatch | Action::Error => break r,
                        Action::Continue => {}
                    }
                }
            }
        };

        self.finish_scope(pass, &scope, &result);
        Ok(result)
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                            parse_token_match                          ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// `is_self` suppresses opening a fresh emitter scope when the caller
    /// already owns one (`compiler.cpp`'s `aSelf`).
    fn parse_token_match(
        &self,
        pass: Pass,
        node: AtomId,
        match_result: AtomId,
        src: SourceOffset,
        consume_match_result: bool,
        is_self: bool,
    ) -> Result<ParseResult, RecursionError> {
        let symbol = format!("{}:{}", self.symbol_of(node), self.symbol_of(match_result));
        let _guard = self.enter_recursion(&symbol, src)?;
        if pass == Pass::Emit {
            let probe = self.parse_token_match(Pass::Probe, node, match_result, src, consume_match_result, is_self)?;
            if probe.action == Action::NoMatch {
                return Ok(probe);
            }
        }
        self.trace_enter("parse_token_match", &symbol);
        let scope = if is_self {
            None
        } else {
            Some(self.emit_buffer.open_scope())
        };

        let mut result = ParseResult::consumed_at(src);

        if consume_match_result {
            match self.arena().get(match_result) {
                Some(Atom::Concept(c)) if c.emit_as() == EmitAs::Infix => {
                    let c = c.clone();
                    result = self.consume_concept_atom(pass, match_result, &c, result.source)?;
                }
                Some(Atom::Concept(_)) => {}
                _ => {
                    result = self.consume_token(pass, match_result, result.source)?;
                }
            }
        }

        if result.action == Action::Consumed {
            if let Some(next_token) = self.find_token(node, match_result) {
                if next_token != node {
                    let is_concept = matches!(self.arena().get(next_token), Some(Atom::Concept(_)));
                    if !is_concept {
                        result = self.parse_token(pass, node, next_token, result.source)?;
                    }
                    if result.action == Action::Consumed {
                        result = self.parse_token_match(pass, node, next_token, result.source, true, true)?;
                    }
                }
            }
        }

        if consume_match_result {
            if let Some(Atom::Concept(c)) = self.arena().get(match_result) {
                if c.emit_as() == EmitAs::Postfix {
                    let c = c.clone();
                    self.consume_concept_atom(pass, match_result, &c, result.source)?;
                }
            }
        }

        if let Some(scope) = &scope {
            self.finish_scope(pass, scope, &result);
        }

        Ok(result)
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                               parse_token                             ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// Tries matching a single terminal token against `tok`.
    fn parse_token(
        &self,
        pass: Pass,
        node: AtomId,
        tok: AtomId,
        src: SourceOffset,
    ) -> Result<ParseResult, RecursionError> {
        let symbol = format!("{}:{}", self.symbol_of(node), self.symbol_of(tok));
        let _guard = self.enter_recursion(&symbol, src)?;
        if pass == Pass::Emit {
            let probe = self.parse_token(Pass::Probe, node, tok, src)?;
            if probe.action == Action::NoMatch {
                return Ok(probe);
            }
        }
        self.trace_enter("parse_token", &symbol);
        let scope = self.emit_buffer.open_scope();

        let result = match self.arena().get(tok) {
            Some(Atom::Node(_)) => self.parse(pass, tok, src)?,
            Some(Atom::Terminal(kind)) => match kind {
                TerminalKind::Default => ParseResult::no_match(src),
                TerminalKind::Error => ParseResult::new(src, Action::Error),
                TerminalKind::Ignore => ParseResult::new(src, Action::Ignored),
                TerminalKind::Continue => {
                    let mut r = self.consume_token(pass, node, src)?;
                    if r.action == Action::Consumed {
                        r.action = Action::Continue;
                    }
                    r
                }
                TerminalKind::Done => {
                    let mut r = self.consume_token(pass, node, src)?;
                    if r.action == Action::Consumed {
                        r.action = Action::Done;
                    }
                    r
                }
                TerminalKind::Next => ParseResult::new(src, Action::ForNext),
                TerminalKind::String(literal) => {
                    let remaining = &self.source[src.min(self.source.len())..];
                    if remaining.starts_with(literal.as_slice()) {
                        ParseResult::consumed_at(src + literal.len())
                    } else {
                        ParseResult::no_match(src)
                    }
                }
            },
            Some(Atom::Concept(_)) => self.consume_token(pass, tok, src)?,
            None => ParseResult::no_match(src),
        };

        self.finish_scope(pass, &scope, &result);
        Ok(result)
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                     consume_token / consume_concept_*                 ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// On a node atom this folds over `is_a`: the ordered list of concepts
    /// is consumed in turn, stopping once a concept returns `NoMatch` or
    /// `Ignored`, grounding `compiler.cpp:414-427`.
    fn consume_token(&self, pass: Pass, tok: AtomId, src: SourceOffset) -> Result<ParseResult, RecursionError> {
        let symbol = self.symbol_of(tok);
        let _guard = self.enter_recursion(&symbol, src)?;
        match self.arena().get(tok) {
            Some(Atom::Concept(c)) => {
                let c = c.clone();
                self.consume_concept_token(pass, tok, &c, src)
            }
            Some(Atom::Node(node)) => {
                let is_a = node.is_a.clone();
                let mut result = ParseResult::consumed_at(src);
                for concept in &is_a {
                    if result.action == Action::NoMatch || result.action == Action::Ignored {
                        break;
                    }
                    result = self.consume_concept_atom(pass, tok, concept, result.source)?;
                }
                Ok(result)
            }
            _ => Ok(ParseResult::consumed_at(src)),
        }
    }

    fn consume_concept_token(
        &self,
        pass: Pass,
        _tok: AtomId,
        concept: &ConceptRef,
        src: SourceOffset,
    ) -> Result<ParseResult, RecursionError> {
        let _guard = self.enter_recursion(concept.name(), src)?;
        let remaining = &self.source[src.min(self.source.len())..];
        let (advanced, consumed) = concept.consume_token(pass, remaining);
        let new_src = src + advanced;
        if consumed && pass == Pass::Emit {
            self.trace_push("token", concept, src, new_src);
            self.emit_buffer.push(EmitEntry {
                concept: concept.clone(),
                start: src,
                end: new_src,
            });
        }
        Ok(ParseResult::new(
            new_src,
            if consumed { Action::Consumed } else { Action::NoMatch },
        ))
    }

    fn consume_concept_atom(
        &self,
        pass: Pass,
        atom: AtomId,
        concept: &ConceptRef,
        src: SourceOffset,
    ) -> Result<ParseResult, RecursionError> {
        let _guard = self.enter_recursion(concept.name(), src)?;
        let remaining = &self.source[src.min(self.source.len())..];
        let atom_ref = self.arena().get(atom).expect("atom exists in arena");
        let (advanced, consumed) = concept.consume_atom(pass, atom_ref, remaining);
        let new_src = src + advanced;
        if consumed && pass == Pass::Emit {
            self.trace_push("atom", concept, src, new_src);
            self.emit_buffer.push(EmitEntry {
                concept: concept.clone(),
                start: src,
                end: new_src,
            });
        }
        Ok(ParseResult::new(
            new_src,
            if consumed { Action::Consumed } else { Action::NoMatch },
        ))
    }

    /*
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    ║                          find_token (packrat)                         ║
    ░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
    */

    /// Returns the *rhs* of the first `tokens` entry keyed by `candidate`
    /// — chaining target for [`Parser::parse_token_match`]. Cache is
    /// node-local (`NodeAtom::token_cache`) and records cache misses in
    /// [`Parser::token_scan_count`] for packrat-hit-rate instrumentation.
    fn find_token(&self, node: AtomId, candidate: AtomId) -> Option<AtomId> {
        let node_atom = self.arena().node(node)?;
        if let Some(cached) = node_atom.token_cache.borrow().get(&candidate) {
            return cached.and_then(|idx| node_atom.tokens.get(idx)).map(|(_, rhs)| *rhs);
        }
        self.scan_count.set(self.scan_count.get() + 1);
        let found = node_atom.tokens.iter().position(|&(lhs, _)| {
            if lhs == candidate {
                return true;
            }
            matches!(
                (self.arena().get(lhs), self.arena().get(candidate)),
                (Some(Atom::Concept(lhs_concept)), Some(Atom::Concept(candidate_concept)))
                    if lhs_concept.is_ancestor_of(candidate_concept)
            )
        });
        node_atom.token_cache.borrow_mut().insert(candidate, found);
        found.and_then(|idx| node_atom.tokens.get(idx)).map(|(_, rhs)| *rhs)
    }
}

struct RecursionGuard<'p, 'a> {
    parser: &'p Parser<'a>,
}

impl Drop for RecursionGuard<'_, '_> {
    fn drop(&mut self) {
        self.parser.depth.set(self.parser.depth.get() - 1);
    }
}

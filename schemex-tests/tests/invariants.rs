//! Invariants and laws the engine is expected to uphold, exercised as
//! ordinary tests rather than property-based checks (no
//! `proptest`/`quickcheck` in this crate's dependency stack).

use schemex_concepts::core_library;
use schemex_core::{Action, Parser, Pass, SchemaBuilder, TerminalKind};

fn digit_schema() -> schemex_core::Schema {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let digit = builder
        .concept_atom("language.character.utf8.digit")
        .unwrap();
    let done = builder.add_terminal(TerminalKind::Done);
    builder.add_token(root, digit, done);
    builder.build().unwrap()
}

/// Law: *Probe-emit equivalence* — for any `(atom, src)`, the `action`
/// returned by `Probe` equals that returned by the following `Emit` call.
#[test]
fn probe_emit_equivalence() {
    let schema = digit_schema();

    let probe_parser = Parser::new(&schema, b"7");
    let probe_result = probe_parser.parse(Pass::Probe, schema.root, 0).unwrap();

    let emit_parser = Parser::new(&schema, b"7");
    let emit_result = emit_parser.parse(Pass::Emit, schema.root, 0).unwrap();

    assert_eq!(probe_result.action, emit_result.action);
    assert_eq!(probe_result.source, emit_result.source);
}

/// Law: *Idempotent tracing* — toggling `trace`/`trace_emits` does not
/// change `action` or `new_source` for any call.
#[test]
fn idempotent_tracing() {
    let schema = digit_schema();

    let untraced = Parser::new(&schema, b"7");
    let untraced_result = untraced.parse(Pass::Emit, schema.root, 0).unwrap();

    let mut traced = Parser::new(&schema, b"7");
    traced.set_trace(true);
    traced.set_trace_emits(true);
    let traced_result = traced.parse(Pass::Emit, schema.root, 0).unwrap();

    assert_eq!(untraced_result.action, traced_result.action);
    assert_eq!(untraced_result.source, traced_result.source);
}

/// Invariant: a probe call leaves the emit buffer's size unchanged.
#[test]
fn probe_call_does_not_grow_emit_buffer() {
    let schema = digit_schema();
    let parser = Parser::new(&schema, b"7");
    let before = parser.emit_buffer().len();
    let _ = parser.parse(Pass::Probe, schema.root, 0).unwrap();
    assert_eq!(parser.emit_buffer().len(), before);
}

/// Invariant: an emit call that returns `NoMatch` leaves the emit
/// buffer's size unchanged.
#[test]
fn failed_emit_call_does_not_grow_emit_buffer() {
    let schema = digit_schema();
    let parser = Parser::new(&schema, b"x");
    let before = parser.emit_buffer().len();
    let result = parser.parse(Pass::Emit, schema.root, 0).unwrap();
    assert_eq!(result.action, Action::NoMatch);
    assert_eq!(parser.emit_buffer().len(), before);
}

/// Law: *Recursion bound* — with `parser_recursion_limit = k`, a
/// self-referential grammar aborts with `RecursionError` rather than
/// overflowing the native stack.
#[test]
fn recursion_bound_aborts_self_referential_grammar() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let child = builder.add_node(root, "loop");
    builder.add_expect(root, child);
    builder.add_expect(child, child);
    builder.meta_mut().parser_recursion_limit = std::num::NonZeroU32::new(8);
    let schema = builder.build().unwrap();

    let parser = Parser::new(&schema, b"x");
    let err = parser
        .parse(Pass::Emit, schema.root, 0)
        .expect_err("self-referential expects must hit the recursion limit");
    assert_eq!(err.limit, 8);
}

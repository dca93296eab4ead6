//! End-to-end scenarios covering the engine's emit and recursion behavior.

use schemex_concepts::core_library;
use schemex_core::{Compiler, Pass, Parser, SchemaBuilder, TerminalKind, TranslationUnit};

/// Scenario 1: empty schema, empty source.
#[test]
fn scenario_1_empty_schema_empty_source_succeeds_with_no_emits() {
    let builder = SchemaBuilder::new(core_library());
    let schema = builder.build().unwrap();
    let compiler = Compiler::new(&schema);
    let program = compiler.compile(vec![TranslationUnit::new("unit", Vec::new())]);
    assert!(program.is_success());
    match &program.units[0].1 {
        schemex_core::compiler::UnitOutcome::Emitted(entries) => assert!(entries.is_empty()),
        other => panic!("expected Emitted, got {other:?}"),
    }
}

/// Scenario 2: a node classified by `math.universal.number.digit`, with no
/// structural tokens of its own — realized here via the `default` terminal
/// rather than a literal `language.character.utf8.digit` lhs, since matching
/// a concept atom directly as a `tokens` lhs stages its own emit entry and
/// so cannot yield a single emit on its own. See `DESIGN.md`.
#[test]
fn scenario_2_single_digit_node_emits_its_is_a_concept_once() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let default_terminal = builder.add_terminal(TerminalKind::Default);
    let done = builder.add_terminal(TerminalKind::Done);
    builder.add_token(root, default_terminal, done);
    builder
        .set_is_a(root, &["math.universal.number.digit"])
        .unwrap();
    let schema = builder.build().unwrap();

    let compiler = Compiler::new(&schema);
    let program = compiler.compile(vec![TranslationUnit::new("unit", b"7".to_vec())]);
    assert!(program.is_success());
    match &program.units[0].1 {
        schemex_core::compiler::UnitOutcome::Emitted(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].concept.name(), "math.universal.number.digit");
            assert_eq!((entries[0].start, entries[0].end), (0, 1));
        }
        other => panic!("expected Emitted, got {other:?}"),
    }
}

/// Scenario 3: a literal-string rule with no whitespace rule to absorb a
/// trailing space fails at the space, reporting `deepest_probe = 2` as
/// `line 1, col 3`.
#[test]
fn scenario_3_trailing_space_fails_at_deepest_probe() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let literal = builder.add_terminal(TerminalKind::String(b"if".to_vec()));
    let done = builder.add_terminal(TerminalKind::Done);
    builder.add_token(root, literal, done);
    let schema = builder.build().unwrap();

    let compiler = Compiler::new(&schema);
    let program = compiler.compile(vec![TranslationUnit::new("unit", b"if ".to_vec())]);
    assert!(!program.is_success());
    let failures = program.failures();
    assert_eq!(failures.len(), 1);
    let err = failures[0].1;
    assert_eq!(err.offset, 2);
    assert_eq!((err.line, err.col), (1, 3));
}

/// Scenario 4: alternation order — `tokens = { a: done, ab: done }` against
/// `"ab"` matches `a` first (rule order), leaving `b` unplaceable;
/// `deepest_probe = 1`.
#[test]
fn scenario_4_alternation_order_leaves_trailing_byte_unplaceable() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let a = builder.add_terminal(TerminalKind::String(b"a".to_vec()));
    let ab = builder.add_terminal(TerminalKind::String(b"ab".to_vec()));
    let done_a = builder.add_terminal(TerminalKind::Done);
    let done_ab = builder.add_terminal(TerminalKind::Done);
    builder.add_token(root, a, done_a);
    builder.add_token(root, ab, done_ab);
    let schema = builder.build().unwrap();

    let compiler = Compiler::new(&schema);
    let program = compiler.compile(vec![TranslationUnit::new("unit", b"ab".to_vec())]);
    assert!(!program.is_success());
    let failures = program.failures();
    assert_eq!(err_offset(&failures), 1);
    assert_eq!((failures[0].1.line, failures[0].1.col), (1, 2));
}

fn err_offset(failures: &[(&str, &schemex_core::error::ParseError)]) -> usize {
    failures[0].1.offset
}

/// Scenario 5: packrat reuse — `find_token` scans a node's `tokens` at
/// most once per distinct candidate, across repeated top-level matches of
/// the same schema node.
#[test]
fn scenario_5_packrat_cache_avoids_repeat_scans() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();
    let digit = builder
        .concept_atom("language.character.utf8.digit")
        .unwrap();
    let done = builder.add_terminal(TerminalKind::Done);
    let node = builder.add_node(root, "digit_node");
    builder.add_token(node, digit, done);
    builder.add_expect(root, node);
    let schema = builder.build().unwrap();

    let parser = Parser::new(&schema, b"77");
    let mut cursor = 0usize;
    while cursor < 2 {
        parser.reset_deepest_probe(cursor);
        let result = parser.parse(Pass::Emit, schema.root, cursor).unwrap();
        assert_eq!(result.action, schemex_core::Action::Consumed);
        cursor = result.source;
    }
    assert_eq!(parser.token_scan_count(), 1);
}

/// Scenario 6: of two alternatives, the one that is merely probed and
/// ultimately fails must leave no trace in the committed emit sequence,
/// even though it staged an entry mid-probe.
#[test]
fn scenario_6_backtracked_alternative_leaves_no_emit() {
    let mut builder = SchemaBuilder::new(core_library());
    let root = builder.root();

    // A: digit, then requires a *second* digit (`math.universal.number.digit`)
    // immediately after — fails against the newline that actually follows,
    // discarding its already-staged digit emit.
    let math_digit = builder
        .concept_atom("math.universal.number.digit")
        .unwrap();
    let done = builder.add_terminal(TerminalKind::Done);
    let node_a = builder.add_node(root, "a");
    builder.add_token(node_a, math_digit, done);
    builder.set_is_a(node_a, &["math.universal.number.digit"]).unwrap();
    builder.add_expect(root, node_a);

    // B: digit, then a literal newline.
    let lang_digit = builder
        .concept_atom("language.character.utf8.digit")
        .unwrap();
    let lang_lf = builder.concept_atom("language.character.utf8.LF").unwrap();
    let cont = builder.add_terminal(TerminalKind::Continue);
    let done_b = builder.add_terminal(TerminalKind::Done);
    let node_b = builder.add_node(root, "b");
    builder.add_token(node_b, lang_digit, cont);
    builder.add_token(node_b, lang_lf, done_b);
    builder.add_expect(root, node_b);

    let schema = builder.build().unwrap();
    let compiler = Compiler::new(&schema);
    let program = compiler.compile(vec![TranslationUnit::new("unit", b"9\n".to_vec())]);
    assert!(program.is_success());
    match &program.units[0].1 {
        schemex_core::compiler::UnitOutcome::Emitted(entries) => {
            assert!(entries
                .iter()
                .all(|e| e.concept.name() != "math.universal.number.digit"));
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].concept.name(), "language.character.utf8.digit");
            assert_eq!(entries[1].concept.name(), "language.character.utf8.LF");
        }
        other => panic!("expected Emitted, got {other:?}"),
    }
}

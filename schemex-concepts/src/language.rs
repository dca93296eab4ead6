//! Core language concepts — UTF-8 character classes and the structural
//! placeholders above them — grounded in
//! `examples/original_source/concepts/src/core/language.cpp`.

use std::sync::Arc;

use schemex_core::{Atom, Concept, ConceptRef, ConceptRegistry, EmitAs, Pass, Unimplemented};

/// Matches one fixed byte (`language.cpp`'s `language_character_utf8<single_char<Char>>`).
#[derive(Debug)]
struct SingleChar {
    name: String,
    parent: Option<ConceptRef>,
    ch: u8,
}

impl Concept for SingleChar {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<ConceptRef> {
        self.parent.clone()
    }

    fn emit_as(&self) -> EmitAs {
        EmitAs::Postfix
    }

    fn consume_token(&self, _pass: Pass, remaining: &[u8]) -> (usize, bool) {
        match remaining.first() {
            Some(&b) if b == self.ch => (1, true),
            _ => (0, false),
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

/// Matches any one byte from a fixed set (`language.cpp`'s `multiple_chars<N>`).
#[derive(Debug)]
struct CharSet {
    name: String,
    parent: Option<ConceptRef>,
    chars: Vec<u8>,
}

impl Concept for CharSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<ConceptRef> {
        self.parent.clone()
    }

    fn emit_as(&self) -> EmitAs {
        EmitAs::Postfix
    }

    fn consume_token(&self, _pass: Pass, remaining: &[u8]) -> (usize, bool) {
        match remaining.first() {
            Some(b) if self.chars.contains(b) => (1, true),
            _ => (0, false),
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

/// Registers `neos.language`'s core concepts into `registry`, in the
/// fixed order `language.cpp:83-95` registers them.
///
/// Unlike the grounding source — whose `/* todo */` comments at
/// `language.cpp:82,86,88` leave `language.character.utf8` and its
/// children unparented — this wires the real chain:
/// `language.character` → `language.character.utf8` → each byte matcher.
pub fn register(registry: &mut ConceptRegistry) {
    registry.register(Arc::new(Unimplemented::new("language.statement", None)));
    registry.register(Arc::new(Unimplemented::new("language.whitespace", None)));
    let character = registry.register(Arc::new(Unimplemented::new("language.character", None)));
    let utf8 = registry.register(Arc::new(Unimplemented::new(
        "language.character.utf8",
        Some(character),
    )));
    registry.register(Arc::new(SingleChar {
        name: "language.character.utf8.LF".to_string(),
        parent: Some(utf8.clone()),
        ch: b'\n',
    }));
    registry.register(Arc::new(SingleChar {
        name: "language.character.utf8.CR".to_string(),
        parent: Some(utf8.clone()),
        ch: b'\r',
    }));
    registry.register(Arc::new(SingleChar {
        name: "language.character.utf8.TAB".to_string(),
        parent: Some(utf8.clone()),
        ch: b'\t',
    }));
    registry.register(Arc::new(CharSet {
        name: "language.character.utf8.digit".to_string(),
        parent: Some(utf8.clone()),
        chars: (b'0'..=b'9').collect(),
    }));
    registry.register(Arc::new(CharSet {
        name: "language.character.utf8.hexdigit".to_string(),
        parent: Some(utf8),
        chars: b"0123456789abcdefABCDEF".to_vec(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_matches_ascii_digits_only() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        let digit = registry.find("language.character.utf8.digit").unwrap();
        assert_eq!(digit.consume_token(Pass::Probe, b"5"), (1, true));
        assert_eq!(digit.consume_token(Pass::Probe, b"x"), (0, false));
    }

    #[test]
    fn lf_matches_newline_only() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        let lf = registry.find("language.character.utf8.LF").unwrap();
        assert_eq!(lf.consume_token(Pass::Probe, b"\n"), (1, true));
        assert_eq!(lf.consume_token(Pass::Probe, b"\r"), (0, false));
    }

    #[test]
    fn utf8_children_are_descendants_of_character() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        assert!(registry.is_ancestor_of("language.character", "language.character.utf8.LF"));
        assert!(registry.is_ancestor_of(
            "language.character.utf8",
            "language.character.utf8.hexdigit"
        ));
        assert!(!registry.is_ancestor_of("language.whitespace", "language.character.utf8.LF"));
    }
}

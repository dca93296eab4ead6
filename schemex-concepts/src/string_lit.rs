//! Core string concepts, grounded in
//! `examples/original_source/concepts/src/core/string.cpp`.

use std::sync::Arc;

use schemex_core::{Atom, Concept, ConceptRef, ConceptRegistry, EmitAs, Pass, Unimplemented};

/// Matches any single byte (`string.cpp`'s `string_utf8_character<any_char>`).
#[derive(Debug)]
struct AnyChar {
    name: String,
    parent: Option<ConceptRef>,
}

impl Concept for AnyChar {
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
        if remaining.is_empty() {
            (0, false)
        } else {
            (1, true)
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

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

/// `string.cpp`'s `string_utf8_character_alpha`: ASCII letters, plus any
/// byte `>= 0x80` (a crude multi-byte-UTF-8-lead-byte admission, kept
/// verbatim from the grounding source rather than replaced with a real
/// UTF-8 decoder — a Unicode-correct character model is out of scope
/// here).
#[derive(Debug)]
struct Alpha {
    parent: Option<ConceptRef>,
}

impl Concept for Alpha {
    fn name(&self) -> &str {
        "string.utf8.character.alpha"
    }

    fn parent(&self) -> Option<ConceptRef> {
        self.parent.clone()
    }

    fn emit_as(&self) -> EmitAs {
        EmitAs::Postfix
    }

    fn consume_token(&self, _pass: Pass, remaining: &[u8]) -> (usize, bool) {
        match remaining.first() {
            Some(&b) if b.is_ascii_alphabetic() || b >= 0x80 => (1, true),
            _ => (0, false),
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

/// Registers `neos.string`'s core concepts, in `string.cpp:124-139`'s
/// registration order.
pub fn register(registry: &mut ConceptRegistry) {
    let string = registry.register(Arc::new(Unimplemented::new("string", None)));
    let string_character = registry.register(Arc::new(Unimplemented::new("string.character", None)));
    registry.register(Arc::new(Unimplemented::new("string.utf8", Some(string))));
    let utf8_character = registry.register(Arc::new(AnyChar {
        name: "string.utf8.character".to_string(),
        parent: Some(string_character),
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.LF".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b'\n',
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.CR".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b'\r',
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.tab".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b'\t',
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.backslash".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b'\\',
    }));
    registry.register(Arc::new(Alpha {
        parent: Some(utf8_character.clone()),
    }));
    registry.register(Arc::new(CharSet {
        name: "string.utf8.character.digit".to_string(),
        parent: Some(utf8_character.clone()),
        chars: (b'0'..=b'9').collect(),
    }));
    registry.register(Arc::new(CharSet {
        name: "string.utf8.character.hexdigit".to_string(),
        parent: Some(utf8_character.clone()),
        chars: b"0123456789abcdefABCDEF".to_vec(),
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.period".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b'.',
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.comma".to_string(),
        parent: Some(utf8_character.clone()),
        ch: b',',
    }));
    registry.register(Arc::new(SingleChar {
        name: "string.utf8.character.underscore".to_string(),
        parent: Some(utf8_character),
        ch: b'_',
    }));
}

//! Core math concepts, grounded in
//! `examples/original_source/concepts/src/core/math.universal.cpp`.

use std::sync::Arc;

use schemex_core::{Atom, Concept, ConceptRef, ConceptRegistry, EmitAs, Pass, Unimplemented};

#[derive(Debug)]
struct AsciiDigit {
    name: String,
    parent: Option<ConceptRef>,
}

impl Concept for AsciiDigit {
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
            Some(&b) if b.is_ascii_digit() => (1, true),
            _ => (0, false),
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

#[derive(Debug)]
struct AsciiHexDigit {
    name: String,
    parent: Option<ConceptRef>,
}

impl Concept for AsciiHexDigit {
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
            Some(&b) if b.is_ascii_hexdigit() => (1, true),
            _ => (0, false),
        }
    }

    fn consume_atom(&self, pass: Pass, _atom: &Atom, remaining: &[u8]) -> (usize, bool) {
        self.consume_token(pass, remaining)
    }
}

/// Registers `neos.math.universal`'s core concepts, in
/// `math.universal.cpp:73-81`'s registration order.
///
/// `math.universal.number.point` is declared `Infix`
/// (`math.universal.cpp:75`): a decimal point sits between a number's
/// integer and fractional parts rather than trailing them, so its emit
/// entry is staged before the surrounding match recurses rather than after.
pub fn register(registry: &mut ConceptRegistry) {
    let number = registry.register(Arc::new(Unimplemented::new("math.universal.number", None)));
    registry.register(Arc::new(AsciiDigit {
        name: "math.universal.number.digit".to_string(),
        parent: Some(number.clone()),
    }));
    registry.register(Arc::new(Unimplemented::with_emit_as(
        "math.universal.number.point",
        Some(number.clone()),
        EmitAs::Infix,
    )));
    let exponent = registry.register(Arc::new(Unimplemented::new(
        "math.universal.number.exponent",
        Some(number.clone()),
    )));
    registry.register(Arc::new(Unimplemented::new(
        "math.universal.number.base",
        Some(number.clone()),
    )));
    registry.register(Arc::new(AsciiHexDigit {
        name: "math.universal.number.hexdigit".to_string(),
        parent: Some(number),
    }));
    registry.register(Arc::new(Unimplemented::new(
        "math.universal.number.exponent.positive",
        Some(exponent.clone()),
    )));
    registry.register(Arc::new(Unimplemented::new(
        "math.universal.number.exponent.negative",
        Some(exponent.clone()),
    )));
    registry.register(Arc::new(Unimplemented::new(
        "math.universal.number.exponent.digit",
        Some(exponent),
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_rejects_non_ascii_digits() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        let digit = registry.find("math.universal.number.digit").unwrap();
        assert_eq!(digit.consume_token(Pass::Probe, b"7"), (1, true));
        assert_eq!(digit.consume_token(Pass::Probe, b"a"), (0, false));
    }

    #[test]
    fn hexdigit_accepts_upper_and_lower_hex() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        let hex = registry.find("math.universal.number.hexdigit").unwrap();
        assert_eq!(hex.consume_token(Pass::Probe, b"F"), (1, true));
        assert_eq!(hex.consume_token(Pass::Probe, b"f"), (1, true));
        assert_eq!(hex.consume_token(Pass::Probe, b"g"), (0, false));
    }

    #[test]
    fn point_is_infix() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        let point = registry.find("math.universal.number.point").unwrap();
        assert_eq!(point.emit_as(), EmitAs::Infix);
    }

    #[test]
    fn exponent_digit_descends_from_exponent() {
        let mut registry = ConceptRegistry::new();
        register(&mut registry);
        assert!(registry.is_ancestor_of(
            "math.universal.number.exponent",
            "math.universal.number.exponent.digit"
        ));
    }
}

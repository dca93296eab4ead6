//! Assembles the core concept library shipped with this crate.

use schemex_core::ConceptRegistry;

use crate::{language, math, string_lit};

/// Builds a fresh [`ConceptRegistry`] populated with the core libraries,
/// in the fixed order `language`, `math`, `string` — matching the load
/// order the grounding sources are registered in by their own build.
#[must_use]
pub fn core_library() -> ConceptRegistry {
    let mut registry = ConceptRegistry::new();
    language::register(&mut registry);
    math::register(&mut registry);
    string_lit::register(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_library_registers_all_three_namespaces() {
        let registry = core_library();
        assert!(registry.find("language.character.utf8.digit").is_some());
        assert!(registry.find("math.universal.number.digit").is_some());
        assert!(registry.find("string.utf8.character").is_some());
    }

    #[test]
    fn language_is_registered_before_math_and_string() {
        let registry = core_library();
        let order = registry.registration_order();
        let language_pos = order.iter().position(|n| n == "language.statement").unwrap();
        let math_pos = order
            .iter()
            .position(|n| n == "math.universal.number")
            .unwrap();
        let string_pos = order.iter().position(|n| n == "string").unwrap();
        assert!(language_pos < math_pos);
        assert!(math_pos < string_pos);
    }
}

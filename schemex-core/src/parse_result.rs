//! The parse-result algebra.

use crate::SourceOffset;

/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                                                       ║
║                                 Action                                ║
║                                 ¯¯¯¯¯¯                                ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

/// Outcome tag returned by every parsing primitive.
///
/// `Parser` methods never invent a new variant mid-flight, they only ever
/// remap one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Advanced the cursor by at least one byte through a real match.
    Consumed,
    /// A `next` terminal fired; bubble up one level.
    ForNext,
    /// A `continue` terminal fired; restart the enclosing token loop.
    Continue,
    /// A `done` terminal fired; bubble up to the node that opened the scope.
    Done,
    /// Matched a schema-level `ignore` terminal; cursor may equal input.
    Ignored,
    /// No productive progress at this alternative.
    NoMatch,
    /// An `error` terminal fired.
    Error,
}

impl Action {
    /// `is_finished(result) = (action ∈ {ForNext, Done})`.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Action::ForNext | Action::Done)
    }
}

/// The pair `(new_source, action)` every parsing primitive returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseResult {
    pub source: SourceOffset,
    pub action: Action,
}

impl ParseResult {
    #[must_use]
    pub fn new(source: SourceOffset, action: Action) -> Self {
        Self { source, action }
    }

    /// Shorthand for a vacuous, non-advancing success at `source`.
    #[must_use]
    pub fn consumed_at(source: SourceOffset) -> Self {
        Self::new(source, Action::Consumed)
    }

    #[must_use]
    pub fn no_match(source: SourceOffset) -> Self {
        Self::new(source, Action::NoMatch)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.action.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_finished_only_for_for_next_and_done() {
        assert!(Action::ForNext.is_finished());
        assert!(Action::Done.is_finished());
        assert!(!Action::Consumed.is_finished());
        assert!(!Action::Continue.is_finished());
        assert!(!Action::Ignored.is_finished());
        assert!(!Action::NoMatch.is_finished());
        assert!(!Action::Error.is_finished());
    }
}

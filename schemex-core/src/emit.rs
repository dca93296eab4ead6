//! The emit buffer, grounded in `compiler::emitter` (`compiler.cpp:30-54`)
//! but implementing the richer, unconditional-truncate-unless-committed
//! algebra rather than the earlier draft's Emit-pass-only flush.

use std::cell::{Cell, RefCell};

use crate::concept::ConceptRef;
use crate::SourceOffset;

/// A staged `(concept, source-span)` entry.
#[derive(Debug, Clone)]
pub struct EmitEntry {
    pub concept: ConceptRef,
    pub start: SourceOffset,
    pub end: SourceOffset,
}

/// Append-only sequence of [`EmitEntry`] with per-frame commit/discard
/// semantics.
///
/// Interior mutability (rather than `&mut self` methods) is deliberate: a
/// [`EmitScope`] borrows the buffer for the lifetime of one parser frame,
/// but recursive parser calls that run *during* that frame need their own
/// access to push further entries and open their own nested scopes. A
/// `RefCell` lets the buffer behave like the C++ `emitter`'s shared
/// `emit_stack()` without fighting the borrow checker over reentrancy.
#[derive(Debug, Default)]
pub struct EmitBuffer {
    entries: RefCell<Vec<EmitEntry>>,
}

impl EmitBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, entry: EmitEntry) {
        self.entries.borrow_mut().push(entry);
    }

    fn truncate(&self, mark: usize) {
        self.entries.borrow_mut().truncate(mark);
    }

    /// Opens a scope recording the current high-water mark. Every
    /// recursive parser frame opens one of these on entry.
    #[must_use]
    pub fn open_scope(&self) -> EmitScope<'_> {
        EmitScope {
            buffer: self,
            mark: self.len(),
            committed: Cell::new(false),
        }
    }

    /// Drains and returns every committed entry, in order. Called once
    /// per top-level `compile` to hand the final sequence to the emit
    /// sink.
    pub fn drain(&self) -> Vec<EmitEntry> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

/// RAII guard for one parser frame's emitter scope.
///
/// On drop, if [`EmitScope::commit`] was never called, every entry staged
/// since the scope was opened is truncated away — this covers both the
/// probe-pass case and the emit-pass-but-failed case in one path: commit
/// only when the frame's pass was `Emit` and the frame's parse succeeded,
/// truncate otherwise.
#[must_use]
pub struct EmitScope<'a> {
    buffer: &'a EmitBuffer,
    mark: usize,
    committed: Cell<bool>,
}

impl EmitScope<'_> {
    #[must_use]
    pub fn mark(&self) -> usize {
        self.mark
    }

    /// Marks this scope's staged entries (`self.mark..`) as committed;
    /// they survive the scope's drop instead of being truncated.
    pub fn commit(&self) {
        self.committed.set(true);
    }
}

impl Drop for EmitScope<'_> {
    fn drop(&mut self) {
        if !self.committed.get() {
            self.buffer.truncate(self.mark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{Concept, EmitAs, Pass};
    use crate::atom::Atom;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Stub;
    impl Concept for Stub {
        fn name(&self) -> &str {
            "stub"
        }
        fn parent(&self) -> Option<ConceptRef> {
            None
        }
        fn emit_as(&self) -> EmitAs {
            EmitAs::Postfix
        }
        fn consume_token(&self, _pass: Pass, _remaining: &[u8]) -> (usize, bool) {
            (0, false)
        }
        fn consume_atom(&self, _pass: Pass, _atom: &Atom, _remaining: &[u8]) -> (usize, bool) {
            (0, false)
        }
    }

    fn entry() -> EmitEntry {
        EmitEntry {
            concept: ConceptRef::new(Arc::new(Stub)),
            start: 0,
            end: 1,
        }
    }

    #[test]
    fn uncommitted_scope_truncates_on_drop() {
        let buffer = EmitBuffer::new();
        {
            let scope = buffer.open_scope();
            buffer.push(entry());
            assert_eq!(buffer.len(), scope.mark() + 1);
        }
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn committed_scope_survives_drop() {
        let buffer = EmitBuffer::new();
        {
            let scope = buffer.open_scope();
            buffer.push(entry());
            scope.commit();
        }
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn nested_uncommitted_scope_does_not_disturb_outer_entries() {
        let buffer = EmitBuffer::new();
        let outer = buffer.open_scope();
        buffer.push(entry());
        {
            let inner = buffer.open_scope();
            buffer.push(entry());
            let _ = &inner;
        }
        assert_eq!(buffer.len(), 1);
        outer.commit();
        assert_eq!(buffer.len(), 1);
    }
}

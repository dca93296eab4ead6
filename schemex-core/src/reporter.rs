//! The error reporter, grounded in `compiler::throw_error`
//! (`compiler.cpp:502-517`).

use crate::error::ParseError;
use crate::SourceOffset;

/// Converts a byte offset into `source` to a 1-based `(line, col)` pair.
///
/// A single forward scan counting `\n`; matches `throw_error`'s loop
/// exactly — no tab special-casing, a tab counts as one column like any
/// other byte.
#[must_use]
pub fn line_col(source: &[u8], offset: SourceOffset) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    for &byte in &source[..offset.min(source.len())] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Builds the diagnostic for a parse failure at `offset`, in the form
/// `(<reason>) line L, col C`.
#[must_use]
pub fn report(source: &[u8], offset: SourceOffset, reason: impl Into<String>) -> ParseError {
    let (line, col) = line_col(source, offset);
    ParseError {
        reason: reason.into(),
        offset,
        line,
        col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        assert_eq!(line_col(b"abc", 0), (1, 1));
    }

    #[test]
    fn counts_across_newlines() {
        let src = b"ab\ncd\nef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 3), (2, 1));
        assert_eq!(line_col(src, 7), (3, 2));
    }

    #[test]
    fn trailing_space_offset_is_line_1_col_3() {
        // `"if "` with a trailing space and no whitespace rule to absorb
        // it: failure at offset 2 (the space).
        let (line, col) = line_col(b"if ", 2);
        assert_eq!((line, col), (1, 3));
    }

    #[test]
    fn tab_counts_as_one_column() {
        let src = b"a\tb";
        assert_eq!(line_col(src, 2), (1, 3));
    }
}

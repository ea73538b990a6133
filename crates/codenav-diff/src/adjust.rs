//! Position adjustment across a diff.
//!
//! Given the hunks of a diff from an original file to a new file, these
//! functions translate a zero-indexed position in the original file into the
//! equivalent position in the new file. Adjustment fails (returns `None`)
//! when the line was edited, removed or added between the two versions; there
//! is no nearest-line fallback.

use lsp_types::{Position, Range};

use crate::types::DiffHunk;

/// Transform a range in the original file into a range in the new file.
///
/// Succeeds only when both endpoints adjust.
pub fn adjust_range(hunks: &[DiffHunk], range: Range) -> Option<Range> {
    let start = adjust_position(hunks, range.start)?;
    let end = adjust_position(hunks, range.end)?;
    Some(Range { start, end })
}

/// Transform a position in the original file into a position in the new file.
///
/// The character offset is carried over verbatim. Returns `None` if the
/// position's line does not exist unchanged in the new file.
///
/// # Panics
///
/// Panics if a hunk claims to cover the line but its body does not contain
/// enough original-file lines to reach it. That only happens for malformed
/// diff content and is not recoverable.
pub fn adjust_position(hunks: &[DiffHunk], position: Position) -> Option<Position> {
    // Hunk headers are one-indexed.
    let line = position.line as i64 + 1;

    // Hunks are ordered; the reference hunk is the last one starting at or
    // before the target line.
    let Some(hunk) = hunks
        .iter()
        .take_while(|hunk| hunk.effective_orig_start() as i64 <= line)
        .last()
    else {
        return Some(position);
    };

    adjust_from_hunk(hunk, line, position.character)
}

/// Adjust a one-indexed original `line` using the closest preceding hunk.
fn adjust_from_hunk(hunk: &DiffHunk, line: i64, character: u32) -> Option<Position> {
    if line >= hunk.orig_end() as i64 {
        // The hunk ends before this line: shift by the hunk's net line delta.
        let delta = hunk.new_end() as i64 - hunk.orig_end() as i64;
        return to_position(line + delta - 1, character);
    }

    // Two fingers on the first line of the hunk in each file, each bumped by
    // every body line attributed to that file.
    let mut orig_offset = hunk.effective_orig_start() as i64;
    let mut new_offset = hunk.effective_new_start() as i64;

    for body_line in &hunk.body {
        let added = body_line.starts_with('+');
        let removed = body_line.starts_with('-');

        if !added {
            orig_offset += 1;
        }
        if !removed {
            new_offset += 1;
        }

        if orig_offset - 1 < line {
            continue;
        }

        if !added && !removed {
            return to_position(new_offset - 2, character);
        }

        // Edited, removed or added: nothing here matches the indexed text.
        return None;
    }

    panic!(
        "malformed hunk body: line {} lies within @@ -{},{} +{},{} @@ but the body has only {} lines",
        line,
        hunk.orig_start,
        hunk.orig_lines,
        hunk.new_start,
        hunk.new_lines,
        hunk.body.len()
    );
}

fn to_position(zero_indexed_line: i64, character: u32) -> Option<Position> {
    let line = u32::try_from(zero_indexed_line).ok()?;
    Some(Position { line, character })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    /// Original lines 10-12 become new lines 10-11; line 12 is deleted.
    fn deletion_hunk() -> DiffHunk {
        DiffHunk::new(10, 3, 10, 2, body(&[" ten", " eleven", "-twelve"]))
    }

    #[test]
    fn test_no_hunks_is_identity() {
        let pos = Position::new(42, 7);
        assert_eq!(adjust_position(&[], pos), Some(pos));
    }

    #[test]
    fn test_hunk_at_end_of_line_range() {
        let hunks = vec![DiffHunk::new(u32::MAX, 0, 1, 1, body(&["+x"]))];
        let pos = Position::new(3, 0);
        assert_eq!(adjust_position(&hunks, pos), Some(pos));
    }

    #[test]
    fn test_line_before_first_hunk_is_identity() {
        let hunks = vec![deletion_hunk()];
        for line in 0..9 {
            let pos = Position::new(line, 3);
            assert_eq!(adjust_position(&hunks, pos), Some(pos));
        }
    }

    #[test]
    fn test_line_after_hunk_shifts_by_delta() {
        let hunks = vec![deletion_hunk()];
        assert_eq!(
            adjust_position(&hunks, Position::new(20, 5)),
            Some(Position::new(19, 5))
        );
        // First line past the hunk.
        assert_eq!(
            adjust_position(&hunks, Position::new(12, 0)),
            Some(Position::new(11, 0))
        );
    }

    #[test]
    fn test_deleted_line_fails() {
        let hunks = vec![deletion_hunk()];
        assert_eq!(adjust_position(&hunks, Position::new(11, 0)), None);
    }

    #[test]
    fn test_context_line_inside_hunk_maps_through() {
        let hunks = vec![deletion_hunk()];
        assert_eq!(
            adjust_position(&hunks, Position::new(9, 2)),
            Some(Position::new(9, 2))
        );
        assert_eq!(
            adjust_position(&hunks, Position::new(10, 8)),
            Some(Position::new(10, 8))
        );
    }

    #[test]
    fn test_modified_line_fails() {
        // Line 3 replaced, and one line inserted after it.
        let hunks = vec![DiffHunk::new(
            2,
            3,
            2,
            4,
            body(&[" two", "-three", "+THREE", "+inserted", " four"]),
        )];
        assert_eq!(adjust_position(&hunks, Position::new(2, 0)), None);
        // Line 4 moves down by one.
        assert_eq!(
            adjust_position(&hunks, Position::new(3, 1)),
            Some(Position::new(4, 1))
        );
        assert_eq!(
            adjust_position(&hunks, Position::new(1, 1)),
            Some(Position::new(1, 1))
        );
    }

    #[test]
    fn test_multiple_hunks_use_closest_preceding() {
        let hunks = vec![
            // Two lines inserted after line 2.
            DiffHunk::new(2, 1, 2, 3, body(&[" two", "+a", "+b"])),
            // Line 20 removed.
            DiffHunk::new(19, 2, 21, 1, body(&[" nineteen", "-twenty"])),
        ];
        // Between the hunks: +2.
        assert_eq!(
            adjust_position(&hunks, Position::new(9, 0)),
            Some(Position::new(11, 0))
        );
        // Context line of the second hunk.
        assert_eq!(
            adjust_position(&hunks, Position::new(18, 0)),
            Some(Position::new(20, 0))
        );
        // Removed line in the second hunk.
        assert_eq!(adjust_position(&hunks, Position::new(19, 0)), None);
        // After both: +2 - 1.
        assert_eq!(
            adjust_position(&hunks, Position::new(30, 0)),
            Some(Position::new(31, 0))
        );
    }

    #[test]
    fn test_pure_insertion_does_not_move_anchor_line() {
        // Two lines inserted after original line 5.
        let hunks = vec![DiffHunk::new(5, 0, 6, 2, body(&["+a", "+b"]))];
        assert_eq!(
            adjust_position(&hunks, Position::new(4, 0)),
            Some(Position::new(4, 0))
        );
        assert_eq!(
            adjust_position(&hunks, Position::new(5, 0)),
            Some(Position::new(7, 0))
        );
    }

    #[test]
    fn test_pure_deletion() {
        // Original lines 10-11 removed.
        let hunks = vec![DiffHunk::new(10, 2, 9, 0, body(&["-a", "-b"]))];
        assert_eq!(adjust_position(&hunks, Position::new(9, 0)), None);
        assert_eq!(adjust_position(&hunks, Position::new(10, 0)), None);
        assert_eq!(
            adjust_position(&hunks, Position::new(11, 0)),
            Some(Position::new(9, 0))
        );
    }

    #[test]
    fn test_range_requires_both_endpoints() {
        let hunks = vec![deletion_hunk()];

        let inside = Range::new(Position::new(9, 1), Position::new(10, 4));
        assert_eq!(adjust_range(&hunks, inside), Some(inside));

        let shifted = Range::new(Position::new(20, 1), Position::new(21, 4));
        assert_eq!(
            adjust_range(&hunks, shifted),
            Some(Range::new(Position::new(19, 1), Position::new(20, 4)))
        );

        let bad_start = Range::new(Position::new(11, 0), Position::new(20, 0));
        assert_eq!(adjust_range(&hunks, bad_start), None);

        let bad_end = Range::new(Position::new(9, 0), Position::new(11, 0));
        assert_eq!(adjust_range(&hunks, bad_end), None);
    }

    #[test]
    #[should_panic(expected = "malformed hunk body")]
    fn test_truncated_body_panics() {
        let hunks = vec![DiffHunk::new(10, 3, 10, 3, body(&[" ten"]))];
        adjust_position(&hunks, Position::new(11, 0));
    }
}

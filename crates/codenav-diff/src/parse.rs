//! Unified diff parsing.
//!
//! Parses the output of `git diff <a> <b> -- <path>` into the hunks of that
//! single file. File headers (`diff --git`, `index`, `---`, `+++`, mode lines)
//! are skipped; each hunk consumes exactly the number of lines announced by
//! its header, so body lines such as `--- comment` are never mistaken for
//! headers.

use tracing::trace;

use crate::types::{DiffError, DiffHunk};

/// Parse unified diff text into hunks. Empty input yields no hunks.
pub fn parse_hunks(diff: &str) -> Result<Vec<DiffHunk>, DiffError> {
    let mut hunks = Vec::new();
    let mut current: Option<PendingHunk> = None;

    for line in diff.lines() {
        if let Some(pending) = current.as_mut() {
            if !pending.is_complete() {
                pending.push(line)?;
                continue;
            }
        }

        if let Some(done) = current.take() {
            hunks.push(done.hunk);
        }

        if line.starts_with("@@") {
            current = Some(PendingHunk::open(line)?);
        }
    }

    if let Some(pending) = current {
        if !pending.is_complete() {
            return Err(DiffError::TruncatedHunk(pending.header));
        }
        hunks.push(pending.hunk);
    }

    trace!(hunks = hunks.len(), "Parsed diff");
    Ok(hunks)
}

/// A hunk whose body is still being read.
struct PendingHunk {
    header: String,
    hunk: DiffHunk,
    remaining_orig: u32,
    remaining_new: u32,
}

impl PendingHunk {
    fn open(header: &str) -> Result<Self, DiffError> {
        let (orig_start, orig_lines, new_start, new_lines) = parse_header(header)?;
        Ok(Self {
            header: header.to_string(),
            hunk: DiffHunk::new(orig_start, orig_lines, new_start, new_lines, Vec::new()),
            remaining_orig: orig_lines,
            remaining_new: new_lines,
        })
    }

    fn is_complete(&self) -> bool {
        self.remaining_orig == 0 && self.remaining_new == 0
    }

    fn push(&mut self, line: &str) -> Result<(), DiffError> {
        let (orig, new) = match line.chars().next() {
            Some('+') => (0, 1),
            Some('-') => (1, 0),
            // Some tools strip the leading space of blank context lines.
            Some(' ') | None => (1, 1),
            // "\ No newline at end of file"
            Some('\\') => return Ok(()),
            Some(_) => return Err(DiffError::TruncatedHunk(self.header.clone())),
        };

        if orig > self.remaining_orig || new > self.remaining_new {
            return Err(DiffError::TruncatedHunk(self.header.clone()));
        }

        self.remaining_orig -= orig;
        self.remaining_new -= new;
        self.hunk.body.push(line.to_string());
        Ok(())
    }
}

/// Parse `@@ -a[,b] +c[,d] @@ [section]`.
fn parse_header(line: &str) -> Result<(u32, u32, u32, u32), DiffError> {
    let malformed = || DiffError::MalformedHeader(line.to_string());

    let ranges = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(malformed)?;

    let mut parts = ranges.split_whitespace();
    let orig = parts
        .next()
        .and_then(|part| part.strip_prefix('-'))
        .ok_or_else(malformed)?;
    let new = parts
        .next()
        .and_then(|part| part.strip_prefix('+'))
        .ok_or_else(malformed)?;

    let (orig_start, orig_lines) = parse_range(orig).ok_or_else(malformed)?;
    let (new_start, new_lines) = parse_range(new).ok_or_else(malformed)?;
    Ok((orig_start, orig_lines, new_start, new_lines))
}

/// Parse `start[,count]`; a missing count means one line.
///
/// The span's end, including the one-line shift of an empty span, must fit
/// in a `u32`.
fn parse_range(value: &str) -> Option<(u32, u32)> {
    let (start, count): (u32, u32) = match value.split_once(',') {
        Some((start, count)) => (start.parse().ok()?, count.parse().ok()?),
        None => (value.parse().ok()?, 1),
    };
    start.checked_add(count)?.checked_add(1)?;
    Some((start, count))
}

//! Located text edits and the record produced by one rule firing

use thiserror::Error;

use crate::tree::SourceRange;

/// Errors that can occur during edit validation or application
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit span {start}..{end} out of bounds for source length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Edit span {start}..{end} does not fall on character boundaries")]
    NotCharBoundary { start: usize, end: usize },
}

/// A single replacement against the original buffer; an empty range inserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: SourceRange,
    pub replacement: String,
}

impl TextEdit {
    /// Replace `range` with `replacement`
    pub fn replace(range: SourceRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Insert `text` at byte offset `at`
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: SourceRange::empty(at),
            replacement: text.into(),
        }
    }

    pub fn start_offset(&self) -> usize {
        self.range.start
    }

    pub fn end_offset(&self) -> usize {
        self.range.end
    }
}

/// What one rule firing hands to the host: a message and its edits.
///
/// Empty `edits` is a diagnostic-only report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// Name of the rule that fired
    pub rule: String,
    /// Byte offset the diagnostic points at
    pub anchor: usize,
    pub message: String,
    pub edits: Vec<TextEdit>,
}

impl RewriteResult {
    pub fn new(rule: impl Into<String>, anchor: usize, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            anchor,
            message: message.into(),
            edits: Vec::new(),
        }
    }

    pub fn replace(mut self, range: SourceRange, replacement: impl Into<String>) -> Self {
        self.edits.push(TextEdit::replace(range, replacement));
        self
    }

    pub fn insert(mut self, at: usize, text: impl Into<String>) -> Self {
        self.edits.push(TextEdit::insert(at, text));
        self
    }

    pub fn is_diagnostic_only(&self) -> bool {
        self.edits.is_empty()
    }

    /// True if any edit of this firing would clobber `range`
    pub fn touches(&self, range: SourceRange) -> bool {
        self.edits.iter().any(|edit| edit.range.overlaps(range))
    }

    /// Check that no two edits of this firing clobber each other
    pub fn validate(&self) -> Result<(), EditError> {
        check_overlaps(self.edits.iter())
    }
}

/// Flatten the edits of several firings, preserving firing order
pub fn collect_edits<'r>(results: impl IntoIterator<Item = &'r RewriteResult>) -> Vec<TextEdit> {
    results
        .into_iter()
        .flat_map(|result| result.edits.iter().cloned())
        .collect()
}

fn check_overlaps<'e>(edits: impl Iterator<Item = &'e TextEdit> + Clone) -> Result<(), EditError> {
    for (i, a) in edits.clone().enumerate() {
        for b in edits.clone().skip(i + 1) {
            if a.range.overlaps(b.range) {
                return Err(EditError::OverlappingEdits(a.start_offset().max(b.start_offset())));
            }
        }
    }
    Ok(())
}

/// Apply edits to an in-memory buffer.
///
/// Edits are applied from the end of the buffer towards the start so earlier
/// offsets stay valid. Insertions sharing an offset keep their input order and
/// land before a replacement starting at the same offset.
///
/// # Returns
/// * `Ok(String)` - The modified source code
/// * `Err(EditError)` - If edits overlap or fall outside the buffer
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let source_len = source.len();
    for edit in edits {
        let (start, end) = (edit.start_offset(), edit.end_offset());
        if end > source_len || start > end {
            return Err(EditError::SpanOutOfBounds {
                start,
                end,
                len: source_len,
            });
        }
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(EditError::NotCharBoundary { start, end });
        }
    }
    check_overlaps(edits.iter())?;

    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by(|&a, &b| {
        let (ea, eb) = (&edits[a], &edits[b]);
        eb.start_offset()
            .cmp(&ea.start_offset())
            .then(eb.end_offset().cmp(&ea.end_offset()))
            .then(b.cmp(&a))
    });

    let mut result = source.to_string();
    for index in order {
        let edit = &edits[index];
        result.replace_range(edit.start_offset()..edit.end_offset(), &edit.replacement);
    }

    Ok(result)
}

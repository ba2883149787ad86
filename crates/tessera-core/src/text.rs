//! # Document and Selection Values
//!
//! Minimal immutable values the engine is fed with. Fields receive them in
//! `create`; transactions carry the post-transaction versions.
//!
//! The engine treats both as opaque values and never edits them itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// TEXT
// =============================================================================

/// An immutable document. Cloning is cheap (shared buffer).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Text(Arc<str>);

impl Text {
    /// The empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The document content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of lines. An empty document has one (empty) line.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.0.bytes().filter(|&b| b == b'\n').count() + 1
    }

    /// Zero-based line containing the byte offset (clamped to the end).
    #[must_use]
    pub fn line_at(&self, offset: usize) -> usize {
        let end = offset.min(self.0.len());
        self.0.as_bytes()[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }

    /// Replace `from..to` with `insert`, producing a new document.
    ///
    /// Returns `None` if the range is out of bounds, inverted, or does not
    /// fall on character boundaries.
    #[must_use]
    pub fn replace(&self, from: usize, to: usize, insert: &str) -> Option<Text> {
        if from > to
            || to > self.0.len()
            || !self.0.is_char_boundary(from)
            || !self.0.is_char_boundary(to)
        {
            return None;
        }
        let mut out = String::with_capacity(self.0.len() - (to - from) + insert.len());
        out.push_str(&self.0[..from]);
        out.push_str(insert);
        out.push_str(&self.0[to..]);
        Some(Text::from(out))
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Text").field(&self.as_str()).finish()
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// A single selection range. `anchor == head` is a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    /// The fixed end.
    pub anchor: usize,
    /// The moving end.
    pub head: usize,
}

impl Selection {
    /// A cursor at `offset`.
    #[must_use]
    pub const fn single(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// A range from `anchor` to `head`.
    #[must_use]
    pub const fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Lower bound.
    #[must_use]
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound.
    #[must_use]
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Whether this is an empty range.
    #[must_use]
    pub const fn is_cursor(&self) -> bool {
        self.anchor == self.head
    }
}

//! Line-range annotations over a parsed diff.
//!
//! A store holds the comments for one diff view. It never holds the parsed
//! sequence itself; callers re-supply it on every mutation so validation
//! always runs against the lines currently on screen.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::DiffLine;

/// Comment identifier. Creation-time milliseconds, bumped when two comments
/// land in the same millisecond, so ids within a store are strictly increasing.
pub type CommentId = u64;

/// Inclusive range of indices into a parsed diff line sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First line index.
    pub start: usize,
    /// Last line index. Always >= `start` in a stored comment.
    pub end: usize,
}

impl LineRange {
    /// A one-line range.
    #[must_use]
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Human display form: 1-based, a single number when the range is one line.
    #[must_use]
    pub fn display(&self) -> String {
        if self.start == self.end {
            format!("{}", self.start + 1)
        } else {
            format!("{}-{}", self.start + 1, self.end + 1)
        }
    }
}

/// A user annotation anchored to a line range of one diff view.
///
/// Immutable once created: re-annotating means delete and recreate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier within the owning store.
    pub id: CommentId,
    /// Annotation text. Never empty or whitespace-only.
    pub content: String,
    /// Anchored line range.
    pub range: LineRange,
    /// Creation timestamp (milliseconds since epoch).
    pub created_at_ms: u64,
    /// Owning diff view, when known. Multi-file views always set this;
    /// the key may carry a variant suffix such as `"file (staged)"`.
    pub file_name: Option<String>,
}

/// Why a comment was refused at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AnnotationError {
    /// Comment text was empty or whitespace-only.
    #[error("comment text is empty")]
    EmptyText,
    /// Range start was greater than range end.
    #[error("inverted range: start {start} > end {end}")]
    InvertedRange {
        /// Requested start index.
        start: usize,
        /// Requested end index.
        end: usize,
    },
    /// Range referenced lines outside the parsed sequence.
    #[error("range {start}..{end} outside sequence of {len} lines")]
    OutOfBounds {
        /// Requested start index.
        start: usize,
        /// Requested end index.
        end: usize,
        /// Length of the parsed sequence.
        len: usize,
    },
}

/// Callback invoked with the full current comment set after every change.
pub type ChangeListener = Box<dyn FnMut(&[Comment])>;

/// Comments for one diff view, in insertion order.
///
/// Callers needing line order sort by `range.start` themselves; storage order
/// and display order are deliberately separate.
#[derive(Default)]
pub struct AnnotationStore {
    file_name: Option<String>,
    comments: Vec<Comment>,
    last_id: CommentId,
    listener: Option<ChangeListener>,
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("file_name", &self.file_name)
            .field("comments", &self.comments)
            .finish_non_exhaustive()
    }
}

impl AnnotationStore {
    /// Create a store with no owning view association.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose comments are tagged with the owning view's name.
    #[must_use]
    pub fn for_view(file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    /// Register the "comments changed" listener. Every successful add or
    /// delete invokes it with the full current set, so consumers can
    /// aggregate across views without the store knowing about aggregation.
    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listener = Some(listener);
    }

    /// Validate and append a comment anchored to `range` of `lines`.
    ///
    /// Refuses empty/whitespace text, inverted ranges, and ranges outside
    /// `[0, lines.len())`. On success returns the stored comment.
    pub fn add_comment(
        &mut self,
        lines: &[DiffLine],
        range: LineRange,
        text: &str,
    ) -> Result<Comment, AnnotationError> {
        if text.trim().is_empty() {
            return Err(AnnotationError::EmptyText);
        }
        if range.start > range.end {
            return Err(AnnotationError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end >= lines.len() {
            return Err(AnnotationError::OutOfBounds {
                start: range.start,
                end: range.end,
                len: lines.len(),
            });
        }

        let created_at_ms = now_ms();
        let id = created_at_ms.max(self.last_id + 1);
        self.last_id = id;

        let comment = Comment {
            id,
            content: text.to_string(),
            range,
            created_at_ms,
            file_name: self.file_name.clone(),
        };
        self.comments.push(comment.clone());
        self.notify();

        Ok(comment)
    }

    /// Delete a comment by id. Absent ids are a no-op; returns whether a
    /// comment was removed.
    pub fn delete_comment(&mut self, id: CommentId) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        let removed = self.comments.len() != before;
        if removed {
            self.notify();
        }
        removed
    }

    /// All comments, in insertion order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Number of stored comments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Whether the store has no comments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.comments);
        }
    }
}

/// Range-selection gesture state for one diff view.
///
/// A click anchors a one-line range. A drag anchors `{min, max}` of its
/// endpoints, but a drag that releases on its start line commits nothing —
/// that distinguishes a click from a degenerate drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSelection {
    anchor: Option<usize>,
}

impl RangeSelection {
    /// Fresh selection state with no gesture in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single click on `index`: a committed one-line range.
    #[must_use]
    pub fn click(index: usize) -> LineRange {
        LineRange::single(index)
    }

    /// Begin a drag gesture at `index`.
    pub fn begin_drag(&mut self, index: usize) {
        self.anchor = Some(index);
    }

    /// Whether a drag gesture is in progress.
    #[must_use]
    pub fn dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Release the drag at `index`. Returns the committed range, or None
    /// when no drag was in progress or the drag ended on its start line.
    pub fn release(&mut self, index: usize) -> Option<LineRange> {
        let anchor = self.anchor.take()?;
        if anchor == index {
            return None;
        }
        Some(LineRange {
            start: anchor.min(index),
            end: anchor.max(index),
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::parse_diff_lines;

    fn ten_lines() -> Vec<DiffLine> {
        let diff = "@@ -1,9 +1,9 @@\n a\n b\n c\n d\n e\n f\n g\n h\n i";
        let lines = parse_diff_lines(diff);
        assert_eq!(lines.len(), 10);
        lines
    }

    #[test]
    fn add_valid_comment() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        let comment = store
            .add_comment(&lines, LineRange { start: 0, end: 9 }, "ok")
            .unwrap();
        assert_eq!(comment.content, "ok");
        assert_eq!(comment.range, LineRange { start: 0, end: 9 });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rejects_inverted_range() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        let err = store
            .add_comment(&lines, LineRange { start: 5, end: 2 }, "text")
            .unwrap_err();
        assert_eq!(err, AnnotationError::InvertedRange { start: 5, end: 2 });
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_empty_and_whitespace_text() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        assert_eq!(
            store.add_comment(&lines, LineRange { start: 0, end: 9 }, ""),
            Err(AnnotationError::EmptyText)
        );
        assert_eq!(
            store.add_comment(&lines, LineRange { start: 0, end: 9 }, "  \t"),
            Err(AnnotationError::EmptyText)
        );
    }

    #[test]
    fn rejects_out_of_bounds_range() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        let err = store
            .add_comment(&lines, LineRange { start: 0, end: 10 }, "text")
            .unwrap_err();
        assert_eq!(
            err,
            AnnotationError::OutOfBounds {
                start: 0,
                end: 10,
                len: 10
            }
        );
    }

    #[test]
    fn rejects_any_range_on_empty_sequence() {
        let mut store = AnnotationStore::new();
        assert!(store
            .add_comment(&[], LineRange::single(0), "text")
            .is_err());
    }

    #[test]
    fn ids_strictly_increase() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        let a = store
            .add_comment(&lines, LineRange::single(0), "first")
            .unwrap()
            .id;
        let b = store
            .add_comment(&lines, LineRange::single(1), "second")
            .unwrap()
            .id;
        let c = store
            .add_comment(&lines, LineRange::single(2), "third")
            .unwrap()
            .id;
        assert!(a < b && b < c);
    }

    #[test]
    fn delete_absent_id_is_noop() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        store
            .add_comment(&lines, LineRange::single(3), "keep")
            .unwrap();
        assert!(!store.delete_comment(42));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_removes_by_id() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        let id = store
            .add_comment(&lines, LineRange::single(3), "gone")
            .unwrap()
            .id;
        assert!(store.delete_comment(id));
        assert!(store.is_empty());
    }

    #[test]
    fn listing_keeps_insertion_order_not_line_order() {
        let lines = ten_lines();
        let mut store = AnnotationStore::new();
        store
            .add_comment(&lines, LineRange::single(7), "later line")
            .unwrap();
        store
            .add_comment(&lines, LineRange::single(2), "earlier line")
            .unwrap();
        let starts: Vec<usize> = store.comments().iter().map(|c| c.range.start).collect();
        assert_eq!(starts, vec![7, 2]);
    }

    #[test]
    fn change_listener_sees_full_set_on_add_and_delete() {
        let lines = ten_lines();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let seen_in = Rc::clone(&seen);

        let mut store = AnnotationStore::new();
        store.on_change(Box::new(move |comments| {
            seen_in.borrow_mut().push(comments.len());
        }));

        let id = store
            .add_comment(&lines, LineRange::single(0), "a")
            .unwrap()
            .id;
        store
            .add_comment(&lines, LineRange::single(1), "b")
            .unwrap();
        store.delete_comment(id);
        // Rejected adds and absent-id deletes do not notify.
        let _ = store.add_comment(&lines, LineRange::single(0), "");
        store.delete_comment(9999);

        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }

    #[test]
    fn view_name_is_stamped_on_comments() {
        let lines = ten_lines();
        let mut store = AnnotationStore::for_view("src/lib.rs (staged)");
        let comment = store
            .add_comment(&lines, LineRange::single(1), "note")
            .unwrap();
        assert_eq!(comment.file_name.as_deref(), Some("src/lib.rs (staged)"));
    }

    #[test]
    fn click_commits_single_line() {
        assert_eq!(RangeSelection::click(4), LineRange { start: 4, end: 4 });
    }

    #[test]
    fn drag_normalizes_endpoints() {
        let mut sel = RangeSelection::new();
        sel.begin_drag(9);
        assert!(sel.dragging());
        assert_eq!(sel.release(3), Some(LineRange { start: 3, end: 9 }));
        assert!(!sel.dragging());
    }

    #[test]
    fn degenerate_drag_commits_nothing() {
        let mut sel = RangeSelection::new();
        sel.begin_drag(5);
        assert_eq!(sel.release(5), None);
        // Release without a begun drag is also nothing.
        assert_eq!(sel.release(5), None);
    }

    #[test]
    fn range_display_is_one_based() {
        assert_eq!(LineRange { start: 0, end: 0 }.display(), "1");
        assert_eq!(LineRange { start: 1, end: 3 }.display(), "2-4");
    }
}

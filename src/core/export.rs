//! Exporting annotations with their surrounding diff context.
//!
//! Produces one flat, human-readable text block per comment: the annotation
//! text, the owning file, a 1-based line-range string, and the reconstructed
//! diff slice with its original marker prefixes. The caller decides where the
//! text goes (stdout, clipboard); this module only builds the string.

use std::collections::BTreeMap;

use crate::core::{parse_diff_lines, Comment};

/// Placeholder emitted when a comment's diff text cannot be resolved.
const UNAVAILABLE: &str = "No diff content available";

/// String-keyed catalog of diff texts for export lookup.
///
/// Keys are view names, which may carry a variant suffix — the same path can
/// legitimately exist as `"file (working)"` and `"file (staged)"`. Lookup is
/// two-tier: exact key first, then a substring fallback in either direction,
/// mirroring the flexible naming used by the surrounding views. The sorted
/// map keeps the fallback scan order deterministic.
#[derive(Debug, Clone, Default)]
pub struct DiffCatalog {
    diffs: BTreeMap<String, String>,
}

impl DiffCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a diff text under a view name.
    pub fn insert(&mut self, name: impl Into<String>, diff_text: impl Into<String>) {
        self.diffs.insert(name.into(), diff_text.into());
    }

    /// Resolve the diff text owning `name`: exact key, then the first key
    /// (in sorted order) related to `name` by substring in either direction.
    /// Empty diff texts are treated as unresolvable — a vanished diff should
    /// export as unavailable, not as a zero-line slice.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(text) = self.diffs.get(name) {
            if !text.is_empty() {
                return Some(text);
            }
        }
        self.diffs
            .iter()
            .find(|(key, text)| {
                !text.is_empty() && (key.contains(name) || name.contains(key.as_str()))
            })
            .map(|(_, text)| text.as_str())
    }

    /// Number of registered diffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DiffCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (k, v) in iter {
            catalog.insert(k, v);
        }
        catalog
    }
}

/// Render `comments` into the flat export text.
///
/// Each comment's owning diff is re-parsed fresh, its stored range clamped to
/// the parsed length (the diff may have changed since the comment was made),
/// and the slice rendered with original marker prefixes; hunk lines render
/// bare. Blocks are separated by a blank line. Callers should not invoke this
/// with zero comments; the result would be the empty string.
#[must_use]
pub fn format_comments(comments: &[Comment], catalog: &DiffCatalog) -> String {
    let _timer = crate::metrics::Timer::start("format_comments");

    let blocks: Vec<String> = comments
        .iter()
        .map(|comment| {
            let file_label = comment.file_name.as_deref().unwrap_or("Unknown file");
            let code = comment
                .file_name
                .as_deref()
                .and_then(|name| catalog.resolve(name))
                .map(|diff_text| slice_for(comment, diff_text))
                .unwrap_or_else(|| UNAVAILABLE.to_string());

            format!(
                "Comment: {}\nFile: {}\nLine Range: {}\nCode:\n{}",
                comment.content,
                file_label,
                comment.range.display(),
                code
            )
        })
        .collect();

    blocks.join("\n\n")
}

/// Reconstruct the comment's diff slice with marker prefixes restored.
fn slice_for(comment: &Comment, diff_text: &str) -> String {
    let lines = parse_diff_lines(diff_text);
    if lines.is_empty() {
        return UNAVAILABLE.to_string();
    }

    let start = comment.range.start.min(lines.len() - 1);
    let end = comment.range.end.min(lines.len() - 1);

    lines[start..=end]
        .iter()
        .map(|line| format!("{}{}", line.marker(), line.content))
        .collect::<Vec<_>>()
        .join("\n")
}

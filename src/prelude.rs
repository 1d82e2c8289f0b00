//! Common re-exports for convenient importing.
//!
//! # Example
//!
//! ```rust,ignore
//! use diffnote::prelude::*;
//! ```

pub use crate::core::{
    parse_diff_lines, AnnotationStore, Comment, DiffCatalog, DiffLine, DiffLineKind, DiffSelector,
    LineRange, RepoError, RepoRoot, SearchIndex,
};

//! Core primitives for diffnote (no terminal or clipboard dependencies).

mod annotations;
mod diff;
mod export;
mod patch;
mod recent;
mod repo;
mod search;

pub use annotations::*;
pub use diff::*;
pub use export::*;
pub use patch::*;
pub use recent::*;
pub use repo::*;
pub use search::*;

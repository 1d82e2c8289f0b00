//! Git repository discovery and diff text retrieval.
//!
//! External collaborator for the core: produces raw unified-diff text and
//! branch names by shelling out to `git`. Nothing here parses diff bodies —
//! that is the line model's job.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RepoError {
    /// Path is not inside a git repository.
    #[error("not inside a git repository")]
    NotARepo,
    /// Git command failed with an error message.
    #[error("git command failed: {0}")]
    GitError(String),
    /// I/O error during git operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Git output contained invalid UTF-8.
    #[error("invalid utf-8 in git output")]
    InvalidUtf8,
}

/// Which trees a diff retrieval compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSelector {
    /// Two branches (or any two revisions).
    Branches {
        /// Comparison base.
        from: String,
        /// Comparison target.
        to: String,
    },
    /// Working tree vs index.
    WorkingTree,
    /// Index vs HEAD.
    Staged,
}

/// Canonicalized path to a git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRoot(PathBuf);

impl RepoRoot {
    /// Discover the git repository containing the given path.
    #[must_use = "this returns a Result that should be checked"]
    pub fn discover(path: &Path) -> Result<Self, RepoError> {
        let output = Command::new("git")
            .arg("rev-parse")
            .arg("--show-toplevel")
            .current_dir(path)
            .output()?;

        if !output.status.success() {
            return Err(RepoError::NotARepo);
        }

        let root = std::str::from_utf8(&output.stdout)
            .map_err(|_| RepoError::InvalidUtf8)?
            .trim();

        let canonical = PathBuf::from(root)
            .canonicalize()
            .map_err(|_| RepoError::NotARepo)?;

        Ok(Self(canonical))
    }

    /// Get the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Get the repository root as a string (for persistence keys).
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }
}

/// Run a git command in the repo and return its stdout as UTF-8.
fn git_stdout(root: &RepoRoot, args: &[&str]) -> Result<String, RepoError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root.path())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RepoError::GitError(stderr.trim().to_string()));
    }

    String::from_utf8(output.stdout).map_err(|_| RepoError::InvalidUtf8)
}

/// List local branch names.
#[must_use = "this returns a Result that should be checked"]
pub fn list_branches(root: &RepoRoot) -> Result<Vec<String>, RepoError> {
    let out = git_stdout(root, &["branch", "--list", "--format=%(refname:short)"])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Retrieve raw unified-diff text for a selector, optionally limited to one
/// file. No difference resolves to an empty string, never an error.
#[must_use = "this returns a Result that should be checked"]
pub fn diff_text(
    root: &RepoRoot,
    selector: &DiffSelector,
    file: Option<&str>,
) -> Result<String, RepoError> {
    let mut args: Vec<&str> = vec!["diff"];
    match selector {
        DiffSelector::Branches { from, to } => {
            args.push(from);
            args.push(to);
        }
        DiffSelector::WorkingTree => {}
        DiffSelector::Staged => args.push("--cached"),
    }
    if let Some(file) = file {
        args.push("--");
        args.push(file);
    }
    git_stdout(root, &args)
}

/// Per-file insertion/deletion counts from `git diff --numstat`.
/// Binary files report `-` in numstat and are returned as zero counts.
#[must_use = "this returns a Result that should be checked"]
pub fn change_stats(
    root: &RepoRoot,
    selector: &DiffSelector,
) -> Result<Vec<(String, usize, usize)>, RepoError> {
    let mut args: Vec<&str> = vec!["diff", "--numstat"];
    match selector {
        DiffSelector::Branches { from, to } => {
            args.push(from);
            args.push(to);
        }
        DiffSelector::WorkingTree => {}
        DiffSelector::Staged => args.push("--cached"),
    }
    let out = git_stdout(root, &args)?;

    Ok(out
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let insertions = parts.next()?.parse().unwrap_or(0);
            let deletions = parts.next()?.parse().unwrap_or(0);
            let path = parts.next()?;
            Some((path.to_string(), insertions, deletions))
        })
        .collect())
}

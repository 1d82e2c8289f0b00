//! Subcommand implementations: thin I/O shells around the core.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::core::{
    change_stats, diff_text, format_comments, list_branches, parse_diff_lines, split_file_patches,
    AnnotationStore, DiffCatalog, DiffLine, DiffSelector, LineRange, RecentStore, RepoRoot,
    SearchDirection, SearchIndex,
};

/// List local branches.
pub fn run_branches(cwd: &Path) -> Result<()> {
    let repo = RepoRoot::discover(cwd)?;
    for branch in list_branches(&repo)? {
        println!("{}", branch);
    }
    Ok(())
}

/// Compare two branches: print parsed per-file diffs, or `--stat` summaries.
pub fn run_compare(
    cwd: &Path,
    from: &str,
    to: &str,
    file: Option<&str>,
    stat: bool,
) -> Result<()> {
    let repo = RepoRoot::discover(cwd)?;
    let selector = DiffSelector::Branches {
        from: from.to_string(),
        to: to.to_string(),
    };

    remember(&repo, Some((from, to)));

    if stat {
        return print_stats(&repo, &selector);
    }

    let raw = diff_text(&repo, &selector, file)?;
    if raw.is_empty() {
        println!("No differences between {} and {}", from, to);
        return Ok(());
    }
    print_patches(&raw);
    Ok(())
}

/// Show uncommitted changes: working tree by default, `--staged` for the index.
pub fn run_local(cwd: &Path, staged: bool, file: Option<&str>, stat: bool) -> Result<()> {
    let repo = RepoRoot::discover(cwd)?;
    let selector = local_selector(staged);

    remember(&repo, None);

    if stat {
        return print_stats(&repo, &selector);
    }

    let raw = diff_text(&repo, &selector, file)?;
    if raw.is_empty() {
        println!("No {} changes", variant_label(staged));
        return Ok(());
    }
    print_patches(&raw);
    Ok(())
}

/// Search across every file's diff; print all matches in global order.
pub fn run_search(
    cwd: &Path,
    term: &str,
    branches: Option<(&str, &str)>,
    staged: bool,
) -> Result<()> {
    let repo = RepoRoot::discover(cwd)?;
    let (selector, variant) = match branches {
        Some((from, to)) => (
            DiffSelector::Branches {
                from: from.to_string(),
                to: to.to_string(),
            },
            None,
        ),
        None => (local_selector(staged), Some(variant_label(staged))),
    };

    remember(&repo, branches);

    let raw = diff_text(&repo, &selector, None)?;
    let corpus: Vec<(String, String)> = split_file_patches(&raw)
        .into_iter()
        .map(|p| {
            let name = match variant {
                Some(v) => format!("{} ({})", p.name, v),
                None => p.name,
            };
            (name, p.patch)
        })
        .collect();

    let mut index = SearchIndex::new();
    index.rebuild(term, corpus.iter().map(|(n, d)| (n.as_str(), d.as_str())));

    if index.total() == 0 {
        println!("No results found for \"{}\"", term);
        return Ok(());
    }

    let total = index.total();
    // Walk the full result ring once, starting from the auto-selected first
    // match, the same order next/previous navigation would visit.
    for _ in 0..total {
        if let Some(result) = index.active() {
            println!(
                "{} of {}  {}:{}  {}",
                result.global_index + 1,
                total,
                result.file_name,
                result.line_index + 1,
                result.content.trim()
            );
        }
        index.advance(SearchDirection::Forward);
    }
    Ok(())
}

/// One-shot annotate-and-export: validate a comment against the parsed diff,
/// then print (or copy) the formatted export block.
pub fn run_annotate(
    cwd: &Path,
    file: &str,
    lines_spec: &str,
    message: &str,
    branches: Option<(&str, &str)>,
    staged: bool,
    copy: bool,
) -> Result<()> {
    let repo = RepoRoot::discover(cwd)?;
    let (selector, variant) = match branches {
        Some((from, to)) => (
            DiffSelector::Branches {
                from: from.to_string(),
                to: to.to_string(),
            },
            None,
        ),
        None => (local_selector(staged), Some(variant_label(staged))),
    };

    let raw = diff_text(&repo, &selector, Some(file))?;
    if raw.is_empty() {
        bail!("no diff for {}", file);
    }

    let lines = parse_diff_lines(&raw);
    let range = parse_lines_spec(lines_spec)?;

    let view_name = match variant {
        Some(v) => format!("{} ({})", file, v),
        None => file.to_string(),
    };

    let mut store = AnnotationStore::for_view(&view_name);
    store
        .add_comment(&lines, range, message)
        .map_err(|e| anyhow!("{} (diff has {} lines)", e, lines.len()))?;

    let mut catalog = DiffCatalog::new();
    catalog.insert(view_name, raw);

    let export = format_comments(store.comments(), &catalog);
    if copy {
        let mut clipboard = arboard::Clipboard::new().context("failed to open clipboard")?;
        clipboard
            .set_text(export)
            .context("failed to write clipboard")?;
        println!("Copied 1 annotation to clipboard");
    } else {
        println!("{}", export);
    }
    Ok(())
}

/// List recently opened repositories with their last branch pair.
pub fn run_recent() -> Result<()> {
    let store = RecentStore::open_default();
    if store.recent().is_empty() {
        println!("No recent repositories");
        return Ok(());
    }
    for repo in store.recent() {
        match (&repo.last_from, &repo.last_to) {
            (Some(from), Some(to)) => println!("{}  ({}..{})", repo.path, from, to),
            _ => println!("{}", repo.path),
        }
    }
    Ok(())
}

/// Record the repository (and branch pair, when comparing) in the recents
/// file. Persistence failures never block the session.
fn remember(repo: &RepoRoot, branches: Option<(&str, &str)>) {
    let mut store = RecentStore::open_default();
    store.record_open(repo.as_str());
    if let Some((from, to)) = branches {
        store.record_branches(repo.as_str(), from, to);
    }
    let _ = store.save();
}

fn local_selector(staged: bool) -> DiffSelector {
    if staged {
        DiffSelector::Staged
    } else {
        DiffSelector::WorkingTree
    }
}

fn variant_label(staged: bool) -> &'static str {
    if staged {
        "staged"
    } else {
        "working"
    }
}

/// Parse a 1-based inclusive `--lines` spec: `12` or `4..7`.
fn parse_lines_spec(spec: &str) -> Result<LineRange> {
    let parse_one = |s: &str| -> Result<usize> {
        let n: usize = s
            .trim()
            .parse()
            .with_context(|| format!("invalid line number: {}", s))?;
        if n == 0 {
            bail!("line numbers are 1-based");
        }
        Ok(n - 1)
    };

    match spec.split_once("..") {
        Some((start, end)) => Ok(LineRange {
            start: parse_one(start)?,
            end: parse_one(end)?,
        }),
        None => Ok(LineRange::single(parse_one(spec)?)),
    }
}

/// Print each file's patch with a dual line-number gutter.
fn print_patches(raw: &str) {
    let patches = split_file_patches(raw);
    for (i, patch) in patches.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "{}  (+{} -{})",
            patch.name, patch.insertions, patch.deletions
        );
        for line in parse_diff_lines(&patch.patch) {
            println!("{}", render_line(&line));
        }
    }
}

/// One gutter-prefixed output row: old number, new number, marker, content.
fn render_line(line: &DiffLine) -> String {
    let old = line
        .old_line
        .map(|n| n.to_string())
        .unwrap_or_default();
    let new = line
        .new_line
        .map(|n| n.to_string())
        .unwrap_or_default();
    format!("{:>5} {:>5} {}{}", old, new, line.marker(), line.content)
}

fn print_stats(repo: &RepoRoot, selector: &DiffSelector) -> Result<()> {
    let stats = change_stats(repo, selector)?;
    if stats.is_empty() {
        println!("No changes");
        return Ok(());
    }
    let mut insertions = 0;
    let mut deletions = 0;
    for (path, ins, del) in &stats {
        println!("{:>6} {:>6}  {}", format!("+{}", ins), format!("-{}", del), path);
        insertions += ins;
        deletions += del;
    }
    println!(
        "{} file(s), +{} -{}",
        stats.len(),
        insertions,
        deletions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_spec_single() {
        assert_eq!(parse_lines_spec("12").unwrap(), LineRange::single(11));
    }

    #[test]
    fn lines_spec_range() {
        assert_eq!(
            parse_lines_spec("4..7").unwrap(),
            LineRange { start: 3, end: 6 }
        );
    }

    #[test]
    fn lines_spec_rejects_zero_and_garbage() {
        assert!(parse_lines_spec("0").is_err());
        assert!(parse_lines_spec("a..b").is_err());
    }

    #[test]
    fn render_line_aligns_gutter() {
        let lines = parse_diff_lines("@@ -1,1 +1,2 @@\n ctx\n+add");
        assert_eq!(render_line(&lines[1]), "    1     1  ctx");
        assert_eq!(render_line(&lines[2]), "          2 +add");
    }
}

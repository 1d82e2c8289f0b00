//! diffnote - browse git diffs, annotate line ranges, export review notes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Browse git diffs, annotate line ranges, search across files.
#[derive(Parser, Debug)]
#[command(name = "diffnote", version, about)]
struct Cli {
    /// Repository to operate on (defaults to the current directory)
    #[arg(short = 'C', long = "repo", value_name = "PATH", global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List local branches
    Branches,

    /// Compare two branches and print the parsed diff
    Compare {
        /// Comparison base branch
        from: String,
        /// Comparison target branch
        to: String,
        /// Limit to a single file
        #[arg(short = 'f', long = "file", value_name = "PATH")]
        file: Option<String>,
        /// Print per-file change statistics instead of the diff
        #[arg(long)]
        stat: bool,
    },

    /// Show uncommitted local changes
    Local {
        /// Show staged changes instead of working-tree changes
        #[arg(long)]
        staged: bool,
        /// Limit to a single file
        #[arg(short = 'f', long = "file", value_name = "PATH")]
        file: Option<String>,
        /// Print per-file change statistics instead of the diff
        #[arg(long)]
        stat: bool,
    },

    /// Search across every file's diff
    Search {
        /// Case-insensitive substring to find
        term: String,
        /// Comparison base branch (requires --to)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Comparison target branch (requires --from)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Search staged changes instead of working-tree changes
        #[arg(long, conflicts_with_all = ["from", "to"])]
        staged: bool,
    },

    /// Annotate a line range and export the formatted block
    Annotate {
        /// File whose diff the annotation targets
        #[arg(short = 'f', long = "file", value_name = "PATH")]
        file: String,
        /// 1-based inclusive line range into the parsed diff: `12` or `4..7`
        #[arg(short = 'l', long = "lines", value_name = "RANGE")]
        lines: String,
        /// Annotation text
        #[arg(short = 'm', long = "message")]
        message: String,
        /// Comparison base branch (requires --to)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Comparison target branch (requires --from)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Annotate staged changes instead of working-tree changes
        #[arg(long, conflicts_with_all = ["from", "to"])]
        staged: bool,
        /// Copy the export to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,
    },

    /// List recently opened repositories
    Recent,
}

fn main() -> ExitCode {
    diffnote::metrics::init();

    let cli = Cli::parse();
    let cwd = cli
        .repo
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let result = match &cli.command {
        Command::Branches => diffnote::cli::run_branches(&cwd),
        Command::Compare {
            from,
            to,
            file,
            stat,
        } => diffnote::cli::run_compare(&cwd, from, to, file.as_deref(), *stat),
        Command::Local { staged, file, stat } => {
            diffnote::cli::run_local(&cwd, *staged, file.as_deref(), *stat)
        }
        Command::Search {
            term,
            from,
            to,
            staged,
        } => {
            let branches = from.as_deref().zip(to.as_deref());
            diffnote::cli::run_search(&cwd, term, branches, *staged)
        }
        Command::Annotate {
            file,
            lines,
            message,
            from,
            to,
            staged,
            copy,
        } => {
            let branches = from.as_deref().zip(to.as_deref());
            diffnote::cli::run_annotate(&cwd, file, lines, message, branches, *staged, *copy)
        }
        Command::Recent => diffnote::cli::run_recent(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

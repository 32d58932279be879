//! # Panedit - Directory Listings as Text
//!
//! Opens each directory as a pane, replays a vim-style key script over the
//! panes and prints the resulting filesystem change plan as JSON. Nothing
//! on disk is touched; applying the plan is left to the caller.
//!
//! ## Quick Start
//!
//! ```bash
//! # Rename the first entry of ./photos
//! cargo run -- photos --keys 'cinholiday<Esc>'
//!
//! # Move the first entry of ./inbox into ./archive
//! cargo run -- inbox archive --keys 'dd<Tab>p'
//! ```

mod listing;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panedit_core::{Change, Command, Config, Conflict, Session};

use listing::FsSource;

/// Panedit - edit directory listings like text
#[derive(Parser, Debug)]
#[command(name = "panedit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directories to open, one pane each
    #[arg(value_name = "DIR", required = true)]
    dirs: Vec<PathBuf>,

    /// Keys to replay, e.g. `dd<Tab>p` or `Afoo<Esc>`
    #[arg(short, long, value_name = "SCRIPT", default_value = "")]
    keys: String,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List dot-files too
    #[arg(short = 'a', long)]
    all: bool,

    /// Pretty-print the JSON plan
    #[arg(short, long)]
    pretty: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// What gets printed.
#[derive(Serialize)]
struct Report<'a> {
    changes: &'a [Change],
    conflicts: Vec<Conflict>,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging; stdout carries the plan, so logs go to stderr
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting panedit v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    let mut session = Session::with_config(config, FsSource::new(args.all));
    let dirs = open_panes(&mut session, &args.dirs)?;
    if let Some(first) = dirs.first() {
        session.execute(Command::FocusBuffer(first.clone()))?;
    }

    session
        .run_script(&args.keys)
        .context("failed to replay keys")?;

    let plan = session.plan();
    let report = Report {
        changes: plan.changes(),
        conflicts: plan.conflicts(),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    plan.validate().context("plan cannot be applied")?;
    Ok(())
}

/// Opens one pane per directory, returning their canonical paths.
fn open_panes(session: &mut Session, dirs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut opened = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let path = dir
            .canonicalize()
            .with_context(|| format!("cannot open {}", dir.display()))?;
        session.open_directory(&path)?;
        opened.push(path);
    }
    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["panedit", "."]);
        assert_eq!(args.dirs, [PathBuf::from(".")]);
        assert!(args.keys.is_empty());
        assert!(!args.all);
    }

    #[test]
    fn test_args_require_directory() {
        assert!(Args::try_parse_from(["panedit"]).is_err());
    }

    #[test]
    fn test_args_with_keys() {
        let args = Args::parse_from(["panedit", "a", "b", "--keys", "dd<Tab>p", "-vv"]);
        assert_eq!(args.dirs.len(), 2);
        assert_eq!(args.keys, "dd<Tab>p");
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_move_between_real_directories() {
        let root = tempdir().unwrap();
        let inbox = root.path().join("inbox");
        let archive = root.path().join("archive");
        std::fs::create_dir(&inbox).unwrap();
        std::fs::create_dir(&archive).unwrap();
        std::fs::write(inbox.join("report.pdf"), "").unwrap();

        let mut session = Session::new(FsSource::default());
        let dirs = open_panes(&mut session, &[inbox, archive]).unwrap();
        session.execute(Command::FocusBuffer(dirs[0].clone())).unwrap();
        session.run_script("dd<Tab>p").unwrap();

        let plan = session.plan();
        assert_eq!(plan.len(), 1);
        match &plan.changes()[0] {
            Change::Rename {
                item,
                new_directory,
                new_name,
            } => {
                assert_eq!(item.name, "report.pdf");
                assert_eq!(new_directory, &dirs[1]);
                assert_eq!(new_name, "report.pdf");
            }
            other => panic!("expected a rename, got {other:?}"),
        }
    }
}

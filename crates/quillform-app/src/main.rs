// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quillform — scan your handwriting, write anything with it.
//
// Entry point. Initialises logging, parses the command line and dispatches
// to the session service.

mod cli;
mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use quillform_core::config::QuillformConfig;
use quillform_core::error::{QuillformError, Result};
use quillform_core::human_errors::humanize_error;
use quillform_core::store::DirGlyphStore;
use quillform_document::PdfReader;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use cli::{Cli, Command};
use services::data_dir;
use services::session::Session;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match cli::parse(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            cli::print_usage();
            return ExitCode::from(2);
        }
    };

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let human = humanize_error(&e);
            eprintln!("{}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %e, severity = ?human.severity, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `Ok(false)` means it finished but some inputs failed.
fn run(cli: Cli) -> Result<bool> {
    if cli.command == Command::Help {
        cli::print_usage();
        return Ok(true);
    }
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Form { out } => {
            let session = Session::new(config)?;
            let pdf = session.form_pdf()?;
            std::fs::write(&out, &pdf)?;
            let pages = PdfReader::from_bytes(&pdf)?.page_count();
            println!(
                "Wrote {} ({} pages, {} sections, {} slots at {} variations)",
                out.display(),
                pages,
                session.progress().1,
                session.catalog().len(),
                session.config().variation_count
            );
            Ok(true)
        }
        Command::Scan {
            store,
            section,
            images,
        } => scan(config, store, section, &images),
        Command::Write {
            store,
            text,
            out,
            seed,
        } => {
            let session = open_session(config, store)?;
            if session.font().is_empty() {
                warn!("no glyphs scanned yet, pages will be blank");
            }
            let text = std::fs::read_to_string(&text)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let pdf = session.synthesize_pdf(&text, &mut rng)?;
            std::fs::write(&out, &pdf)?;
            let pages = PdfReader::from_bytes(&pdf)?.page_count();
            println!("Wrote {} ({} pages)", out.display(), pages);
            Ok(true)
        }
        Command::Help => Ok(true),
    }
}

fn scan(
    config: QuillformConfig,
    store: Option<PathBuf>,
    section: Option<u32>,
    paths: &[PathBuf],
) -> Result<bool> {
    let mut session = open_session(config, store)?;

    let mut loaded = Vec::new();
    let mut photos = Vec::new();
    let mut all_ok = true;
    for path in paths {
        match image::open(path) {
            Ok(img) => {
                loaded.push(path);
                photos.push(img.to_rgb8());
            }
            Err(err) => {
                let e = QuillformError::ImageError(format!("{}: {err}", path.display()));
                eprintln!("{}: {}", path.display(), humanize_error(&e).message);
                all_ok = false;
            }
        }
    }

    let results = session.ingest_batch(&photos, section);
    for (path, result) in loaded.iter().zip(results) {
        match result {
            Ok(scan) => {
                println!(
                    "{}: section {} - {}/{} glyphs",
                    path.display(),
                    scan.section_id,
                    scan.detected,
                    scan.total
                );
                if !scan.missing.is_empty() {
                    println!("  empty: {}", scan.missing.join(" "));
                }
            }
            Err(e) => {
                let human = humanize_error(&e);
                eprintln!("{}: {}", path.display(), human.message);
                eprintln!("  {}", human.suggestion);
                all_ok = false;
            }
        }
    }

    let (done, total) = session.progress();
    println!("{done} of {total} sections scanned");
    let remaining: Vec<String> = (0..total)
        .filter(|id| !session.completed_sections().contains(id))
        .map(|id| id.to_string())
        .collect();
    if !remaining.is_empty() {
        println!("  still to scan: {}", remaining.join(" "));
    }
    Ok(all_ok)
}

fn open_session(config: QuillformConfig, store: Option<PathBuf>) -> Result<Session> {
    let root = store.unwrap_or_else(data_dir::default_store);
    Session::with_store(config, DirGlyphStore::open(root)?)
}

/// An explicit `--config` must exist; otherwise use the data directory's
/// config file if there is one, then the defaults.
fn load_config(explicit: Option<&Path>) -> Result<QuillformConfig> {
    if let Some(path) = explicit {
        return QuillformConfig::load(path);
    }
    let path = data_dir::config_path(&data_dir::data_dir());
    if path.exists() {
        return QuillformConfig::load(&path);
    }
    info!("no configuration file, using defaults");
    Ok(QuillformConfig::default())
}

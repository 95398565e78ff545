// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line parsing. Plain `std::env::args()` matching.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the printable form.
    Form { out: PathBuf },
    /// Scan photographed sections into the glyph store.
    Scan {
        store: Option<PathBuf>,
        section: Option<u32>,
        images: Vec<PathBuf>,
    },
    /// Write a text file out as handwriting.
    Write {
        store: Option<PathBuf>,
        text: PathBuf,
        out: PathBuf,
        seed: Option<u64>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub command: Command,
}

/// Parse everything after the program name. Options may come before or
/// after the command; the first bare word names the command and any later
/// bare words are image paths.
pub fn parse(args: &[String]) -> Result<Cli, String> {
    let mut name: Option<&str> = None;
    let mut config = None;
    let mut out = None;
    let mut store = None;
    let mut section = None;
    let mut text = None;
    let mut seed = None;
    let mut help = false;
    let mut images = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => config = Some(PathBuf::from(value(args, &mut i, "--config")?)),
            "--out" => out = Some(PathBuf::from(value(args, &mut i, "--out")?)),
            "--store" => store = Some(PathBuf::from(value(args, &mut i, "--store")?)),
            "--text" => text = Some(PathBuf::from(value(args, &mut i, "--text")?)),
            "--section" => {
                let raw = value(args, &mut i, "--section")?;
                section = Some(
                    raw.parse()
                        .map_err(|_| format!("--section requires a section number, got {raw:?}"))?,
                );
            }
            "--seed" => {
                let raw = value(args, &mut i, "--seed")?;
                seed = Some(
                    raw.parse()
                        .map_err(|_| format!("--seed requires a whole number, got {raw:?}"))?,
                );
            }
            "--help" | "-h" => help = true,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown argument: {flag}"));
            }
            word if name.is_none() => name = Some(word),
            path => images.push(PathBuf::from(path)),
        }
        i += 1;
    }

    if help {
        return Ok(Cli {
            config,
            command: Command::Help,
        });
    }
    let Some(name) = name else {
        return Ok(Cli {
            config,
            command: Command::Help,
        });
    };
    if let Some(stray) = images.first().filter(|_| name != "scan") {
        return Err(format!("unexpected argument: {}", stray.display()));
    }

    let command = match name {
        "form" => Command::Form {
            out: out.ok_or("form requires --out FILE")?,
        },
        "scan" => {
            if images.is_empty() {
                return Err("scan requires at least one image".into());
            }
            Command::Scan {
                store,
                section,
                images,
            }
        }
        "write" => Command::Write {
            store,
            text: text.ok_or("write requires --text FILE")?,
            out: out.ok_or("write requires --out FILE")?,
            seed,
        },
        "help" => Command::Help,
        other => return Err(format!("Unknown command: {other}")),
    };

    Ok(Cli { config, command })
}

fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

pub fn print_usage() {
    println!("Usage: quillform [--config FILE] <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  form  --out FILE                      Render the blank form as a PDF");
    println!("  scan  [--store DIR] [--section N] IMAGE...");
    println!("                                        Scan photographed form sections");
    println!("  write [--store DIR] --text FILE --out FILE [--seed N]");
    println!("                                        Write a text file as handwriting");
    println!();
    println!("Options:");
    println!("  --config FILE   Settings file (default: config.json in the data directory)");
    println!("  --help, -h      Show this help");
}

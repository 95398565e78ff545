// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "quillform";
const CONFIG_FILE: &str = "config.json";
const GLYPH_DIR: &str = "glyphs";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> PathBuf {
    let dir = resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    );
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Where scanned glyphs live unless `--store` says otherwise.
pub fn default_store() -> PathBuf {
    data_dir().join(GLYPH_DIR)
}

/// The configuration file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    let base = match (xdg, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg,
        (_, Some(home)) => home.join(".local").join("share"),
        // Last resort
        _ => PathBuf::from("/tmp"),
    };
    base.join(APP_DIR)
}

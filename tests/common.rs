//! Shared test utilities for integration tests.
//!
//! Provides a sample notes export and helpers for writing scratch files used
//! across multiple test files.

#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Export with a nested folder tree, tags and cross-note links.
pub const SAMPLE_EXPORT: &str = r###"{
  "notes": [
    {
      "id": "folder-1",
      "title": "Acme Corp",
      "type": "folder",
      "created": 1712345678901,
      "updated": 1712345678901,
      "expanded": true,
      "children": [
        {
          "id": "folder-2",
          "title": "Recon",
          "type": "folder",
          "children": [
            {
              "id": "note-1712345678901-1",
              "title": "Port Scan",
              "type": "note",
              "content": "# Port Scan\n\n| Port | Service |\n|------|---------|\n| 22 | ssh |\n| 80 | http |\n\nWeb app covered in [[note-1712345678901-2|SQL Injection]].\n",
              "tags": ["tag-recon"]
            }
          ]
        },
        {
          "id": "note-1712345678901-2",
          "title": "SQL Injection",
          "type": "note",
          "content": "## Vulnerable Parameter\n\n```bash\nsqlmap -u \"http://acme.local/item?id=1\" --dbs\n```\n\n[x] Confirmed\n[ ] Reported\n\nBack to [[note-1712345678901-1|Port Scan]], see also [[note-999|Ghost]].",
          "tags": ["tag-critical", "tag-web"]
        }
      ]
    }
  ],
  "tags": [
    { "id": "tag-recon", "name": "recon", "color": "tag-info" },
    { "id": "tag-critical", "name": "critical", "color": "tag-critical" },
    { "id": "tag-web", "name": "web" }
  ],
  "commands": [],
  "version": "1.0.0"
}"###;

/// Id of the port scan note in [`SAMPLE_EXPORT`].
pub const PORT_SCAN_ID: &str = "note-1712345678901-1";

/// Id of the SQL injection note in [`SAMPLE_EXPORT`].
pub const SQLI_ID: &str = "note-1712345678901-2";

/// Writes file below `dir`, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(dir: &Path, path: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates scratch directory holding `notes.json` with [`SAMPLE_EXPORT`].
///
/// # Returns
///
/// Temporary directory and path of the export file
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn sample_export_dir() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = write_file(dir.path(), "notes.json", SAMPLE_EXPORT)?;
    Ok((dir, path))
}

/// Deterministic pseudo random markdown-ish text.
///
/// Mixes markup characters heavily so unbalanced constructs are common.
pub fn noisy_markdown(len: usize, seed: u64) -> String {
    const ALPHABET: &[u8] = b"abc XYZ 019 *_`#|-[]()!>:\n\n\t&<>\"'x";
    let mut state = seed;
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let idx = ((state >> 33) as usize) % ALPHABET.len();
        out.push(ALPHABET[idx] as char);
    }
    out
}

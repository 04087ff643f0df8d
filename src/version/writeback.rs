//! Format-preserving version write-back.
//!
//! Rewrites the `version` key of the project manifest (e.g. `pyproject.toml`)
//! so the shipped source carries the version it was released as. Formatting
//! and comments in the file are preserved.

use crate::error::{Result, VersioningError};
use semver::Version;
use std::path::Path;
use toml_edit::DocumentMut;

// Tables searched for a `version` key, in order
const VERSION_TABLES: &[&str] = &["project", "package"];

/// Update the version key in a manifest file, preserving formatting.
///
/// Looks for a `version` key in the `[project]` or `[package]` table, falling
/// back to a top-level key. A manifest with no recognizable version key is an
/// error rather than a silent no-op.
pub fn update_manifest_version(path: &Path, version: &Version) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| VersioningError::WriteBackFailed {
        path: path.to_path_buf(),
        reason: format!("failed to read file: {}", e),
    })?;

    let mut doc: DocumentMut =
        content
            .parse()
            .map_err(|e: toml_edit::TomlError| VersioningError::WriteBackFailed {
                path: path.to_path_buf(),
                reason: format!("failed to parse TOML: {}", e),
            })?;

    if !set_version_key(&mut doc, version) {
        return Err(VersioningError::WriteBackFailed {
            path: path.to_path_buf(),
            reason: "no 'version' key found in [project], [package], or top level".to_string(),
        }
        .into());
    }

    std::fs::write(path, doc.to_string()).map_err(|e| VersioningError::WriteBackFailed {
        path: path.to_path_buf(),
        reason: format!("failed to write file: {}", e),
    })?;

    Ok(())
}

fn set_version_key(doc: &mut DocumentMut, version: &Version) -> bool {
    for table in VERSION_TABLES {
        if let Some(item) = doc.get_mut(table)
            && let Some(table) = item.as_table_like_mut()
            && table.contains_key("version")
        {
            table.insert("version", toml_edit::value(version.to_string()));
            return true;
        }
    }

    if doc.contains_key("version") {
        doc["version"] = toml_edit::value(version.to_string());
        return true;
    }

    false
}

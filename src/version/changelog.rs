//! Changelog rendering and updating.
//!
//! Every published release prepends one section to the changelog, grouped by
//! the kind of change. The file is created with a standard header when absent.

use crate::error::{Result, VersioningError};
use crate::version::ReleaseNote;
use crate::version::conventional::{CommitKind, ConventionalCommit};
use chrono::NaiveDate;
use semver::Version;
use std::path::Path;

const CHANGELOG_HEADER: &str = "# Changelog";

/// Section of a changelog entry a note is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoteSection {
    /// Breaking changes
    Breaking,
    /// New features
    Features,
    /// Bug fixes
    Fixes,
    /// Performance improvements
    Performance,
}

impl NoteSection {
    /// Section classification for a parsed commit, `None` when unlisted
    pub fn classify(commit: &ConventionalCommit) -> Option<Self> {
        if commit.breaking {
            return Some(NoteSection::Breaking);
        }
        match commit.kind {
            CommitKind::Feat => Some(NoteSection::Features),
            CommitKind::Fix => Some(NoteSection::Fixes),
            CommitKind::Perf => Some(NoteSection::Performance),
            _ => None,
        }
    }

    fn heading(self) -> &'static str {
        match self {
            NoteSection::Breaking => "Breaking Changes",
            NoteSection::Features => "Features",
            NoteSection::Fixes => "Bug Fixes",
            NoteSection::Performance => "Performance",
        }
    }
}

/// Render the changelog section for one release
pub fn render_entry(version: &Version, date: NaiveDate, notes: &[ReleaseNote]) -> String {
    let mut entry = format!("## v{} - {}\n", version, date.format("%Y-%m-%d"));

    for section in [
        NoteSection::Breaking,
        NoteSection::Features,
        NoteSection::Fixes,
        NoteSection::Performance,
    ] {
        let in_section: Vec<&ReleaseNote> =
            notes.iter().filter(|n| n.section == section).collect();
        if in_section.is_empty() {
            continue;
        }

        entry.push_str(&format!("\n### {}\n\n", section.heading()));
        for note in in_section {
            match &note.scope {
                Some(scope) => entry.push_str(&format!(
                    "- **{}**: {} ({})\n",
                    scope, note.description, note.short_hash
                )),
                None => {
                    entry.push_str(&format!("- {} ({})\n", note.description, note.short_hash))
                }
            }
        }
    }

    entry
}

/// Prepend a rendered entry to the changelog file, keeping its header first
pub fn prepend_entry(path: &Path, entry: &str) -> Result<()> {
    let existing = if path.exists() {
        std::fs::read_to_string(path).map_err(|e| VersioningError::ChangelogFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    } else {
        format!("{}\n", CHANGELOG_HEADER)
    };

    let (header, rest) = match existing.split_once('\n') {
        Some((first, rest)) if first.starts_with("# ") => (first.to_string(), rest.to_string()),
        _ => (CHANGELOG_HEADER.to_string(), existing),
    };

    let rest = rest.trim_start_matches('\n');
    let mut updated = format!("{}\n\n{}", header, entry);
    if !rest.is_empty() {
        updated.push('\n');
        updated.push_str(rest);
    }

    std::fs::write(path, updated).map_err(|e| VersioningError::ChangelogFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(section: NoteSection, description: &str, short_hash: &str) -> ReleaseNote {
        ReleaseNote {
            section,
            scope: None,
            description: description.to_string(),
            short_hash: short_hash.to_string(),
        }
    }

    #[test]
    fn test_render_entry_groups_sections() {
        let notes = vec![
            note(NoteSection::Fixes, "resolve handler panic", "a1b2c3d"),
            note(NoteSection::Features, "add report export", "d4e5f6a"),
            note(NoteSection::Breaking, "drop v1 endpoints", "0011223"),
        ];
        let entry = render_entry(
            &Version::new(1, 3, 0),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &notes,
        );

        assert!(entry.starts_with("## v1.3.0 - 2026-08-07"));
        let breaking = entry.find("### Breaking Changes").unwrap();
        let features = entry.find("### Features").unwrap();
        let fixes = entry.find("### Bug Fixes").unwrap();
        assert!(breaking < features && features < fixes);
        assert!(entry.contains("- resolve handler panic (a1b2c3d)"));
    }

    #[test]
    fn test_render_entry_omits_empty_sections() {
        let notes = vec![note(NoteSection::Fixes, "resolve handler panic", "a1b2c3d")];
        let entry = render_entry(
            &Version::new(1, 2, 1),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &notes,
        );
        assert!(!entry.contains("### Features"));
        assert!(!entry.contains("### Breaking Changes"));
    }

    #[test]
    fn test_render_entry_scoped_note() {
        let notes = vec![ReleaseNote {
            section: NoteSection::Features,
            scope: Some("api".to_string()),
            description: "add report export".to_string(),
            short_hash: "d4e5f6a".to_string(),
        }];
        let entry = render_entry(
            &Version::new(1, 3, 0),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &notes,
        );
        assert!(entry.contains("- **api**: add report export (d4e5f6a)"));
    }

    #[test]
    fn test_prepend_creates_changelog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHANGELOG.md");

        prepend_entry(&path, "## v0.1.0 - 2026-08-07\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Changelog\n\n## v0.1.0"));
    }

    #[test]
    fn test_prepend_keeps_newest_entry_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHANGELOG.md");

        prepend_entry(&path, "## v0.1.0 - 2026-08-01\n").unwrap();
        prepend_entry(&path, "## v0.1.1 - 2026-08-07\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let newest = content.find("## v0.1.1").unwrap();
        let oldest = content.find("## v0.1.0").unwrap();
        assert!(newest < oldest);
        assert_eq!(content.matches("# Changelog").count(), 1);
    }
}

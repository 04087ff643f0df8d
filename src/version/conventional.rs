//! Conventional-commit parsing.
//!
//! Commit summaries are matched against the `type(scope)!: description`
//! grammar. Messages that do not conform are not an error here; the
//! configured policy decides what a fully non-conforming history means.

use crate::error::{Result, VersioningError};
use regex::Regex;

/// Version bump a set of commits warrants, ordered by precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpLevel {
    /// No release-worthy change
    None,
    /// Backwards-compatible fix
    Patch,
    /// Backwards-compatible feature
    Minor,
    /// Breaking change
    Major,
}

/// Recognized conventional-commit types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitKind {
    /// A new feature
    Feat,
    /// A bug fix
    Fix,
    /// A performance improvement
    Perf,
    /// A code restructuring without behavior change
    Refactor,
    /// Documentation only
    Docs,
    /// Formatting only
    Style,
    /// Test changes
    Test,
    /// Build system changes
    Build,
    /// CI configuration changes
    Ci,
    /// Maintenance work
    Chore,
    /// A reverted change
    Revert,
    /// Any other lowercased type token
    Other(String),
}

impl CommitKind {
    fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "feat" => CommitKind::Feat,
            "fix" => CommitKind::Fix,
            "perf" => CommitKind::Perf,
            "refactor" => CommitKind::Refactor,
            "docs" => CommitKind::Docs,
            "style" => CommitKind::Style,
            "test" => CommitKind::Test,
            "build" => CommitKind::Build,
            "ci" => CommitKind::Ci,
            "chore" => CommitKind::Chore,
            "revert" => CommitKind::Revert,
            other => CommitKind::Other(other.to_string()),
        }
    }

    /// The bump this type warrants on its own, without breaking markers
    pub fn bump(&self) -> BumpLevel {
        match self {
            CommitKind::Feat => BumpLevel::Minor,
            CommitKind::Fix | CommitKind::Perf => BumpLevel::Patch,
            _ => BumpLevel::None,
        }
    }
}

/// A commit message parsed against the conventional-commit grammar
#[derive(Debug, Clone)]
pub struct ConventionalCommit {
    /// Commit type
    pub kind: CommitKind,
    /// Scope between parentheses, if present
    pub scope: Option<String>,
    /// Whether the commit is marked breaking (`!` or a breaking-change footer)
    pub breaking: bool,
    /// Description after the colon
    pub description: String,
}

impl ConventionalCommit {
    /// The bump this commit warrants
    pub fn bump(&self) -> BumpLevel {
        if self.breaking {
            BumpLevel::Major
        } else {
            self.kind.bump()
        }
    }
}

/// Parser for conventional-commit headers
#[derive(Debug)]
pub struct CommitParser {
    header: Regex,
}

impl CommitParser {
    /// Compile the commit-header grammar
    pub fn new() -> Result<Self> {
        let header = Regex::new(r"^(?P<kind>[A-Za-z]+)(?:\((?P<scope>[^()]*)\))?(?P<bang>!)?:\s+(?P<description>.+)$")
            .map_err(|source| VersioningError::InvalidPattern { source })?;
        Ok(Self { header })
    }

    /// Parse a commit message.
    ///
    /// Returns `None` for messages that do not follow the convention.
    pub fn parse(&self, summary: &str, body: &str) -> Option<ConventionalCommit> {
        let captures = self.header.captures(summary.trim())?;

        let kind = CommitKind::from_token(&captures["kind"]);
        let scope = captures
            .name("scope")
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        let breaking = captures.name("bang").is_some() || body_is_breaking(body);
        let description = captures["description"].trim().to_string();

        Some(ConventionalCommit {
            kind,
            scope,
            breaking,
            description,
        })
    }
}

/// Whether the commit body carries a breaking-change footer
fn body_is_breaking(body: &str) -> bool {
    body.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:")
    })
}

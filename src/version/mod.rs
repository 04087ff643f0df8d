//! Next-version computation from commit history.
//!
//! The calculator inspects the commits since the last release tag, derives the
//! warranted bump from their conventional-commit messages, and decides whether
//! a release happens at all. The decision is deterministic: the same history
//! always yields the same answer, and a history with no qualifying commits
//! yields no release.

pub mod changelog;
pub mod conventional;
mod writeback;

pub use changelog::NoteSection;
pub use conventional::{BumpLevel, CommitKind, CommitParser, ConventionalCommit};
pub use writeback::update_manifest_version;

use crate::config::{UnparsablePolicy, VersioningPolicy};
use crate::error::{Result, VersioningError};
use crate::vcs::CommitInfo;
use semver::Version;

/// A single qualifying commit, carried into the changelog
#[derive(Debug, Clone)]
pub struct ReleaseNote {
    /// Changelog section the note belongs under
    pub section: NoteSection,
    /// Commit scope, if any
    pub scope: Option<String>,
    /// Commit description
    pub description: String,
    /// Abbreviated commit hash
    pub short_hash: String,
}

/// Outcome of the version computation step
#[derive(Debug, Clone)]
pub enum VersionDecision {
    /// The history warrants a new release
    Release {
        /// The version to release
        version: Version,
        /// The bump the history warranted
        bump: BumpLevel,
        /// Notes for the changelog entry, oldest first
        notes: Vec<ReleaseNote>,
    },
    /// Nothing since the last release warrants publishing
    NoRelease,
}

impl VersionDecision {
    /// Whether a new release is warranted
    pub fn published(&self) -> bool {
        matches!(self, VersionDecision::Release { .. })
    }

    /// The version to release, when one is warranted
    pub fn version(&self) -> Option<&Version> {
        match self {
            VersionDecision::Release { version, .. } => Some(version),
            VersionDecision::NoRelease => None,
        }
    }
}

/// Computes the next version from commit history
#[derive(Debug)]
pub struct VersionCalculator {
    parser: CommitParser,
    policy: VersioningPolicy,
}

impl VersionCalculator {
    /// Create a calculator for the given policy
    pub fn new(policy: VersioningPolicy) -> Result<Self> {
        Ok(Self {
            parser: CommitParser::new()?,
            policy,
        })
    }

    /// Decide whether the commits since `last_version` warrant a release.
    ///
    /// `last_version` is the version of the most recent release tag reachable
    /// from `HEAD`, or `None` when nothing was ever released.
    pub fn decide(
        &self,
        last_version: Option<&Version>,
        commits: &[CommitInfo],
    ) -> Result<VersionDecision> {
        let mut bump = BumpLevel::None;
        let mut notes = Vec::new();
        let mut conforming = 0usize;

        for commit in commits {
            let Some(parsed) = self.parser.parse(&commit.summary, &commit.body) else {
                continue;
            };
            conforming += 1;
            bump = bump.max(parsed.bump());

            if let Some(section) = NoteSection::classify(&parsed) {
                notes.push(ReleaseNote {
                    section,
                    scope: parsed.scope.clone(),
                    description: parsed.description.clone(),
                    short_hash: commit.short_hash.clone(),
                });
            }
        }

        if !commits.is_empty()
            && conforming == 0
            && self.policy.on_unparsable == UnparsablePolicy::Fail
        {
            return Err(VersioningError::UnparsableHistory {
                commits: commits.len(),
            }
            .into());
        }

        if bump == BumpLevel::None {
            return Ok(VersionDecision::NoRelease);
        }

        let version = match last_version {
            Some(last) => bumped(last, bump),
            None => self.policy.first_version.clone(),
        };

        Ok(VersionDecision::Release {
            version,
            bump,
            notes,
        })
    }

    /// The release tag name for a version under this policy
    pub fn tag_name(&self, version: &Version) -> String {
        format!("{}{}", self.policy.tag_prefix, version)
    }
}

/// Apply a bump to a version, clearing pre-release and build metadata
fn bumped(version: &Version, bump: BumpLevel) -> Version {
    match bump {
        BumpLevel::Major => Version::new(version.major + 1, 0, 0),
        BumpLevel::Minor => Version::new(version.major, version.minor + 1, 0),
        BumpLevel::Patch => Version::new(version.major, version.minor, version.patch + 1),
        BumpLevel::None => version.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(summary: &str) -> CommitInfo {
        CommitInfo {
            hash: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            short_hash: "aaaaaaa".to_string(),
            summary: summary.to_string(),
            body: String::new(),
        }
    }

    fn calculator() -> VersionCalculator {
        VersionCalculator::new(VersioningPolicy::default()).unwrap()
    }

    fn fail_calculator() -> VersionCalculator {
        let policy = VersioningPolicy {
            on_unparsable: UnparsablePolicy::Fail,
            ..VersioningPolicy::default()
        };
        VersionCalculator::new(policy).unwrap()
    }

    #[test]
    fn test_single_fix_bumps_patch() {
        let last = Version::new(1, 2, 0);
        let decision = calculator()
            .decide(Some(&last), &[commit("fix: resolve handler panic")])
            .unwrap();
        assert!(decision.published());
        assert_eq!(decision.version(), Some(&Version::new(1, 2, 1)));
    }

    #[test]
    fn test_feat_bumps_minor() {
        let last = Version::new(1, 2, 3);
        let decision = calculator()
            .decide(Some(&last), &[commit("feat: add report export")])
            .unwrap();
        assert_eq!(decision.version(), Some(&Version::new(1, 3, 0)));
    }

    #[test]
    fn test_breaking_bumps_major() {
        let last = Version::new(1, 2, 3);
        let decision = calculator()
            .decide(Some(&last), &[commit("feat!: drop v1 endpoints")])
            .unwrap();
        assert_eq!(decision.version(), Some(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_highest_bump_wins() {
        let last = Version::new(1, 2, 3);
        let decision = calculator()
            .decide(
                Some(&last),
                &[
                    commit("fix: resolve handler panic"),
                    commit("feat: add report export"),
                    commit("docs: describe export"),
                ],
            )
            .unwrap();
        assert_eq!(decision.version(), Some(&Version::new(1, 3, 0)));
    }

    #[test]
    fn test_no_qualifying_commits_yields_no_release() {
        let last = Version::new(1, 2, 0);
        let decision = calculator()
            .decide(
                Some(&last),
                &[commit("chore: bump dev deps"), commit("docs: fix typo")],
            )
            .unwrap();
        assert!(!decision.published());
        assert_eq!(decision.version(), None);
    }

    #[test]
    fn test_empty_history_yields_no_release() {
        // Re-running on an already-released commit finds nothing since the tag
        let last = Version::new(1, 2, 1);
        let decision = calculator().decide(Some(&last), &[]).unwrap();
        assert!(!decision.published());
    }

    #[test]
    fn test_first_release_uses_configured_version() {
        let decision = calculator()
            .decide(None, &[commit("feat: initial import")])
            .unwrap();
        assert_eq!(decision.version(), Some(&Version::new(0, 1, 0)));
    }

    #[test]
    fn test_unparsable_history_ignored_by_default() {
        let last = Version::new(1, 0, 0);
        let decision = calculator()
            .decide(Some(&last), &[commit("update stuff"), commit("more stuff")])
            .unwrap();
        assert!(!decision.published());
    }

    #[test]
    fn test_unparsable_history_fails_under_fail_policy() {
        let last = Version::new(1, 0, 0);
        let result = fail_calculator().decide(Some(&last), &[commit("update stuff")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fail_policy_accepts_mixed_history() {
        let last = Version::new(1, 0, 0);
        let decision = fail_calculator()
            .decide(
                Some(&last),
                &[commit("update stuff"), commit("fix: resolve panic")],
            )
            .unwrap();
        assert_eq!(decision.version(), Some(&Version::new(1, 0, 1)));
    }

    #[test]
    fn test_published_versions_strictly_increase() {
        let calculator = calculator();
        let mut last = Version::new(1, 0, 0);
        for summary in ["fix: a", "feat: b", "feat!: c", "fix: d"] {
            let decision = calculator.decide(Some(&last), &[commit(summary)]).unwrap();
            let next = decision.version().unwrap().clone();
            assert!(next > last, "{} must exceed {}", next, last);
            last = next;
        }
    }

    #[test]
    fn test_notes_capture_only_listed_kinds() {
        let last = Version::new(1, 0, 0);
        let decision = calculator()
            .decide(
                Some(&last),
                &[
                    commit("feat(api): add report export"),
                    commit("chore: tidy imports"),
                ],
            )
            .unwrap();
        let VersionDecision::Release { notes, .. } = decision else {
            panic!("expected a release");
        };
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].section, NoteSection::Features);
        assert_eq!(notes[0].scope.as_deref(), Some("api"));
    }

    #[test]
    fn test_tag_name_uses_prefix() {
        assert_eq!(calculator().tag_name(&Version::new(1, 2, 1)), "v1.2.1");
    }
}

//! Hosting service abstraction layer
//!
//! The lifecycle operations in [`crate::reader`], [`crate::writer`] and
//! [`crate::deleter`] talk to the remote service only through [`ReleaseApi`],
//! so they can run against GitHub or an in-memory double alike.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::Result;

/// Owner/repository pair identifying a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// User or organization login (e.g., "acme")
    pub owner: String,

    /// Repository name (e.g., "widget")
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Identity of the account that published a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub login: String,
    pub html_url: String,
    pub avatar_url: String,
}

/// A release as read from the hosting service
///
/// Releases are owned by the remote side; a value of this type is a snapshot
/// valid for the duration of a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    /// Service-assigned identifier, used for deletion
    pub id: u64,
    pub tag_name: String,
    pub target_commitish: String,
    pub name: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub author: Option<Author>,
}

impl Release {
    /// One listing line: tag, publish timestamp and author login, tab separated
    pub fn summary_line(&self) -> String {
        let published = self
            .published_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "unpublished".to_string());
        let author = self
            .author
            .as_ref()
            .map(|a| a.login.as_str())
            .unwrap_or("unknown");
        format!("{}\t{}\t{}", self.tag_name, published, author)
    }
}

/// A tag ref, independent of whether a release exists for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_sha: String,
}

/// Parameters for a release creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub draft: bool,
    pub prerelease: bool,
}

impl NewRelease {
    /// A published, non-prerelease release of `tag` on `branch`
    pub fn release(tag: &str, branch: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            target_commitish: branch.to_string(),
            draft: false,
            prerelease: false,
        }
    }

    /// A published prerelease of `tag` on `branch`
    pub fn prerelease(tag: &str, branch: &str) -> Self {
        Self {
            prerelease: true,
            ..Self::release(tag, branch)
        }
    }
}

/// Opaque continuation token pointing at the next page of a listing
///
/// Implementations decide what it encodes (GitHub uses the `Link` header URL);
/// callers only hand it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing plus the cursor for the following page
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// `None` once the service reports no further pages
    pub next: Option<PageCursor>,
}

/// Release API of a remote hosting service
///
/// Implementations translate transport failures into [`crate::ReleaseError`]:
/// a missing release becomes `NotFound`, a `tag_name`/`already_exists`
/// validation failure becomes `Conflict`, everything else `Remote` with the
/// HTTP status when one is available. No recovery happens at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Fetch the release whose tag name equals `tag`
    async fn get_release_by_tag(&self, repo: &RepoRef, tag: &str) -> Result<Release>;

    /// Fetch the most recent published release
    async fn get_latest_release(&self, repo: &RepoRef) -> Result<Release>;

    /// Create a release
    async fn create_release(&self, repo: &RepoRef, release: &NewRelease) -> Result<Release>;

    /// Delete a release record by its service-assigned identifier
    async fn delete_release(&self, repo: &RepoRef, release_id: u64) -> Result<()>;

    /// Delete the `tags/<tag>` ref
    async fn delete_tag_ref(&self, repo: &RepoRef, tag: &str) -> Result<()>;

    /// List releases; `cursor` is `None` for the first page
    async fn list_releases(
        &self,
        repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> Result<Page<Release>>;

    /// List tag refs; `cursor` is `None` for the first page
    async fn list_tags(
        &self,
        repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> Result<Page<Tag>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_release() -> Release {
        Release {
            id: 7,
            tag_name: "v1.0.0".to_string(),
            target_commitish: "main".to_string(),
            name: None,
            draft: false,
            prerelease: false,
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            html_url: "https://github.com/acme/widget/releases/tag/v1.0.0".to_string(),
            author: Some(Author {
                login: "octocat".to_string(),
                html_url: "https://github.com/octocat".to_string(),
                avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
            }),
        }
    }

    #[test]
    fn test_repo_ref_display() {
        assert_eq!(RepoRef::new("acme", "widget").to_string(), "acme/widget");
    }

    #[test]
    fn test_summary_line() {
        let release = sample_release();
        assert_eq!(release.summary_line(), "v1.0.0\t2024-03-01T12:00:00+00:00\toctocat");

        let anonymous = Release {
            author: None,
            published_at: None,
            ..release
        };
        assert_eq!(anonymous.summary_line(), "v1.0.0\tunpublished\tunknown");
    }

    #[test]
    fn test_new_release_flags() {
        let release = NewRelease::release("1.0.0", "main");
        assert!(!release.draft);
        assert!(!release.prerelease);

        let pre = NewRelease::prerelease("2.0.0-0", "develop");
        assert!(!pre.draft);
        assert!(pre.prerelease);
        assert_eq!(pre.target_commitish, "develop");
    }
}

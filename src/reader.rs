//! Release lookup and paginated scans

use tracing::{debug, info};

use crate::error::{ReleaseError, Result};
use crate::hosting::{Release, ReleaseApi, RepoRef, Tag};
use crate::matcher::TagMatcher;
use semver::{BuildMetadata, Prerelease, Version};

/// Read-only access to a repository's releases and tags
#[derive(Clone, Copy)]
pub struct ReleaseReader<'a> {
    api: &'a dyn ReleaseApi,
    per_page: u8,
}

impl<'a> ReleaseReader<'a> {
    pub fn new(api: &'a dyn ReleaseApi, per_page: u8) -> Self {
        Self { api, per_page }
    }

    /// Look up the release for `tag`; `Ok(None)` when there is none
    pub async fn get_by_tag(&self, repo: &RepoRef, tag: &str) -> Result<Option<Release>> {
        debug!("Fetching release of tag '{}' in {}", tag, repo);
        match self.api.get_release_by_tag(repo, tag).await {
            Ok(release) => Ok(Some(release)),
            Err(e) if e.is_not_found() => {
                debug!("No release for tag '{}' in {}", tag, repo);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Visit every release whose tag name satisfies `matcher`
    ///
    /// Pages are followed until the service stops returning a next-page cursor.
    /// The first error aborts the scan; releases already visited stay visited.
    /// Returns the number of releases visited.
    pub async fn scan_all<F>(&self, repo: &RepoRef, matcher: &TagMatcher, mut visit: F) -> Result<usize>
    where
        F: FnMut(&Release),
    {
        let mut cursor = None;
        let mut pages = 0usize;
        let mut visited = 0usize;

        loop {
            let page = self.api.list_releases(repo, self.per_page, cursor).await?;
            pages += 1;

            for release in page.items.iter().filter(|r| matcher.matches(&r.tag_name)) {
                visit(release);
                visited += 1;
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            "Scanned {} page(s) of releases in {}, {} matched ({} matcher)",
            pages,
            repo,
            visited,
            matcher.kind()
        );
        Ok(visited)
    }

    /// Visit every tag ref whose name satisfies `matcher`
    ///
    /// Same pagination and failure contract as [`Self::scan_all`], but tags
    /// without a release are included.
    pub async fn scan_tags<F>(&self, repo: &RepoRef, matcher: &TagMatcher, mut visit: F) -> Result<usize>
    where
        F: FnMut(&Tag),
    {
        let mut cursor = None;
        let mut pages = 0usize;
        let mut visited = 0usize;

        loop {
            let page = self.api.list_tags(repo, self.per_page, cursor).await?;
            pages += 1;

            for tag in page.items.iter().filter(|t| matcher.matches(&t.name)) {
                visit(tag);
                visited += 1;
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            "Scanned {} page(s) of tags in {}, {} matched ({} matcher)",
            pages,
            repo,
            visited,
            matcher.kind()
        );
        Ok(visited)
    }

    /// Look up each literal tag and report what was found
    ///
    /// `visit` receives `None` for a tag without a release; that is not an error.
    pub async fn list_by_tags<F>(&self, repo: &RepoRef, tags: &[String], mut visit: F) -> Result<()>
    where
        F: FnMut(&str, Option<&Release>),
    {
        for tag in tags {
            let release = self.get_by_tag(repo, tag).await?;
            visit(tag, release.as_ref());
        }
        Ok(())
    }

    /// Next patch version after the latest published release
    ///
    /// A leading `v` on the latest tag is kept on the result.
    pub async fn next_release_version(&self, repo: &RepoRef) -> Result<String> {
        debug!("Fetching latest release of {}", repo);
        let latest = self.api.get_latest_release(repo).await?;
        debug!(
            "Found {} published at {:?}",
            latest.tag_name, latest.published_at
        );

        let next = bump_patch(&latest.tag_name)?;
        info!("Latest release of {} is {}, next is {}", repo, latest.tag_name, next);
        Ok(next)
    }
}

/// Increment the patch component of a tag, clearing pre-release and build metadata
pub fn bump_patch(tag: &str) -> Result<String> {
    let stripped = tag.strip_prefix('v').unwrap_or(tag);
    let mut version = Version::parse(stripped).map_err(|source| ReleaseError::InvalidVersion {
        tag: tag.to_string(),
        source,
    })?;

    version.patch += 1;
    version.pre = Prerelease::EMPTY;
    version.build = BuildMetadata::EMPTY;

    if tag.starts_with('v') {
        Ok(format!("v{}", version))
    } else {
        Ok(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_bump_patch() {
        assert_eq!(bump_patch("1.2.3").unwrap(), "1.2.4");
        assert_eq!(bump_patch("v0.9.9").unwrap(), "v0.9.10");
        assert_eq!(bump_patch("2.0.0-rc.1+build.5").unwrap(), "2.0.1");
    }

    #[test]
    fn test_bump_patch_rejects_non_semver() {
        assert_matches!(
            bump_patch("release-2024"),
            Err(ReleaseError::InvalidVersion { ref tag, .. }) if tag == "release-2024"
        );
    }
}

//! Release creation

use tracing::{debug, info, warn};

use crate::deleter::ReleaseDeleter;
use crate::error::Result;
use crate::hosting::{NewRelease, Release, ReleaseApi, RepoRef};

/// Creates releases and prereleases
#[derive(Clone, Copy)]
pub struct ReleaseWriter<'a> {
    api: &'a dyn ReleaseApi,
    deleter: ReleaseDeleter<'a>,
}

impl<'a> ReleaseWriter<'a> {
    pub fn new(api: &'a dyn ReleaseApi, per_page: u8) -> Self {
        Self {
            api,
            deleter: ReleaseDeleter::new(api, per_page),
        }
    }

    /// Publish `tag` on `branch` as a full release
    ///
    /// Any failure, a taken tag name included, is returned as is.
    pub async fn create_release(&self, repo: &RepoRef, branch: &str, tag: &str) -> Result<Release> {
        debug!("Creating release {} for {} branch: {}", tag, repo, branch);
        let release = self
            .api
            .create_release(repo, &NewRelease::release(tag, branch))
            .await?;

        info!("Successfully created release: {}", release.html_url);
        Ok(release)
    }

    /// Publish `tag` on `branch` as a prerelease
    ///
    /// With `force`, a tag-name conflict is resolved by deleting the existing
    /// release and ref, then creating once more. The second attempt is final.
    pub async fn create_prerelease(&self, repo: &RepoRef, branch: &str, tag: &str, force: bool) -> Result<Release> {
        let request = NewRelease::prerelease(tag, branch);

        debug!("Creating pre-release {} for {} branch: {}", tag, repo, branch);
        let release = match self.api.create_release(repo, &request).await {
            Ok(release) => release,
            Err(e) if force && e.is_conflict() => {
                warn!("Tag name {} already exists in {}, force deleting it", tag, repo);
                self.deleter.delete_one(repo, tag, false).await?;

                debug!("Creating pre-release {} again for {} branch: {}", tag, repo, branch);
                self.api.create_release(repo, &request).await?
            }
            Err(e) => return Err(e),
        };

        info!("Successfully created pre-release: {}", release.html_url);
        Ok(release)
    }
}

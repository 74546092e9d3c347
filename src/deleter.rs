//! Release and tag removal
//!
//! Deleting a tag removes two things on the remote side: the release record
//! (if any) and the `tags/<name>` ref. Both steps tolerate the object being
//! gone already, so deleting the same tag twice succeeds twice.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hosting::{ReleaseApi, RepoRef};
use crate::matcher::TagMatcher;
use crate::reader::ReleaseReader;

/// What a single-tag deletion did, or would have done in dry-run mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub tag: String,

    /// Identifier of the release record that existed for the tag
    pub release_id: Option<u64>,

    /// Whether the ref was removed by this call (false if it was already gone)
    pub ref_deleted: bool,

    pub dry_run: bool,
}

impl DeleteReport {
    /// Per-tag confirmation line
    pub fn message(&self) -> String {
        let release = match self.release_id {
            Some(id) => format!("release {}", id),
            None => "no release".to_string(),
        };
        if self.dry_run {
            format!("'{}' would be deleted ({}, dry run)", self.tag, release)
        } else {
            format!("'{}' has been deleted ({})", self.tag, release)
        }
    }
}

/// Removes releases and their tag refs
#[derive(Clone, Copy)]
pub struct ReleaseDeleter<'a> {
    api: &'a dyn ReleaseApi,
    reader: ReleaseReader<'a>,
}

impl<'a> ReleaseDeleter<'a> {
    pub fn new(api: &'a dyn ReleaseApi, per_page: u8) -> Self {
        Self {
            api,
            reader: ReleaseReader::new(api, per_page),
        }
    }

    /// Delete the release for `tag` and the `tags/<tag>` ref
    ///
    /// The lookup always runs; in dry-run mode nothing is mutated. A missing
    /// release is skipped, as is one removed by someone else after the lookup.
    /// A 422 from the ref deletion counts as "already gone".
    pub async fn delete_one(&self, repo: &RepoRef, tag: &str, dry_run: bool) -> Result<DeleteReport> {
        let release = self.reader.get_by_tag(repo, tag).await?;
        let release_id = release.as_ref().map(|r| r.id);

        if dry_run {
            match release_id {
                Some(id) => info!("[dry-run] Would delete release {} and ref tags/{} in {}", id, tag, repo),
                None => info!("[dry-run] No release for '{}'; would delete ref tags/{} in {}", tag, tag, repo),
            }
            return Ok(DeleteReport {
                tag: tag.to_string(),
                release_id,
                ref_deleted: false,
                dry_run,
            });
        }

        if let Some(id) = release_id {
            debug!("Deleting release {} by release-id {}", tag, id);
            match self.api.delete_release(repo, id).await {
                Ok(()) => {}
                Err(e) if e.status() == Some(404) => {
                    warn!("Release {} of '{}' in {} was already gone: {}", id, tag, repo, e);
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Deleting ref tags/{} in {}", tag, repo);
        let ref_deleted = match self.api.delete_tag_ref(repo, tag).await {
            Ok(()) => true,
            Err(e) if e.is_unprocessable() => {
                warn!("Ref tags/{} in {} could not be deleted, treating it as absent: {}", tag, repo, e);
                false
            }
            Err(e) => return Err(e),
        };

        info!("'{}' has been deleted from {}", tag, repo);
        Ok(DeleteReport {
            tag: tag.to_string(),
            release_id,
            ref_deleted,
            dry_run,
        })
    }

    /// Delete every tag whose name satisfies `matcher`
    ///
    /// All tag pages are read before the first deletion so removing refs cannot
    /// shift later pages. The first failure stops the run; tags deleted before
    /// it stay deleted.
    pub async fn delete_many(&self, repo: &RepoRef, matcher: &TagMatcher, dry_run: bool) -> Result<Vec<DeleteReport>> {
        let mut matched = Vec::new();
        self.reader
            .scan_tags(repo, matcher, |tag| matched.push(tag.name.clone()))
            .await?;

        info!("{} tag(s) in {} matched the {} matcher", matched.len(), repo, matcher.kind());
        self.delete_exact_set(repo, &matched, dry_run).await
    }

    /// Delete each of the given tags in order, stopping at the first failure
    pub async fn delete_exact_set(&self, repo: &RepoRef, tags: &[String], dry_run: bool) -> Result<Vec<DeleteReport>> {
        let mut reports = Vec::with_capacity(tags.len());
        for tag in tags {
            info!("Deleting '{}' from {}", tag, repo);
            reports.push(self.delete_one(repo, tag, dry_run).await?);
        }
        Ok(reports)
    }
}

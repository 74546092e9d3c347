use async_trait::async_trait;
use octocrab::models::repos::Release as GhRelease;
use octocrab::params::repos::Reference;
use octocrab::Octocrab;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GitHubSettings;
use crate::error::{ReleaseError, Result};
use crate::hosting::{Author, NewRelease, Page, PageCursor, Release, ReleaseApi, RepoRef, Tag};

/// Authenticated GitHub client implementing [`ReleaseApi`]
///
/// The client holds nothing but its credential and API root, so one instance
/// can be reused for any number of sequential operations.
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client from a bearer token
    ///
    /// No request is sent here; an invalid token only surfaces on the first call.
    pub fn new(settings: &GitHubSettings, token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ReleaseError::Auth(
                "a non-empty GitHub token is required (pass --token or set GITHUB_TOKEN)".to_string(),
            ));
        }

        if !token.starts_with("ghp_")
            && !token.starts_with("gho_")
            && !token.starts_with("ghs_")
            && !token.starts_with("github_pat_")
        {
            warn!("GitHub token doesn't look like a GitHub token (expected ghp_, gho_, ghs_ or github_pat_ prefix)");
        }

        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(api_base) = &settings.api_base {
            debug!("Using GitHub API root: {}", api_base);
            builder = builder
                .base_uri(api_base.as_str())
                .map_err(|e| ReleaseError::Auth(format!("invalid GitHub API root '{}': {}", api_base, e)))?;
        }

        let client = builder
            .build()
            .map_err(|e| ReleaseError::Auth(format!("failed to create GitHub client: {}", e)))?;

        info!("GitHub client ready");
        Ok(Self { client })
    }
}

#[async_trait]
impl ReleaseApi for GitHubClient {
    async fn get_release_by_tag(&self, repo: &RepoRef, tag: &str) -> Result<Release> {
        debug!("GET release by tag '{}' in {}", tag, repo);
        self.client
            .repos(&repo.owner, &repo.repo)
            .releases()
            .get_by_tag(tag)
            .await
            .map(convert_release)
            .map_err(|e| match status_of(&e) {
                Some(404) => ReleaseError::NotFound {
                    repo: repo.to_string(),
                    tag: tag.to_string(),
                },
                _ => remote_error(format!("get release '{}' in {}", tag, repo), e),
            })
    }

    async fn get_latest_release(&self, repo: &RepoRef) -> Result<Release> {
        debug!("GET latest release in {}", repo);
        self.client
            .repos(&repo.owner, &repo.repo)
            .releases()
            .get_latest()
            .await
            .map(convert_release)
            .map_err(|e| match status_of(&e) {
                Some(404) => ReleaseError::NotFound {
                    repo: repo.to_string(),
                    tag: "latest".to_string(),
                },
                _ => remote_error(format!("get latest release in {}", repo), e),
            })
    }

    async fn create_release(&self, repo: &RepoRef, release: &NewRelease) -> Result<Release> {
        debug!(
            "POST release '{}' in {} (target: {}, prerelease: {})",
            release.tag_name, repo, release.target_commitish, release.prerelease
        );
        self.client
            .repos(&repo.owner, &repo.repo)
            .releases()
            .create(&release.tag_name)
            .target_commitish(&release.target_commitish)
            .draft(release.draft)
            .prerelease(release.prerelease)
            .send()
            .await
            .map(convert_release)
            .map_err(|e| {
                if is_tag_name_already_exists(&e) {
                    ReleaseError::Conflict {
                        repo: repo.to_string(),
                        tag: release.tag_name.clone(),
                    }
                } else {
                    remote_error(format!("create release '{}' in {}", release.tag_name, repo), e)
                }
            })
    }

    async fn delete_release(&self, repo: &RepoRef, release_id: u64) -> Result<()> {
        debug!("DELETE release {} in {}", release_id, repo);
        self.client
            .repos(&repo.owner, &repo.repo)
            .releases()
            .delete(release_id)
            .await
            .map_err(|e| remote_error(format!("delete release {} in {}", release_id, repo), e))
    }

    async fn delete_tag_ref(&self, repo: &RepoRef, tag: &str) -> Result<()> {
        debug!("DELETE ref tags/{} in {}", tag, repo);
        self.client
            .repos(&repo.owner, &repo.repo)
            .delete_ref(&Reference::Tag(tag.to_string()))
            .await
            .map_err(|e| remote_error(format!("delete ref tags/{} in {}", tag, repo), e))
    }

    async fn list_releases(
        &self,
        repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> Result<Page<Release>> {
        let context = format!("list releases in {}", repo);
        let page = match cursor {
            None => {
                debug!("GET releases in {} (per_page: {})", repo, per_page);
                self.client
                    .repos(&repo.owner, &repo.repo)
                    .releases()
                    .list()
                    .per_page(per_page)
                    .send()
                    .await
                    .map_err(|e| remote_error(context.clone(), e))?
            }
            Some(cursor) => self.follow::<GhRelease>(&cursor, &context).await?,
        };

        Ok(Page {
            next: page.next.as_ref().map(|uri| PageCursor::new(uri.to_string())),
            items: page.items.into_iter().map(convert_release).collect(),
        })
    }

    async fn list_tags(
        &self,
        repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> Result<Page<Tag>> {
        let context = format!("list tags in {}", repo);
        let page = match cursor {
            None => {
                debug!("GET tags in {} (per_page: {})", repo, per_page);
                self.client
                    .repos(&repo.owner, &repo.repo)
                    .list_tags()
                    .per_page(per_page)
                    .send()
                    .await
                    .map_err(|e| remote_error(context.clone(), e))?
            }
            Some(cursor) => {
                self.follow::<octocrab::models::repos::Tag>(&cursor, &context)
                    .await?
            }
        };

        Ok(Page {
            next: page.next.as_ref().map(|uri| PageCursor::new(uri.to_string())),
            items: page
                .items
                .into_iter()
                .map(|tag| Tag {
                    name: tag.name,
                    commit_sha: tag.commit.sha,
                })
                .collect(),
        })
    }
}

impl GitHubClient {
    /// Fetch the page a cursor points at
    async fn follow<T: serde::de::DeserializeOwned>(
        &self,
        cursor: &PageCursor,
        context: &str,
    ) -> Result<octocrab::Page<T>> {
        debug!("GET next page: {}", cursor.as_str());
        self.client
            .get(cursor.as_str(), None::<&()>)
            .await
            .map_err(|e| remote_error(context.to_string(), e))
    }
}

fn convert_release(release: GhRelease) -> Release {
    Release {
        id: release.id.0,
        tag_name: release.tag_name,
        target_commitish: release.target_commitish,
        name: release.name,
        draft: release.draft,
        prerelease: release.prerelease,
        published_at: release.published_at,
        html_url: release.html_url.to_string(),
        author: release.author.map(|author| Author {
            login: author.login,
            html_url: author.html_url.to_string(),
            avatar_url: author.avatar_url.to_string(),
        }),
    }
}

/// HTTP status of a service-reported error
fn status_of(error: &octocrab::Error) -> Option<u16> {
    match error {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

fn remote_error(context: String, error: octocrab::Error) -> ReleaseError {
    let (status, message) = match &error {
        octocrab::Error::GitHub { source, .. } => {
            (Some(source.status_code.as_u16()), source.message.clone())
        }
        other => (None, other.to_string()),
    };
    ReleaseError::Remote {
        context,
        status,
        message,
    }
}

fn is_tag_name_already_exists(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => source
            .errors
            .as_deref()
            .is_some_and(has_tag_name_already_exists),
        _ => false,
    }
}

/// Whether a validation payload holds `{field: "tag_name", code: "already_exists"}`
fn has_tag_name_already_exists(errors: &[Value]) -> bool {
    errors.iter().any(|entry| {
        entry.get("field").and_then(Value::as_str) == Some("tag_name")
            && entry.get("code").and_then(Value::as_str) == Some("already_exists")
    })
}

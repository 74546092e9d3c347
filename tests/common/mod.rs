//! Common test utilities and helpers for tagwarden tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use tagwarden::hosting::Author;
use tagwarden::{NewRelease, Page, PageCursor, Release, ReleaseApi, ReleaseError, RepoRef, Tag};

/// Number of calls made against the in-memory service, per endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub lookups: usize,
    pub creates: usize,
    pub release_deletes: usize,
    pub ref_deletes: usize,
    pub release_pages: usize,
    pub tag_pages: usize,
}

#[derive(Default)]
struct State {
    /// Releases keyed by tag name
    releases: BTreeMap<String, Release>,
    /// Tag refs
    tags: BTreeSet<String>,
    next_id: u64,
    calls: CallCounts,
    /// Tags whose ref deletion fails with a server error
    failing_refs: HashSet<String>,
}

/// In-memory stand-in for a single GitHub repository
///
/// Pagination uses an offset cursor, so page boundaries depend only on the
/// page size the caller asks for.
pub struct InMemoryHosting {
    state: Mutex<State>,
}

impl InMemoryHosting {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
        }
    }

    /// Repository with a published release (and ref) for each tag
    pub fn with_releases(tags: &[&str]) -> Self {
        let hosting = Self::new();
        for tag in tags {
            hosting.add_release(tag, false);
        }
        hosting
    }

    pub fn add_release(&self, tag: &str, prerelease: bool) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let release = make_release(id, tag, "main", prerelease);
        state.releases.insert(tag.to_string(), release);
        state.tags.insert(tag.to_string());
        id
    }

    /// A ref with no release attached
    pub fn add_tag_only(&self, tag: &str) {
        self.state.lock().unwrap().tags.insert(tag.to_string());
    }

    pub fn fail_ref_deletion(&self, tag: &str) {
        self.state.lock().unwrap().failing_refs.insert(tag.to_string());
    }

    pub fn release(&self, tag: &str) -> Option<Release> {
        self.state.lock().unwrap().releases.get(tag).cloned()
    }

    pub fn release_by_id(&self, id: u64) -> Option<Release> {
        self.state
            .lock()
            .unwrap()
            .releases
            .values()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn releases_for(&self, tag: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .releases
            .values()
            .filter(|r| r.tag_name == tag)
            .count()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.state.lock().unwrap().tags.contains(tag)
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls.clone()
    }
}

pub fn make_release(id: u64, tag: &str, branch: &str, prerelease: bool) -> Release {
    Release {
        id,
        tag_name: tag.to_string(),
        target_commitish: branch.to_string(),
        name: Some(tag.to_string()),
        draft: false,
        prerelease,
        published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(id as i64)),
        html_url: format!("https://github.com/acme/widget/releases/tag/{}", tag),
        author: Some(Author {
            login: "release-bot".to_string(),
            html_url: "https://github.com/release-bot".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/2".to_string(),
        }),
    }
}

fn paginate<T: Clone>(items: &[T], per_page: u8, cursor: Option<PageCursor>) -> Page<T> {
    let offset = cursor
        .map(|c| {
            c.as_str()
                .strip_prefix("offset:")
                .and_then(|n| n.parse::<usize>().ok())
                .expect("cursor was not issued by InMemoryHosting")
        })
        .unwrap_or(0);
    let per_page = usize::from(per_page.max(1));
    let end = (offset + per_page).min(items.len());

    Page {
        items: items[offset.min(end)..end].to_vec(),
        next: (end < items.len()).then(|| PageCursor::new(format!("offset:{}", end))),
    }
}

#[async_trait]
impl ReleaseApi for InMemoryHosting {
    async fn get_release_by_tag(&self, repo: &RepoRef, tag: &str) -> tagwarden::Result<Release> {
        let mut state = self.state.lock().unwrap();
        state.calls.lookups += 1;
        state
            .releases
            .get(tag)
            .cloned()
            .ok_or_else(|| ReleaseError::NotFound {
                repo: repo.to_string(),
                tag: tag.to_string(),
            })
    }

    async fn get_latest_release(&self, repo: &RepoRef) -> tagwarden::Result<Release> {
        let state = self.state.lock().unwrap();
        state
            .releases
            .values()
            .filter(|r| !r.draft && !r.prerelease)
            .max_by_key(|r| r.published_at)
            .cloned()
            .ok_or_else(|| ReleaseError::NotFound {
                repo: repo.to_string(),
                tag: "latest".to_string(),
            })
    }

    async fn create_release(&self, repo: &RepoRef, release: &NewRelease) -> tagwarden::Result<Release> {
        let mut state = self.state.lock().unwrap();
        state.calls.creates += 1;
        if state.releases.contains_key(&release.tag_name) {
            return Err(ReleaseError::Conflict {
                repo: repo.to_string(),
                tag: release.tag_name.clone(),
            });
        }
        state.next_id += 1;
        let created = make_release(
            state.next_id,
            &release.tag_name,
            &release.target_commitish,
            release.prerelease,
        );
        state.releases.insert(release.tag_name.clone(), created.clone());
        state.tags.insert(release.tag_name.clone());
        Ok(created)
    }

    async fn delete_release(&self, repo: &RepoRef, release_id: u64) -> tagwarden::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.release_deletes += 1;
        let tag = state
            .releases
            .values()
            .find(|r| r.id == release_id)
            .map(|r| r.tag_name.clone())
            .ok_or_else(|| ReleaseError::remote(format!("delete release {} in {}", release_id, repo), Some(404), "Not Found"))?;
        state.releases.remove(&tag);
        Ok(())
    }

    async fn delete_tag_ref(&self, repo: &RepoRef, tag: &str) -> tagwarden::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.ref_deletes += 1;
        let context = format!("delete ref tags/{} in {}", tag, repo);
        if state.failing_refs.contains(tag) {
            return Err(ReleaseError::remote(context, Some(500), "Internal Server Error"));
        }
        if !state.tags.remove(tag) {
            return Err(ReleaseError::remote(context, Some(422), "Reference does not exist"));
        }
        Ok(())
    }

    async fn list_releases(
        &self,
        _repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> tagwarden::Result<Page<Release>> {
        let mut state = self.state.lock().unwrap();
        state.calls.release_pages += 1;
        let releases: Vec<Release> = state.releases.values().cloned().collect();
        Ok(paginate(&releases, per_page, cursor))
    }

    async fn list_tags(
        &self,
        _repo: &RepoRef,
        per_page: u8,
        cursor: Option<PageCursor>,
    ) -> tagwarden::Result<Page<Tag>> {
        let mut state = self.state.lock().unwrap();
        state.calls.tag_pages += 1;
        let tags: Vec<Tag> = state
            .tags
            .iter()
            .map(|name| Tag {
                name: name.clone(),
                commit_sha: format!("{:040x}", name.len()),
            })
            .collect();
        Ok(paginate(&tags, per_page, cursor))
    }
}

pub fn widget() -> RepoRef {
    RepoRef::new("acme", "widget")
}

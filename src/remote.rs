//! Repository coordinates from a local git checkout
//!
//! Reads `.git/config` and `.git/HEAD` directly; no git binary is needed.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::hosting::RepoRef;

static URL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*url\s*=\s*(.+?)\s*$").expect("git config url regex is valid")
});

/// Extract `owner/repo` from the `[remote "origin"]` url of a git config
pub fn parse_origin(git_config: &str) -> Option<RepoRef> {
    let mut in_origin = false;

    for line in git_config.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_origin = trimmed == r#"[remote "origin"]"#;
            continue;
        }
        if !in_origin {
            continue;
        }
        if let Some(captures) = URL_LINE.captures(line) {
            debug!("Found origin url: {}", redact(&captures[1]));
            return parse_remote_url(&captures[1]);
        }
    }

    None
}

/// Extract `owner/repo` from an SSH or HTTPS remote url
///
/// Credentials embedded in HTTPS urls are discarded.
pub fn parse_remote_url(url: &str) -> Option<RepoRef> {
    let url = url.trim();
    let url = url.strip_suffix(".git").unwrap_or(url);

    let path = match url.split_once("://") {
        // https://[token@]host/owner/repo
        Some((_, rest)) => rest.split_once('/')?.1,
        // git@host:owner/repo
        None => url.split_once(':')?.1,
    };

    let mut segments = path.trim_matches('/').split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    Some(RepoRef::new(owner, repo))
}

/// Read the origin remote of the checkout at `dir`
pub fn detect_origin(dir: &Path) -> Result<Option<RepoRef>> {
    let path = dir.join(".git").join("config");
    if !path.exists() {
        debug!("No git config at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read git config: {}", path.display()))?;
    Ok(parse_origin(&content))
}

/// Branch checked out at `dir`; `None` when HEAD is detached or unreadable
pub fn current_branch(dir: &Path) -> Option<String> {
    let path = dir.join(".git").join("HEAD");
    let head = std::fs::read_to_string(&path).ok()?;
    let branch = head.lines().next()?.trim().strip_prefix("ref: refs/heads/")?;
    if branch.is_empty() {
        None
    } else {
        Some(branch.to_string())
    }
}

/// Hide userinfo in a url before logging it
fn redact(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn test_origin_from_token_clone() {
        let config = r#"[core]
	repositoryformatversion = 0
	filemode = false
	bare = false
[remote "origin"]
	url = https://0123456789abcdef@github.com/acme-product/widget-policy-rpc.git
	fetch = +refs/heads/*:refs/remotes/origin/*
[branch "develop"]
	remote = origin
	merge = refs/heads/develop"#;

        let origin = parse_origin(config).expect("origin should be found");
        assert_eq!(origin, RepoRef::new("acme-product", "widget-policy-rpc"));
    }

    #[test]
    fn test_origin_from_ssh_clone() {
        let config = r#"[core]
	bare = false
[remote "origin"]
	url = git@github.com:acme/widget.git
	fetch = +refs/heads/*:refs/remotes/origin/*"#;

        assert_eq!(parse_origin(config), Some(RepoRef::new("acme", "widget")));
    }

    #[test]
    fn test_origin_from_https_clone() {
        let config = r#"[core]
    bare = false
[remote "origin"]
    url = https://github.com/acme/widget
    fetch = +refs/heads/*:refs/remotes/origin/*
[branch "master"]
    remote = origin"#;

        assert_eq!(parse_origin(config), Some(RepoRef::new("acme", "widget")));
    }

    #[test]
    fn test_origin_ignores_other_remotes() {
        let config = r#"[remote "upstream"]
	url = git@github.com:upstream/widget.git
[remote "origin"]
	url = git@github.com:fork-owner/widget.git"#;

        assert_eq!(parse_origin(config), Some(RepoRef::new("fork-owner", "widget")));
    }

    #[test]
    fn test_origin_url_line_spacing_and_reuse() {
        let configs = [
            "[remote \"origin\"]\nurl=git@github.com:acme/widget.git\n",
            "[remote \"origin\"]\n  url   =   https://github.com/acme/widget.git   \n",
            "[remote \"origin\"]\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n\turl = git@github.com:acme/widget\n",
        ];
        for config in configs.iter().cycle().take(9) {
            assert_eq!(parse_origin(config), Some(RepoRef::new("acme", "widget")), "{:?}", config);
        }
    }

    #[test]
    fn test_origin_missing() {
        assert!(parse_origin("[core]\n\tbare = false\n").is_none());
        assert!(parse_origin("").is_none());
    }

    #[test]
    fn test_parse_remote_url_rejects_incomplete() {
        assert!(parse_remote_url("https://github.com/acme").is_none());
        assert!(parse_remote_url("not-a-remote").is_none());
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://secret@github.com/acme/widget.git"),
            "https://***@github.com/acme/widget.git"
        );
        assert_eq!(redact("git@github.com:acme/widget.git"), "git@github.com:acme/widget.git");
    }

    #[test]
    fn test_detect_origin_and_branch_from_checkout() {
        let temp = TempDir::new().unwrap();
        temp.child(".git/config")
            .write_str("[remote \"origin\"]\n\turl = git@github.com:acme/widget.git\n")
            .unwrap();
        temp.child(".git/HEAD")
            .write_str("ref: refs/heads/release/v2\n")
            .unwrap();

        assert_eq!(
            detect_origin(temp.path()).unwrap(),
            Some(RepoRef::new("acme", "widget"))
        );
        assert_eq!(current_branch(temp.path()).as_deref(), Some("release/v2"));
    }

    #[test]
    fn test_detached_head_and_missing_checkout() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_origin(temp.path()).unwrap(), None);
        assert_eq!(current_branch(temp.path()), None);

        temp.child(".git/HEAD")
            .write_str("3f2a9c0d8e7b6a5f4e3d2c1b0a9f8e7d6c5b4a39\n")
            .unwrap();
        assert_eq!(current_branch(temp.path()), None);
    }
}

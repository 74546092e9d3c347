//! tagwarden - Tag and Release Lifecycle Manager
//!
//! tagwarden creates, lists and deletes version tags and their GitHub releases,
//! with pluggable tag selection and a dry-run mode for every destructive path.
//!
//! ## Core Features
//!
//! - **Release creation**: full releases and prereleases, with force-recreate on tag conflicts
//! - **Tag matching**: exact names, regular expressions or semantic-version ranges
//! - **Paginated scans**: cursor-following listings over releases and tags
//! - **Idempotent deletion**: release record plus `tags/<name>` ref, singly or in bulk
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`hosting`]: Domain model and the [`ReleaseApi`] seam
//! - [`github`]: GitHub implementation of [`ReleaseApi`]
//! - [`matcher`]: Tag selection strategies
//! - [`reader`], [`writer`], [`deleter`]: Release lifecycle operations
//! - [`remote`]: Owner/repo and branch discovery from a local checkout

pub mod config;
pub mod deleter;
pub mod error;
pub mod github;
pub mod hosting;
pub mod matcher;
pub mod reader;
pub mod remote;
pub mod writer;

pub use config::Config;
pub use deleter::{DeleteReport, ReleaseDeleter};
pub use error::{ReleaseError, Result};
pub use github::GitHubClient;
pub use hosting::{NewRelease, Page, PageCursor, Release, ReleaseApi, RepoRef, Tag};
pub use matcher::TagMatcher;
pub use reader::ReleaseReader;
pub use writer::ReleaseWriter;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tagwarden::remote;
use tagwarden::{
    Config, GitHubClient, ReleaseDeleter, ReleaseReader, ReleaseWriter, RepoRef, TagMatcher,
};

#[derive(Parser)]
#[command(name = "tagwarden")]
#[command(about = "Create, list and delete GitHub tags and releases")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Owner (user or org) of the repository; defaults to the origin remote
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name; defaults to the origin remote
    #[arg(long, global = true)]
    repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default settings
    Init {
        /// API root for GitHub Enterprise
        #[arg(long)]
        api_base: Option<String>,

        /// Page size for release and tag listings (1-100)
        #[arg(long)]
        per_page: Option<u8>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    #[command(flatten)]
    Repo(RepoCommands),
}

/// Commands that act on a GitHub repository
#[derive(Subcommand)]
enum RepoCommands {
    /// Publish a release
    Release {
        /// Tag to create
        tag: String,

        /// Branch or commit the tag points at; defaults to the checked-out branch
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Publish a pre-release
    #[command(alias = "pre")]
    Prerelease {
        /// Tag to create
        tag: String,

        /// Branch or commit the tag points at; defaults to the checked-out branch
        #[arg(short, long)]
        branch: Option<String>,

        /// Delete the tag and its release first if the tag already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Manage tags and their releases
    Tag {
        #[command(subcommand)]
        tag_command: TagCommands,
    },

    /// Print the next patch version after the latest release
    NextVersion,
}

#[derive(Subcommand)]
enum TagCommands {
    /// List releases
    List {
        #[command(flatten)]
        selection: Selection,
    },

    /// Delete tags and their releases
    #[command(aliases = ["del", "rm"])]
    Delete {
        #[command(flatten)]
        selection: Selection,

        /// Simulate the deletion without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
struct Selection {
    /// Tag names, regular expressions or version ranges
    #[arg(required = true)]
    tags: Vec<String>,

    /// Treat arguments as regular expressions
    #[arg(short, long, conflicts_with = "semver")]
    regex: bool,

    /// Treat arguments as semantic-version ranges
    #[arg(short, long)]
    semver: bool,
}

impl Selection {
    /// Matcher for bulk scans; `None` means literal tag names
    fn matcher(&self) -> Result<Option<TagMatcher>> {
        if self.regex {
            Ok(Some(TagMatcher::regex(&self.tags)?))
        } else if self.semver {
            Ok(Some(TagMatcher::semver(&self.tags)?))
        } else {
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            api_base,
            per_page,
            force,
        } => {
            init_logging(cli.verbose, &Config::default())?;
            cmd_init(cli.config, api_base, per_page, force)
        }
        Commands::Repo(command) => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(cli.verbose, &config)?;
            info!("Starting tagwarden v{}", env!("CARGO_PKG_VERSION"));

            let cwd = std::env::current_dir().context("Failed to determine current directory")?;
            let repo = resolve_repo(cli.owner, cli.repo, &cwd)?;
            let client = GitHubClient::new(&config.github, cli.token.as_deref().unwrap_or_default())?;
            cmd_repo(command, &client, config.github.page_size(), &repo, &cwd).await
        }
    }
}

/// Handle release, tag and version commands
async fn cmd_repo(
    command: RepoCommands,
    client: &GitHubClient,
    per_page: u8,
    repo: &RepoRef,
    cwd: &Path,
) -> Result<()> {
    match command {
        RepoCommands::Release { tag, branch } => {
            let branch = resolve_branch(branch, cwd)?;
            let release = ReleaseWriter::new(client, per_page)
                .create_release(repo, &branch, &tag)
                .await?;
            println!("Successfully created release: {}", release.html_url);
        }
        RepoCommands::Prerelease { tag, branch, force } => {
            let branch = resolve_branch(branch, cwd)?;
            let release = ReleaseWriter::new(client, per_page)
                .create_prerelease(repo, &branch, &tag, force)
                .await?;
            println!("Successfully created pre-release: {}", release.html_url);
        }
        RepoCommands::Tag { tag_command } => cmd_tag(tag_command, client, per_page, repo).await?,
        RepoCommands::NextVersion => {
            let next = ReleaseReader::new(client, per_page)
                .next_release_version(repo)
                .await?;
            println!("{}", next);
        }
    }

    Ok(())
}

/// Write a configuration file, refusing to clobber one unless forced
fn cmd_init(config_path: Option<PathBuf>, api_base: Option<String>, per_page: Option<u8>, force: bool) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    if config_path.exists() && !force {
        bail!(
            "Configuration already exists at {:?}; pass --force to overwrite",
            config_path
        );
    }

    let mut config = Config::default();
    config.github.api_base = api_base;
    if let Some(per_page) = per_page {
        config.github.per_page = per_page;
    }
    config.save(&config_path)?;

    info!("Configuration saved to: {:?}", config_path);
    println!("Configuration written to {}", config_path.display());
    Ok(())
}

/// Handle tag commands
async fn cmd_tag(command: TagCommands, client: &GitHubClient, per_page: u8, repo: &RepoRef) -> Result<()> {
    match command {
        TagCommands::List { selection } => {
            let reader = ReleaseReader::new(client, per_page);
            match selection.matcher()? {
                Some(matcher) => {
                    reader
                        .scan_all(repo, &matcher, |release| println!("{}", release.summary_line()))
                        .await?;
                }
                None => {
                    reader
                        .list_by_tags(repo, &selection.tags, |tag, release| match release {
                            Some(release) => println!("{}", release.summary_line()),
                            None => println!("{}\tno such release", tag),
                        })
                        .await?;
                }
            }
        }
        TagCommands::Delete { selection, dry_run } => {
            let deleter = ReleaseDeleter::new(client, per_page);
            let reports = match selection.matcher()? {
                Some(matcher) => deleter.delete_many(repo, &matcher, dry_run).await?,
                None => deleter.delete_exact_set(repo, &selection.tags, dry_run).await?,
            };
            for report in &reports {
                println!("{}", report.message());
            }
        }
    }
    Ok(())
}

/// Initialize logging: RUST_LOG wins, then --verbose, then the configured level
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let default_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Fill in owner/repo from the origin remote when not given
fn resolve_repo(owner: Option<String>, repo: Option<String>, cwd: &Path) -> Result<RepoRef> {
    if let (Some(owner), Some(repo)) = (&owner, &repo) {
        return Ok(RepoRef::new(owner, repo));
    }

    let origin = remote::detect_origin(cwd)?;
    let owner = owner
        .or_else(|| origin.as_ref().map(|o| o.owner.clone()))
        .ok_or_else(|| anyhow!("Repository owner unknown: pass --owner or run inside a clone with an origin remote"))?;
    let repo = repo
        .or_else(|| origin.map(|o| o.repo))
        .ok_or_else(|| anyhow!("Repository name unknown: pass --repo or run inside a clone with an origin remote"))?;

    Ok(RepoRef::new(owner, repo))
}

/// Fall back to the checked-out branch when none was given
fn resolve_branch(branch: Option<String>, cwd: &Path) -> Result<String> {
    branch
        .or_else(|| remote::current_branch(cwd))
        .ok_or_else(|| anyhow!("Branch unknown: pass --branch or run inside a clone on a branch"))
}

//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::backends::fetch::fetch;
use crate::backends::locate::Resolver;
use crate::backends::release::{GitHubReleases, DEFAULT_API_URL, DEFAULT_RELEASE_TAG};
use crate::cache::store::remove_cache_dir;
use crate::core::model::HookError;
use crate::core::paths::default_cache_root;
use crate::core::platform::Platform;

/// dfixxer-hook - run the dfixxer Pascal formatter from pre-commit.
#[derive(Parser, Debug)]
#[command(name = "dfixxer-hook")]
#[command(
    author,
    version,
    about,
    long_about = r#"dfixxer-hook formats staged Delphi/Pascal files with dfixxer.

pre-commit calls it with the staged file names. dfixxer is taken from PATH
when installed; otherwise the pinned release for this platform is downloaded
once into ~/.cache/dfixxer-pre-commit/<tag>/ and reused afterwards.

All files are passed to a single `dfixxer update` run. A failing run makes
the hook (and the commit) fail with dfixxer's exit code.

Examples:
    dfixxer-hook src/Main.pas src/Utils.pas
    dfixxer-hook fetch
    dfixxer-hook where
    dfixxer-hook cache clean --all
    dfixxer-hook doctor
"#
)]
pub struct Cli {
    /// Files to format (passed by pre-commit).
    #[arg(value_name = "FILES", num_args = 0..)]
    pub files: Vec<PathBuf>,

    /// Use this dfixxer binary instead of PATH or the cache.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_BINARY",
        value_name = "PATH",
        long_help = "Use this dfixxer binary and skip PATH lookup, cache and download.\n\n\
Accepts a file path or a command name resolvable on PATH."
    )]
    pub binary: Option<PathBuf>,

    /// Cache root directory.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_CACHE_DIR",
        value_name = "DIR",
        long_help = "Root of the binary cache. Binaries live under <DIR>/<tag>/.\n\n\
Defaults to ~/.cache/dfixxer-pre-commit."
    )]
    pub cache_dir: Option<PathBuf>,

    /// dfixxer release tag to download.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_RELEASE_TAG",
        default_value = DEFAULT_RELEASE_TAG,
        value_name = "TAG"
    )]
    pub release_tag: String,

    /// GitHub API base URL.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_API_URL",
        default_value = DEFAULT_API_URL,
        value_name = "URL",
        long_help = "Base URL of the GitHub REST API used to look up the release.\n\n\
Point this at a GitHub Enterprise instance or a mirror serving the same API."
    )]
    pub api_url: String,

    /// Do not look for dfixxer on PATH.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_NO_PATH",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_path: bool,

    /// HTTP timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "DFIXXER_TIMEOUT",
        default_value = "120",
        value_name = "SECS"
    )]
    pub timeout: u64,

    /// GitHub token for API requests.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true, hide = true)]
    pub github_token: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (warnings and errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug diagnostics).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download dfixxer into the cache.
    #[command(
        long_about = "Download the configured dfixxer release into the cache, even when\n\
dfixxer is installed on PATH. Prints the cached binary path.\n\n\
Examples:\n\
  dfixxer-hook fetch\n\
  dfixxer-hook fetch --force\n"
    )]
    Fetch {
        /// Re-download even if the binary is already cached.
        #[arg(long)]
        force: bool,
    },

    /// Print the dfixxer binary the hook would run.
    #[command(
        long_about = "Resolve dfixxer the same way the hook does (override, PATH, cache,\n\
download) and print its path and source."
    )]
    Where,

    /// Inspect or clean the binary cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Check platform, PATH, cache and configuration.
    #[command(
        long_about = "Report the detected platform, any dfixxer on PATH, the cache entry for\n\
the configured release tag, and the dfixxer.toml in effect. Never downloads."
    )]
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show the cache location and what it holds.
    Info,

    /// Remove the cached binary for the configured release tag.
    Clean {
        /// Remove the whole cache root, all tags included.
        #[arg(long)]
        all: bool,
    },
}

/// Install the stderr tracing subscriber
pub fn init_logging(cli: &Cli) {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,dfixxer_hook={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .without_time()
        .compact()
        .init();
}

impl Cli {
    fn resolver(&self) -> Resolver {
        Resolver {
            cache_root: self.cache_dir.clone().unwrap_or_else(default_cache_root),
            release_tag: self.release_tag.clone(),
            search_path: !self.no_path,
            binary_override: self.binary.clone(),
        }
    }

    fn release_source(&self) -> Result<GitHubReleases> {
        GitHubReleases::new(
            &self.api_url,
            Duration::from_secs(self.timeout),
            self.github_token.clone(),
        )
        .context("Failed to set up the release client")
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        None => run_hook(&cli),
        Some(Commands::Fetch { force }) => run_fetch(&cli, *force),
        Some(Commands::Where) => run_where(&cli),
        Some(Commands::Cache { action }) => match action {
            CacheCommands::Info => run_cache_info(&cli),
            CacheCommands::Clean { all } => run_cache_clean(&cli, *all),
        },
        Some(Commands::Doctor) => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            let ready = crate::backends::doctor::run_doctor(&cli.resolver(), &cwd);
            Ok(if ready {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Format the staged files
fn run_hook(cli: &Cli) -> Result<ExitCode> {
    if cli.files.is_empty() {
        debug!("No files to format");
        return Ok(ExitCode::SUCCESS);
    }

    let source = cli.release_source()?;
    let binary = cli
        .resolver()
        .resolve(&source)
        .context("Failed to obtain dfixxer")?;
    debug!("Using dfixxer from {}: {}", binary.source, binary.path.display());

    match crate::backends::invoke::run_update(&binary.path, &cli.files) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(HookError::FormatterFailed { code }) => Ok(exit_code(code)),
        Err(e) => Err(e).context("Failed to run dfixxer"),
    }
}

/// Map a formatter exit status onto a process exit code, never 0
fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(byte) if byte != 0 => ExitCode::from(byte),
        _ => ExitCode::FAILURE,
    }
}

fn run_fetch(cli: &Cli, force: bool) -> Result<ExitCode> {
    let platform = Platform::detect()?;
    let resolver = cli.resolver();
    let source = cli.release_source()?;

    // A forced fetch replaces the cached binary only once the new one is ready
    let path = if force {
        resolver
            .store(&platform)
            .and_then(|store| fetch(&source, &store, &platform))
    } else {
        resolver
            .resolve_cached(&platform, &source)
            .map(|binary| binary.path)
    }
    .context("Failed to fetch dfixxer")?;

    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn run_where(cli: &Cli) -> Result<ExitCode> {
    let source = cli.release_source()?;
    let binary = cli
        .resolver()
        .resolve(&source)
        .context("Failed to obtain dfixxer")?;
    println!("{} ({})", binary.path.display(), binary.source);
    Ok(ExitCode::SUCCESS)
}

fn run_cache_info(cli: &Cli) -> Result<ExitCode> {
    let platform = Platform::detect()?;
    let store = cli.resolver().store(&platform)?;

    println!("root: {}", store.root().display());
    println!("release: {}", store.release_tag());
    println!("binary: {}", store.binary_path().display());
    println!(
        "cached: {}",
        if store.cached_binary().is_some() {
            "yes"
        } else {
            "no"
        }
    );
    if let Some(meta) = store.read_meta() {
        println!("asset: {} ({})", meta.asset_name, meta.release_tag);
        println!("url: {}", meta.download_url);
        println!("sha256: {}", meta.sha256);
        println!(
            "fetched: {} by dfixxer-hook {}",
            meta.fetched_at.to_rfc3339(),
            meta.hook_version
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_cache_clean(cli: &Cli, all: bool) -> Result<ExitCode> {
    let resolver = cli.resolver();
    let (target, removed) = if all {
        let root = resolver.cache_root.clone();
        let removed = remove_cache_dir(&root)?;
        (root, removed)
    } else {
        let store = resolver.store(&Platform::detect()?)?;
        (store.entry_dir(), store.clean()?)
    };

    if removed {
        println!("removed {}", target.display());
    } else {
        println!("nothing to remove at {}", target.display());
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_files() {
        let cli = Cli::try_parse_from(["dfixxer-hook", "a.pas", "b.pas"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.pas"), PathBuf::from("b.pas")]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommand_with_global_flag() {
        let cli =
            Cli::try_parse_from(["dfixxer-hook", "cache", "clean", "--all", "--cache-dir", "/c"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Cache {
                action: CacheCommands::Clean { all: true }
            })
        ));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/c")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dfixxer-hook", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_exit_code_mapping() {
        let debug = |code: ExitCode| format!("{:?}", code);
        assert_eq!(debug(exit_code(3)), debug(ExitCode::from(3)));
        assert_eq!(debug(exit_code(0)), debug(ExitCode::FAILURE));
        assert_eq!(debug(exit_code(-1)), debug(ExitCode::FAILURE));
        assert_eq!(debug(exit_code(300)), debug(ExitCode::FAILURE));
    }

    #[test]
    fn test_resolver_from_flags() {
        let cli = Cli::try_parse_from([
            "dfixxer-hook",
            "--no-path",
            "--cache-dir",
            "/c",
            "--release-tag",
            "v1.0.0",
        ])
        .unwrap();
        let resolver = cli.resolver();
        assert!(!resolver.search_path);
        assert_eq!(resolver.cache_root, PathBuf::from("/c"));
        assert_eq!(resolver.release_tag, "v1.0.0");
        assert_eq!(resolver.binary_override, None);
    }
}

//! mathstore CLI: inspect and maintain a formula storage and cache.
//!
//! Provides `mathstore digest` and `mathstore keys` for offline key
//! computation, `mathstore code`/`decode` for formula source,
//! `mathstore store`/`retrieve` for rendered artifacts, and
//! `mathstore delete-cache` for wiping the store.

#![warn(missing_docs)]

mod artifact;
mod formula;
mod inspect;
mod maintenance;
mod stream;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use mathstore_cache::StorageAndCache;
use mathstore_config::{BackendKind, StoreConfig, CONFIG_FILE};
use tracing_subscriber::EnvFilter;

/// Exit code for a lookup that found nothing.
pub const EXIT_MISS: i32 = 2;

/// Store root used when no configuration file is found.
const DEFAULT_ROOT: &str = ".mathstore";

/// Digest-addressed storage for rendered formulas.
#[derive(Parser, Debug)]
#[command(name = "mathstore", version, about = "Formula storage and cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored log output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `mathstore.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the digest of some content without touching the store.
    Digest {
        /// Input file, or `-` for stdin.
        input: String,
    },
    /// Print the object keys derived from a digest.
    Keys(KeysArgs),
    /// Store formula source and print its digest.
    Code {
        /// Input file, or `-` for stdin.
        input: String,
    },
    /// Print the formula source stored for a digest.
    Decode(DecodeArgs),
    /// Store a rendered artifact for a digest and service.
    Store(StoreArgs),
    /// Print the rendered artifact cached for a digest and service.
    Retrieve(RetrieveArgs),
    /// Delete every object in the store.
    DeleteCache(DeleteCacheArgs),
}

/// Arguments for the `mathstore keys` subcommand.
#[derive(Parser, Debug)]
pub struct KeysArgs {
    /// The digest to derive keys from.
    pub digest: String,

    /// Also print the artifact key and content type for this service.
    #[arg(short, long)]
    pub service: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `mathstore decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// The digest to look up.
    pub digest: String,

    /// Write the content to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `mathstore store` subcommand.
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// The digest the artifact belongs to.
    pub digest: String,

    /// The service that rendered the artifact (`png`, `svg`, or a text service).
    pub service: String,

    /// Input file, or `-` for stdin.
    pub input: String,
}

/// Arguments for the `mathstore retrieve` subcommand.
#[derive(Parser, Debug)]
pub struct RetrieveArgs {
    /// The digest to look up.
    pub digest: String,

    /// The service that rendered the artifact.
    pub service: String,

    /// Write the artifact to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `mathstore delete-cache` subcommand.
#[derive(Parser, Debug)]
pub struct DeleteCacheArgs {
    /// Confirm deletion of every stored object.
    #[arg(long)]
    pub yes: bool,

    /// Output format for the deletion report.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Returns the log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    init_logging(&global);

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(dispatch(cli.command, &global)),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

async fn dispatch(
    command: Command,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    match command {
        Command::Digest { input } => inspect::digest(&input),
        Command::Keys(ref args) => inspect::keys(args),
        Command::Code { input } => formula::code(&input, global).await,
        Command::Decode(ref args) => formula::decode(args, global).await,
        Command::Store(ref args) => artifact::store(args, global).await,
        Command::Retrieve(ref args) => artifact::retrieve(args, global).await,
        Command::DeleteCache(ref args) => maintenance::delete_cache(args, global).await,
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(global.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .init();
}

/// Resolves the store configuration.
///
/// An explicit `--config` path must exist. Otherwise `mathstore.toml` in the
/// current directory is used when present, falling back to a filesystem store
/// under `.mathstore`.
pub fn resolve_config(global: &GlobalArgs) -> Result<StoreConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        return Ok(mathstore_config::load_config_file(Path::new(path))?);
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Ok(mathstore_config::load_config_file(&local)?);
    }
    let mut config = StoreConfig::default();
    config.backend.kind = BackendKind::Filesystem;
    config.backend.root = Some(DEFAULT_ROOT.to_string());
    Ok(config)
}

/// Opens the store described by the resolved configuration.
pub fn open_store(global: &GlobalArgs) -> Result<StorageAndCache, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    if config.backend.kind == BackendKind::Memory {
        tracing::warn!("memory backend selected; stored objects are lost when the command exits");
    }
    Ok(StorageAndCache::open(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            config,
        }
    }

    #[test]
    fn parse_digest() {
        let cli = Cli::parse_from(["mathstore", "digest", "formula.tex"]);
        match cli.command {
            Command::Digest { input } => assert_eq!(input, "formula.tex"),
            _ => panic!("expected Digest command"),
        }
    }

    #[test]
    fn parse_keys_with_service() {
        let cli = Cli::parse_from([
            "mathstore",
            "keys",
            "ab12cd",
            "--service",
            "mathml",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Keys(ref args) => {
                assert_eq!(args.digest, "ab12cd");
                assert_eq!(args.service.as_deref(), Some("mathml"));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Keys command"),
        }
    }

    #[test]
    fn parse_code_stdin() {
        let cli = Cli::parse_from(["mathstore", "code", "-"]);
        match cli.command {
            Command::Code { input } => assert_eq!(input, "-"),
            _ => panic!("expected Code command"),
        }
    }

    #[test]
    fn parse_decode_with_output() {
        let cli = Cli::parse_from(["mathstore", "decode", "ab12cd", "-o", "out.tex"]);
        match cli.command {
            Command::Decode(ref args) => {
                assert_eq!(args.digest, "ab12cd");
                assert_eq!(args.output.as_deref(), Some("out.tex"));
            }
            _ => panic!("expected Decode command"),
        }
    }

    #[test]
    fn parse_store() {
        let cli = Cli::parse_from(["mathstore", "store", "ab12cd", "png", "image.png"]);
        match cli.command {
            Command::Store(ref args) => {
                assert_eq!(args.digest, "ab12cd");
                assert_eq!(args.service, "png");
                assert_eq!(args.input, "image.png");
            }
            _ => panic!("expected Store command"),
        }
    }

    #[test]
    fn parse_retrieve() {
        let cli = Cli::parse_from(["mathstore", "retrieve", "ab12cd", "svg"]);
        match cli.command {
            Command::Retrieve(ref args) => {
                assert_eq!(args.service, "svg");
                assert!(args.output.is_none());
            }
            _ => panic!("expected Retrieve command"),
        }
    }

    #[test]
    fn parse_delete_cache_defaults() {
        let cli = Cli::parse_from(["mathstore", "delete-cache"]);
        match cli.command {
            Command::DeleteCache(ref args) => {
                assert!(!args.yes);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected DeleteCache command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "mathstore",
            "--quiet",
            "--color",
            "never",
            "--config",
            "/etc/mathstore.toml",
            "delete-cache",
            "--yes",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("/etc/mathstore.toml"));
    }

    #[test]
    fn log_filter_follows_flags() {
        let mut g = global(None);
        assert_eq!(g.default_log_filter(), "info");
        g.verbose = true;
        assert_eq!(g.default_log_filter(), "debug");
        g.quiet = true;
        assert_eq!(g.default_log_filter(), "error");
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[backend]\nkind = \"filesystem\"\nroot = \"/srv/formulas\"\n",
        )
        .unwrap();
        let config = resolve_config(&global(Some(path.to_string_lossy().into_owned()))).unwrap();
        assert_eq!(config.backend.root.as_deref(), Some("/srv/formulas"));
    }

    #[test]
    fn missing_explicit_config_errors() {
        let result = resolve_config(&global(Some("/nonexistent/mathstore.toml".to_string())));
        assert!(result.is_err());
    }
}

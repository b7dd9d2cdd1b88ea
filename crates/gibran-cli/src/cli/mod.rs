//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gibran_core::domain::MarkerMatching;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "gibran",
    bin_name = "gibran",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Layered Go project scaffolding and broker generation",
    long_about = "Gibran scaffolds a layered Go project (controllers, models, \
                  routers, views, brokers) and regenerates one broker file per \
                  package from the package's own declarations and imports.",
    after_help = "EXAMPLES:\n\
        \x20 gibran startproject shop\n\
        \x20 gibran run shop\n\
        \x20 gibran run --output-format json > report.json\n\
        \x20 gibran completions bash > /usr/share/bash-completion/completions/gibran",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the standard project layout.
    #[command(
        visible_alias = "startproject",
        about = "Scaffold a new project",
        after_help = "EXAMPLES:\n\
            \x20 gibran scaffold                 # ./myapp\n\
            \x20 gibran startproject shop        # ./shop\n\
            \x20 gibran scaffold shop ~/work     # ~/work/shop"
    )]
    Scaffold(ScaffoldArgs),

    /// Regenerate every package's broker.
    #[command(
        about = "Regenerate broker files",
        after_help = "EXAMPLES:\n\
            \x20 gibran run\n\
            \x20 gibran run shop --jobs 4\n\
            \x20 gibran run --goroot \"$(go env GOROOT)\""
    )]
    Run(RunArgs),

    /// Initialise a Gibran configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 gibran init           # per-user config\n\
            \x20 gibran init --local   # ./gibran.toml"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 gibran completions bash > ~/.local/share/bash-completion/completions/gibran\n\
            \x20 gibran completions zsh  > ~/.zfunc/_gibran\n\
            \x20 gibran completions fish > ~/.config/fish/completions/gibran.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Gibran configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 gibran config get markers.broker\n\
            \x20 gibran config list\n\
            \x20 gibran config path"
    )]
    Config(ConfigCommands),
}

impl Commands {
    /// Directory whose `gibran.toml` joins the configuration, if any.
    pub fn project_root(&self) -> Option<PathBuf> {
        match self {
            Self::Run(args) => Some(args.root.clone().unwrap_or_else(|| PathBuf::from("."))),
            _ => None,
        }
    }
}

// ── scaffold ──────────────────────────────────────────────────────────────────

/// Arguments for `gibran scaffold`.
#[derive(Debug, Args)]
pub struct ScaffoldArgs {
    /// Project name; the project is created at `<ROOT>/<NAME>`.
    #[arg(value_name = "NAME", default_value = "myapp", help = "Project name")]
    pub name: String,

    /// Parent directory.
    #[arg(
        value_name = "ROOT",
        help = "Directory to create the project in (default: current directory)"
    )]
    pub root: Option<PathBuf>,
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Arguments for `gibran run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Project root.
    #[arg(
        value_name = "ROOT",
        help = "Project root to walk (default: current directory)"
    )]
    pub root: Option<PathBuf>,

    /// Worker count.
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "N",
        help = "Packages processed in parallel (0 = all cores)"
    )]
    pub jobs: Option<usize>,

    /// Extra resolver search paths.
    #[arg(
        long = "search-path",
        value_name = "DIR",
        help = "Module root or GOPATH to search for imports (repeatable)"
    )]
    pub search_paths: Vec<PathBuf>,

    /// Go toolchain root.
    #[arg(
        long = "goroot",
        value_name = "DIR",
        help = "Go installation whose src/ holds the standard library"
    )]
    pub goroot: Option<PathBuf>,

    /// Broker template override.
    #[arg(
        long = "template",
        value_name = "FILE",
        help = "Tera template used instead of the built-in broker template"
    )]
    pub template: Option<PathBuf>,

    /// Marker matching mode.
    #[arg(
        long = "marker-matching",
        value_enum,
        value_name = "MODE",
        help = "How generated/broker markers match file names"
    )]
    pub marker_matching: Option<Matching>,
}

/// Marker matching as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Matching {
    /// Marker anywhere in the file name.
    Substring,
    /// Stem equal to the marker or ending in `_<marker>`.
    Suffix,
}

impl From<Matching> for MarkerMatching {
    fn from(m: Matching) -> Self {
        match m {
            Matching::Substring => Self::Substring,
            Matching::Suffix => Self::Suffix,
        }
    }
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `gibran init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `gibran.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `gibran completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `gibran config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `markers.broker`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the per-user configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

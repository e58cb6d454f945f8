use cbx_lib::Viewport;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cbx")]
#[command(
    version,
    about = "Component Blueprint Extractor - Detect and group reusable UI components in rendered pages",
    long_about = "Component Blueprint Extractor (CBX)\n\nInput is one or more page capture JSON files (url, html or nodes, styles, boxes) produced by a browser driver.\n\nModes:\n- analyze: detect components per page, build hierarchies, clusters and patterns, and aggregate across pages.\n- tokens: print only the design tokens (spacing scale, size/color/state variants).\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging on stderr")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML); defaults to ./cbx.toml when present. CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze captures and print per-page results plus the site aggregate
    Analyze(RunArgs),

    /// Print the design tokens extracted from the captures
    Tokens(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_name = "CAPTURE", required = true, help = "Page capture JSON files")]
    pub captures: Vec<PathBuf>,

    #[arg(long, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SCORE",
        help = "Minimum rule score (0.0-1.0) for a component to be reported"
    )]
    pub confidence: Option<f64>,

    #[arg(
        long,
        help = "Viewport (WIDTHxHEIGHT) for captures that do not record one"
    )]
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
    Yaml,
}

pub fn parse() -> Cli {
    Cli::parse()
}

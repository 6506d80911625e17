use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set request headers (e.g. "Authorization: Bearer ...")
    #[arg(required = false, long, short = 'H', global = true)]
    pub header: Option<Vec<String>>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured index and write the catalog
    #[clap(name = "build", visible_alias = "b")]
    Build {
        /// Write the catalog here instead of the configured output
        #[arg(required = false, short, long, value_hint = ValueHint::FilePath)]
        output: Option<String>,

        /// Only collect these architectures
        #[arg(required = false, long = "arch")]
        architectures: Vec<String>,

        /// Only fetch these repositories
        #[arg(required = false, long = "repo")]
        repositories: Vec<String>,

        /// Write compact JSON
        #[arg(required = false, long)]
        compact: bool,
    },

    /// Search packages in a generated catalog
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s", visible_alias = "find")]
    Search {
        /// Query to search
        #[arg(required = true)]
        query: String,

        /// Catalog to search (default: the configured output)
        #[arg(required = false, long, value_hint = ValueHint::FilePath)]
        catalog: Option<String>,

        /// Only show packages from this repository
        #[arg(required = false, long)]
        repo: Option<String>,

        /// Only show packages available for this architecture
        #[arg(required = false, long)]
        arch: Option<String>,

        /// Limit number of results
        #[arg(required = false, long)]
        limit: Option<usize>,
    },

    /// Show details of a package in a generated catalog
    #[command(arg_required_else_help = true)]
    #[clap(name = "show", visible_alias = "info")]
    Show {
        /// Package name
        #[arg(required = true)]
        name: String,

        /// Catalog to read (default: the configured output)
        #[arg(required = false, long, value_hint = ValueHint::FilePath)]
        catalog: Option<String>,
    },

    /// Print the effective configuration
    #[clap(name = "config")]
    Config,

    /// Generate a documented default config file
    #[clap(name = "defconfig")]
    DefConfig,
}

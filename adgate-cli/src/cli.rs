use adgate_filter::FilterOptions;
use clap::Parser;
use std::path::PathBuf;

pub const ENV_CONFIG: &str = "ADFILTER_CONFIG";
pub const ENV_LOG: &str = "ADFILTER_LOG";

#[derive(Parser, Debug)]
#[command(name = "adfilter")]
#[command(version, about = "Compile a JSON filter document to an LDAP search filter", long_about = None)]
pub struct Cli {
    /// JSON document to compile; stdin when omitted or `-`
    pub file: Option<PathBuf>,

    /// Path to a TOML config file with a [filter] table
    #[arg(long, short = 'c', env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum node count
    #[arg(long)]
    pub max_nodes: Option<usize>,

    /// Escape `*`, `(`, `)`, `\` and NUL in values
    #[arg(long)]
    pub escape_values: bool,

    /// Reject attribute names that are not valid attribute descriptions
    #[arg(long)]
    pub validate_attributes: bool,

    /// Allow only the named attribute (repeatable)
    #[arg(long = "allow", value_name = "ATTR")]
    pub allow: Vec<String>,

    /// Print the normalized JSON document instead of the LDAP filter
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Whether the document is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.file
            .as_ref()
            .is_none_or(|path| path.as_os_str() == "-")
    }

    /// Apply command-line overrides on top of the configured options.
    ///
    /// Switches only turn features on; `--allow` replaces the configured list.
    pub fn apply(&self, mut options: FilterOptions) -> FilterOptions {
        if let Some(depth) = self.max_depth {
            options.max_depth = depth;
        }
        if let Some(nodes) = self.max_nodes {
            options.max_nodes = nodes;
        }
        if self.escape_values {
            options.escape_values = true;
        }
        if self.validate_attributes {
            options.validate_attributes = true;
        }
        if !self.allow.is_empty() {
            options.allowed_attributes.clone_from(&self.allow);
        }
        options
    }

    /// Default log directive for the verbosity flag.
    pub const fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "adgate_filter=debug,adfilter=debug,warn",
            _ => "adgate_filter=trace,adfilter=trace,info",
        }
    }
}

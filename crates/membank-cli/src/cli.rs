use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "membank",
    about = "Membank: per-project persistent knowledge graph for agent memory",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Memory bank base directory (overrides the config file)
    #[arg(long, global = true, env = "MEMORY_BASE_PATH")]
    pub path: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level on stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the memory bank base directory
    Init {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Add nodes and edges from a JSON batch request
    Add {
        /// Project name
        project: String,

        /// Request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update node labels and data from a JSON batch request
    Update {
        /// Project name
        project: String,

        /// Request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete nodes and edges from a JSON batch request
    Delete {
        /// Project name
        project: String,

        /// Request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a filtered or neighbor query from a JSON request
    Query {
        /// Project name
        project: String,

        /// Request file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Substring search over node fields
    Search {
        /// Project name
        project: String,

        /// Text to look for
        query: String,

        /// Fields to search (default: id,type,label)
        #[arg(long = "in", value_enum, value_delimiter = ',')]
        fields: Vec<SearchFieldArg>,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// Maximum number of nodes (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open nodes by id
    Open {
        /// Project name
        project: String,

        /// Node IDs
        #[arg(required = true)]
        ids: Vec<String>,

        /// Omit edges among the opened nodes
        #[arg(long)]
        no_relations: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project with an empty graph
    Create {
        /// Project name
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List projects under the base directory
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SearchFieldArg {
    Id,
    Type,
    Label,
    Data,
}

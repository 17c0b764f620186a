use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Paperstack: browse the reMarkable document store and add documents to it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Document store directory (a mount or copy of the tablet's xochitl directory).
    #[arg(long, env = "PAPERSTACK_XOCHITL_DIR", global = true)]
    pub xochitl_dir: Option<PathBuf>,

    /// Settings file (JSON).
    #[arg(long, env = "PAPERSTACK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the collection hierarchy with the documents in each collection.
    Tree(TreeArgs),
    /// Print the identifier of the collection at a path.
    Resolve(ResolveArgs),
    /// Print the records that would be written for a document, without writing them.
    Bundle(BundleArgs),
    /// Add a document to the store.
    Push(PushArgs),
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Show identifiers next to names.
    #[arg(long)]
    pub ids: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Collection names separated by `//`, e.g. `Books//Manga`.
    pub path: String,
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// The source document.
    #[arg(required = true)]
    pub file: PathBuf,

    /// Destination collection path. Defaults to the root.
    #[arg(long, short)]
    pub collection: Option<String>,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// The source document.
    #[arg(required = true)]
    pub file: PathBuf,

    /// Destination collection path. Defaults to the root.
    #[arg(long, short)]
    pub collection: Option<String>,

    /// Skip confirmation.
    #[arg(long, short)]
    pub yes: bool,

    /// Run the configured restart command once the document is written.
    #[arg(long)]
    pub restart: bool,
}

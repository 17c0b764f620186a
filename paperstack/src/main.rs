use anyhow::Result;
use clap::Parser;
use paperstack::cli::{Cli, Commands};
use paperstack::settings::Settings;
use paperstack::{commands, logging, AppContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables may also come from a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref(), cli.xochitl_dir.clone()).await?;
    let cx = AppContext::open(settings).await?;

    match cli.command {
        Commands::Tree(args) => commands::handle_tree(args, &cx).await?,
        Commands::Resolve(args) => commands::handle_resolve(args, &cx).await?,
        Commands::Bundle(args) => commands::handle_bundle(args, &cx).await?,
        Commands::Push(args) => commands::handle_push(args, &cx).await?,
    }

    Ok(())
}

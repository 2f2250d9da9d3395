mod cli;
mod config;
mod download;
mod error;
mod first_passage;
mod gazetteer;
mod greenness;
mod observation;
mod parquet;
mod raster;
mod resolve;
mod states;
mod weights;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(&cli.config)?;

    let outcome = match &cli.command {
        Commands::Fetch {} => command::fetch(&config).await,
        Commands::FirstPassage { codes, out } => {
            command::first_passage(&config, *codes, out.clone())
        }
        Commands::Counties {} => command::counties(&config),
        Commands::Weights { out } => command::weights(&config, out.clone()),
        Commands::Greenness { weights, out } => {
            command::greenness(&config, weights, out.clone())
        }
        Commands::Trace { year, weights, out } => {
            command::trace(&config, *year, weights, out.clone())
        }
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

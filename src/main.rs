#![doc = include_str!("../README.md")]
use log::LevelFilter;
use structopt::StructOpt;

use dbpedia_xlingo::cli;
use dbpedia_xlingo::error;
use dbpedia_xlingo::orchestrator;

#[macro_use]
extern crate log;

#[tokio::main]
async fn main() -> Result<(), error::Error> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    builder.init();

    let opt = cli::Cli::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Cli::Ingest(args) => {
            let report = orchestrator::run_ingest(args).await?;
            info!(
                "ingestion complete: {} keys, {} parse errors",
                report.inventory.len(),
                report.parse_errors
            );
        }
        cli::Cli::Translate(args) => {
            let table = orchestrator::run_translate(args).await?;
            info!("translation table complete: {} rows", table.rows.len());
        }
        cli::Cli::Match(args) => {
            let report = orchestrator::run_match(args).await?;
            info!(
                "matching complete: {} matches, {} unmatched source, {} unmatched target",
                report.matches.len(),
                report.unmatched_src.len(),
                report.unmatched_trg.len()
            );
        }
        cli::Cli::Run(args) => {
            let report = orchestrator::run_pipeline(args).await?;
            info!(
                "pipeline complete: {} matches, {} unmatched source, {} unmatched target",
                report.matches.len(),
                report.unmatched_src.len(),
                report.unmatched_trg.len()
            );
        }
    }

    Ok(())
}

#[macro_use]
extern crate tracing;

use query_engine::{cli, cli::CliCommand, error::EngineError, logger::Logger, opt::EngineOpt};
use std::process;
use structopt::StructOpt;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        info!("Encountered error during initialization:");

        if err.render_as_json().is_err() {
            eprintln!("{err}");
        }

        process::exit(1);
    }
}

async fn run() -> Result<(), EngineError> {
    let opts = EngineOpt::from_args();

    let mut logger = Logger::new("query-engine");
    logger.log_format(opts.log_format);
    logger.log_queries(opts.log_queries);
    logger.install()?;

    let database = cli::database(&opts).await?;
    let engine = cli::engine(database)?;

    let command = CliCommand::from_opt(&opts).await?;
    let response = command.execute(&engine).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use trackprogress::{Config, ProgressReporter};

fn main() -> Result<()> {
    // load environment variables
    dotenv::dotenv().ok();
    env_logger::init();

    let opts = cli::Opts::parse();
    let config = match &opts.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let config = opts.apply(config);
    log::debug!("using config: {:?}", config);

    match &opts.command {
        cli::Command::Id(id_opts) => {
            cli::print_ids(id_opts, &mut std::io::stdout())?;
        }
        cli::Command::Simulate(sim_opts) => {
            let reporter = ProgressReporter::from_config(&config);
            cli::simulate(&reporter, config.enabled, sim_opts)?;
        }
    }
    Ok(())
}

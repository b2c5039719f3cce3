use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use trackprogress::{identify, progress, Config, ProgressReporter, Style};

#[derive(Parser, Debug, Clone)]
pub struct IdOptions {
    /// Download urls or paths
    #[clap(required = true)]
    pub descriptions: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateOptions {
    pub description: String,
    #[clap(long = "total")]
    pub total: u64,
    #[clap(long = "chunk", default_value = "65536")]
    pub chunk: u64,
}

#[derive(Parser, Debug, Clone)]
pub enum Command {
    #[clap(name = "id", about = "print the track id derived from each description")]
    Id(IdOptions),
    #[clap(name = "simulate", about = "report progress of a fake download")]
    Simulate(SimulateOptions),
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "trackprogress",
    version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
    about = "progress reporting for track downloads",
)]
pub struct Opts {
    #[clap(long = "config")]
    pub config: Option<PathBuf>,
    #[clap(long = "style")]
    pub style: Option<Style>,
    #[clap(short = 'q', long = "quiet", env = "TRACKPROGRESS_QUIET")]
    pub quiet: bool,
    #[clap(subcommand)]
    pub command: Command,
}

impl Opts {
    /// Applies command line overrides on top of `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(style) = self.style {
            config.style = style;
        }
        if self.quiet {
            config.enabled = false;
        }
        config
    }
}

pub fn print_ids(opts: &IdOptions, out: &mut impl Write) -> std::io::Result<()> {
    for desc in &opts.descriptions {
        match identify(desc) {
            Some((source, id)) => writeln!(out, "{}: {} ({})", desc, id, source)?,
            None => writeln!(out, "{}: Unknown", desc)?,
        }
    }
    Ok(())
}

pub fn simulate(
    reporter: &ProgressReporter,
    enabled: bool,
    opts: &SimulateOptions,
) -> Result<(), progress::Error> {
    reporter.add_title(&opts.description)?;
    let handle = reporter.get_progress_callback(enabled, opts.total, opts.description.as_str());
    let chunk = opts.chunk.max(1);
    let mut sent = 0;
    while sent < opts.total {
        let delta = chunk.min(opts.total - sent);
        handle.advance(delta)?;
        sent += delta;
    }
    handle.finish()?;
    reporter.remove_title(&opts.description)?;
    Ok(())
}

//! Runs a command script through the simulator and prints every event.
//!
//! ```bash
//! avail scenario.txt
//! avail --sites 4 --resources 8 < scenario.txt
//! RUST_LOG=avail=debug avail --config sim.toml scenario.txt
//! ```

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use avail::{SimConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "avail")]
#[command(version, about, long_about = None)]
struct Args {
    /// Command script, one tick per line. Reads stdin when absent.
    script: Option<PathBuf>,

    /// TOML file with simulation settings
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of sites (overrides the config file)
    #[arg(short = 's', long)]
    sites: Option<u8>,

    /// Number of resources (overrides the config file)
    #[arg(short = 'r', long)]
    resources: Option<u32>,

    /// Hide replayed requests that are still waiting
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Stop at the first rejected request
    #[arg(long)]
    strict: bool,
}

impl Args {
    fn apply(&self, config: &mut SimConfig) {
        if let Some(sites) = self.sites {
            config.sites = sites;
        }
        if let Some(resources) = self.resources {
            config.resources = resources;
        }
        if self.quiet {
            config.show_retries = false;
        }
        if self.strict {
            config.strict = true;
        }
    }
}

fn run(args: &Args, mut config: SimConfig) -> avail_base::Result<()> {
    args.apply(&mut config);
    let src = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut sim = Simulation::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    sim.run_script(&src, &mut out)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // The config file may name the log filter, so it is read before logging
    // is up; a bad file is reported on stderr directly.
    let config = match SimConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("avail: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("avail: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! `bfx`: convert between XML and BadgerFish JSON.

use clap::Parser;
use helios_badgerfish_cli::{CliConfig, exit_code, init_logging, run};
use tracing::error;

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(&cli) {
        let code = exit_code(&e);
        error!(code, "Conversion failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(code);
    }

    Ok(())
}

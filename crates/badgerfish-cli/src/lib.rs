//! # Helios BadgerFish CLI
//!
//! Library side of the `bfx` binary: option parsing, logging setup and the
//! conversion driver. Formats are resolved through a
//! [`CodecRegistry`](helios_badgerfish::CodecRegistry), so any media type
//! with a registered codec can be read or written.

pub mod config;

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use helios_badgerfish::{BadgerFishError, Codec, CodecRegistry, JsonCodec};
use tracing::{debug, info};

pub use config::CliConfig;

/// Exit code for invalid options or formats.
pub const EXIT_CONFIGURATION: i32 = 2;

/// Initializes tracing on stderr.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("helios_badgerfish={},helios_badgerfish_cli={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Builds the registry used for a run: the defaults, with JSON output
/// pretty-printed when requested.
pub fn registry(cli: &CliConfig) -> anyhow::Result<CodecRegistry> {
    let mut registry = CodecRegistry::with_defaults(cli.badgerfish_config()?);
    if cli.pretty {
        registry.register(Arc::new(JsonCodec::new(true)));
    }
    Ok(registry)
}

/// Converts the input named by `cli` and writes the result.
pub fn run(cli: &CliConfig) -> anyhow::Result<()> {
    let registry = registry(cli)?;
    let from = lookup(&registry, &cli.from)?;
    let to = lookup(&registry, &cli.to)?;
    info!(from = from.name(), to = to.name(), "Converting");

    let input = read_input(cli.input.as_deref())?;
    debug!(bytes = input.len(), "Read input");

    let tree = from.decode(&input)?;
    let output = to.encode(&tree)?;
    write_output(cli.output.as_deref(), &output)?;

    debug!(bytes = output.len(), "Wrote output");
    Ok(())
}

/// Maps an error from [`run`] to a process exit code.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<BadgerFishError>() {
        Some(e) if e.is_configuration() => EXIT_CONFIGURATION,
        _ => 1,
    }
}

fn lookup(registry: &CodecRegistry, format: &str) -> anyhow::Result<Arc<dyn Codec>> {
    registry.lookup(format).ok_or_else(|| {
        BadgerFishError::Configuration {
            message: format!("unsupported format '{}'", format),
        }
        .into()
    })
}

fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .map_err(|e| anyhow::Error::new(e).context(format!("reading {}", path.display()))),
        None => {
            let mut input = Vec::new();
            std::io::stdin().lock().read_to_end(&mut input)?;
            Ok(input)
        }
    }
}

fn write_output(path: Option<&Path>, output: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, output).map_err(|e| {
            anyhow::Error::new(e).context(format!("writing {}", path.display()))
        })?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

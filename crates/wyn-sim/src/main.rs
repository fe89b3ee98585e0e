//! # Wyn Sim
//!
//! Headless replay driver for the Wyn gameplay core.
//!
//! Runs the player controller against a simulated body and a fixed-step
//! clock, feeding it a scripted input timeline, and prints one JSON line per
//! frame to stdout. Logs go to stderr.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod args;
mod run;
mod script;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{SimArgs, USAGE};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("wyn=info".parse()?))
        .init();

    let args = SimArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    info!("Wyn sim {}", env!("CARGO_PKG_VERSION"));

    let setup = run::SimSetup::from_args(&args)?;
    let outcome = run::simulate(&setup);
    run::write_records(io::stdout().lock(), &outcome.records)?;
    info!("Replay finished with {} gameplay events", outcome.events.len());

    Ok(())
}

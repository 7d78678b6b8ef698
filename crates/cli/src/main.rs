// BringWire - RISC-V SoC Bring-up Diagnostics
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use bringwire_config::BoardProfile;
use bringwire_core::harness;
use bringwire_core::irq::{SimCsr, VectorTable};
use bringwire_core::peripherals::uart::SimUart;
use bringwire_core::prng::Lfsr32;
use bringwire_core::uart::{TxHandshake, Uart};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

/// Return address reported to the echo trap; the simulated main line has no
/// real program counter.
const ECHO_RETURN_ADDR: u32 = 0x100;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "BringWire SoC bring-up diagnostics",
    long_about = None
)]
struct Cli {
    /// Path to a board profile (YAML); defaults to the deployed
    /// 50 MHz / 115200 board.
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    /// Override the transmit handshake from the profile.
    #[arg(long, global = true)]
    handshake: Option<TxHandshake>,

    /// Bound every status spin, failing instead of hanging on a wedged
    /// peripheral model.
    #[arg(long, global = true)]
    spin_limit: Option<u32>,

    /// Write a JSON result summary.
    #[arg(long, global = true)]
    json: Option<PathBuf>,

    /// Enable debug-level execution tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the integer-divider diagnostic against the simulated UART.
    Divider {
        #[arg(long, default_value = "16")]
        iterations: u32,
    },
    /// Run the software-float diagnostic against the simulated UART.
    Float {
        #[arg(long, default_value = "16")]
        iterations: u32,
    },
    /// Feed bytes through the receive-interrupt echo path.
    Echo {
        #[arg(long)]
        input: String,
    },
}

#[derive(Debug, Serialize)]
struct RunResult {
    schema_version: String,
    command: String,
    iterations: u32,
    handshake: TxHandshake,
    bytes_sent: usize,
    output: String,
    uart: serde_json::Value,
}

fn load_profile(cli: &Cli) -> anyhow::Result<BoardProfile> {
    let mut profile = match &cli.profile {
        Some(path) => BoardProfile::from_file(path)?,
        None => BoardProfile::default_board(),
    };
    if let Some(handshake) = cli.handshake {
        profile.uart.handshake = match handshake {
            TxHandshake::BusyPulse => "busy-pulse".to_string(),
            TxHandshake::DoneClear => "done-clear".to_string(),
        };
    }
    Ok(profile)
}

fn build_uart(cli: &Cli, profile: &BoardProfile, csr: &mut SimCsr) -> anyhow::Result<Uart<SimUart>> {
    let uart = harness::configure(SimUart::new(), csr, profile)?;
    Ok(match cli.spin_limit {
        Some(limit) => uart.with_spin_limit(limit),
        None => uart,
    })
}

fn run(cli: &Cli) -> anyhow::Result<RunResult> {
    let profile = load_profile(cli)?;
    info!(
        "board '{}', divisor {}, handshake {}",
        profile.name,
        profile.divisor(),
        profile.uart.handshake
    );

    let mut csr = SimCsr::new();
    let mut uart = build_uart(cli, &profile, &mut csr)?;
    let mut lfsr = Lfsr32::new(profile.seed);

    let (command, iterations) = match &cli.command {
        Commands::Divider { iterations } => {
            harness::divider_report(&mut uart, &mut lfsr, *iterations)
                .context("divider diagnostic failed")?;
            ("divider", *iterations)
        }
        Commands::Float { iterations } => {
            harness::float_report(&mut uart, &mut lfsr, *iterations)
                .context("float diagnostic failed")?;
            ("float", *iterations)
        }
        Commands::Echo { input } => {
            let table = VectorTable::with_defaults();
            harness::echo_input(&mut uart, &mut csr, &table, input.as_bytes(), ECHO_RETURN_ADDR)
                .context("echo session failed")?;
            ("echo", 0)
        }
    };

    let handshake = uart.handshake();
    let bus = uart.bus();
    Ok(RunResult {
        schema_version: RESULT_SCHEMA_VERSION.to_string(),
        command: command.to_string(),
        iterations,
        handshake,
        bytes_sent: bus.tx_bytes().len(),
        output: bus.tx_as_string(),
        uart: bus.snapshot(),
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let result = match run(&cli) {
        Ok(result) => result,
        Err(err) => {
            error!("{:#}", err);
            // Profile problems exit differently from runtime failures so CI
            // can tell a bad config from a broken diagnostic.
            let code = if err.is::<bringwire_core::DiagError>() {
                EXIT_RUNTIME_ERROR
            } else {
                EXIT_CONFIG_ERROR
            };
            return ExitCode::from(code);
        }
    };

    print!("{}", result.output);

    if let Some(path) = &cli.json {
        let json = match serde_json::to_string_pretty(&result) {
            Ok(json) => json,
            Err(err) => {
                error!("failed to serialize result: {err}");
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };
        if let Err(err) = std::fs::write(path, json) {
            error!("failed to write {:?}: {err}", path);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
        info!("result summary written to {:?}", path);
    }

    ExitCode::from(EXIT_PASS)
}

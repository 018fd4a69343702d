//! projlink - Projector control over RS-232
//!
//! One-shot commands against a projector attached to a local serial port.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use projlink_client::{available_ports, Config, Projector};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "projlink")]
#[command(about = "Control a projector over its RS-232 port")]
#[command(version)]
struct Cli {
    /// Serial port (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long, env = "PROJLINK_PORT")]
    port: Option<String>,

    /// Path to YAML config file
    #[arg(short, long, env = "PROJLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Baud rate override
    #[arg(long)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query power state
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Power the projector on
    On,

    /// Power the projector off
    Off,

    /// Query accumulated lamp hours
    LampHours {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Read a raw field (numbers accept 0x prefix)
    Read {
        #[arg(value_parser = commands::parse_byte)]
        module: u8,
        #[arg(value_parser = commands::parse_byte)]
        field: u8,
        /// Reply byte count requested from the device
        #[arg(value_parser = commands::parse_byte, default_value = "0")]
        reply_len: u8,
    },

    /// Write a raw field (numbers accept 0x prefix)
    Write {
        #[arg(value_parser = commands::parse_byte)]
        module: u8,
        #[arg(value_parser = commands::parse_byte)]
        field: u8,
        #[arg(value_parser = commands::parse_byte)]
        value: u8,
    },

    /// List serial ports on this machine
    Ports,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle ports command locally (no device connection needed)
    if let Commands::Ports = cli.command {
        let ports = available_ports()?;
        if ports.is_empty() {
            println!("{}", "No serial ports found".dimmed());
        }
        for port in ports {
            println!("{}  {}", port.name.cyan(), port.description.dimmed());
        }
        return Ok(());
    }

    // Defaults, then file, then environment, then flags
    let mut config = match cli.config {
        Some(ref path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        None => Config::load()?,
    };
    if let Some(ref port) = cli.port {
        config.port = Some(port.clone());
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    config.validate()?;

    let Some(port) = config.port.clone() else {
        eprintln!(
            "{}: no serial port given (use --port or PROJLINK_PORT)",
            "Error".red()
        );
        std::process::exit(2);
    };

    let mut projector = Projector::open_serial(&port, &config.serial).map_err(|e| {
        eprintln!("{}: {}", "Connection failed".red(), e);
        e
    })?;

    let result = commands::execute(&mut projector, cli.command);
    projector.close();

    match result {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}

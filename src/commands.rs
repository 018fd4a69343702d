//! Command execution.

use crate::Commands;
use colored::Colorize;
use projlink_client::{Connector, Projector};
use serde_json::{json, Value};

/// Executes a command and returns the formatted output.
pub fn execute<C: Connector>(
    projector: &mut Projector<C>,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Ports => unreachable!(),

        Commands::Status { json } => {
            let on = projector.power_state()?;
            if json {
                return Ok(format_json(&json!({ "power": on })));
            }
            let state = if on {
                "ON".green().to_string()
            } else {
                "OFF".dimmed().to_string()
            };
            Ok(format!("Power: {}", state))
        }

        Commands::On => {
            projector.power_on()?;
            Ok(format!("{} power on", "Sent".green()))
        }

        Commands::Off => {
            projector.power_off()?;
            Ok(format!("{} power off", "Sent".green()))
        }

        Commands::LampHours { json } => {
            let hours = projector.lamp_hours()?;
            if json {
                return Ok(format_json(&json!({ "lamp_hours": hours })));
            }
            Ok(format!("Lamp hours: {}", hours.to_string().cyan()))
        }

        Commands::Read {
            module,
            field,
            reply_len,
        } => {
            let payload = projector.read_field(module, field, reply_len)?;
            Ok(format_hex(&payload))
        }

        Commands::Write {
            module,
            field,
            value,
        } => {
            projector.write_field(module, field, value)?;
            Ok("OK".green().to_string())
        }
    }
}

/// Parses a byte given in decimal or with a 0x prefix.
pub fn parse_byte(arg: &str) -> Result<u8, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|e| format!("invalid byte '{}': {}", arg, e))
}

/// Formats bytes as space-separated hex.
fn format_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "(empty)".dimmed().to_string();
    }
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats JSON for display.
fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

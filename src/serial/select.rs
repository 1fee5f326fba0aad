//! Port selection
//!
//! Lists what the OS exposes, auto-picks the MCP2221 bridge when it can and
//! otherwise asks the operator for an index.

use super::port::PortInfo;
use crate::console::{self, Line};
use crate::error::{Result, TerminalError};
use crate::signal::Interrupt;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Substring of the USB product string reported by the bridge chip
pub const ADAPTER_CHIP_MARKER: &str = "MCP2221";

/// Substring of the device path macOS gives CDC-ACM devices
pub const BUS_NAME_MARKER: &str = "usbmodem";

/// Microchip MCP2221 / MCP2221A
const MCP2221_VID: u16 = 0x04d8;
const MCP2221_PID: u16 = 0x00dd;

/// Result of running the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Device path to connect to
    Port(String),
    /// Enumeration came back empty
    NoPorts,
    /// Ctrl+C at the index prompt
    Interrupted,
}

fn is_adapter(port: &PortInfo) -> bool {
    port.description().contains(ADAPTER_CHIP_MARKER)
        || port.path.contains(BUS_NAME_MARKER)
        || (port.vid == Some(MCP2221_VID) && port.pid == Some(MCP2221_PID))
}

/// First port that looks like the Explorer 8 bridge, in enumeration order
pub fn auto_detect(ports: &[PortInfo]) -> Option<&PortInfo> {
    ports.iter().find(|p| is_adapter(p))
}

/// Parse the operator's index answer; empty means the first port
fn parse_index(answer: &str, count: usize) -> Result<usize> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(0);
    }

    match answer.parse::<usize>() {
        Ok(index) if index < count => Ok(index),
        _ => Err(TerminalError::Selection(answer.to_string())),
    }
}

/// Print the listing and pick a port
///
/// End-of-input at the index prompt is treated like a malformed answer.
pub fn choose_port<R: BufRead, W: Write>(
    ports: &[PortInfo],
    input: &mut R,
    output: &mut W,
    interrupt: &Interrupt,
) -> Result<Selection> {
    writeln!(output, "Available serial ports:")?;
    for (i, port) in ports.iter().enumerate() {
        writeln!(output, "  [{}] {} - {}", i, port.path, port.description())?;
    }

    if let Some(port) = auto_detect(ports) {
        writeln!(
            output,
            "\n{} Auto-detected: {}",
            "[OK]".green().bold(),
            port.path
        )?;
        log::debug!("auto-detected {}", port.path);
        return Ok(Selection::Port(port.path.clone()));
    }

    if ports.is_empty() {
        return Ok(Selection::NoPorts);
    }

    let answer = match console::prompt(
        input,
        output,
        "\nSelect port number (or press Enter for first one): ",
        interrupt,
    )? {
        Line::Text(answer) => answer,
        Line::Interrupted => return Ok(Selection::Interrupted),
        Line::Eof => return Err(TerminalError::Selection(String::new())),
    };

    let index = parse_index(&answer, ports.len())?;
    log::debug!("operator selected [{}] {}", index, ports[index].path);
    Ok(Selection::Port(ports[index].path.clone()))
}

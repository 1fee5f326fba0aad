//! Explorer 8 Terminal
//!
//! Interactive serial terminal for the Explorer 8 board (PIC16F1719) behind
//! its MCP2221 USB-UART bridge. Type a line, it is sent with a trailing
//! carriage return, and whatever the board answers within half a second is
//! printed back. Type `murat` to blink the LED, `exit` to quit.
//!
//! # Usage
//!
//! ```bash
//! # Auto-detect the board (or pick from a list) and start the session
//! explorer-term
//!
//! # Skip detection
//! explorer-term -p /dev/ttyACM0
//!
//! # Show every serial port with USB details
//! explorer-term --list
//! ```
//!
//! The line is fixed at 9600 baud, 8N1, 100 ms read timeout.

mod console;
mod error;
mod serial;
mod signal;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use serial::port::PortInfo;
use serial::{port, Connection, PortConfig, Selection, SerialConnection};
use signal::Interrupt;
use terminal::{Terminal, Timing};

/// Explorer 8 Terminal
///
/// Relays lines between the console and the Explorer 8 board
#[derive(Parser)]
#[command(name = "explorer-term")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Interactive serial terminal for the Explorer 8 board")]
struct Cli {
    /// Serial port path (skips detection, e.g. /dev/ttyACM0)
    #[arg(short, long)]
    port: Option<String>,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Milliseconds to wait for the startup banner
    #[arg(long, value_name = "MS", default_value_t = terminal::STARTUP_WINDOW.as_millis() as u64)]
    startup_window: u64,

    /// Milliseconds to wait for a reply after each line
    #[arg(long, value_name = "MS", default_value_t = terminal::RESPONSE_WINDOW.as_millis() as u64)]
    response_window: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_banner() {
    println!("{}", "=".repeat(50));
    println!("  {}", "Explorer 8 LED Control".cyan().bold());
    println!("  Type 'murat' to blink the LED");
    println!("  Type 'exit' to quit");
    println!("{}", "=".repeat(50));
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list {
        let ports = port::list_ports()?;
        port::print_ports(&ports, &mut io::stdout().lock())?;
        return Ok(ExitCode::SUCCESS);
    }

    let interrupt = Interrupt::install().context("Failed to set Ctrl+C handler")?;
    let timing = Timing {
        startup_window: Duration::from_millis(cli.startup_window),
        response_window: Duration::from_millis(cli.response_window),
    };

    print_banner();

    // With an explicit port there is nothing to enumerate
    let ports = if cli.port.is_some() {
        Vec::new()
    } else {
        port::list_ports()?
    };

    let status = session(
        cli.port,
        &ports,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        timing,
        interrupt,
        |path: &str| SerialConnection::open(PortConfig::new(path)),
    )?;

    Ok(ExitCode::from(status))
}

/// Pick a port (unless one was given) and run the terminal on it
///
/// Returns the process exit status. `open` is only called once a port has
/// been chosen.
fn session<R, W, C, F>(
    port: Option<String>,
    ports: &[PortInfo],
    input: &mut R,
    output: &mut W,
    timing: Timing,
    interrupt: Interrupt,
    open: F,
) -> Result<u8>
where
    R: BufRead,
    W: Write,
    C: Connection,
    F: FnOnce(&str) -> error::Result<C>,
{
    let port_path = match port {
        Some(p) => p,
        None => {
            let selection = serial::choose_port(ports, input, output, &interrupt)
                .context("Port selection failed")?;

            match selection {
                Selection::Port(p) => p,
                Selection::NoPorts => {
                    writeln!(output, "{} No serial port found!", "[ERROR]".red().bold())?;
                    writeln!(output, "Make sure Explorer 8 is connected via USB.")?;
                    return Ok(1);
                }
                Selection::Interrupted => {
                    writeln!(output, "\n{}", "Interrupted by user".yellow())?;
                    return Ok(0);
                }
            }
        }
    };

    let mut terminal = Terminal::new(input, output, timing, interrupt);
    let termination = terminal.run(|| open(&port_path));

    Ok(termination.code())
}

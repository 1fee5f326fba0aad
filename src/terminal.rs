//! Interactive terminal loop
//!
//! Connect, drain the startup banner, then repeat: read an operator line,
//! send it with a trailing `\r`, wait the response window and print whatever
//! the board sent back. Each cycle is independent of the previous one.

use crate::console::{self, Line};
use crate::error::{Result, TerminalError};
use crate::serial::Connection;
use crate::signal::Interrupt;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::time::Duration;

/// Time the board gets to print its banner after the port opens
pub const STARTUP_WINDOW: Duration = Duration::from_secs(1);

/// Time the board gets to answer a line
pub const RESPONSE_WINDOW: Duration = Duration::from_millis(500);

const PROMPT: &str = "> ";

/// Fixed pauses of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub startup_window: Duration,
    pub response_window: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            startup_window: STARTUP_WINDOW,
            response_window: RESPONSE_WINDOW,
        }
    }
}

/// Why the session ended
#[derive(Debug)]
pub enum Termination {
    /// Operator typed `exit`
    Exit,
    /// Operator input closed
    Eof,
    /// Ctrl+C
    Interrupt,
    /// Open failure or serial I/O failure
    Fatal(TerminalError),
}

impl Termination {
    /// Process exit status: 0 for a clean quit, 1 for anything fatal
    pub fn code(&self) -> u8 {
        match self {
            Termination::Exit | Termination::Eof | Termination::Interrupt => 0,
            Termination::Fatal(_) => 1,
        }
    }
}

/// Operator console bound to one session
pub struct Terminal<R, W> {
    input: R,
    output: W,
    timing: Timing,
    interrupt: Interrupt,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W, timing: Timing, interrupt: Interrupt) -> Self {
        Self {
            input,
            output,
            timing,
            interrupt,
        }
    }

    /// Open a connection through `open` and run the session on it
    ///
    /// The connection is dropped (closed) before this returns, whatever the
    /// outcome.
    pub fn run<C, F>(&mut self, open: F) -> Termination
    where
        C: Connection,
        F: FnOnce() -> Result<C>,
    {
        let outcome = open().and_then(|mut conn| {
            let outcome = self.session(&mut conn);
            drop(conn);
            outcome
        });

        match outcome {
            Ok(termination) => {
                log::debug!("session ended: {:?}", termination);
                termination
            }
            // Ctrl+C mid-read can surface from serialport as an EINTR error
            Err(err) if self.interrupt.is_raised() => {
                log::debug!("serial error after interrupt: {}", err);
                self.interrupted().unwrap_or(Termination::Interrupt)
            }
            Err(err) => self.fail(err),
        }
    }

    fn session<C: Connection>(&mut self, conn: &mut C) -> Result<Termination> {
        writeln!(
            self.output,
            "\n{} Connected to {}",
            "[OK]".green().bold(),
            conn.name()
        )?;
        writeln!(self.output, "{}", "-".repeat(50))?;
        self.output.flush()?;

        if self.interrupt.pause(self.timing.startup_window).is_err() {
            return self.interrupted();
        }
        let banner = conn.drain()?;
        self.echo(&banner)?;

        writeln!(self.output, "\nReady! Type a command and press Enter:\n")?;

        loop {
            let line = match console::prompt(
                &mut self.input,
                &mut self.output,
                PROMPT,
                &self.interrupt,
            )? {
                Line::Text(line) => line,
                Line::Eof => return Ok(Termination::Eof),
                Line::Interrupted => return self.interrupted(),
            };

            if line.trim().eq_ignore_ascii_case("exit") {
                writeln!(self.output, "Goodbye!")?;
                return Ok(Termination::Exit);
            }

            let mut frame = line.into_bytes();
            frame.push(b'\r');
            conn.send(&frame)?;

            if self.interrupt.pause(self.timing.response_window).is_err() {
                return self.interrupted();
            }

            let reply = conn.drain()?;
            self.echo(&reply)?;
            writeln!(self.output)?;
        }
    }

    /// Print remote bytes verbatim, replacing invalid UTF-8
    fn echo(&mut self, bytes: &[u8]) -> Result<()> {
        if !bytes.is_empty() {
            write!(self.output, "{}", String::from_utf8_lossy(bytes))?;
            self.output.flush()?;
        }
        Ok(())
    }

    fn interrupted(&mut self) -> Result<Termination> {
        writeln!(self.output, "\n{}", "Interrupted by user".yellow())?;
        Ok(Termination::Interrupt)
    }

    fn fail(&mut self, err: TerminalError) -> Termination {
        log::error!("{}", err);
        // Console may be the thing that failed; nothing more to do then.
        let _ = writeln!(
            self.output,
            "{} Serial Error: {}",
            "[ERROR]".red().bold(),
            err
        );
        let _ = self.output.flush();
        Termination::Fatal(err)
    }
}

//! Serial port configuration and connection management
//!
//! Handles port discovery and the single connection to the Explorer 8 board.

use crate::error::{Result, TerminalError};
use colored::Colorize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Baud rate of the PIC16F1719 firmware UART
pub const DEFAULT_BAUD: u32 = 9600;

/// Read timeout of the open port
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0, /dev/cu.usbmodem1101)
    pub port_path: String,
    /// Baud rate (default: 9600)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Read timeout
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::new(),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: READ_TIMEOUT,
        }
    }
}

impl PortConfig {
    /// Create a configuration for `port_path` with the fixed 9600 8N1 line
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }
}

/// The open channel the terminal loop talks through
pub trait Connection {
    /// Device the connection was opened on
    fn name(&self) -> &str;

    /// Write every byte of `data`
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Return whatever is already buffered, without waiting for more
    fn drain(&mut self) -> Result<Vec<u8>>;
}

/// Wrapper around an open serial port
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TerminalError::Open {
                path: config.port_path.clone(),
                source,
            })?;

        log::debug!(
            "opened {} at {} baud ({:?}/{:?}/{:?})",
            config.port_path,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits
        );

        Ok(Self { port, config })
    }
}

impl Connection for SerialConnection {
    fn name(&self) -> &str {
        &self.config.port_path
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.port
            .write_all(data)
            .map_err(|e| TerminalError::serial("write to", e))?;
        self.port
            .flush()
            .map_err(|e| TerminalError::serial("flush", e))?;
        log::debug!("tx {} bytes: {:02x?}", data.len(), data);
        Ok(())
    }

    fn drain(&mut self) -> Result<Vec<u8>> {
        let mut received = Vec::new();

        loop {
            let pending = self
                .port
                .bytes_to_read()
                .map_err(|e| TerminalError::serial("poll", e))? as usize;
            if pending == 0 {
                break;
            }

            let mut chunk = vec![0u8; pending];
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(TerminalError::serial("read from", e)),
            }
        }

        if !received.is_empty() {
            log::debug!("rx {} bytes: {:02x?}", received.len(), received);
        }
        Ok(received)
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        log::debug!("closing {}", self.config.port_path);
    }
}

/// Information about a detected serial port
#[derive(Debug, Clone, PartialEq)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl PortInfo {
    /// Human-readable description: USB product string, then manufacturer,
    /// then "n/a"
    pub fn description(&self) -> String {
        fn present(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.trim().is_empty())
        }

        present(&self.product)
            .or_else(|| present(&self.manufacturer))
            .unwrap_or("n/a")
            .to_string()
    }
}

/// List all available serial ports in enumeration order
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TerminalError::Enumerate)?;

    let port_infos: Vec<PortInfo> = ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    PortType::UsbSerial,
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::PciPort => {
                    (PortType::PciSerial, None, None, None, None, None)
                }
                serialport::SerialPortType::BluetoothPort => {
                    (PortType::Bluetooth, None, None, None, None, None)
                }
                serialport::SerialPortType::Unknown => {
                    (PortType::Unknown, None, None, None, None, None)
                }
            };

            PortInfo {
                path: p.port_name,
                port_type,
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect();

    log::debug!("enumerated {} serial ports", port_infos.len());
    Ok(port_infos)
}

/// Print the detailed port listing used by `--list`
pub fn print_ports<W: Write>(ports: &[PortInfo], out: &mut W) -> std::io::Result<()> {
    if ports.is_empty() {
        writeln!(out, "{}", "No serial ports found".yellow())?;
        writeln!(out, "\n{}", "Troubleshooting tips:".cyan().bold())?;
        writeln!(out, "  1. Connect the Explorer 8 board over USB")?;
        writeln!(out, "  2. Check if the device is recognized: ls -la /dev/ttyACM* /dev/cu.usbmodem*")?;
        writeln!(out, "  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER")?;
        return Ok(());
    }

    writeln!(out, "{}", "Available Serial Ports:".green().bold())?;
    writeln!(out, "{}", "=".repeat(60))?;

    for port in ports {
        writeln!(out, "\n{}: {}", "Port".cyan(), port.path.white().bold())?;
        writeln!(out, "  Type: {}", port.port_type)?;

        if let Some(ref mfg) = port.manufacturer {
            writeln!(out, "  Manufacturer: {}", mfg)?;
        }
        if let Some(ref prod) = port.product {
            writeln!(out, "  Product: {}", prod)?;
        }
        if let Some(ref sn) = port.serial_number {
            writeln!(out, "  Serial: {}", sn)?;
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            writeln!(out, "  VID:PID: {:04x}:{:04x}", vid, pid)?;
        }
    }

    writeln!(out, "\n{}", "=".repeat(60))?;
    writeln!(
        out,
        "{}",
        "Use: explorer-term -p <PORT> to connect to a specific port".yellow()
    )?;

    Ok(())
}

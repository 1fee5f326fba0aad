//! Serial port module for the Explorer 8 board
//!
//! This module provides functionality for:
//! - Listing available serial ports and picking the MCP2221 bridge
//! - Opening the single 9600 8N1 connection
//! - Writing operator lines and draining buffered replies

pub mod port;
pub mod select;

pub use port::{Connection, PortConfig, SerialConnection};
pub use select::{choose_port, Selection};

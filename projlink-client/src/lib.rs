//! # projlink-client
//!
//! Client library for projectors on an RS-232 control link.
//!
//! This crate provides:
//! - A byte channel abstraction and its serial port implementation
//! - Sessions that run checksummed request/response transactions
//! - High-level projector operations (power, lamp hours)
//! - Layered configuration (defaults, YAML file, environment)

pub mod channel;
pub mod config;
pub mod error;
pub mod projector;
pub mod serial;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channel::{Channel, Connector};
pub use config::{Config, ConfigError, Parity, SerialConfig};
pub use error::ClientError;
pub use projector::Projector;
pub use serial::{available_ports, PortInfo, SerialChannel, SerialConnector};
pub use session::Session;

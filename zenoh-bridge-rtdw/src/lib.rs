//! Zenoh bridge for the RTD-W Modbus interface.
//!
//! This bridge polls the RTD-W (a Modbus RTU slave in front of a Daikin
//! Altherma HT hydrobox) and publishes its 24 points to Zenoh. Hub commands
//! received on the command key are written back to the holding registers.
//!
//! # Key Expressions
//!
//! ```text
//! zensight/rtdw/<device>/point/<point>        point updates
//! zensight/rtdw/<device>/@/errors/<point>     read/write failures
//! zensight/rtdw/<device>/@/commands           hub commands (subscribed)
//! zensight/rtdw/<device>/@/points             point table, sent at startup
//! zensight/rtdw/@/status                      bridge status
//! ```

pub mod catalog;
pub mod codec;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod point;
pub mod poller;
pub mod sink;
pub mod status;
pub mod transport;

pub use catalog::{CatalogError, PointCatalog};
pub use engine::Engine;
pub use error::EngineError;
pub use point::PointId;
pub use sink::{PointSink, SinkError, ZenohSink};
pub use transport::{ModbusTransport, ScaledValue, Transport, TransportError};

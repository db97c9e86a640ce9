//! Errors surfaced by the poll cycle and the command dispatcher.

use crate::point::PointId;
use crate::sink::SinkError;
use crate::transport::TransportError;
use thiserror::Error;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The hub referenced a point outside the catalog.
    #[error("Unknown point '{0}'")]
    UnknownPoint(String),

    /// A command targeted a read-only (input register) point.
    #[error("Point '{0}' is read-only")]
    NotWritable(PointId),

    /// The bus failed while reading or writing a point.
    #[error("Communication failure on point '{point}': {source}")]
    CommunicationFailure {
        point: PointId,
        #[source]
        source: TransportError,
    },

    /// The encoded payload does not fit the point's register.
    #[error("Value {value} cannot be written to point '{point}'")]
    InvalidValue { point: PointId, value: i64 },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl EngineError {
    /// Whether the next tick or a retry by the hub may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::CommunicationFailure { .. } | EngineError::Sink(_))
    }
}

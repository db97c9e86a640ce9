//! Publishing point updates to the hub.

use crate::catalog::PointCatalog;
use crate::point::{FunctionCode, PointId};
use async_trait::async_trait;
use rtdw_common::{
    FailedOperation, Format, KeyExprBuilder, PointDescriptor, PointFailure, PointSample,
    PointUpdate, encode,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while handing updates to the hub.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to encode payload for '{key}': {message}")]
    Encode { key: String, message: String },

    #[error("Failed to publish to '{key}': {message}")]
    Publish { key: String, message: String },
}

/// Destination of everything the bridge reports about its points.
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Set the two-field value of a point.
    async fn publish(&self, point: PointId, update: &PointUpdate) -> Result<(), SinkError>;

    /// Flag a point whose read or write failed.
    async fn report_failure(
        &self,
        point: PointId,
        operation: FailedOperation,
        error: &str,
    ) -> Result<(), SinkError>;

    /// Describe every point so the hub can create its devices.
    async fn announce(&self, descriptors: &[PointDescriptor]) -> Result<(), SinkError>;
}

/// Sink publishing on Zenoh key expressions.
///
/// Samples carry the register address and function code as labels.
pub struct ZenohSink {
    session: Arc<zenoh::Session>,
    keys: KeyExprBuilder,
    format: Format,
    registers: HashMap<PointId, (u16, FunctionCode)>,
}

impl ZenohSink {
    pub fn new(
        session: Arc<zenoh::Session>,
        keys: KeyExprBuilder,
        format: Format,
        catalog: &PointCatalog,
    ) -> Self {
        let registers = catalog
            .iter()
            .map(|entry| (entry.id, (entry.register.address, entry.register.function)))
            .collect();

        Self {
            session,
            keys,
            format,
            registers,
        }
    }

    pub fn keys(&self) -> &KeyExprBuilder {
        &self.keys
    }

    fn sample(&self, point: PointId, update: &PointUpdate) -> PointSample {
        let sample = PointSample::new(
            self.keys.device(),
            point.as_str(),
            point.unit(),
            update.clone(),
        );

        match self.registers.get(&point) {
            Some((address, function)) => sample
                .with_label("address", address.to_string())
                .with_label("function", function.to_string()),
            None => sample,
        }
    }

    async fn put<T: Serialize>(&self, key: String, value: &T) -> Result<(), SinkError> {
        let payload = encode(value, self.format).map_err(|e| SinkError::Encode {
            key: key.clone(),
            message: e.to_string(),
        })?;

        self.session
            .put(&key, payload)
            .await
            .map_err(|e| SinkError::Publish {
                key: key.clone(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl PointSink for ZenohSink {
    async fn publish(&self, point: PointId, update: &PointUpdate) -> Result<(), SinkError> {
        let sample = self.sample(point, update);
        self.put(self.keys.point_key(point.as_str()), &sample).await?;

        tracing::trace!(point = %point, update = %update, "Published");
        Ok(())
    }

    async fn report_failure(
        &self,
        point: PointId,
        operation: FailedOperation,
        error: &str,
    ) -> Result<(), SinkError> {
        let failure = PointFailure::new(
            self.keys.device(),
            point.as_str(),
            point.unit(),
            operation,
            error,
        );
        self.put(self.keys.failure_key(point.as_str()), &failure).await
    }

    async fn announce(&self, descriptors: &[PointDescriptor]) -> Result<(), SinkError> {
        self.put(self.keys.points_key(), &descriptors).await
    }
}

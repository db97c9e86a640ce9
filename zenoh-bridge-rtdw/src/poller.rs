//! Heartbeat-driven polling of the RTD-W registers.

use crate::catalog::{PointCatalog, PointEntry};
use crate::codec::{self, Reading};
use crate::error::EngineError;
use crate::point::{PointId, RegisterWidth};
use crate::sink::PointSink;
use crate::transport::Transport;
use rtdw_common::FailedOperation;
use tracing::{debug, error, warn};

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Points read successfully.
    pub points_read: usize,
    /// Updates handed to the sink, mirrored command points included.
    pub published: usize,
    /// Point whose read aborted the scan.
    pub failed: Option<PointId>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Tick countdown deciding when a scan is due.
///
/// The countdown starts at zero so the first tick scans.
#[derive(Debug, Clone)]
pub struct PollCycle {
    ticks_per_poll: u32,
    remaining: u32,
}

impl PollCycle {
    pub fn new(ticks_per_poll: u32) -> Self {
        Self {
            ticks_per_poll: ticks_per_poll.max(1),
            remaining: 0,
        }
    }

    pub fn ticks_per_poll(&self) -> u32 {
        self.ticks_per_poll
    }

    /// Ticks left before the next scan.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance one heartbeat; returns true when a scan is due.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.ticks_per_poll;
            true
        } else {
            debug!("Next scan in {} heartbeats", self.remaining);
            false
        }
    }
}

/// Read every point in table order and publish the decoded values.
///
/// The first communication failure stops the scan: the failing point is
/// reported to the sink and returned in the report. Sink errors are logged
/// and the scan goes on. Command points mirrored from a status point are not
/// read; their value comes from the status read.
pub async fn scan<T, S>(catalog: &PointCatalog, transport: &mut T, sink: &S) -> ScanReport
where
    T: Transport + ?Sized,
    S: PointSink + ?Sized,
{
    let mut report = ScanReport::default();

    for entry in catalog.iter() {
        if codec::mirrored_from(entry.id).is_some() {
            continue;
        }

        let reading = match read(transport, entry).await {
            Ok(reading) => reading,
            Err(e) => {
                error!(point = %entry.id, address = entry.register.address, error = %e, "Scan aborted");
                if let Err(e) = sink
                    .report_failure(entry.id, FailedOperation::Read, &e.to_string())
                    .await
                {
                    warn!(point = %entry.id, error = %e, "Failed to report read failure");
                }
                report.failed = Some(entry.id);
                return report;
            }
        };
        report.points_read += 1;

        for (point, update) in codec::decode(entry.id, &entry.register, reading) {
            match sink.publish(point, &update).await {
                Ok(()) => report.published += 1,
                Err(e) => warn!(point = %point, error = %e, "Failed to publish update"),
            }
        }
    }

    debug!(
        points_read = report.points_read,
        published = report.published,
        "Scan complete"
    );
    report
}

async fn read<T>(transport: &mut T, entry: &PointEntry) -> Result<Reading, EngineError>
where
    T: Transport + ?Sized,
{
    let register = &entry.register;
    let result = match register.width {
        RegisterWidth::Long => transport
            .read_long_counter(register.address, register.function, register.signed)
            .await
            .map(Reading::Long),
        RegisterWidth::Word => transport
            .read_scaled_register(
                register.address,
                register.decimals,
                register.function,
                register.signed,
            )
            .await
            .map(Reading::Word),
    };

    result.map_err(|source| EngineError::CommunicationFailure {
        point: entry.id,
        source,
    })
}

//! The bridge engine: one owner for the catalog, the bus and the sink.

use crate::catalog::PointCatalog;
use crate::dispatcher;
use crate::error::EngineError;
use crate::poller::{self, PollCycle, ScanReport};
use crate::sink::PointSink;
use crate::transport::Transport;
use rtdw_common::{CommandRequest, PointUpdate};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Serializes heartbeats and hub commands onto a single bus owner.
pub struct Engine<T, S> {
    catalog: PointCatalog,
    transport: T,
    sink: S,
    cycle: PollCycle,
}

impl<T, S> Engine<T, S>
where
    T: Transport,
    S: PointSink,
{
    pub fn new(catalog: PointCatalog, transport: T, sink: S, ticks_per_poll: u32) -> Self {
        Self {
            catalog,
            transport,
            sink,
            cycle: PollCycle::new(ticks_per_poll),
        }
    }

    pub fn catalog(&self) -> &PointCatalog {
        &self.catalog
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn cycle(&self) -> &PollCycle {
        &self.cycle
    }

    /// Publish the point table so the hub can create its devices.
    pub async fn announce(&self) -> Result<(), EngineError> {
        let descriptors = self.catalog.descriptors();
        self.sink.announce(&descriptors).await?;
        info!("Announced {} points", descriptors.len());
        Ok(())
    }

    /// Handle one heartbeat; returns the scan report when a scan ran.
    pub async fn on_tick(&mut self) -> Option<ScanReport> {
        if !self.cycle.tick() {
            return None;
        }

        Some(poller::scan(&self.catalog, &mut self.transport, &self.sink).await)
    }

    /// Handle one hub command.
    pub async fn on_command(&mut self, request: &CommandRequest) -> Result<PointUpdate, EngineError> {
        dispatcher::dispatch(&self.catalog, &mut self.transport, &self.sink, request).await
    }

    /// Serve heartbeats and commands.
    ///
    /// Heartbeats keep driving the poll cycle after the command channel
    /// closes; the loop only ends when the task is aborted.
    pub async fn run(mut self, mut commands: mpsc::Receiver<CommandRequest>, heartbeat: Duration) {
        let mut interval = tokio::time::interval(heartbeat);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commands_open = true;

        info!(
            "Engine started (heartbeat: {:?}, scan every {} heartbeats)",
            heartbeat,
            self.cycle.ticks_per_poll()
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(report) = self.on_tick().await {
                        if !report.is_complete() {
                            warn!(point = ?report.failed, points_read = report.points_read, "Incomplete scan");
                        }
                    }
                }
                request = commands.recv(), if commands_open => {
                    let Some(request) = request else {
                        warn!("Command channel closed, polling continues without commands");
                        commands_open = false;
                        continue;
                    };

                    match self.on_command(&request).await {
                        Ok(update) => debug!(point = %request.point, update = %update, "Command applied"),
                        Err(e) if e.is_transient() => error!(
                            point = %request.point,
                            command = %request.command,
                            level = request.level,
                            error = %e,
                            "Command failed"
                        ),
                        Err(e) => warn!(
                            point = %request.point,
                            command = %request.command,
                            error = %e,
                            "Command rejected"
                        ),
                    }
                }
            }
        }
    }
}

//! Hub command handling: encode, write, echo.

use crate::catalog::PointCatalog;
use crate::codec;
use crate::error::EngineError;
use crate::sink::PointSink;
use crate::transport::{Transport, TransportError};
use rtdw_common::{CommandRequest, FailedOperation, PointUpdate};
use tracing::{debug, info, warn};

/// Apply one hub command and return the update echoed to the hub.
///
/// Input registers are rejected before any bus traffic. A failed write is
/// reported against the commanded point.
pub async fn dispatch<T, S>(
    catalog: &PointCatalog,
    transport: &mut T,
    sink: &S,
    request: &CommandRequest,
) -> Result<PointUpdate, EngineError>
where
    T: Transport + ?Sized,
    S: PointSink + ?Sized,
{
    let point = catalog.resolve(&request.point)?;
    let payload = codec::command_payload(point, request.command, request.level);
    let register = catalog.lookup(point)?;

    if !register.function.is_writable() {
        return Err(EngineError::NotWritable(point));
    }

    debug!(
        point = %point,
        command = %request.command,
        level = request.level,
        payload,
        "Dispatching command"
    );

    match transport
        .write_register(register.address, payload, register.decimals, register.signed)
        .await
    {
        Ok(()) => {}
        Err(TransportError::ValueOutOfRange { value, .. }) => {
            return Err(EngineError::InvalidValue { point, value });
        }
        Err(source) => {
            if let Err(e) = sink
                .report_failure(point, FailedOperation::Write, &source.to_string())
                .await
            {
                warn!(point = %point, error = %e, "Failed to report write failure");
            }
            return Err(EngineError::CommunicationFailure { point, source });
        }
    }

    info!(
        point = %point,
        command = %request.command,
        address = register.address,
        payload,
        "Wrote register"
    );

    let update = codec::echo(point, request.command, payload);
    sink.publish(point, &update).await?;
    Ok(update)
}

//! Hub commands received over Zenoh.

use rtdw_common::{CommandRequest, decode_auto};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use zenoh::sample::SampleKind;

/// Default depth of the queue between the listener and the engine.
pub const COMMAND_QUEUE_DEPTH: usize = 32;

/// Decode a command payload (JSON or CBOR).
pub fn parse_command(payload: &[u8]) -> rtdw_common::Result<CommandRequest> {
    decode_auto(payload)
}

/// Forward commands published on `key_expr` to the engine.
///
/// Returns when the engine side of the channel is dropped or the subscriber
/// is closed.
pub async fn listen(
    session: Arc<zenoh::Session>,
    key_expr: String,
    commands: mpsc::Sender<CommandRequest>,
) -> rtdw_common::Result<()> {
    let subscriber = session.declare_subscriber(&key_expr).await?;
    info!(key_expr = %key_expr, "Listening for commands");

    loop {
        let sample = match subscriber.recv_async().await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Command subscriber closed: {}", e);
                break;
            }
        };

        if sample.kind() == SampleKind::Delete {
            trace!(key = %sample.key_expr(), "Ignoring delete sample");
            continue;
        }

        let payload = sample.payload().to_bytes();
        let request = match parse_command(&payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    key = %sample.key_expr(),
                    payload_len = payload.len(),
                    error = %e,
                    "Failed to decode command"
                );
                continue;
            }
        };

        debug!(point = %request.point, command = %request.command, level = request.level, "Received command");
        if commands.send(request).await.is_err() {
            debug!("Engine stopped, closing command listener");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtdw_common::{CommandName, Format, PointRef, encode};

    #[test]
    fn test_parse_json_command() {
        let request =
            parse_command(br#"{"point": 14, "command": "Set Level", "level": 80, "hue": null}"#)
                .unwrap();

        assert_eq!(request.point, PointRef::Unit(14));
        assert_eq!(request.command, CommandName::SetLevel);
        assert_eq!(request.level, 80.0);
    }

    #[test]
    fn test_parse_cbor_command() {
        let payload = encode(&CommandRequest::on("quiet_mode"), Format::Cbor).unwrap();
        let request = parse_command(&payload).unwrap();

        assert_eq!(request.point, PointRef::from("quiet_mode"));
        assert_eq!(request.command, CommandName::On);
    }

    #[test]
    fn test_parse_cbor_integer_level() {
        let command = serde_json::json!({"point": 6, "command": "Set Level", "level": 21});
        let payload = encode(&command, Format::Cbor).unwrap();
        let request = parse_command(&payload).unwrap();

        assert_eq!(request.point, PointRef::Unit(6));
        assert_eq!(request.command, CommandName::SetLevel);
        assert_eq!(request.level, 21.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command(b"{\"point\": 1}").is_err());
        assert!(parse_command(b"").is_err());
    }
}

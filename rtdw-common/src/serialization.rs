use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Payload encoding used on Zenoh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON (default; what most hubs speak).
    #[default]
    Json,

    /// CBOR (compact binary).
    Cbor,
}

/// Encode a value to bytes using the specified format.
pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => serde_json::to_vec(value).map_err(Error::from),
        Format::Cbor => {
            let mut buf = Vec::new();
            ciborium::into_writer(value, &mut buf)?;
            Ok(buf)
        }
    }
}

/// Decode bytes to a value using the specified format.
pub fn decode<T: DeserializeOwned>(data: &[u8], format: Format) -> Result<T> {
    match format {
        Format::Json => serde_json::from_slice(data).map_err(Error::from),
        Format::Cbor => ciborium::from_reader(data).map_err(|e| Error::Cbor(e.to_string())),
    }
}

/// Guess the format of a payload.
///
/// Returns `Json` if the data starts with `{` or `[` (after leading
/// whitespace), otherwise `Cbor`.
pub fn detect_format(data: &[u8]) -> Format {
    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => Format::Json,
        _ => Format::Cbor,
    }
}

/// Decode bytes, auto-detecting the format.
pub fn decode_auto<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    decode(data, detect_format(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{CommandName, CommandRequest, PointRef, PointSample, PointUpdate};

    #[test]
    fn test_cbor_sample() {
        let sample = PointSample::new("altherma", "pump_running_hours", 24, PointUpdate::new(0, "12345;0"));

        let encoded = encode(&sample, Format::Cbor).unwrap();
        let decoded: PointSample = decode(&encoded, Format::Cbor).unwrap();

        assert_eq!(decoded.point, "pump_running_hours");
        assert_eq!(decoded.update, sample.update);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format(b"{\"point\": 6}"), Format::Json);
        assert_eq!(detect_format(b"  \n{\"point\": 6}"), Format::Json);
        assert_eq!(detect_format(b"[1, 2, 3]"), Format::Json);
        assert_eq!(detect_format(b"\xa1\x65point\x06"), Format::Cbor);
    }

    #[test]
    fn test_auto_decode_command() {
        let cmd = CommandRequest::set_level("leaving_water_shift", 70.0);

        let json = encode(&cmd, Format::Json).unwrap();
        let decoded: CommandRequest = decode_auto(&json).unwrap();
        assert_eq!(decoded, cmd);

        let cbor = encode(&cmd, Format::Cbor).unwrap();
        let decoded: CommandRequest = decode_auto(&cbor).unwrap();
        assert_eq!(decoded.point, PointRef::Name("leaving_water_shift".to_string()));
        assert_eq!(decoded.command, CommandName::SetLevel);
    }

    #[test]
    fn test_decode_garbage() {
        let result: Result<CommandRequest> = decode_auto(b"{not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}

//! Value transforms shared by the poll cycle and the command dispatcher.
//!
//! Hub levels arrive in tenths (selector slot 6 is level 60); the conversion
//! to and from register values stays in this module.

use crate::point::{PointId, RegisterSpec, StoredAs};
use crate::transport::ScaledValue;
use rtdw_common::{CommandName, PointUpdate};
use std::ops::RangeInclusive;

const ROOM_SETPOINT_RANGE: RangeInclusive<i64> = 16..=32;
const LEAVING_WATER_SETPOINT_RANGE: RangeInclusive<i64> = 25..=80;
const SHIFT_RANGE: RangeInclusive<i64> = -5..=5;
const CONTROL_SOURCE_RANGE: RangeInclusive<i64> = 0..=3;

/// Selector slot of a zero shift.
const SHIFT_CENTER: i64 = 6;

/// Control source value presented as the inactive selector state ("Local").
const CONTROL_SOURCE_LOCAL: i64 = 2;

/// A raw value read for one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Word(ScaledValue),
    Long(i64),
}

/// Allowed write range of a setpoint point.
pub fn setpoint_range(point: PointId) -> Option<RangeInclusive<i64>> {
    match point {
        PointId::RoomTempSetpoint => Some(ROOM_SETPOINT_RANGE),
        PointId::LeavingWaterSetpoint => Some(LEAVING_WATER_SETPOINT_RANGE),
        _ => None,
    }
}

/// Clamp a value into the point's allowed range; identity for other points.
pub fn clamp(point: PointId, value: i64) -> i64 {
    match setpoint_range(point) {
        Some(range) => value.clamp(*range.start(), *range.end()),
        None => value,
    }
}

/// Hub level (tenths) to a leaving-water shift in °C.
pub fn encode_selector_shift(level: f64) -> i64 {
    let shift = (level / 10.0 - SHIFT_CENTER as f64).trunc() as i64;
    shift.clamp(*SHIFT_RANGE.start(), *SHIFT_RANGE.end())
}

/// Leaving-water shift to its selector presentation.
pub fn decode_selector_shift(value: i64) -> PointUpdate {
    PointUpdate::new(
        i64::from(value != 0),
        ((value + SHIFT_CENTER) * 10).to_string(),
    )
}

/// Hub level (tenths) to a control source value; out-of-range levels select 0.
pub fn encode_control_source(level: f64) -> i64 {
    let source = (level / 10.0).trunc() as i64;
    if CONTROL_SOURCE_RANGE.contains(&source) {
        source
    } else {
        0
    }
}

/// Control source value to its selector presentation.
pub fn decode_control_source(value: i64) -> PointUpdate {
    PointUpdate::new(
        i64::from(value != CONTROL_SOURCE_LOCAL),
        (value * 10).to_string(),
    )
}

/// Command point a status point's reading is mirrored onto.
pub fn paired_command(status: PointId) -> Option<PointId> {
    match status {
        PointId::SpaceHeatingStatus => Some(PointId::SpaceHeatingCommand),
        PointId::DhwReheatStatus => Some(PointId::DhwReheatCommand),
        _ => None,
    }
}

/// Status point feeding a mirrored command point.
pub fn mirrored_from(command: PointId) -> Option<PointId> {
    match command {
        PointId::SpaceHeatingCommand => Some(PointId::SpaceHeatingStatus),
        PointId::DhwReheatCommand => Some(PointId::DhwReheatStatus),
        _ => None,
    }
}

/// Cumulative counter display: current value and a zero delta.
pub fn format_counter(value: i64) -> String {
    format!("{};0", value)
}

/// Plain value presentation.
pub fn measurement(value: ScaledValue) -> PointUpdate {
    PointUpdate::new(0, value.to_string())
}

/// On/off contact presentation: integer state and the value as a percentage.
pub fn contact(value: ScaledValue) -> PointUpdate {
    PointUpdate::new(value.trunc(), value.times(100).to_string())
}

/// Decode a reading into the updates to publish, starting with the point's own.
pub fn decode(point: PointId, register: &RegisterSpec, reading: Reading) -> Vec<(PointId, PointUpdate)> {
    let value = match reading {
        Reading::Long(value) => {
            return vec![(point, PointUpdate::new(0, format_counter(value)))];
        }
        Reading::Word(value) => value,
    };

    match point {
        PointId::LeavingWaterShift => vec![(point, decode_selector_shift(value.trunc()))],
        PointId::ControlSource => vec![(point, decode_control_source(value.trunc()))],
        _ if register.stored_as == StoredAs::Flag => {
            let update = contact(value);
            match paired_command(point) {
                Some(command) => vec![(point, update.clone()), (command, update)],
                None => vec![(point, update)],
            }
        }
        _ => vec![(point, measurement(value))],
    }
}

/// Register payload for a hub command.
///
/// `On`/`Off` write 1/0, other commands the truncated level. The shift and
/// control-source selectors always derive their payload from the level.
pub fn command_payload(point: PointId, command: CommandName, level: f64) -> i64 {
    match point {
        PointId::LeavingWaterShift => encode_selector_shift(level),
        PointId::ControlSource => encode_control_source(level),
        _ => {
            let payload = match command {
                CommandName::On => 1,
                CommandName::Off => 0,
                CommandName::SetLevel => level.trunc() as i64,
            };
            clamp(point, payload)
        }
    }
}

/// Update published after a successful write.
pub fn echo(point: PointId, command: CommandName, payload: i64) -> PointUpdate {
    match command {
        CommandName::On => PointUpdate::on(),
        CommandName::Off => PointUpdate::off(),
        CommandName::SetLevel => match point {
            PointId::LeavingWaterShift => decode_selector_shift(payload),
            PointId::ControlSource => decode_control_source(payload),
            _ => PointUpdate::new(0, payload.to_string()),
        },
    }
}

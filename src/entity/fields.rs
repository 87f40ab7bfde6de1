use crate::{coordinator::DeviceFamily, entity::Direction};

/// Part of a time window stored in the snapshot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Start,
    Stop,
    Enabled,
}

/// Snapshot key of a window field.
///
/// TLX charge and discharge share the same numbered time segment fields.
pub fn field_name(
    family: DeviceFamily,
    direction: Direction,
    kind: FieldKind,
    segment: u8,
) -> String {
    match (family, direction, kind) {
        (DeviceFamily::Tlx, _, FieldKind::Start) => format!("timeSegmentStart{segment}"),
        (DeviceFamily::Tlx, _, FieldKind::Stop) => format!("timeSegmentStop{segment}"),
        (DeviceFamily::Tlx, _, FieldKind::Enabled) => format!("timeSegmentEnabled{segment}"),
        (DeviceFamily::Mix, Direction::Charge, FieldKind::Start) => {
            format!("forcedChargeTimeStart{segment}")
        }
        (DeviceFamily::Mix, Direction::Charge, FieldKind::Stop) => {
            format!("forcedChargeTimeStop{segment}")
        }
        (DeviceFamily::Mix, Direction::Charge, FieldKind::Enabled) => {
            format!("forcedChargeStopSwitch{segment}")
        }
        (DeviceFamily::Mix, Direction::Discharge, FieldKind::Start) => {
            format!("forcedDischargeTimeStart{segment}")
        }
        (DeviceFamily::Mix, Direction::Discharge, FieldKind::Stop) => {
            format!("forcedDischargeTimeStop{segment}")
        }
        (DeviceFamily::Mix, Direction::Discharge, FieldKind::Enabled) => {
            format!("forcedDischargeStopSwitch{segment}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlx_fields_ok() {
        assert_eq!(
            field_name(DeviceFamily::Tlx, Direction::Charge, FieldKind::Start, 1),
            "timeSegmentStart1",
        );
        assert_eq!(
            field_name(DeviceFamily::Tlx, Direction::Discharge, FieldKind::Stop, 1),
            "timeSegmentStop1",
        );
        assert_eq!(
            field_name(DeviceFamily::Tlx, Direction::Discharge, FieldKind::Enabled, 2),
            "timeSegmentEnabled2",
        );
    }

    #[test]
    fn mix_fields_ok() {
        assert_eq!(
            field_name(DeviceFamily::Mix, Direction::Charge, FieldKind::Stop, 1),
            "forcedChargeTimeStop1",
        );
        assert_eq!(
            field_name(DeviceFamily::Mix, Direction::Discharge, FieldKind::Start, 1),
            "forcedDischargeTimeStart1",
        );
        assert_eq!(
            field_name(DeviceFamily::Mix, Direction::Discharge, FieldKind::Enabled, 3),
            "forcedDischargeStopSwitch3",
        );
    }
}

use std::sync::Arc;

use chrono::NaiveTime;

use crate::{
    api::growatt::value::as_time,
    coordinator::Coordinator,
    entity::{Direction, FIRST_SEGMENT, FieldKind, field_name},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeBoundary {
    Start,
    End,
}

impl TimeBoundary {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Start or end of the first charge or discharge window.
pub struct TimeEntity {
    coordinator: Arc<Coordinator>,
    direction: Direction,
    boundary: TimeBoundary,
}

impl TimeEntity {
    pub const fn new(
        coordinator: Arc<Coordinator>,
        direction: Direction,
        boundary: TimeBoundary,
    ) -> Self {
        Self { coordinator, direction, boundary }
    }

    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}_{}_time_{FIRST_SEGMENT}",
            self.coordinator.device_id(),
            self.direction,
            self.boundary.as_str(),
        )
    }

    fn field(&self) -> String {
        let kind = match self.boundary {
            TimeBoundary::Start => FieldKind::Start,
            TimeBoundary::End => FieldKind::Stop,
        };
        field_name(self.coordinator.family(), self.direction, kind, FIRST_SEGMENT)
    }

    fn default_value(&self) -> NaiveTime {
        match (self.direction, self.boundary) {
            (Direction::Charge, TimeBoundary::Start) => hour(14),
            (Direction::Charge, TimeBoundary::End) => hour(16),
            (Direction::Discharge, _) => NaiveTime::MIN,
        }
    }

    /// Parsed `H:M` value, or the default when absent or malformed.
    pub fn value(&self) -> NaiveTime {
        self.coordinator
            .value(&self.field())
            .as_ref()
            .and_then(as_time)
            .unwrap_or_else(|| self.default_value())
    }

    pub fn set_value(&self, value: NaiveTime) {
        self.coordinator.set_value(&self.field(), value.format("%H:%M").to_string());
    }
}

fn hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::coordinator::{ApiVersion, DeviceFamily, tests::FakeClient};

    fn coordinator(family: DeviceFamily) -> Arc<Coordinator> {
        Arc::new(Coordinator::new(
            "SN1".into(),
            family,
            ApiVersion::V1,
            Arc::new(FakeClient::default()),
        ))
    }

    #[test]
    fn defaults_ok() {
        let coordinator = coordinator(DeviceFamily::Mix);
        let charge_start =
            TimeEntity::new(Arc::clone(&coordinator), Direction::Charge, TimeBoundary::Start);
        let charge_end =
            TimeEntity::new(Arc::clone(&coordinator), Direction::Charge, TimeBoundary::End);
        let discharge_end = TimeEntity::new(coordinator, Direction::Discharge, TimeBoundary::End);
        assert_eq!(charge_start.value(), hour(14));
        assert_eq!(charge_end.value(), hour(16));
        assert_eq!(discharge_end.value(), NaiveTime::MIN);
        assert_eq!(discharge_end.unique_id(), "SN1_discharge_end_time_1");
    }

    #[test]
    fn malformed_falls_back_ok() {
        let coordinator = coordinator(DeviceFamily::Mix);
        coordinator.set_value("forcedChargeTimeStart1", "later");
        let entity = TimeEntity::new(coordinator, Direction::Charge, TimeBoundary::Start);
        assert_eq!(entity.value(), hour(14));
    }

    #[test]
    fn set_value_ok() {
        let coordinator = coordinator(DeviceFamily::Tlx);
        let entity =
            TimeEntity::new(Arc::clone(&coordinator), Direction::Discharge, TimeBoundary::Start);
        entity.set_value(NaiveTime::from_hms_opt(1, 5, 0).unwrap());
        assert_eq!(coordinator.value("timeSegmentStart1"), Some(json!("01:05")));
        coordinator.set_value("timeSegmentStart1", "7:3");
        assert_eq!(entity.value(), NaiveTime::from_hms_opt(7, 3, 0).unwrap());
    }
}

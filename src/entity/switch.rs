use std::sync::Arc;

use crate::{
    api::growatt::value::as_integer,
    coordinator::Coordinator,
    entity::{Direction, FieldKind, field_name},
};

/// Enabled flag of a charge or discharge window.
pub struct SwitchEntity {
    coordinator: Arc<Coordinator>,
    direction: Direction,
    segment: u8,
}

impl SwitchEntity {
    pub const fn new(coordinator: Arc<Coordinator>, direction: Direction, segment: u8) -> Self {
        Self { coordinator, direction, segment }
    }

    pub fn unique_id(&self) -> String {
        let device_id = self.coordinator.device_id();
        format!("{device_id}_{}_period_{}_enabled", self.direction, self.segment)
    }

    fn field(&self) -> String {
        field_name(self.coordinator.family(), self.direction, FieldKind::Enabled, self.segment)
    }

    pub fn is_on(&self) -> Option<bool> {
        self.coordinator.value(&self.field()).as_ref().and_then(as_integer).map(|flag| flag == 1)
    }

    pub fn set(&self, is_on: bool) {
        self.coordinator.set_value(&self.field(), u8::from(is_on));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::coordinator::{ApiVersion, DeviceFamily, tests::FakeClient};

    #[test]
    fn switch_ok() {
        let coordinator = Arc::new(Coordinator::new(
            "SN1".into(),
            DeviceFamily::Mix,
            ApiVersion::V1,
            Arc::new(FakeClient::default()),
        ));
        let entity = SwitchEntity::new(Arc::clone(&coordinator), Direction::Discharge, 1);
        assert_eq!(entity.unique_id(), "SN1_discharge_period_1_enabled");
        assert_eq!(entity.is_on(), None);
        coordinator.set_value("forcedDischargeStopSwitch1", "1");
        assert_eq!(entity.is_on(), Some(true));
        entity.set(false);
        assert_eq!(coordinator.value("forcedDischargeStopSwitch1"), Some(json!(0)));
        assert_eq!(entity.is_on(), Some(false));
    }
}

//! Controllable projections of the coordinator snapshot.

mod button;
mod fields;
mod number;
mod registry;
mod switch;
mod time;

use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

pub use self::{
    button::ApplyButton,
    fields::{FieldKind, field_name},
    number::{MIX_NUMBERS, NumberEntity, TLX_NUMBERS},
    registry::{EntityRegistry, RegistryEntry},
    switch::SwitchEntity,
    time::{TimeBoundary, TimeEntity},
};
use crate::coordinator::{ApiVersion, Coordinator, DeviceFamily};

/// Integration domain that owns every registered entity.
pub const DOMAIN: &str = "growatt_server";

/// Only the first window of each direction is exposed.
pub const FIRST_SEGMENT: u8 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum Direction {
    Charge,
    Discharge,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Charge => "charge",
            Self::Discharge => "discharge",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity platform, the first part of an entity id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Platform {
    Number,
    Time,
    Switch,
    Button,
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Time => write!(f, "time"),
            Self::Switch => write!(f, "switch"),
            Self::Button => write!(f, "button"),
        }
    }
}

#[derive(derive_more::From)]
pub enum Entity {
    Number(NumberEntity),
    Time(TimeEntity),
    Switch(SwitchEntity),
    Button(ApplyButton),
}

impl Entity {
    pub const fn platform(&self) -> Platform {
        match self {
            Self::Number(_) => Platform::Number,
            Self::Time(_) => Platform::Time,
            Self::Switch(_) => Platform::Switch,
            Self::Button(_) => Platform::Button,
        }
    }

    pub fn unique_id(&self) -> String {
        match self {
            Self::Number(entity) => entity.unique_id(),
            Self::Time(entity) => entity.unique_id(),
            Self::Switch(entity) => entity.unique_id(),
            Self::Button(entity) => entity.unique_id(),
        }
    }

    /// Unit of measurement, numbers only.
    pub const fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Number(entity) => Some(entity.description().unit),
            _ => None,
        }
    }

    /// Host state string: `"unknown"` when there is no value.
    pub fn state(&self) -> String {
        match self {
            Self::Number(entity) => {
                entity.value().map_or_else(|| UNKNOWN_STATE.to_owned(), |value| value.to_string())
            }
            Self::Time(entity) => entity.value().format("%H:%M").to_string(),
            Self::Switch(entity) => match entity.is_on() {
                Some(true) => "on".to_owned(),
                Some(false) => "off".to_owned(),
                None => UNKNOWN_STATE.to_owned(),
            },
            Self::Button(_) => UNKNOWN_STATE.to_owned(),
        }
    }
}

pub const UNKNOWN_STATE: &str = "unknown";

/// Build the control entities of a device coordinator.
///
/// Entities only exist for the Open API V1; classic coordinators get none.
pub fn build_entities(coordinator: &Arc<Coordinator>) -> Vec<Entity> {
    if coordinator.api_version() != ApiVersion::V1 {
        return Vec::new();
    }
    let numbers = match coordinator.family() {
        DeviceFamily::Tlx => &TLX_NUMBERS,
        DeviceFamily::Mix => &MIX_NUMBERS,
    };
    let mut entities = numbers
        .iter()
        .map(|description| NumberEntity::new(Arc::clone(coordinator), description).into())
        .collect::<Vec<Entity>>();
    for direction in [Direction::Charge, Direction::Discharge] {
        for boundary in [TimeBoundary::Start, TimeBoundary::End] {
            entities.push(TimeEntity::new(Arc::clone(coordinator), direction, boundary).into());
        }
    }
    for direction in [Direction::Charge, Direction::Discharge] {
        entities.push(SwitchEntity::new(Arc::clone(coordinator), direction, FIRST_SEGMENT).into());
    }
    for direction in [Direction::Charge, Direction::Discharge] {
        entities.push(ApplyButton::new(Arc::clone(coordinator), direction).into());
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::tests::FakeClient;

    fn coordinator(family: DeviceFamily, api_version: ApiVersion) -> Arc<Coordinator> {
        Arc::new(Coordinator::new(
            "SN1".into(),
            family,
            api_version,
            Arc::new(FakeClient::default()),
        ))
    }

    #[test]
    fn v1_entities_ok() {
        let entities = build_entities(&coordinator(DeviceFamily::Tlx, ApiVersion::V1));
        let unique_ids = entities.iter().map(Entity::unique_id).collect::<Vec<_>>();
        assert_eq!(
            unique_ids,
            [
                "SN1_charge_power",
                "SN1_charge_stop_soc",
                "SN1_discharge_power",
                "SN1_discharge_stop_soc",
                "SN1_charge_start_time_1",
                "SN1_charge_end_time_1",
                "SN1_discharge_start_time_1",
                "SN1_discharge_end_time_1",
                "SN1_charge_period_1_enabled",
                "SN1_discharge_period_1_enabled",
                "SN1_apply_charge_settings",
                "SN1_apply_discharge_settings",
            ],
        );
    }

    #[test]
    fn classic_has_no_entities_ok() {
        assert!(build_entities(&coordinator(DeviceFamily::Mix, ApiVersion::Classic)).is_empty());
    }
}

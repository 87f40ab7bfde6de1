use std::sync::Arc;

use crate::{api::growatt::value::as_integer, coordinator::Coordinator, prelude::*};

/// Percentage setting: the read key differs from the write parameter.
#[derive(Debug)]
pub struct NumberDescription {
    /// Unique id suffix, also the write parameter id.
    pub key: &'static str,

    /// Snapshot field to read from.
    pub field: &'static str,

    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub unit: &'static str,
}

impl NumberDescription {
    const fn percentage(key: &'static str, field: &'static str) -> Self {
        Self { key, field, min: 0, max: 100, step: 1, unit: "%" }
    }
}

pub const TLX_NUMBERS: [NumberDescription; 4] = [
    NumberDescription::percentage("charge_power", "chargePowerCommand"),
    NumberDescription::percentage("charge_stop_soc", "wchargeSOCLowLimit"),
    NumberDescription::percentage("discharge_power", "disChargePowerCommand"),
    NumberDescription::percentage("discharge_stop_soc", "wdisChargeSOCLowLimit"),
];

pub const MIX_NUMBERS: [NumberDescription; 4] = [
    NumberDescription::percentage("charge_power", "chargePowerCommand"),
    NumberDescription::percentage("charge_stop_soc", "wchargeSOCLowLimit1"),
    NumberDescription::percentage("discharge_power", "disChargePowerCommand"),
    NumberDescription::percentage("discharge_stop_soc", "loadFirstStopSocSet"),
];

pub struct NumberEntity {
    coordinator: Arc<Coordinator>,
    description: &'static NumberDescription,
}

impl NumberEntity {
    pub const fn new(
        coordinator: Arc<Coordinator>,
        description: &'static NumberDescription,
    ) -> Self {
        Self { coordinator, description }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.coordinator.device_id(), self.description.key)
    }

    pub const fn description(&self) -> &'static NumberDescription {
        self.description
    }

    pub fn value(&self) -> Option<i64> {
        self.coordinator.value(self.description.field).as_ref().and_then(as_integer)
    }

    /// Store locally, the apply button sends it to the device.
    pub fn set_value(&self, value: i64) -> Result {
        let NumberDescription { key, min, max, step, .. } = *self.description;
        ensure!(
            (min..=max).contains(&value),
            "`{key}` must be between {min} and {max}, got {value}",
        );
        ensure!((value - min) % step == 0, "`{key}` must go in steps of {step}, got {value}");
        self.coordinator.set_value(self.description.field, value);
        Ok(())
    }
}

//! Commit of the locally edited charge and discharge settings.

use chrono::NaiveTime;
use itertools::Itertools;
use thiserror::Error;

use crate::{
    api::growatt::{
        ApiError,
        ChargeDischargeParams,
        MixAcChargeTimeParams,
        MixAcDischargeTimeParams,
        ParameterId,
        TimeSegmentParams,
        value::as_integer,
    },
    coordinator::{Coordinator, DeviceFamily},
    entity::{DOMAIN, Direction, Entity, EntityRegistry, FIRST_SEGMENT, Platform, RegistryEntry},
    executor::run_blocking,
    prelude::*,
};

#[derive(Debug, Error)]
pub enum ApplyError {
    /// Nothing has been written.
    #[error("Could not find all {direction} setting entities. Missing: {}", .missing.join(", "))]
    MissingEntities { direction: Direction, missing: Vec<String> },

    /// Earlier writes of the same press stay applied.
    #[error("Error applying {direction} settings: {source}")]
    Api {
        direction: Direction,

        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Other(#[from] Error),
}

/// Required sibling entity: registry suffix and the entity id reported when it is missing.
struct Requirement {
    platform: Platform,
    suffix: &'static str,
    reported_as: &'static str,
}

const START: Requirement =
    Requirement { platform: Platform::Time, suffix: "start_time_1", reported_as: "start_time" };
const END: Requirement =
    Requirement { platform: Platform::Time, suffix: "end_time_1", reported_as: "end_time" };
const ENABLED: Requirement = Requirement {
    platform: Platform::Switch,
    suffix: "period_1_enabled",
    reported_as: "period_1_enabled",
};
const POWER: Requirement =
    Requirement { platform: Platform::Number, suffix: "power", reported_as: "power" };
const STOP_SOC: Requirement =
    Requirement { platform: Platform::Number, suffix: "stop_soc", reported_as: "stop_soc" };

struct Lookup<'a> {
    registry: &'a EntityRegistry,
    device_id: &'a str,
    direction: Direction,
    missing: Vec<String>,
}

impl<'a> Lookup<'a> {
    fn entry(&self, requirement: &Requirement) -> Option<&'a RegistryEntry> {
        let suffix = format!("_{}_{}", self.direction, requirement.suffix);
        self.registry.find(DOMAIN, self.device_id, &suffix)
    }

    fn require<T>(
        &mut self,
        requirement: &Requirement,
        parse: impl FnOnce(&Entity) -> Option<T>,
    ) -> Option<T> {
        let value = self.entry(requirement).and_then(|entry| parse(&entry.entity));
        if value.is_none() {
            self.missing.push(format!(
                "{}.{}_{}_{}",
                requirement.platform, self.device_id, self.direction, requirement.reported_as,
            ));
        }
        value
    }

    fn into_error(self) -> ApplyError {
        let error =
            ApplyError::MissingEntities { direction: self.direction, missing: self.missing };
        error!("{error}");
        error
    }
}

/// Unknown and out-of-range numbers count as missing.
fn number(entity: &Entity) -> Option<u8> {
    match entity {
        Entity::Number(number) => number.value().and_then(|value| u8::try_from(value).ok()),
        _ => None,
    }
}

fn time(entity: &Entity) -> Option<NaiveTime> {
    match entity {
        Entity::Time(time) => Some(time.value()),
        _ => None,
    }
}

/// Any switch state is acceptable, only `on` enables the window.
fn switch(entity: &Entity) -> Option<bool> {
    match entity {
        Entity::Switch(switch) => Some(switch.is_on() == Some(true)),
        _ => None,
    }
}

/// Read the sibling entities of the device and write them to the inverter.
#[instrument(skip_all, fields(device_id = coordinator.device_id(), direction = %direction))]
pub async fn apply_settings(
    registry: &EntityRegistry,
    coordinator: &Coordinator,
    direction: Direction,
) -> Result<(), ApplyError> {
    let mut lookup =
        Lookup { registry, device_id: coordinator.device_id(), direction, missing: Vec::new() };
    match coordinator.family() {
        DeviceFamily::Tlx => {
            let power = lookup.require(&POWER, number);
            let stop_soc = lookup.require(&STOP_SOC, number);
            let (Some(power), Some(stop_soc)) = (power, stop_soc) else {
                return Err(lookup.into_error());
            };
            apply_tlx(coordinator, direction, power, stop_soc).await
        }
        DeviceFamily::Mix => {
            let start = lookup.require(&START, time);
            let end = lookup.require(&END, time);
            let is_enabled = lookup.require(&ENABLED, switch);
            let power = lookup.require(&POWER, number);
            let stop_soc = lookup.require(&STOP_SOC, number);
            let (Some(start), Some(end), Some(is_enabled), Some(power), Some(stop_soc)) =
                (start, end, is_enabled, power, stop_soc)
            else {
                return Err(lookup.into_error());
            };
            let params: TimeSegmentParams = match direction {
                Direction::Charge => MixAcChargeTimeParams::builder()
                    .charge_power(power)
                    .charge_stop_soc(stop_soc)
                    .mains_enabled(is_mains_charge_enabled(coordinator))
                    .start(start)
                    .end(end)
                    .is_enabled(is_enabled)
                    .segment_id(FIRST_SEGMENT)
                    .build()
                    .into(),
                Direction::Discharge => MixAcDischargeTimeParams::builder()
                    .discharge_power(power)
                    .discharge_stop_soc(stop_soc)
                    .start(start)
                    .end(end)
                    .is_enabled(is_enabled)
                    .segment_id(FIRST_SEGMENT)
                    .build()
                    .into(),
            };
            info!(?params, "applying MIX settings…");
            let client = coordinator.client();
            let serial_number = coordinator.device_id().to_owned();
            let device_type = coordinator.family().device_type();
            write(direction, move || {
                client.write_time_segment(&serial_number, device_type, params.command(), &params)
            })
            .await
        }
    }
}

/// TLX takes the power and the stop SoC as two independent writes.
async fn apply_tlx(
    coordinator: &Coordinator,
    direction: Direction,
    power: u8,
    stop_soc: u8,
) -> Result<(), ApplyError> {
    info!(power, stop_soc, "applying TLX settings…");
    let writes = match direction {
        Direction::Charge => [
            (
                ParameterId::ChargePower,
                ChargeDischargeParams::builder().charge_power(power).build(),
            ),
            (
                ParameterId::ChargeStopSoc,
                ChargeDischargeParams::builder().charge_stop_soc(stop_soc).build(),
            ),
        ],
        Direction::Discharge => [
            (
                ParameterId::DischargePower,
                ChargeDischargeParams::builder().discharge_power(power).build(),
            ),
            (
                ParameterId::DischargeStopSoc,
                ChargeDischargeParams::builder().discharge_stop_soc(stop_soc).build(),
            ),
        ],
    };
    let device_type = coordinator.family().device_type();
    for (parameter_id, params) in writes {
        let client = coordinator.client();
        let serial_number = coordinator.device_id().to_owned();
        write(direction, move || {
            client.write_parameter(&serial_number, device_type, parameter_id, &params)
        })
        .await?;
    }
    Ok(())
}

/// MIX charge writes carry the current mains charging flag, off when unknown.
fn is_mains_charge_enabled(coordinator: &Coordinator) -> bool {
    coordinator.value("acChargeEnable").as_ref().and_then(as_integer).unwrap_or(0) != 0
}

async fn write<F>(direction: Direction, f: F) -> Result<(), ApplyError>
where
    F: FnOnce() -> Result<(), ApiError> + Send + 'static,
{
    run_blocking(f).await?.map_err(|source| {
        let error = ApplyError::Api { direction, source };
        error!("{error}");
        error
    })
}

impl ApplyError {
    /// Entity ids listed by a [`ApplyError::MissingEntities`].
    pub fn missing(&self) -> Option<String> {
        match self {
            Self::MissingEntities { missing, .. } => Some(missing.iter().join(", ")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        api::growatt::{Client, SegmentCommand},
        coordinator::{
            ApiVersion,
            tests::{FakeClient, Write},
        },
        entity::{ApplyButton, build_entities},
    };

    async fn setup(
        family: DeviceFamily,
        client: FakeClient,
    ) -> Result<(Arc<FakeClient>, Arc<Coordinator>, EntityRegistry)> {
        let client = Arc::new(client);
        let coordinator = Arc::new(Coordinator::new(
            "SN1".into(),
            family,
            ApiVersion::V1,
            Arc::clone(&client) as Arc<dyn Client>,
        ));
        coordinator.refresh().await?;
        let mut registry = EntityRegistry::default();
        for entity in build_entities(&coordinator) {
            registry.register(entity);
        }
        Ok((client, coordinator, registry))
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn tlx_missing_entities_err() -> Result {
        let client = Arc::new(FakeClient::default());
        let coordinator = Coordinator::new(
            "SN1".into(),
            DeviceFamily::Tlx,
            ApiVersion::V1,
            Arc::clone(&client) as Arc<dyn Client>,
        );
        let registry = EntityRegistry::default();
        let error = apply_settings(&registry, &coordinator, Direction::Charge).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Could not find all charge setting entities. \
             Missing: number.SN1_charge_power, number.SN1_charge_stop_soc",
        );
        assert!(client.writes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn tlx_unknown_number_is_missing_err() -> Result {
        let settings = json!({"disChargePowerCommand": 60});
        let (client, coordinator, registry) =
            setup(DeviceFamily::Tlx, FakeClient::with_settings(&settings)).await?;
        let error =
            apply_settings(&registry, &coordinator, Direction::Discharge).await.unwrap_err();
        assert_eq!(error.missing().as_deref(), Some("number.SN1_discharge_stop_soc"));
        assert!(client.writes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn tlx_two_writes_ok() -> Result {
        let settings = json!({"chargePowerCommand": "80", "wchargeSOCLowLimit": 95.0});
        let (client, coordinator, registry) =
            setup(DeviceFamily::Tlx, FakeClient::with_settings(&settings)).await?;
        apply_settings(&registry, &coordinator, Direction::Charge).await?;
        assert_eq!(
            client.writes(),
            [
                Write::Parameter(
                    ParameterId::ChargePower,
                    ChargeDischargeParams::builder().charge_power(80).build(),
                ),
                Write::Parameter(
                    ParameterId::ChargeStopSoc,
                    ChargeDischargeParams::builder().charge_stop_soc(95).build(),
                ),
            ],
        );
        Ok(())
    }

    #[tokio::test]
    async fn tlx_second_write_failure_keeps_first_err() -> Result {
        let settings = json!({"disChargePowerCommand": 70, "wdisChargeSOCLowLimit": 15});
        let client = FakeClient { fail_write: Some(1), ..FakeClient::with_settings(&settings) };
        let (client, coordinator, registry) = setup(DeviceFamily::Tlx, client).await?;
        let error =
            apply_settings(&registry, &coordinator, Direction::Discharge).await.unwrap_err();
        assert!(matches!(error, ApplyError::Api { direction: Direction::Discharge, .. }));
        assert_eq!(
            error.to_string(),
            "Error applying discharge settings: \
             Error during writing parameter (code 10012: error_frequently_access)",
        );
        assert_eq!(
            client.writes(),
            [Write::Parameter(
                ParameterId::DischargePower,
                ChargeDischargeParams::builder().discharge_power(70).build(),
            )],
        );
        Ok(())
    }

    #[tokio::test]
    async fn mix_missing_entities_order_err() -> Result {
        let client = Arc::new(FakeClient::default());
        let coordinator = Arc::new(Coordinator::new(
            "SN1".into(),
            DeviceFamily::Mix,
            ApiVersion::V1,
            Arc::clone(&client) as Arc<dyn Client>,
        ));
        let mut registry = EntityRegistry::default();
        registry.register(ApplyButton::new(Arc::clone(&coordinator), Direction::Discharge));
        let error =
            apply_settings(&registry, &coordinator, Direction::Discharge).await.unwrap_err();
        assert_eq!(
            error.missing().as_deref(),
            Some(
                "time.SN1_discharge_start_time, time.SN1_discharge_end_time, \
                 switch.SN1_discharge_period_1_enabled, number.SN1_discharge_power, \
                 number.SN1_discharge_stop_soc"
            ),
        );
        assert!(client.writes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn mix_charge_single_write_ok() -> Result {
        let settings = json!({
            "chargePowerCommand": 100,
            "wchargeSOCLowLimit1": 90,
            "forcedChargeTimeStart1": "1:30",
            "forcedChargeTimeStop1": "05:00",
            "forcedChargeStopSwitch1": "1",
            "acChargeEnable": "1",
        });
        let (client, coordinator, registry) =
            setup(DeviceFamily::Mix, FakeClient::with_settings(&settings)).await?;
        apply_settings(&registry, &coordinator, Direction::Charge).await?;
        let expected = MixAcChargeTimeParams::builder()
            .charge_power(100)
            .charge_stop_soc(90)
            .mains_enabled(true)
            .start(time(1, 30))
            .end(time(5, 0))
            .is_enabled(true)
            .build();
        assert_eq!(
            client.writes(),
            [Write::TimeSegment(SegmentCommand::MixAcChargeTimePeriod, expected.into())],
        );
        Ok(())
    }

    #[tokio::test]
    async fn mix_discharge_defaults_ok() -> Result {
        let settings = json!({"disChargePowerCommand": 50, "loadFirstStopSocSet": 20});
        let (client, coordinator, registry) =
            setup(DeviceFamily::Mix, FakeClient::with_settings(&settings)).await?;
        apply_settings(&registry, &coordinator, Direction::Discharge).await?;
        let expected = MixAcDischargeTimeParams::builder()
            .discharge_power(50)
            .discharge_stop_soc(20)
            .start(NaiveTime::MIN)
            .end(NaiveTime::MIN)
            .is_enabled(false)
            .build();
        assert_eq!(
            client.writes(),
            [Write::TimeSegment(SegmentCommand::MixAcDischargeTimePeriod, expected.into())],
        );
        Ok(())
    }

    #[tokio::test]
    async fn press_refreshes_ok() -> Result {
        let settings = json!({"chargePowerCommand": 10, "wchargeSOCLowLimit": 100});
        let (client, coordinator, registry) =
            setup(DeviceFamily::Tlx, FakeClient::with_settings(&settings)).await?;
        assert_eq!(*client.n_reads.lock().unwrap(), 1);
        let button = ApplyButton::new(Arc::clone(&coordinator), Direction::Charge);
        button.press(&registry).await?;
        assert_eq!(client.writes().len(), 2);
        assert_eq!(*client.n_reads.lock().unwrap(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn press_survives_failed_refresh_ok() -> Result {
        let settings = json!({"disChargePowerCommand": 40, "wdisChargeSOCLowLimit": 20});
        let client =
            FakeClient { fail_reads_after_write: true, ..FakeClient::with_settings(&settings) };
        let (client, coordinator, registry) = setup(DeviceFamily::Tlx, client).await?;
        let button = ApplyButton::new(Arc::clone(&coordinator), Direction::Discharge);
        button.press(&registry).await?;
        assert_eq!(client.writes().len(), 2);
        assert_eq!(*client.n_reads.lock().unwrap(), 2);
        assert_eq!(coordinator.value("disChargePowerCommand"), Some(json!(40)));
        Ok(())
    }

    #[tokio::test]
    async fn sibling_device_with_longer_serial_is_ignored_ok() -> Result {
        let mut registry = EntityRegistry::default();
        let mut clients = Vec::new();
        let mut coordinators = Vec::new();
        for (serial_number, power, stop_soc) in [("SN12", 99, 11), ("SN1", 20, 50)] {
            let settings = json!({"chargePowerCommand": power, "wchargeSOCLowLimit": stop_soc});
            let client = Arc::new(FakeClient::with_settings(&settings));
            let coordinator = Arc::new(Coordinator::new(
                serial_number.into(),
                DeviceFamily::Tlx,
                ApiVersion::V1,
                Arc::clone(&client) as Arc<dyn Client>,
            ));
            coordinator.refresh().await?;
            for entity in build_entities(&coordinator) {
                registry.register(entity);
            }
            clients.push(client);
            coordinators.push(coordinator);
        }
        apply_settings(&registry, &coordinators[1], Direction::Charge).await?;
        assert_eq!(
            clients[1].writes(),
            [
                Write::Parameter(
                    ParameterId::ChargePower,
                    ChargeDischargeParams::builder().charge_power(20).build(),
                ),
                Write::Parameter(
                    ParameterId::ChargeStopSoc,
                    ChargeDischargeParams::builder().charge_stop_soc(50).build(),
                ),
            ],
        );
        assert!(clients[0].writes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn local_edits_are_applied_ok() -> Result {
        let (client, coordinator, registry) =
            setup(DeviceFamily::Tlx, FakeClient::with_settings(&Value::Null)).await?;
        let Some(Entity::Number(power)) =
            registry.find(DOMAIN, "SN1", "_charge_power").map(|entry| &entry.entity)
        else {
            bail!("no charge power entity");
        };
        power.set_value(25)?;
        coordinator.set_value("wchargeSOCLowLimit", 80);
        apply_settings(&registry, &coordinator, Direction::Charge).await?;
        assert_eq!(client.writes().len(), 2);
        Ok(())
    }
}

//! Plant and device discovery, and the per-device host setup.

use std::sync::Arc;

use itertools::Itertools;

use crate::{
    api::growatt::{Api, Client, Device, Plant},
    apply::ApplyError,
    coordinator::{ApiVersion, Coordinator, DeviceFamily},
    entity::{Direction, Entity, EntityRegistry, Platform, build_entities},
    prelude::*,
    throttle::ThrottleManager,
};

const PLANT_LIST: &str = "plant_list";
const DEVICE_LIST: &str = "device_list";

/// Inverter that has control entities.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupportedDevice {
    pub serial_number: String,
    pub family: DeviceFamily,
    pub model: Option<String>,
}

/// Explicitly chosen plant, or the only plant of the account.
pub fn select_plant(plants: &[Plant], plant_id: Option<i64>) -> Result<i64> {
    if let Some(plant_id) = plant_id {
        return Ok(plant_id);
    }
    match plants {
        [] => bail!("no plants found for this account"),
        [plant] => {
            info!(plant.id, plant.name = %plant.name, "auto-selected the only plant");
            Ok(plant.id)
        }
        _ => bail!(
            "the account has {} plants, choose one of: {}",
            plants.len(),
            plants.iter().map(|plant| format!("{} ({})", plant.id, plant.name)).join(", "),
        ),
    }
}

/// Keep the MIX and TLX inverters, skipping everything else.
pub fn supported_devices(devices: Vec<Device>) -> Vec<SupportedDevice> {
    devices
        .into_iter()
        .filter_map(|device| {
            let Some(device_type) = device.device_type() else {
                warn!(
                    serial_number = %device.serial_number,
                    type_code = ?device.type_code,
                    "device type is not supported by the Open API V1, skipping",
                );
                return None;
            };
            Some(SupportedDevice {
                serial_number: device.serial_number,
                family: device_type.into(),
                model: device.model,
            })
        })
        .collect()
}

/// Plant list call, throttled.
pub async fn fetch_plants(api: &Arc<Api>, throttle: &mut ThrottleManager) -> Result<Vec<Plant>> {
    let api = Arc::clone(api);
    Ok(throttle.throttled_call(PLANT_LIST, move || api.plant_list()).await??)
}

/// Select the plant and list its supported devices, both calls throttled.
#[instrument(skip_all)]
pub async fn discover(
    api: &Arc<Api>,
    throttle: &mut ThrottleManager,
    plant_id: Option<i64>,
) -> Result<(i64, Vec<SupportedDevice>)> {
    let plant_id = match plant_id {
        Some(plant_id) => plant_id,
        None => {
            ensure!(
                !throttle.should_throttle(PLANT_LIST),
                "the plant list has been fetched recently, pass the plant ID explicitly",
            );
            select_plant(&fetch_plants(api, throttle).await?, None)?
        }
    };
    let devices = {
        let api = Arc::clone(api);
        throttle.throttled_call(DEVICE_LIST, move || api.device_list(plant_id)).await??
    };
    let devices = supported_devices(devices);
    info!(plant_id, n_supported = devices.len(), "discovered");
    Ok((plant_id, devices))
}

/// Coordinators of the set up devices and their registered entities.
pub struct Integration {
    coordinators: Vec<Arc<Coordinator>>,
    registry: EntityRegistry,
}

impl Integration {
    /// Refresh every device once and register its entities.
    #[instrument(skip_all, fields(api_version = %api_version, n_devices = devices.len()))]
    pub async fn setup(
        client: Arc<dyn Client>,
        api_version: ApiVersion,
        devices: &[SupportedDevice],
    ) -> Result<Self> {
        if api_version != ApiVersion::V1 {
            warn!("control entities are only available with the Open API V1");
        }
        let mut coordinators = Vec::with_capacity(devices.len());
        let mut registry = EntityRegistry::default();
        for device in devices {
            let coordinator = Arc::new(Coordinator::new(
                device.serial_number.clone(),
                device.family,
                api_version,
                Arc::clone(&client),
            ));
            coordinator.refresh().await?;
            for entity in build_entities(&coordinator) {
                let entry = registry.register(entity);
                debug!(entity_id = %entry.entity_id, "registered");
            }
            coordinators.push(coordinator);
        }
        info!(
            n_entities = registry.entries().len(),
            n_numbers = registry.count_by_platform(Platform::Number),
            n_buttons = registry.count_by_platform(Platform::Button),
            "set up",
        );
        Ok(Self { coordinators, registry })
    }

    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn coordinator(&self, device_id: &str) -> Option<&Arc<Coordinator>> {
        self.coordinators.iter().find(|coordinator| coordinator.device_id() == device_id)
    }

    /// Press the apply button of the device.
    pub async fn press(&self, device_id: &str, direction: Direction) -> Result<(), ApplyError> {
        let button = self
            .registry
            .device_entries(device_id)
            .find_map(|entry| match &entry.entity {
                Entity::Button(button) if button.direction() == direction => Some(button),
                _ => None,
            })
            .ok_or_else(|| anyhow!("`{device_id}` has no {direction} apply button"))?;
        button.press(&self.registry).await
    }
}

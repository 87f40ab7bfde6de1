use std::sync::Arc;

use crate::{
    apply::{ApplyError, apply_settings},
    coordinator::Coordinator,
    entity::{Direction, EntityRegistry},
};

/// Commits the edited settings of one direction to the inverter.
pub struct ApplyButton {
    coordinator: Arc<Coordinator>,
    direction: Direction,
}

impl ApplyButton {
    pub const fn new(coordinator: Arc<Coordinator>, direction: Direction) -> Self {
        Self { coordinator, direction }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_apply_{}_settings", self.coordinator.device_id(), self.direction)
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Apply and refresh the coordinator, one press per device at a time.
    pub async fn press(&self, registry: &EntityRegistry) -> Result<(), ApplyError> {
        let _permit = self.coordinator.begin_action().await?;
        apply_settings(registry, &self.coordinator, self.direction).await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }
}

use crate::entity::{DOMAIN, Entity, Platform};

/// A registered entity together with its identity.
pub struct RegistryEntry {
    /// Integration that provides the entity.
    pub platform: &'static str,

    pub unique_id: String,

    /// `<platform>.<unique id>`, for example `number.SN123_charge_power`.
    pub entity_id: String,

    pub entity: Entity,
}

impl RegistryEntry {
    pub fn state(&self) -> String {
        self.entity.state()
    }
}

#[derive(Default)]
pub struct EntityRegistry {
    entries: Vec<RegistryEntry>,
}

impl EntityRegistry {
    pub fn register(&mut self, entity: impl Into<Entity>) -> &RegistryEntry {
        let entity = entity.into();
        let unique_id = entity.unique_id();
        let entity_id = format!("{}.{unique_id}", entity.platform());
        let index = self.entries.len();
        self.entries.push(RegistryEntry { platform: DOMAIN, unique_id, entity_id, entity });
        &self.entries[index]
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// First entry of the platform owned by the device whose unique id ends with the suffix.
    pub fn find(&self, platform: &str, device_id: &str, suffix: &str) -> Option<&RegistryEntry> {
        let prefix = format!("{device_id}_");
        self.entries.iter().find(|entry| {
            entry.platform == platform
                && entry.unique_id.starts_with(&prefix)
                && entry.unique_id.ends_with(suffix)
        })
    }

    pub fn find_entity_id(&self, entity_id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.entity_id == entity_id)
    }

    pub fn device_entries(&self, device_id: &str) -> impl Iterator<Item = &RegistryEntry> {
        let prefix = format!("{device_id}_");
        self.entries.iter().filter(move |entry| entry.unique_id.starts_with(&prefix))
    }

    pub fn count_by_platform(&self, platform: Platform) -> usize {
        self.entries.iter().filter(|entry| entry.entity.platform() == platform).count()
    }
}

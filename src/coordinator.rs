use std::{
    fmt::{Display, Formatter},
    sync::{Arc, PoisonError, RwLock},
};

use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{
    api::growatt::{Client, DeviceType, Fields},
    executor::run_blocking,
    prelude::*,
};

/// Inverters do not handle concurrent requests, so user actions are serialized per device.
pub const PARALLEL_UPDATES: usize = 1;

/// Hardware class that decides field naming and the write operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum DeviceFamily {
    /// MIN/TLX: numbered time segment fields, separate power and SoC writes.
    Tlx,

    /// MIX/SPH: separate charge and discharge field sets, merged window writes.
    Mix,
}

impl DeviceFamily {
    pub const fn device_type(self) -> DeviceType {
        match self {
            Self::Tlx => DeviceType::MinTlx,
            Self::Mix => DeviceType::MixSph,
        }
    }
}

impl From<DeviceType> for DeviceFamily {
    fn from(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::MinTlx => Self::Tlx,
            DeviceType::MixSph => Self::Mix,
        }
    }
}

impl Display for DeviceFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tlx => write!(f, "tlx"),
            Self::Mix => write!(f, "mix"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ApiVersion {
    /// Token-authenticated Open API.
    V1,

    /// Legacy username and password API, read-only.
    Classic,
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::Classic => write!(f, "classic"),
        }
    }
}

/// Per-device snapshot of the inverter fields, shared by all entities of the device.
pub struct Coordinator {
    device_id: String,
    family: DeviceFamily,
    api_version: ApiVersion,
    client: Arc<dyn Client>,
    data: RwLock<Fields>,
    action_gate: Semaphore,
}

impl Coordinator {
    pub fn new(
        device_id: String,
        family: DeviceFamily,
        api_version: ApiVersion,
        client: Arc<dyn Client>,
    ) -> Self {
        Self {
            device_id,
            family,
            api_version,
            client,
            data: RwLock::new(Fields::new()),
            action_gate: Semaphore::new(PARALLEL_UPDATES),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub const fn family(&self) -> DeviceFamily {
        self.family
    }

    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn client(&self) -> Arc<dyn Client> {
        Arc::clone(&self.client)
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// Local edit, lost on the next refresh unless written to the device.
    pub fn set_value(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        debug!(device_id = %self.device_id, key, %value, "updating locally");
        self.data.write().unwrap_or_else(PoisonError::into_inner).insert(key.to_owned(), value);
    }

    pub fn snapshot(&self) -> Fields {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the snapshot with the device settings merged with the last data.
    #[instrument(skip_all, fields(device_id = %self.device_id, family = %self.family))]
    pub async fn refresh(&self) -> Result {
        let client = self.client();
        let device_id = self.device_id.clone();
        let device_type = self.family.device_type();
        let fields = run_blocking(move || {
            let mut fields = client.device_settings(&device_id, device_type)?;
            fields.extend(client.device_energy(&device_id, device_type)?);
            Ok::<_, crate::api::growatt::ApiError>(fields)
        })
        .await?
        .with_context(|| format!("failed to refresh `{}`", self.device_id))?;
        info!(n_fields = fields.len(), "refreshed");
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = fields;
        Ok(())
    }

    /// Refresh, only logging a failure.
    pub async fn request_refresh(&self) {
        if let Err(error) = self.refresh().await {
            warn!(device_id = %self.device_id, "refresh failed: {error:#}");
        }
    }

    /// Wait for the device to be free for a user action.
    pub async fn begin_action(&self) -> Result<SemaphorePermit<'_>> {
        self.action_gate.acquire().await.context("the action gate is closed")
    }
}

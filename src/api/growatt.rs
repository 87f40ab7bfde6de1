mod device_type;
mod models;
mod params;
mod response;
mod segments;
pub mod value;

use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

pub use self::{
    device_type::{DeviceType, Endpoint},
    models::{Device, DeviceList, Plant, PlantList},
    params::{
        BatteryMode,
        ChargeDischargeParams,
        MixAcChargeTimeParams,
        MixAcDischargeTimeParams,
        ParamList,
        ParameterId,
        SegmentCommand,
        TimeSegmentParams,
        TlxTimeSegmentParams,
    },
    response::ApiError,
    segments::TimeSegments,
};
use self::response::Response;
use crate::prelude::*;

/// Raw field mapping as returned by the settings and last-data endpoints.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_SERVER_URL: &str = "https://openapi.growatt.com/";

/// Device-level operations that coordinators and the apply flow depend on.
///
/// All calls are blocking, callers are expected to offload them.
pub trait Client: Send + Sync {
    fn device_settings(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError>;

    fn device_energy(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError>;

    fn write_parameter(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        parameter_id: ParameterId,
        params: &ChargeDischargeParams,
    ) -> Result<(), ApiError>;

    fn write_time_segment(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        command: SegmentCommand,
        params: &TimeSegmentParams,
    ) -> Result<(), ApiError>;
}

/// Growatt Open API V1 client.
pub struct Api {
    agent: Agent,
    base_url: String,
    token: String,
}

impl Api {
    pub fn new(server_url: &str, token: String) -> Self {
        let agent =
            Agent::config_builder().timeout_global(Some(Duration::from_secs(15))).build().into();
        let base_url = format!("{}/v1/", server_url.trim_end_matches('/'));
        Self { agent, base_url, token }
    }

    #[instrument(skip_all)]
    pub fn plant_list(&self) -> Result<Vec<Plant>, ApiError> {
        info!("fetching…");
        let query = [("page", ""), ("perpage", ""), ("search_type", ""), ("search_keyword", "")];
        let plants = self.get::<PlantList>("plant/list", &query, "getting plant list")?.plants;
        info!(n_plants = plants.len(), "fetched");
        Ok(plants)
    }

    #[instrument(skip_all, fields(plant_id = plant_id))]
    pub fn device_list(&self, plant_id: i64) -> Result<Vec<Device>, ApiError> {
        info!("fetching…");
        let plant_id = plant_id.to_string();
        let devices = self
            .get::<DeviceList>("device/list", &[("plant_id", &plant_id)], "getting device list")?
            .devices;
        info!(n_devices = devices.len(), "fetched");
        Ok(devices)
    }

    #[instrument(skip_all, fields(serial_number = serial_number, device_type = %device_type))]
    pub fn device_details(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError> {
        info!("fetching…");
        self.get(
            device_type.endpoint(Endpoint::BasicInfo),
            &[("device_sn", serial_number)],
            &format!("getting {device_type} details"),
        )
    }

    /// Read a named parameter straight from the inverter.
    #[instrument(skip_all, fields(serial_number = serial_number, parameter_id = parameter_id))]
    pub fn read_parameter(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        parameter_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        if parameter_id.is_empty() {
            return Err(ApiError::Parameter("parameter id must not be empty".into()));
        }
        let form = [
            ("device_sn", serial_number),
            ("paramId", parameter_id),
            ("startAddr", "0"),
            ("endAddr", "0"),
        ];
        self.post(
            device_type.endpoint(Endpoint::ReadParameter),
            form,
            &format!("reading parameter {parameter_id}"),
        )
    }

    fn write(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        kind: &str,
        params: &ParamList,
    ) -> Result<(), ApiError> {
        let serial_field = device_type.serial_field();
        let form = [(serial_field.as_str(), serial_number), ("type", kind)]
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .chain(params.form_fields())
            .collect::<Vec<_>>();
        let _: serde_json::Value = self.post(
            device_type.endpoint(Endpoint::Write),
            form,
            &format!("writing parameter {kind}"),
        )?;
        Ok(())
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        operation: &str,
    ) -> Result<R, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .agent
            .get(&url)
            .header("token", self.token.as_str())
            .query_pairs(query.iter().copied())
            .call()
            .and_then(|mut response| response.body_mut().read_json::<Response>())
            .map_err(|source| ApiError::Transport {
                path: path.to_owned(),
                source: source.into(),
            })?;
        Self::decode(path, response, operation)
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    fn post<K, V, R>(
        &self,
        path: &str,
        form: impl IntoIterator<Item = (K, V)>,
        operation: &str,
    ) -> Result<R, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .agent
            .post(&url)
            .header("token", self.token.as_str())
            .send_form(form)
            .and_then(|mut response| response.body_mut().read_json::<Response>())
            .map_err(|source| ApiError::Transport {
                path: path.to_owned(),
                source: source.into(),
            })?;
        Self::decode(path, response, operation)
    }

    fn decode<R: DeserializeOwned>(
        path: &str,
        response: Response,
        operation: &str,
    ) -> Result<R, ApiError> {
        let data = response.into_data(operation)?;
        debug!(?data, "call succeeded");
        serde_json::from_value(data)
            .map_err(|source| ApiError::Decode { path: path.to_owned(), source })
    }
}

impl Client for Api {
    #[instrument(skip_all, fields(serial_number = serial_number, device_type = %device_type))]
    fn device_settings(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError> {
        info!("fetching…");
        self.get(
            device_type.endpoint(Endpoint::Settings),
            &[("device_sn", serial_number)],
            &format!("getting {device_type} settings"),
        )
    }

    #[instrument(skip_all, fields(serial_number = serial_number, device_type = %device_type))]
    fn device_energy(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError> {
        info!("fetching…");
        let serial_field = device_type.serial_field();
        self.post(
            device_type.endpoint(Endpoint::LastData),
            [(serial_field.as_str(), serial_number)],
            &format!("getting {device_type} energy data"),
        )
    }

    #[instrument(
        skip_all,
        fields(
            serial_number = serial_number,
            device_type = %device_type,
            parameter_id = %parameter_id,
        ),
    )]
    fn write_parameter(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        parameter_id: ParameterId,
        params: &ChargeDischargeParams,
    ) -> Result<(), ApiError> {
        info!(?params, "writing…");
        self.write(serial_number, device_type, parameter_id.as_str(), &params.params(parameter_id)?)
    }

    #[instrument(
        skip_all,
        fields(serial_number = serial_number, device_type = %device_type, command = %command),
    )]
    fn write_time_segment(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        command: SegmentCommand,
        params: &TimeSegmentParams,
    ) -> Result<(), ApiError> {
        if params.command() != command {
            return Err(ApiError::Parameter(format!(
                "`{command}` cannot be written with a `{}` record",
                params.command(),
            )));
        }
        info!(?params, "writing…");
        self.write(serial_number, device_type, &command.to_string(), &params.params()?)
    }
}

/// Reads go to the inner client, writes are only logged.
pub struct DryRun<C>(pub C);

impl<C: Client> Client for DryRun<C> {
    fn device_settings(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError> {
        self.0.device_settings(serial_number, device_type)
    }

    fn device_energy(
        &self,
        serial_number: &str,
        device_type: DeviceType,
    ) -> Result<Fields, ApiError> {
        self.0.device_energy(serial_number, device_type)
    }

    fn write_parameter(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        parameter_id: ParameterId,
        params: &ChargeDischargeParams,
    ) -> Result<(), ApiError> {
        let params = params.params(parameter_id)?;
        warn!(serial_number, %device_type, %parameter_id, ?params, "dry run, not writing");
        Ok(())
    }

    fn write_time_segment(
        &self,
        serial_number: &str,
        device_type: DeviceType,
        command: SegmentCommand,
        params: &TimeSegmentParams,
    ) -> Result<(), ApiError> {
        let params = params.params()?;
        warn!(serial_number, %device_type, %command, ?params, "dry run, not writing");
        Ok(())
    }
}

use clap::Parser;

use crate::{
    cli::growatt::{DeviceArgs, GrowattApiArgs},
    coordinator::ApiVersion,
    executor::run_blocking,
    integration::{Integration, SupportedDevice},
    prelude::*,
    tables::build_entities_table,
};

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,

    /// Only the Open API V1 provides control entities.
    #[clap(long = "api-version", env = "GROWATT_API_VERSION", default_value = "v1")]
    api_version: ApiVersion,

    /// Also print the raw field snapshot.
    #[clap(long)]
    fields: bool,
}

impl ShowArgs {
    pub async fn run(self) -> Result {
        let device = SupportedDevice {
            serial_number: self.device.serial_number,
            family: self.device.family,
            model: None,
        };
        let integration = Integration::setup(
            self.api.new_client(false),
            self.api_version,
            std::slice::from_ref(&device),
        )
        .await?;
        if self.fields
            && let Some(coordinator) = integration.coordinator(&device.serial_number)
        {
            println!("{}", serde_json::to_string_pretty(&coordinator.snapshot())?);
        }
        println!("{}", build_entities_table(integration.registry(), &device.serial_number));
        Ok(())
    }
}

#[derive(Parser)]
pub struct ReadParameterArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(long = "parameter-id")]
    parameter_id: String,
}

impl ReadParameterArgs {
    pub async fn run(self) -> Result {
        let api = self.api.new_api();
        let device_type = self.device.family.device_type();
        let value = run_blocking(move || {
            api.read_parameter(&self.device.serial_number, device_type, &self.parameter_id)
        })
        .await??;
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}

#[derive(Parser)]
pub struct DetailsArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,
}

impl DetailsArgs {
    pub async fn run(self) -> Result {
        let api = self.api.new_api();
        let device_type = self.device.family.device_type();
        let details =
            run_blocking(move || api.device_details(&self.device.serial_number, device_type))
                .await??;
        println!("{}", serde_json::to_string_pretty(&details)?);
        Ok(())
    }
}

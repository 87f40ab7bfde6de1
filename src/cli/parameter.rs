use clap::Parser;

use crate::{
    api::growatt::{ChargeDischargeParams, ParameterId},
    cli::growatt::{DeviceArgs, GrowattApiArgs},
    executor::run_blocking,
    prelude::*,
};

#[derive(Parser)]
pub struct WriteParameterArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(long)]
    parameter: ParameterId,

    /// Percentage, or `0`/`1` for `ac-charge`.
    #[clap(long)]
    value: u8,

    /// Log the write instead of sending it.
    #[clap(long)]
    dry_run: bool,
}

impl WriteParameterArgs {
    pub async fn run(self) -> Result {
        let parameter_id = self.parameter;
        let params = ChargeDischargeParams::for_parameter(parameter_id, self.value);
        let client = self.api.new_client(self.dry_run);
        let serial_number = self.device.serial_number;
        let device_type = self.device.family.device_type();
        run_blocking(move || {
            client.write_parameter(&serial_number, device_type, parameter_id, &params)
        })
        .await??;
        info!(%parameter_id, value = self.value, "written");
        Ok(())
    }
}

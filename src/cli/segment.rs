use chrono::NaiveTime;
use clap::Parser;

use crate::{
    api::growatt::{
        BatteryMode,
        Client,
        DeviceType,
        TimeSegmentParams,
        TimeSegments,
        TlxTimeSegmentParams,
    },
    cli::growatt::{DeviceArgs, GrowattApiArgs, parse_time_arg},
    executor::run_blocking,
    prelude::*,
};

#[derive(Parser)]
pub struct SegmentsArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,
}

impl SegmentsArgs {
    pub async fn run(self) -> Result {
        let api = self.api.new_api();
        let device_type = self.device.family.device_type();
        let settings =
            run_blocking(move || api.device_settings(&self.device.serial_number, device_type))
                .await??;
        println!("{}", TimeSegments::from_settings(&settings));
        Ok(())
    }
}

#[derive(Parser)]
pub struct WriteSegmentArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(long = "device-sn", env = "GROWATT_DEVICE_SN")]
    serial_number: String,

    /// Segment number, 1 to 9.
    #[clap(long)]
    segment: u8,

    #[clap(long)]
    mode: BatteryMode,

    #[clap(long, value_parser = parse_time_arg)]
    start: NaiveTime,

    #[clap(long, value_parser = parse_time_arg)]
    end: NaiveTime,

    /// Write the segment as disabled.
    #[clap(long)]
    disabled: bool,

    /// Log the write instead of sending it.
    #[clap(long)]
    dry_run: bool,
}

impl WriteSegmentArgs {
    pub async fn run(self) -> Result {
        let params: TimeSegmentParams = TlxTimeSegmentParams::builder()
            .segment_id(self.segment)
            .battery_mode(self.mode)
            .start(self.start)
            .end(self.end)
            .is_enabled(!self.disabled)
            .build()
            .into();
        let client = self.api.new_client(self.dry_run);
        let serial_number = self.serial_number;
        run_blocking(move || {
            client.write_time_segment(&serial_number, DeviceType::MinTlx, params.command(), &params)
        })
        .await??;
        info!(segment = self.segment, mode = %self.mode, "written");
        Ok(())
    }
}

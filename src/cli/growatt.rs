use std::{path::PathBuf, sync::Arc};

use chrono::{NaiveTime, TimeDelta};
use clap::Parser;

use crate::{
    api::growatt::{Api, Client, DEFAULT_SERVER_URL, DryRun, value::parse_time},
    coordinator::DeviceFamily,
    prelude::*,
    throttle::{DEFAULT_WINDOW_MINUTES, ThrottleManager},
};

#[derive(Parser)]
pub struct GrowattApiArgs {
    /// Open API V1 token.
    #[clap(long = "token", env = "GROWATT_API_TOKEN", hide_env_values = true)]
    token: String,

    #[clap(long = "server-url", env = "GROWATT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
}

impl GrowattApiArgs {
    pub fn new_api(&self) -> Api {
        Api::new(&self.server_url, self.token.clone())
    }

    /// Client for the host layer: writes are only logged in a dry run.
    pub fn new_client(&self, dry_run: bool) -> Arc<dyn Client> {
        if dry_run { Arc::new(DryRun(self.new_api())) } else { Arc::new(self.new_api()) }
    }
}

#[derive(Parser)]
pub struct DeviceArgs {
    #[clap(long = "device-sn", env = "GROWATT_DEVICE_SN")]
    pub serial_number: String,

    #[clap(long, env = "GROWATT_DEVICE_FAMILY", default_value = "tlx")]
    pub family: DeviceFamily,
}

#[derive(Parser)]
pub struct ThrottleArgs {
    /// Directory to keep the API call history in.
    #[clap(long = "state-dir", env = "GROWATT_STATE_DIR", default_value = ".growatt")]
    state_dir: PathBuf,

    /// Minimal interval between the discovery calls.
    #[clap(
        long = "throttle-minutes",
        env = "GROWATT_THROTTLE_MINUTES",
        default_value_t = DEFAULT_WINDOW_MINUTES,
    )]
    minutes: i64,
}

impl ThrottleArgs {
    pub fn open(&self) -> Result<ThrottleManager> {
        ensure!(self.minutes >= 0, "the throttle window must not be negative");
        let window = TimeDelta::try_minutes(self.minutes).context("invalid throttle window")?;
        ThrottleManager::open(&self.state_dir, window)
    }
}

pub fn parse_time_arg(text: &str) -> Result<NaiveTime, String> {
    parse_time(text).ok_or_else(|| format!("`{text}` is not a valid `HH:MM` time"))
}

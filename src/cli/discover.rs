use std::sync::Arc;

use clap::Parser;

use crate::{
    cli::growatt::{GrowattApiArgs, ThrottleArgs},
    integration::{discover, fetch_plants},
    prelude::*,
    tables::{build_devices_table, build_plants_table},
};

#[derive(Parser)]
pub struct PlantsArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    throttle: ThrottleArgs,
}

impl PlantsArgs {
    pub async fn run(self) -> Result {
        let mut throttle = self.throttle.open()?;
        let plants = fetch_plants(&Arc::new(self.api.new_api()), &mut throttle).await?;
        println!("{}", build_plants_table(&plants));
        Ok(())
    }
}

#[derive(Parser)]
pub struct DevicesArgs {
    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    throttle: ThrottleArgs,

    /// Plant to list, may be omitted when the account has a single plant.
    #[clap(long = "plant-id", env = "GROWATT_PLANT_ID")]
    plant_id: Option<i64>,
}

impl DevicesArgs {
    pub async fn run(self) -> Result {
        let mut throttle = self.throttle.open()?;
        let (plant_id, devices) =
            discover(&Arc::new(self.api.new_api()), &mut throttle, self.plant_id).await?;
        info!(plant_id, "gotcha");
        println!("{}", build_devices_table(&devices));
        Ok(())
    }
}

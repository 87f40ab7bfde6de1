use clap::Parser;

use crate::{
    api::growatt::value::parse_time,
    cli::growatt::{DeviceArgs, GrowattApiArgs},
    coordinator::ApiVersion,
    entity::{DOMAIN, Direction, Entity, EntityRegistry},
    integration::{Integration, SupportedDevice},
    prelude::*,
    tables::build_entities_table,
};

#[derive(Parser)]
pub struct ApplyArgs {
    /// Settings to commit.
    direction: Direction,

    #[clap(flatten)]
    api: GrowattApiArgs,

    #[clap(flatten)]
    device: DeviceArgs,

    /// Local edit before the commit, `<unique id suffix>=<value>` or `<entity id>=<value>`.
    ///
    /// For example: `charge_power=80`, `charge_start_time_1=01:30`
    /// or `charge_period_1_enabled=on`.
    #[clap(long = "set", value_parser = parse_assignment)]
    assignments: Vec<Assignment>,

    /// Log the writes instead of sending them.
    #[clap(long)]
    dry_run: bool,
}

impl ApplyArgs {
    pub async fn run(self) -> Result {
        let device = SupportedDevice {
            serial_number: self.device.serial_number,
            family: self.device.family,
            model: None,
        };
        let integration = Integration::setup(
            self.api.new_client(self.dry_run),
            ApiVersion::V1,
            std::slice::from_ref(&device),
        )
        .await?;
        for assignment in &self.assignments {
            assignment.apply(integration.registry(), &device.serial_number)?;
        }
        if let Err(error) = integration.press(&device.serial_number, self.direction).await {
            if let Some(missing) = error.missing() {
                warn!(%missing, "use `--set` to provide the values");
            }
            return Err(error.into());
        }
        println!("{}", build_entities_table(integration.registry(), &device.serial_number));
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Assignment {
    suffix: String,
    value: String,
}

impl Assignment {
    fn apply(&self, registry: &EntityRegistry, device_id: &str) -> Result {
        let Self { suffix, value } = self;
        let entry = registry
            .find_entity_id(suffix)
            .or_else(|| registry.find(DOMAIN, device_id, &format!("_{suffix}")))
            .with_context(|| format!("`{device_id}` has no entity ending with `{suffix}`"))?;
        match &entry.entity {
            Entity::Number(number) => {
                let value =
                    value.parse::<i64>().with_context(|| format!("`{value}` is not a number"))?;
                number.set_value(value)?;
            }
            Entity::Time(time) => {
                let value = parse_time(value).with_context(|| format!("`{value}` is not a time"))?;
                time.set_value(value);
            }
            Entity::Switch(switch) => switch.set(parse_switch(value)?),
            Entity::Button(_) => bail!("`{}` is a button and cannot be set", entry.entity_id),
        }
        info!(entity_id = %entry.entity_id, state = %entry.state(), "updated locally");
        Ok(())
    }
}

fn parse_assignment(text: &str) -> Result<Assignment, String> {
    let (suffix, value) = text
        .split_once('=')
        .ok_or_else(|| format!("`{text}` must look like `<suffix>=<value>`"))?;
    Ok(Assignment { suffix: suffix.trim().to_owned(), value: value.trim().to_owned() })
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => bail!("`{value}` is neither `on` nor `off`"),
    }
}

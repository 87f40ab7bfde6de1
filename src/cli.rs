mod apply;
mod discover;
mod growatt;
mod inspect;
mod parameter;
mod segment;

use clap::{Parser, Subcommand};

use crate::{
    cli::{
        apply::ApplyArgs,
        discover::{DevicesArgs, PlantsArgs},
        inspect::{DetailsArgs, ReadParameterArgs, ShowArgs},
        parameter::WriteParameterArgs,
        segment::{SegmentsArgs, WriteSegmentArgs},
    },
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the plants of the account.
    Plants(Box<PlantsArgs>),

    /// List the supported inverters of a plant.
    Devices(Box<DevicesArgs>),

    /// Refresh the inverter and print its control entities.
    Show(Box<ShowArgs>),

    /// Edit the charge or discharge settings and commit them to the inverter.
    Apply(Box<ApplyArgs>),

    /// Print the time-of-use segments of a TLX inverter.
    Segments(Box<SegmentsArgs>),

    /// Write a single time-of-use segment of a TLX inverter.
    WriteSegment(Box<WriteSegmentArgs>),

    /// Read a named parameter from the inverter.
    ReadParameter(Box<ReadParameterArgs>),

    /// Write a single power, stop SoC or AC charge parameter.
    WriteParameter(Box<WriteParameterArgs>),

    /// Print the inverter basic information.
    Details(Box<DetailsArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Plants(args) => args.run().await,
            Self::Devices(args) => args.run().await,
            Self::Show(args) => args.run().await,
            Self::Apply(args) => args.run().await,
            Self::Segments(args) => args.run().await,
            Self::WriteSegment(args) => args.run().await,
            Self::ReadParameter(args) => args.run().await,
            Self::WriteParameter(args) => args.run().await,
            Self::Details(args) => args.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_apply_ok() -> Result {
        let args = Args::try_parse_from([
            "growatt-control",
            "apply",
            "discharge",
            "--token",
            "secret",
            "--device-sn",
            "SPH1",
            "--family",
            "mix",
            "--set",
            "discharge_power=80",
            "--set",
            "discharge_period_1_enabled=on",
            "--dry-run",
        ])?;
        assert!(matches!(args.command, Command::Apply(_)));
        Ok(())
    }

    #[test]
    fn parse_write_parameter_and_show_ok() -> Result {
        let args = Args::try_parse_from([
            "growatt-control",
            "write-parameter",
            "--token",
            "secret",
            "--device-sn",
            "TLX1",
            "--parameter",
            "ac-charge",
            "--value",
            "1",
        ])?;
        assert!(matches!(args.command, Command::WriteParameter(_)));
        let args = Args::try_parse_from([
            "growatt-control",
            "show",
            "--token",
            "secret",
            "--device-sn",
            "TLX1",
            "--api-version",
            "classic",
        ])?;
        assert!(matches!(args.command, Command::Show(_)));
        Ok(())
    }
}

use std::fmt::{Display, Formatter};

use bon::Builder;
use chrono::{NaiveTime, Timelike};

use crate::api::growatt::ApiError;

/// Write endpoints always receive `param1`…`param19`, unused ones as empty strings.
pub const N_PARAMS: usize = 19;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParamList([String; N_PARAMS]);

impl ParamList {
    /// Set the 1-based parameter position.
    fn set(&mut self, position: usize, value: impl ToString) -> Result<&mut Self, ApiError> {
        let slot = position
            .checked_sub(1)
            .and_then(|index| self.0.get_mut(index))
            .ok_or_else(|| ApiError::Parameter(format!("no such parameter position {position}")))?;
        *slot = value.to_string();
        Ok(self)
    }

    fn set_window(
        &mut self,
        first: usize,
        start: NaiveTime,
        end: NaiveTime,
        is_enabled: bool,
    ) -> Result<&mut Self, ApiError> {
        self.set(first, start.hour())?
            .set(first + 1, start.minute())?
            .set(first + 2, end.hour())?
            .set(first + 3, end.minute())?
            .set(first + 4, flag(is_enabled))
    }

    #[cfg(test)]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position.checked_sub(1)?).map(String::as_str)
    }

    /// Form fields `param1`…`param19`.
    pub fn form_fields(&self) -> impl Iterator<Item = (String, &str)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, value)| (format!("param{}", index + 1), value.as_str()))
    }
}

const fn flag(value: bool) -> u8 {
    if value { 1 } else { 0 }
}

/// Named parameters accepted by the flat write operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ParameterId {
    ChargePower,
    ChargeStopSoc,
    DischargePower,
    DischargeStopSoc,
    AcCharge,
}

impl ParameterId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChargePower => "charge_power",
            Self::ChargeStopSoc => "charge_stop_soc",
            Self::DischargePower => "discharge_power",
            Self::DischargeStopSoc => "discharge_stop_soc",
            Self::AcCharge => "ac_charge",
        }
    }
}

impl Display for ParameterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat power and state-of-charge record.
///
/// Only the field selected by the [`ParameterId`] goes over the wire.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Builder)]
pub struct ChargeDischargeParams {
    #[builder(default)]
    pub charge_power: u8,

    #[builder(default)]
    pub charge_stop_soc: u8,

    #[builder(default)]
    pub discharge_power: u8,

    #[builder(default)]
    pub discharge_stop_soc: u8,

    #[builder(default)]
    pub ac_charge_enabled: bool,
}

impl ChargeDischargeParams {
    /// Record with only the selected field set, any non-zero value enables AC charging.
    pub fn for_parameter(parameter_id: ParameterId, value: u8) -> Self {
        let builder = Self::builder();
        match parameter_id {
            ParameterId::ChargePower => builder.charge_power(value).build(),
            ParameterId::ChargeStopSoc => builder.charge_stop_soc(value).build(),
            ParameterId::DischargePower => builder.discharge_power(value).build(),
            ParameterId::DischargeStopSoc => builder.discharge_stop_soc(value).build(),
            ParameterId::AcCharge => builder.ac_charge_enabled(value != 0).build(),
        }
    }

    pub fn params(&self, parameter_id: ParameterId) -> Result<ParamList, ApiError> {
        let mut params = ParamList::default();
        match parameter_id {
            ParameterId::ChargePower => params.set(1, self.charge_power)?,
            ParameterId::ChargeStopSoc => params.set(1, self.charge_stop_soc)?,
            ParameterId::DischargePower => params.set(1, self.discharge_power)?,
            ParameterId::DischargeStopSoc => params.set(1, self.discharge_stop_soc)?,
            ParameterId::AcCharge => params.set(1, flag(self.ac_charge_enabled))?,
        };
        Ok(params)
    }
}

/// Named time-window write commands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SegmentCommand {
    MixAcChargeTimePeriod,
    MixAcDischargeTimePeriod,

    /// TLX time-of-use segment, `1..=9`.
    TimeSegment(u8),
}

impl Display for SegmentCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MixAcChargeTimePeriod => f.write_str("mix_ac_charge_time_period"),
            Self::MixAcDischargeTimePeriod => f.write_str("mix_ac_discharge_time_period"),
            Self::TimeSegment(segment_id) => write!(f, "time_segment{segment_id}"),
        }
    }
}

/// MIX/SPH AC charge window together with the charge power and stop SoC.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Builder)]
pub struct MixAcChargeTimeParams {
    pub charge_power: u8,
    pub charge_stop_soc: u8,
    pub mains_enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_enabled: bool,

    #[builder(default = 1)]
    pub segment_id: u8,
}

/// MIX/SPH discharge window together with the discharge power and stop SoC.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Builder)]
pub struct MixAcDischargeTimeParams {
    pub discharge_power: u8,
    pub discharge_stop_soc: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_enabled: bool,

    #[builder(default = 1)]
    pub segment_id: u8,
}

/// Battery priority of a TLX time segment.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum BatteryMode {
    LoadFirst,
    BatteryFirst,
    GridFirst,
}

impl BatteryMode {
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::LoadFirst),
            1 => Some(Self::BatteryFirst),
            2 => Some(Self::GridFirst),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::LoadFirst => 0,
            Self::BatteryFirst => 1,
            Self::GridFirst => 2,
        }
    }
}

impl Display for BatteryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFirst => write!(f, "Load First"),
            Self::BatteryFirst => write!(f, "Battery First"),
            Self::GridFirst => write!(f, "Grid First"),
        }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Builder)]
pub struct TlxTimeSegmentParams {
    pub segment_id: u8,
    pub battery_mode: BatteryMode,
    pub start: NaiveTime,
    pub end: NaiveTime,

    #[builder(default = true)]
    pub is_enabled: bool,
}

/// Time-window record for [`SegmentCommand`] writes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::From)]
pub enum TimeSegmentParams {
    MixAcCharge(MixAcChargeTimeParams),
    MixAcDischarge(MixAcDischargeTimeParams),
    Tlx(TlxTimeSegmentParams),
}

impl TimeSegmentParams {
    /// The command that this record is written with.
    pub const fn command(&self) -> SegmentCommand {
        match self {
            Self::MixAcCharge(_) => SegmentCommand::MixAcChargeTimePeriod,
            Self::MixAcDischarge(_) => SegmentCommand::MixAcDischargeTimePeriod,
            Self::Tlx(params) => SegmentCommand::TimeSegment(params.segment_id),
        }
    }

    pub fn params(&self) -> Result<ParamList, ApiError> {
        let mut list = ParamList::default();
        match self {
            Self::MixAcCharge(params) => {
                let offset = mix_block_offset(params.segment_id)?;
                list.set(1, params.charge_power)?
                    .set(2, params.charge_stop_soc)?
                    .set(3, flag(params.mains_enabled))?
                    .set_window(4 + offset, params.start, params.end, params.is_enabled)?;
            }
            Self::MixAcDischarge(params) => {
                let offset = mix_block_offset(params.segment_id)?;
                list.set(1, params.discharge_power)?
                    .set(2, params.discharge_stop_soc)?
                    .set_window(3 + offset, params.start, params.end, params.is_enabled)?;
            }
            Self::Tlx(params) => {
                if !(1..=9).contains(&params.segment_id) {
                    return Err(ApiError::Parameter("segment_id must be between 1 and 9".into()));
                }
                list.set(1, params.battery_mode.code())?.set_window(
                    2,
                    params.start,
                    params.end,
                    params.is_enabled,
                )?;
            }
        }
        Ok(list)
    }
}

/// MIX windows occupy five consecutive parameters each, three windows in total.
fn mix_block_offset(segment_id: u8) -> Result<usize, ApiError> {
    if (1..=3).contains(&segment_id) {
        Ok(5 * usize::from(segment_id - 1))
    } else {
        Err(ApiError::Parameter("segment_id must be between 1 and 3".into()))
    }
}

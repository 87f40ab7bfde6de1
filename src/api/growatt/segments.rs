use std::fmt::{Display, Formatter};

use chrono::NaiveTime;
use comfy_table::{Cell, Color, Table, modifiers, presets};
use serde_json::Value;

use crate::api::growatt::{
    BatteryMode,
    Fields,
    value::{as_integer, as_time},
};

/// Number of time-of-use segments of a TLX inverter.
pub const N_SEGMENTS: u8 = 9;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeSegment {
    pub segment_id: u8,
    pub battery_mode: Option<BatteryMode>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_enabled: bool,
}

#[derive(derive_more::AsRef, derive_more::IntoIterator)]
pub struct TimeSegments(#[into_iterator(owned, ref)] Vec<TimeSegment>);

impl TimeSegments {
    /// Parse all segments out of the device settings.
    ///
    /// Missing, `"null"` and malformed values degrade to `00:00`, unknown mode and disabled.
    pub fn from_settings(settings: &Fields) -> Self {
        let field = |name: String| settings.get(&name).filter(|value| !is_null(value));
        (1..=N_SEGMENTS)
            .map(|segment_id| TimeSegment {
                segment_id,
                battery_mode: field(format!("time{segment_id}Mode"))
                    .and_then(as_integer)
                    .and_then(BatteryMode::from_code),
                start: field(format!("forcedTimeStart{segment_id}"))
                    .and_then(as_time)
                    .unwrap_or(NaiveTime::MIN),
                end: field(format!("forcedTimeStop{segment_id}"))
                    .and_then(as_time)
                    .unwrap_or(NaiveTime::MIN),
                is_enabled: field(format!("forcedStopSwitch{segment_id}"))
                    .and_then(as_integer)
                    .is_some_and(|flag| flag == 1),
            })
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<Vec<TimeSegment>> for TimeSegments {
    fn from(segments: Vec<TimeSegment>) -> Self {
        Self(segments)
    }
}

fn is_null(value: &Value) -> bool {
    value.is_null() || value.as_str() == Some("null")
}

impl Display for TimeSegments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
            .enforce_styling()
            .set_header(vec!["Segment", "Start", "End", "Mode", "Enabled"]);
        for segment in &self.0 {
            let mode =
                segment.battery_mode.map_or_else(|| "Unknown".to_owned(), |mode| mode.to_string());
            table.add_row(vec![
                Cell::new(segment.segment_id),
                Cell::new(segment.start.format("%H:%M")),
                Cell::new(segment.end.format("%H:%M")),
                Cell::new(mode).fg(segment.battery_mode.map_or(Color::Reset, BatteryMode::color)),
                Cell::new(if segment.is_enabled { "yes" } else { "no" }),
            ]);
        }
        write!(f, "{table}")
    }
}

impl BatteryMode {
    pub const fn color(self) -> Color {
        match self {
            Self::LoadFirst => Color::DarkYellow,
            Self::BatteryFirst => Color::Green,
            Self::GridFirst => Color::Blue,
        }
    }
}

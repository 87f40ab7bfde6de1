use std::fmt::{Display, Formatter};

/// Growatt device types as reported by the device list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DeviceType {
    /// MIX/SPH hybrid inverters.
    MixSph,

    /// MIN/TLX inverters.
    MinTlx,
}

impl DeviceType {
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            5 => Some(Self::MixSph),
            7 => Some(Self::MinTlx),
            _ => None,
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::MixSph => 5,
            Self::MinTlx => 7,
        }
    }

    /// Prefix used in endpoint paths and in the serial number form field.
    pub const fn url_prefix(self) -> &'static str {
        match self {
            Self::MixSph => "mix",
            Self::MinTlx => "tlx",
        }
    }

    pub const fn endpoint(self, endpoint: Endpoint) -> &'static str {
        match (self, endpoint) {
            (Self::MixSph, Endpoint::LastData) => "device/mix/mix_last_data",
            (Self::MixSph, Endpoint::BasicInfo | Endpoint::Settings) => "device/mix/mix_data_info",
            (Self::MixSph, Endpoint::ReadParameter) => "readMixParam",
            (Self::MixSph, Endpoint::Write) => "mixSet",
            (Self::MinTlx, Endpoint::LastData) => "device/tlx/tlx_last_data",
            (Self::MinTlx, Endpoint::BasicInfo) => "device/tlx/tlx_data_info",
            (Self::MinTlx, Endpoint::Settings) => "device/tlx/tlx_set_info",
            (Self::MinTlx, Endpoint::ReadParameter) => "readMinParam",
            (Self::MinTlx, Endpoint::Write) => "tlxSet",
        }
    }

    /// Name of the serial number field in form-encoded requests.
    pub fn serial_field(self) -> String {
        format!("{}_sn", self.url_prefix())
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MixSph => write!(f, "MIX_SPH"),
            Self::MinTlx => write!(f, "MIN_TLX"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Endpoint {
    LastData,
    BasicInfo,
    Settings,
    ReadParameter,
    Write,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_ok() {
        assert_eq!(DeviceType::from_code(5), Some(DeviceType::MixSph));
        assert_eq!(DeviceType::from_code(7), Some(DeviceType::MinTlx));
        assert_eq!(DeviceType::from_code(1), None);
    }

    #[test]
    fn endpoints_ok() {
        assert_eq!(DeviceType::MinTlx.endpoint(Endpoint::Settings), "device/tlx/tlx_set_info");
        assert_eq!(DeviceType::MixSph.endpoint(Endpoint::Settings), "device/mix/mix_data_info");
        assert_eq!(DeviceType::MixSph.endpoint(Endpoint::Write), "mixSet");
        assert_eq!(DeviceType::MinTlx.serial_field(), "tlx_sn");
    }
}

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::api::growatt::DeviceType;

#[derive(Deserialize)]
pub struct PlantList {
    #[serde(default)]
    pub plants: Vec<Plant>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Plant {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(rename = "plant_id")]
    pub id: i64,

    #[serde(rename = "name", alias = "plant_name", default)]
    pub name: String,

    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(rename = "device_sn")]
    pub serial_number: String,

    /// Raw Growatt type code, see [`Device::device_type`].
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(rename = "type")]
    pub type_code: Option<i64>,

    #[serde(rename = "model", default)]
    pub model: Option<String>,
}

impl Device {
    pub fn device_type(&self) -> Option<DeviceType> {
        self.type_code.and_then(DeviceType::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn plant_list_ok() -> Result {
        // language=json
        let body = r#"{
            "count": 2,
            "plants": [
                {"plant_id": 1234, "name": "Home", "city": "Rotterdam"},
                {"plant_id": "5678", "plant_name": "Cabin"}
            ]
        }"#;
        let plants = serde_json::from_str::<PlantList>(body)?.plants;
        assert_eq!(plants.len(), 2);
        assert_eq!(plants[0].id, 1234);
        assert_eq!(plants[0].name, "Home");
        assert_eq!(plants[1].id, 5678);
        assert_eq!(plants[1].name, "Cabin");
        Ok(())
    }

    #[test]
    fn device_list_ok() -> Result {
        // language=json
        let body = r#"{
            "count": 3,
            "devices": [
                {"device_sn": "TLX0001", "type": 7, "model": "MIN 3600TL-XH"},
                {"device_sn": "SPH0001", "type": "5"},
                {"device_sn": "DTL0001", "type": 1}
            ]
        }"#;
        let devices = serde_json::from_str::<DeviceList>(body)?.devices;
        assert_eq!(devices[0].device_type(), Some(DeviceType::MinTlx));
        assert_eq!(devices[1].device_type(), Some(DeviceType::MixSph));
        assert_eq!(devices[2].device_type(), None);
        Ok(())
    }
}

//! Check-in form and the rules that turn yesterday's record into today's.

use crate::domain::DomainError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Provinces whose `city` is reported as the province itself.
const MUNICIPALITIES: &[&str] = &["北京市", "上海市", "重庆市", "天津市"];

pub const NO_HISTORY_MESSAGE: &str = "无法获取历史数据！请手动打卡后再试!";
pub const INCOMPLETE_HISTORY_MESSAGE: &str = "昨天的信息不完整！请手动填报一天后继续使用本脚本";

/// Field name -> value mapping of a check-in submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormRecord(Map<String, Value>);

impl FormRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of a field (missing and non-string fields yield `None`).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the embedded `geo_api_info` payload.
    ///
    /// The portal stores it as a JSON string; an inline object is accepted too.
    /// Missing, null or blank means the record is incomplete.
    pub fn geo_api_info(&self) -> Result<GeoApiInfo, DomainError> {
        let incomplete = || DomainError::DataUnavailable(INCOMPLETE_HISTORY_MESSAGE.to_string());
        match self.0.get("geo_api_info") {
            Some(Value::String(raw)) if !raw.trim().is_empty() => serde_json::from_str(raw)
                .map_err(|e| DomainError::Parse(format!("geo_api_info: {}", e))),
            Some(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map.clone()))
                    .map_err(|e| DomainError::Parse(format!("geo_api_info: {}", e)))
            }
            _ => Err(incomplete()),
        }
    }

    /// Build today's form: overlay the address fields derived from `geo_api_info`
    /// and reset the travel flags.
    pub fn into_today(mut self) -> Result<Self, DomainError> {
        let geo = self.geo_api_info()?;
        let derived = DerivedFields::from_geo(&geo);
        self.set("province", derived.province);
        self.set("city", derived.city);
        self.set("area", derived.area);
        self.set("address", derived.address);
        self.set("ismoved", "0");
        self.set("bztcyy", "");
        self.set("sfsfbh", "0");
        Ok(self)
    }

    /// Flatten into `application/x-www-form-urlencoded` pairs.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    Value::Bool(true) => "1".to_string(),
                    Value::Bool(false) => "0".to_string(),
                    Value::Number(n) => n.to_string(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }
}

/// The two places the portal may keep the previous submission.
#[derive(Debug, Clone, Default)]
pub struct PriorForms {
    pub old_info: Option<FormRecord>,
    pub info: Option<FormRecord>,
}

impl PriorForms {
    /// Pick the record to reuse, `oldInfo` first.
    pub fn select(self) -> Result<FormRecord, DomainError> {
        self.old_info
            .filter(|r| !r.is_empty())
            .or(self.info.filter(|r| !r.is_empty()))
            .ok_or_else(|| DomainError::DataUnavailable(NO_HISTORY_MESSAGE.to_string()))
    }
}

/// Geolocation payload recorded by the portal's map widget.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoApiInfo {
    #[serde(rename = "addressComponent")]
    pub address_component: AddressComponent,
    #[serde(rename = "formattedAddress")]
    pub formatted_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub province: String,
    /// Empty (string or `[]`) for municipalities.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub district: String,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Address fields computed from the geolocation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    pub province: String,
    pub city: String,
    pub area: String,
    pub address: String,
}

impl DerivedFields {
    pub fn from_geo(geo: &GeoApiInfo) -> Self {
        let ac = &geo.address_component;
        let city = if MUNICIPALITIES.contains(&ac.province.as_str()) {
            ac.province.clone()
        } else {
            ac.city.clone()
        };
        Self {
            province: ac.province.clone(),
            city,
            area: format!("{} {} {}", ac.province, ac.city, ac.district),
            address: geo.formatted_address.clone(),
        }
    }
}

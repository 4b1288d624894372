use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

pub fn parse<T: DeserializeOwned>(raw: &str, kind: &'static str) -> Result<T, UnknownValue> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string())).map_err(|_| UnknownValue {
        kind,
        value: raw.to_string(),
    })
}

pub fn name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

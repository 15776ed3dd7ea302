// Metadata trailer stored inside image container files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub variant: String,

    /// Version of the tool that wrote the file.
    #[serde(default)]
    pub app_version: String,

    /// Properties written by other tools; preserved verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            app_version: crate::VERSION.to_string(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_extras() {
        let mut meta = Metadata::new("Baofeng", "UV-5R");
        meta.extra
            .insert("serial".to_string(), serde_json::json!("A12345"));

        let json = meta.to_json().unwrap();
        let back = Metadata::from_json(&json).unwrap();

        assert_eq!(back.vendor, "Baofeng");
        assert_eq!(back.model, "UV-5R");
        assert_eq!(back.extra["serial"], serde_json::json!("A12345"));
        assert!(!back.app_version.is_empty());
    }

    #[test]
    fn unknown_fields_preserved() {
        let json = r#"{"vendor":"Wouxun","model":"KG-UV8D","future_field":42}"#;
        let meta = Metadata::from_json(json).unwrap();
        assert_eq!(meta.extra["future_field"], serde_json::json!(42));
        assert!(meta.to_json().unwrap().contains("future_field"));
    }
}

//! Plain data records for shape save/load
//!
//! A `ShapeRecord` is the wire form of one shape: the type discriminator,
//! the attribute map, optional namespaced attributes, the style map, and an
//! opaque data bag. The layout is stable; save files produced by one version
//! must load in the next.

use crate::{AttrValue, NamespacedAttr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The wire discriminators for shape records
pub const SHAPE_TYPES: [&str; 5] = ["path", "rect", "ellipse", "image", "text"];

/// Opaque payload carried with a shape record.
///
/// Text content is not an element attribute, so text shapes stage it here at
/// serialize time; it is restored onto the element before the constructor
/// applies font defaults. `extra` is the host-attached user data, passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ShapeData {
    pub fn is_empty(&self) -> bool {
        self.text_content.is_none() && self.extra.is_none()
    }
}

/// The serialized form of one shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Shape discriminator: "path" | "rect" | "ellipse" | "image" | "text"
    #[serde(rename = "type")]
    pub shape_type: String,
    pub attr: BTreeMap<String, AttrValue>,
    #[serde(rename = "attrNS", default, skip_serializing_if = "Option::is_none")]
    pub attr_ns: Option<Vec<NamespacedAttr>>,
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ShapeData>,
}

impl ShapeRecord {
    /// Whether the discriminator names a shape type this model can rebuild
    pub fn has_known_type(&self) -> bool {
        SHAPE_TYPES.contains(&self.shape_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_keys_are_stable() {
        let mut attr = BTreeMap::new();
        attr.insert("x".to_string(), AttrValue::Number(10.0));
        let record = ShapeRecord {
            shape_type: "image".to_string(),
            attr,
            attr_ns: Some(vec![NamespacedAttr::new(
                "http://www.w3.org/1999/xlink",
                "href",
                "photo.png",
            )]),
            style: BTreeMap::new(),
            data: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["attr"]["x"], 10.0);
        assert_eq!(json["attrNS"][0]["name"], "href");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn data_bag_round_trips() {
        let data = ShapeData {
            text_content: Some("hello".to_string()),
            extra: Some(serde_json::json!({"tag": 7})),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("textContent"));
        let back: ShapeData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn unknown_type_is_detectable() {
        let record = ShapeRecord {
            shape_type: "polygon".to_string(),
            attr: BTreeMap::new(),
            attr_ns: None,
            style: BTreeMap::new(),
            data: None,
        };
        assert!(!record.has_known_type());
    }
}

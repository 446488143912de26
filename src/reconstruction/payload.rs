//! Request bodies for the remote task API.
//!
//! The service has accepted different shapes over time, so each shape is a
//! pure builder and the client walks them in the configured order.

use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const SINGLE_IMAGE_TASK: &str = "image_to_model";
pub const MULTIVIEW_TASK: &str = "multiview_to_model";

/// View keys in the order captures are assigned to them.
pub const VIEW_KEYS: [&str; 4] = ["front_image_url", "back_image_url", "left_image_url", "right_image_url"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleImageShape {
    /// `{"type", "image_url"}`
    ImageUrl,
    /// `{"type", "input": {"image_url"}}`
    InputImageUrl,
    /// `{"type", "image"}`
    Image,
    /// `{"type", "input": {"image"}}`
    InputImage,
}

impl SingleImageShape {
    pub fn default_order() -> Vec<Self> {
        vec![Self::ImageUrl, Self::InputImageUrl, Self::Image, Self::InputImage]
    }

    /// `image` is either a public URL or a `data:` URI.
    pub fn build(self, image: &str) -> Value {
        match self {
            Self::ImageUrl => json!({ "type": SINGLE_IMAGE_TASK, "image_url": image }),
            Self::InputImageUrl => json!({ "type": SINGLE_IMAGE_TASK, "input": { "image_url": image } }),
            Self::Image => json!({ "type": SINGLE_IMAGE_TASK, "image": image }),
            Self::InputImage => json!({ "type": SINGLE_IMAGE_TASK, "input": { "image": image } }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiviewShape {
    /// View URLs under `input`.
    Nested,
    /// View URLs next to `type`.
    Flat,
}

impl MultiviewShape {
    pub fn default_order() -> Vec<Self> {
        vec![Self::Nested, Self::Flat]
    }

    pub fn build(self, views: &Map<String, Value>) -> Value {
        match self {
            Self::Nested => json!({ "type": MULTIVIEW_TASK, "input": views }),
            Self::Flat => {
                let mut body = views.clone();
                body.insert("type".to_string(), Value::from(MULTIVIEW_TASK));
                Value::Object(body)
            }
        }
    }
}

/// Public URL of the n-th capture (1-based) of a scan.
pub fn capture_url(public_base_url: &str, scan_id: &str, index: usize) -> String {
    format!(
        "{}/scans/{}/{}",
        public_base_url.trim_end_matches('/'),
        scan_id,
        crate::store::capture_artifact(index)
    )
}

/// Assigns the first `count` captures to view keys, front first.
pub fn view_urls(public_base_url: &str, scan_id: &str, count: usize) -> Map<String, Value> {
    VIEW_KEYS
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, key)| (key.to_string(), Value::from(capture_url(public_base_url, scan_id, i + 1))))
        .collect()
}

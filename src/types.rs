use serde::{Deserialize, Serialize};

/// Response to `POST /api/create-model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModelResponse {
    pub model_url: String,
    pub scan_id: String,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Returned after a file has been stored
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Name the file was stored under (its original filename)
    pub filename: String,
}

impl UploadResponse {
    pub fn uploaded(filename: impl Into<String>) -> Self {
        Self {
            message: "Uploaded successfully".to_string(),
            filename: filename.into(),
        }
    }
}

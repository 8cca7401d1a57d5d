use serde::{Deserialize, Serialize};

/// Drive v3 file resource, limited to the fields the tools request.
/// `size` stays a string because that is how the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// Error envelope the Drive API wraps non-2xx bodies in.
#[derive(Debug, Deserialize)]
pub struct DriveErrorEnvelope {
    pub error: DriveErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct DriveErrorBody {
    pub code: u64,
    pub message: String,
}

/// Report produced by one analyze call. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub file_name: String,
    pub file_size: usize,
    pub line_count: usize,
    pub content: String,
    pub truncated: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

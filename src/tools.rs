use serde_json::json;
use tracing::error;

use crate::analyzer;
use crate::auth::Authenticator;
use crate::config::Config;
use crate::drive::DriveClient;
use crate::error::Result;

pub const DEFAULT_LIST_MAX: u32 = 10;
pub const DEFAULT_SEARCH_MAX: u32 = 20;
pub const DEFAULT_SEARCH_TERM: &str = "*.log";

/// The four host-invocable tools. Each public operation is a thin adapter
/// around a fallible body: whatever the authenticator or Drive client
/// throws is converted into a structured error value at this boundary and
/// never crosses it as a panic or propagated error.
pub struct ToolHandler {
    config: Config,
}

impl ToolHandler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// A fresh token check and client per call; the only cross-call state
    /// is the credential persisted on disk.
    async fn client(&self) -> Result<DriveClient> {
        let cred = Authenticator::new(&self.config).obtain_access().await?;
        Ok(DriveClient::new(cred.access_token))
    }

    pub async fn list_drive_files(
        &self,
        query: &str,
        max_results: u32,
        folder_id: Option<&str>,
    ) -> String {
        self.try_list(query, max_results, folder_id)
            .await
            .unwrap_or_else(error_json)
    }

    async fn try_list(
        &self,
        query: &str,
        max_results: u32,
        folder_id: Option<&str>,
    ) -> Result<String> {
        let client = self.client().await?;
        let files = client.list_files(query, max_results, folder_id).await?;

        if files.is_empty() {
            return Ok(json!({ "message": "No files found", "files": [] }).to_string());
        }
        Ok(serde_json::to_string_pretty(&json!({
            "message": format!("Found {} file(s)", files.len()),
            "files": files,
        }))?)
    }

    pub async fn read_drive_file(&self, file_id: &str) -> String {
        match self.try_read(file_id).await {
            Ok(text) => text,
            Err(e) => {
                error!("read_drive_file failed: {e}");
                format!("Error reading file: {e}")
            }
        }
    }

    async fn try_read(&self, file_id: &str) -> Result<String> {
        let client = self.client().await?;
        let (meta, content) = client.download_text(file_id).await?;
        Ok(format!("File: {}\n{}\n{}", meta.name, "=".repeat(60), content))
    }

    pub async fn analyze_hpc_log(&self, file_id: &str) -> String {
        self.try_analyze(file_id).await.unwrap_or_else(error_json)
    }

    async fn try_analyze(&self, file_id: &str) -> Result<String> {
        let client = self.client().await?;
        let (meta, content) = client.download_text(file_id).await?;
        let report = analyzer::analyze(&meta.name, &content);
        Ok(serde_json::to_string_pretty(&report)?)
    }

    pub async fn search_hpc_logs(
        &self,
        search_term: &str,
        folder_id: Option<&str>,
        max_results: u32,
    ) -> String {
        let query = build_log_search_query(search_term);
        self.list_drive_files(&query, max_results, folder_id).await
    }
}

/// The `"*.log"` sentinel widens the search to the three extensions HPC
/// schedulers emit; anything else is a verbatim name-contains clause.
pub fn build_log_search_query(search_term: &str) -> String {
    if search_term == DEFAULT_SEARCH_TERM {
        "name contains '.log' or name contains '.out' or name contains '.err'".to_string()
    } else {
        format!("name contains '{search_term}'")
    }
}

fn error_json(e: crate::error::DriveMcpError) -> String {
    error!("tool call failed: {e}");
    json!({ "error": e.to_string() }).to_string()
}

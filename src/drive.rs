use futures::StreamExt;
use tracing::debug;

use crate::error::{DriveMcpError, Result};
use crate::model::{DriveErrorEnvelope, DriveFile, DriveFileList};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const LIST_FIELDS: &str = "files(id,name,mimeType,modifiedTime,size,parents)";

/// Thin pass-through to the Drive v3 REST API, valid for one access token.
/// Built fresh per tool call; holds no state beyond the reqwest client.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
}

impl DriveClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
        }
    }

    /// List at most `max_results` files matching the combined query.
    /// An empty result set is a successful empty vec, not an error.
    pub async fn list_files(
        &self,
        query: &str,
        max_results: u32,
        folder_id: Option<&str>,
    ) -> Result<Vec<DriveFile>> {
        let q = build_query(query, folder_id);
        let page_size = max_results.to_string();
        let mut params = vec![
            ("pageSize", page_size.as_str()),
            ("fields", LIST_FIELDS),
        ];
        if !q.is_empty() {
            params.push(("q", q.as_str()));
        }

        let resp = self
            .http
            .get(FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let list: DriveFileList = resp.json().await?;
        debug!("drive list returned {} file(s)", list.files.len());
        Ok(list.files)
    }

    pub async fn get_metadata(&self, file_id: &str) -> Result<DriveFile> {
        let resp = self
            .http
            .get(format!("{FILES_URL}/{file_id}"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id,name,mimeType")])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Stream the full content to completion; there is no partial result.
    pub async fn download_bytes(&self, file_id: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(format!("{FILES_URL}/{file_id}"))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let mut buf = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    /// Metadata plus the decoded body. Undecodable byte sequences are
    /// substituted, never a failure; log files are not round-trip data.
    pub async fn download_text(&self, file_id: &str) -> Result<(DriveFile, String)> {
        let meta = self.get_metadata(file_id).await?;
        let bytes = self.download_bytes(file_id).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok((meta, content))
    }
}

/// Conjoin the optional folder-scoping clause with the caller's clause.
pub fn build_query(query: &str, folder_id: Option<&str>) -> String {
    match folder_id {
        Some(folder) => {
            let folder_clause = format!("'{folder}' in parents");
            if query.is_empty() {
                folder_clause
            } else {
                format!("{folder_clause} and {query}")
            }
        }
        None => query.to_string(),
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<DriveErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    };
    Err(DriveMcpError::RemoteCallFailed {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_and_query_are_conjoined() {
        let q = build_query("name contains 'slurm'", Some("folder123"));
        assert_eq!(q, "'folder123' in parents and name contains 'slurm'");
    }

    #[test]
    fn folder_alone_produces_only_the_folder_clause() {
        assert_eq!(build_query("", Some("folder123")), "'folder123' in parents");
    }

    #[test]
    fn no_folder_passes_the_query_through() {
        assert_eq!(build_query("name contains 'x'", None), "name contains 'x'");
        assert_eq!(build_query("", None), "");
    }
}

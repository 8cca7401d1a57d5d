use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::drive::DriveClient;
use crate::error::{DriveMcpError, Result};

/// Key this server registers under in the host's `mcpServers` table.
pub const SERVER_KEY: &str = "gdrive-hpc";

/// Claude Desktop's own config file; its location is OS-dependent.
pub fn claude_config_path() -> Result<PathBuf> {
    if cfg!(target_os = "macos") {
        Ok(home_dir()?.join("Library/Application Support/Claude/claude_desktop_config.json"))
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var_os("APPDATA").ok_or_else(|| {
            DriveMcpError::InvalidRequest("APPDATA is not set".to_string())
        })?;
        Ok(PathBuf::from(appdata).join("Claude/claude_desktop_config.json"))
    } else {
        Ok(home_dir()?.join(".config/Claude/claude_desktop_config.json"))
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or_else(|| DriveMcpError::InvalidRequest("HOME is not set".to_string()))
}

/// Merge one named server entry into the host config, creating the file and
/// its parents if absent and leaving every unrelated key untouched. A file
/// that is not valid JSON is replaced rather than aborting the setup.
pub fn inject_server_entry(
    config_path: &Path,
    server_name: &str,
    command: &str,
    args: &[String],
) -> Result<()> {
    let mut root: Value = if config_path.exists() {
        let raw = std::fs::read_to_string(config_path)?;
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("existing config is not valid JSON ({e}); starting fresh");
            json!({})
        })
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        json!({})
    };

    if !root.is_object() {
        root = json!({});
    }
    let servers = root
        .as_object_mut()
        .expect("root was just normalized to an object")
        .entry("mcpServers")
        .or_insert_with(|| json!({}));
    if !servers.is_object() {
        *servers = json!({});
    }
    servers[server_name] = json!({ "command": command, "args": args });

    std::fs::write(config_path, serde_json::to_string_pretty(&root)?)?;
    Ok(())
}

/// `configure` subcommand: register this binary with Claude Desktop.
pub fn run_configure() -> Result<()> {
    let exe = std::env::current_exe()?;
    let config_path = claude_config_path()?;

    eprintln!("Registering {SERVER_KEY} in {}", config_path.display());
    inject_server_entry(
        &config_path,
        SERVER_KEY,
        &exe.to_string_lossy(),
        &["serve".to_string()],
    )?;

    eprintln!("Configuration updated.");
    eprintln!("Next steps:");
    eprintln!("  1. Restart Claude Desktop");
    eprintln!("  2. Ask it to list your Google Drive files");
    Ok(())
}

/// `auth-test` subcommand: drive the full credential path, then prove API
/// access by listing a handful of files.
pub async fn run_auth_test(config: &Config) -> Result<()> {
    eprintln!("Google Drive authentication test");
    eprintln!("A browser window may open for the OAuth consent flow.");

    let cred = Authenticator::new(config).obtain_access().await?;
    eprintln!("Authentication successful.");

    let client = DriveClient::new(cred.access_token);
    let files = client.list_files("", 5, None).await?;
    if files.is_empty() {
        eprintln!("No files found in your Google Drive.");
    } else {
        eprintln!("Found {} file(s):", files.len());
        for file in &files {
            eprintln!("  - {} (ID: {})", file.name, file.id);
        }
    }

    eprintln!("Setup complete. Run `gdrive-hpc-mcp configure` to register with Claude Desktop.");
    Ok(())
}

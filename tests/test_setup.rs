use gdrive_hpc_mcp::setup::inject_server_entry;
use serde_json::{json, Value};
use tempfile::tempdir;

#[test]
fn injection_preserves_unrelated_keys_and_other_servers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude_desktop_config.json");
    let existing = json!({
        "theme": "dark",
        "mcpServers": {
            "other-tool": { "command": "/usr/bin/other", "args": [] }
        }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&existing).unwrap()).unwrap();

    inject_server_entry(&path, "gdrive-hpc", "/opt/gdrive-hpc-mcp", &["serve".to_string()])
        .unwrap();

    let merged: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(merged["theme"], "dark");
    assert_eq!(merged["mcpServers"]["other-tool"]["command"], "/usr/bin/other");
    assert_eq!(merged["mcpServers"]["gdrive-hpc"]["command"], "/opt/gdrive-hpc-mcp");
    assert_eq!(merged["mcpServers"]["gdrive-hpc"]["args"][0], "serve");
}

#[test]
fn injection_overwrites_exactly_its_own_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude_desktop_config.json");
    let existing = json!({
        "mcpServers": {
            "gdrive-hpc": { "command": "/old/location", "args": ["old"] }
        }
    });
    std::fs::write(&path, existing.to_string()).unwrap();

    inject_server_entry(&path, "gdrive-hpc", "/new/location", &["serve".to_string()]).unwrap();

    let merged: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(merged["mcpServers"]["gdrive-hpc"]["command"], "/new/location");
    assert_eq!(merged["mcpServers"].as_object().unwrap().len(), 1);
}

#[test]
fn injection_creates_file_and_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Claude").join("claude_desktop_config.json");

    inject_server_entry(&path, "gdrive-hpc", "/opt/gdrive-hpc-mcp", &[]).unwrap();

    let merged: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(merged["mcpServers"]["gdrive-hpc"].is_object());
}

#[test]
fn invalid_existing_json_is_replaced_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("claude_desktop_config.json");
    std::fs::write(&path, "{ not json").unwrap();

    inject_server_entry(&path, "gdrive-hpc", "/opt/gdrive-hpc-mcp", &[]).unwrap();

    let merged: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(merged["mcpServers"]["gdrive-hpc"].is_object());
}

use gdrive_hpc_mcp::config::Config;
use gdrive_hpc_mcp::tools::ToolHandler;
use serde_json::Value;
use tempfile::tempdir;

fn expected_missing_secret_message(config: &Config) -> String {
    format!(
        "credentials.json not found at {}. Please download it from Google Cloud Console.",
        config.credentials_path.display()
    )
}

#[tokio::test]
async fn list_without_any_credentials_returns_error_object() {
    let dir = tempdir().unwrap();
    let config = Config::from_dir(dir.path());
    let handler = ToolHandler::new(config.clone());

    let out = handler.list_drive_files("", 10, None).await;
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        parsed["error"].as_str().unwrap(),
        expected_missing_secret_message(&config)
    );
}

#[tokio::test]
async fn search_without_credentials_returns_the_same_error_shape() {
    let dir = tempdir().unwrap();
    let config = Config::from_dir(dir.path());
    let handler = ToolHandler::new(config.clone());

    let out = handler.search_hpc_logs("*.log", None, 20).await;
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        parsed["error"].as_str().unwrap(),
        expected_missing_secret_message(&config)
    );
}

#[tokio::test]
async fn analyze_without_credentials_returns_error_object() {
    let dir = tempdir().unwrap();
    let config = Config::from_dir(dir.path());
    let handler = ToolHandler::new(config.clone());

    let out = handler.analyze_hpc_log("some-file-id").await;
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        parsed["error"].as_str().unwrap(),
        expected_missing_secret_message(&config)
    );
}

#[tokio::test]
async fn read_without_credentials_returns_annotated_string_not_json() {
    let dir = tempdir().unwrap();
    let config = Config::from_dir(dir.path());
    let handler = ToolHandler::new(config.clone());

    let out = handler.read_drive_file("some-file-id").await;
    assert_eq!(
        out,
        format!(
            "Error reading file: {}",
            expected_missing_secret_message(&config)
        )
    );
}

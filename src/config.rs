use std::path::{Path, PathBuf};

pub const TOKEN_FILE: &str = "token.json";
pub const CLIENT_SECRET_FILE: &str = "credentials.json";

/// Read-only scope; widening it invalidates stored tokens, so delete
/// token.json after changing this.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Locations of the two on-disk artifacts: the persisted token and the
/// user-supplied OAuth client secret. Both default to the directory the
/// executable lives in; tests point them at a tempdir instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
}

impl Config {
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            token_path: dir.join(TOKEN_FILE),
            credentials_path: dir.join(CLIENT_SECRET_FILE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_dir(&dir)
    }
}

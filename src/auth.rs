use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode,
    ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, DRIVE_SCOPE};
use crate::error::{DriveMcpError, Result};
use crate::token_store::{StoredCredential, TokenStore};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client secret in the installed-app JSON layout that Google Cloud
/// Console produces. The user supplies this file; we never write it.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

pub fn load_client_secrets(path: &Path) -> Result<ClientSecrets> {
    if !path.exists() {
        return Err(DriveMcpError::MissingClientSecret {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    let parsed: ClientSecretsFile = serde_json::from_str(&raw)?;
    parsed.installed.or(parsed.web).ok_or_else(|| {
        DriveMcpError::InvalidRequest(format!(
            "no 'installed' or 'web' section in {}",
            path.display()
        ))
    })
}

/// Produces a valid, unexpired access token: cached first, then a single
/// refresh attempt, then the interactive loopback consent flow. Every
/// creation or refresh is persisted before being returned.
pub struct Authenticator {
    store: TokenStore,
    credentials_path: PathBuf,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            store: TokenStore::new(config.token_path.clone()),
            credentials_path: config.credentials_path.clone(),
        }
    }

    pub async fn obtain_access(&self) -> Result<StoredCredential> {
        let now = Utc::now();
        let cached = self.store.load()?;

        if let Some(cred) = &cached {
            if !cred.is_expired(now) {
                return Ok(cred.clone());
            }
        }

        // Both the refresh and consent legs need the client secret, so an
        // expired cache without credentials.json fails before any network I/O.
        let secrets = load_client_secrets(&self.credentials_path)?;

        if let Some(cred) = &cached {
            if let Some(refresh) = cred.refresh_token.clone() {
                match self.refresh(&secrets, cred, &refresh).await {
                    Ok(fresh) => {
                        self.store.save(&fresh)?;
                        return Ok(fresh);
                    }
                    Err(e) => {
                        warn!("token refresh failed, re-running consent: {e}");
                    }
                }
            }
        }

        let cred = self.interactive_consent(&secrets).await?;
        self.store.save(&cred)?;
        Ok(cred)
    }

    async fn refresh(
        &self,
        secrets: &ClientSecrets,
        old: &StoredCredential,
        refresh_token: &str,
    ) -> Result<StoredCredential> {
        let client = oauth_client(secrets)?;
        let token = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| DriveMcpError::RefreshFailed(e.to_string()))?;
        info!("access token refreshed");
        Ok(to_stored(&token, old.refresh_token.clone()))
    }

    /// Blocks until the user completes or abandons the browser consent
    /// exchange; the loopback listener uses an ephemeral port.
    async fn interactive_consent(
        &self,
        secrets: &ClientSecrets,
    ) -> Result<StoredCredential> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect = RedirectUrl::new(format!("http://127.0.0.1:{port}"))
            .map_err(|e| DriveMcpError::InvalidRequest(e.to_string()))?;

        let client = oauth_client(secrets)?.set_redirect_uri(redirect);
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_SCOPE.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        eprintln!("Open this URL in your browser to grant read-only Drive access:");
        eprintln!("  {auth_url}");
        open_browser(auth_url.as_str());

        let (code, state) = wait_for_redirect(&listener).await?;
        if state != *csrf.secret() {
            return Err(DriveMcpError::ConsentDenied(
                "state parameter mismatch".to_string(),
            ));
        }

        let token = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| DriveMcpError::ConsentDenied(e.to_string()))?;
        info!("interactive consent completed");
        Ok(to_stored(&token, None))
    }
}

fn oauth_client(secrets: &ClientSecrets) -> Result<BasicClient> {
    let auth_url = AuthUrl::new(secrets.auth_uri.clone())
        .map_err(|e| DriveMcpError::InvalidRequest(format!("auth_uri: {e}")))?;
    let token_url = TokenUrl::new(secrets.token_uri.clone())
        .map_err(|e| DriveMcpError::InvalidRequest(format!("token_uri: {e}")))?;
    Ok(BasicClient::new(
        ClientId::new(secrets.client_id.clone()),
        Some(ClientSecret::new(secrets.client_secret.clone())),
        auth_url,
        Some(token_url),
    ))
}

fn to_stored(
    token: &oauth2::basic::BasicTokenResponse,
    fallback_refresh: Option<String>,
) -> StoredCredential {
    let expiry = token
        .expires_in()
        .and_then(|d| Duration::from_std(d).ok())
        .map(|d| Utc::now() + d);
    let scopes = token
        .scopes()
        .map(|s| s.iter().map(|sc| sc.to_string()).collect())
        .unwrap_or_else(|| vec![DRIVE_SCOPE.to_string()]);
    StoredCredential {
        access_token: token.access_token().secret().clone(),
        // Google omits the refresh token on refresh responses; keep the old one.
        refresh_token: token
            .refresh_token()
            .map(|r| r.secret().clone())
            .or(fallback_refresh),
        expiry,
        scopes,
    }
}

/// Accepts exactly one redirect request and pulls `code` and `state` out of
/// its query string. A denial shows up as an `error` parameter.
async fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String)> {
    let (stream, _) = listener.accept().await?;
    let mut stream = BufReader::new(stream);
    let mut request_line = String::new();
    stream.read_line(&mut request_line).await?;

    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| DriveMcpError::ConsentDenied("malformed redirect".to_string()))?;
    let url = Url::parse(&format!("http://127.0.0.1{path}"))
        .map_err(|e| DriveMcpError::ConsentDenied(e.to_string()))?;

    let mut code = None;
    let mut state = None;
    let mut denial = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            "error" => denial = Some(v.into_owned()),
            _ => {}
        }
    }

    let body = if denial.is_none() && code.is_some() {
        "<html><body>Authorization complete. You can close this tab.</body></html>"
    } else {
        "<html><body>Authorization was not completed.</body></html>"
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.get_mut().write_all(response.as_bytes()).await?;
    let _ = stream.get_mut().shutdown().await;

    if let Some(reason) = denial {
        return Err(DriveMcpError::ConsentDenied(reason));
    }
    match (code, state) {
        (Some(c), Some(s)) => Ok((c, s)),
        _ => Err(DriveMcpError::ConsentDenied(
            "redirect carried no authorization code".to_string(),
        )),
    }
}

fn open_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };
    if let Err(e) = result {
        warn!("could not launch a browser ({e}); open the URL manually");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_secrets(dir: &Path) {
        let raw = serde_json::json!({
            "installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "shhh",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        });
        std::fs::write(
            dir.join(crate::config::CLIENT_SECRET_FILE),
            raw.to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn cached_unexpired_token_needs_no_client_secret() {
        let dir = tempdir().unwrap();
        let config = Config::from_dir(dir.path());
        let store = TokenStore::new(config.token_path.clone());
        store
            .save(&StoredCredential {
                access_token: "ya29.cached".to_string(),
                refresh_token: None,
                expiry: Some(Utc::now() + Duration::hours(1)),
                scopes: vec![DRIVE_SCOPE.to_string()],
            })
            .unwrap();

        let cred = Authenticator::new(&config).obtain_access().await.unwrap();
        assert_eq!(cred.access_token, "ya29.cached");
    }

    #[tokio::test]
    async fn missing_everything_reports_expected_location() {
        let dir = tempdir().unwrap();
        let config = Config::from_dir(dir.path());
        let err = Authenticator::new(&config).obtain_access().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "credentials.json not found at {}. Please download it from Google Cloud Console.",
                config.credentials_path.display()
            )
        );
    }

    #[tokio::test]
    async fn expired_token_without_secrets_fails_before_any_network() {
        let dir = tempdir().unwrap();
        let config = Config::from_dir(dir.path());
        let store = TokenStore::new(config.token_path.clone());
        store
            .save(&StoredCredential {
                access_token: "ya29.stale".to_string(),
                refresh_token: Some("1//refresh".to_string()),
                expiry: Some(Utc::now() - Duration::hours(1)),
                scopes: vec![],
            })
            .unwrap();

        let err = Authenticator::new(&config).obtain_access().await.unwrap_err();
        assert!(matches!(err, DriveMcpError::MissingClientSecret { .. }));
    }

    #[test]
    fn client_secrets_accept_installed_section() {
        let dir = tempdir().unwrap();
        write_secrets(dir.path());
        let secrets =
            load_client_secrets(&dir.path().join(crate::config::CLIENT_SECRET_FILE)).unwrap();
        assert_eq!(secrets.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secrets.token_uri, "https://oauth2.googleapis.com/token");
    }
}

//! OAuth2 authentication management for Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use yup_oauth2::ApplicationSecret;

use crate::config::Config;
use crate::error::{GmailError, Result};

/// Full mailbox scope. Permanent deletion (messages.delete and
/// messages.batchDelete) is only granted under this scope.
pub const FULL_MAIL_SCOPE: &str = "https://mail.google.com/";

/// Scopes requested when authenticating
pub const REQUIRED_SCOPES: &[&str] = &[FULL_MAIL_SCOPE];

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// File-backed cache of OAuth2 tokens.
///
/// Lifecycle: absent until the first authorization completes, written by the
/// authenticator on every refresh, read on subsequent runs. A file that exists
/// but is not valid JSON is treated as fatal rather than silently replaced.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached tokens. `Ok(None)` when nothing has been cached yet.
    pub async fn load(&self) -> Result<Option<serde_json::Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let tokens = serde_json::from_str(&content).map_err(|e| {
            GmailError::AuthError(format!(
                "Token cache {:?} is malformed ({}). Remove it or run `auth --force`",
                self.path, e
            ))
        })?;
        Ok(Some(tokens))
    }

    /// Remove the cache so the next authentication starts a fresh flow
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Removed token cache {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Restrict the cache file to its owner (0600) on Unix
    #[cfg(unix)]
    pub async fn secure(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        if !self.path.exists() {
            return Ok(());
        }
        let mut perms = tokio::fs::metadata(&self.path).await?.permissions();
        perms.set_mode(0o600);
        tokio::fs::set_permissions(&self.path, perms).await?;
        Ok(())
    }

    /// Windows relies on the ACLs of the user profile directory
    #[cfg(windows)]
    pub async fn secure(&self) -> Result<()> {
        Ok(())
    }
}

/// Load the configuration for `auth`, then drop the token cache when
/// `force` is set. A bad config file fails before the cache is touched.
pub async fn prepare_reauth(config_path: &Path, cache: &TokenCache, force: bool) -> Result<Config> {
    let config = Config::load(config_path).await?;
    if force {
        cache.clear().await?;
    }
    Ok(config)
}

/// Load the OAuth2 client secret.
///
/// Reads `credentials_path` when it exists, otherwise falls back to the
/// `GMAIL_CLIENT_ID` / `GMAIL_CLIENT_SECRET` environment variables.
pub async fn load_application_secret(credentials_path: &Path) -> Result<ApplicationSecret> {
    if credentials_path.exists() {
        return yup_oauth2::read_application_secret(credentials_path)
            .await
            .map_err(|e| GmailError::AuthError(format!("Failed to read credentials: {}", e)));
    }

    debug!(
        "Credentials file {:?} not found, trying environment",
        credentials_path
    );
    load_credentials_from_env().map_err(|e| {
        GmailError::AuthError(format!(
            "No credentials file at {:?} and {}",
            credentials_path, e
        ))
    })
}

/// Load OAuth2 credentials from environment variables
///
/// # Environment Variables
/// - `GMAIL_CLIENT_ID`: OAuth2 client ID
/// - `GMAIL_CLIENT_SECRET`: OAuth2 client secret
/// - `GMAIL_REDIRECT_URI`: Redirect URI (optional, defaults to http://localhost:8080)
pub fn load_credentials_from_env() -> Result<ApplicationSecret> {
    let client_id = env::var("GMAIL_CLIENT_ID")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_ID not set".to_string()))?;
    let client_secret = env::var("GMAIL_CLIENT_SECRET")
        .map_err(|_| GmailError::ConfigError("GMAIL_CLIENT_SECRET not set".to_string()))?;
    let redirect_uri =
        env::var("GMAIL_REDIRECT_URI").unwrap_or_else(|_| "http://localhost:8080".to_string());

    Ok(ApplicationSecret {
        client_id,
        client_secret,
        auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        redirect_uris: vec![redirect_uri],
        ..Default::default()
    })
}

/// Initialize Gmail API hub with OAuth2 authentication
///
/// The token cache is validated first so a corrupt cache aborts the run
/// instead of silently triggering a new browser flow. The authenticator then
/// persists refreshed tokens back to the same file.
pub async fn initialize_gmail_hub(secret: ApplicationSecret, cache: &TokenCache) -> Result<GmailHub> {
    if cache.load().await?.is_none() {
        warn!("No cached token at {:?}, starting browser authorization", cache.path());
    }
    cache.ensure_parent().await?;

    // HTTPRedirect opens a browser for user authorization
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(cache.path())
    .build()
    .await
    .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Pre-authenticate so the cached token carries the full mail scope
    let _token = auth
        .token(REQUIRED_SCOPES)
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to obtain token: {}", e)))?;

    cache.secure().await?;

    // HTTP/1 works better with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| GmailError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

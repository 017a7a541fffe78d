//! Session token lifecycle.
//!
//! MangaDex issues a short-lived session token together with a long-lived
//! refresh token. The session token is kept in memory only; the refresh token
//! is persisted so later runs can skip the password login.

use super::transport::{ApiRequest, Method, Transport};
use super::types::TokenResponse;
use crate::error::ApiError;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use shared::Config;
use std::env::VarError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LOGIN_ENDPOINT: &str = "auth/login";
const REFRESH_ENDPOINT: &str = "auth/refresh";

/// Where the session finds and stores its credentials
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// File holding the persisted refresh token
    pub token_file: PathBuf,
    /// Environment variable holding the username
    pub username_env: String,
    /// Environment variable holding the password
    pub password_env: String,
    /// Validity window of a freshly issued session token
    pub ttl: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token_file: config.token_file(),
            username_env: config.auth.username_env.clone(),
            password_env: config.auth.password_env.clone(),
            ttl: Duration::minutes(config.auth.session_ttl_minutes),
        }
    }

    fn credentials_from_env(&self) -> Result<(String, String), ApiError> {
        let read = |name: &str| {
            std::env::var(name).map_err(|e| match e {
                VarError::NotPresent => ApiError::MissingCredentials(name.to_string()),
                VarError::NotUnicode(_) => ApiError::InvalidCredentials(name.to_string()),
            })
        };
        Ok((read(&self.username_env)?, read(&self.password_env)?))
    }
}

/// Session token, refresh token and the session token's expiry
#[derive(Debug, Clone)]
pub struct Credentials {
    pub session_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// An authenticated MangaDex session
pub struct Session<T: Transport> {
    transport: T,
    settings: SessionSettings,
    credentials: Credentials,
}

impl<T: Transport> Session<T> {
    /// Authenticate, preferring the persisted refresh token over a password login
    ///
    /// On success the current refresh token is written to the token file.
    pub async fn obtain(transport: T, settings: SessionSettings) -> Result<Self, ApiError> {
        let credentials = match read_refresh_token(&settings.token_file)? {
            Some(refresh_token) => {
                info!(
                    token_file = %settings.token_file.display(),
                    "Resuming session from stored refresh token"
                );
                exchange(
                    &transport,
                    REFRESH_ENDPOINT,
                    json!({ "token": refresh_token }),
                    settings.ttl,
                )
                .await?
            }
            None => {
                let (username, password) = settings.credentials_from_env()?;
                info!(username = %username, "Logging in with password");
                exchange(
                    &transport,
                    LOGIN_ENDPOINT,
                    json!({ "username": username, "password": password }),
                    settings.ttl,
                )
                .await?
            }
        };

        let session = Self {
            transport,
            settings,
            credentials,
        };
        session.persist_refresh_token()?;
        Ok(session)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Exchange the refresh token for a new credential pair
    ///
    /// A rotated refresh token is written back to the token file.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        debug!("Refreshing session token");
        let fresh = exchange(
            &self.transport,
            REFRESH_ENDPOINT,
            json!({ "token": self.credentials.refresh_token }),
            self.settings.ttl,
        )
        .await?;

        let rotated = fresh.refresh_token != self.credentials.refresh_token;
        self.credentials = fresh;
        if rotated {
            self.persist_refresh_token()?;
        }
        Ok(())
    }

    /// Refresh the session token if it has expired
    ///
    /// Returns whether a refresh happened.
    pub async fn ensure_fresh(&mut self) -> Result<bool, ApiError> {
        if !self.credentials.is_expired(Utc::now()) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Send an authenticated request and return the JSON body
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.ensure_fresh().await?;

        let mut request = ApiRequest::new(method, endpoint)
            .with_query(query)
            .with_bearer(&self.credentials.session_token);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.transport.send(request).await
    }

    pub async fn get(
        &mut self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Value, ApiError> {
        self.request(Method::Get, endpoint, query, None).await
    }

    fn persist_refresh_token(&self) -> Result<(), ApiError> {
        let path = &self.settings.token_file;
        std::fs::write(path, &self.credentials.refresh_token).map_err(|source| {
            ApiError::TokenFile {
                path: path.clone(),
                source,
            }
        })?;
        debug!(token_file = %path.display(), "Refresh token saved");
        Ok(())
    }
}

/// Read the persisted refresh token; a missing or blank file means none
fn read_refresh_token(path: &Path) -> Result<Option<String>, ApiError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let token = content.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ApiError::TokenFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Run a login or refresh exchange and stamp the new pair with its expiry
async fn exchange<T: Transport>(
    transport: &T,
    endpoint: &str,
    body: Value,
    ttl: Duration,
) -> Result<Credentials, ApiError> {
    let value = transport
        .send(ApiRequest::new(Method::Post, endpoint).with_body(body))
        .await
        .map_err(|e| match e {
            ApiError::Status { status, body, .. } => {
                ApiError::Authentication(format!("{endpoint} returned HTTP {status}: {body}"))
            }
            other => other,
        })?;
    let issued_at = Utc::now();

    let response: TokenResponse = ApiError::decode(endpoint, value)?;
    if response.result != "ok" {
        return Err(ApiError::Authentication(format!(
            "{endpoint} returned result \"{}\"",
            response.result
        )));
    }
    let tokens = response.token.ok_or_else(|| {
        ApiError::Authentication(format!("{endpoint} response has no token pair"))
    })?;

    Ok(Credentials {
        session_token: tokens.session,
        refresh_token: tokens.refresh,
        expires_at: issued_at + ttl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{token_body, MockTransport};
    use tempfile::TempDir;

    fn settings(dir: &TempDir, user_env: &str) -> SessionSettings {
        SessionSettings {
            token_file: dir.path().join("refresh_token"),
            username_env: format!("{user_env}_USER"),
            password_env: format!("{user_env}_PWD"),
            ttl: Duration::minutes(15),
        }
    }

    fn auth_transport() -> MockTransport {
        let refreshes = std::sync::atomic::AtomicUsize::new(0);
        MockTransport::new(move |request| match request.endpoint.as_str() {
            "auth/login" => Ok(token_body("session-login", "refresh-login")),
            "auth/refresh" => {
                let n = refreshes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(token_body(&format!("session-{n}"), "refresh-stored"))
            }
            _ => Ok(json!({"result": "ok"})),
        })
    }

    #[tokio::test]
    async fn test_stored_token_skips_login() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_STORED");
        std::fs::write(&settings.token_file, "refresh-stored\n")?;

        let transport = auth_transport();
        let session = Session::obtain(transport.clone(), settings.clone()).await?;

        assert_eq!(transport.count("auth/login"), 0);
        assert_eq!(transport.count("auth/refresh"), 1);
        let sent = transport.requests_to("auth/refresh");
        assert_eq!(sent[0].body, Some(json!({"token": "refresh-stored"})));
        assert_eq!(session.credentials().session_token, "session-0");
        Ok(())
    }

    #[tokio::test]
    async fn test_login_from_env_persists_refresh_token() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_LOGIN");
        std::env::set_var("MDX_TEST_LOGIN_USER", "reader");
        std::env::set_var("MDX_TEST_LOGIN_PWD", "hunter2");

        let transport = auth_transport();
        let session = Session::obtain(transport.clone(), settings.clone()).await?;

        let sent = transport.requests_to("auth/login");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            Some(json!({"username": "reader", "password": "hunter2"}))
        );
        assert_eq!(std::fs::read_to_string(&settings.token_file)?, "refresh-login");

        let ttl = session.credentials().expires_at - Utc::now();
        assert!(ttl <= Duration::minutes(15) && ttl > Duration::minutes(14));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_env_credentials() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_ABSENT");

        let result = Session::obtain(auth_transport(), settings).await;
        assert!(matches!(result, Err(ApiError::MissingCredentials(name)) if name == "MDX_TEST_ABSENT_USER"));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_unicode_env_credentials() -> anyhow::Result<()> {
        use std::os::unix::ffi::OsStringExt;

        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_NONUTF8");
        std::env::set_var(
            "MDX_TEST_NONUTF8_USER",
            std::ffi::OsString::from_vec(vec![0x72, 0xff, 0x65]),
        );
        std::env::set_var("MDX_TEST_NONUTF8_PWD", "pw");

        let result = Session::obtain(auth_transport(), settings).await;
        assert!(matches!(result, Err(ApiError::InvalidCredentials(name)) if name == "MDX_TEST_NONUTF8_USER"));
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_token_file_falls_back_to_login() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_BLANK");
        std::fs::write(&settings.token_file, "  \n")?;
        std::env::set_var("MDX_TEST_BLANK_USER", "reader");
        std::env::set_var("MDX_TEST_BLANK_PWD", "pw");

        let transport = auth_transport();
        Session::obtain(transport.clone(), settings).await?;
        assert_eq!(transport.count("auth/login"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_authentication_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_REJECT");
        std::fs::write(&settings.token_file, "stale")?;

        let transport = MockTransport::new(|request| {
            Err(ApiError::Status {
                endpoint: request.endpoint.clone(),
                status: 401,
                body: r#"{"result":"error"}"#.to_string(),
            })
        });

        let result = Session::obtain(transport, settings).await;
        assert!(matches!(result, Err(ApiError::Authentication(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_error_result_is_authentication_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_ERRRESULT");
        std::fs::write(&settings.token_file, "stale")?;

        let transport = MockTransport::new(|_| Ok(json!({"result": "error", "errors": []})));

        let result = Session::obtain(transport, settings).await;
        assert!(matches!(result, Err(ApiError::Authentication(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_refreshes_once_before_request() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_EXPIRED");
        std::fs::write(&settings.token_file, "refresh-stored")?;

        let transport = auth_transport();
        let mut session = Session::obtain(transport.clone(), settings).await?;
        session.credentials.expires_at = Utc::now() - Duration::seconds(1);

        session.get("manga/status", Vec::new()).await?;

        let log = transport.requests();
        let endpoints: Vec<&str> = log.iter().map(|r| r.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["auth/refresh", "auth/refresh", "manga/status"]);
        assert_eq!(log[2].bearer.as_deref(), Some("session-1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_blocks_request() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_REFRESH_FAIL");
        std::fs::write(&settings.token_file, "refresh-stored")?;

        let refreshes = std::sync::atomic::AtomicUsize::new(0);
        let transport = MockTransport::new(move |request| match request.endpoint.as_str() {
            "auth/refresh" => {
                if refreshes.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Ok(token_body("session-0", "refresh-stored"))
                } else {
                    Err(ApiError::Status {
                        endpoint: request.endpoint.clone(),
                        status: 401,
                        body: "x".to_string(),
                    })
                }
            }
            _ => Ok(json!({"result": "ok"})),
        });
        let mut session = Session::obtain(transport.clone(), settings).await?;
        session.credentials.expires_at = Utc::now() - Duration::seconds(1);

        let result = session.get("manga/status", Vec::new()).await;

        assert!(matches!(result, Err(ApiError::Authentication(_))));
        assert_eq!(transport.count("auth/refresh"), 2);
        assert_eq!(transport.count("manga/status"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_fresh_session_does_not_refresh() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_FRESH");
        std::fs::write(&settings.token_file, "refresh-stored")?;

        let transport = auth_transport();
        let mut session = Session::obtain(transport.clone(), settings).await?;

        session.get("manga/status", Vec::new()).await?;
        session.get("rating", Vec::new()).await?;

        assert_eq!(transport.count("auth/refresh"), 1);
        assert!(transport
            .requests_to("rating")
            .iter()
            .all(|r| r.bearer.as_deref() == Some("session-0")));
        Ok(())
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_persisted() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let settings = settings(&dir, "MDX_TEST_ROTATE");
        std::fs::write(&settings.token_file, "refresh-old")?;

        let calls = std::sync::atomic::AtomicUsize::new(0);
        let transport = MockTransport::new(move |_| {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(token_body("session", &format!("refresh-{n}")))
        });

        let mut session = Session::obtain(transport, settings.clone()).await?;
        assert_eq!(std::fs::read_to_string(&settings.token_file)?, "refresh-0");

        session.refresh().await?;
        assert_eq!(std::fs::read_to_string(&settings.token_file)?, "refresh-1");
        Ok(())
    }
}

//! Remote file-store collaborator
//!
//! The sync engine only needs three calls against the server: list the
//! workspace, upload a file, fetch a file's bytes. [`HttpRemoteStore`] binds
//! them to the REST API with an explicit [`AuthSession`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::RemoteError;
use crate::sync_engine::types::{FileId, RemoteFileRecord};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Current server listing; never cached by callers.
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>, RemoteError>;

    async fn upload_file(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<(), RemoteError>;

    /// Full content of a file. Must fail instead of returning partial data.
    async fn download_file(&self, file_id: &FileId) -> Result<Vec<u8>, RemoteError>;
}

/// Logged-in user. Created by [`HttpRemoteStore::login`], ended by
/// [`HttpRemoteStore::logout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    session: AuthSession,
}

impl HttpRemoteStore {
    pub fn new(base_url: &str, session: AuthSession, timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = build_client(timeout)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{base_url}/auth/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let session: AuthSession = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Drop the session; the store is unusable afterwards.
    pub fn logout(self) -> AuthSession {
        self.session
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

fn build_client(timeout: Duration) -> Result<Client, RemoteError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Map non-2xx responses to errors carrying the server's message.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteError::Unauthorized);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| if text.is_empty() { format!("HTTP {}", status.as_u16()) } else { text });

    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>, RemoteError> {
        let response = self
            .client
            .get(self.url("/sync/files"))
            .bearer_auth(&self.session.token)
            .send()
            .await?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn upload_file(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<(), RemoteError> {
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/files"))
            .bearer_auth(&self.session.token)
            .multipart(form)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &FileId) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("/files/{file_id}")))
            .bearer_auth(&self.session.token)
            .send()
            .await?;

        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

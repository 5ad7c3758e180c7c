//! HTTP client for the hostlock server

use std::time::Duration;

use anyhow::{Context, bail};
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode, multipart};
use serde::Deserialize;
use tracing::debug;

/// Configuration for the save client
#[derive(Clone, Debug)]
pub struct SaveClientConfig {
    /// Server address, e.g. "http://127.0.0.1:8040"
    pub server_addr: String,
    /// Player name recorded as the lock holder
    pub player: String,
    /// Shared secret
    pub password: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl SaveClientConfig {
    pub fn new(server_addr: &str, player: &str, password: &str) -> Self {
        Self {
            server_addr: server_addr.trim_end_matches('/').to_string(),
            player: player.to_string(),
            password: password.to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 30000,
        }
    }

    /// Set timeouts
    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }
}

/// Result of a fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// We hold the lock now; persist the save and host the session
    Acquired { filename: String, content: Bytes },
    /// Someone else hosts; join without the save
    Locked { message: String },
}

/// JSON body of non-binary server responses
#[derive(Debug, Deserialize)]
struct ApiResult {
    #[allow(dead_code)]
    code: i32,
    message: String,
}

async fn response_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ApiResult>().await {
        Ok(result) => result.message,
        Err(_) => format!("server answered {}", status),
    }
}

/// HTTP client for fetch and submit
pub struct SaveClient {
    client: Client,
    config: SaveClientConfig,
}

impl SaveClient {
    pub fn new(config: SaveClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.server_addr, path)
    }

    fn credentials(&self) -> [(&'static str, &str); 2] {
        [
            ("who_are_you", self.config.player.as_str()),
            ("password", self.config.password.as_str()),
        ]
    }

    /// Download the save, acquiring the lock on success.
    pub async fn fetch_save(&self) -> anyhow::Result<FetchOutcome> {
        let response = self
            .client
            .get(self.url("/api/save"))
            .query(&self.credentials())
            .send()
            .await
            .context("fetch request failed")?;

        match response.status() {
            StatusCode::OK => {
                let filename = response
                    .headers()
                    .get("Save-Filename")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("save.bin")
                    .to_string();
                let content = response.bytes().await.context("reading save body")?;
                debug!(file = %filename, size = content.len(), "Save downloaded");
                Ok(FetchOutcome::Acquired { filename, content })
            }
            StatusCode::CONFLICT => Ok(FetchOutcome::Locked {
                message: response_message(response).await,
            }),
            StatusCode::FORBIDDEN => bail!("wrong password: {}", response_message(response).await),
            StatusCode::NOT_FOUND => bail!("no save available: {}", response_message(response).await),
            status => bail!(
                "fetch failed ({}): {}",
                status,
                response_message(response).await
            ),
        }
    }

    /// Upload a new save, releasing the lock on success.
    pub async fn submit_save(&self, filename: &str, content: Vec<u8>) -> anyhow::Result<()> {
        let part = multipart::Part::bytes(content).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/save"))
            .query(&self.credentials())
            .multipart(form)
            .send()
            .await
            .context("submit request failed")?;

        match response.status() {
            StatusCode::OK => {
                debug!(file = %filename, "Save uploaded");
                Ok(())
            }
            StatusCode::CONFLICT => bail!(
                "upload refused, lock not held: {}",
                response_message(response).await
            ),
            StatusCode::FORBIDDEN => bail!("wrong password: {}", response_message(response).await),
            status => bail!(
                "submit failed ({}): {}",
                status,
                response_message(response).await
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_normalizes_trailing_slash() {
        let config = SaveClientConfig::new("http://example.org:8040/", "alice", "pw");
        assert_eq!(config.server_addr, "http://example.org:8040");

        let client = SaveClient::new(config).unwrap();
        assert_eq!(client.url("/api/save"), "http://example.org:8040/api/save");
    }

    #[test]
    fn test_api_result_parsing() {
        let json = r#"{"code":20001,"message":"Cannot download as save is locked by bob","data":"bob"}"#;
        let result: ApiResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.code, 20001);
        assert!(result.message.contains("bob"));
    }
}

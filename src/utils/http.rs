// src/utils/http.rs

//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetchConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Minimal transport used by the page fetcher.
///
/// Implementations must report a request timeout as [`AppError::Timeout`]
/// and every other transport or status failure as [`AppError::Network`].
#[async_trait]
pub trait HttpGet: Send + Sync {
    /// GET `url` and return the response body as text.
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl HttpGet for Client {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(url, e))?;
        response.text().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::timeout(url)
    } else {
        AppError::network(url, error)
    }
}

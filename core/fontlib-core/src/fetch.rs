//! Remote stylesheet and font file retrieval (made by fontlib)

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;

/// Desktop browser identity; the Google Fonts API serves `woff2` sources only
/// to clients it recognises as modern browsers.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("empty body")]
    EmptyBody,
}

/// Source of remote stylesheets and font files.
pub trait Fetcher: Send + Sync {
    /// GET `url` as text; any failure or non-200 status yields an empty string.
    fn fetch_text(&self, url: &str) -> String;

    /// GET `url` as bytes for storing a font file.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
///
/// A client is built per call so the fetcher can be created and dropped from
/// async contexts; calls themselves must run on a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }

    fn client(&self) -> Result<Client, FetchError> {
        Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> String {
        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                warn!("cannot build HTTP client: {err}");
                return String::new();
            }
        };

        let response = match client.get(url).send() {
            Ok(response) => response,
            Err(err) => {
                warn!("stylesheet request to {url} failed: {err}");
                return String::new();
            }
        };

        if response.status() != StatusCode::OK {
            warn!("stylesheet request to {url} returned {}", response.status());
            return String::new();
        }

        match response.text() {
            Ok(body) => {
                debug!("fetched {} bytes of CSS from {url}", body.len());
                body
            }
            Err(err) => {
                warn!("reading stylesheet body from {url} failed: {err}");
                String::new()
            }
        }
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client()?
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(bytes.to_vec())
    }
}

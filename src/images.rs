//! Client for the remote card-image store.
//!
//! Card artwork lives outside the server; catalog entries only carry an
//! `image_id`. The store is addressed by a base URL from the environment:
//! - `CITADELLE_IMAGE_BASE_URL` - e.g. `https://cdn.example.com/cards`
//!
//! When the variable is unset the store is disabled and image lookups fail
//! with [`ImageError::Disabled`]; the catalog itself works fine without it.

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Image store errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image store is not configured")]
    Disabled,

    #[error("image not found: {0}")]
    NotFound(String),

    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches card artwork by image id.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_url: Option<String>,
    client: Client,
}

impl ImageStore {
    /// Create a store from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CITADELLE_IMAGE_BASE_URL").ok(),
            client: Client::new(),
        }
    }

    /// Create a store pointing at a specific base URL (for testing).
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: Some(url.into()),
            client: Client::new(),
        }
    }

    /// Create a disabled store.
    pub fn disabled() -> Self {
        Self {
            base_url: None,
            client: Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Fetch the PNG bytes for an image id.
    pub async fn fetch(&self, image_id: &str) -> Result<Vec<u8>, ImageError> {
        let base = self.base_url.as_deref().ok_or(ImageError::Disabled)?;
        let url = format!("{}/{}.png", base.trim_end_matches('/'), image_id);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound(image_id.to_string()));
        }

        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

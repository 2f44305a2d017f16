//! # Spotify Integration Module
//!
//! Thin client over the parts of the Spotify Web API that dailysong needs:
//!
//! ```text
//! Pipeline (crate::pipeline)
//!          ↓
//! Spotify Integration Layer
//!     ├── auth             authorize URL, redirect parsing, code exchange
//!     ├── profile          token probe (GET /me)
//!     ├── tracks           top tracks, recently played, audio features
//!     └── recommendations  seed derivation and GET /recommendations
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Status mapping
//!
//! Every data request goes through [`SpotifyClient::get_json`], which maps
//! HTTP statuses onto the crate error taxonomy:
//! - `401` → [`Error::AuthExpired`], the caller must force re-authentication
//! - any other non-success status → [`Error::Api`]
//! - connection failures → [`Error::Transport`]
//!
//! Nothing in this module touches the credential store or decides about
//! navigation; that is the job of [`crate::pipeline::Pipeline`].
//!
//! ## Timeouts
//!
//! No request timeout is configured beyond reqwest's defaults.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{Error, Result},
};

pub mod auth;
pub mod profile;
pub mod recommendations;
pub mod tracks;

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Authenticated `GET` of `path` with `query`, decoded as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        log::debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        log::debug!("GET {} -> {}", url, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthExpired(path.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

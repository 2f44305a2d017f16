//! # CLI Module
//!
//! User-facing commands. Each command builds on a [`Context`], runs one
//! operation and reports the outcome with exactly one status line; failures
//! are reported through [`Error::user_message`] and end the process with a
//! non-zero exit code.
//!
//! ## Commands
//!
//! - [`auth`] / [`complete_auth`] / [`logout`] - connect and disconnect Spotify
//! - [`status`] - probe the stored token
//! - [`top`] / [`recent`] - listening history tables
//! - [`recommend`] - the full recommendation pipeline
//! - [`phone`] - store the phone number for daily delivery
//! - [`daily`] - run the pipeline every day at a fixed time
//!
//! ```bash
//! dailysong auth                 # connect with Spotify
//! dailysong recommend            # today's song, with an explanation
//! dailysong top --window short   # what you have been playing lately
//! ```

use std::sync::Arc;

use crate::{
    annotate::{Annotator, ChatAnnotator, FeatureAnnotator},
    config::Config,
    error::Error,
    management::{CredentialStore, FileStore, TokenManager},
    pipeline::{Pipeline, PipelineOptions},
    spotify::SpotifyClient,
    types::TimeRange,
};

mod auth;
mod daily;
mod phone;
mod recommend;
mod status;
mod tracks;

pub use auth::auth;
pub use auth::complete_auth;
pub use auth::logout;
pub use daily::daily;
pub use phone::phone;
pub use recommend::recommend;
pub use status::status;
pub use tracks::recent;
pub use tracks::top;

/// Which annotator explains the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AnnotateMode {
    None,
    #[default]
    Features,
    Chat,
}

/// Everything a command needs, wired around one credential store.
pub struct Context {
    pub config: Config,
    pub client: SpotifyClient,
    pub tokens: TokenManager,
}

impl Context {
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Self {
        let client = SpotifyClient::new(&config);
        Self {
            config,
            client,
            tokens: TokenManager::new(store),
        }
    }

    /// Context backed by the user's file store.
    pub fn from_config(config: Config) -> Self {
        let store = Arc::new(FileStore::new(FileStore::default_path()));
        Self::new(config, store)
    }

    pub fn options(&self, window: Option<TimeRange>) -> PipelineOptions {
        PipelineOptions::from_config(&self.config).with_window(window.unwrap_or_default())
    }

    pub fn pipeline_with(&self, options: PipelineOptions) -> Pipeline {
        Pipeline::new(self.client.clone(), self.tokens.clone(), options)
    }

    pub fn pipeline(&self, window: Option<TimeRange>) -> Pipeline {
        self.pipeline_with(self.options(window))
    }

    pub fn annotator(&self, mode: AnnotateMode) -> Option<Box<dyn Annotator>> {
        match mode {
            AnnotateMode::None => None,
            AnnotateMode::Features => Some(Box::new(FeatureAnnotator::new(self.client.clone()))),
            AnnotateMode::Chat => {
                if self.config.chat.api_key.is_none() {
                    crate::warning!("OPENAI_API_KEY is not set, explanations will be generic.");
                }
                Some(Box::new(ChatAnnotator::new(self.config.chat.clone())))
            }
        }
    }
}

/// Prints the one notification for `err` and exits.
pub fn fail(err: &Error) -> ! {
    log::debug!("command failed: {:?}", err);
    crate::error!("{}", err.user_message())
}

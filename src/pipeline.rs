//! Top-level controller of a recommendation run.
//!
//! ```text
//! credential store → probe → top tracks → seeds → recommendation → annotation
//! ```
//!
//! Stages run strictly in that order, each only after its predecessor
//! succeeded. Every authentication failure on the way clears the credential
//! store and leaves the controller `Unauthenticated`; nothing is retried.

use std::sync::Mutex;

use crate::{
    annotate::{AnnotationRequest, Annotator},
    config::{Config, SeedEncoding},
    error::{Error, Result},
    management::{AuthEvent, AuthMachine, AuthState, FailureReason, TokenManager},
    spotify::{
        SpotifyClient,
        profile::{self, ProbeOutcome},
        recommendations, tracks,
    },
    types::{Profile, Recommendation, SessionToken, TimeRange, Track},
};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub window: TimeRange,
    pub history_limit: u32,
    pub market: Option<String>,
    pub seed_encoding: SeedEncoding,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window: TimeRange::default(),
            history_limit: config.history_limit,
            market: config.market.clone(),
            seed_encoding: config.seed_encoding,
        }
    }

    pub fn with_window(mut self, window: TimeRange) -> Self {
        self.window = window;
        self
    }
}

pub struct Pipeline {
    client: SpotifyClient,
    tokens: TokenManager,
    options: PipelineOptions,
    machine: Mutex<AuthMachine>,
    in_flight: tokio::sync::Mutex<()>,
}

impl Pipeline {
    pub fn new(client: SpotifyClient, tokens: TokenManager, options: PipelineOptions) -> Self {
        Self {
            client,
            tokens,
            options,
            machine: Mutex::new(AuthMachine::new()),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn state(&self) -> AuthState {
        self.machine
            .lock()
            .map(|m| m.state().clone())
            .unwrap_or_default()
    }

    pub(crate) fn transition(&self, event: AuthEvent) {
        if let Ok(mut machine) = self.machine.lock() {
            machine.apply(event);
        }
    }

    /// Confirms the stored token still works and returns the user's profile.
    ///
    /// # Errors
    ///
    /// - [`Error::TokenAbsent`] when nothing is stored
    /// - [`Error::TokenInvalid`] on 401/403; the store is cleared
    /// - [`Error::Transport`] when the probe could not complete; the token is kept
    pub async fn validate(&self) -> Result<Profile> {
        let _guard = self.in_flight.try_lock().map_err(|_| Error::Busy)?;
        let result = self.validate_token().await.map(|(_, profile)| profile);
        self.settle(result).await
    }

    /// Runs the whole pipeline once and returns the recommendation.
    ///
    /// Annotation failures never abort the run.
    pub async fn run(&self, annotator: Option<&dyn Annotator>) -> Result<Recommendation> {
        let _guard = self.in_flight.try_lock().map_err(|_| Error::Busy)?;
        let result = self.run_stages(annotator).await;
        self.settle(result).await
    }

    /// Only the history stage, for listing top tracks.
    pub async fn top_tracks(&self) -> Result<Vec<Track>> {
        let _guard = self.in_flight.try_lock().map_err(|_| Error::Busy)?;
        let result = async {
            let (token, _) = self.validate_token().await?;
            tracks::fetch_top_tracks(
                &self.client,
                &token.access_token,
                self.options.window,
                self.options.history_limit,
            )
            .await
        }
        .await;
        self.settle(result).await
    }

    pub async fn recently_played(&self, limit: u32) -> Result<Vec<Track>> {
        let _guard = self.in_flight.try_lock().map_err(|_| Error::Busy)?;
        let result = async {
            let (token, _) = self.validate_token().await?;
            tracks::fetch_recently_played(&self.client, &token.access_token, limit).await
        }
        .await;
        self.settle(result).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.tokens.clear().await?;
        self.transition(AuthEvent::Logout);
        Ok(())
    }

    async fn validate_token(&self) -> Result<(SessionToken, Profile)> {
        let token = self.tokens.require().await?;
        self.transition(AuthEvent::TokenReceived);

        if token.is_expired() {
            log::info!("stored token passed its expiry estimate");
            return Err(Error::TokenInvalid);
        }

        match profile::probe(&self.client, &token.access_token).await {
            ProbeOutcome::Valid(profile) => {
                self.transition(AuthEvent::ProbeSucceeded);
                Ok((token, profile))
            }
            ProbeOutcome::Invalid => Err(Error::TokenInvalid),
            ProbeOutcome::TransportError(e) => Err(Error::Transport(e)),
        }
    }

    async fn run_stages(&self, annotator: Option<&dyn Annotator>) -> Result<Recommendation> {
        let (token, _) = self.validate_token().await?;

        let history = tracks::fetch_top_tracks(
            &self.client,
            &token.access_token,
            self.options.window,
            self.options.history_limit,
        )
        .await?;

        let seeds = recommendations::derive_seeds(&history)?;
        log::debug!("derived {} seeds", seeds.len());

        let track = recommendations::resolve_recommendation(
            &self.client,
            &token.access_token,
            &seeds,
            self.options.market.as_deref(),
            self.options.seed_encoding,
        )
        .await?;

        let annotation = match annotator {
            Some(annotator) => Some(
                annotator
                    .annotate(AnnotationRequest {
                        track: &track,
                        history: &history,
                        access_token: &token.access_token,
                    })
                    .await,
            ),
            None => None,
        };

        Ok(Recommendation { track, annotation })
    }

    /// Applies the propagation policy to a finished run.
    pub(crate) async fn settle<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth_failure() {
                if let Err(store_err) = self.tokens.clear().await {
                    log::error!("failed to clear credentials: {}", store_err);
                }
                let reason = match e {
                    Error::TokenInvalid => FailureReason::TokenInvalid,
                    Error::StateMismatch => FailureReason::StateMismatch,
                    Error::MissingCredential => FailureReason::MissingCredential,
                    Error::AuthorizationDenied(r) => FailureReason::Denied(r.clone()),
                    _ => FailureReason::AuthExpired,
                };
                if let Ok(mut machine) = self.machine.lock() {
                    machine.fail(reason);
                }
            } else if matches!(e, Error::TokenAbsent) {
                self.transition(AuthEvent::Logout);
            }
        }
        result
    }
}

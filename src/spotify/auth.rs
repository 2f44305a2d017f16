use std::collections::HashMap;

use url::Url;

use crate::{
    config::{AuthFlowKind, Config},
    error::{Error, Result},
    management::TokenManager,
    spotify::SpotifyClient,
    types::{SessionToken, TokenResponse},
    utils,
};

/// Where to send the user, and the nonce that has to come back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Credential material returned by the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectPayload {
    /// Raw fragment without the leading `#`, token flow.
    Fragment(String),
    /// Raw query string without the leading `?`, code flow.
    Query(String),
}

impl RedirectPayload {
    /// Splits a full redirect URL into its payload and the URL with the
    /// credential material stripped.
    ///
    /// A non-empty fragment wins over the query string.
    pub fn from_url(redirect: &str) -> Result<(RedirectPayload, String)> {
        let mut url = Url::parse(redirect.trim())
            .map_err(|e| Error::Config(format!("invalid redirect URL: {}", e)))?;

        let payload = match (url.fragment(), url.query()) {
            (Some(fragment), _) if !fragment.is_empty() => {
                RedirectPayload::Fragment(fragment.to_string())
            }
            (_, Some(query)) => RedirectPayload::Query(query.to_string()),
            _ => RedirectPayload::Query(String::new()),
        };

        url.set_fragment(None);
        url.set_query(None);
        Ok((payload, url.to_string()))
    }

    fn params(&self) -> HashMap<String, String> {
        let raw = match self {
            RedirectPayload::Fragment(raw) | RedirectPayload::Query(raw) => raw,
        };
        url::form_urlencoded::parse(raw.trim_start_matches(['#', '?']).as_bytes())
            .into_owned()
            .collect()
    }
}

/// What a completed authorization produced.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: SessionToken,
}

/// Drives the redirect-based OAuth handshake.
pub struct AuthFlow {
    config: Config,
    client: SpotifyClient,
    tokens: TokenManager,
}

impl AuthFlow {
    pub fn new(config: Config, client: SpotifyClient, tokens: TokenManager) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    pub fn flow(&self) -> AuthFlowKind {
        self.config.flow
    }

    /// Generates a fresh nonce (and PKCE verifier for the code flow), stores
    /// them in place of any stale attempt, and builds the authorization URL.
    pub async fn begin_authorization(&self) -> Result<AuthorizationRequest> {
        let state = utils::generate_state();
        let verifier = match self.config.flow {
            AuthFlowKind::Code => Some(utils::generate_code_verifier()),
            AuthFlowKind::Token => None,
        };

        self.tokens.begin_attempt(&state, verifier.as_deref()).await?;

        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.config.client_id.clone()),
            ("response_type", self.config.flow.response_type().to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("scope", self.config.scope()),
            ("state", state.clone()),
        ];
        if let Some(verifier) = &verifier {
            params.push(("code_challenge", utils::generate_code_challenge(verifier)));
            params.push(("code_challenge_method", "S256".to_string()));
        }

        let url = Url::parse_with_params(&self.config.auth_url, &params)
            .map_err(|e| Error::Config(format!("SPOTIFY_API_AUTH_URL: {}", e)))?;

        log::info!("authorization started ({} flow)", self.config.flow.response_type());
        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
        })
    }

    /// Validates the redirect and commits the resulting token.
    ///
    /// The pending nonce is consumed before anything else, so it can never be
    /// used twice. Authorization failures also drop any previously stored
    /// token.
    pub async fn complete_authorization(&self, payload: &RedirectPayload) -> Result<AuthOutcome> {
        let pending = self.tokens.take_attempt().await?;

        match self.accept(payload, pending.state, pending.code_verifier).await {
            Ok(token) => {
                self.tokens.commit(&token).await?;
                log::info!("authorization completed");
                Ok(AuthOutcome { token })
            }
            Err(e) => {
                if e.is_auth_failure() {
                    self.tokens.clear().await?;
                }
                log::warn!("authorization failed: {}", e);
                Err(e)
            }
        }
    }

    async fn accept(
        &self,
        payload: &RedirectPayload,
        stored_state: Option<String>,
        verifier: Option<String>,
    ) -> Result<SessionToken> {
        let params = payload.params();

        if !utils::state_matches(
            stored_state.as_deref(),
            params.get("state").map(String::as_str),
        ) {
            return Err(Error::StateMismatch);
        }

        if let Some(error) = params.get("error") {
            return Err(Error::AuthorizationDenied(error.clone()));
        }

        match payload {
            RedirectPayload::Fragment(_) => {
                let access_token = params
                    .get("access_token")
                    .filter(|t| !t.is_empty())
                    .ok_or(Error::MissingCredential)?;
                let expires_in = params.get("expires_in").and_then(|v| v.parse().ok());
                Ok(SessionToken::bearer(access_token.clone(), expires_in)
                    .with_scope(params.get("scope").cloned()))
            }
            RedirectPayload::Query(_) => {
                let code = params
                    .get("code")
                    .filter(|c| !c.is_empty())
                    .ok_or(Error::MissingCredential)?;
                let verifier = verifier.ok_or(Error::MissingCredential)?;
                self.exchange_code_pkce(code, &verifier).await
            }
        }
    }

    async fn exchange_code_pkce(&self, code: &str, verifier: &str) -> Result<SessionToken> {
        let response = self
            .client
            .http()
            .post(self.client.token_url())
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(Error::AuthorizationDenied(format!(
                "token exchange rejected with {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                endpoint: "token".to_string(),
            });
        }

        let json: TokenResponse = response.json().await?;
        if json.access_token.is_empty() {
            return Err(Error::MissingCredential);
        }

        Ok(SessionToken::bearer(json.access_token, json.expires_in).with_scope(json.scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_fragment() {
        let (payload, clean) = RedirectPayload::from_url(
            "http://127.0.0.1:8888/callback#access_token=abc&token_type=Bearer&state=xyz",
        )
        .unwrap();
        assert_eq!(
            payload,
            RedirectPayload::Fragment("access_token=abc&token_type=Bearer&state=xyz".into())
        );
        assert_eq!(clean, "http://127.0.0.1:8888/callback");
    }

    #[test]
    fn test_from_url_query() {
        let (payload, clean) =
            RedirectPayload::from_url("http://127.0.0.1:8888/callback?code=c0de&state=xyz").unwrap();
        assert_eq!(payload, RedirectPayload::Query("code=c0de&state=xyz".into()));
        assert!(!clean.contains("code"));
    }

    #[test]
    fn test_params_are_decoded() {
        let payload = RedirectPayload::Fragment("access_token=a%2Bb&state=s%3D".into());
        let params = payload.params();
        assert_eq!(params.get("access_token").map(String::as_str), Some("a+b"));
        assert_eq!(params.get("state").map(String::as_str), Some("s="));
    }
}

use reqwest::StatusCode;

use crate::{spotify::SpotifyClient, types::Profile};

/// Result of probing a token against `GET /me`.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    Valid(Profile),
    /// 401 or 403: the token will not work again.
    Invalid,
    /// The probe could not be completed. Says nothing about the token.
    TransportError(String),
}

/// Checks whether `token` is usable with a minimal authenticated request.
pub async fn probe(client: &SpotifyClient, token: &str) -> ProbeOutcome {
    let url = client.endpoint("me");
    let response = match client.http().get(&url).bearer_auth(token).send().await {
        Ok(r) => r,
        Err(e) => return ProbeOutcome::TransportError(e.to_string()),
    };

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProbeOutcome::Invalid,
        status if status.is_success() => match response.json::<Profile>().await {
            Ok(profile) => ProbeOutcome::Valid(profile),
            Err(e) => ProbeOutcome::TransportError(e.to_string()),
        },
        status => ProbeOutcome::TransportError(format!("unexpected status {}", status)),
    }
}

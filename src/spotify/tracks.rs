use crate::{
    error::{Error, Result},
    spotify::SpotifyClient,
    types::{AudioFeatures, RecentlyPlayedResponse, TimeRange, TopTracksResponse, Track},
};

/// Retrieves the user's top tracks for `window`, in the service's ranking
/// order.
///
/// # Arguments
///
/// * `client` - the Spotify client
/// * `token` - bearer token of the session
/// * `window` - ranking window (`time_range`)
/// * `limit` - number of tracks, clamped to 1..=50
///
/// # Example
///
/// ```rust,ignore
/// let tracks = fetch_top_tracks(&client, &token.access_token, TimeRange::ShortTerm, 20).await?;
/// let seeds = derive_seeds(&tracks)?;
/// ```
///
/// # Errors
///
/// - [`Error::EmptyHistory`] when the service returns no items
/// - [`Error::AuthExpired`] on 401; the caller must force re-authentication
/// - [`Error::Transport`] / [`Error::Api`] for everything else
pub async fn fetch_top_tracks(
    client: &SpotifyClient,
    token: &str,
    window: TimeRange,
    limit: u32,
) -> Result<Vec<Track>> {
    let query = [
        ("time_range", window.as_str().to_string()),
        ("limit", limit.clamp(1, 50).to_string()),
    ];
    let response: TopTracksResponse = client.get_json(token, "me/top/tracks", &query).await?;

    if response.items.is_empty() {
        return Err(Error::EmptyHistory);
    }

    log::info!(
        "fetched {} top tracks for {}",
        response.items.len(),
        window
    );
    Ok(response.items)
}

/// Most recently played tracks, newest first. An empty list is not an error.
///
/// # Arguments
///
/// * `limit` - number of plays, clamped to 1..=50
pub async fn fetch_recently_played(
    client: &SpotifyClient,
    token: &str,
    limit: u32,
) -> Result<Vec<Track>> {
    let query = [("limit", limit.clamp(1, 50).to_string())];
    let response: RecentlyPlayedResponse = client
        .get_json(token, "me/player/recently-played", &query)
        .await?;

    Ok(response.items.into_iter().map(|item| item.track).collect())
}

/// Audio features (energy, valence, tempo, ...) of one track.
///
/// Fails with [`Error::Api`] when the service has no analysis for the track;
/// callers that only decorate output should fall back to
/// [`AudioFeatures::default`].
pub async fn fetch_audio_features(
    client: &SpotifyClient,
    token: &str,
    track_id: &str,
) -> Result<AudioFeatures> {
    client
        .get_json(token, &format!("audio-features/{}", track_id), &[])
        .await
}

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::Error;

/// Access token of the current Spotify session, as persisted in the
/// credential store.
///
/// Timestamps are Unix seconds. `expires_at` is an estimate derived from the
/// `expires_in` hint at the time the token was received; tokens without a
/// hint are only ever invalidated by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub scope: Option<String>,
    pub expires_at: Option<u64>,
    pub obtained_at: u64,
}

impl SessionToken {
    /// Creates a bearer token obtained now.
    ///
    /// # Arguments
    ///
    /// * `access_token` - the opaque token issued by the authorization server
    /// * `expires_in` - lifetime in seconds as reported by the server; a value
    ///   too large to represent is treated as no expiry hint
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let token = SessionToken::bearer("BQD...", Some(3600));
    /// assert!(!token.is_expired());
    /// ```
    pub fn bearer(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        let obtained_at = Utc::now().timestamp() as u64;
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            scope: None,
            expires_at: expires_in.and_then(|secs| obtained_at.checked_add(secs)),
            obtained_at,
        }
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope.filter(|s| !s.is_empty());
        self
    }

    /// Tokens without an expiry hint are never considered expired locally.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp() as u64)
    }
}

/// Body of a successful authorization-code exchange at the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Window over which Spotify computes a user's top items.
///
/// Parses from `short`, `medium`, `long` or the API spelling (`short_term`,
/// ...), so it can be used directly as a command-line value.
///
/// | Variant | API value | Roughly |
/// |---|---|---|
/// | `ShortTerm` | `short_term` | last 4 weeks |
/// | `MediumTerm` | `medium_term` | last 6 months |
/// | `LongTerm` | `long_term` | all time |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" | "short_term" => Ok(TimeRange::ShortTerm),
            "medium" | "medium_term" => Ok(TimeRange::MediumTerm),
            "long" | "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "unknown time range '{}', expected short, medium or long",
                other
            )),
        }
    }
}

/// Track object as returned by the Spotify Web API, reduced to the fields
/// dailysong shows or seeds with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<TrackArtist>,
    pub album: TrackAlbum,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Track {
    /// All artist names joined with `", "`, e.g. `"Massive Attack, Horace Andy"`.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    /// Largest album image; the service lists them by descending resolution.
    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedResponse {
    #[serde(default)]
    pub items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistoryItem {
    pub track: Track,
    #[serde(default)]
    pub played_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioFeatures {
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl Default for AudioFeatures {
    fn default() -> Self {
        Self {
            energy: 0.6,
            valence: 0.5,
            tempo: 120.0,
            danceability: 0.5,
            acousticness: 0.3,
            instrumentalness: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Outcome of one pipeline run: the recommended track and, when an
/// annotator ran, the explanation for it.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub track: Track,
    pub annotation: Option<String>,
}

/// One row of the `top` / `recent` tables.
#[derive(Tabled)]
pub struct TrackTableRow {
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub album: String,
}

impl TrackTableRow {
    /// Converts tracks into table rows, ranked from 1 in input order.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let rows = TrackTableRow::from_tracks(&tracks);
    /// println!("{}", tabled::Table::new(rows));
    /// ```
    pub fn from_tracks(tracks: &[Track]) -> Vec<TrackTableRow> {
        tracks
            .iter()
            .enumerate()
            .map(|(i, t)| TrackTableRow {
                rank: i + 1,
                name: t.name.clone(),
                artists: t.artist_names(),
                album: t.album.name.clone(),
            })
            .collect()
    }
}

/// Phone number for daily delivery, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validates a user-entered phone number.
    ///
    /// # Arguments
    ///
    /// * `raw` - the number as typed; surrounding whitespace is ignored
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPhoneNumber`] when the number is shorter than 10
    /// characters or contains anything but digits, spaces and `+-()`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let phone = PhoneNumber::parse("+1 (555) 123-4567")?;
    /// assert_eq!(phone.as_str(), "+1 (555) 123-4567");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.chars().count() < 10 {
            return Err(Error::InvalidPhoneNumber(
                "must be at least 10 digits".to_string(),
            ));
        }
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')');
        if !raw.chars().all(allowed) {
            return Err(Error::InvalidPhoneNumber("invalid format".to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_expiry() {
        let mut token = SessionToken::bearer("abc", Some(3600));
        assert_eq!(token.token_type, "Bearer");
        assert!(!token.is_expired());

        token.expires_at = Some(token.obtained_at);
        assert!(token.is_expired_at(token.obtained_at));

        let open = SessionToken::bearer("abc", None);
        assert!(!open.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_huge_lifetime_is_no_expiry() {
        let token = SessionToken::bearer("abc", Some(u64::MAX));
        assert_eq!(token.expires_at, None);
        assert!(!token.is_expired());

        let long = SessionToken::bearer("abc", Some(u64::MAX - token.obtained_at));
        assert_eq!(long.expires_at, Some(u64::MAX));
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!("short".parse::<TimeRange>(), Ok(TimeRange::ShortTerm));
        assert_eq!("medium_term".parse::<TimeRange>(), Ok(TimeRange::MediumTerm));
        assert_eq!("LONG".parse::<TimeRange>(), Ok(TimeRange::LongTerm));
        assert!("yearly".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::default().as_str(), "medium_term");
    }

    #[test]
    fn test_track_deserialize_keeps_id_and_image_order() {
        let json = r#"{
            "id": "3n3Ppam7vgaVa1iaRUc9Lp",
            "name": "Mr. Brightside",
            "artists": [{"id": "0C0XlULifJtAgn6ZNCW2eu", "name": "The Killers"}],
            "album": {"name": "Hot Fuss", "images": [
                {"url": "https://i.scdn.co/large", "width": 640, "height": 640},
                {"url": "https://i.scdn.co/small", "width": 64, "height": 64}
            ]},
            "preview_url": null,
            "external_urls": {"spotify": "https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp"}
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.id, "3n3Ppam7vgaVa1iaRUc9Lp");
        assert_eq!(track.cover_url(), Some("https://i.scdn.co/large"));
        assert_eq!(track.primary_artist(), Some("The Killers"));
        assert!(track.preview_url.is_none());
    }

    #[test]
    fn test_phone_number_validation() {
        assert!(PhoneNumber::parse("+1 (555) 123-4567").is_ok());
        assert!(PhoneNumber::parse("12345").is_err());
        assert!(PhoneNumber::parse("555-123-abcd").is_err());
    }
}

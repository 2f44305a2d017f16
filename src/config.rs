//! Configuration management for dailysong.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Unlike a one-shot script, nothing here panics on a missing value; every
//! problem is reported as [`Error::Config`].

use std::{env, path::PathBuf, str::FromStr};

use chrono::NaiveTime;

use crate::error::{Error, Result};

/// Scopes requested on every authorization: profile, top items and
/// recently played.
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-top-read",
    "user-read-recently-played",
];

/// Requested in addition to [`SCOPES`] when `SPOTIFY_API_EXTENDED_SCOPES` is set.
pub const EXTENDED_SCOPES: &[&str] = &[
    "playlist-modify-public",
    "playlist-modify-private",
    "user-read-currently-playing",
];

const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Where the credential comes back in the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFlowKind {
    /// Implicit grant: `#access_token=..` in the fragment.
    #[default]
    Token,
    /// Authorization code with PKCE: `?code=..` in the query string.
    Code,
}

impl AuthFlowKind {
    pub fn response_type(&self) -> &'static str {
        match self {
            AuthFlowKind::Token => "token",
            AuthFlowKind::Code => "code",
        }
    }
}

impl FromStr for AuthFlowKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" | "implicit" => Ok(AuthFlowKind::Token),
            "code" | "pkce" => Ok(AuthFlowKind::Code),
            other => Err(format!("unknown auth flow '{}'", other)),
        }
    }
}

/// How seed ids are put on the wire for `/recommendations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedEncoding {
    /// `seed_tracks=a,b,c`
    #[default]
    Delimited,
    /// `seed_tracks=a&seed_tracks=b&seed_tracks=c`
    Repeated,
}

impl FromStr for SeedEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delimited" | "csv" => Ok(SeedEncoding::Delimited),
            "repeated" | "list" => Ok(SeedEncoding::Repeated),
            other => Err(format!("unknown seed encoding '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    pub server_addr: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub flow: AuthFlowKind,
    pub extended_scopes: bool,
    pub market: Option<String>,
    pub seed_encoding: SeedEncoding,
    pub history_limit: u32,
    pub auth_wait_secs: u64,
    pub daily_at: NaiveTime,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub url: String,
    pub model: String,
}

impl Config {
    /// A configuration with all defaults and the given client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            flow: AuthFlowKind::default(),
            extended_scopes: false,
            market: None,
            seed_encoding: SeedEncoding::default(),
            history_limit: 20,
            auth_wait_secs: 120,
            daily_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            chat: ChatConfig {
                api_key: None,
                url: DEFAULT_CHAT_URL.to_string(),
                model: DEFAULT_CHAT_MODEL.to_string(),
            },
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Only `SPOTIFY_API_AUTH_CLIENT_ID` is required; everything else falls
    /// back to a default.
    pub fn from_env() -> Result<Self> {
        let client_id = client_id_from(env::var("SPOTIFY_API_AUTH_CLIENT_ID").ok())?;

        let mut config = Config::new(client_id);
        config.redirect_uri = var_or("SPOTIFY_API_REDIRECT_URI", config.redirect_uri);
        config.server_addr = var_or("SERVER_ADDRESS", config.server_addr);
        config.auth_url = var_or("SPOTIFY_API_AUTH_URL", config.auth_url);
        config.token_url = var_or("SPOTIFY_API_TOKEN_URL", config.token_url);
        config.api_url = var_or("SPOTIFY_API_URL", config.api_url);
        config.flow = parse_var("SPOTIFY_API_AUTH_FLOW")?.unwrap_or(config.flow);
        config.extended_scopes = parse_bool_var("SPOTIFY_API_EXTENDED_SCOPES")?;
        config.market = env::var("SPOTIFY_MARKET").ok().filter(|m| !m.is_empty());
        config.seed_encoding = parse_var("SPOTIFY_SEED_ENCODING")?.unwrap_or(config.seed_encoding);
        config.history_limit = parse_var::<u32>("HISTORY_LIMIT")?
            .unwrap_or(config.history_limit)
            .clamp(1, 50);
        config.auth_wait_secs = parse_var("AUTH_WAIT_SECS")?.unwrap_or(config.auth_wait_secs);
        if let Ok(at) = env::var("DAILY_AT") {
            config.daily_at = parse_daily_at(&at)?;
        }
        config.chat.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        config.chat.url = var_or("OPENAI_API_URL", config.chat.url);
        config.chat.model = var_or("OPENAI_MODEL", config.chat.model);

        Ok(config)
    }

    /// The scope list sent to the authorization server, space-joined.
    pub fn scope(&self) -> String {
        let mut scopes: Vec<&str> = SCOPES.to_vec();
        if self.extended_scopes {
            scopes.extend_from_slice(EXTENDED_SCOPES);
        }
        scopes.join(" ")
    }
}

/// Parses `HH:MM` (or `HH:MM:SS`).
pub fn parse_daily_at(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|e| Error::Config(format!("DAILY_AT '{}': {}", value, e)))
}

// an empty value (as left by an unedited `.env.example`) counts as unset
fn client_id_from(value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".to_string()))
}

fn var_or(name: &str, default: String) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(v) if !v.is_empty() => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", name, e))),
        _ => Ok(None),
    }
}

fn parse_bool_var(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "" | "0" | "false" | "no" => Ok(false),
            "1" | "true" | "yes" => Ok(true),
            other => Err(Error::Config(format!("{}: expected a boolean, got '{}'", name, other))),
        },
        Err(_) => Ok(false),
    }
}

/// Directory holding the `.env` file and the credential store.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dailysong");
    path
}

/// Loads environment variables from `<data dir>/.env`.
///
/// The file is optional; configuration may come from the environment alone.
/// The directory is created so `build.rs` and the credential store can write
/// into it.
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| Error::Config(e.to_string()))?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    } else {
        log::debug!("no .env file at {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_is_space_joined() {
        let mut config = Config::new("client");
        assert_eq!(
            config.scope(),
            "user-read-private user-read-email user-top-read user-read-recently-played"
        );

        config.extended_scopes = true;
        assert!(config.scope().ends_with("user-read-currently-playing"));
        assert_eq!(config.scope().split(' ').count(), 7);
    }

    #[test]
    fn test_flow_and_encoding_parse() {
        assert_eq!("code".parse::<AuthFlowKind>(), Ok(AuthFlowKind::Code));
        assert_eq!("Token".parse::<AuthFlowKind>(), Ok(AuthFlowKind::Token));
        assert!("device".parse::<AuthFlowKind>().is_err());
        assert_eq!("repeated".parse::<SeedEncoding>(), Ok(SeedEncoding::Repeated));
        assert_eq!("csv".parse::<SeedEncoding>(), Ok(SeedEncoding::Delimited));
    }

    #[test]
    fn test_client_id_must_not_be_empty() {
        assert_eq!(client_id_from(Some("abc123".into())).unwrap(), "abc123");
        assert!(matches!(client_id_from(None), Err(Error::Config(_))));
        assert!(matches!(client_id_from(Some(String::new())), Err(Error::Config(_))));
        assert!(matches!(client_id_from(Some("   ".into())), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_daily_at() {
        assert_eq!(
            parse_daily_at("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert!(parse_daily_at("7pm").is_err());
    }
}

//! In-process stand-in for the Spotify Web API, the accounts service and the
//! chat endpoint. Each route counts its hits.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use dailysong::{
    config::Config,
    management::{CredentialStore, MemoryStore, StoreKey, TokenManager},
    pipeline::{Pipeline, PipelineOptions},
    spotify::SpotifyClient,
    types::SessionToken,
};

pub const VALID_TOKEN: &str = "valid-token";

#[derive(Debug, Clone)]
pub struct Scenario {
    pub me_status: StatusCode,
    pub me_delay: Duration,
    pub top_status: StatusCode,
    pub top_tracks: Vec<Value>,
    pub recommendations_status: StatusCode,
    pub recommendations: Vec<Value>,
    pub features_status: StatusCode,
    pub token_status: StatusCode,
    pub chat_status: StatusCode,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            me_status: StatusCode::OK,
            me_delay: Duration::ZERO,
            top_status: StatusCode::OK,
            top_tracks: ["A", "B", "C", "D", "E"].iter().map(|id| track_json(id)).collect(),
            recommendations_status: StatusCode::OK,
            recommendations: vec![track_json("F")],
            features_status: StatusCode::OK,
            token_status: StatusCode::OK,
            chat_status: StatusCode::OK,
        }
    }
}

#[derive(Default)]
pub struct Hits {
    pub me: AtomicUsize,
    pub top: AtomicUsize,
    pub recommendations: AtomicUsize,
    pub features: AtomicUsize,
    pub token: AtomicUsize,
    pub chat: AtomicUsize,
    pub last_recommendations_query: Mutex<Option<String>>,
    pub last_token_form: Mutex<Option<HashMap<String, String>>>,
}

impl Hits {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct MockState {
    scenario: Scenario,
    hits: Arc<Hits>,
}

pub struct MockSpotify {
    pub addr: SocketAddr,
    pub hits: Arc<Hits>,
}

impl MockSpotify {
    pub async fn start(scenario: Scenario) -> Self {
        let hits = Arc::new(Hits::default());
        let state = Arc::new(MockState {
            scenario,
            hits: Arc::clone(&hits),
        });

        let app = Router::new()
            .route("/v1/me", get(me))
            .route("/v1/me/top/tracks", get(top_tracks))
            .route("/v1/me/player/recently-played", get(recently_played))
            .route("/v1/recommendations", get(recommendations))
            .route("/v1/audio-features/{id}", get(audio_features))
            .route("/api/token", post(token))
            .route("/chat", post(chat))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockSpotify { addr, hits }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::new("test-client");
        config.api_url = format!("http://{}/v1", self.addr);
        config.token_url = format!("http://{}/api/token", self.addr);
        config.chat.url = format!("http://{}/chat", self.addr);
        config
    }
}

pub fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Song {}", id),
        "artists": [{ "id": format!("artist-{}", id), "name": format!("Artist {}", id) }],
        "album": {
            "name": format!("Album {}", id),
            "images": [{ "url": format!("https://img.example/{}.jpg", id), "width": 640, "height": 640 }]
        },
        "preview_url": null,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) }
    })
}

/// A token manager over a fresh memory store, optionally holding a token.
pub async fn tokens_with(token: Option<&str>) -> (TokenManager, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenManager::new(store.clone());
    if let Some(token) = token {
        tokens
            .commit(&SessionToken::bearer(token, Some(3600)))
            .await
            .unwrap();
    }
    (tokens, store)
}

pub fn pipeline(config: &Config, tokens: TokenManager) -> Pipeline {
    Pipeline::new(
        SpotifyClient::new(config),
        tokens,
        PipelineOptions::from_config(config),
    )
}

pub async fn stored_token(store: &MemoryStore) -> Option<String> {
    store.get(StoreKey::AccessToken).await.unwrap()
}

fn authorized(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", VALID_TOKEN))
}

async fn me(
    State(state): State<Arc<MockState>>,
    headers: axum::http::HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.hits.me.fetch_add(1, Ordering::SeqCst);
    if !state.scenario.me_delay.is_zero() {
        tokio::time::sleep(state.scenario.me_delay).await;
    }
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid" })));
    }
    (
        state.scenario.me_status,
        Json(json!({ "id": "listener", "display_name": "Test Listener", "country": "DE" })),
    )
}

async fn top_tracks(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.hits.top.fetch_add(1, Ordering::SeqCst);
    (
        state.scenario.top_status,
        Json(json!({ "items": state.scenario.top_tracks })),
    )
}

async fn recently_played(State(state): State<Arc<MockState>>) -> Json<Value> {
    let items: Vec<Value> = state
        .scenario
        .top_tracks
        .iter()
        .map(|t| json!({ "track": t, "played_at": "2024-05-01T10:00:00Z" }))
        .collect();
    Json(json!({ "items": items }))
}

async fn recommendations(
    State(state): State<Arc<MockState>>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    state.hits.recommendations.fetch_add(1, Ordering::SeqCst);
    *state.hits.last_recommendations_query.lock().unwrap() = query;
    (
        state.scenario.recommendations_status,
        Json(json!({ "tracks": state.scenario.recommendations })),
    )
}

async fn audio_features(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.hits.features.fetch_add(1, Ordering::SeqCst);
    (
        state.scenario.features_status,
        Json(json!({
            "energy": 0.9,
            "valence": 0.8,
            "tempo": 140.0,
            "danceability": 0.8,
            "acousticness": 0.1,
            "instrumentalness": 0.0
        })),
    )
}

async fn token(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.token.fetch_add(1, Ordering::SeqCst);
    *state.hits.last_token_form.lock().unwrap() = Some(form);
    (
        state.scenario.token_status,
        Json(json!({
            "access_token": VALID_TOKEN,
            "token_type": "Bearer",
            "scope": "user-top-read",
            "expires_in": 3600
        })),
    )
}

async fn chat(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.hits.chat.fetch_add(1, Ordering::SeqCst);
    (
        state.scenario.chat_status,
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Upbeat and bright, like your usual picks." } }]
        })),
    )
}

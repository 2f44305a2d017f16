use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    annotate::{AnnotationRequest, Annotator, FALLBACK_SUMMARY},
    config::ChatConfig,
    error::{Error, Result},
    types::Track,
};

const MAX_TOKENS: u32 = 150;

/// Asks a chat-completions endpoint for the explanation.
pub struct ChatAnnotator {
    http: Client,
    config: ChatConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatAnnotator {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt),
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                endpoint: "chat/completions".to_string(),
            });
        }

        let response: ChatResponse = response.json().await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

fn describe(track: &Track) -> String {
    format!("{} by {}", track.name, track.artist_names())
}

pub(crate) fn build_prompt(track: &Track, history: &[Track]) -> String {
    let listed = history
        .iter()
        .map(|t| format!("- {}", describe(t)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Given the following song recommendation and user's top tracks, explain why they might like this song:\n\n\
         Recommended Song: {}\nAlbum: {}\n\n\
         User's Top Tracks:\n{}\n\n\
         Please provide a brief, engaging explanation (2-3 sentences) of why this song might appeal to the user based on their listening history.",
        describe(track),
        track.album.name,
        listed
    )
}

#[async_trait]
impl Annotator for ChatAnnotator {
    async fn annotate(&self, request: AnnotationRequest<'_>) -> String {
        let prompt = build_prompt(request.track, request.recent_history());
        match self.complete(prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => FALLBACK_SUMMARY.to_string(),
            Err(e) => {
                log::warn!("chat annotation failed: {}", e);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExternalUrls, TrackAlbum, TrackArtist};

    fn track(name: &str, artists: &[&str]) -> Track {
        Track {
            id: name.to_lowercase(),
            name: name.into(),
            artists: artists
                .iter()
                .map(|a| TrackArtist {
                    id: None,
                    name: (*a).into(),
                })
                .collect(),
            album: TrackAlbum {
                name: format!("{} (Album)", name),
                images: Vec::new(),
            },
            preview_url: None,
            external_urls: ExternalUrls::default(),
        }
    }

    #[test]
    fn test_prompt_lists_track_and_history() {
        let rec = track("Teardrop", &["Massive Attack"]);
        let history = vec![track("Glory Box", &["Portishead"]), track("Roads", &["Portishead"])];
        let prompt = build_prompt(&rec, &history);

        assert!(prompt.contains("Recommended Song: Teardrop by Massive Attack"));
        assert!(prompt.contains("Album: Teardrop (Album)"));
        assert!(prompt.contains("- Glory Box by Portishead\n- Roads by Portishead"));
    }

    #[tokio::test]
    async fn test_missing_api_key_falls_back() {
        let annotator = ChatAnnotator::new(ChatConfig {
            api_key: None,
            url: "http://127.0.0.1:9/unused".into(),
            model: "gpt-3.5-turbo".into(),
        });
        let rec = track("Teardrop", &["Massive Attack"]);
        let text = annotator
            .annotate(AnnotationRequest {
                track: &rec,
                history: &[],
                access_token: "unused",
            })
            .await;
        assert_eq!(text, FALLBACK_SUMMARY);
    }
}

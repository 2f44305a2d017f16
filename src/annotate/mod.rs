//! Explanations of why a recommended track might appeal to the user.
//!
//! Annotation is cosmetic: an [`Annotator`] never fails. Whatever goes wrong
//! inside, it answers with [`FALLBACK_SUMMARY`] or another generic text.

use async_trait::async_trait;

use crate::types::Track;

mod chat;
mod features;

pub use chat::ChatAnnotator;
pub use features::{FeatureAnnotator, generate_summary};

pub const FALLBACK_SUMMARY: &str = "Based on your listening habits, this track matches your taste profile with its unique sound and style. The artist's approach to composition and the track's energy level align well with other music you enjoy.";

/// Number of history tracks an annotator gets to look at.
pub const HISTORY_WINDOW: usize = 5;

pub struct AnnotationRequest<'a> {
    pub track: &'a Track,
    /// Ordered recent history, most relevant first.
    pub history: &'a [Track],
    /// Bearer token for lookups against the music service. Not to be kept.
    pub access_token: &'a str,
}

impl AnnotationRequest<'_> {
    pub fn recent_history(&self) -> &[Track] {
        &self.history[..self.history.len().min(HISTORY_WINDOW)]
    }
}

#[async_trait]
pub trait Annotator: Send + Sync {
    /// Returns a short, non-empty explanation for `request.track`.
    async fn annotate(&self, request: AnnotationRequest<'_>) -> String;
}

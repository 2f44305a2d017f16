use std::sync::Arc;

use axum::{Extension, extract::RawQuery, response::Html};
use tokio::sync::Mutex;

use crate::{
    error::Result,
    spotify::auth::{AuthFlow, AuthOutcome, RedirectPayload},
    warning,
};

/// State shared between the callback handlers and the waiting `auth` command.
///
/// Only the first redirect is processed. Later hits (a reload of the relay
/// page, a second tab) are answered without touching the credential store.
#[derive(Clone)]
pub struct CallbackState {
    pub flow: Arc<AuthFlow>,
    pub outcome: Arc<Mutex<Option<Result<AuthOutcome>>>>,
    handled: Arc<Mutex<bool>>,
}

const ALREADY_COMPLETED: &str = "Sign-in was already completed. You can close this window.";

impl CallbackState {
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self {
            flow,
            outcome: Arc::new(Mutex::new(None)),
            handled: Arc::new(Mutex::new(false)),
        }
    }

    /// Whether a redirect has been processed.
    pub async fn is_handled(&self) -> bool {
        *self.handled.lock().await
    }

    async fn complete(&self, payload: RedirectPayload) -> String {
        let mut handled = self.handled.lock().await;
        if *handled {
            log::info!("ignoring repeated callback");
            return ALREADY_COMPLETED.to_string();
        }
        *handled = true;

        let result = self.flow.complete_authorization(&payload).await;
        let message = match &result {
            Ok(_) => "Authentication successful. You can close this window.".to_string(),
            Err(e) => {
                warning!("Authorization callback failed: {}", e);
                e.user_message()
            }
        };
        *self.outcome.lock().await = Some(result);
        message
    }
}

// The fragment never reaches the server; this page forwards it and removes
// it from the address bar and history.
const FRAGMENT_RELAY_PAGE: &str = r#"<!doctype html>
<html><body>
<h4 id="status">Completing sign-in...</h4>
<script>
  const fragment = window.location.hash.substring(1);
  window.history.replaceState(null, document.title, window.location.pathname);
  const done = fragment
    ? fetch('/callback/fragment?' + fragment).then((r) => r.text())
    : Promise.resolve('Nothing to complete. You can close this window.');
  done
    .then((text) => { document.getElementById('status').textContent = text; })
    .catch(() => { document.getElementById('status').textContent = 'Sign-in failed.'; });
</script>
</body></html>"#;

/// Redirect target. Handles `?code=..&state=..` directly and serves the
/// relay page for fragment redirects.
pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(state): Extension<CallbackState>,
) -> Html<String> {
    match query.filter(|q| !q.is_empty()) {
        Some(query) => {
            let message = state.complete(RedirectPayload::Query(query)).await;
            Html(format!(
                "<h4>{}</h4><script>window.history.replaceState(null, document.title, window.location.pathname);</script>",
                message
            ))
        }
        None => Html(FRAGMENT_RELAY_PAGE.to_string()),
    }
}

/// Receives the fragment forwarded by the relay page.
pub async fn fragment(
    RawQuery(query): RawQuery,
    Extension(state): Extension<CallbackState>,
) -> String {
    state
        .complete(RedirectPayload::Fragment(query.unwrap_or_default()))
        .await
}

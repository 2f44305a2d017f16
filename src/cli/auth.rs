use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    api::CallbackState,
    cli::{Context, fail},
    config::AuthFlowKind,
    error::Result,
    info,
    management::AuthEvent,
    pipeline::Pipeline,
    server,
    spotify::auth::{AuthFlow, AuthOutcome, RedirectPayload},
    success, warning,
};

/// Runs the browser handshake: binds the callback server, sends the user to
/// Spotify and waits for the redirect.
pub async fn auth(ctx: &Context, flow: Option<AuthFlowKind>) {
    let mut config = ctx.config.clone();
    if let Some(flow) = flow {
        config.flow = flow;
    }

    let pipeline = ctx.pipeline(None);
    let auth_flow = Arc::new(AuthFlow::new(
        config.clone(),
        ctx.client.clone(),
        ctx.tokens.clone(),
    ));

    let listener = match server::bind(&config.server_addr).await {
        Ok(l) => l,
        Err(e) => fail(&e),
    };

    let request = match auth_flow.begin_authorization().await {
        Ok(r) => r,
        Err(e) => fail(&e),
    };
    pipeline.transition(AuthEvent::RedirectStarted);

    let state = CallbackState::new(Arc::clone(&auth_flow));
    let server_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = server::start_api_server(listener, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&request.url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            request.url
        )
    }
    info!("Waiting for Spotify to redirect back...");

    let wait = Duration::from_secs(config.auth_wait_secs);
    match wait_for_outcome(&state, wait).await {
        Some(outcome) => finish(&pipeline, outcome).await,
        None => {
            // the nonce stays stored; the next `auth` overwrites it
            pipeline.transition(AuthEvent::Logout);
            crate::error!(
                "No redirect received within {} seconds. Run `dailysong auth` again, or paste the redirect URL into `dailysong auth complete <url>`.",
                config.auth_wait_secs
            );
        }
    }
}

/// Completes an authorization from a redirect URL pasted by the user.
pub async fn complete_auth(ctx: &Context, redirect_url: &str) {
    let pipeline = ctx.pipeline(None);
    let auth_flow = AuthFlow::new(ctx.config.clone(), ctx.client.clone(), ctx.tokens.clone());

    let (payload, clean_url) = match RedirectPayload::from_url(redirect_url) {
        Ok(p) => p,
        Err(e) => fail(&e),
    };
    log::debug!("redirect target {}", clean_url);

    let outcome = auth_flow.complete_authorization(&payload).await;
    finish(&pipeline, outcome).await;
}

pub async fn logout(ctx: &Context) {
    let pipeline = ctx.pipeline(None);
    match pipeline.logout().await {
        Ok(()) => success!("Disconnected from Spotify."),
        Err(e) => fail(&e),
    }
}

async fn finish(pipeline: &Pipeline, outcome: Result<AuthOutcome>) {
    if let Err(e) = pipeline.settle(outcome).await {
        fail(&e);
    }

    match pipeline.validate().await {
        Ok(profile) => success!(
            "Authentication successful! Connected as {}.",
            profile.display_name.as_deref().unwrap_or(&profile.id)
        ),
        Err(e) => fail(&e),
    }
}

async fn wait_for_outcome(state: &CallbackState, max_wait: Duration) -> Option<Result<AuthOutcome>> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        if let Some(outcome) = state.outcome.lock().await.take() {
            return Some(outcome);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    None
}

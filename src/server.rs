use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr};
use tokio::net::TcpListener;

use crate::{
    api::{self, CallbackState},
    error::{Error, Result},
};

pub fn router(state: CallbackState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .route("/callback/fragment", get(api::fragment))
        .layer(Extension(state))
}

/// Binds the callback server. Binding happens before the browser is opened so
/// the redirect cannot arrive at a closed port.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("SERVER_ADDRESS '{}': {}", addr, e)))?;
    TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("cannot bind {}: {}", addr, e)))
}

pub async fn start_api_server(listener: TcpListener, state: CallbackState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .map_err(|e| Error::Transport(e.to_string()))
}

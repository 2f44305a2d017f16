//! # API Module
//!
//! HTTP endpoints of the short-lived local server that receives the OAuth
//! redirect.
//!
//! ## Endpoints
//!
//! - [`callback`] - redirect target. Completes code-flow redirects directly;
//!   for token-flow redirects it serves a page that forwards the URL fragment
//!   (which browsers never send to servers) to [`fragment`] and strips it from
//!   the browser history.
//! - [`fragment`] - completes token-flow redirects.
//! - [`health`] - status and version.
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use dailysong::api::{CallbackState, callback, fragment, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/callback/fragment", get(fragment))
//!     .route("/health", get(health))
//!     .layer(Extension(state));
//! ```

mod callback;
mod health;

pub use callback::CallbackState;
pub use callback::callback;
pub use callback::fragment;
pub use health::health;

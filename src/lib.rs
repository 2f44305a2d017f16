//! dailysong library
//!
//! Connects to Spotify through a redirect-based OAuth flow, reads the user's
//! listening history and turns it into one recommended song, optionally with
//! an explanation of why it fits.
//!
//! # Modules
//!
//! - `annotate` - explanations for a recommendation (audio features, chat model)
//! - `api` - HTTP endpoints of the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy of the pipeline
//! - `management` - Credential store, token manager and auth state machine
//! - `pipeline` - The recommendation pipeline controller
//! - `scheduler` - Daily trigger
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dailysong::{config::Config, management::{MemoryStore, TokenManager}, pipeline::{Pipeline, PipelineOptions}, spotify::SpotifyClient};
//!
//! # async fn run() -> dailysong::Result<()> {
//! let config = Config::from_env()?;
//! let tokens = TokenManager::new(Arc::new(MemoryStore::new()));
//! let pipeline = Pipeline::new(SpotifyClient::new(&config), tokens, PipelineOptions::from_config(&config));
//! let recommendation = pipeline.run(None).await?;
//! println!("{}", recommendation.track.name);
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod pipeline;
pub mod scheduler;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, ErrorCategory, Result};

/// Status line with a blue `o`, for progress and neutral information.
///
/// ```
/// info!("Next song at {}.", next);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Status line with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line to stderr and exits with status 1.
///
/// Every failing command ends here exactly once, so a failure always produces
/// one notification.
///
/// ```
/// error!("Configuration problem: {}", e);
/// // unreachable
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Yellow `!` line on stderr for recoverable problems.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

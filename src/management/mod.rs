mod auth;
mod state;
mod store;

pub use auth::PendingAttempt;
pub use auth::TokenManager;
pub use state::AuthEvent;
pub use state::AuthMachine;
pub use state::AuthState;
pub use state::FailureReason;
pub use store::CredentialStore;
pub use store::FileStore;
pub use store::MemoryStore;
pub use store::StoreKey;

//! Seams between the resilient machinery and its collaborators.

mod api;
mod credential_provider;
mod session_store;
mod transport;

pub use api::ApiClient;
pub use credential_provider::{CredentialProvider, StaticAuthorization};
pub use session_store::{MemorySessionStore, SessionStore};
pub use transport::Transport;

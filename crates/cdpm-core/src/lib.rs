//! cdpm-core - Core types and traits for the cdpm cluster API toolkit.
//!
//! Everything in this crate is transport-agnostic: the resilient request
//! machinery in `cdpm-http` is written against the [`Transport`] trait and
//! the value types defined here.

pub mod credentials;
pub mod error;
pub mod page;
pub mod request;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{AuthConfig, CredentialMode, Credentials};
pub use error::Error;
pub use page::{
    Page, PageEnvelope, PageRequest, PageStyle, PaginationCursor, Termination, decode_page,
};
pub use request::{Body, Method, Request, RequestAuth, Response};
pub use tokens::{HeaderToken, SessionToken};
pub use traits::{
    ApiClient, CredentialProvider, MemorySessionStore, SessionStore, StaticAuthorization, Transport,
};
pub use types::{HostList, HostUrl};

/// Name of the session cookie issued by Cloudera Manager.
pub const SESSION_COOKIE: &str = "SESSION";

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

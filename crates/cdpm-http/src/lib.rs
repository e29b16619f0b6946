//! cdpm-http - Resilient clients for Cloudera cluster services.
//!
//! The machinery is layered the same way for every service:
//!
//! - [`SessionAuthenticator`] owns the credential mode and the session
//!   cookie jar, and renews the session against a probe endpoint.
//! - [`RequestExecutor`] sends one request to one host and handles a single
//!   renew-and-retry on `401`.
//! - [`HostFailoverSelector`] tries equivalent hosts in order and promotes
//!   the one that answered.
//! - [`RetryPolicy`] retries whole operations on connection failures.
//! - [`PaginatedFetcher`] turns paged list endpoints into a stream.
//!
//! [`ResilientClient`] composes them over a [`Transport`](cdpm_core::Transport);
//! the per-service clients in [`services`] only shape requests and decode
//! responses.
//!
//! # Example
//!
//! ```no_run
//! use cdpm_core::{Credentials, HostList};
//! use cdpm_http::{ReqwestTransport, services::{CmClient, CmOptions}};
//!
//! # async fn example() -> Result<(), cdpm_core::Error> {
//! let hosts = HostList::parse(["https://cm.example.com:7183"])?;
//! let cm = CmClient::connect(
//!     ReqwestTransport::new()?,
//!     hosts,
//!     Credentials::basic("admin", "secret"),
//!     CmOptions::default(),
//! );
//! for host in cm.hosts().await? {
//!     println!("{}", host["hostname"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod executor;
pub mod failover;
pub mod fanout;
pub mod paginate;
pub mod retry;
pub mod services;
pub mod session;
pub mod transport;

pub use client::ResilientClient;
pub use executor::RequestExecutor;
pub use failover::HostFailoverSelector;
pub use fanout::{DEFAULT_FAN_OUT, fan_out};
pub use paginate::PaginatedFetcher;
pub use retry::RetryPolicy;
pub use session::SessionAuthenticator;
pub use transport::{ReqwestTransport, TransportOptions};

#[cfg(test)]
pub(crate) mod testing;

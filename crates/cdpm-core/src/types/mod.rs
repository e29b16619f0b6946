//! Validated host addressing types.

mod host_list;
mod host_url;

pub use host_list::HostList;
pub use host_url::HostUrl;

//! Per-service clients.
//!
//! Each client shapes requests for one cluster service and decodes its
//! responses. Authentication, failover and retry come from the
//! [`ResilientClient`](crate::ResilientClient) it wraps.

mod cm;
mod hue;
mod namenode;
mod ranger;
mod spark;
mod yarn;

pub use cm::{
    AclChange, ApiCommand, CM_PROBE_PATH, CmClient, CmOptions, HealthIssues, MetricContentType,
    MetricRollup, QueueAcl, QueueProperties, TimeSeriesQuery, YarnQueue,
};
pub use hue::{HueQpClient, QuerySearch};
pub use namenode::NameNodeClient;
pub use ranger::{AuditQuery, RangerClient, UserQuery};
pub use spark::{AppStatus, ApplicationFilter, SparkHistoryClient};
pub use yarn::YarnClient;

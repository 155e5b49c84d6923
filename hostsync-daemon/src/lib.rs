//! Hostsync daemon runtime: fixed-delay poller, strictly serialized
//! reconcile processor, and a Unix-socket control server.

mod error;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use protocol::{
    request_refresh, request_status, request_stop, send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{run, start_blocking, CycleStats, CycleSummary};

pub mod metrics;
pub mod smoobu;

pub use metrics::{get_metrics, init_metrics};
pub use smoobu::{SmoobuClient, UpstreamBody, UpstreamError};

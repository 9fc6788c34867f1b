pub mod dashboard;
pub mod metrics;

pub use dashboard::*;
pub use metrics::*;

//! Job lifecycle management
//!
//! `JobManager` validates and enqueues jobs and owns the bounded worker
//! pool; `StatusStore` is the concurrent-safe registry clients poll;
//! `worker` runs one job end-to-end.

pub mod manager;
pub mod status;
pub mod worker;

pub use manager::JobManager;
pub use status::StatusStore;

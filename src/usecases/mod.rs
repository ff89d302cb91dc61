//! Application use cases. Orchestrate domain logic via ports.

pub mod notifier;
pub mod report_service;
pub mod reporter;

pub use notifier::Notifier;
pub use report_service::{ReportService, RunSummary};
pub use reporter::{Reporter, RunStatus};

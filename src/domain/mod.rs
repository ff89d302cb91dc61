//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod form;

pub use entities::{
    NoticeConfig, NoticeProvider, ReportOutcome, ReportStage, ReportType, Session, UserConfig,
    UserEntry,
};
pub use errors::DomainError;
pub use form::{DerivedFields, FormRecord, GeoApiInfo, PriorForms};

//! Portal adapters. Implement PortalGateway.
//!
//! HTTP client for the real portal and a scripted mock for tests.

pub mod http_portal;
pub mod mock_portal;

pub use http_portal::{DEFAULT_PORTAL_BASE_URL, HttpPortal};
pub use mock_portal::{MockPortal, PortalCall};

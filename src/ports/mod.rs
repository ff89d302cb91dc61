//! Port traits. API boundaries for the hexagon.
//!
//! - Outbound: Called by application into infrastructure (portal, push gateways)

pub mod outbound;

pub use outbound::{PortalGateway, PushGateway};

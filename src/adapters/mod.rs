//! Infrastructure adapters. Implement outbound ports.
//!
//! Check-in portal and push gateways. Map errors to DomainError.

pub mod portal;
pub mod push;

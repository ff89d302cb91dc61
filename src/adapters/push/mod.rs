//! Push notification adapters. Implement PushGateway.

pub mod http_push;
pub mod mock_push;

pub use http_push::HttpPushGateway;
pub use mock_push::RecordingPushGateway;

//! HTTP middleware: request ID and error telemetry.

pub mod request_id;
pub mod telemetry;

pub mod client;
pub mod poller;
pub mod status;
pub mod telemetry;
pub mod validate;

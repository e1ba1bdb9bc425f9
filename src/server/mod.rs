//! HTTP server: host context and REST exposure

pub mod host;
pub mod rest;

pub use host::ServerHost;
pub use rest::RestExposure;

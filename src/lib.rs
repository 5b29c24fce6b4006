//! Bifrost dev gateway library.
//!
//! Client shell, typed backend contract client, forwarding dev server and an
//! in-memory stub backend for the collection / query / MQTT session contract.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod shell;
pub mod stub;

pub use config::GatewayConfig;
pub use gateway::{GatewayClient, GatewayError, MqttSession};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
pub use shell::{MountedApp, Shell};
pub use stub::StubBackend;

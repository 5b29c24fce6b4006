//! Backend gateway contract.
//!
//! # Data Flow
//! ```text
//! Caller (shell, CLI, tests)
//!     → client.rs (typed operation → HTTP request)
//!     → resilience (retry on network failure only)
//!     → backend (directly, or via the dev gateway)
//!     → error.rs (Unreachable | Application | Decode)
//!     → types.rs (decoded response)
//!
//! Session control:
//!     session.rs serializes start/stop; status is free-running
//! ```

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::{ClientBuildError, GatewayClient};
pub use error::{GatewayError, GATEWAY_ERROR_HEADER, INTERRUPTED, TIMED_OUT, UNREACHABLE};
pub use session::MqttSession;

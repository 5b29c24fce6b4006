//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, route → upstream URI, strip hop-by-hop)
//!     → hyper client → backend
//!     → response.rs (relay, or gateway-generated error)
//!     → Send to client
//!
//! GET / → mounted client shell page
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (route lookup)
//!     → matcher.rs (segment-aware prefix test)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup):
//!     GatewayConfig.routes + backend address
//!     → Compile matchers
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod table;

pub use table::{Route, RouteTable, RouteTableError};

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway call:
//!     → timeouts enforced by the HTTP client (connect + total)
//!     → Connection never made: retries.rs (retry with backoff.rs delays)
//!     → Request sent, no answer: retried only for idempotent calls
//!     → On application failure: returned to the caller untouched
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only where repeating the call cannot apply it twice

pub mod backoff;
pub mod retries;

pub use backoff::delay_for;
pub use retries::with_retries;

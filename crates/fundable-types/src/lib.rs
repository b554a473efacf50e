//! Fundable Types - Canonical domain types for fund-order issuance
//!
//! This crate contains the foundational types shared by every fundable crate,
//! with zero dependencies on the others:
//!
//! - Identity types (`AccountId`, `OperationId`)
//! - The `Amount` value unit
//! - The `FundableEvent` contract consumed by audit and monitoring
//!
//! # Lifecycle
//!
//! ```text
//! Ordered → InProcess → Executed
//!    │          └──────→ Rejected
//!    ├────────────────→ Rejected
//!    └────────────────→ Cancelled
//! ```

pub mod amount;
pub mod event;
pub mod identity;

pub use amount::*;
pub use event::*;
pub use identity::*;

/// Version of the fundable types schema
pub const TYPES_VERSION: &str = "0.1.0";

/// Temporal anchor for causal ordering of recorded events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TemporalAnchor {
    /// Wall-clock timestamp in milliseconds
    pub timestamp: i64,
    /// Sequence number for ordering within same timestamp
    pub sequence: u64,
}

impl TemporalAnchor {
    /// Anchor at the current time carrying an explicit sequence number
    pub fn at_sequence(sequence: u64) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            sequence,
        }
    }
}

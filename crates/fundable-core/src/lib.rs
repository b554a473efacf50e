//! Fundable Core - Role-gated fund orders for token issuance
//!
//! Value is only created after an authorized party orders it and a fund
//! agent processes and executes it:
//!
//! - `AuthorizationRegistry`: fund agents, and per-wallet fund operators
//! - `FundOrderBook`: operation-keyed records and the status machine
//! - `Fundable`: the serialized service tying both to a value ledger and
//!   to event sinks
//!
//! # Invariants
//!
//! 1. An operation id names one order forever, even after it is terminal
//! 2. Status only moves along Ordered → InProcess → Executed/Rejected,
//!    Ordered → Rejected and Ordered → Cancelled
//! 3. Process, execute and reject require the fund agent role at call time
//! 4. Every call commits fully or fails with nothing changed and no event
//! 5. Execution mints exactly once, or not at all

pub mod config;
pub mod context;
pub mod error;
pub mod fundable;
pub mod order;
pub mod roles;
pub mod snapshot;
pub mod state;

pub use self::config::*;
pub use context::*;
pub use error::*;
pub use fundable::*;
pub use order::*;
pub use roles::*;
pub use snapshot::*;
pub use state::*;

pub use fundable_types::{AccountId, Amount, FundableEvent, OperationId};

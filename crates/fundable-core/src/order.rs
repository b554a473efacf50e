//! Fund orders and their status machine
//!
//! ```text
//! Ordered ──process──→ InProcess ──execute──→ Executed
//!    │                     └──────reject────→ Rejected
//!    ├──reject──────────────────────────────→ Rejected
//!    └──cancel──────────────────────────────→ Cancelled
//! ```
//!
//! There is no default status: a record only exists once it was ordered.

use std::collections::HashMap;
use std::fmt;

use fundable_types::{AccountId, Amount, OperationId};
use serde::{Deserialize, Serialize};

use crate::error::{FundableError, Result};

/// Lifecycle status of a fund order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundStatus {
    Ordered,
    InProcess,
    Executed,
    Rejected,
    Cancelled,
}

impl FundStatus {
    /// Executed, Rejected and Cancelled have no outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Rejected | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: FundStatus) -> bool {
        matches!(
            (self, next),
            (Self::Ordered, Self::InProcess)
                | (Self::Ordered, Self::Rejected)
                | (Self::Ordered, Self::Cancelled)
                | (Self::InProcess, Self::Executed)
                | (Self::InProcess, Self::Rejected)
        )
    }
}

impl fmt::Display for FundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ordered => "Ordered",
            Self::InProcess => "InProcess",
            Self::Executed => "Executed",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A status-changing operation on an existing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundTransition {
    Cancel,
    Process,
    Reject,
    Execute,
}

impl FundTransition {
    pub fn target(&self) -> FundStatus {
        match self {
            Self::Cancel => FundStatus::Cancelled,
            Self::Process => FundStatus::InProcess,
            Self::Reject => FundStatus::Rejected,
            Self::Execute => FundStatus::Executed,
        }
    }

    /// Whether an order in `status` may take this transition
    pub fn permits(&self, status: FundStatus) -> bool {
        status.can_transition_to(self.target())
    }
}

impl fmt::Display for FundTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirement = match self {
            Self::Cancel => "A fund can only be cancelled in status Ordered",
            Self::Process => "Only process if the status is ordered",
            Self::Reject => "A fund can only be rejected if the status is ordered or in progress",
            Self::Execute => "A fund can only be executed from status InProcess",
        };
        f.write_str(requirement)
    }
}

/// One request to mint value into a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundOrder {
    pub operation_id: OperationId,
    /// Caller of order/orderFrom
    pub orderer: AccountId,
    /// Receives the minted value
    pub wallet_to_fund: AccountId,
    pub value: Amount,
    /// Opaque payment instruction payload
    pub instructions: String,
    pub status: FundStatus,
}

/// Operation-keyed store of fund orders
///
/// Records are never removed; an operation id stays taken after its order
/// reaches a terminal status.
#[derive(Debug, Clone, Default)]
pub struct FundOrderBook {
    orders: HashMap<OperationId, FundOrder>,
    /// Insertion order, for enumeration and audit
    sequence: Vec<OperationId>,
}

impl FundOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from records in insertion order
    pub fn from_orders(orders: Vec<FundOrder>) -> Result<Self> {
        let mut book = Self::new();
        for order in orders {
            if order.operation_id.is_empty() || order.value.is_zero() || order.instructions.is_empty() {
                return Err(FundableError::Storage {
                    message: format!("malformed fund order record {:?}", order.operation_id.as_str()),
                });
            }
            book.insert(order)?;
        }
        Ok(book)
    }

    pub fn contains(&self, operation_id: &OperationId) -> bool {
        self.orders.contains_key(operation_id)
    }

    pub fn get(&self, operation_id: &OperationId) -> Option<&FundOrder> {
        self.orders.get(operation_id)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Insert a new record; the operation id must be unused
    pub fn insert(&mut self, order: FundOrder) -> Result<&FundOrder> {
        if self.orders.contains_key(&order.operation_id) {
            return Err(FundableError::DuplicateOperation {
                operation_id: order.operation_id,
            });
        }
        let id = order.operation_id.clone();
        self.sequence.push(id.clone());
        Ok(&*self.orders.entry(id).or_insert(order))
    }

    /// Move a record along one edge of the status machine
    pub fn transition(
        &mut self,
        operation_id: &OperationId,
        transition: FundTransition,
    ) -> Result<&FundOrder> {
        let order = self
            .orders
            .get_mut(operation_id)
            .ok_or_else(|| FundableError::NotFound {
                operation_id: operation_id.clone(),
            })?;
        if !transition.permits(order.status) {
            return Err(FundableError::InvalidStatus {
                operation_id: operation_id.clone(),
                status: order.status,
                transition,
            });
        }
        order.status = transition.target();
        Ok(&*order)
    }

    /// All records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FundOrder> {
        self.sequence.iter().filter_map(|id| self.orders.get(id))
    }
}

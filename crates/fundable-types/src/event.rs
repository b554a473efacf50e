//! Structured notifications emitted by every state-changing call
//!
//! Field names and presence are part of the contract with audit and
//! monitoring consumers and never vary by code path.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, OperationId};

/// Events emitted by fund-order and role operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FundableEvent {
    /// A fund order was created
    FundOrdered {
        orderer: AccountId,
        operation_id: OperationId,
        wallet_to_fund: AccountId,
        value: Amount,
        instructions: String,
    },

    /// A fund agent started processing an order
    FundInProcess {
        orderer: AccountId,
        operation_id: OperationId,
    },

    /// Value was minted to the wallet
    FundExecuted {
        orderer: AccountId,
        operation_id: OperationId,
    },

    /// A fund agent rejected an order
    FundRejected {
        orderer: AccountId,
        operation_id: OperationId,
        reason: String,
    },

    /// The orderer or the funded wallet withdrew the order
    FundCancelled {
        orderer: AccountId,
        operation_id: OperationId,
    },

    FundAgentAdded { account: AccountId },

    FundAgentRemoved { account: AccountId },

    /// A wallet delegated ordering to an operator
    FundOperatorAuthorized {
        operator: AccountId,
        wallet: AccountId,
    },

    /// A wallet withdrew an operator delegation
    FundOperatorRevoked {
        operator: AccountId,
        wallet: AccountId,
    },
}

impl FundableEvent {
    /// Stable event name, used as a log field and audit key
    pub fn name(&self) -> &'static str {
        match self {
            Self::FundOrdered { .. } => "FundOrdered",
            Self::FundInProcess { .. } => "FundInProcess",
            Self::FundExecuted { .. } => "FundExecuted",
            Self::FundRejected { .. } => "FundRejected",
            Self::FundCancelled { .. } => "FundCancelled",
            Self::FundAgentAdded { .. } => "FundAgentAdded",
            Self::FundAgentRemoved { .. } => "FundAgentRemoved",
            Self::FundOperatorAuthorized { .. } => "FundOperatorAuthorized",
            Self::FundOperatorRevoked { .. } => "FundOperatorRevoked",
        }
    }

    /// The fund order this event concerns, if any
    pub fn operation_id(&self) -> Option<&OperationId> {
        match self {
            Self::FundOrdered { operation_id, .. }
            | Self::FundInProcess { operation_id, .. }
            | Self::FundExecuted { operation_id, .. }
            | Self::FundRejected { operation_id, .. }
            | Self::FundCancelled { operation_id, .. } => Some(operation_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = FundableEvent::FundCancelled {
            orderer: AccountId::new("w"),
            operation_id: OperationId::new("op1"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FundCancelled");
        assert_eq!(json["operation_id"], "op1");
        assert_eq!(json["orderer"], "w");
    }

    #[test]
    fn test_operation_id_accessor() {
        let ordered = FundableEvent::FundInProcess {
            orderer: AccountId::new("w"),
            operation_id: OperationId::new("op9"),
        };
        assert_eq!(ordered.operation_id(), Some(&OperationId::new("op9")));

        let role = FundableEvent::FundAgentAdded {
            account: AccountId::new("a"),
        };
        assert_eq!(role.operation_id(), None);
        assert_eq!(role.name(), "FundAgentAdded");
    }
}

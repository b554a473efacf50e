//! Error types for fund-order operations
//!
//! Every failure aborts the call with no mutation and no event. Each variant
//! belongs to exactly one [`ErrorKind`]; callers branch on the kind and
//! surface the message.

use fundable_ledger::LedgerError;
use fundable_types::{AccountId, OperationId};
use thiserror::Error;

use crate::order::{FundStatus, FundTransition};

/// Coarse classification of a [`FundableError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty operation id or instructions, zero value, null identity
    InvalidArgument,
    /// Operation id already used
    DuplicateOperation,
    /// Caller lacks the role the call requires
    Unauthorized,
    /// The order exists but its status does not permit the transition
    InvalidStatus,
    /// No order with that operation id
    NotFound,
    /// The value ledger refused the mint
    Ledger,
    /// Snapshot persistence failed
    Storage,
}

/// Errors that can occur during fund-order and role operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FundableError {
    #[error("Operation ID must not be empty")]
    EmptyOperationId,

    #[error("Value must be greater than zero")]
    ZeroValue,

    #[error("Instructions must not be empty")]
    EmptyInstructions,

    #[error("WalletToFund address must not be zero address")]
    NullWallet,

    #[error("Account must not be zero address")]
    NullAccount,

    #[error("This operationId already exists: {operation_id}")]
    DuplicateOperation { operation_id: OperationId },

    #[error("{caller} does not have the fund agent role")]
    NotFundAgent { caller: AccountId },

    #[error("This operator is not authorized: {operator} for wallet {wallet}")]
    OperatorNotAuthorized {
        operator: AccountId,
        wallet: AccountId,
    },

    #[error("Only the orderer or the wallet to fund can cancel {operation_id}, not {caller}")]
    NotOrdererOrWallet {
        caller: AccountId,
        operation_id: OperationId,
    },

    #[error("Only {wallet} can manage its fund operators, not {caller}")]
    NotWalletOwner { caller: AccountId, wallet: AccountId },

    #[error("{operator} is already authorized for wallet {wallet}")]
    OperatorAlreadyAuthorized {
        operator: AccountId,
        wallet: AccountId,
    },

    #[error("{operator} is not authorized for wallet {wallet}")]
    OperatorNotGranted {
        operator: AccountId,
        wallet: AccountId,
    },

    #[error("{account} is not a fund agent")]
    FundAgentNotFound { account: AccountId },

    #[error("{transition} ({operation_id} is {status})")]
    InvalidStatus {
        operation_id: OperationId,
        status: FundStatus,
        transition: FundTransition,
    },

    #[error("Fund order {operation_id} not found")]
    NotFound { operation_id: OperationId },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Minted {operation_id} but could not record it as executed")]
    ExecutionDiverged { operation_id: OperationId },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl FundableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOperationId
            | Self::ZeroValue
            | Self::EmptyInstructions
            | Self::NullWallet
            | Self::NullAccount
            | Self::FundAgentNotFound { .. } => ErrorKind::InvalidArgument,
            Self::DuplicateOperation { .. } => ErrorKind::DuplicateOperation,
            Self::NotFundAgent { .. }
            | Self::OperatorNotAuthorized { .. }
            | Self::NotOrdererOrWallet { .. }
            | Self::NotWalletOwner { .. }
            | Self::OperatorAlreadyAuthorized { .. }
            | Self::OperatorNotGranted { .. } => ErrorKind::Unauthorized,
            Self::InvalidStatus { .. } => ErrorKind::InvalidStatus,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Ledger(_) | Self::ExecutionDiverged { .. } => ErrorKind::Ledger,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }
}

impl From<serde_json::Error> for FundableError {
    fn from(e: serde_json::Error) -> Self {
        FundableError::Storage {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for FundableError {
    fn from(e: std::io::Error) -> Self {
        FundableError::Storage {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FundableError>;

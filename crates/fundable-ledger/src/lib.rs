//! Fundable Ledger - The value ledger that realises fund execution
//!
//! Executing a fund order ends with a `mint` against a [`ValueLedger`].
//! The fund-order core only depends on the trait; [`Ledger`] is the
//! in-memory implementation used by services and tests.
//!
//! The in-memory ledger is:
//! - Single-asset (one issued value unit)
//! - Account-keyed by `AccountId`
//! - Append-only (every credit is recorded as an entry)
//! - Correlated (each entry carries the operation that caused it)
//!
//! # Invariants
//!
//! 1. Zero-value credits are refused
//! 2. Balances and total supply never overflow silently
//! 3. A failed credit leaves balances and entries untouched

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fundable_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Balance overflow crediting {amount} to {account}")]
    BalanceOverflow { account: String, amount: u64 },

    #[error("Supply overflow minting {amount}")]
    SupplyOverflow { amount: u64 },

    #[error("Ledger unavailable: {message}")]
    Unavailable { message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The value-ledger collaborator contract
///
/// `mint` must be all-or-nothing: an `Err` means no balance changed.
#[async_trait]
pub trait ValueLedger: Send + Sync {
    /// Credit newly issued value to `account`, returning the new balance
    async fn mint(
        &self,
        account: &AccountId,
        amount: Amount,
        correlation_id: &str,
    ) -> Result<Amount>;

    /// Current balance of `account`
    async fn balance_of(&self, account: &AccountId) -> Amount;
}

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single credit recorded by the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub account: AccountId,
    pub amount: Amount,
    pub balance_after: Amount,
    /// Operation that caused the credit
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Amount>,
    entries: Vec<LedgerEntry>,
    total_supply: Amount,
}

/// In-memory value ledger
///
/// Cheap to clone; clones share the same state.
#[derive(Clone, Default)]
pub struct Ledger {
    state: Arc<RwLock<LedgerState>>,
}

impl Ledger {
    /// Create a new in-memory ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account, returning the new balance and the entry ID
    pub async fn credit(
        &self,
        account: &AccountId,
        amount: Amount,
        correlation_id: impl Into<String>,
    ) -> Result<(Amount, EntryId)> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let mut state = self.state.write().await;

        let current = state.balances.get(account).copied().unwrap_or_default();
        let new_balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: account.to_string(),
                amount: amount.0,
            })?;
        let new_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount: amount.0 })?;

        // Every check passed, now apply
        let entry = LedgerEntry {
            entry_id: EntryId::new(),
            account: account.clone(),
            amount,
            balance_after: new_balance,
            correlation_id: correlation_id.into(),
            created_at: Utc::now(),
        };
        let entry_id = entry.entry_id.clone();

        state.balances.insert(account.clone(), new_balance);
        state.total_supply = new_supply;
        state.entries.push(entry);

        tracing::debug!(
            account = %account,
            amount = amount.0,
            balance = new_balance.0,
            "ledger credit"
        );

        Ok((new_balance, entry_id))
    }

    /// Get the balance of an account
    pub async fn balance(&self, account: &AccountId) -> Amount {
        let state = self.state.read().await;
        state.balances.get(account).copied().unwrap_or_default()
    }

    /// Total value minted so far
    pub async fn total_supply(&self) -> Amount {
        self.state.read().await.total_supply
    }

    /// Get all entries for an account
    pub async fn entries_for(&self, account: &AccountId) -> Vec<LedgerEntry> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Get entries caused by a given operation
    pub async fn entries_correlated(&self, correlation_id: &str) -> Vec<LedgerEntry> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// Get the total number of entries
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl ValueLedger for Ledger {
    async fn mint(
        &self,
        account: &AccountId,
        amount: Amount,
        correlation_id: &str,
    ) -> Result<Amount> {
        let (balance, _) = self.credit(account, amount, correlation_id).await?;
        Ok(balance)
    }

    async fn balance_of(&self, account: &AccountId) -> Amount {
        self.balance(account).await
    }
}

//! Durable snapshots of the owned state
//!
//! A snapshot captures the authorization registry and every fund order, in
//! insertion order, as JSON.

use std::path::Path;

use fundable_types::{AccountId, TYPES_VERSION};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::order::{FundOrder, FundOrderBook};
use crate::roles::AuthorizationRegistry;
use crate::state::FundableState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundableSnapshot {
    /// Schema version of the types that produced the snapshot
    pub version: String,
    pub token_operator: AccountId,
    pub registry: AuthorizationRegistry,
    /// Oldest first
    pub orders: Vec<FundOrder>,
}

impl FundableSnapshot {
    pub(crate) fn capture(state: &FundableState) -> Self {
        Self {
            version: TYPES_VERSION.to_string(),
            token_operator: state.token_operator().clone(),
            registry: state.roles().clone(),
            orders: state.orders().iter().cloned().collect(),
        }
    }

    pub(crate) fn into_state(self) -> Result<FundableState> {
        let orders = FundOrderBook::from_orders(self.orders)?;
        Ok(FundableState::from_parts(self.token_operator, self.registry, orders))
    }

    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

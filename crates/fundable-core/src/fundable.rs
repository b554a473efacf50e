//! The fund-order service
//!
//! `Fundable` serializes every call: mutations hold the state write guard for
//! their whole validate, mutate, publish sequence, so the check-then-insert
//! of a new operation id is atomic and no two calls interleave. Events are
//! published only after the change is committed, and in commit order.

use std::path::Path;
use std::sync::Arc;

use fundable_audit::{AuditLog, EventBus, EventSink};
use fundable_ledger::ValueLedger;
use fundable_types::{AccountId, Amount, FundableEvent, OperationId};
use tokio::sync::RwLock;

use crate::config::FundableConfig;
use crate::context::CallContext;
use crate::error::{FundableError, Result};
use crate::order::FundOrder;
use crate::snapshot::FundableSnapshot;
use crate::state::FundableState;

/// Fund-order ledger and authorization registry behind one lock
pub struct Fundable {
    state: RwLock<FundableState>,
    ledger: Arc<dyn ValueLedger>,
    sinks: Vec<Arc<dyn EventSink>>,
}

/// A configured service together with its built-in sinks
pub struct FundableServices {
    pub fundable: Arc<Fundable>,
    pub audit_log: Option<AuditLog>,
    pub event_bus: EventBus,
}

impl Fundable {
    /// Create a service deployed by `token_operator`, who becomes the
    /// first fund agent
    pub fn new(token_operator: AccountId, ledger: Arc<dyn ValueLedger>) -> Self {
        Self::from_state(FundableState::new(token_operator), ledger)
    }

    /// Rebuild a service from a snapshot
    pub fn restore(snapshot: FundableSnapshot, ledger: Arc<dyn ValueLedger>) -> Result<Self> {
        let state = snapshot.into_state()?;
        tracing::info!(
            orders = state.orders().len(),
            token_operator = %state.token_operator(),
            "fundable state restored"
        );
        Ok(Self::from_state(state, ledger))
    }

    fn from_state(state: FundableState, ledger: Arc<dyn ValueLedger>) -> Self {
        Self {
            state: RwLock::new(state),
            ledger,
            sinks: Vec::new(),
        }
    }

    /// Register an additional event listener
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Wire a service from configuration
    ///
    /// Restores from `storage.snapshot_path` when that file exists; failing
    /// to probe the path is a `Storage` error, not a fresh start.
    pub async fn from_config(
        config: &FundableConfig,
        ledger: Arc<dyn ValueLedger>,
    ) -> Result<FundableServices> {
        let configured_operator = AccountId::new(config.issuer.token_operator.clone());
        let existing = match &config.storage.snapshot_path {
            Some(path) => tokio::fs::try_exists(path).await?.then_some(path),
            None => None,
        };
        let fundable = match existing {
            Some(path) => {
                let snapshot = FundableSnapshot::read_from(path).await?;
                if snapshot.token_operator != configured_operator {
                    tracing::warn!(
                        configured = %configured_operator,
                        restored = %snapshot.token_operator,
                        "configured token operator ignored in favour of the snapshot"
                    );
                }
                Self::restore(snapshot, ledger)?
            }
            None => Self::new(configured_operator, ledger),
        };
        tracing::info!(
            asset_symbol = %config.issuer.asset_symbol,
            audit_enabled = config.events.audit_enabled,
            "fundable service configured"
        );

        let event_bus = EventBus::new(config.events.channel_capacity);
        let mut fundable = fundable.with_sink(Arc::new(event_bus.clone()));

        let audit_log = if config.events.audit_enabled {
            let log = AuditLog::new();
            fundable = fundable.with_sink(Arc::new(log.clone()));
            Some(log)
        } else {
            None
        };

        Ok(FundableServices {
            fundable: Arc::new(fundable),
            audit_log,
            event_bus,
        })
    }

    // ========================================================================
    // Authorization registry
    // ========================================================================

    pub async fn add_fund_agent(&self, ctx: &CallContext, account: &AccountId) -> Result<FundableEvent> {
        self.apply(ctx, "add_fund_agent", None, |state| {
            state.roles_mut().add_fund_agent(&ctx.caller, account)
        })
        .await
    }

    pub async fn remove_fund_agent(&self, ctx: &CallContext, account: &AccountId) -> Result<FundableEvent> {
        self.apply(ctx, "remove_fund_agent", None, |state| {
            state.roles_mut().remove_fund_agent(&ctx.caller, account)
        })
        .await
    }

    /// Drop the caller's own fund agent role
    pub async fn renounce_fund_agent(&self, ctx: &CallContext) -> Result<FundableEvent> {
        self.apply(ctx, "renounce_fund_agent", None, |state| {
            state.roles_mut().renounce_fund_agent(&ctx.caller)
        })
        .await
    }

    pub async fn is_fund_agent(&self, account: &AccountId) -> bool {
        self.state.read().await.roles().is_fund_agent(account)
    }

    pub async fn fund_agents(&self) -> Vec<AccountId> {
        self.state.read().await.roles().fund_agents()
    }

    pub async fn authorize_operator(
        &self,
        ctx: &CallContext,
        wallet: &AccountId,
        operator: &AccountId,
    ) -> Result<FundableEvent> {
        self.apply(ctx, "authorize_operator", None, |state| {
            state.roles_mut().authorize_operator(&ctx.caller, wallet, operator)
        })
        .await
    }

    pub async fn revoke_operator(
        &self,
        ctx: &CallContext,
        wallet: &AccountId,
        operator: &AccountId,
    ) -> Result<FundableEvent> {
        self.apply(ctx, "revoke_operator", None, |state| {
            state.roles_mut().revoke_operator(&ctx.caller, wallet, operator)
        })
        .await
    }

    pub async fn is_operator_for(&self, operator: &AccountId, wallet: &AccountId) -> bool {
        self.state.read().await.roles().is_operator_for(operator, wallet)
    }

    pub async fn operators_for(&self, wallet: &AccountId) -> Vec<AccountId> {
        self.state.read().await.roles().operators_for(wallet)
    }

    // ========================================================================
    // Fund orders
    // ========================================================================

    /// Order `value` for the caller's own wallet
    pub async fn order_fund(
        &self,
        ctx: &CallContext,
        operation_id: &OperationId,
        value: Amount,
        instructions: &str,
    ) -> Result<FundableEvent> {
        self.apply(ctx, "order_fund", Some(operation_id), |state| {
            state.order_fund(&ctx.caller, operation_id, value, instructions)
        })
        .await
    }

    /// Order `value` for `wallet_to_fund`, as one of its operators
    pub async fn order_fund_from(
        &self,
        ctx: &CallContext,
        operation_id: &OperationId,
        wallet_to_fund: &AccountId,
        value: Amount,
        instructions: &str,
    ) -> Result<FundableEvent> {
        self.apply(ctx, "order_fund_from", Some(operation_id), |state| {
            state.order_fund_from(&ctx.caller, operation_id, wallet_to_fund, value, instructions)
        })
        .await
    }

    pub async fn cancel_fund(&self, ctx: &CallContext, operation_id: &OperationId) -> Result<FundableEvent> {
        self.apply(ctx, "cancel_fund", Some(operation_id), |state| {
            state.cancel_fund(&ctx.caller, operation_id)
        })
        .await
    }

    pub async fn process_fund(&self, ctx: &CallContext, operation_id: &OperationId) -> Result<FundableEvent> {
        self.apply(ctx, "process_fund", Some(operation_id), |state| {
            state.process_fund(&ctx.caller, operation_id)
        })
        .await
    }

    pub async fn reject_fund(
        &self,
        ctx: &CallContext,
        operation_id: &OperationId,
        reason: &str,
    ) -> Result<FundableEvent> {
        self.apply(ctx, "reject_fund", Some(operation_id), |state| {
            state.reject_fund(&ctx.caller, operation_id, reason)
        })
        .await
    }

    /// Mint the order's value into its wallet and mark it executed
    ///
    /// The write guard is held across the mint. A mint error leaves the
    /// order `InProcess` and publishes nothing.
    pub async fn execute_fund(&self, ctx: &CallContext, operation_id: &OperationId) -> Result<FundableEvent> {
        let mut state = self.state.write().await;

        let order = match state.prepare_execute(&ctx.caller, operation_id) {
            Ok(order) => order,
            Err(err) => return Err(self.rejected(ctx, "execute_fund", Some(operation_id), err)),
        };

        let balance = match self
            .ledger
            .mint(&order.wallet_to_fund, order.value, order.operation_id.as_str())
            .await
        {
            Ok(balance) => balance,
            Err(err) => return Err(self.rejected(ctx, "execute_fund", Some(operation_id), err.into())),
        };

        let event = match state.commit_execute(operation_id) {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(
                    operation_id = %operation_id,
                    error = %err,
                    "value minted but fund order not marked executed"
                );
                return Err(FundableError::ExecutionDiverged {
                    operation_id: operation_id.clone(),
                });
            }
        };

        tracing::info!(
            operation_id = %operation_id,
            caller = %ctx.caller,
            wallet = %order.wallet_to_fund,
            value = order.value.0,
            balance = balance.0,
            "fund executed"
        );
        self.publish(&event).await;
        Ok(event)
    }

    /// Read one order; unknown ids fail with `NotFound`
    pub async fn retrieve_fund_data(&self, operation_id: &OperationId) -> Result<FundOrder> {
        let state = self.state.read().await;
        let order = state.retrieve_fund_data(operation_id);
        tracing::debug!(operation_id = %operation_id, found = order.is_ok(), "retrieve fund data");
        order
    }

    /// Every order, oldest first
    pub async fn fund_orders(&self) -> Vec<FundOrder> {
        self.state.read().await.orders().iter().cloned().collect()
    }

    pub async fn fund_orders_for_wallet(&self, wallet: &AccountId) -> Vec<FundOrder> {
        let state = self.state.read().await;
        state
            .orders()
            .iter()
            .filter(|order| &order.wallet_to_fund == wallet)
            .cloned()
            .collect()
    }

    pub async fn token_operator(&self) -> AccountId {
        self.state.read().await.token_operator().clone()
    }

    pub async fn balance_of(&self, account: &AccountId) -> Amount {
        self.ledger.balance_of(account).await
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub async fn snapshot(&self) -> FundableSnapshot {
        FundableSnapshot::capture(&*self.state.read().await)
    }

    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.snapshot().await;
        snapshot.write_to(path.as_ref()).await?;
        tracing::info!(path = %path.as_ref().display(), orders = snapshot.orders.len(), "snapshot saved");
        Ok(())
    }

    pub async fn load_snapshot(path: impl AsRef<Path>, ledger: Arc<dyn ValueLedger>) -> Result<Self> {
        Self::restore(FundableSnapshot::read_from(path).await?, ledger)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run one synchronous transition under the write guard
    async fn apply<F>(
        &self,
        ctx: &CallContext,
        action: &'static str,
        operation_id: Option<&OperationId>,
        transition: F,
    ) -> Result<FundableEvent>
    where
        F: FnOnce(&mut FundableState) -> Result<FundableEvent>,
    {
        let mut state = self.state.write().await;
        match transition(&mut *state) {
            Ok(event) => {
                tracing::info!(
                    action,
                    caller = %ctx.caller,
                    operation_id = operation_id.map(OperationId::as_str),
                    event = event.name(),
                    "fundable call committed"
                );
                self.publish(&event).await;
                Ok(event)
            }
            Err(err) => Err(self.rejected(ctx, action, operation_id, err)),
        }
    }

    fn rejected(
        &self,
        ctx: &CallContext,
        action: &'static str,
        operation_id: Option<&OperationId>,
        err: FundableError,
    ) -> FundableError {
        tracing::warn!(
            action,
            caller = %ctx.caller,
            operation_id = operation_id.map(OperationId::as_str),
            kind = ?err.kind(),
            error = %err,
            "fundable call rejected"
        );
        err
    }

    async fn publish(&self, event: &FundableEvent) {
        for sink in &self.sinks {
            sink.publish(event).await;
        }
    }
}

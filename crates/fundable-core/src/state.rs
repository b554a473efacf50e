//! Synchronous fund-order state machine
//!
//! `FundableState` is the whole owned state: the authorization registry and
//! the order book. Each method maps `(state, caller, arguments)` to either a
//! mutated state plus the event to emit, or an error with the state left
//! exactly as it was. Validation always completes before the first write.

use fundable_types::{AccountId, Amount, FundableEvent, OperationId};

use crate::error::{FundableError, Result};
use crate::order::{FundOrder, FundOrderBook, FundStatus, FundTransition};
use crate::roles::AuthorizationRegistry;

#[derive(Debug, Clone)]
pub struct FundableState {
    token_operator: AccountId,
    pub(crate) roles: AuthorizationRegistry,
    pub(crate) orders: FundOrderBook,
}

impl FundableState {
    /// Fresh state; `token_operator` becomes the first fund agent
    pub fn new(token_operator: AccountId) -> Self {
        Self {
            roles: AuthorizationRegistry::new(token_operator.clone()),
            token_operator,
            orders: FundOrderBook::new(),
        }
    }

    pub(crate) fn from_parts(
        token_operator: AccountId,
        roles: AuthorizationRegistry,
        orders: FundOrderBook,
    ) -> Self {
        Self {
            token_operator,
            roles,
            orders,
        }
    }

    pub fn token_operator(&self) -> &AccountId {
        &self.token_operator
    }

    pub fn roles(&self) -> &AuthorizationRegistry {
        &self.roles
    }

    pub fn roles_mut(&mut self) -> &mut AuthorizationRegistry {
        &mut self.roles
    }

    pub fn orders(&self) -> &FundOrderBook {
        &self.orders
    }

    /// Order value for the caller's own wallet
    pub fn order_fund(
        &mut self,
        caller: &AccountId,
        operation_id: &OperationId,
        value: Amount,
        instructions: &str,
    ) -> Result<FundableEvent> {
        self.check_new_operation(operation_id, value)?;
        if instructions.is_empty() {
            return Err(FundableError::EmptyInstructions);
        }
        self.create(caller, operation_id, caller, value, instructions)
    }

    /// Order value for `wallet_to_fund` as its delegated operator
    pub fn order_fund_from(
        &mut self,
        caller: &AccountId,
        operation_id: &OperationId,
        wallet_to_fund: &AccountId,
        value: Amount,
        instructions: &str,
    ) -> Result<FundableEvent> {
        self.check_new_operation(operation_id, value)?;
        if wallet_to_fund.is_null() {
            return Err(FundableError::NullWallet);
        }
        if !self.roles.is_operator_for(caller, wallet_to_fund) {
            return Err(FundableError::OperatorNotAuthorized {
                operator: caller.clone(),
                wallet: wallet_to_fund.clone(),
            });
        }
        if instructions.is_empty() {
            return Err(FundableError::EmptyInstructions);
        }
        self.create(caller, operation_id, wallet_to_fund, value, instructions)
    }

    /// Withdraw an order that nobody started processing
    pub fn cancel_fund(&mut self, caller: &AccountId, operation_id: &OperationId) -> Result<FundableEvent> {
        let order = self.locate(operation_id, FundTransition::Cancel)?;
        if caller != &order.orderer && caller != &order.wallet_to_fund {
            return Err(FundableError::NotOrdererOrWallet {
                caller: caller.clone(),
                operation_id: operation_id.clone(),
            });
        }
        let order = self.orders.transition(operation_id, FundTransition::Cancel)?;
        Ok(FundableEvent::FundCancelled {
            orderer: order.orderer.clone(),
            operation_id: order.operation_id.clone(),
        })
    }

    pub fn process_fund(&mut self, caller: &AccountId, operation_id: &OperationId) -> Result<FundableEvent> {
        self.locate_as_agent(caller, operation_id, FundTransition::Process)?;
        let order = self.orders.transition(operation_id, FundTransition::Process)?;
        Ok(FundableEvent::FundInProcess {
            orderer: order.orderer.clone(),
            operation_id: order.operation_id.clone(),
        })
    }

    pub fn reject_fund(
        &mut self,
        caller: &AccountId,
        operation_id: &OperationId,
        reason: &str,
    ) -> Result<FundableEvent> {
        self.locate_as_agent(caller, operation_id, FundTransition::Reject)?;
        let order = self.orders.transition(operation_id, FundTransition::Reject)?;
        Ok(FundableEvent::FundRejected {
            orderer: order.orderer.clone(),
            operation_id: order.operation_id.clone(),
            reason: reason.to_string(),
        })
    }

    /// First half of execution: every check, no writes
    ///
    /// Returns the order to mint for. The caller mints, then calls
    /// [`commit_execute`](Self::commit_execute) without releasing its
    /// exclusive access in between.
    pub fn prepare_execute(&self, caller: &AccountId, operation_id: &OperationId) -> Result<FundOrder> {
        let order = self.locate_as_agent(caller, operation_id, FundTransition::Execute)?;
        Ok(order.clone())
    }

    /// Second half of execution, after the mint succeeded
    pub fn commit_execute(&mut self, operation_id: &OperationId) -> Result<FundableEvent> {
        let order = self.orders.transition(operation_id, FundTransition::Execute)?;
        Ok(FundableEvent::FundExecuted {
            orderer: order.orderer.clone(),
            operation_id: order.operation_id.clone(),
        })
    }

    pub fn retrieve_fund_data(&self, operation_id: &OperationId) -> Result<FundOrder> {
        self.orders
            .get(operation_id)
            .cloned()
            .ok_or_else(|| FundableError::NotFound {
                operation_id: operation_id.clone(),
            })
    }

    /// Empty id, then zero value, then reuse
    fn check_new_operation(&self, operation_id: &OperationId, value: Amount) -> Result<()> {
        if operation_id.is_empty() {
            return Err(FundableError::EmptyOperationId);
        }
        if value.is_zero() {
            return Err(FundableError::ZeroValue);
        }
        if self.orders.contains(operation_id) {
            return Err(FundableError::DuplicateOperation {
                operation_id: operation_id.clone(),
            });
        }
        Ok(())
    }

    fn create(
        &mut self,
        orderer: &AccountId,
        operation_id: &OperationId,
        wallet_to_fund: &AccountId,
        value: Amount,
        instructions: &str,
    ) -> Result<FundableEvent> {
        let order = self.orders.insert(FundOrder {
            operation_id: operation_id.clone(),
            orderer: orderer.clone(),
            wallet_to_fund: wallet_to_fund.clone(),
            value,
            instructions: instructions.to_string(),
            status: FundStatus::Ordered,
        })?;
        Ok(FundableEvent::FundOrdered {
            orderer: order.orderer.clone(),
            operation_id: order.operation_id.clone(),
            wallet_to_fund: order.wallet_to_fund.clone(),
            value: order.value,
            instructions: order.instructions.clone(),
        })
    }

    /// Existence first, then status
    fn locate(&self, operation_id: &OperationId, transition: FundTransition) -> Result<&FundOrder> {
        let order = self.find(operation_id)?;
        Self::check_status(order, transition)?;
        Ok(order)
    }

    /// Existence first, then the fund agent role, then status
    fn locate_as_agent(
        &self,
        caller: &AccountId,
        operation_id: &OperationId,
        transition: FundTransition,
    ) -> Result<&FundOrder> {
        let order = self.find(operation_id)?;
        self.roles.ensure_fund_agent(caller)?;
        Self::check_status(order, transition)?;
        Ok(order)
    }

    fn find(&self, operation_id: &OperationId) -> Result<&FundOrder> {
        self.orders
            .get(operation_id)
            .ok_or_else(|| FundableError::NotFound {
                operation_id: operation_id.clone(),
            })
    }

    fn check_status(order: &FundOrder, transition: FundTransition) -> Result<()> {
        if !transition.permits(order.status) {
            return Err(FundableError::InvalidStatus {
                operation_id: order.operation_id.clone(),
                status: order.status,
                transition,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const INSTR: &str = "{\"messageId\": \"Example Message ID\"}";

    fn id(s: &str) -> AccountId {
        AccountId::new(s)
    }

    fn op(s: &str) -> OperationId {
        OperationId::new(s)
    }

    fn state_with_operator() -> FundableState {
        let mut state = FundableState::new(id("deployer"));
        state
            .roles_mut()
            .authorize_operator(&id("wallet"), &id("wallet"), &id("operator"))
            .unwrap();
        state
    }

    #[test]
    fn test_order_fund_validation_order() {
        let mut state = FundableState::new(id("deployer"));

        // Every argument bad: the empty id is reported
        let err = state.order_fund(&id("w"), &op(""), Amount::zero(), "").unwrap_err();
        assert_eq!(err, FundableError::EmptyOperationId);

        let err = state.order_fund(&id("w"), &op("op1"), Amount::zero(), "").unwrap_err();
        assert_eq!(err, FundableError::ZeroValue);

        state.order_fund(&id("w"), &op("op1"), Amount::new(1), INSTR).unwrap();
        let err = state.order_fund(&id("w"), &op("op1"), Amount::new(1), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateOperation);

        let err = state.order_fund(&id("w"), &op("op2"), Amount::new(1), "").unwrap_err();
        assert_eq!(err, FundableError::EmptyInstructions);
        assert_eq!(state.orders().len(), 1);
    }

    #[test]
    fn test_order_fund_from_validation_order() {
        let mut state = state_with_operator();

        let err = state
            .order_fund_from(&id("stranger"), &op("op1"), &AccountId::zero(), Amount::new(1), "")
            .unwrap_err();
        assert_eq!(err, FundableError::NullWallet);

        let err = state
            .order_fund_from(&id("stranger"), &op("op1"), &id("wallet"), Amount::new(1), "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = state
            .order_fund_from(&id("operator"), &op("op1"), &id("wallet"), Amount::new(1), "")
            .unwrap_err();
        assert_eq!(err, FundableError::EmptyInstructions);
        assert!(state.orders().is_empty());

        let event = state
            .order_fund_from(&id("operator"), &op("op1"), &id("wallet"), Amount::new(5), INSTR)
            .unwrap();
        assert_eq!(
            event,
            FundableEvent::FundOrdered {
                orderer: id("operator"),
                operation_id: op("op1"),
                wallet_to_fund: id("wallet"),
                value: Amount::new(5),
                instructions: INSTR.to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_operation_is_not_found() {
        let mut state = FundableState::new(id("deployer"));
        let missing = op("missing");

        assert_eq!(state.cancel_fund(&id("w"), &missing).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(state.process_fund(&id("deployer"), &missing).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            state.reject_fund(&id("deployer"), &missing, "r").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(state.prepare_execute(&id("deployer"), &missing).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(state.retrieve_fund_data(&missing).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_role_checked_before_status() {
        let mut state = FundableState::new(id("deployer"));
        state.order_fund(&id("w"), &op("op1"), Amount::new(1), INSTR).unwrap();
        state.cancel_fund(&id("w"), &op("op1")).unwrap();

        // Non-agent on a cancelled order
        assert_eq!(state.process_fund(&id("w"), &op("op1")).unwrap_err().kind(), ErrorKind::Unauthorized);
        assert_eq!(
            state.reject_fund(&id("w"), &op("op1"), "r").unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(state.prepare_execute(&id("w"), &op("op1")).unwrap_err().kind(), ErrorKind::Unauthorized);

        // An agent gets the status error
        assert_eq!(
            state.process_fund(&id("deployer"), &op("op1")).unwrap_err().kind(),
            ErrorKind::InvalidStatus
        );

        // Cancel needs the record's parties, so its status check comes first
        assert_eq!(state.cancel_fund(&id("stranger"), &op("op1")).unwrap_err().kind(), ErrorKind::InvalidStatus);
    }

    #[test]
    fn test_failed_transition_leaves_state() {
        let mut state = FundableState::new(id("deployer"));
        state.order_fund(&id("w"), &op("op1"), Amount::new(1), INSTR).unwrap();

        assert!(state.process_fund(&id("w"), &op("op1")).is_err());
        assert!(state.cancel_fund(&id("deployer"), &op("op1")).is_err());
        assert_eq!(
            state.retrieve_fund_data(&op("op1")).unwrap().status,
            FundStatus::Ordered
        );
    }

    #[test]
    fn test_execute_in_two_phases() {
        let mut state = FundableState::new(id("deployer"));
        state.order_fund(&id("w"), &op("op1"), Amount::new(9), INSTR).unwrap();

        let err = state.prepare_execute(&id("deployer"), &op("op1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatus);

        state.process_fund(&id("deployer"), &op("op1")).unwrap();
        let err = state.prepare_execute(&id("w"), &op("op1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let order = state.prepare_execute(&id("deployer"), &op("op1")).unwrap();
        assert_eq!(order.value, Amount::new(9));
        assert_eq!(order.status, FundStatus::InProcess);

        let event = state.commit_execute(&op("op1")).unwrap();
        assert_eq!(
            event,
            FundableEvent::FundExecuted {
                orderer: id("w"),
                operation_id: op("op1"),
            }
        );
        assert_eq!(
            state.retrieve_fund_data(&op("op1")).unwrap().status,
            FundStatus::Executed
        );
    }

    #[test]
    fn test_reject_from_in_process() {
        let mut state = FundableState::new(id("deployer"));
        state.order_fund(&id("w"), &op("op1"), Amount::new(1), INSTR).unwrap();
        state.process_fund(&id("deployer"), &op("op1")).unwrap();

        let err = state.cancel_fund(&id("w"), &op("op1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatus);

        let event = state.reject_fund(&id("deployer"), &op("op1"), "no funds received").unwrap();
        assert_eq!(
            event,
            FundableEvent::FundRejected {
                orderer: id("w"),
                operation_id: op("op1"),
                reason: "no funds received".to_string(),
            }
        );
        let err = state.reject_fund(&id("deployer"), &op("op1"), "again").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatus);
    }

    #[test]
    fn test_operation_id_never_reused_after_terminal() {
        let mut state = FundableState::new(id("deployer"));
        state.order_fund(&id("w"), &op("op1"), Amount::new(1), INSTR).unwrap();
        state.cancel_fund(&id("w"), &op("op1")).unwrap();

        let err = state.order_fund(&id("other"), &op("op1"), Amount::new(2), INSTR).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateOperation);
    }
}

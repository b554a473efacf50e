//! Authorization registry: fund agents and per-wallet fund operators
//!
//! Every check is a pure function of `(registry, caller, target)`. Mutations
//! validate first and return the event to publish; a returned error means
//! nothing changed.

use std::collections::{BTreeMap, BTreeSet};

use fundable_types::{AccountId, FundableEvent};
use serde::{Deserialize, Serialize};

use crate::error::{FundableError, Result};

/// Who may process, execute and reject, and who may order on whose behalf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRegistry {
    fund_agents: BTreeSet<AccountId>,
    /// wallet -> operators granted by that wallet
    operator_grants: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl AuthorizationRegistry {
    /// Create a registry whose only fund agent is `initializer`
    pub fn new(initializer: AccountId) -> Self {
        let mut fund_agents = BTreeSet::new();
        fund_agents.insert(initializer);
        Self {
            fund_agents,
            operator_grants: BTreeMap::new(),
        }
    }

    pub fn is_fund_agent(&self, account: &AccountId) -> bool {
        self.fund_agents.contains(account)
    }

    /// Fail with `NotFundAgent` unless `caller` holds the role
    pub fn ensure_fund_agent(&self, caller: &AccountId) -> Result<()> {
        if self.is_fund_agent(caller) {
            Ok(())
        } else {
            Err(FundableError::NotFundAgent {
                caller: caller.clone(),
            })
        }
    }

    /// Grant the fund agent role; granting it twice is not an error
    pub fn add_fund_agent(&mut self, caller: &AccountId, account: &AccountId) -> Result<FundableEvent> {
        self.ensure_fund_agent(caller)?;
        if account.is_null() {
            return Err(FundableError::NullAccount);
        }
        self.fund_agents.insert(account.clone());
        Ok(FundableEvent::FundAgentAdded {
            account: account.clone(),
        })
    }

    /// Withdraw the fund agent role; a caller may remove itself
    pub fn remove_fund_agent(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<FundableEvent> {
        self.ensure_fund_agent(caller)?;
        if !self.fund_agents.remove(account) {
            return Err(FundableError::FundAgentNotFound {
                account: account.clone(),
            });
        }
        Ok(FundableEvent::FundAgentRemoved {
            account: account.clone(),
        })
    }

    pub fn renounce_fund_agent(&mut self, caller: &AccountId) -> Result<FundableEvent> {
        self.remove_fund_agent(caller, caller)
    }

    pub fn fund_agents(&self) -> Vec<AccountId> {
        self.fund_agents.iter().cloned().collect()
    }

    pub fn is_operator_for(&self, operator: &AccountId, wallet: &AccountId) -> bool {
        self.operator_grants
            .get(wallet)
            .is_some_and(|operators| operators.contains(operator))
    }

    /// `caller` must be `wallet`; the grant must not exist yet
    pub fn authorize_operator(
        &mut self,
        caller: &AccountId,
        wallet: &AccountId,
        operator: &AccountId,
    ) -> Result<FundableEvent> {
        Self::ensure_wallet_owner(caller, wallet)?;
        if operator.is_null() {
            return Err(FundableError::NullAccount);
        }
        if self.is_operator_for(operator, wallet) {
            return Err(FundableError::OperatorAlreadyAuthorized {
                operator: operator.clone(),
                wallet: wallet.clone(),
            });
        }
        self.operator_grants
            .entry(wallet.clone())
            .or_default()
            .insert(operator.clone());
        Ok(FundableEvent::FundOperatorAuthorized {
            operator: operator.clone(),
            wallet: wallet.clone(),
        })
    }

    /// `caller` must be `wallet`; the grant must exist
    pub fn revoke_operator(
        &mut self,
        caller: &AccountId,
        wallet: &AccountId,
        operator: &AccountId,
    ) -> Result<FundableEvent> {
        Self::ensure_wallet_owner(caller, wallet)?;
        let removed = match self.operator_grants.get_mut(wallet) {
            Some(operators) => {
                let removed = operators.remove(operator);
                if operators.is_empty() {
                    self.operator_grants.remove(wallet);
                }
                removed
            }
            None => false,
        };
        if !removed {
            return Err(FundableError::OperatorNotGranted {
                operator: operator.clone(),
                wallet: wallet.clone(),
            });
        }
        Ok(FundableEvent::FundOperatorRevoked {
            operator: operator.clone(),
            wallet: wallet.clone(),
        })
    }

    pub fn operators_for(&self, wallet: &AccountId) -> Vec<AccountId> {
        self.operator_grants
            .get(wallet)
            .map(|operators| operators.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_wallet_owner(caller: &AccountId, wallet: &AccountId) -> Result<()> {
        if caller == wallet {
            Ok(())
        } else {
            Err(FundableError::NotWalletOwner {
                caller: caller.clone(),
                wallet: wallet.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn id(s: &str) -> AccountId {
        AccountId::new(s)
    }

    #[test]
    fn test_initializer_is_fund_agent() {
        let registry = AuthorizationRegistry::new(id("deployer"));
        assert!(registry.is_fund_agent(&id("deployer")));
        assert!(!registry.is_fund_agent(&id("other")));
        assert_eq!(registry.fund_agents(), vec![id("deployer")]);
    }

    #[test]
    fn test_only_agents_manage_agents() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));

        let err = registry.add_fund_agent(&id("mallory"), &id("mallory")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!registry.is_fund_agent(&id("mallory")));

        let event = registry.add_fund_agent(&id("deployer"), &id("agent")).unwrap();
        assert_eq!(event, FundableEvent::FundAgentAdded { account: id("agent") });
        assert!(registry.is_fund_agent(&id("agent")));

        let err = registry.remove_fund_agent(&id("mallory"), &id("agent")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(registry.is_fund_agent(&id("agent")));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));
        registry.add_fund_agent(&id("deployer"), &id("agent")).unwrap();
        registry.add_fund_agent(&id("deployer"), &id("agent")).unwrap();
        assert_eq!(registry.fund_agents().len(), 2);
    }

    #[test]
    fn test_add_null_account_rejected() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));
        let err = registry
            .add_fund_agent(&id("deployer"), &AccountId::zero())
            .unwrap_err();
        assert_eq!(err, FundableError::NullAccount);
    }

    #[test]
    fn test_remove_and_renounce() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));
        registry.add_fund_agent(&id("deployer"), &id("agent")).unwrap();

        registry.remove_fund_agent(&id("deployer"), &id("agent")).unwrap();
        assert!(!registry.is_fund_agent(&id("agent")));

        let err = registry
            .remove_fund_agent(&id("deployer"), &id("agent"))
            .unwrap_err();
        assert!(matches!(err, FundableError::FundAgentNotFound { .. }));

        let event = registry.renounce_fund_agent(&id("deployer")).unwrap();
        assert_eq!(event, FundableEvent::FundAgentRemoved { account: id("deployer") });
        assert!(registry.fund_agents().is_empty());
    }

    #[test]
    fn test_operator_grants() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));

        let event = registry
            .authorize_operator(&id("wallet"), &id("wallet"), &id("op"))
            .unwrap();
        assert_eq!(
            event,
            FundableEvent::FundOperatorAuthorized {
                operator: id("op"),
                wallet: id("wallet"),
            }
        );
        assert!(registry.is_operator_for(&id("op"), &id("wallet")));
        assert!(!registry.is_operator_for(&id("wallet"), &id("op")));
        assert_eq!(registry.operators_for(&id("wallet")), vec![id("op")]);

        let err = registry
            .authorize_operator(&id("wallet"), &id("wallet"), &id("op"))
            .unwrap_err();
        assert!(matches!(err, FundableError::OperatorAlreadyAuthorized { .. }));

        registry
            .revoke_operator(&id("wallet"), &id("wallet"), &id("op"))
            .unwrap();
        assert!(!registry.is_operator_for(&id("op"), &id("wallet")));
        assert!(registry.operators_for(&id("wallet")).is_empty());

        let err = registry
            .revoke_operator(&id("wallet"), &id("wallet"), &id("op"))
            .unwrap_err();
        assert!(matches!(err, FundableError::OperatorNotGranted { .. }));
    }

    #[test]
    fn test_only_wallet_manages_its_operators() {
        let mut registry = AuthorizationRegistry::new(id("deployer"));

        let err = registry
            .authorize_operator(&id("deployer"), &id("wallet"), &id("op"))
            .unwrap_err();
        assert!(matches!(err, FundableError::NotWalletOwner { .. }));
        assert!(!registry.is_operator_for(&id("op"), &id("wallet")));

        registry
            .authorize_operator(&id("wallet"), &id("wallet"), &id("op"))
            .unwrap();
        let err = registry
            .revoke_operator(&id("op"), &id("wallet"), &id("op"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(registry.is_operator_for(&id("op"), &id("wallet")));
    }
}

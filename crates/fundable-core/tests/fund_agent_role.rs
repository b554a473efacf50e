use std::sync::Arc;

use fundable_core::{AccountId, Amount, CallContext, ErrorKind, Fundable, FundableEvent, OperationId};
use fundable_ledger::Ledger;

fn deploy() -> Fundable {
    Fundable::new(AccountId::new("owner"), Arc::new(Ledger::new()))
}

#[tokio::test]
async fn test_deployer_is_fund_agent() {
    let fundable = deploy();
    assert!(fundable.is_fund_agent(&AccountId::new("owner")).await);
    assert!(!fundable.is_fund_agent(&AccountId::new("other")).await);
    assert_eq!(fundable.fund_agents().await, vec![AccountId::new("owner")]);
}

#[tokio::test]
async fn test_add_fund_agent_by_non_agent() {
    let fundable = deploy();
    let err = fundable
        .add_fund_agent(&CallContext::new("other"), &AccountId::new("other"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(!fundable.is_fund_agent(&AccountId::new("other")).await);
}

#[tokio::test]
async fn test_add_fund_agent() {
    let fundable = deploy();
    let event = fundable
        .add_fund_agent(&CallContext::new("owner"), &AccountId::new("agent"))
        .await
        .unwrap();

    assert_eq!(
        event,
        FundableEvent::FundAgentAdded {
            account: AccountId::new("agent"),
        }
    );
    assert!(fundable.is_fund_agent(&AccountId::new("agent")).await);
}

#[tokio::test]
async fn test_add_zero_address_rejected() {
    let fundable = deploy();
    let err = fundable
        .add_fund_agent(&CallContext::new("owner"), &AccountId::zero())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_remove_fund_agent() {
    let fundable = deploy();
    let owner = CallContext::new("owner");
    fundable
        .add_fund_agent(&owner, &AccountId::new("agent"))
        .await
        .unwrap();

    let event = fundable
        .remove_fund_agent(&owner, &AccountId::new("agent"))
        .await
        .unwrap();
    assert_eq!(
        event,
        FundableEvent::FundAgentRemoved {
            account: AccountId::new("agent"),
        }
    );
    assert!(!fundable.is_fund_agent(&AccountId::new("agent")).await);

    let err = fundable
        .remove_fund_agent(&owner, &AccountId::new("agent"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_remove_fund_agent_by_non_agent() {
    let fundable = deploy();
    let err = fundable
        .remove_fund_agent(&CallContext::new("other"), &AccountId::new("owner"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(fundable.is_fund_agent(&AccountId::new("owner")).await);
}

#[tokio::test]
async fn test_renounce_fund_agent() {
    let fundable = deploy();
    let owner = CallContext::new("owner");
    fundable
        .add_fund_agent(&owner, &AccountId::new("agent"))
        .await
        .unwrap();

    fundable
        .renounce_fund_agent(&CallContext::new("agent"))
        .await
        .unwrap();
    assert!(!fundable.is_fund_agent(&AccountId::new("agent")).await);

    let err = fundable
        .renounce_fund_agent(&CallContext::new("agent"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_role_change_applies_to_pending_orders() {
    let fundable = deploy();
    let owner = CallContext::new("owner");
    let agent = CallContext::new("agent");
    let op = OperationId::new("op-1");

    fundable
        .order_fund(&CallContext::new("wallet"), &op, Amount::new(10), "wire")
        .await
        .unwrap();
    fundable.add_fund_agent(&owner, &agent.caller).await.unwrap();
    fundable.process_fund(&agent, &op).await.unwrap();

    fundable.remove_fund_agent(&owner, &agent.caller).await.unwrap();
    let err = fundable.execute_fund(&agent, &op).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    fundable.execute_fund(&owner, &op).await.unwrap();
    assert_eq!(fundable.balance_of(&AccountId::new("wallet")).await, Amount::new(10));
}

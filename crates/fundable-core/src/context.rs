//! Per-call context supplied by the host

use fundable_types::AccountId;

/// The authenticated caller of one operation
///
/// The host authenticates; the core only compares identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
}

impl CallContext {
    pub fn new(caller: impl Into<AccountId>) -> Self {
        Self {
            caller: caller.into(),
        }
    }

    pub fn caller(&self) -> &AccountId {
        &self.caller
    }
}

impl From<AccountId> for CallContext {
    fn from(caller: AccountId) -> Self {
        Self { caller }
    }
}

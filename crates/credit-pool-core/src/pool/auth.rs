use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CreditPoolError;
use crate::types::PrincipalId;
use crate::CreditPoolResult;

/// Who may do what in a pool. Checked once at the entry of every mutating
/// controller operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    pub owner: PrincipalId,
    #[serde(default)]
    pub approvers: BTreeSet<PrincipalId>,
}

impl AuthorizationPolicy {
    pub fn new(owner: impl Into<PrincipalId>) -> Self {
        Self {
            owner: owner.into(),
            approvers: BTreeSet::new(),
        }
    }

    pub fn with_approver(mut self, approver: impl Into<PrincipalId>) -> Self {
        self.approvers.insert(approver.into());
        self
    }

    pub fn is_owner(&self, caller: &str) -> bool {
        self.owner == caller
    }

    pub fn is_approver(&self, caller: &str) -> bool {
        self.approvers.contains(caller)
    }

    pub fn require_owner(&self, caller: &str) -> CreditPoolResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(CreditPoolError::OwnerRequired {
                caller: caller.to_string(),
            })
        }
    }

    pub fn require_approver(&self, caller: &str) -> CreditPoolResult<()> {
        if self.is_approver(caller) {
            Ok(())
        } else {
            Err(CreditPoolError::ApproverRequired {
                caller: caller.to_string(),
            })
        }
    }

    /// Default may be triggered by an approver or the owner.
    pub fn require_approver_or_owner(&self, caller: &str) -> CreditPoolResult<()> {
        if self.is_owner(caller) {
            return Ok(());
        }
        self.require_approver(caller)
    }

    /// Borrower operations must come from the borrower.
    pub fn require_borrower(&self, caller: &str, borrower: &str) -> CreditPoolResult<()> {
        if caller == borrower {
            Ok(())
        } else {
            Err(CreditPoolError::BorrowerMismatch {
                caller: caller.to_string(),
                borrower: borrower.to_string(),
            })
        }
    }
}

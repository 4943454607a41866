//! Authorization gate: pure precondition checks evaluated before a guarded
//! stage runs

use crate::error::{AccountError, AccountResult};
use ethers::types::Address;

/// Decides which of two caller policies applies to a guarded stage.
///
/// Signature validation is fee-consequential, so only the privileged caller
/// may trigger it; execution additionally admits the account owner so the
/// identity holder can act directly without routing through the privileged
/// caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationGate {
    privileged: Address,
}

impl AuthorizationGate {
    /// Creates a gate trusting the given privileged caller
    pub const fn new(privileged: Address) -> Self {
        Self { privileged }
    }

    /// The privileged caller this gate trusts
    pub const fn privileged(&self) -> Address {
        self.privileged
    }

    /// Caller must be the privileged caller
    pub fn require_privileged(&self, caller: Address) -> AccountResult<()> {
        if caller != self.privileged {
            return Err(AccountError::NotFromPrivilegedCaller {
                caller,
                privileged: self.privileged,
            });
        }
        Ok(())
    }

    /// Caller must be the privileged caller or the current account owner
    pub fn require_privileged_or_owner(
        &self,
        caller: Address,
        owner: Address,
    ) -> AccountResult<()> {
        if caller != self.privileged && caller != owner {
            return Err(AccountError::NotAuthorized { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_policy() {
        let privileged = Address::random();
        let gate = AuthorizationGate::new(privileged);

        assert!(gate.require_privileged(privileged).is_ok());
        assert!(matches!(
            gate.require_privileged(Address::random()),
            Err(AccountError::NotFromPrivilegedCaller { .. })
        ));
    }

    #[test]
    fn privileged_or_owner_policy() {
        let privileged = Address::random();
        let owner = Address::random();
        let gate = AuthorizationGate::new(privileged);

        assert!(gate.require_privileged_or_owner(privileged, owner).is_ok());
        assert!(gate.require_privileged_or_owner(owner, owner).is_ok());
        assert!(matches!(
            gate.require_privileged_or_owner(Address::random(), owner),
            Err(AccountError::NotAuthorized { .. })
        ));
    }
}

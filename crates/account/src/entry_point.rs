//! Account variant gated by an entry point contract captured at construction

use crate::{
    account::{recover_signer, AbstractAccount, FeeSettlement, ValidationOutcome},
    env::ChainEnvironment,
    error::{AccountError, AccountResult},
    gate::AuthorizationGate,
    nonce::NonceModel,
};
use aegis_primitives::{Operation, SigningScope};
use ethers::types::{Address, H256, U256};
use tracing::{debug, trace, warn};

/// An account whose privileged caller is an entry point contract address
/// supplied at construction and stored for the account's lifetime.
///
/// Nonce correctness of the validate stage is the entry point's
/// responsibility; the account performs no local check there (a documented
/// simplification of the minimal design). The account still holds a local
/// monotonic counter, consumed only on the permissionless relay path where
/// no privileged caller exists to do the bookkeeping.
#[derive(Clone, Debug)]
pub struct EntryPointGatedAccount {
    address: Address,
    owner: Address,
    gate: AuthorizationGate,
    nonce: NonceModel,
    chain_id: u64,
}

impl EntryPointGatedAccount {
    /// Creates an account at `address` owned by `owner`, trusting
    /// `entry_point` as its privileged caller
    pub fn new(address: Address, owner: Address, entry_point: Address, chain_id: u64) -> Self {
        Self {
            address,
            owner,
            gate: AuthorizationGate::new(entry_point),
            nonce: NonceModel::LocalMonotonic(U256::zero()),
            chain_id,
        }
    }

    /// The entry point address this account trusts
    pub fn entry_point(&self) -> Address {
        self.gate.privileged()
    }

    /// Current value of the account-held nonce counter
    pub fn nonce(&self) -> U256 {
        self.nonce.current(self.address)
    }

    fn scope(&self) -> SigningScope {
        SigningScope::EntryPoint { entry_point: self.gate.privileged(), chain_id: self.chain_id }
    }

    fn check_signature(&self, op: &Operation) -> ValidationOutcome {
        match recover_signer(op, &self.scope()) {
            Some(signer) if signer == self.owner => ValidationOutcome::Success,
            _ => ValidationOutcome::SigValidationFailed,
        }
    }

    fn dispatch(&self, env: &mut dyn ChainEnvironment, op: &Operation) -> AccountResult<()> {
        env.call(self.address, op.call_target, op.call_value, &op.call_data)
            .map(|_| ())
            .map_err(|revert| AccountError::ExecutionFailed { revert })
    }
}

impl AbstractAccount for EntryPointGatedAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.owner
    }

    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> AccountResult<()> {
        if caller != self.owner {
            return Err(AccountError::NotAuthorized { caller });
        }
        debug!("account {:?} transferred from {:?} to {:?}", self.address, self.owner, new_owner);
        self.owner = new_owner;
        Ok(())
    }

    fn validate(
        &mut self,
        _env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
        _aux: Option<(H256, H256)>,
    ) -> AccountResult<ValidationOutcome> {
        self.gate.require_privileged(caller)?;

        // nonce correctness is delegated to the entry point
        let outcome = self.check_signature(op);
        trace!("validated operation with nonce {} for {:?}: {:?}", op.nonce, self.address, outcome);
        Ok(outcome)
    }

    fn settle_fee(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        _op: &Operation,
        settlement: FeeSettlement<'_>,
    ) -> AccountResult<()> {
        self.gate.require_privileged(caller)?;

        match settlement {
            FeeSettlement::Prefund(missing_funds) => {
                if !missing_funds.is_zero() {
                    // best-effort repayment: the entry point independently
                    // verifies it received enough before proceeding
                    if !env.transfer(self.address, caller, missing_funds) {
                        warn!(
                            "prefund transfer of {missing_funds} from {:?} failed",
                            self.address
                        );
                    }
                }
                Ok(())
            }
            FeeSettlement::Direct | FeeSettlement::Sponsored(_) => {
                Err(AccountError::UnsupportedSettlement)
            }
        }
    }

    fn execute(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
    ) -> AccountResult<()> {
        self.gate.require_privileged_or_owner(caller, self.owner)?;

        debug!("executing operation for {:?} targeting {:?}", self.address, op.call_target);
        self.dispatch(env, op)
    }

    fn execute_from_outside(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
    ) -> AccountResult<()> {
        debug!("outside execution for {:?} relayed by {:?}", self.address, caller);

        // no privileged caller is present to consume a sentinel, so a bad
        // signature is fatal here; the pure check runs before the nonce
        // state is touched
        if !self.check_signature(op).is_success() {
            return Err(AccountError::InvalidSignature);
        }
        self.nonce.consume(self.address, op.nonce)?;
        self.dispatch(env, op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::InMemoryEnvironment;
    use aegis_primitives::OperationSigner;

    const CHAIN_ID: u64 = 1;

    fn account() -> (EntryPointGatedAccount, OperationSigner, Address) {
        let signer = OperationSigner::random();
        let entry_point = Address::random();
        let account =
            EntryPointGatedAccount::new(Address::random(), signer.address(), entry_point, CHAIN_ID);
        (account, signer, entry_point)
    }

    fn signed_op(account: &EntryPointGatedAccount, signer: &OperationSigner) -> Operation {
        let op = Operation::random().sender(account.address()).nonce(account.nonce());
        signer.sign_operation(&op, &account.scope()).unwrap()
    }

    #[test]
    fn validate_requires_privileged_caller() {
        let (mut account, signer, _) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);

        let err = account.validate(&mut env, Address::random(), &op, None).unwrap_err();
        assert!(matches!(err, AccountError::NotFromPrivilegedCaller { .. }));
    }

    #[test]
    fn validate_reports_signature_mismatch_as_value() {
        let (mut account, signer, entry_point) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);
        let tampered = op.clone().call_value(op.call_value + 1);

        let outcome = account.validate(&mut env, entry_point, &tampered, None).unwrap();
        assert_eq!(outcome, ValidationOutcome::SigValidationFailed);
        assert_eq!(outcome.sentinel(), U256::one());
    }

    #[test]
    fn validate_accepts_owner_signature() {
        let (mut account, signer, entry_point) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);

        let outcome = account.validate(&mut env, entry_point, &op, None).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn prefund_is_best_effort() {
        let (mut account, signer, entry_point) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);

        // unfunded account: the failed transfer is deliberately not surfaced
        account
            .settle_fee(&mut env, entry_point, &op, FeeSettlement::Prefund(1_000.into()))
            .unwrap();

        env.fund(account.address(), 5_000.into());
        account
            .settle_fee(&mut env, entry_point, &op, FeeSettlement::Prefund(1_000.into()))
            .unwrap();
        assert_eq!(env.balance(entry_point), 1_000.into());
        assert_eq!(env.balance(account.address()), 4_000.into());
    }

    #[test]
    fn direct_settlement_is_not_supported() {
        let (mut account, signer, entry_point) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);

        let err =
            account.settle_fee(&mut env, entry_point, &op, FeeSettlement::Direct).unwrap_err();
        assert!(matches!(err, AccountError::UnsupportedSettlement));
    }

    #[test]
    fn owner_may_execute_directly() {
        let (mut account, signer, _) = account();
        let mut env = InMemoryEnvironment::new();
        let op = signed_op(&account, &signer);

        account.execute(&mut env, signer.address(), &op).unwrap();
    }

    #[test]
    fn outside_execution_consumes_local_nonce() {
        let (mut account, signer, _) = account();
        let mut env = InMemoryEnvironment::new();
        let relayer = Address::random();
        let op = signed_op(&account, &signer);

        account.execute_from_outside(&mut env, relayer, &op).unwrap();
        assert_eq!(account.nonce(), U256::one());

        // replaying the same signed operation must fail on the nonce
        let err = account.execute_from_outside(&mut env, relayer, &op).unwrap_err();
        assert!(matches!(err, AccountError::NonceAdvanceFailed { .. }));
    }

    #[test]
    fn outside_execution_rejects_bad_signature() {
        let (mut account, _, _) = account();
        let mut env = InMemoryEnvironment::new();
        let op = Operation::random().sender(account.address());
        let forged = OperationSigner::random().sign_operation(&op, &account.scope()).unwrap();

        let err = account.execute_from_outside(&mut env, Address::random(), &forged).unwrap_err();
        assert!(matches!(err, AccountError::InvalidSignature));
        assert_eq!(account.nonce(), U256::zero());
    }

    #[test]
    fn ownership_transfer_is_owner_only() {
        let (mut account, signer, _) = account();
        let new_owner = Address::random();

        let err = account.transfer_ownership(Address::random(), new_owner).unwrap_err();
        assert!(matches!(err, AccountError::NotAuthorized { .. }));

        account.transfer_ownership(signer.address(), new_owner).unwrap();
        assert_eq!(account.owner(), new_owner);
    }
}

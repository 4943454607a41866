//! Account variant gated by the chain-defined bootloader address

use crate::{
    account::{recover_signer, AbstractAccount, FeeSettlement, ValidationOutcome},
    env::ChainEnvironment,
    error::{AccountError, AccountResult},
    gate::AuthorizationGate,
    nonce::{NonceModel, NonceRegistry},
};
use aegis_primitives::{
    constants::{BOOTLOADER_ADDRESS, CONTRACT_DEPLOYER_ADDRESS},
    Operation, SigningScope,
};
use ethers::types::{Address, H256, U256};
use std::sync::Arc;
use tracing::{debug, trace};

/// An account whose privileged caller is the bootloader, a chain-wide
/// constant known to every account.
///
/// Nonces live in an external shared registry: the validate stage issues an
/// advance-if-equal request and treats a mismatch as fatal. Affordability is
/// checked before the signature so an operation that cannot be paid for is
/// rejected without any ECDSA work.
#[derive(Clone, Debug)]
pub struct BootloaderGatedAccount {
    address: Address,
    owner: Address,
    gate: AuthorizationGate,
    nonce: NonceModel,
    chain_id: u64,
}

impl BootloaderGatedAccount {
    /// Creates an account at `address` owned by `owner`, sharing `registry`
    /// with every other account on the chain
    pub fn new(
        address: Address,
        owner: Address,
        registry: Arc<NonceRegistry>,
        chain_id: u64,
    ) -> Self {
        Self {
            address,
            owner,
            gate: AuthorizationGate::new(*BOOTLOADER_ADDRESS),
            nonce: NonceModel::ExternalCas(registry),
            chain_id,
        }
    }

    /// Nonce the registry currently holds for this account
    pub fn nonce(&self) -> U256 {
        self.nonce.current(self.address)
    }

    fn scope(&self) -> SigningScope {
        SigningScope::Chain { chain_id: self.chain_id }
    }

    fn check_signature(&self, op: &Operation) -> ValidationOutcome {
        match recover_signer(op, &self.scope()) {
            Some(signer) if signer == self.owner => ValidationOutcome::Success,
            _ => ValidationOutcome::SigValidationFailed,
        }
    }

    /// First half of the paymaster contract: the account's own preparation
    /// step, run before the payer validates and pays
    pub fn prepare_for_paymaster(&self, op: &Operation) -> AccountResult<()> {
        if op.paymaster.is_none() {
            return Err(AccountError::Paymaster {
                inner: "operation does not designate a paymaster".into(),
            });
        }
        trace!("prepared operation with nonce {} for paymaster settlement", op.nonce);
        Ok(())
    }

    /// Fails unless the account balance covers the operation's fee terms;
    /// overflowing terms are unaffordable by definition
    fn require_affordable(
        &self,
        env: &dyn ChainEnvironment,
        op: &Operation,
    ) -> AccountResult<()> {
        let available = env.balance(self.address);
        match op.max_cost() {
            Some(required) if available >= required => Ok(()),
            Some(required) => Err(AccountError::InsufficientBalance { required, available }),
            None => Err(AccountError::InsufficientBalance { required: U256::MAX, available }),
        }
    }

    fn dispatch(&self, env: &mut dyn ChainEnvironment, op: &Operation) -> AccountResult<()> {
        let out = if op.call_target == *CONTRACT_DEPLOYER_ADDRESS {
            // deployments go through the dedicated facility with the
            // remaining budget propagated
            env.deploy(op.fee.gas_limit, self.address, op.call_value, &op.call_data)
        } else {
            env.call(self.address, op.call_target, op.call_value, &op.call_data)
        };
        out.map(|_| ()).map_err(|revert| AccountError::ExecutionFailed { revert })
    }
}

impl AbstractAccount for BootloaderGatedAccount {
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
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
        _aux: Option<(H256, H256)>,
    ) -> AccountResult<ValidationOutcome> {
        self.gate.require_privileged(caller)?;

        self.nonce.consume(self.address, op.nonce)?;

        // cheap affordability check before the ECDSA recovery: an operation
        // that cannot be paid for is rejected regardless of who signed it
        self.require_affordable(&*env, op)?;

        let outcome = self.check_signature(op);
        trace!("validated operation with nonce {} for {:?}: {:?}", op.nonce, self.address, outcome);
        Ok(outcome)
    }

    fn settle_fee(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
        settlement: FeeSettlement<'_>,
    ) -> AccountResult<()> {
        self.gate.require_privileged(caller)?;

        match settlement {
            FeeSettlement::Direct => {
                let cost = op.max_cost().ok_or(AccountError::FeePaymentFailed)?;
                if !env.transfer(self.address, caller, cost) {
                    return Err(AccountError::FeePaymentFailed);
                }
                Ok(())
            }
            FeeSettlement::Sponsored(paymaster) => {
                self.prepare_for_paymaster(op)?;
                paymaster.validate_and_pay_for_operation(op, env, caller)
            }
            FeeSettlement::Prefund(_) => Err(AccountError::UnsupportedSettlement),
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

        // a bad signature is fatal here, there is no privileged caller to
        // consume a sentinel; the pure checks run before the registry is
        // touched
        if !self.check_signature(op).is_success() {
            return Err(AccountError::InvalidSignature);
        }
        self.require_affordable(&*env, op)?;
        self.nonce.consume(self.address, op.nonce)?;
        self.dispatch(env, op)
    }
}

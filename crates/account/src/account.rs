//! The capability set shared by both account variants

use crate::{env::ChainEnvironment, error::AccountResult, paymaster::Paymaster};
use aegis_primitives::{
    constants::{validation, ACCOUNT_VALIDATION_MAGIC},
    Operation, SigningScope,
};
use ethers::types::{Address, Signature, H256, U256};

/// Machine-checkable result of the validate stage.
///
/// A mismatched signer never aborts the call; it is reported as this normal
/// return value so the privileged caller can uniformly reject bad operations
/// across many accounts without per-account exception handling. Do not
/// upgrade it to an error path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The signature recovered to the current account owner
    Success,
    /// The signature was malformed or recovered to a different address
    SigValidationFailed,
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success)
    }

    /// Sentinel code an entry-point-gated account returns: 0 for success, 1
    /// for a failed signature
    pub fn sentinel(&self) -> U256 {
        match self {
            ValidationOutcome::Success => validation::SIG_VALIDATION_SUCCESS.into(),
            ValidationOutcome::SigValidationFailed => validation::SIG_VALIDATION_FAILED.into(),
        }
    }

    /// Magic value a bootloader-gated account returns: the validation magic
    /// for success, all zeros for a failed signature
    pub fn magic(&self) -> [u8; 4] {
        match self {
            ValidationOutcome::Success => *ACCOUNT_VALIDATION_MAGIC,
            ValidationOutcome::SigValidationFailed => [0u8; 4],
        }
    }
}

/// How the fee fronted by the privileged caller is settled
pub enum FeeSettlement<'a> {
    /// Entry-point style: transfer exactly the missing prefund to the caller
    Prefund(U256),
    /// Bootloader style: the account pays its full fee obligation directly
    Direct,
    /// A third-party payer covers the fee through the two-call paymaster
    /// contract
    Sponsored(&'a mut dyn Paymaster),
}

/// The `{validate, settle_fee, execute}` capability set both account
/// variants implement.
///
/// The privileged caller drives the three stages in order; `settle_fee` is
/// only invoked after `validate` returned a success indicator. The caller's
/// identity arrives as an explicit argument on every stage, mirroring the
/// message sender of an on-chain invocation.
pub trait AbstractAccount {
    /// Address of the account itself
    fn address(&self) -> Address;

    /// Current account identity (owner)
    fn owner(&self) -> Address;

    /// Transfers the account to a new identity; owner-only
    fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> AccountResult<()>;

    /// Validate stage: caller identity, nonce, affordability and signature,
    /// in that order. `aux` carries the two auxiliary hashes a bootloader
    /// supplies; a minimal implementation may ignore them.
    fn validate(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
        aux: Option<(H256, H256)>,
    ) -> AccountResult<ValidationOutcome>;

    /// Fee settlement stage, invoked by the privileged caller immediately
    /// after a successful validate
    fn settle_fee(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
        settlement: FeeSettlement<'_>,
    ) -> AccountResult<()>;

    /// Execute stage: performs exactly one outbound action
    fn execute(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
    ) -> AccountResult<()>;

    /// Permissionless relay path: accepts a fully pre-signed operation from
    /// any caller and re-runs validation and execution on the signer's
    /// behalf
    fn execute_from_outside(
        &mut self,
        env: &mut dyn ChainEnvironment,
        caller: Address,
        op: &Operation,
    ) -> AccountResult<()>;
}

/// Recovers the signer of the operation for the given scope.
///
/// Structurally malformed signature bytes yield `None`, folded by callers
/// into the signature-failed outcome rather than an abort.
pub(crate) fn recover_signer(op: &Operation, scope: &SigningScope) -> Option<Address> {
    let digest = op.signing_digest(scope);
    let sig = Signature::try_from(op.signature.as_ref()).ok()?;
    sig.recover(digest.as_bytes().to_vec()).ok()
}

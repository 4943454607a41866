use ethers::types::{Address, Bytes, U256};
use thiserror::Error;

pub type AccountResult<T> = Result<T, AccountError>;

/// Account errors.
///
/// Every variant is fatal to the call that raised it and is never retried
/// internally; a failing stage leaves no partial state behind. A signature
/// that does not recover to the account owner is deliberately NOT part of
/// this taxonomy: the validate stage reports it as a normal
/// [`ValidationOutcome`](crate::ValidationOutcome) value so the privileged
/// caller can filter batches of operations without exception handling.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Caller of the validate stage is not the privileged caller
    #[error("caller {caller:?} is not the privileged caller {privileged:?}")]
    NotFromPrivilegedCaller {
        /// The actual caller
        caller: Address,
        /// The privileged caller trusted by the account
        privileged: Address,
    },

    /// Caller of the execute stage is neither the privileged caller nor the
    /// account owner
    #[error("caller {caller:?} is not authorized")]
    NotAuthorized {
        /// The actual caller
        caller: Address,
    },

    /// Compare-and-advance against the nonce state failed
    #[error("nonce advance failed for account {account:?} (expected {expected})")]
    NonceAdvanceFailed {
        /// The account whose nonce did not match
        account: Address,
        /// The nonce the operation carried
        expected: U256,
    },

    /// The account balance does not cover the operation's fee terms
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Total required balance computed from the fee terms
        required: U256,
        /// Current account balance
        available: U256,
    },

    /// The fee transfer to the privileged caller failed
    #[error("failed to pay the fee to the privileged caller")]
    FeePaymentFailed,

    /// The designated paymaster refused to cover the operation
    #[error("paymaster rejected the operation: {inner}")]
    Paymaster {
        /// The inner error message
        inner: String,
    },

    /// The fee settlement mode is not supported by this account variant
    #[error("fee settlement mode not supported by this account variant")]
    UnsupportedSettlement,

    /// Signature verification failed on a path where no privileged caller is
    /// present to consume a sentinel value
    #[error("signature does not recover to the account owner")]
    InvalidSignature,

    /// The outbound call performed by the execute stage failed
    #[error("execution failed: {revert}")]
    ExecutionFailed {
        /// Raw failure payload of the callee, surfaced for diagnostics
        revert: Bytes,
    },
}

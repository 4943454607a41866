//! Nonce bookkeeping: an account-held counter or a shared external registry

use crate::error::{AccountError, AccountResult};
use ethers::types::{Address, U256};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// Shared nonce registry keyed by account identity.
///
/// The registry offers a single contract: atomically advance the nonce of an
/// account if it still equals the expected value. All accounts on a chain
/// share one registry instance.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    nonces: RwLock<HashMap<Address, U256>>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nonce of the account (zero if never advanced)
    pub fn nonce_of(&self, account: Address) -> U256 {
        self.nonces.read().get(&account).copied().unwrap_or_default()
    }

    /// Advances the nonce of the account by one if it still equals
    /// `expected`; returns whether the advance happened.
    ///
    /// Read-modify-write under one write lock, so two operations carrying the
    /// same nonce can never both succeed.
    pub fn advance_if_equal(&self, account: Address, expected: U256) -> bool {
        let mut nonces = self.nonces.write();
        let current = nonces.entry(account).or_default();
        if *current != expected {
            return false;
        }
        *current += U256::one();
        true
    }
}

/// Nonce model of an account, selected at construction
#[derive(Clone, Debug)]
pub enum NonceModel {
    /// Account-held monotonic counter. The entry-point-gated validate stage
    /// does not consult it (nonce correctness is the privileged caller's
    /// responsibility); the permissionless relay path consumes it directly.
    LocalMonotonic(U256),

    /// Delegates to a shared external registry with compare-and-advance
    /// semantics; a mismatch is fatal to the whole validation.
    ExternalCas(Arc<NonceRegistry>),
}

impl NonceModel {
    /// Current nonce for the account under this model
    pub fn current(&self, account: Address) -> U256 {
        match self {
            NonceModel::LocalMonotonic(nonce) => *nonce,
            NonceModel::ExternalCas(registry) => registry.nonce_of(account),
        }
    }

    /// Consumes `expected` as the account's next nonce, advancing the state
    /// by one; fails without any state change when the current value differs
    pub fn consume(&mut self, account: Address, expected: U256) -> AccountResult<()> {
        match self {
            NonceModel::LocalMonotonic(nonce) => {
                if *nonce != expected {
                    return Err(AccountError::NonceAdvanceFailed { account, expected });
                }
                *nonce += U256::one();
                Ok(())
            }
            NonceModel::ExternalCas(registry) => {
                if !registry.advance_if_equal(account, expected) {
                    return Err(AccountError::NonceAdvanceFailed { account, expected });
                }
                Ok(())
            }
        }
    }
}

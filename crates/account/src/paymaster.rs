//! Paymaster extension point: a third-party payer covering an operation's
//! fee instead of the account

use crate::{
    env::ChainEnvironment,
    error::{AccountError, AccountResult},
};
use aegis_primitives::Operation;
use ethers::types::Address;
use std::collections::HashSet;
use tracing::debug;

/// A capability-conforming fee payer.
///
/// The settlement contract is a fixed two-call sequence: the account's own
/// `prepare_for_paymaster` step, then the payer's validate-and-pay. Any
/// implementation may be substituted; no specific payment policy is
/// mandated.
pub trait Paymaster {
    /// Address the payer's funds are drawn from
    fn address(&self) -> Address;

    /// Validates the operation against the payer's own policy and pays the
    /// operation's fee obligation to the beneficiary
    fn validate_and_pay_for_operation(
        &mut self,
        op: &Operation,
        env: &mut dyn ChainEnvironment,
        beneficiary: Address,
    ) -> AccountResult<()>;
}

/// Reference payer: sponsors operations from its own balance, optionally
/// restricted to an allowlist of senders
#[derive(Clone, Debug, Default)]
pub struct SponsoringPaymaster {
    address: Address,
    allowed_senders: Option<HashSet<Address>>,
}

impl SponsoringPaymaster {
    /// Creates a payer sponsoring every sender
    pub fn new(address: Address) -> Self {
        Self { address, allowed_senders: None }
    }

    /// Restricts sponsorship to the given senders
    pub fn with_allowlist<I: IntoIterator<Item = Address>>(mut self, senders: I) -> Self {
        self.allowed_senders = Some(senders.into_iter().collect());
        self
    }
}

impl Paymaster for SponsoringPaymaster {
    fn address(&self) -> Address {
        self.address
    }

    fn validate_and_pay_for_operation(
        &mut self,
        op: &Operation,
        env: &mut dyn ChainEnvironment,
        beneficiary: Address,
    ) -> AccountResult<()> {
        let designated = op.paymaster.as_ref().map(|p| p.paymaster);
        if designated != Some(self.address) {
            return Err(AccountError::Paymaster {
                inner: "operation designates a different paymaster".into(),
            });
        }

        if let Some(allowed) = &self.allowed_senders {
            if !allowed.contains(&op.sender) {
                return Err(AccountError::Paymaster {
                    inner: format!("sender {:?} is not sponsored", op.sender),
                });
            }
        }

        let cost = op.max_cost().ok_or_else(|| AccountError::Paymaster {
            inner: "fee terms overflow".into(),
        })?;
        if !env.transfer(self.address, beneficiary, cost) {
            return Err(AccountError::Paymaster {
                inner: format!("payer balance does not cover {cost}"),
            });
        }
        debug!("paymaster {:?} covered {cost} for {:?}", self.address, op.sender);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::InMemoryEnvironment;
    use aegis_primitives::PaymasterParams;
    use ethers::types::Bytes;

    fn designated_op(paymaster: Address) -> Operation {
        Operation::random()
            .paymaster(PaymasterParams { paymaster, input: Bytes::default() })
    }

    #[test]
    fn pays_from_own_balance() {
        let mut paymaster = SponsoringPaymaster::new(Address::random());
        let beneficiary = Address::random();
        let op = designated_op(paymaster.address());
        let mut env = InMemoryEnvironment::new();
        env.fund(paymaster.address(), op.max_cost().unwrap());

        paymaster.validate_and_pay_for_operation(&op, &mut env, beneficiary).unwrap();
        assert_eq!(env.balance(beneficiary), op.max_cost().unwrap());
        assert_eq!(env.balance(paymaster.address()), 0.into());
    }

    #[test]
    fn rejects_undesignated_operation() {
        let mut paymaster = SponsoringPaymaster::new(Address::random());
        let op = designated_op(Address::random());
        let mut env = InMemoryEnvironment::new();

        let err = paymaster
            .validate_and_pay_for_operation(&op, &mut env, Address::random())
            .unwrap_err();
        assert!(matches!(err, AccountError::Paymaster { .. }));
    }

    #[test]
    fn enforces_allowlist() {
        let payer_addr = Address::random();
        let sponsored = Address::random();
        let mut paymaster = SponsoringPaymaster::new(payer_addr).with_allowlist([sponsored]);
        let mut env = InMemoryEnvironment::new();
        env.fund(payer_addr, ethers::types::U256::MAX / 2);

        let op = designated_op(payer_addr).sender(sponsored);
        assert!(paymaster
            .validate_and_pay_for_operation(&op, &mut env, Address::random())
            .is_ok());

        let other = designated_op(payer_addr).sender(Address::random());
        assert!(paymaster
            .validate_and_pay_for_operation(&other, &mut env, Address::random())
            .is_err());
    }

    #[test]
    fn insufficient_payer_balance_is_rejected() {
        let mut paymaster = SponsoringPaymaster::new(Address::random());
        let op = designated_op(paymaster.address());
        let mut env = InMemoryEnvironment::new();

        let err = paymaster
            .validate_and_pay_for_operation(&op, &mut env, Address::random())
            .unwrap_err();
        assert!(matches!(err, AccountError::Paymaster { .. }));
    }
}

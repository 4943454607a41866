//! Chain environment seam: the balances, outbound calls and the deployment
//! facility an account interacts with.
//!
//! The privileged caller, the relay infrastructure and the chain itself are
//! external collaborators; this trait is the surface the account core
//! consumes from them. [`InMemoryEnvironment`] is the in-process
//! implementation the test harnesses drive.

use ethers::types::{Address, Bytes, U256};
use ethers::utils::keccak256;
use std::collections::HashMap;

/// Environment an account executes against
pub trait ChainEnvironment {
    /// Native balance of the address
    fn balance(&self, addr: Address) -> U256;

    /// Moves native value between addresses; returns whether the transfer
    /// happened
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool;

    /// Performs an outbound call; `Err` carries the callee's raw failure
    /// payload. A failing call leaves no partial effect, including the value
    /// transfer attached to it.
    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<Bytes, Bytes>;

    /// Dispatches through the chain's contract-deployment facility with the
    /// given gas budget; returns the bytes of the deployed address
    fn deploy(
        &mut self,
        gas_budget: U256,
        from: Address,
        value: U256,
        payload: &Bytes,
    ) -> Result<Bytes, Bytes>;
}

/// Handler standing in for a deployed contract: `(caller, value, data)` in,
/// return data or failure payload out
pub type ContractHandler = Box<dyn FnMut(Address, U256, &Bytes) -> Result<Bytes, Bytes> + Send>;

/// Record of a dispatch through the deployment facility
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub gas_budget: U256,
    pub deployer: Address,
    pub value: U256,
    pub payload: Bytes,
    pub deployed: Address,
}

/// In-process chain environment: a balance sheet plus registered contract
/// handlers
#[derive(Default)]
pub struct InMemoryEnvironment {
    balances: HashMap<Address, U256>,
    contracts: HashMap<Address, ContractHandler>,
    deployments: Vec<Deployment>,
}

impl InMemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the address with the given balance
    pub fn fund(&mut self, addr: Address, value: U256) {
        *self.balances.entry(addr).or_default() += value;
    }

    /// Registers a contract handler at the address
    pub fn register_contract(&mut self, addr: Address, handler: ContractHandler) {
        self.contracts.insert(addr, handler);
    }

    /// Deployments performed so far
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        let available = self.balances.get(&from).copied().unwrap_or_default();
        if available < value {
            return false;
        }
        self.balances.insert(from, available - value);
        *self.balances.entry(to).or_default() += value;
        true
    }
}

impl ChainEnvironment for InMemoryEnvironment {
    fn balance(&self, addr: Address) -> U256 {
        self.balances.get(&addr).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool {
        self.move_value(from, to, value)
    }

    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        data: &Bytes,
    ) -> Result<Bytes, Bytes> {
        if !self.move_value(from, to, value) {
            return Err(Bytes::from_static(b"insufficient balance for call"));
        }
        let out = match self.contracts.get_mut(&to) {
            Some(handler) => handler(from, value, data),
            None => Ok(Bytes::default()),
        };
        if out.is_err() {
            // roll the value transfer back so the failed call has no effect
            self.move_value(to, from, value);
        }
        out
    }

    fn deploy(
        &mut self,
        gas_budget: U256,
        from: Address,
        value: U256,
        payload: &Bytes,
    ) -> Result<Bytes, Bytes> {
        let deployed = Address::from_slice(
            &keccak256([from.as_bytes(), payload.as_ref()].concat())[12..],
        );
        if !self.move_value(from, deployed, value) {
            return Err(Bytes::from_static(b"insufficient balance for deployment"));
        }
        self.deployments.push(Deployment {
            gas_budget,
            deployer: from,
            value,
            payload: payload.clone(),
            deployed,
        });
        Ok(Bytes::from(deployed.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_value() {
        let mut env = InMemoryEnvironment::new();
        let a = Address::random();
        let b = Address::random();
        env.fund(a, 100.into());

        assert!(env.transfer(a, b, 40.into()));
        assert_eq!(env.balance(a), 60.into());
        assert_eq!(env.balance(b), 40.into());
        assert!(!env.transfer(a, b, 100.into()));
    }

    #[test]
    fn failed_call_rolls_back_value() {
        let mut env = InMemoryEnvironment::new();
        let caller = Address::random();
        let target = Address::random();
        env.fund(caller, 100.into());
        env.register_contract(target, Box::new(|_, _, _| Err(Bytes::from_static(b"revert"))));

        let res = env.call(caller, target, 30.into(), &Bytes::default());
        assert!(res.is_err());
        assert_eq!(env.balance(caller), 100.into());
        assert_eq!(env.balance(target), U256::zero());
    }

    #[test]
    fn call_without_handler_only_moves_value() {
        let mut env = InMemoryEnvironment::new();
        let caller = Address::random();
        let target = Address::random();
        env.fund(caller, 10.into());

        assert!(env.call(caller, target, 10.into(), &Bytes::default()).is_ok());
        assert_eq!(env.balance(target), 10.into());
    }

    #[test]
    fn deploy_records_dispatch() {
        let mut env = InMemoryEnvironment::new();
        let deployer = Address::random();
        env.fund(deployer, 5.into());

        let payload: Bytes = "0x60806040".parse().unwrap();
        let out = env.deploy(1_000_000.into(), deployer, 5.into(), &payload).unwrap();

        assert_eq!(env.deployments().len(), 1);
        let deployment = &env.deployments()[0];
        assert_eq!(deployment.deployer, deployer);
        assert_eq!(deployment.gas_budget, 1_000_000.into());
        assert_eq!(out.as_ref(), deployment.deployed.as_bytes());
        assert_eq!(env.balance(deployment.deployed), 5.into());
    }
}

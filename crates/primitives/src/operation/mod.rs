//! Basic unit of work submitted to a programmable smart account

mod hash;

use crate::utils::{as_checksum_addr, pack_paymaster_params};
use ethers::{
    abi::AbiEncode,
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
pub use hash::OperationHash;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Fee terms of an operation: limits times unit prices, reducing to the
/// maximum amount the account may be charged
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTerms {
    /// The amount of gas to allocate for the main execution call
    pub gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    pub verification_gas_limit: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    pub max_priority_fee_per_gas: U256,
}

/// Designation of a third party covering the fee instead of the account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterParams {
    /// Address of the paymaster sponsoring the operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,

    /// Extra data passed to the paymaster (can be empty)
    pub input: Bytes,
}

/// Operation: a signed, nonce-tagged request for an account to perform a call.
///
/// Immutable once constructed; the builder-style setters consume the value.
/// The signature field is excluded from the bytes hashed into the signing
/// digest.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Identity of the account that must authorize the operation
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (anti replay protection)
    pub nonce: U256,

    /// Destination of the call performed once the operation is authorized
    #[serde(serialize_with = "as_checksum_addr")]
    pub call_target: Address,

    /// Native value transferred with the call
    pub call_value: U256,

    /// Opaque payload passed to the destination
    pub call_data: Bytes,

    /// Fee terms of the operation
    pub fee: FeeTerms,

    /// Optional third-party payer covering the fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<PaymasterParams>,

    /// Data proving the operation was approved by the account owner
    pub signature: Bytes,
}

/// The scope a signing digest is bound to.
///
/// An entry-point-gated account binds the digest to the privileged caller
/// address captured at construction; a bootloader-gated account binds it to
/// the chain only, since its privileged caller is a chain-wide constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningScope {
    /// Digest bound to an entry point address and chain id
    EntryPoint {
        /// The entry point contract address
        entry_point: Address,
        /// The chain id
        chain_id: u64,
    },
    /// Digest bound to the chain id only
    Chain {
        /// The chain id
        chain_id: u64,
    },
}

/// Operation without signature (helper for packing the operation), with
/// variable-length fields replaced by their hashes
#[derive(EthAbiCodec, EthAbiType)]
struct OperationNoSignature {
    pub sender: Address,
    pub nonce: U256,
    pub call_target: Address,
    pub call_value: U256,
    pub call_data: H256,
    pub gas_limit: U256,
    pub verification_gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster: H256,
}

impl From<Operation> for OperationNoSignature {
    fn from(value: Operation) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            call_target: value.call_target,
            call_value: value.call_value,
            call_data: keccak256(value.call_data.deref()).into(),
            gas_limit: value.fee.gas_limit,
            verification_gas_limit: value.fee.verification_gas_limit,
            max_fee_per_gas: value.fee.max_fee_per_gas,
            max_priority_fee_per_gas: value.fee.max_priority_fee_per_gas,
            paymaster: keccak256(pack_paymaster_params(value.paymaster.as_ref())).into(),
        }
    }
}

impl Operation {
    /// Packs the operation without signature to bytes (used for calculating
    /// the signing digest)
    pub fn pack_without_signature(&self) -> Bytes {
        let operation_packed = OperationNoSignature::from(self.clone());
        operation_packed.encode().into()
    }

    /// Calculates the signing digest of the operation for the given scope.
    ///
    /// All fields except the signature contribute to the digest.
    pub fn signing_digest(&self, scope: &SigningScope) -> OperationHash {
        let packed = keccak256(self.pack_without_signature().deref()).to_vec();
        let scoped = match scope {
            SigningScope::EntryPoint { entry_point, chain_id } => {
                [packed, entry_point.encode(), U256::from(*chain_id).encode()].concat()
            }
            SigningScope::Chain { chain_id } => {
                [packed, U256::from(*chain_id).encode()].concat()
            }
        };
        H256::from_slice(keccak256(scoped).as_slice()).into()
    }

    /// Total required balance of the operation, computed from its fee terms.
    ///
    /// `None` when the terms overflow; no balance can cover such an
    /// operation.
    pub fn max_cost(&self) -> Option<U256> {
        self.fee
            .gas_limit
            .checked_add(self.fee.verification_gas_limit)?
            .checked_mul(self.fee.max_fee_per_gas)
    }

    // Builder pattern helpers

    /// Sets the sender of the operation
    pub fn sender(mut self, sender: Address) -> Self {
        self.sender = sender;
        self
    }

    /// Sets the nonce of the operation
    pub fn nonce<N: Into<U256>>(mut self, nonce: N) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Sets the call target of the operation
    pub fn call_target(mut self, call_target: Address) -> Self {
        self.call_target = call_target;
        self
    }

    /// Sets the call value of the operation
    pub fn call_value<V: Into<U256>>(mut self, call_value: V) -> Self {
        self.call_value = call_value.into();
        self
    }

    /// Sets the call data of the operation
    pub fn call_data(mut self, call_data: Bytes) -> Self {
        self.call_data = call_data;
        self
    }

    /// Sets the fee terms of the operation
    pub fn fee(mut self, fee: FeeTerms) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the paymaster of the operation
    pub fn paymaster(mut self, paymaster: PaymasterParams) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    /// Sets the signature of the operation
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    /// Creates a random operation (for testing purposes)
    #[cfg(feature = "test-utils")]
    pub fn random() -> Self {
        Operation::default()
            .sender(Address::random())
            .call_target(Address::random())
            .fee(FeeTerms {
                gas_limit: 100_000.into(),
                verification_gas_limit: 50_000.into(),
                max_fee_per_gas: 1_000_000_000.into(),
                max_priority_fee_per_gas: 1_000_000_000.into(),
            })
    }
}

//! Programmable smart account primitive types
//!
//! This crate contains the primitive types shared by the account variants: the
//! operation record, its signing digest, the operation signer, and chain-level
//! constants.

pub mod constants;
mod operation;
mod signer;
mod utils;

pub use operation::{
    FeeTerms, Operation, OperationHash, PaymasterParams, SigningScope,
};
pub use signer::OperationSigner;
pub use utils::pack_paymaster_params;

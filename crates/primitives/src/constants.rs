//! Account abstraction related constants

use ethers::{types::Address, utils::keccak256};
use lazy_static::lazy_static;

/// Sentinel codes returned by the entry-point-gated validate stage
pub mod validation {
    /// Validation succeeded
    pub const SIG_VALIDATION_SUCCESS: u64 = 0;
    /// Signature did not recover to the account owner
    pub const SIG_VALIDATION_FAILED: u64 = 1;
}

/// Chain-defined privileged addresses (bootloader-gated accounts)
pub mod formal_addresses {
    /// Address of the bootloader, the block-producing runtime
    pub const BOOTLOADER: &str = "0x0000000000000000000000000000000000008001";
    /// Address of the contract deployment facility
    pub const CONTRACT_DEPLOYER: &str = "0x0000000000000000000000000000000000008006";
}

lazy_static! {
    /// The bootloader address, parsed once
    pub static ref BOOTLOADER_ADDRESS: Address =
        formal_addresses::BOOTLOADER.parse().expect("bootloader address is valid");

    /// The contract deployer address, parsed once
    pub static ref CONTRACT_DEPLOYER_ADDRESS: Address =
        formal_addresses::CONTRACT_DEPLOYER.parse().expect("deployer address is valid");

    /// Magic value a bootloader-gated account returns from a successful
    /// validation (first four bytes of the validate selector hash)
    pub static ref ACCOUNT_VALIDATION_MAGIC: [u8; 4] = {
        let hash = keccak256("validateTransaction(bytes32,bytes32,Transaction)".as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    };
}

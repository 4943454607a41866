//! Programmable smart account core
//!
//! An abstract account replaces single-key transaction authorization with
//! programmable verification logic and is driven by a single trusted
//! privileged caller. This crate implements the shared
//! validate/settle-fee/execute state machine and its two variants:
//!
//! - [`EntryPointGatedAccount`]: the privileged caller is an entry point
//!   contract address captured at construction; nonce bookkeeping is the
//!   entry point's responsibility.
//! - [`BootloaderGatedAccount`]: the privileged caller is the chain-defined
//!   bootloader address; nonces live in a shared external [`NonceRegistry`]
//!   advanced with compare-and-advance semantics.

mod account;
mod bootloader;
mod entry_point;
mod error;
pub mod env;
mod gate;
mod nonce;
mod paymaster;

pub use account::{AbstractAccount, FeeSettlement, ValidationOutcome};
pub use bootloader::BootloaderGatedAccount;
pub use entry_point::EntryPointGatedAccount;
pub use error::{AccountError, AccountResult};
pub use gate::AuthorizationGate;
pub use nonce::{NonceModel, NonceRegistry};
pub use paymaster::{Paymaster, SponsoringPaymaster};

//! An `OperationSigner` is a wrapper around an ethers wallet that signs
//! operations for a signing scope
use crate::{Operation, SigningScope};
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::Address,
    utils::hash_message,
};

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct OperationSigner {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl OperationSigner {
    /// Builds an `OperationSigner` with a randomly generated key
    pub fn random() -> Self {
        Self { signer: LocalWallet::new(&mut rand::thread_rng()) }
    }

    /// Creates a new signer from the given mnemonic phrase
    pub fn from_phrase(phrase: &str) -> eyre::Result<Self> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;
        Ok(Self { signer })
    }

    /// Creates a new signer from the given hex-encoded private key
    pub fn from_key(key: &str) -> eyre::Result<Self> {
        Ok(Self { signer: key.parse()? })
    }

    /// Public address of the signing key, i.e. the account identity this
    /// signer controls
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs the operation for the given scope.
    ///
    /// The signature is a 65-byte ECDSA signature over the EIP-191 prefixed
    /// signing digest.
    pub fn sign_operation(&self, op: &Operation, scope: &SigningScope) -> eyre::Result<Operation> {
        let digest = op.signing_digest(scope);
        let sig = self.signer.sign_hash(hash_message(digest.as_bytes()))?;
        Ok(op.clone().signature(sig.to_vec().into()))
    }
}

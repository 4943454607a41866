use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Signing digest of an operation: the canonical hash of its fields excluding
/// the signature, bound to a signing scope
#[derive(
    Default, Debug, Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OperationHash(pub H256);

impl From<H256> for OperationHash {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<OperationHash> for H256 {
    fn from(value: OperationHash) -> Self {
        value.0
    }
}

impl OperationHash {
    /// Digest as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for OperationHash {
    type Err = <H256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H256::from_str(s).map(Self)
    }
}

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

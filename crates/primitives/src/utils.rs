//! Misc utils

use crate::operation::PaymasterParams;
use ethers::{types::Address, utils::to_checksum};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Packs paymaster params (address followed by the paymaster input) to bytes;
/// empty when no paymaster is designated
pub fn pack_paymaster_params(params: Option<&PaymasterParams>) -> Vec<u8> {
    match params {
        Some(params) => [params.paymaster.0.to_vec(), params.input.to_vec()].concat(),
        None => vec![],
    }
}

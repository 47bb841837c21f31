//! Utility functions for identifier generation

use bech32::Bech32m;
use uuid7::uuid7;

use crate::types::PartyId;

// mint a fresh party id then encode using bech32
pub fn new_party_id(hrp: &str) -> anyhow::Result<PartyId> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(PartyId::new(encode))
}

//! Value fixtures.

use ee_types::{Address, ADDRESS_ID_LENGTH};
use rand::{rngs::StdRng, Rng, SeedableRng as _};

/// A deterministic rng for reproducible fixtures.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random account or contract address.
pub fn random_address<R: Rng>(rng: &mut R, contract: bool) -> Address {
    let mut id = [0u8; ADDRESS_ID_LENGTH];
    rng.fill(&mut id);
    if contract {
        Address::contract(id)
    } else {
        Address::account(id)
    }
}

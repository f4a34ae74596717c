//! Modes of operation, each a `BlockCipher` wrapping another `BlockCipher`

pub mod cbc;
pub mod ctr;
pub mod ofb;

pub use cbc::CbcBlockCipher;
pub use ctr::CtrBlockCipher;
pub use ofb::OfbBlockCipher;

/// XOR `b` into the first `b.len()` bytes of `a`.
fn xor_in_place(a: &mut [u8], b: &[u8]) {
    a.iter_mut().zip(b).for_each(|(x, y)| *x ^= y);
}

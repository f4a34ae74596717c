//! Transform capabilities the adapters are generic over

use crate::error::{InitError, TransformError};
use crate::params::CipherParameters;

/// Direction a cipher was initialised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypting,
    Decrypting,
}

impl Direction {
    pub fn from_encryption_flag(for_encryption: bool) -> Self {
        if for_encryption {
            Direction::Encrypting
        } else {
            Direction::Decrypting
        }
    }

    pub fn is_encrypting(self) -> bool {
        self == Direction::Encrypting
    }
}

/// Trait for a keyed block transform: one fixed-size block in, one out.
///
/// Implemented by raw engines (see [`crate::engines::AesEngine`]) and by the
/// chaining modes in [`crate::modes`], which wrap another `BlockCipher`.
pub trait BlockCipher {
    /// Name used in logs and cipher specifications, e.g. `AES/CBC`.
    fn algorithm_name(&self) -> String;

    /// Returns the block size of the cipher
    fn block_size(&self) -> usize;

    /// Derive the key schedule and set the direction.
    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError>;

    /// Transform the first `block_size()` bytes of `input` into `output`.
    /// Returns the number of bytes written (always `block_size()`).
    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError>;

    /// Restore the state right after the last `init` (initial IV, counter).
    fn reset(&mut self);

    /// Stream-like modes can finish on a short block without padding.
    fn is_partial_block_okay(&self) -> bool {
        false
    }
}

impl<C: BlockCipher + ?Sized> BlockCipher for Box<C> {
    fn algorithm_name(&self) -> String {
        (**self).algorithm_name()
    }

    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        (**self).init(for_encryption, params)
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        (**self).process_block(input, output)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn is_partial_block_okay(&self) -> bool {
        (**self).is_partial_block_okay()
    }
}

/// Byte-oriented keystream transform that needs no buffering.
pub trait StreamCipher {
    fn algorithm_name(&self) -> String;

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError>;

    /// Transform `input` into the first `input.len()` bytes of `output`.
    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), TransformError>;

    fn reset(&mut self);
}

/// Check that `input` and `output` can each hold one block.
pub(crate) fn check_block_lengths(
    block_size: usize,
    input: &[u8],
    output: &[u8],
) -> Result<(), TransformError> {
    if input.len() < block_size {
        return Err(TransformError::BlockLength {
            block_size,
            actual: input.len(),
        });
    }
    if output.len() < block_size {
        return Err(TransformError::OutputLength {
            needed: block_size,
            actual: output.len(),
        });
    }
    Ok(())
}

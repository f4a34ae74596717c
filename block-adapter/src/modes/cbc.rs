//! CBC (Cipher Block Chaining) mode implementation

use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{check_block_lengths, BlockCipher, Direction};
use crate::error::{InitError, TransformError};
use crate::params::CipherParameters;

use super::xor_in_place;

/// CBC over any block cipher.
///
/// Encryption: C_i = E(K, P_i ⊕ C_{i-1}), C_0 = IV.
/// Decryption: P_i = D(K, C_i) ⊕ C_{i-1}.
pub struct CbcBlockCipher<C> {
    cipher: C,
    iv: Vec<u8>,
    chain: Zeroizing<Vec<u8>>,
    scratch: Zeroizing<Vec<u8>>,
    direction: Option<Direction>,
}

impl<C: BlockCipher> CbcBlockCipher<C> {
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            iv: vec![0u8; block_size],
            chain: Zeroizing::new(vec![0u8; block_size]),
            scratch: Zeroizing::new(vec![0u8; block_size]),
            direction: None,
        }
    }

    pub fn underlying_cipher(&self) -> &C {
        &self.cipher
    }
}

impl<C: BlockCipher> BlockCipher for CbcBlockCipher<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/CBC", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        let block_size = self.block_size();
        let iv = params.iv().ok_or(InitError::MissingIv("CBC"))?;
        if iv.len() != block_size {
            return Err(InitError::InvalidIvLength {
                mode: "CBC",
                expected: block_size.to_string(),
                actual: iv.len(),
            });
        }

        self.cipher.init(for_encryption, &params.key_only())?;
        self.iv.copy_from_slice(iv);
        self.chain.copy_from_slice(iv);
        self.direction = Some(Direction::from_encryption_flag(for_encryption));
        Ok(())
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        let direction = self.direction.ok_or(TransformError::NotInitialized("CBC"))?;
        let block_size = self.block_size();
        check_block_lengths(block_size, input, output)?;

        match direction {
            Direction::Encrypting => {
                self.scratch.copy_from_slice(&input[..block_size]);
                xor_in_place(&mut self.scratch, &self.chain);
                self.cipher.process_block(&self.scratch, output)?;
                self.chain.copy_from_slice(&output[..block_size]);
            }
            Direction::Decrypting => {
                // Keep C_i before output may overwrite anything.
                self.scratch.copy_from_slice(&input[..block_size]);
                self.cipher.process_block(input, output)?;
                xor_in_place(&mut output[..block_size], &self.chain);
                std::mem::swap(&mut self.chain, &mut self.scratch);
            }
        }

        Ok(block_size)
    }

    fn reset(&mut self) {
        self.chain.copy_from_slice(&self.iv);
        self.scratch[..].zeroize();
        self.cipher.reset();
    }
}

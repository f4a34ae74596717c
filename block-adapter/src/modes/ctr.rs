//! CTR (Counter) mode implementation

use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{check_block_lengths, BlockCipher, StreamCipher};
use crate::error::{InitError, TransformError};
use crate::params::CipherParameters;

/// CTR over any block cipher.
///
/// The IV is the initial counter block, zero-extended on the right when
/// shorter than a block. The whole block is incremented as one big-endian
/// integer, wrapping at 2^(8·block_size). The underlying cipher only ever
/// encrypts, so encryption and decryption are the same operation.
pub struct CtrBlockCipher<C> {
    cipher: C,
    iv: Vec<u8>,
    counter: Vec<u8>,
    keystream: Zeroizing<Vec<u8>>,
    keystream_used: usize,
    initialised: bool,
}

impl<C: BlockCipher> CtrBlockCipher<C> {
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            iv: vec![0u8; block_size],
            counter: vec![0u8; block_size],
            keystream: Zeroizing::new(vec![0u8; block_size]),
            keystream_used: block_size,
            initialised: false,
        }
    }

    /// Build an initial counter block: `nonce` followed by `counter` in
    /// big-endian, right-aligned in a block of `block_size` bytes.
    /// A counter wider than the space left after the nonce is truncated to
    /// its low-order bytes.
    pub fn counter_iv(nonce: &[u8], counter: u64, block_size: usize) -> Vec<u8> {
        let mut block = vec![0u8; block_size];
        let nonce_len = nonce.len().min(block_size);
        block[..nonce_len].copy_from_slice(&nonce[..nonce_len]);

        let counter_be = counter.to_be_bytes();
        let copy_len = 8.min(block_size - nonce_len);
        block[block_size - copy_len..].copy_from_slice(&counter_be[8 - copy_len..]);
        block
    }

    fn increment_counter(&mut self) {
        for byte in self.counter.iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }

    fn apply_keystream(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), TransformError> {
        for (out, &byte) in output.iter_mut().zip(input) {
            if self.keystream_used == self.keystream.len() {
                self.cipher.process_block(&self.counter, &mut self.keystream)?;
                self.increment_counter();
                self.keystream_used = 0;
            }
            *out = byte ^ self.keystream[self.keystream_used];
            self.keystream_used += 1;
        }
        Ok(())
    }
}

impl<C: BlockCipher> BlockCipher for CtrBlockCipher<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/CTR", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, _for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        let block_size = self.block_size();
        let iv = params.iv().ok_or(InitError::MissingIv("CTR"))?;
        if iv.len() < block_size / 2 || iv.len() > block_size {
            return Err(InitError::InvalidIvLength {
                mode: "CTR",
                expected: format!("{}..={}", block_size / 2, block_size),
                actual: iv.len(),
            });
        }

        self.cipher.init(true, &params.key_only())?;
        self.iv.fill(0);
        self.iv[..iv.len()].copy_from_slice(iv);
        self.initialised = true;
        BlockCipher::reset(self);
        Ok(())
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        if !self.initialised {
            return Err(TransformError::NotInitialized("CTR"));
        }
        let block_size = self.block_size();
        check_block_lengths(block_size, input, output)?;
        self.apply_keystream(&input[..block_size], &mut output[..block_size])?;
        Ok(block_size)
    }

    fn reset(&mut self) {
        self.counter.copy_from_slice(&self.iv);
        self.keystream[..].zeroize();
        self.keystream_used = self.keystream.len();
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}

impl<C: BlockCipher> StreamCipher for CtrBlockCipher<C> {
    fn algorithm_name(&self) -> String {
        BlockCipher::algorithm_name(self)
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        BlockCipher::init(self, for_encryption, params)
    }

    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), TransformError> {
        if !self.initialised {
            return Err(TransformError::NotInitialized("CTR"));
        }
        if output.len() < input.len() {
            return Err(TransformError::OutputLength {
                needed: input.len(),
                actual: output.len(),
            });
        }
        self.apply_keystream(input, output)
    }

    fn reset(&mut self) {
        BlockCipher::reset(self)
    }
}

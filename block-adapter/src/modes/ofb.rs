//! OFB (Output Feedback) mode implementation

use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{check_block_lengths, BlockCipher, StreamCipher};
use crate::error::{InitError, TransformError};
use crate::params::CipherParameters;

/// OFB over any block cipher.
///
/// O_0 = IV, O_i = E(K, O_{i-1}), C_i = P_i ⊕ O_i. Decryption is
/// identical to encryption.
pub struct OfbBlockCipher<C> {
    cipher: C,
    iv: Vec<u8>,
    feedback: Zeroizing<Vec<u8>>,
    keystream: Zeroizing<Vec<u8>>,
    keystream_used: usize,
    initialised: bool,
}

impl<C: BlockCipher> OfbBlockCipher<C> {
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            iv: vec![0u8; block_size],
            feedback: Zeroizing::new(vec![0u8; block_size]),
            keystream: Zeroizing::new(vec![0u8; block_size]),
            keystream_used: block_size,
            initialised: false,
        }
    }

    fn apply_keystream(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), TransformError> {
        for (out, &byte) in output.iter_mut().zip(input) {
            if self.keystream_used == self.keystream.len() {
                self.cipher.process_block(&self.feedback, &mut self.keystream)?;
                self.feedback.copy_from_slice(&self.keystream);
                self.keystream_used = 0;
            }
            *out = byte ^ self.keystream[self.keystream_used];
            self.keystream_used += 1;
        }
        Ok(())
    }
}

impl<C: BlockCipher> BlockCipher for OfbBlockCipher<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/OFB", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn init(&mut self, _for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        let block_size = self.block_size();
        let iv = params.iv().ok_or(InitError::MissingIv("OFB"))?;
        if iv.len() != block_size {
            return Err(InitError::InvalidIvLength {
                mode: "OFB",
                expected: block_size.to_string(),
                actual: iv.len(),
            });
        }

        self.cipher.init(true, &params.key_only())?;
        self.iv.copy_from_slice(iv);
        self.initialised = true;
        BlockCipher::reset(self);
        Ok(())
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        if !self.initialised {
            return Err(TransformError::NotInitialized("OFB"));
        }
        let block_size = self.block_size();
        check_block_lengths(block_size, input, output)?;
        self.apply_keystream(&input[..block_size], &mut output[..block_size])?;
        Ok(block_size)
    }

    fn reset(&mut self) {
        self.feedback.copy_from_slice(&self.iv);
        self.keystream[..].zeroize();
        self.keystream_used = self.keystream.len();
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}

impl<C: BlockCipher> StreamCipher for OfbBlockCipher<C> {
    fn algorithm_name(&self) -> String {
        BlockCipher::algorithm_name(self)
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        BlockCipher::init(self, for_encryption, params)
    }

    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), TransformError> {
        if !self.initialised {
            return Err(TransformError::NotInitialized("OFB"));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::AesEngine;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const IV: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const PLAIN: [u8; 16] = hex!("6bc1bee22e409f96e93d7e117393172a");
    // NIST SP 800-38A F.4.1, first block
    const CIPHER: [u8; 16] = hex!("3b3fd92eb72dad20333449f8e83cfb4a");

    fn ofb() -> OfbBlockCipher<AesEngine> {
        let mut ofb = OfbBlockCipher::new(AesEngine::new());
        BlockCipher::init(
            &mut ofb,
            true,
            &CipherParameters::new(KEY.to_vec()).with_iv(IV.to_vec()),
        )
        .unwrap();
        ofb
    }

    #[test]
    fn test_ofb_block_vector() {
        let mut out = [0u8; 16];
        ofb().process_block(&PLAIN, &mut out).unwrap();
        assert_eq!(out, CIPHER);
    }

    #[test]
    fn test_ofb_partial_block() {
        let mut cipher = ofb();
        let mut out = [0u8; 2];
        cipher.process_bytes(&PLAIN[..2], &mut out).unwrap();
        assert_eq!(out, CIPHER[..2]);
    }

    #[test]
    fn test_ofb_encrypt_decrypt() {
        let plaintext = b"Hello World! This is a test message.";
        let mut ciphertext = vec![0u8; plaintext.len()];
        ofb().process_bytes(plaintext, &mut ciphertext).unwrap();

        let mut decrypted = vec![0u8; plaintext.len()];
        ofb().process_bytes(&ciphertext, &mut decrypted).unwrap();
        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_ofb_reset_wipes_keystream() {
        let mut cipher = ofb();
        let mut out = [0u8; 5];
        cipher.process_bytes(&[0u8; 5], &mut out).unwrap();
        assert!(cipher.keystream.iter().any(|&b| b != 0));
        StreamCipher::reset(&mut cipher);
        assert!(cipher.keystream.iter().all(|&b| b == 0));
        assert_eq!(&cipher.feedback[..], &IV[..]);
    }

    #[test]
    fn test_ofb_invalid_iv_length() {
        let mut cipher = OfbBlockCipher::new(AesEngine::new());
        let params = CipherParameters::new(KEY.to_vec()).with_iv(b"short".to_vec());
        assert!(matches!(
            BlockCipher::init(&mut cipher, true, &params),
            Err(InitError::InvalidIvLength { actual: 5, .. })
        ));
    }

    #[test]
    fn test_ofb_reset_replays_keystream() {
        let mut cipher = ofb();
        let mut first = [0u8; 20];
        cipher.process_bytes(&[0u8; 20], &mut first).unwrap();
        StreamCipher::reset(&mut cipher);
        let mut second = [0u8; 20];
        cipher.process_bytes(&[0u8; 20], &mut second).unwrap();
        assert_eq!(first, second);
    }
}

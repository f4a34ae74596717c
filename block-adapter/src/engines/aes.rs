//! AES block engine over the RustCrypto `aes` crate

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};

use crate::cipher::{check_block_lengths, BlockCipher, Direction};
use crate::error::{InitError, TransformError};
use crate::params::CipherParameters;

const BLOCK_SIZE: usize = 16;

enum KeySchedule {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

/// AES-128/192/256, selected by key length at `init`.
///
/// Used bare this is ECB; wrap it in a mode from [`crate::modes`] otherwise.
/// Round keys are wiped when the schedule is replaced or dropped.
#[derive(Default)]
pub struct AesEngine {
    schedule: Option<(KeySchedule, Direction)>,
}

impl AesEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockCipher for AesEngine {
    fn algorithm_name(&self) -> String {
        "AES".to_string()
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        if params.iv().is_some() {
            return Err(InitError::UnexpectedIv("AES"));
        }

        let key = params.key();
        let invalid = || InitError::InvalidKeyLength {
            algorithm: "AES",
            expected: "16, 24 or 32",
            actual: key.len(),
        };
        let schedule = match key.len() {
            16 => KeySchedule::Aes128(Aes128::new_from_slice(key).map_err(|_| invalid())?),
            24 => KeySchedule::Aes192(Aes192::new_from_slice(key).map_err(|_| invalid())?),
            32 => KeySchedule::Aes256(Aes256::new_from_slice(key).map_err(|_| invalid())?),
            _ => return Err(invalid()),
        };

        self.schedule = Some((schedule, Direction::from_encryption_flag(for_encryption)));
        Ok(())
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, TransformError> {
        let (schedule, direction) = self
            .schedule
            .as_ref()
            .ok_or(TransformError::NotInitialized("AES"))?;
        check_block_lengths(BLOCK_SIZE, input, output)?;

        let mut block = Block::clone_from_slice(&input[..BLOCK_SIZE]);
        match (schedule, direction) {
            (KeySchedule::Aes128(c), Direction::Encrypting) => c.encrypt_block(&mut block),
            (KeySchedule::Aes128(c), Direction::Decrypting) => c.decrypt_block(&mut block),
            (KeySchedule::Aes192(c), Direction::Encrypting) => c.encrypt_block(&mut block),
            (KeySchedule::Aes192(c), Direction::Decrypting) => c.decrypt_block(&mut block),
            (KeySchedule::Aes256(c), Direction::Encrypting) => c.encrypt_block(&mut block),
            (KeySchedule::Aes256(c), Direction::Decrypting) => c.decrypt_block(&mut block),
        }
        output[..BLOCK_SIZE].copy_from_slice(&block);

        Ok(BLOCK_SIZE)
    }

    // Stateless between blocks: nothing to rewind.
    fn reset(&mut self) {}
}

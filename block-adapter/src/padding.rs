//! Padding schemes for the final block of a block-mode session

use crate::error::PaddingError;

/// Extends a final partial block to a full block, and undoes it.
pub trait BlockCipherPadding {
    fn padding_name(&self) -> &'static str;

    /// Fill `block[used..]` with padding. `used < block.len()`.
    /// Returns the number of pad bytes written.
    fn add_padding(&self, block: &mut [u8], used: usize) -> usize;

    /// Number of pad bytes at the end of a decrypted final block.
    fn pad_count(&self, block: &[u8]) -> Result<usize, PaddingError>;

    /// Length of the data left once padding is removed.
    fn unpad(&self, block: &[u8]) -> Result<usize, PaddingError> {
        let count = self.pad_count(block)?;
        Ok(block.len() - count)
    }
}

/// PKCS#7: every pad byte holds the pad length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pkcs7Padding;

impl BlockCipherPadding for Pkcs7Padding {
    fn padding_name(&self) -> &'static str {
        "PKCS7"
    }

    fn add_padding(&self, block: &mut [u8], used: usize) -> usize {
        let count = block.len() - used;
        block[used..].fill(count as u8);
        count
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, PaddingError> {
        let count = block.last().copied().unwrap_or(0) as usize;
        if count == 0 || count > block.len() {
            return Err(PaddingError::InvalidCount {
                count,
                block_size: block.len(),
            });
        }

        // Inspect every pad byte before deciding.
        let mismatch = block[block.len() - count..]
            .iter()
            .fold(0u8, |acc, &b| acc | (b ^ count as u8));
        if mismatch != 0 {
            return Err(PaddingError::Corrupted);
        }
        Ok(count)
    }
}

/// ISO/IEC 7816-4: a single `0x80` followed by zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso7816d4Padding;

impl BlockCipherPadding for Iso7816d4Padding {
    fn padding_name(&self) -> &'static str {
        "ISO7816-4"
    }

    fn add_padding(&self, block: &mut [u8], used: usize) -> usize {
        block[used] = 0x80;
        block[used + 1..].fill(0);
        block.len() - used
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, PaddingError> {
        let marker = block
            .iter()
            .rposition(|&b| b != 0)
            .ok_or(PaddingError::Corrupted)?;
        if block[marker] != 0x80 {
            return Err(PaddingError::Corrupted);
        }
        Ok(block.len() - marker)
    }
}

/// Null padding. Trailing zero bytes of the plaintext are indistinguishable
/// from padding and are removed as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBytePadding;

impl BlockCipherPadding for ZeroBytePadding {
    fn padding_name(&self) -> &'static str {
        "ZeroByte"
    }

    fn add_padding(&self, block: &mut [u8], used: usize) -> usize {
        block[used..].fill(0);
        block.len() - used
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize, PaddingError> {
        Ok(block.iter().rev().take_while(|&&b| b == 0).count())
    }
}

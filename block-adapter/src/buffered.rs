//! Buffering adapter over any `BlockCipher`
//!
//! Input is appended to a one-block buffer; every complete block is
//! transformed and written out, and only the trailing partial block is kept.
//! When decrypting with padding the last full block is also kept back, since
//! it may be the pad block that `do_final` has to strip.

use tracing::{debug, trace, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::adapter::{available, input_range, BlockCipherAdapter, Lifecycle};
use crate::cipher::{BlockCipher, Direction};
use crate::error::{FinalizeError, InitError, ProcessError};
use crate::padding::BlockCipherPadding;
use crate::params::CipherParameters;

/// The buffering engine: drives any [`BlockCipher`] through the
/// [`BlockCipherAdapter`] contract, with optional padding of the final block.
///
/// ```rust
/// use block_adapter::{
///     AesEngine, BlockCipherAdapter, BufferedBlockCipher, CbcBlockCipher, CipherParameters,
///     Pkcs7Padding,
/// };
///
/// let mut cipher = BufferedBlockCipher::with_padding(CbcBlockCipher::new(AesEngine::new()), Pkcs7Padding);
/// cipher.init(true, &CipherParameters::new(vec![0u8; 16]).with_iv(vec![0u8; 16]))?;
/// assert_eq!(cipher.output_size(17), 32);
/// # Ok::<(), block_adapter::InitError>(())
/// ```
pub struct BufferedBlockCipher<C> {
    cipher: C,
    padding: Option<Box<dyn BlockCipherPadding + Send>>,
    buf: Zeroizing<Vec<u8>>,
    buf_off: usize,
    scratch: Zeroizing<Vec<u8>>,
    direction: Direction,
    lifecycle: Lifecycle,
}

impl<C: BlockCipher> BufferedBlockCipher<C> {
    /// Without padding. Block modes then need block-aligned input; stream-like
    /// modes (CTR, OFB) finish on a short block.
    ///
    /// # Panics
    ///
    /// If `cipher.block_size()` is zero.
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        assert!(block_size > 0, "block size must be non-zero");
        Self {
            cipher,
            padding: None,
            buf: Zeroizing::new(vec![0u8; block_size]),
            buf_off: 0,
            scratch: Zeroizing::new(vec![0u8; block_size]),
            direction: Direction::Encrypting,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// With a padding strategy applied in `do_final`.
    pub fn with_padding<P>(cipher: C, padding: P) -> Self
    where
        P: BlockCipherPadding + Send + 'static,
    {
        let mut engine = Self::new(cipher);
        engine.padding = Some(Box::new(padding));
        engine
    }

    pub(crate) fn with_boxed_padding(
        cipher: C,
        padding: Option<Box<dyn BlockCipherPadding + Send>>,
    ) -> Self {
        let mut engine = Self::new(cipher);
        engine.padding = padding;
        engine
    }

    /// The wrapped block transform.
    pub fn underlying_cipher(&self) -> &C {
        &self.cipher
    }

    /// Block size of the wrapped transform.
    pub fn block_size(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently held back in the internal buffer.
    pub fn buffered_len(&self) -> usize {
        self.buf_off
    }

    fn holds_back_final_block(&self) -> bool {
        self.padding.is_some() && self.direction == Direction::Decrypting
    }

    fn clear_buffer(&mut self) {
        self.buf[..].zeroize();
        self.scratch[..].zeroize();
        self.buf_off = 0;
    }

    fn finish(&mut self) {
        self.clear_buffer();
        self.lifecycle = Lifecycle::Finalized;
    }

    fn finish_padded(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        let block_size = self.block_size();
        let avail = available(output, out_off);

        let Some(padding) = self.padding.as_deref() else {
            return Ok(0);
        };

        match self.direction {
            Direction::Encrypting => {
                // process_bytes never leaves a full block buffered here.
                if avail < block_size {
                    return Err(FinalizeError::BufferTooSmall {
                        needed: block_size,
                        available: avail,
                    });
                }

                let padded = padding.add_padding(&mut self.buf, self.buf_off);
                trace!(pad_bytes = padded, "padding final block");
                self.cipher.process_block(&self.buf, &mut output[out_off..])?;
                Ok(block_size)
            }
            Direction::Decrypting => {
                if self.buf_off != block_size {
                    return Err(FinalizeError::InvalidCiphertext(
                        "last block incomplete in decryption".to_string(),
                    ));
                }
                if avail < block_size {
                    return Err(FinalizeError::BufferTooSmall {
                        needed: block_size,
                        available: avail,
                    });
                }

                self.cipher.process_block(&self.buf, &mut self.scratch)?;
                let data_len = padding.unpad(&self.scratch)?;
                output[out_off..out_off + data_len].copy_from_slice(&self.scratch[..data_len]);
                Ok(data_len)
            }
        }
    }

    fn finish_unpadded(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        let remaining = self.buf_off;
        if remaining == 0 {
            return Ok(0);
        }

        if !self.cipher.is_partial_block_okay() {
            return Err(match self.direction {
                Direction::Decrypting => FinalizeError::InvalidCiphertext(
                    "ciphertext length not a multiple of the block size".to_string(),
                ),
                Direction::Encrypting => FinalizeError::IncompleteBlock { remaining },
            });
        }

        let avail = available(output, out_off);
        if avail < remaining {
            return Err(FinalizeError::BufferTooSmall {
                needed: remaining,
                available: avail,
            });
        }

        self.buf[remaining..].fill(0);
        self.cipher.process_block(&self.buf, &mut self.scratch)?;
        output[out_off..out_off + remaining].copy_from_slice(&self.scratch[..remaining]);
        Ok(remaining)
    }
}

impl<C: BlockCipher> BlockCipherAdapter for BufferedBlockCipher<C> {
    fn output_size(&self, len: usize) -> usize {
        let block_size = self.block_size();
        let total = self.buf_off + len;
        let leftover = total % block_size;

        match (&self.padding, self.direction) {
            (Some(_), Direction::Encrypting) => total - leftover + block_size,
            _ => total,
        }
    }

    fn update_output_size(&self, len: usize) -> usize {
        let block_size = self.block_size();
        let total = self.buf_off + len;
        let leftover = total % block_size;

        if self.holds_back_final_block() && leftover == 0 {
            total.saturating_sub(block_size)
        } else {
            total - leftover
        }
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        self.clear_buffer();
        if let Err(err) = self.cipher.init(for_encryption, params) {
            self.lifecycle = Lifecycle::Uninitialized;
            return Err(err);
        }

        self.direction = Direction::from_encryption_flag(for_encryption);
        self.lifecycle = Lifecycle::Ready;
        debug!(
            algorithm = %self.algorithm_name(),
            direction = ?self.direction,
            "cipher initialised"
        );
        Ok(())
    }

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, ProcessError> {
        self.lifecycle.check_process()?;
        let input = &input[input_range(input, in_off, len)?];

        let needed = self.update_output_size(len);
        let avail = available(output, out_off);
        if needed > avail {
            return Err(ProcessError::BufferTooSmall { needed, available: avail });
        }

        let block_size = self.block_size();
        let hold_back = self.holds_back_final_block();
        let reserve = usize::from(hold_back);
        let mut consumed = 0;
        let mut produced = 0;

        while consumed < input.len() {
            if self.buf_off == block_size {
                self.cipher
                    .process_block(&self.buf, &mut output[out_off + produced..])?;
                produced += block_size;
                self.buf_off = 0;
            }

            if self.buf_off == 0 {
                // Whole blocks go straight from input to output.
                while input.len() - consumed >= block_size + reserve {
                    self.cipher
                        .process_block(&input[consumed..], &mut output[out_off + produced..])?;
                    consumed += block_size;
                    produced += block_size;
                }
            }

            let take = (block_size - self.buf_off).min(input.len() - consumed);
            self.buf[self.buf_off..self.buf_off + take]
                .copy_from_slice(&input[consumed..consumed + take]);
            self.buf_off += take;
            consumed += take;

            if self.buf_off == block_size && !hold_back {
                self.cipher
                    .process_block(&self.buf, &mut output[out_off + produced..])?;
                produced += block_size;
                self.buf_off = 0;
            }
        }

        trace!(consumed, produced, buffered = self.buf_off, "processed bytes");
        Ok(produced)
    }

    /// Needs room for [`output_size(0)`](BlockCipherAdapter::output_size)
    /// bytes. `BufferTooSmall` leaves the session untouched so the call can
    /// be retried; `InvalidCiphertext` ends it.
    fn do_final(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        self.lifecycle.check_finalize()?;

        let result = if self.padding.is_some() {
            self.finish_padded(output, out_off)
        } else {
            self.finish_unpadded(output, out_off)
        };

        match result {
            Ok(written) => {
                self.finish();
                debug!(algorithm = %self.algorithm_name(), written, "cipher finalised");
                Ok(written)
            }
            Err(err @ FinalizeError::InvalidCiphertext(_)) => {
                self.finish();
                warn!(algorithm = %self.algorithm_name(), error = %err, "rejected ciphertext");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn reset(&mut self) {
        self.clear_buffer();
        self.cipher.reset();
        if self.lifecycle != Lifecycle::Uninitialized {
            self.lifecycle = Lifecycle::Ready;
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn algorithm_name(&self) -> String {
        match &self.padding {
            Some(padding) => format!("{}/{}", self.cipher.algorithm_name(), padding.padding_name()),
            None => format!("{}/NoPadding", self.cipher.algorithm_name()),
        }
    }
}

//! Pass-through adapter for transforms that need no buffering

use tracing::debug;

use crate::adapter::{available, input_range, BlockCipherAdapter, Lifecycle};
use crate::cipher::StreamCipher;
use crate::error::{FinalizeError, InitError, ProcessError};
use crate::params::CipherParameters;

/// Adapter for byte-oriented transforms such as CTR or OFB used as a
/// [`StreamCipher`].
///
/// Every byte fed in comes straight back out, so `output_size(len)` is
/// `len` and `do_final` writes nothing. Lifecycle and errors match
/// [`BufferedBlockCipher`](crate::BufferedBlockCipher).
pub struct StreamCipherAdapter<S> {
    cipher: S,
    lifecycle: Lifecycle,
}

impl<S: StreamCipher> StreamCipherAdapter<S> {
    /// Wrap an uninitialised stream transform.
    pub fn new(cipher: S) -> Self {
        Self {
            cipher,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// The wrapped transform.
    pub fn underlying_cipher(&self) -> &S {
        &self.cipher
    }
}

impl<S: StreamCipher> BlockCipherAdapter for StreamCipherAdapter<S> {
    fn output_size(&self, len: usize) -> usize {
        len
    }

    fn update_output_size(&self, len: usize) -> usize {
        len
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        if let Err(err) = self.cipher.init(for_encryption, params) {
            self.lifecycle = Lifecycle::Uninitialized;
            return Err(err);
        }
        self.lifecycle = Lifecycle::Ready;
        debug!(algorithm = %self.cipher.algorithm_name(), for_encryption, "stream cipher initialised");
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
        let avail = available(output, out_off);
        if avail < len {
            return Err(ProcessError::BufferTooSmall { needed: len, available: avail });
        }

        self.cipher
            .process_bytes(input, &mut output[out_off..out_off + len])?;
        Ok(len)
    }

    fn do_final(&mut self, _output: &mut [u8], _out_off: usize) -> Result<usize, FinalizeError> {
        self.lifecycle.check_finalize()?;
        self.lifecycle = Lifecycle::Finalized;
        Ok(0)
    }

    fn reset(&mut self) {
        self.cipher.reset();
        if self.lifecycle != Lifecycle::Uninitialized {
            self.lifecycle = Lifecycle::Ready;
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn algorithm_name(&self) -> String {
        self.cipher.algorithm_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffered::BufferedBlockCipher;
    use crate::engines::AesEngine;
    use crate::modes::{CtrBlockCipher, OfbBlockCipher};

    fn params() -> CipherParameters {
        CipherParameters::new(vec![0x11; 16]).with_iv(vec![0x22; 16])
    }

    #[test]
    fn test_every_byte_comes_straight_out() {
        let mut adapter = StreamCipherAdapter::new(CtrBlockCipher::new(AesEngine::new()));
        adapter.init(true, &params()).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(adapter.process_bytes(b"abc", 0, 3, &mut out, 0).unwrap(), 3);
        assert_eq!(adapter.output_size(0), 0);
        assert_eq!(adapter.do_final(&mut out, 3).unwrap(), 0);
    }

    #[test]
    fn test_matches_buffered_adapter() {
        let plaintext: Vec<u8> = (0u8..=60).collect();

        let mut pass = StreamCipherAdapter::new(OfbBlockCipher::new(AesEngine::new()));
        pass.init(true, &params()).unwrap();
        let mut a = vec![0u8; plaintext.len()];
        let mut off = 0;
        for chunk in plaintext.chunks(7) {
            off += pass.process_bytes(chunk, 0, chunk.len(), &mut a, off).unwrap();
        }
        pass.do_final(&mut a, off).unwrap();

        let mut buffered = BufferedBlockCipher::new(OfbBlockCipher::new(AesEngine::new()));
        buffered.init(true, &params()).unwrap();
        let mut b = vec![0u8; buffered.output_size(plaintext.len())];
        let n = buffered
            .process_bytes(&plaintext, 0, plaintext.len(), &mut b, 0)
            .unwrap();
        buffered.do_final(&mut b, n).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_lifecycle_enforced() {
        let mut adapter = StreamCipherAdapter::new(CtrBlockCipher::new(AesEngine::new()));
        let mut out = [0u8; 4];
        assert_eq!(
            adapter.process_bytes(b"abcd", 0, 4, &mut out, 0),
            Err(ProcessError::NotInitialized)
        );

        adapter.init(false, &params()).unwrap();
        adapter.do_final(&mut out, 0).unwrap();
        assert_eq!(adapter.do_final(&mut out, 0), Err(FinalizeError::Finalized));

        adapter.reset();
        assert_eq!(adapter.lifecycle(), Lifecycle::Ready);
    }

    #[test]
    fn test_output_too_small() {
        let mut adapter = StreamCipherAdapter::new(CtrBlockCipher::new(AesEngine::new()));
        adapter.init(true, &params()).unwrap();
        let mut out = [0u8; 2];
        assert_eq!(
            adapter.process_bytes(b"abcd", 0, 4, &mut out, 0),
            Err(ProcessError::BufferTooSmall { needed: 4, available: 2 })
        );
    }
}

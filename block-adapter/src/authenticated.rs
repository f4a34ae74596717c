//! Encrypt-then-MAC wrapper around any adapter
//!
//! `init` splits the supplied key with HKDF-SHA256 into an encryption key
//! (same length as the input key) and a 32-byte MAC key. HMAC-SHA256 runs
//! over the length-prefixed associated data, the length-prefixed IV and every
//! ciphertext byte. Encryption appends the tag in `do_final`; decryption
//! withholds the trailing tag and checks it before finishing.
//!
//! Plaintext returned by `process_bytes` during decryption is not yet
//! authenticated. Discard it if `do_final` fails.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::adapter::{available, input_range, BlockCipherAdapter, Lifecycle};
use crate::cipher::Direction;
use crate::error::{FinalizeError, InitError, ProcessError};
use crate::params::CipherParameters;

type HmacSha256 = Hmac<Sha256>;

/// Length of the appended authentication tag.
pub const TAG_LEN: usize = 32;

const ENCRYPTION_KEY_INFO: &[u8] = b"block-adapter/encryption";
const MAC_KEY_INFO: &[u8] = b"block-adapter/authentication";

/// Wraps any adapter with an HMAC-SHA256 tag over its ciphertext.
///
/// Encryption output is the inner ciphertext followed by [`TAG_LEN`] tag
/// bytes. Decryption expects the same layout and fails `do_final` with
/// `InvalidCiphertext` unless the tag matches.
pub struct AuthenticatedCipher<A> {
    inner: A,
    mac_template: Option<HmacSha256>,
    mac: Option<HmacSha256>,
    tail: Zeroizing<Vec<u8>>,
    direction: Direction,
    lifecycle: Lifecycle,
}

impl<A: BlockCipherAdapter> AuthenticatedCipher<A> {
    /// Wrap an uninitialised adapter. Keys are derived at `init`.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            mac_template: None,
            mac: None,
            tail: Zeroizing::new(Vec::with_capacity(TAG_LEN)),
            direction: Direction::Encrypting,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// The wrapped adapter.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Ciphertext bytes forwarded to the inner adapter once `len` more
    /// arrive: everything except the last `TAG_LEN` bytes seen.
    fn forwarded_len(&self, len: usize) -> usize {
        (self.tail.len() + len).saturating_sub(TAG_LEN)
    }

    fn derive_keys(key: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<[u8; 32]>), InitError> {
        let hk = Hkdf::<Sha256>::new(None, key);
        let mut enc_key = Zeroizing::new(vec![0u8; key.len()]);
        hk.expand(ENCRYPTION_KEY_INFO, &mut enc_key)
            .map_err(|e| InitError::KeyDerivation(e.to_string()))?;
        let mut mac_key = Zeroizing::new([0u8; 32]);
        hk.expand(MAC_KEY_INFO, &mut mac_key[..])
            .map_err(|e| InitError::KeyDerivation(e.to_string()))?;
        Ok((enc_key, mac_key))
    }

    fn finish(&mut self) {
        self.tail.zeroize();
        self.mac = None;
        self.lifecycle = Lifecycle::Finalized;
    }

    fn finish_encrypt(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        let needed = self.inner.output_size(0) + TAG_LEN;
        let avail = available(output, out_off);
        if avail < needed {
            return Err(FinalizeError::BufferTooSmall { needed, available: avail });
        }

        let written = self.inner.do_final(output, out_off)?;
        let mut mac = self.mac.take().ok_or(FinalizeError::NotInitialized)?;
        mac.update(&output[out_off..out_off + written]);
        let tag = mac.finalize().into_bytes();

        let tag_off = out_off + written;
        output[tag_off..tag_off + TAG_LEN].copy_from_slice(&tag);
        Ok(written + TAG_LEN)
    }

    fn finish_decrypt(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        if self.tail.len() < TAG_LEN {
            return Err(FinalizeError::InvalidCiphertext(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }

        let needed = self.inner.output_size(0);
        let avail = available(output, out_off);
        if avail < needed {
            return Err(FinalizeError::BufferTooSmall { needed, available: avail });
        }

        // Verify a copy so a failed inner finalisation can be retried.
        let mac = self.mac.clone().ok_or(FinalizeError::NotInitialized)?;
        mac.verify_slice(&self.tail)
            .map_err(|_| FinalizeError::InvalidCiphertext("authentication tag mismatch".to_string()))?;

        self.inner.do_final(output, out_off)
    }
}

impl<A: BlockCipherAdapter> BlockCipherAdapter for AuthenticatedCipher<A> {
    fn output_size(&self, len: usize) -> usize {
        match self.direction {
            Direction::Encrypting => self.inner.output_size(len) + TAG_LEN,
            Direction::Decrypting => self.inner.output_size(self.forwarded_len(len)),
        }
    }

    fn update_output_size(&self, len: usize) -> usize {
        match self.direction {
            Direction::Encrypting => self.inner.update_output_size(len),
            Direction::Decrypting => self.inner.update_output_size(self.forwarded_len(len)),
        }
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        self.tail.zeroize();
        self.mac = None;
        self.mac_template = None;
        self.lifecycle = Lifecycle::Uninitialized;

        let (enc_key, mac_key) = Self::derive_keys(params.key())?;
        self.inner
            .init(for_encryption, &params.with_key(enc_key.to_vec()))?;

        let mut mac = HmacSha256::new_from_slice(&mac_key[..])
            .map_err(|e| InitError::KeyDerivation(e.to_string()))?;
        let aad = params.associated_data().unwrap_or_default();
        mac.update(&(aad.len() as u64).to_be_bytes());
        mac.update(aad);
        let iv = params.iv().unwrap_or_default();
        mac.update(&(iv.len() as u64).to_be_bytes());
        mac.update(iv);

        self.mac_template = Some(mac.clone());
        self.mac = Some(mac);
        self.direction = Direction::from_encryption_flag(for_encryption);
        self.lifecycle = Lifecycle::Ready;
        debug!(algorithm = %self.algorithm_name(), direction = ?self.direction, "authenticated cipher initialised");
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

        let mac = self.mac.as_mut().ok_or(ProcessError::NotInitialized)?;
        match self.direction {
            Direction::Encrypting => {
                let written = self.inner.process_bytes(input, 0, input.len(), output, out_off)?;
                mac.update(&output[out_off..out_off + written]);
                Ok(written)
            }
            Direction::Decrypting => {
                let body_len = (self.tail.len() + input.len()).saturating_sub(TAG_LEN);
                if body_len == 0 {
                    self.tail.extend_from_slice(input);
                    return Ok(0);
                }

                // Withheld bytes followed by the new input; the last TAG_LEN
                // stay behind. Nothing is committed until the inner adapter
                // has accepted the body.
                let mut pending = Zeroizing::new(Vec::with_capacity(self.tail.len() + input.len()));
                pending.extend_from_slice(&self.tail);
                pending.extend_from_slice(input);

                let written = self.inner.process_bytes(&pending, 0, body_len, output, out_off)?;
                mac.update(&pending[..body_len]);
                self.tail.zeroize();
                self.tail.extend_from_slice(&pending[body_len..]);
                Ok(written)
            }
        }
    }

    fn do_final(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        self.lifecycle.check_finalize()?;

        let result = match self.direction {
            Direction::Encrypting => self.finish_encrypt(output, out_off),
            Direction::Decrypting => self.finish_decrypt(output, out_off),
        };

        match result {
            Ok(written) => {
                self.finish();
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
        self.inner.reset();
        self.tail.zeroize();
        self.mac = self.mac_template.clone();
        if self.lifecycle != Lifecycle::Uninitialized {
            self.lifecycle = Lifecycle::Ready;
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn algorithm_name(&self) -> String {
        format!("{}+HMAC-SHA256", self.inner.algorithm_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffered::BufferedBlockCipher;
    use crate::engines::AesEngine;
    use crate::error::TransformError;
    use crate::modes::CbcBlockCipher;
    use crate::padding::Pkcs7Padding;
    use crate::util::process_all;

    type Inner = BufferedBlockCipher<CbcBlockCipher<AesEngine>>;

    fn cipher() -> AuthenticatedCipher<Inner> {
        AuthenticatedCipher::new(BufferedBlockCipher::with_padding(
            CbcBlockCipher::new(AesEngine::new()),
            Pkcs7Padding,
        ))
    }

    fn params() -> CipherParameters {
        CipherParameters::new(vec![0x5C; 32])
            .with_iv(vec![0x01; 16])
            .with_associated_data(b"header".to_vec())
    }

    fn encrypt(plaintext: &[u8]) -> Vec<u8> {
        let mut c = cipher();
        c.init(true, &params()).unwrap();
        process_all(&mut c, plaintext).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let plaintext = b"authenticated message spanning several blocks";
        let ciphertext = encrypt(plaintext);
        assert_eq!(ciphertext.len(), 48 + TAG_LEN);

        let mut c = cipher();
        c.init(false, &params()).unwrap();
        assert_eq!(process_all(&mut c, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_any_flipped_byte_is_rejected() {
        let ciphertext = encrypt(b"seventeen bytes!!");
        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;

            let mut c = cipher();
            c.init(false, &params()).unwrap();
            let err = process_all(&mut c, &tampered).unwrap_err();
            assert!(err.is_invalid_ciphertext(), "byte {} accepted", i);
        }
    }

    #[test]
    fn test_wrong_associated_data_is_rejected() {
        let ciphertext = encrypt(b"payload");
        let mut c = cipher();
        c.init(false, &params().with_associated_data(b"other".to_vec()))
            .unwrap();
        assert!(process_all(&mut c, &ciphertext).unwrap_err().is_invalid_ciphertext());
    }

    #[test]
    fn test_truncated_is_rejected() {
        let ciphertext = encrypt(b"payload");
        let mut c = cipher();
        c.init(false, &params()).unwrap();
        let err = process_all(&mut c, &ciphertext[..TAG_LEN - 1]).unwrap_err();
        assert!(err.is_invalid_ciphertext());
        assert_eq!(c.lifecycle(), Lifecycle::Finalized);
    }

    #[test]
    fn test_tag_withheld_while_decrypting() {
        let ciphertext = encrypt(&[7u8; 32]);
        let mut c = cipher();
        c.init(false, &params()).unwrap();
        let mut out = vec![0u8; c.output_size(ciphertext.len())];
        // 48 ciphertext bytes + 32 tag bytes; padded decryption keeps one block.
        let n = c
            .process_bytes(&ciphertext, 0, ciphertext.len(), &mut out, 0)
            .unwrap();
        assert_eq!(n, 32);
        let last = c.do_final(&mut out, n).unwrap();
        assert_eq!(&out[..n + last], &[7u8; 32]);
    }

    #[test]
    fn test_reset_reproduces_ciphertext() {
        let mut c = cipher();
        c.init(true, &params()).unwrap();
        let first = process_all(&mut c, b"same input").unwrap();
        c.reset();
        let second = process_all(&mut c, b"same input").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_final_buffer_too_small() {
        let mut c = cipher();
        c.init(true, &params()).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(
            c.do_final(&mut out, 0),
            Err(FinalizeError::BufferTooSmall { needed: 16 + TAG_LEN, available: 16 })
        );
        assert_eq!(c.lifecycle(), Lifecycle::Ready);
    }

    #[test]
    fn test_inner_key_length_still_checked() {
        let mut c = cipher();
        let params = CipherParameters::new(vec![0u8; 10]).with_iv(vec![0u8; 16]);
        assert!(matches!(
            c.init(true, &params),
            Err(InitError::InvalidKeyLength { actual: 10, .. })
        ));
    }

    /// Inner adapter that fails its next `process_bytes` or `do_final` once.
    struct Flaky {
        inner: Inner,
        fail_process: bool,
        fail_final: bool,
    }

    impl Flaky {
        fn new() -> Self {
            Self {
                inner: BufferedBlockCipher::with_padding(CbcBlockCipher::new(AesEngine::new()), Pkcs7Padding),
                fail_process: false,
                fail_final: false,
            }
        }
    }

    impl BlockCipherAdapter for Flaky {
        fn output_size(&self, len: usize) -> usize {
            self.inner.output_size(len)
        }

        fn update_output_size(&self, len: usize) -> usize {
            self.inner.update_output_size(len)
        }

        fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
            self.inner.init(for_encryption, params)
        }

        fn process_bytes(
            &mut self,
            input: &[u8],
            in_off: usize,
            len: usize,
            output: &mut [u8],
            out_off: usize,
        ) -> Result<usize, ProcessError> {
            if std::mem::take(&mut self.fail_process) {
                return Err(TransformError::NotInitialized("flaky").into());
            }
            self.inner.process_bytes(input, in_off, len, output, out_off)
        }

        fn do_final(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
            if std::mem::take(&mut self.fail_final) {
                return Err(TransformError::NotInitialized("flaky").into());
            }
            self.inner.do_final(output, out_off)
        }

        fn reset(&mut self) {
            self.inner.reset()
        }

        fn lifecycle(&self) -> Lifecycle {
            self.inner.lifecycle()
        }

        fn algorithm_name(&self) -> String {
            self.inner.algorithm_name()
        }
    }

    #[test]
    fn test_failed_inner_process_consumes_nothing() {
        let plaintext = b"retry after a failed write must not double-count input";
        let ciphertext = encrypt(plaintext);

        let mut c = AuthenticatedCipher::new(Flaky::new());
        c.init(false, &params()).unwrap();
        let mut out = vec![0u8; c.output_size(ciphertext.len())];

        c.inner.fail_process = true;
        assert!(c
            .process_bytes(&ciphertext, 0, ciphertext.len(), &mut out, 0)
            .is_err());
        assert_eq!(c.lifecycle(), Lifecycle::Ready);

        let n = c
            .process_bytes(&ciphertext, 0, ciphertext.len(), &mut out, 0)
            .unwrap();
        let m = c.do_final(&mut out, n).unwrap();
        assert_eq!(&out[..n + m], &plaintext[..]);
    }

    #[test]
    fn test_failed_inner_final_can_retry() {
        let plaintext = b"finalisation retried";
        let ciphertext = encrypt(plaintext);

        let mut c = AuthenticatedCipher::new(Flaky::new());
        c.init(false, &params()).unwrap();
        let mut out = vec![0u8; c.output_size(ciphertext.len())];
        let n = c
            .process_bytes(&ciphertext, 0, ciphertext.len(), &mut out, 0)
            .unwrap();

        c.inner.fail_final = true;
        let err = c.do_final(&mut out, n).unwrap_err();
        assert!(!err.is_invalid_ciphertext());
        assert_eq!(c.lifecycle(), Lifecycle::Ready);

        let m = c.do_final(&mut out, n).unwrap();
        assert_eq!(&out[..n + m], &plaintext[..]);
    }

    #[test]
    fn test_finish_wipes_withheld_tag() {
        let ciphertext = encrypt(b"payload");
        let mut c = cipher();
        c.init(false, &params()).unwrap();
        process_all(&mut c, &ciphertext).unwrap();
        assert!(c.tail.is_empty());
    }
}

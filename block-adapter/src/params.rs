//! Key material and mode parameters handed to `init`

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key plus optional IV/nonce and associated data.
///
/// The key is wiped when the value is dropped. `Debug` never prints it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherParameters {
    key: Vec<u8>,
    iv: Option<Vec<u8>>,
    associated_data: Option<Vec<u8>>,
}

impl CipherParameters {
    /// Parameters carrying only a key (ECB, or the inner engine of a mode).
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            iv: None,
            associated_data: None,
        }
    }

    /// Attach an IV or nonce.
    pub fn with_iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    /// Attach associated data, authenticated but not encrypted.
    pub fn with_associated_data(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.associated_data = Some(aad.into());
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    pub fn associated_data(&self) -> Option<&[u8]> {
        self.associated_data.as_deref()
    }

    /// Same key, IV and associated data stripped. Modes pass this to the
    /// engine they wrap.
    pub fn key_only(&self) -> Self {
        Self::new(self.key.clone())
    }

    /// Same IV and associated data with a different key.
    pub fn with_key(&self, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            iv: self.iv.clone(),
            associated_data: self.associated_data.clone(),
        }
    }
}

impl fmt::Debug for CipherParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherParameters")
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("iv", &self.iv.as_ref().map(|iv| iv.len()))
            .field(
                "associated_data",
                &self.associated_data.as_ref().map(|aad| aad.len()),
            )
            .finish()
    }
}

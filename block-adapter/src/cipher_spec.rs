//! `ALG/MODE/PADDING` cipher descriptions, e.g. `AES/CBC/PKCS7Padding`

use std::fmt;
use std::str::FromStr;

use crate::adapter::BlockCipherAdapter;
use crate::buffered::BufferedBlockCipher;
use crate::cipher::BlockCipher;
use crate::engines::AesEngine;
use crate::error::SpecError;
use crate::modes::{CbcBlockCipher, CtrBlockCipher, OfbBlockCipher};
use crate::padding::{BlockCipherPadding, Iso7816d4Padding, Pkcs7Padding, ZeroBytePadding};

/// Block cipher algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Aes,
}

/// Mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ecb,
    Cbc,
    Ctr,
    Ofb,
}

/// Final-block padding; `None` requires aligned input for block modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingScheme {
    Pkcs7,
    Iso7816d4,
    ZeroByte,
    None,
}

/// A parsed cipher description that can build a ready-to-init adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCipherSpec {
    pub algorithm: Algorithm,
    pub mode: Mode,
    pub padding: PaddingScheme,
}

impl Algorithm {
    pub fn block_size(self) -> usize {
        match self {
            Algorithm::Aes => 16,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
        }
    }
}

impl Mode {
    /// ECB is the only supported mode that takes no IV.
    pub fn needs_iv(self) -> bool {
        !matches!(self, Mode::Ecb)
    }

    fn name(self) -> &'static str {
        match self {
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Ctr => "CTR",
            Mode::Ofb => "OFB",
        }
    }
}

impl PaddingScheme {
    fn strategy(self) -> Option<Box<dyn BlockCipherPadding + Send>> {
        match self {
            PaddingScheme::Pkcs7 => Some(Box::new(Pkcs7Padding)),
            PaddingScheme::Iso7816d4 => Some(Box::new(Iso7816d4Padding)),
            PaddingScheme::ZeroByte => Some(Box::new(ZeroBytePadding)),
            PaddingScheme::None => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PaddingScheme::Pkcs7 => "PKCS7Padding",
            PaddingScheme::Iso7816d4 => "ISO7816-4Padding",
            PaddingScheme::ZeroByte => "ZeroBytePadding",
            PaddingScheme::None => "NoPadding",
        }
    }
}

impl BlockCipherSpec {
    pub fn new(algorithm: Algorithm, mode: Mode, padding: PaddingScheme) -> Self {
        Self {
            algorithm,
            mode,
            padding,
        }
    }

    /// IV length the mode expects, or `None` for ECB.
    pub fn iv_len(&self) -> Option<usize> {
        self.mode.needs_iv().then(|| self.algorithm.block_size())
    }

    /// Build an uninitialised adapter for this description.
    pub fn new_cipher(&self) -> Box<dyn BlockCipherAdapter + Send> {
        let engine = match self.algorithm {
            Algorithm::Aes => AesEngine::new(),
        };
        let cipher: Box<dyn BlockCipher + Send> = match self.mode {
            Mode::Ecb => Box::new(engine),
            Mode::Cbc => Box::new(CbcBlockCipher::new(engine)),
            Mode::Ctr => Box::new(CtrBlockCipher::new(engine)),
            Mode::Ofb => Box::new(OfbBlockCipher::new(engine)),
        };
        Box::new(BufferedBlockCipher::with_boxed_padding(
            cipher,
            self.padding.strategy(),
        ))
    }
}

impl FromStr for BlockCipherSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        let [alg, mode, padding] = parts.as_slice() else {
            return Err(SpecError::Malformed(s.to_string()));
        };

        let algorithm = match alg.to_ascii_uppercase().as_str() {
            "AES" => Algorithm::Aes,
            _ => return Err(SpecError::UnsupportedAlgorithm(alg.to_string())),
        };
        let mode = match mode.to_ascii_uppercase().as_str() {
            "ECB" => Mode::Ecb,
            "CBC" => Mode::Cbc,
            "CTR" | "SIC" => Mode::Ctr,
            "OFB" => Mode::Ofb,
            _ => return Err(SpecError::UnsupportedMode(mode.to_string())),
        };
        let padding = match padding.to_ascii_uppercase().as_str() {
            "PKCS7PADDING" | "PKCS5PADDING" | "PKCS7" => PaddingScheme::Pkcs7,
            "ISO7816-4PADDING" | "ISO7816D4PADDING" | "ISO7816-4" => PaddingScheme::Iso7816d4,
            "ZEROBYTEPADDING" | "ZEROBYTE" => PaddingScheme::ZeroByte,
            "NOPADDING" | "NONE" => PaddingScheme::None,
            _ => return Err(SpecError::UnsupportedPadding(padding.to_string())),
        };

        Ok(Self::new(algorithm, mode, padding))
    }
}

impl fmt::Display for BlockCipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.algorithm.name(),
            self.mode.name(),
            self.padding.name()
        )
    }
}

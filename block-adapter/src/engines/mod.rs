//! Raw block engines backed by external implementations

pub mod aes;

pub use self::aes::AesEngine;

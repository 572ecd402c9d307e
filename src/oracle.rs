// The padding oracle.
//
// `OracleService` models a server that holds a secret key, hands out
// ciphertexts and, when asked to decrypt one, leaks nothing but whether the
// PKCS#7 padding came out well-formed. The attack only ever sees the
// `PaddingOracle` trait, so it can equally be pointed at a remote service.
use rand::{rngs::StdRng, RngCore, SeedableRng};
use thiserror::Error;

use std::sync::Mutex;

use crate::{
    decrypt_aes_128_cbc, encrypt_aes_128_cbc, is_pkcs7_padded_constant_time, pkcs7_pad, BLOCK_SIZE,
};

/// Failure to obtain an answer from an oracle.
///
/// This is never a padding verdict: an oracle that could not be asked has
/// said nothing about the padding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle transport failure: {0}")]
    Transport(String),
}

pub trait PaddingOracle: Sync {
    /// Ask whether `ciphertext`, read as `IV || blocks`, decrypts to valid
    /// PKCS#7 padding.
    fn query_padding_valid(&self, ciphertext: &[u8]) -> Result<bool, OracleError>;
}

/// Only IV generation mutates state, so the RNG alone sits behind a lock and
/// padding queries never contend for it.
pub struct OracleService {
    key: [u8; BLOCK_SIZE],
    rng: Mutex<StdRng>,
}

impl OracleService {
    pub fn new(key: [u8; BLOCK_SIZE], rng: StdRng) -> Self {
        Self {
            key,
            rng: Mutex::new(rng),
        }
    }

    /// An oracle with a fresh random key, drawing IVs from OS entropy.
    pub fn from_entropy() -> Self {
        let mut rng = StdRng::from_entropy();
        let mut key = [0u8; BLOCK_SIZE];
        rng.fill_bytes(&mut key);
        Self::new(key, rng)
    }

    /// Pad and encrypt `message` under a fresh random IV.
    ///
    /// The IV is returned as the first block of the ciphertext.
    pub fn encrypt(&self, message: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; BLOCK_SIZE];
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .fill_bytes(&mut iv);
        self.encrypt_with_iv(message, &iv)
    }

    pub fn encrypt_with_iv(&self, message: &[u8], iv: &[u8; BLOCK_SIZE]) -> Vec<u8> {
        let padded = pkcs7_pad(message, BLOCK_SIZE as u8);
        let mut ciphertext = Vec::with_capacity(BLOCK_SIZE + padded.len());
        ciphertext.extend_from_slice(iv);
        ciphertext.extend(encrypt_aes_128_cbc(&padded, &self.key, iv));
        ciphertext
    }

    /// Decrypt `data` (`IV || blocks`) and report only whether its padding is
    /// well-formed.
    ///
    /// Input that is not at least two whole blocks is reported as invalid
    /// padding, so the boolean stays the only observable signal. The padding
    /// check takes the same path whichever way the padding is malformed.
    pub fn is_padding_valid(&self, data: &[u8]) -> bool {
        if data.len() % BLOCK_SIZE != 0 || data.len() < 2 * BLOCK_SIZE {
            return false;
        }
        let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
        let mut iv_block = [0u8; BLOCK_SIZE];
        iv_block.copy_from_slice(iv);
        let plaintext = decrypt_aes_128_cbc(ciphertext, &self.key, &iv_block);
        is_pkcs7_padded_constant_time(&plaintext, BLOCK_SIZE as u8)
    }

    #[cfg(test)]
    fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
        decrypt_aes_128_cbc(ciphertext, &self.key, iv.try_into().unwrap())
    }
}

impl PaddingOracle for OracleService {
    fn query_padding_valid(&self, ciphertext: &[u8]) -> Result<bool, OracleError> {
        Ok(self.is_padding_valid(ciphertext))
    }
}

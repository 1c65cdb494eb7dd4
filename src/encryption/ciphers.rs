// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::errors::ParquetError::General;
use crate::errors::Result;
use ring::aead::{AES_128_GCM, AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt::Debug;

pub(crate) const NONCE_LEN: usize = 12;
pub(crate) const TAG_LEN: usize = 16;
pub(crate) const SIZE_LEN: usize = 4;

/// Number of bytes an encrypted module grows by: the 4-byte length frame, the
/// nonce prefixed to the ciphertext and the authentication tag appended to it.
pub(crate) const CIPHERTEXT_SIZE_DELTA: usize = SIZE_LEN + NONCE_LEN + TAG_LEN;

fn select_key(key_bytes: &[u8]) -> Result<LessSafeKey> {
    let algorithm = match key_bytes.len() {
        16 => &AES_128_GCM,
        32 => &AES_256_GCM,
        len => {
            return Err(General(format!(
                "Invalid AES key length {len}, the supported lengths are 16 and 32 bytes"
            )));
        }
    };
    let key = UnboundKey::new(algorithm, key_bytes)
        .map_err(|_| General("Failed to create AES key".to_string()))?;
    Ok(LessSafeKey::new(key))
}

/// Encrypts Parquet modules, producing `[len:u32 LE][nonce][ciphertext][tag]`.
pub(crate) trait BlockEncryptor: Debug + Send + Sync {
    fn encrypt(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
}

/// Decrypts Parquet modules framed as `[len:u32 LE][nonce][ciphertext][tag]`.
pub(crate) trait BlockDecryptor: Debug + Send + Sync {
    fn decrypt(&self, length_and_ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Recomputes the authentication tag over `plaintext_footer`, whose trailing 28
    /// bytes are the stored nonce and tag of the footer signature.
    fn compute_plaintext_tag(&self, aad: &[u8], plaintext_footer: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub(crate) struct RingGcmBlockEncryptor {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl RingGcmBlockEncryptor {
    pub(crate) fn new(key_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            key: select_key(key_bytes)?,
            rng: SystemRandom::new(),
        })
    }
}

impl BlockEncryptor for RingGcmBlockEncryptor {
    fn encrypt(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let ciphertext_len = NONCE_LEN + plaintext.len() + TAG_LEN;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce_bytes)?;

        let mut result = Vec::with_capacity(SIZE_LEN + ciphertext_len);
        result.extend_from_slice(&(ciphertext_len as u32).to_le_bytes());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(plaintext);

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);
        let tag = self.key.seal_in_place_separate_tag(
            nonce,
            Aad::from(aad),
            &mut result[SIZE_LEN + NONCE_LEN..],
        )?;
        result.extend_from_slice(tag.as_ref());

        Ok(result)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RingGcmBlockDecryptor {
    key: LessSafeKey,
}

impl RingGcmBlockDecryptor {
    pub(crate) fn new(key_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            key: select_key(key_bytes)?,
        })
    }
}

impl BlockDecryptor for RingGcmBlockDecryptor {
    fn decrypt(&self, length_and_ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if length_and_ciphertext.len() < CIPHERTEXT_SIZE_DELTA {
            return Err(General("Ciphertext shorter than nonce and tag".to_string()));
        }
        let mut result =
            Vec::with_capacity(length_and_ciphertext.len() - SIZE_LEN - NONCE_LEN);
        result.extend_from_slice(&length_and_ciphertext[SIZE_LEN + NONCE_LEN..]);

        let nonce = Nonce::try_assume_unique_for_key(
            &length_and_ciphertext[SIZE_LEN..SIZE_LEN + NONCE_LEN],
        )?;

        self.key.open_in_place(nonce, Aad::from(aad), &mut result)?;

        // Truncate result to remove the tag
        result.resize(result.len() - TAG_LEN, 0u8);
        Ok(result)
    }

    fn compute_plaintext_tag(&self, aad: &[u8], plaintext_footer: &[u8]) -> Result<Vec<u8>> {
        if plaintext_footer.len() < NONCE_LEN + TAG_LEN {
            return Err(General("Footer shorter than nonce and tag".to_string()));
        }
        let tag_start = plaintext_footer.len() - TAG_LEN;
        let nonce_start = tag_start - NONCE_LEN;
        let nonce = Nonce::try_assume_unique_for_key(&plaintext_footer[nonce_start..tag_start])?;

        let mut buffer = plaintext_footer[..nonce_start].to_vec();
        let tag = self
            .key
            .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut buffer)?;
        Ok(tag.as_ref().to_vec())
    }
}

/// Overwrites key material so it does not linger in memory after release.
pub(crate) fn wipe(buffer: &mut [u8]) {
    for byte in buffer {
        // volatile store so the zeroing is not elided
        unsafe { std::ptr::write_volatile(byte, 0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789012345";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut encryptor = RingGcmBlockEncryptor::new(KEY).unwrap();
        let decryptor = RingGcmBlockDecryptor::new(KEY).unwrap();

        let plaintext = b"hello parquet";
        let aad = b"some aad";
        let ciphertext = encryptor.encrypt(plaintext, aad).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + CIPHERTEXT_SIZE_DELTA);

        let decrypted = decryptor.decrypt(&ciphertext, aad).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_rejects_altered_ciphertext() {
        let mut encryptor = RingGcmBlockEncryptor::new(KEY).unwrap();
        let decryptor = RingGcmBlockDecryptor::new(KEY).unwrap();

        let mut ciphertext = encryptor.encrypt(b"payload", b"aad").unwrap();
        for i in SIZE_LEN..ciphertext.len() {
            ciphertext[i] ^= 1;
            assert!(decryptor.decrypt(&ciphertext, b"aad").is_err());
            ciphertext[i] ^= 1;
        }
    }

    #[test]
    fn test_decrypt_rejects_wrong_aad() {
        let mut encryptor = RingGcmBlockEncryptor::new(KEY).unwrap();
        let decryptor = RingGcmBlockDecryptor::new(KEY).unwrap();

        let ciphertext = encryptor.encrypt(b"payload", b"aad one").unwrap();
        assert!(decryptor.decrypt(&ciphertext, b"aad two").is_err());
    }

    #[test]
    fn test_aes_192_rejected() {
        assert!(RingGcmBlockEncryptor::new(&[0u8; 24]).is_err());
        assert!(RingGcmBlockDecryptor::new(&[0u8; 24]).is_err());
    }

    #[test]
    fn test_aes_256_supported() {
        let mut encryptor = RingGcmBlockEncryptor::new(&[7u8; 32]).unwrap();
        let decryptor = RingGcmBlockDecryptor::new(&[7u8; 32]).unwrap();
        let ciphertext = encryptor.encrypt(b"x", b"a").unwrap();
        assert_eq!(decryptor.decrypt(&ciphertext, b"a").unwrap(), b"x");
    }
}

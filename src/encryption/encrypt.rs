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

//! Configuration and utilities for writing encrypted Parquet files.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};

use crate::encryption::ciphers::{
    BlockEncryptor, NONCE_LEN, RingGcmBlockEncryptor, SIZE_LEN, TAG_LEN, wipe,
};
use crate::errors::{ParquetError, Result};
use crate::thrift::{ThriftCompactOutputProtocol, WriteThrift};

/// An encryption key together with its optional retrieval metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionKey {
    key: Vec<u8>,
    key_metadata: Option<Vec<u8>>,
}

impl EncryptionKey {
    /// Creates a key with no metadata.
    pub fn new(key: Vec<u8>) -> EncryptionKey {
        Self {
            key,
            key_metadata: None,
        }
    }

    /// Attaches retrieval metadata, e.g. a key identifier for a key management
    /// service.
    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.key_metadata = Some(metadata);
        self
    }

    /// The raw key bytes.
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    /// The key retrieval metadata, if any.
    pub(crate) fn key_metadata(&self) -> Option<&Vec<u8>> {
        self.key_metadata.as_ref()
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        wipe(&mut self.key);
    }
}

/// Configures how a file is encrypted: the footer key, optional per-column keys, the
/// AAD prefix, and whether the footer itself is encrypted or merely signed.
///
/// If no column keys are configured, uniform encryption is used: every column is
/// encrypted with the footer key. If column keys are configured, only those columns
/// are encrypted, and any others are written as plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEncryptionProperties {
    encrypt_footer: bool,
    footer_key: EncryptionKey,
    column_keys: HashMap<String, EncryptionKey>,
    aad_prefix: Option<Vec<u8>>,
    store_aad_prefix: bool,
}

impl FileEncryptionProperties {
    /// Returns a new builder using `footer_key` to encrypt (or sign) footer metadata.
    pub fn builder(footer_key: Vec<u8>) -> EncryptionPropertiesBuilder {
        EncryptionPropertiesBuilder::new(footer_key)
    }

    /// Returns true if the footer is written encrypted, false when the footer stays
    /// plaintext and is only signed.
    pub fn encrypt_footer(&self) -> bool {
        self.encrypt_footer
    }

    /// Retrieval metadata of the key used for encryption of footer metadata.
    pub fn footer_key_metadata(&self) -> Option<&Vec<u8>> {
        self.footer_key.key_metadata()
    }

    /// The footer encryption/signing key.
    pub(crate) fn footer_key(&self) -> &EncryptionKey {
        &self.footer_key
    }

    /// The encryption key for a column, if one was configured.
    pub(crate) fn column_key(&self, column_path: &str) -> Option<&EncryptionKey> {
        self.column_keys.get(column_path)
    }

    /// True when per-column keys are configured.
    pub(crate) fn has_column_keys(&self) -> bool {
        !self.column_keys.is_empty()
    }

    /// The AAD prefix that binds ciphertext to this particular file, if set.
    pub fn aad_prefix(&self) -> Option<&Vec<u8>> {
        self.aad_prefix.as_ref()
    }

    /// True if the AAD prefix is stored in the file metadata; readers of files
    /// written without storage must supply the prefix themselves.
    pub fn store_aad_prefix(&self) -> bool {
        self.store_aad_prefix && self.aad_prefix.is_some()
    }
}

/// Builder for [`FileEncryptionProperties`].
pub struct EncryptionPropertiesBuilder {
    footer_key: EncryptionKey,
    column_keys: HashMap<String, EncryptionKey>,
    aad_prefix: Option<Vec<u8>>,
    encrypt_footer: bool,
    store_aad_prefix: bool,
}

impl EncryptionPropertiesBuilder {
    /// Creates a new builder with an encrypted footer and no column keys.
    pub fn new(footer_key: Vec<u8>) -> EncryptionPropertiesBuilder {
        Self {
            footer_key: EncryptionKey::new(footer_key),
            column_keys: HashMap::default(),
            aad_prefix: None,
            encrypt_footer: true,
            store_aad_prefix: true,
        }
    }

    /// Keep the footer plaintext and sign it with the footer key instead of
    /// encrypting it. Readers without keys can still read metadata of unencrypted
    /// columns in such files.
    pub fn with_plaintext_footer(mut self, plaintext_footer: bool) -> Self {
        self.encrypt_footer = !plaintext_footer;
        self
    }

    /// Sets retrieval metadata for the footer key.
    pub fn with_footer_key_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.footer_key = self.footer_key.with_metadata(metadata);
        self
    }

    /// Sets the key used to encrypt the column with the given full path. Columns
    /// without a key are written as plaintext.
    pub fn with_column_key(mut self, column_path: &str, key: Vec<u8>) -> Self {
        self.column_keys
            .insert(column_path.to_string(), EncryptionKey::new(key));
        self
    }

    /// Sets the key and its retrieval metadata for the column with the given full
    /// path.
    pub fn with_column_key_and_metadata(
        mut self,
        column_path: &str,
        key: Vec<u8>,
        metadata: Vec<u8>,
    ) -> Self {
        self.column_keys.insert(
            column_path.to_string(),
            EncryptionKey::new(key).with_metadata(metadata),
        );
        self
    }

    /// Sets the AAD prefix. The prefix protects against swapping whole files between
    /// contexts; readers must know it to decrypt.
    pub fn with_aad_prefix(mut self, aad_prefix: Vec<u8>) -> Self {
        self.aad_prefix = Some(aad_prefix);
        self
    }

    /// Controls whether the AAD prefix is stored in the file. When disabled, readers
    /// must supply the prefix out of band.
    pub fn with_aad_prefix_storage(mut self, store_aad_prefix: bool) -> Self {
        self.store_aad_prefix = store_aad_prefix;
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<FileEncryptionProperties> {
        Ok(FileEncryptionProperties {
            encrypt_footer: self.encrypt_footer,
            footer_key: self.footer_key,
            column_keys: self.column_keys,
            aad_prefix: self.aad_prefix,
            store_aad_prefix: self.store_aad_prefix,
        })
    }
}

/// Performs the encryption operations for a single file being written: holds the
/// properties, the unique file AAD suffix, and hands out per-module block
/// encryptors.
#[derive(Debug)]
pub(crate) struct FileEncryptor {
    properties: Arc<FileEncryptionProperties>,
    aad_file_unique: Vec<u8>,
    file_aad: Vec<u8>,
}

impl FileEncryptor {
    pub(crate) fn new(properties: Arc<FileEncryptionProperties>) -> Result<Self> {
        // Generate unique AAD for file
        let rng = SystemRandom::new();
        let mut aad_file_unique = vec![0u8; 8];
        rng.fill(&mut aad_file_unique)?;

        let file_aad = match properties.aad_prefix.as_ref() {
            None => aad_file_unique.clone(),
            Some(aad_prefix) => [aad_prefix.as_slice(), aad_file_unique.as_slice()].concat(),
        };

        Ok(Self {
            properties,
            aad_file_unique,
            file_aad,
        })
    }

    /// The properties the file is being written with.
    pub(crate) fn properties(&self) -> &Arc<FileEncryptionProperties> {
        &self.properties
    }

    /// Combined AAD prefix and unique file suffix.
    pub(crate) fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// The random per-file AAD suffix.
    pub(crate) fn aad_file_unique(&self) -> &Vec<u8> {
        &self.aad_file_unique
    }

    /// Returns whether the column with the given path is encrypted.
    pub(crate) fn is_column_encrypted(&self, column_path: &str) -> bool {
        if self.properties.column_keys.is_empty() {
            // uniform encryption
            true
        } else {
            self.properties.column_keys.contains_key(column_path)
        }
    }

    /// Returns the encryptor for the footer and, under uniform encryption, column
    /// modules.
    pub(crate) fn get_footer_encryptor(&self) -> Result<Box<dyn BlockEncryptor>> {
        Ok(Box::new(RingGcmBlockEncryptor::new(
            self.properties.footer_key.key(),
        )?))
    }

    /// Returns the encryptor for a column's pages and metadata.
    pub(crate) fn get_column_encryptor(&self, column_path: &str) -> Result<Box<dyn BlockEncryptor>> {
        if self.properties.column_keys.is_empty() {
            return self.get_footer_encryptor();
        }
        match self.properties.column_keys.get(column_path) {
            None => Err(general_err!(
                "Column '{}' is not encrypted",
                column_path
            )),
            Some(column_key) => Ok(Box::new(RingGcmBlockEncryptor::new(column_key.key())?)),
        }
    }
}

/// Thrift-serializes `object` and writes the encrypted result to `sink`.
pub(crate) fn encrypt_object<T: WriteThrift, W: Write>(
    object: &T,
    encryptor: &mut Box<dyn BlockEncryptor>,
    sink: &mut W,
    module_aad: &[u8],
) -> Result<()> {
    let encrypted_buffer = encrypt_object_to_vec(object, encryptor, module_aad)?;
    sink.write_all(&encrypted_buffer)?;
    Ok(())
}

/// Thrift-serializes `object` and returns the encrypted result.
pub(crate) fn encrypt_object_to_vec<T: WriteThrift>(
    object: &T,
    encryptor: &mut Box<dyn BlockEncryptor>,
    module_aad: &[u8],
) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![];
    {
        let mut protocol = ThriftCompactOutputProtocol::new(&mut buffer);
        object.write_thrift(&mut protocol)?;
    }

    encryptor.encrypt(buffer.as_ref(), module_aad)
}

/// Thrift-serializes `object` as plaintext followed by a 28-byte signature: the nonce
/// and GCM tag computed over the serialized bytes.
pub(crate) fn write_signed_plaintext_object<T: WriteThrift, W: Write>(
    object: &T,
    encryptor: &mut Box<dyn BlockEncryptor>,
    sink: &mut W,
    module_aad: &[u8],
) -> Result<()> {
    let mut buffer: Vec<u8> = vec![];
    {
        let mut protocol = ThriftCompactOutputProtocol::new(&mut buffer);
        object.write_thrift(&mut protocol)?;
    }
    sink.write_all(&buffer)?;

    // Use the footer encryptor to compute the signature
    let encrypted_buffer = encryptor.encrypt(&buffer, module_aad)?;

    // The signature is the nonce and the authentication tag of the ciphertext
    let nonce = &encrypted_buffer[SIZE_LEN..SIZE_LEN + NONCE_LEN];
    let tag = &encrypted_buffer[encrypted_buffer.len() - TAG_LEN..];
    sink.write_all(nonce)?;
    sink.write_all(tag)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_encryption_covers_all_columns() {
        let props = Arc::new(
            FileEncryptionProperties::builder(b"0123456789012345".to_vec())
                .build()
                .unwrap(),
        );
        let encryptor = FileEncryptor::new(props).unwrap();
        assert!(encryptor.is_column_encrypted("a"));
        assert!(encryptor.is_column_encrypted("b.c"));
    }

    #[test]
    fn test_column_keys_select_columns() {
        let props = Arc::new(
            FileEncryptionProperties::builder(b"0123456789012345".to_vec())
                .with_column_key("x", b"1234567890123450".to_vec())
                .build()
                .unwrap(),
        );
        let encryptor = FileEncryptor::new(props).unwrap();
        assert!(encryptor.is_column_encrypted("x"));
        assert!(!encryptor.is_column_encrypted("y"));
        assert!(encryptor.get_column_encryptor("x").is_ok());
        assert!(encryptor.get_column_encryptor("y").is_err());
    }

    #[test]
    fn test_file_aad_includes_prefix() {
        let props = Arc::new(
            FileEncryptionProperties::builder(b"0123456789012345".to_vec())
                .with_aad_prefix(b"prefix".to_vec())
                .build()
                .unwrap(),
        );
        let encryptor = FileEncryptor::new(props).unwrap();
        assert!(encryptor.file_aad().starts_with(b"prefix"));
        assert_eq!(encryptor.file_aad().len(), 6 + 8);
        assert_eq!(encryptor.aad_file_unique().len(), 8);
    }

    #[test]
    fn test_plaintext_footer_flag() {
        let props = FileEncryptionProperties::builder(b"0123456789012345".to_vec())
            .with_plaintext_footer(true)
            .build()
            .unwrap();
        assert!(!props.encrypt_footer());
    }
}

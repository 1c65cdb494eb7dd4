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

//! Configuration and utilities for decryption of files using Parquet modular
//! encryption.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Formatter;
use std::io::Read;
use std::sync::Arc;

use crate::encryption::ciphers::{BlockDecryptor, RingGcmBlockDecryptor, wipe};
use crate::encryption::modules::{ModuleType, create_footer_signing_aad, create_module_aad};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::ColumnCryptoMetaData;

/// Trait for retrieving an encryption key using the key's metadata.
///
/// Implementations map the opaque `key_metadata` bytes stored in the file (for
/// example a key identifier, or a wrapped key that must be unwrapped by a key
/// management service) back to the raw key bytes.
pub trait KeyRetriever: Send + Sync {
    /// Retrieve a decryption key given the key metadata.
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>>;
}

/// Callback invoked with the AAD prefix found in a file, letting callers verify that
/// the file is the one they expect before any data is decrypted.
pub trait AadPrefixVerifier: Send + Sync {
    /// Verify the AAD prefix read from a file. Return an error to abort the read.
    fn verify(&self, aad_prefix: &[u8]) -> Result<()>;
}

pub(crate) fn read_and_decrypt<T: Read>(
    decryptor: &Arc<dyn BlockDecryptor>,
    input: &mut T,
    aad: &[u8],
) -> Result<Vec<u8>> {
    let mut len_bytes = [0; 4];
    input.read_exact(&mut len_bytes)?;
    let ciphertext_len = u32::from_le_bytes(len_bytes) as usize;
    let mut ciphertext = vec![0; 4 + ciphertext_len];
    ciphertext[0..4].copy_from_slice(&len_bytes);
    input.read_exact(&mut ciphertext[4..])?;

    decryptor.decrypt(&ciphertext, aad.as_ref())
}

/// Holds the context required to decrypt the modules of one column chunk: the
/// decryptors, the file AAD and the chunk's position in the file.
#[derive(Debug, Clone)]
pub(crate) struct CryptoContext {
    pub(crate) row_group_ordinal: usize,
    pub(crate) column_ordinal: usize,
    pub(crate) page_ordinal: Option<usize>,
    pub(crate) dictionary_page: bool,
    data_decryptor: Arc<dyn BlockDecryptor>,
    metadata_decryptor: Arc<dyn BlockDecryptor>,
    file_aad: Vec<u8>,
}

impl CryptoContext {
    /// Creates the context for one column chunk, routing to the footer key or the
    /// column key according to the chunk's crypto metadata.
    pub(crate) fn for_column(
        file_decryptor: &FileDecryptor,
        column_crypto_metadata: &ColumnCryptoMetaData,
        row_group_ordinal: usize,
        column_ordinal: usize,
    ) -> Result<Self> {
        let (data_decryptor, metadata_decryptor) = match column_crypto_metadata {
            ColumnCryptoMetaData::EncryptionWithFooterKey => {
                let data_decryptor = file_decryptor.get_footer_decryptor()?;
                let metadata_decryptor = file_decryptor.get_footer_decryptor()?;
                (data_decryptor, metadata_decryptor)
            }
            ColumnCryptoMetaData::EncryptionWithColumnKey(column_key_encryption) => {
                let key_metadata = &column_key_encryption.key_metadata;
                let full_column_name;
                let column_name = if column_key_encryption.path_in_schema.len() == 1 {
                    &column_key_encryption.path_in_schema[0]
                } else {
                    full_column_name = column_key_encryption.path_in_schema.join(".");
                    &full_column_name
                };
                let data_decryptor =
                    file_decryptor.get_column_data_decryptor(column_name, key_metadata.as_deref())?;
                let metadata_decryptor = file_decryptor
                    .get_column_metadata_decryptor(column_name, key_metadata.as_deref())?;
                (data_decryptor, metadata_decryptor)
            }
        };

        Ok(CryptoContext {
            row_group_ordinal,
            column_ordinal,
            page_ordinal: None,
            dictionary_page: false,
            data_decryptor,
            metadata_decryptor,
            file_aad: file_decryptor.file_aad().clone(),
        })
    }

    pub(crate) fn with_page_ordinal(&self, page_ordinal: usize) -> Self {
        Self {
            page_ordinal: Some(page_ordinal),
            dictionary_page: false,
            ..self.clone()
        }
    }

    pub(crate) fn for_dictionary_page(&self) -> Self {
        Self {
            dictionary_page: true,
            ..self.clone()
        }
    }

    pub(crate) fn create_page_header_aad(&self) -> Result<Vec<u8>> {
        let module_type = if self.dictionary_page {
            ModuleType::DictionaryPageHeader
        } else {
            ModuleType::DataPageHeader
        };

        create_module_aad(
            self.file_aad(),
            module_type,
            self.row_group_ordinal,
            self.column_ordinal,
            self.page_ordinal,
        )
    }

    pub(crate) fn create_page_aad(&self) -> Result<Vec<u8>> {
        let module_type = if self.dictionary_page {
            ModuleType::DictionaryPage
        } else {
            ModuleType::DataPage
        };

        create_module_aad(
            self.file_aad(),
            module_type,
            self.row_group_ordinal,
            self.column_ordinal,
            self.page_ordinal,
        )
    }

    pub(crate) fn data_decryptor(&self) -> &Arc<dyn BlockDecryptor> {
        &self.data_decryptor
    }

    pub(crate) fn metadata_decryptor(&self) -> &Arc<dyn BlockDecryptor> {
        &self.metadata_decryptor
    }

    pub(crate) fn file_aad(&self) -> &Vec<u8> {
        &self.file_aad
    }
}

#[derive(Clone, PartialEq)]
struct ExplicitDecryptionKeys {
    footer_key: Vec<u8>,
    column_keys: HashMap<String, Vec<u8>>,
}

impl Drop for ExplicitDecryptionKeys {
    fn drop(&mut self) {
        wipe(&mut self.footer_key);
        for key in self.column_keys.values_mut() {
            wipe(key);
        }
    }
}

#[derive(Clone)]
enum DecryptionKeys {
    Explicit(ExplicitDecryptionKeys),
    ViaRetriever(Arc<dyn KeyRetriever>),
}

impl PartialEq for DecryptionKeys {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DecryptionKeys::Explicit(keys), DecryptionKeys::Explicit(other_keys)) => {
                keys.footer_key == other_keys.footer_key
                    && keys.column_keys == other_keys.column_keys
            }
            (DecryptionKeys::ViaRetriever(_), DecryptionKeys::ViaRetriever(_)) => true,
            _ => false,
        }
    }
}

/// `FileDecryptionProperties` hold keys and AAD data required to decrypt a Parquet
/// file.
///
/// # Examples
///
/// Create `FileDecryptionProperties` for a file encrypted with uniform encryption,
/// where all metadata and data are encrypted with the footer key:
/// ```
/// # use parq::encryption::decrypt::FileDecryptionProperties;
/// let decryption_properties = FileDecryptionProperties::builder(b"0123456789012345".into())
///     .build()?;
/// # Ok::<(), parq::errors::ParquetError>(())
/// ```
///
/// Create properties for a file where columns are encrypted with different keys:
/// ```
/// # use parq::encryption::decrypt::FileDecryptionProperties;
/// let decryption_properties = FileDecryptionProperties::builder(b"0123456789012345".into())
///     .with_column_key("x", b"1234567890123450".into())
///     .with_column_key("y", b"1234567890123451".into())
///     .build()?;
/// # Ok::<(), parq::errors::ParquetError>(())
/// ```
#[derive(Clone)]
pub struct FileDecryptionProperties {
    keys: DecryptionKeys,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    plaintext_files_allowed: bool,
    footer_signature_verification: bool,
}

impl PartialEq for FileDecryptionProperties {
    fn eq(&self, other: &Self) -> bool {
        // the verifier callback is not comparable
        self.keys == other.keys
            && self.aad_prefix == other.aad_prefix
            && self.plaintext_files_allowed == other.plaintext_files_allowed
            && self.footer_signature_verification == other.footer_signature_verification
    }
}

impl FileDecryptionProperties {
    /// Returns a new [`FileDecryptionProperties`] builder that will use the provided
    /// key to decrypt footer metadata.
    pub fn builder(footer_key: Vec<u8>) -> DecryptionPropertiesBuilder {
        DecryptionPropertiesBuilder::new(footer_key)
    }

    /// Returns a new [`FileDecryptionProperties`] builder that uses a
    /// [`KeyRetriever`] to get decryption keys based on key metadata.
    pub fn with_key_retriever(
        key_retriever: Arc<dyn KeyRetriever>,
    ) -> DecryptionPropertiesBuilderWithRetriever {
        DecryptionPropertiesBuilderWithRetriever::new(key_retriever)
    }

    /// AAD prefix string uniquely identifies the file and prevents file swapping.
    pub fn aad_prefix(&self) -> Option<&Vec<u8>> {
        self.aad_prefix.as_ref()
    }

    /// Verifier to be called with the AAD prefix resolved from the file, if any.
    pub(crate) fn aad_prefix_verifier(&self) -> Option<&Arc<dyn AadPrefixVerifier>> {
        self.aad_prefix_verifier.as_ref()
    }

    /// Returns true if reading plaintext files is allowed with these properties.
    /// Disallowed by default, so that a swapped-in unencrypted file is rejected.
    pub fn plaintext_files_allowed(&self) -> bool {
        self.plaintext_files_allowed
    }

    /// Returns true if footer signature verification is enabled for files with
    /// plaintext footers.
    pub fn check_plaintext_footer_integrity(&self) -> bool {
        self.footer_signature_verification
    }

    /// Get the encryption key for decrypting a file's footer, and also column data if
    /// uniform encryption is used.
    pub(crate) fn footer_key(&self, key_metadata: Option<&[u8]>) -> Result<Cow<'_, Vec<u8>>> {
        match &self.keys {
            DecryptionKeys::Explicit(keys) => Ok(Cow::Borrowed(&keys.footer_key)),
            DecryptionKeys::ViaRetriever(retriever) => {
                let key = retriever.retrieve_key(key_metadata.unwrap_or_default())?;
                Ok(Cow::Owned(key))
            }
        }
    }

    /// Get the column-specific encryption key for decrypting column data and metadata
    /// within a file.
    pub(crate) fn column_key(
        &self,
        column_name: &str,
        key_metadata: Option<&[u8]>,
    ) -> Result<Cow<'_, Vec<u8>>> {
        match &self.keys {
            DecryptionKeys::Explicit(keys) => match keys.column_keys.get(column_name) {
                None => Err(general_err!(
                    "No column decryption key set for encrypted column '{}'",
                    column_name
                )),
                Some(key) => Ok(Cow::Borrowed(key)),
            },
            DecryptionKeys::ViaRetriever(retriever) => {
                let key = retriever.retrieve_key(key_metadata.unwrap_or_default())?;
                Ok(Cow::Owned(key))
            }
        }
    }
}

impl std::fmt::Debug for FileDecryptionProperties {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileDecryptionProperties {{ }}")
    }
}

/// Builder for [`FileDecryptionProperties`] with explicit keys.
pub struct DecryptionPropertiesBuilder {
    footer_key: Vec<u8>,
    column_keys: HashMap<String, Vec<u8>>,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    plaintext_files_allowed: bool,
    footer_signature_verification: bool,
}

impl DecryptionPropertiesBuilder {
    /// Create a new builder that will use the provided key to decrypt footer
    /// metadata.
    pub fn new(footer_key: Vec<u8>) -> DecryptionPropertiesBuilder {
        Self {
            footer_key,
            column_keys: HashMap::default(),
            aad_prefix: None,
            aad_prefix_verifier: None,
            plaintext_files_allowed: false,
            footer_signature_verification: true,
        }
    }

    /// Finalize the builder and return created [`FileDecryptionProperties`].
    pub fn build(self) -> Result<Arc<FileDecryptionProperties>> {
        let keys = DecryptionKeys::Explicit(ExplicitDecryptionKeys {
            footer_key: self.footer_key,
            column_keys: self.column_keys,
        });
        Ok(Arc::new(FileDecryptionProperties {
            keys,
            aad_prefix: self.aad_prefix,
            aad_prefix_verifier: self.aad_prefix_verifier,
            plaintext_files_allowed: self.plaintext_files_allowed,
            footer_signature_verification: self.footer_signature_verification,
        }))
    }

    /// Specify the expected AAD prefix to be used for decryption.
    /// This must be set if the file was written with an AAD prefix and the prefix is
    /// not stored in the file metadata.
    pub fn with_aad_prefix(mut self, value: Vec<u8>) -> Self {
        self.aad_prefix = Some(value);
        self
    }

    /// Specify a verifier invoked with the AAD prefix found in the file.
    pub fn with_aad_prefix_verifier(mut self, verifier: Arc<dyn AadPrefixVerifier>) -> Self {
        self.aad_prefix_verifier = Some(verifier);
        self
    }

    /// Specify the decryption key to use for a column.
    pub fn with_column_key(mut self, column_name: &str, decryption_key: Vec<u8>) -> Self {
        self.column_keys
            .insert(column_name.to_string(), decryption_key);
        self
    }

    /// Allow reading files that are not encrypted at all with these properties.
    pub fn with_plaintext_files_allowed(mut self) -> Self {
        self.plaintext_files_allowed = true;
        self
    }

    /// Disable verification of footer signatures for files that use plaintext
    /// footers. Signature verification is enabled by default.
    pub fn disable_footer_signature_verification(mut self) -> Self {
        self.footer_signature_verification = false;
        self
    }
}

/// Builder for [`FileDecryptionProperties`] that uses a [`KeyRetriever`].
pub struct DecryptionPropertiesBuilderWithRetriever {
    key_retriever: Arc<dyn KeyRetriever>,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    plaintext_files_allowed: bool,
    footer_signature_verification: bool,
}

impl DecryptionPropertiesBuilderWithRetriever {
    /// Create a new builder by providing a [`KeyRetriever`] that can be used to get
    /// decryption keys based on key metadata.
    pub fn new(key_retriever: Arc<dyn KeyRetriever>) -> DecryptionPropertiesBuilderWithRetriever {
        Self {
            key_retriever,
            aad_prefix: None,
            aad_prefix_verifier: None,
            plaintext_files_allowed: false,
            footer_signature_verification: true,
        }
    }

    /// Finalize the builder and return created [`FileDecryptionProperties`].
    pub fn build(self) -> Result<Arc<FileDecryptionProperties>> {
        let keys = DecryptionKeys::ViaRetriever(self.key_retriever);
        Ok(Arc::new(FileDecryptionProperties {
            keys,
            aad_prefix: self.aad_prefix,
            aad_prefix_verifier: self.aad_prefix_verifier,
            plaintext_files_allowed: self.plaintext_files_allowed,
            footer_signature_verification: self.footer_signature_verification,
        }))
    }

    /// Specify the expected AAD prefix to be used for decryption.
    pub fn with_aad_prefix(mut self, value: Vec<u8>) -> Self {
        self.aad_prefix = Some(value);
        self
    }

    /// Specify a verifier invoked with the AAD prefix found in the file.
    pub fn with_aad_prefix_verifier(mut self, verifier: Arc<dyn AadPrefixVerifier>) -> Self {
        self.aad_prefix_verifier = Some(verifier);
        self
    }

    /// Allow reading files that are not encrypted at all with these properties.
    pub fn with_plaintext_files_allowed(mut self) -> Self {
        self.plaintext_files_allowed = true;
        self
    }

    /// Disable verification of footer signatures for files that use plaintext
    /// footers. Signature verification is enabled by default.
    pub fn disable_footer_signature_verification(mut self) -> Self {
        self.footer_signature_verification = false;
        self
    }
}

/// Performs the decryption operations for a single file being read.
#[derive(Clone, Debug)]
pub(crate) struct FileDecryptor {
    decryption_properties: Arc<FileDecryptionProperties>,
    footer_decryptor: Arc<dyn BlockDecryptor>,
    file_aad: Vec<u8>,
}

impl PartialEq for FileDecryptor {
    fn eq(&self, other: &Self) -> bool {
        self.decryption_properties == other.decryption_properties && self.file_aad == other.file_aad
    }
}

impl FileDecryptor {
    pub(crate) fn new(
        decryption_properties: &Arc<FileDecryptionProperties>,
        footer_key_metadata: Option<&[u8]>,
        aad_file_unique: Vec<u8>,
        aad_prefix: Vec<u8>,
    ) -> Result<Self> {
        let file_aad = [aad_prefix.as_slice(), aad_file_unique.as_slice()].concat();
        let footer_key = decryption_properties.footer_key(footer_key_metadata)?;
        let footer_decryptor = RingGcmBlockDecryptor::new(&footer_key).map_err(|e| {
            general_err!(
                "Invalid footer key. {}",
                e.to_string().replace("Parquet error: ", "")
            )
        })?;

        Ok(Self {
            footer_decryptor: Arc::new(footer_decryptor),
            decryption_properties: Arc::clone(decryption_properties),
            file_aad,
        })
    }

    pub(crate) fn get_footer_decryptor(&self) -> Result<Arc<dyn BlockDecryptor>> {
        Ok(self.footer_decryptor.clone())
    }

    /// Verify the signature trailing a plaintext footer.
    pub(crate) fn verify_plaintext_footer_signature(&self, plaintext_footer: &[u8]) -> Result<()> {
        // Plaintext footer format is: [plaintext metadata, nonce, authentication tag]
        let tag = &plaintext_footer[plaintext_footer.len() - 16..];
        let aad = create_footer_signing_aad(self.file_aad())?;
        let footer_decryptor = self.get_footer_decryptor()?;

        let computed_tag = footer_decryptor.compute_plaintext_tag(&aad, plaintext_footer)?;

        if computed_tag != tag {
            return Err(general_err!(
                "Footer signature verification failed. Computed: {:?}, Expected: {:?}",
                computed_tag,
                tag
            ));
        }
        Ok(())
    }

    pub(crate) fn get_column_data_decryptor(
        &self,
        column_name: &str,
        key_metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn BlockDecryptor>> {
        let column_key = self
            .decryption_properties
            .column_key(column_name, key_metadata)?;
        Ok(Arc::new(RingGcmBlockDecryptor::new(&column_key)?))
    }

    pub(crate) fn get_column_metadata_decryptor(
        &self,
        column_name: &str,
        key_metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn BlockDecryptor>> {
        // In GCM mode data and metadata modules use the same cipher
        self.get_column_data_decryptor(column_name, key_metadata)
    }

    pub(crate) fn file_aad(&self) -> &Vec<u8> {
        &self.file_aad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_properties() {
        let props = FileDecryptionProperties::builder(b"0123456789012345".to_vec())
            .with_column_key("x", b"1234567890123450".to_vec())
            .build()
            .unwrap();
        assert!(!props.plaintext_files_allowed());
        assert!(props.check_plaintext_footer_integrity());
        assert_eq!(
            props.footer_key(None).unwrap().as_slice(),
            b"0123456789012345"
        );
        assert!(props.column_key("x", None).is_ok());
        assert!(props.column_key("missing", None).is_err());
    }

    #[test]
    fn test_key_retriever_lookup() {
        struct FixedRetriever {}
        impl KeyRetriever for FixedRetriever {
            fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>> {
                match key_metadata {
                    b"kf" => Ok(b"0123456789012345".to_vec()),
                    _ => Err(general_err!("unknown key")),
                }
            }
        }

        let props = FileDecryptionProperties::with_key_retriever(Arc::new(FixedRetriever {}))
            .build()
            .unwrap();
        assert_eq!(
            props.footer_key(Some(b"kf")).unwrap().as_slice(),
            b"0123456789012345"
        );
        assert!(props.footer_key(Some(b"other")).is_err());
    }
}

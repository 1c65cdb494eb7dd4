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

//! Parquet metadata API: the in-memory representation of a file footer.
//!
//! * [`ParquetMetaData`]: the combined metadata of one file
//!     * [`FileMetaData`]: file-level metadata such as schema and row count
//!     * [`RowGroupMetaData`]: metadata for each row group, including
//!       [`ColumnChunkMetaData`] for each column chunk
//!
//! The writer assembles these through the corresponding builders; the reader
//! produces them by parsing the serialized footer.

use std::ops::Range;
use std::sync::Arc;

use crate::basic::{ColumnOrder, Compression, Encoding, Type};
use crate::encryption::decrypt::FileDecryptor;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::thrift_codec::EncryptionAlgorithm;
use crate::file::page_encoding_stats::PageEncodingStats;
use crate::file::statistics::Statistics;
use crate::schema::types::{ColumnDescPtr, ColumnPath, SchemaDescPtr, SchemaDescriptor};

pub(crate) mod thrift_codec;

/// Maximum number of padding bytes tolerated when an old writer omitted the
/// dictionary page header from the recorded chunk size.
pub(crate) const MAX_DICT_HEADER_SIZE: u64 = 100;

/// A key-value pair stored in the file metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    /// The key.
    pub key: String,
    /// The optional value.
    pub value: Option<String>,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: String, value: impl Into<Option<String>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Encryption metadata for a column chunk encrypted with a column-specific key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionWithColumnKey {
    /// Path to the column in the Parquet schema.
    pub path_in_schema: Vec<String>,
    /// Retrieval metadata of the column-specific key.
    pub key_metadata: Option<Vec<u8>>,
}

/// `ColumnCryptoMetadata` for a column chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnCryptoMetaData {
    /// The column is encrypted with the footer key.
    EncryptionWithFooterKey,
    /// The column is encrypted with a column-specific key.
    EncryptionWithColumnKey(EncryptionWithColumnKey),
}

/// Global Parquet metadata, including [`FileMetaData`] and [`RowGroupMetaData`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParquetMetaData {
    /// File level metadata.
    pub(crate) file_metadata: FileMetaData,
    /// Row group metadata.
    pub(crate) row_groups: Vec<RowGroupMetaData>,
    /// The decryptor used to read this file, retained to decrypt column chunks.
    pub(crate) file_decryptor: Option<FileDecryptor>,
}

impl ParquetMetaData {
    /// Creates Parquet metadata from file metadata and a list of row group metadata.
    pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
        ParquetMetaData {
            file_metadata,
            row_groups,
            file_decryptor: None,
        }
    }

    /// Adds the file decryptor to the metadata, to be used for decrypting pages.
    pub(crate) fn with_file_decryptor(mut self, file_decryptor: Option<FileDecryptor>) -> Self {
        self.file_decryptor = file_decryptor;
        self
    }

    /// Returns file metadata as reference.
    pub fn file_metadata(&self) -> &FileMetaData {
        &self.file_metadata
    }

    /// Returns number of row groups in this file.
    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    /// Returns row group metadata for the `i`th position.
    /// Position should be less than number of row groups `num_row_groups`.
    pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
        &self.row_groups[i]
    }

    /// Returns slice of row group metadata.
    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }

    /// Returns the file decryptor, if the file was read with decryption.
    pub(crate) fn file_decryptor(&self) -> Option<&FileDecryptor> {
        self.file_decryptor.as_ref()
    }
}

/// File level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Option<Vec<KeyValue>>,
    schema_descr: SchemaDescPtr,
    column_orders: Option<Vec<ColumnOrder>>,
    /// Encryption algorithm from a plaintext footer of an encrypted file.
    pub(crate) encryption_algorithm: Option<EncryptionAlgorithm>,
    /// Retrieval metadata of the key used to sign a plaintext footer.
    pub(crate) footer_signing_key_metadata: Option<Vec<u8>>,
}

impl FileMetaData {
    /// Creates new file metadata.
    pub fn new(
        version: i32,
        num_rows: i64,
        created_by: Option<String>,
        key_value_metadata: Option<Vec<KeyValue>>,
        schema_descr: SchemaDescPtr,
        column_orders: Option<Vec<ColumnOrder>>,
    ) -> Self {
        FileMetaData {
            version,
            num_rows,
            created_by,
            key_value_metadata,
            schema_descr,
            column_orders,
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        }
    }

    /// Returns version of this file.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns number of rows in the file.
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    /// String message for application that wrote this file.
    ///
    /// This should have the following format:
    /// `<application> version <application version> (build <application build hash>)`.
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Returns key_value_metadata of this file.
    pub fn key_value_metadata(&self) -> Option<&Vec<KeyValue>> {
        self.key_value_metadata.as_ref()
    }

    /// Returns the Parquet schema of this file as the root type.
    pub fn schema(&self) -> &crate::schema::types::Type {
        self.schema_descr.root_schema()
    }

    /// Returns a reference to schema descriptor.
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    /// Returns Arc of schema descriptor.
    pub fn schema_descr_ptr(&self) -> SchemaDescPtr {
        self.schema_descr.clone()
    }

    /// Column (sort) order used for `min` and `max` values of each column in this
    /// file.
    ///
    /// Each column order corresponds to one column, determined by its position in the
    /// list, matching the position of the column in the schema.
    ///
    /// When `None` is returned, there are no column orders available, and each column
    /// should be assumed to have an undefined (legacy) column order.
    pub fn column_orders(&self) -> Option<&Vec<ColumnOrder>> {
        self.column_orders.as_ref()
    }

    /// Returns column order for the `i`th column in this file.
    /// If column orders are not available, returns undefined (legacy) column order.
    pub fn column_order(&self, i: usize) -> ColumnOrder {
        self.column_orders
            .as_ref()
            .map(|data| data[i])
            .unwrap_or(ColumnOrder::UNDEFINED)
    }

    /// Returns the version of the application that wrote the file, parsed from
    /// [`Self::created_by`].
    pub fn writer_version(&self) -> ApplicationVersion {
        match self.created_by() {
            Some(created_by) => ApplicationVersion::try_parse(created_by),
            None => ApplicationVersion::unknown(),
        }
    }

    pub(crate) fn with_encryption_algorithm(
        mut self,
        encryption_algorithm: Option<EncryptionAlgorithm>,
    ) -> Self {
        self.encryption_algorithm = encryption_algorithm;
        self
    }

    pub(crate) fn with_footer_signing_key_metadata(
        mut self,
        footer_signing_key_metadata: Option<Vec<u8>>,
    ) -> Self {
        self.footer_signing_key_metadata = footer_signing_key_metadata;
        self
    }
}

/// Reference counted pointer for [`RowGroupMetaData`].
pub type RowGroupMetaDataPtr = Arc<RowGroupMetaData>;

/// Metadata for a row group.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetaData {
    pub(crate) columns: Vec<ColumnChunkMetaData>,
    pub(crate) num_rows: i64,
    pub(crate) total_byte_size: i64,
    pub(crate) schema_descr: SchemaDescPtr,
    pub(crate) file_offset: Option<i64>,
    pub(crate) ordinal: Option<i16>,
}

impl RowGroupMetaData {
    /// Returns builder for row group metadata.
    pub fn builder(schema_descr: SchemaDescPtr) -> RowGroupMetaDataBuilder {
        RowGroupMetaDataBuilder::new(schema_descr)
    }

    /// Number of columns in this row group.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns column chunk metadata for `i`th column.
    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    /// Returns slice of column chunk metadata.
    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    /// Number of rows in this row group.
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    /// Total byte size of all uncompressed column data in this row group.
    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    /// Total size of all compressed column data in this row group.
    pub fn compressed_size(&self) -> i64 {
        self.columns.iter().map(|c| c.total_compressed_size).sum()
    }

    /// Returns reference to a schema descriptor.
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        self.schema_descr.as_ref()
    }

    /// Returns reference counted clone of schema descriptor.
    pub fn schema_descr_ptr(&self) -> SchemaDescPtr {
        self.schema_descr.clone()
    }

    /// Returns the offset to the first byte of this row group in the file, which is
    /// the offset of the first page of its first column chunk.
    pub fn file_offset(&self) -> Option<i64> {
        self.file_offset
    }

    /// Returns the ordinal (0-based position) of this row group in the file.
    pub fn ordinal(&self) -> Option<i16> {
        self.ordinal
    }
}

/// Builder for [`RowGroupMetaData`].
pub struct RowGroupMetaDataBuilder(RowGroupMetaData);

impl RowGroupMetaDataBuilder {
    /// Creates new builder from schema descriptor.
    pub(crate) fn new(schema_descr: SchemaDescPtr) -> Self {
        Self(RowGroupMetaData {
            columns: Vec::with_capacity(schema_descr.num_columns()),
            schema_descr,
            file_offset: None,
            num_rows: 0,
            total_byte_size: 0,
            ordinal: None,
        })
    }

    /// Sets number of rows in this row group.
    pub fn set_num_rows(mut self, value: i64) -> Self {
        self.0.num_rows = value;
        self
    }

    /// Sets total size in bytes for this row group.
    pub fn set_total_byte_size(mut self, value: i64) -> Self {
        self.0.total_byte_size = value;
        self
    }

    /// Sets column metadata for this row group.
    pub fn set_column_metadata(mut self, value: Vec<ColumnChunkMetaData>) -> Self {
        self.0.columns = value;
        self
    }

    /// Sets the file offset of the first page of this row group.
    pub fn set_file_offset(mut self, value: i64) -> Self {
        self.0.file_offset = Some(value);
        self
    }

    /// Sets ordinal for this row group.
    pub fn set_ordinal(mut self, value: i16) -> Self {
        self.0.ordinal = Some(value);
        self
    }

    /// Builds row group metadata.
    pub fn build(self) -> Result<RowGroupMetaData> {
        if self.0.schema_descr.num_columns() != self.0.columns.len() {
            return Err(general_err!(
                "Column length mismatch: {} != {}",
                self.0.schema_descr.num_columns(),
                self.0.columns.len()
            ));
        }

        Ok(self.0)
    }

    /// Builds row group metadata without validating column counts, used while
    /// incrementally populating a row group during footer parsing.
    pub(crate) fn build_unchecked(self) -> RowGroupMetaData {
        self.0
    }
}

/// Metadata for a column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetaData {
    pub(crate) column_descr: ColumnDescPtr,
    pub(crate) encodings: Vec<Encoding>,
    pub(crate) file_path: Option<String>,
    pub(crate) file_offset: i64,
    pub(crate) num_values: i64,
    pub(crate) compression: Compression,
    pub(crate) total_compressed_size: i64,
    pub(crate) total_uncompressed_size: i64,
    pub(crate) data_page_offset: i64,
    pub(crate) index_page_offset: Option<i64>,
    pub(crate) dictionary_page_offset: Option<i64>,
    pub(crate) statistics: Option<Statistics>,
    pub(crate) encoding_stats: Option<Vec<PageEncodingStats>>,
    pub(crate) column_crypto_metadata: Option<ColumnCryptoMetaData>,
    pub(crate) encrypted_column_metadata: Option<Vec<u8>>,
    /// When true the footer is plaintext and the serialized `ColumnMetaData` keeps a
    /// redacted copy for legacy readers even though an encrypted copy exists.
    pub(crate) plaintext_footer_mode: bool,
}

impl ColumnChunkMetaData {
    /// Returns builder for column chunk metadata.
    pub fn builder(column_descr: ColumnDescPtr) -> ColumnChunkMetaDataBuilder {
        ColumnChunkMetaDataBuilder::new(column_descr)
    }

    /// File where the column chunk is stored.
    ///
    /// If not set, assumed to belong to the same file as the metadata.
    /// This path is relative to the current file.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    /// Byte offset of `ColumnMetaData` in `file_path()`.
    pub fn file_offset(&self) -> i64 {
        self.file_offset
    }

    /// Type of this column. Must be primitive.
    pub fn column_type(&self) -> Type {
        self.column_descr.physical_type()
    }

    /// Path (or identifier) of this column.
    pub fn column_path(&self) -> &ColumnPath {
        self.column_descr.path()
    }

    /// Descriptor for this column.
    pub fn column_descr(&self) -> &ColumnDescPtr {
        &self.column_descr
    }

    /// All encodings used for this column.
    pub fn encodings(&self) -> &Vec<Encoding> {
        &self.encodings
    }

    /// Total number of values in this column chunk.
    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    /// Compression for this column.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the total compressed data size of this column chunk.
    pub fn compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    /// Returns the total uncompressed data size of this column chunk.
    pub fn uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    /// Returns the offset for the column data.
    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    /// Returns the offset for the index page.
    pub fn index_page_offset(&self) -> Option<i64> {
        self.index_page_offset
    }

    /// Returns the offset for the dictionary page, if any.
    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    /// Returns `true` if this column chunk contains a dictionary page.
    pub fn has_dictionary_page(&self) -> bool {
        self.dictionary_page_offset.is_some()
    }

    /// Returns the offset and length in bytes of the column chunk within the file.
    pub fn byte_range(&self) -> Range<u64> {
        // No positivity guard on the dictionary offset: `Some` is only produced for a
        // dictionary page actually written, whose offset in a valid file is past the
        // leading magic.
        let col_start = match self.dictionary_page_offset() {
            Some(dictionary_page_offset) if dictionary_page_offset < self.data_page_offset => {
                dictionary_page_offset
            }
            _ => self.data_page_offset(),
        };
        let col_len = self.compressed_size();
        assert!(
            col_start >= 0 && col_len >= 0,
            "column start and length should not be negative"
        );
        col_start as u64..col_start as u64 + col_len as u64
    }

    /// Returns statistics that are set for this column chunk, if any.
    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    /// Returns the number of pages written per page type and encoding, if recorded.
    pub fn page_encoding_stats(&self) -> Option<&Vec<PageEncodingStats>> {
        self.encoding_stats.as_ref()
    }

    /// Returns the encryption metadata for this column chunk, if it is encrypted.
    pub fn crypto_metadata(&self) -> Option<&ColumnCryptoMetaData> {
        self.column_crypto_metadata.as_ref()
    }
}

/// Builder for [`ColumnChunkMetaData`].
pub struct ColumnChunkMetaDataBuilder(ColumnChunkMetaData);

impl ColumnChunkMetaDataBuilder {
    /// Creates new column chunk metadata builder.
    pub(crate) fn new(column_descr: ColumnDescPtr) -> Self {
        Self(ColumnChunkMetaData {
            column_descr,
            encodings: Vec::new(),
            file_path: None,
            file_offset: 0,
            num_values: 0,
            compression: Compression::UNCOMPRESSED,
            total_compressed_size: 0,
            total_uncompressed_size: 0,
            data_page_offset: 0,
            index_page_offset: None,
            dictionary_page_offset: None,
            statistics: None,
            encoding_stats: None,
            column_crypto_metadata: None,
            encrypted_column_metadata: None,
            plaintext_footer_mode: false,
        })
    }

    /// Sets list of encodings for this column chunk.
    pub fn set_encodings(mut self, encodings: Vec<Encoding>) -> Self {
        self.0.encodings = encodings;
        self
    }

    /// Sets optional file path for this column chunk.
    pub fn set_file_path(mut self, value: String) -> Self {
        self.0.file_path = Some(value);
        self
    }

    /// Sets file offset in bytes.
    pub fn set_file_offset(mut self, value: i64) -> Self {
        self.0.file_offset = value;
        self
    }

    /// Sets number of values.
    pub fn set_num_values(mut self, value: i64) -> Self {
        self.0.num_values = value;
        self
    }

    /// Sets compression.
    pub fn set_compression(mut self, value: Compression) -> Self {
        self.0.compression = value;
        self
    }

    /// Sets total compressed size in bytes.
    pub fn set_total_compressed_size(mut self, value: i64) -> Self {
        self.0.total_compressed_size = value;
        self
    }

    /// Sets total uncompressed size in bytes.
    pub fn set_total_uncompressed_size(mut self, value: i64) -> Self {
        self.0.total_uncompressed_size = value;
        self
    }

    /// Sets data page offset in bytes.
    pub fn set_data_page_offset(mut self, value: i64) -> Self {
        self.0.data_page_offset = value;
        self
    }

    /// Sets optional dictionary page offset in bytes.
    pub fn set_dictionary_page_offset(mut self, value: Option<i64>) -> Self {
        self.0.dictionary_page_offset = value;
        self
    }

    /// Sets optional index page offset in bytes.
    pub fn set_index_page_offset(mut self, value: Option<i64>) -> Self {
        self.0.index_page_offset = value;
        self
    }

    /// Sets statistics for this column chunk.
    pub fn set_statistics(mut self, value: Statistics) -> Self {
        self.0.statistics = Some(value);
        self
    }

    /// Sets the number of pages written per page type and encoding.
    pub fn set_page_encoding_stats(mut self, value: Vec<PageEncodingStats>) -> Self {
        self.0.encoding_stats = Some(value);
        self
    }

    /// Clears the statistics for this column chunk.
    pub fn clear_statistics(mut self) -> Self {
        self.0.statistics = None;
        self
    }

    /// Sets the encryption metadata for an encrypted column.
    pub fn set_column_crypto_metadata(mut self, value: Option<ColumnCryptoMetaData>) -> Self {
        self.0.column_crypto_metadata = value;
        self
    }

    /// Sets the separately encrypted copy of the column metadata.
    pub(crate) fn set_encrypted_column_metadata(mut self, value: Option<Vec<u8>>) -> Self {
        self.0.encrypted_column_metadata = value;
        self
    }

    /// Marks this chunk as belonging to a file with a plaintext footer, which keeps a
    /// redacted plaintext copy of the metadata alongside the encrypted one.
    pub(crate) fn set_plaintext_footer_mode(mut self, value: bool) -> Self {
        self.0.plaintext_footer_mode = value;
        self
    }

    /// Builds column chunk metadata.
    pub fn build(self) -> Result<ColumnChunkMetaData> {
        Ok(self.0)
    }
}

impl From<ColumnChunkMetaData> for ColumnChunkMetaDataBuilder {
    fn from(value: ColumnChunkMetaData) -> Self {
        ColumnChunkMetaDataBuilder(value)
    }
}

// ----------------------------------------------------------------------
// Application version, parsed from the `created_by` footer string

/// Parsed semantic version of the application that wrote a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationVersion {
    application: String,
    major: i32,
    minor: i32,
    patch: i32,
}

impl ApplicationVersion {
    /// The version of parquet-mr that fixed statistics for dictionary pages
    /// (PARQUET-251).
    pub fn parquet_251_fixed_version() -> Self {
        Self::new("parquet-mr", 1, 8, 0)
    }

    /// The version of parquet-mr that started accounting the dictionary page header
    /// in the recorded chunk sizes (PARQUET-816).
    pub fn parquet_816_fixed_version() -> Self {
        Self::new("parquet-mr", 1, 2, 9)
    }

    /// The version of parquet-cpp from which statistics are computed correctly for
    /// all types.
    pub fn parquet_cpp_fixed_stats_version() -> Self {
        Self::new("parquet-cpp", 1, 3, 0)
    }

    /// The version of parquet-mr from which statistics are computed correctly for
    /// all types.
    pub fn parquet_mr_fixed_stats_version() -> Self {
        Self::new("parquet-mr", 1, 10, 0)
    }

    /// Creates a version for a known application.
    pub fn new(application: &str, major: i32, minor: i32, patch: i32) -> Self {
        Self {
            application: application.to_string(),
            major,
            minor,
            patch,
        }
    }

    /// The version used for files whose `created_by` is absent or unparseable.
    pub fn unknown() -> Self {
        Self::new("unknown", 0, 0, 0)
    }

    /// Parses a `created_by` string of the canonical form
    /// `<application> version <major>.<minor>.<patch>... (build <hash>)`.
    ///
    /// Garbage input parses to the `unknown` application rather than an error, since
    /// old writers produced a variety of formats.
    pub fn try_parse(created_by: &str) -> Self {
        let lower = created_by.to_lowercase();
        let mut tokens = lower.split_whitespace();

        let application = match tokens.next() {
            Some(application) if !application.is_empty() => application.to_string(),
            _ => return Self::unknown(),
        };

        let version_str = match (tokens.next(), tokens.next()) {
            (Some("version"), Some(version)) => version,
            _ => return Self { application, major: 0, minor: 0, patch: 0 },
        };

        // strip pre-release and build suffixes: 1.2.9-rc0+cdh5 parses as 1.2.9
        let version_core: &str = version_str
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or("");
        let mut parts = version_core.split('.').map(|p| p.parse::<i32>().ok());

        let major = parts.next().flatten();
        let minor = parts.next().flatten();
        let patch = parts.next().flatten();
        match (major, minor, patch) {
            (Some(major), Some(minor), Some(patch)) => Self {
                application,
                major,
                minor,
                patch,
            },
            _ => Self {
                application,
                major: 0,
                minor: 0,
                patch: 0,
            },
        }
    }

    /// Returns the application name, lower-cased.
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Returns true if this version is strictly older than `other`. Versions of
    /// different applications do not compare.
    pub fn version_lt(&self, other: &ApplicationVersion) -> bool {
        if self.application != other.application {
            return false;
        }
        (self.major, self.minor, self.patch) < (other.major, other.minor, other.patch)
    }

    /// Returns true if this version equals `other`.
    pub fn version_eq(&self, other: &ApplicationVersion) -> bool {
        self.application == other.application
            && (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }

    /// Returns whether statistics written by this application version can be
    /// trusted for a column of the given type and sort order.
    ///
    /// Statistics written before the fixes referenced by
    /// [`Self::parquet_251_fixed_version`] and friends were computed with a signed
    /// comparison regardless of type, which corrupts min/max for unsigned orderings.
    /// Files with an unknown provenance are accepted; callers wanting stricter
    /// behaviour should reject those above this layer.
    pub fn has_correct_statistics(
        &self,
        col_type: Type,
        statistics: Option<&Statistics>,
        sort_order: crate::basic::SortOrder,
    ) -> bool {
        use crate::basic::SortOrder;

        // Earlier versions only produce valid statistics for SIGNED order, unless min
        // and max are identical (in which case the order does not matter).
        if (self.application == "parquet-cpp"
            && self.version_lt(&Self::parquet_cpp_fixed_stats_version()))
            || (self.application == "parquet-mr"
                && self.version_lt(&Self::parquet_mr_fixed_stats_version()))
        {
            let max_equals_min = statistics
                .map(|s| {
                    s.has_min_max_set() && s.min_bytes_opt() == s.max_bytes_opt()
                })
                .unwrap_or(false);
            if sort_order != SortOrder::SIGNED && !max_equals_min {
                return false;
            }

            // Statistics of other types are OK
            if col_type != Type::FIXED_LEN_BYTE_ARRAY && col_type != Type::BYTE_ARRAY {
                return true;
            }
        }

        // created_by is not populated, which could have been caused by
        // parquet-mr during the same time as PARQUET-251, see PARQUET-297
        if self.application == "unknown" {
            return true;
        }

        // Unknown sort order has incorrect stats
        if sort_order == SortOrder::UNDEFINED {
            return false;
        }

        // PARQUET-251
        if self.version_lt(&Self::parquet_251_fixed_version()) {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Repetition, SortOrder, Type as PhysicalType};
    use crate::schema::types::Type as SchemaType;

    fn test_schema_descr() -> SchemaDescPtr {
        let a = SchemaType::primitive_type_builder("a", PhysicalType::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap();
        Arc::new(SchemaDescriptor::new(Arc::new(
            SchemaType::group_type_builder("schema")
                .with_fields(vec![Arc::new(a)])
                .build()
                .unwrap(),
        )))
    }

    #[test]
    fn test_row_group_metadata_column_count_mismatch() {
        let descr = test_schema_descr();
        let err = RowGroupMetaData::builder(descr)
            .set_num_rows(10)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Column length mismatch"));
    }

    #[test]
    fn test_column_chunk_byte_range() {
        let descr = test_schema_descr();
        let col = ColumnChunkMetaData::builder(descr.column(0))
            .set_data_page_offset(100)
            .set_dictionary_page_offset(Some(40))
            .set_total_compressed_size(200)
            .build()
            .unwrap();
        assert_eq!(col.byte_range(), 40..240);

        let col = ColumnChunkMetaData::builder(descr.column(0))
            .set_data_page_offset(100)
            .set_total_compressed_size(200)
            .build()
            .unwrap();
        assert_eq!(col.byte_range(), 100..300);
    }

    #[test]
    fn test_application_version_parse() {
        let v = ApplicationVersion::try_parse("parquet-mr version 1.2.8 (build abcd)");
        assert_eq!(v, ApplicationVersion::new("parquet-mr", 1, 2, 8));

        let v = ApplicationVersion::try_parse("parquet-mr version 1.2.9-rc0 (build ef)");
        assert_eq!(v, ApplicationVersion::new("parquet-mr", 1, 2, 9));

        let v = ApplicationVersion::try_parse("");
        assert_eq!(v.application(), "unknown");

        let v = ApplicationVersion::try_parse("gibberish");
        assert_eq!(v, ApplicationVersion::new("gibberish", 0, 0, 0));
    }

    #[test]
    fn test_application_version_compare() {
        let old = ApplicationVersion::new("parquet-mr", 1, 2, 8);
        assert!(old.version_lt(&ApplicationVersion::parquet_816_fixed_version()));

        let fixed = ApplicationVersion::new("parquet-mr", 1, 2, 9);
        assert!(!fixed.version_lt(&ApplicationVersion::parquet_816_fixed_version()));
        assert!(fixed.version_eq(&ApplicationVersion::parquet_816_fixed_version()));

        // different applications never compare
        let cpp = ApplicationVersion::new("parquet-cpp", 1, 0, 0);
        assert!(!cpp.version_lt(&ApplicationVersion::parquet_816_fixed_version()));
    }

    #[test]
    fn test_has_correct_statistics() {
        let unknown = ApplicationVersion::unknown();
        assert!(unknown.has_correct_statistics(PhysicalType::INT32, None, SortOrder::SIGNED));

        let old_mr = ApplicationVersion::new("parquet-mr", 1, 9, 0);
        // signed int stats from pre-1.10 parquet-mr are fine
        assert!(old_mr.has_correct_statistics(PhysicalType::INT32, None, SortOrder::SIGNED));
        // unsigned byte arrays are not
        assert!(!old_mr.has_correct_statistics(
            PhysicalType::BYTE_ARRAY,
            None,
            SortOrder::UNSIGNED
        ));

        // pre PARQUET-251 byte array stats are rejected
        let ancient = ApplicationVersion::new("parquet-mr", 1, 7, 0);
        assert!(!ancient.has_correct_statistics(
            PhysicalType::BYTE_ARRAY,
            None,
            SortOrder::SIGNED
        ));
    }
}

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

//! Module for working with Parquet file footers: locating, optionally decrypting and
//! deserializing the trailing [`ParquetMetaData`].

use crate::errors::{ParquetError, Result};
use crate::file::metadata::ParquetMetaData;
use crate::file::metadata::thrift_codec::{
    parquet_metadata_from_bytes, parquet_metadata_with_encryption,
};
use crate::file::properties::ReaderProperties;
use crate::file::reader::ChunkReader;
use crate::file::{FOOTER_SIZE, PARQUET_MAGIC, PARQUET_MAGIC_ENCRYPTED_FOOTER};

/// The decoded content of the final 8 bytes of a file: the length of the serialized
/// footer metadata and which of the two magics terminated the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FooterTail {
    metadata_length: usize,
    encrypted_footer: bool,
}

impl FooterTail {
    /// Decodes the Parquet footer, returning the metadata length in bytes.
    ///
    /// A parquet footer is 8 bytes long and has the following layout:
    /// * 4 bytes for the metadata length
    /// * 4 bytes for the magic bytes `PAR1` or `PARE`
    ///
    /// ```text
    /// +-----+------------------+
    /// | len | 'PAR1' or 'PARE' |
    /// +-----+------------------+
    /// ```
    pub fn try_new(slice: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let magic = &slice[4..];
        let encrypted_footer = if magic == PARQUET_MAGIC_ENCRYPTED_FOOTER {
            true
        } else if magic == PARQUET_MAGIC {
            false
        } else {
            return Err(general_err!("Invalid Parquet file. Corrupt footer"));
        };
        // get the metadata length from the footer
        let metadata_len = u32::from_le_bytes(slice[..4].try_into().unwrap());
        Ok(Self {
            metadata_length: metadata_len as usize,
            encrypted_footer,
        })
    }

    /// The length of the serialized footer metadata, in bytes. For encrypted footers
    /// this includes the leading `FileCryptoMetaData`; for signed plaintext footers
    /// it includes the 28-byte signature.
    pub fn metadata_length(&self) -> usize {
        self.metadata_length
    }

    /// Whether the footer metadata is encrypted.
    pub fn is_encrypted_footer(&self) -> bool {
        self.encrypted_footer
    }
}

/// Reads the [`ParquetMetaData`] from the footer of the Parquet file using default
/// reader properties.
///
/// # Layout of Parquet file
/// ```text
/// +---------------------------+-----+---+
/// |      Rest of file         |  B  | A |
/// +---------------------------+-----+---+
/// ```
/// where
/// * `A`: parquet footer which stores the length of the metadata.
/// * `B`: parquet metadata.
///
/// # I/O
///
/// This method speculatively reads a window from the end of the file sized by
/// [`ReaderProperties::footer_read_size`]. If the serialized metadata does not fit in
/// the window, a second positioned read fetches the remainder, so most files are
/// opened in a single read.
pub fn parse_metadata<R: ChunkReader>(chunk_reader: &R) -> Result<ParquetMetaData> {
    parse_metadata_with_properties(chunk_reader, &ReaderProperties::default())
}

/// Reads the [`ParquetMetaData`] from the footer of the Parquet file, decrypting or
/// verifying it as dictated by `properties`.
pub fn parse_metadata_with_properties<R: ChunkReader>(
    chunk_reader: &R,
    properties: &ReaderProperties,
) -> Result<ParquetMetaData> {
    // check file is large enough to hold footer
    let file_size = chunk_reader.len();
    if file_size < (FOOTER_SIZE as u64) {
        return Err(general_err!(
            "Invalid Parquet file. Size is smaller than footer"
        ));
    }

    // read the tail window, which in most cases already covers the metadata
    let tail_len = (properties.footer_read_size() as u64)
        .clamp(FOOTER_SIZE as u64, file_size) as usize;
    let tail = chunk_reader.get_bytes(file_size - tail_len as u64, tail_len)?;

    let footer_bytes: [u8; FOOTER_SIZE] = tail[tail_len - FOOTER_SIZE..].try_into().unwrap();
    let footer = FooterTail::try_new(&footer_bytes)?;

    let metadata_len = footer.metadata_length();
    let footer_metadata_len = FOOTER_SIZE + metadata_len;
    if footer_metadata_len as u64 > file_size {
        return Err(general_err!(
            "Invalid Parquet file. Reported metadata length of {} + {} byte footer, but file is only {} bytes",
            metadata_len,
            FOOTER_SIZE,
            file_size
        ));
    }

    // second read if the metadata starts before the tail window
    let metadata_bytes = if footer_metadata_len <= tail_len {
        tail.slice(tail_len - footer_metadata_len..tail_len - FOOTER_SIZE)
    } else {
        chunk_reader.get_bytes(file_size - footer_metadata_len as u64, metadata_len)?
    };

    let file_decryption_properties = properties.file_decryption_properties();
    if footer.is_encrypted_footer() || file_decryption_properties.is_some() {
        parquet_metadata_with_encryption(
            file_decryption_properties,
            footer.is_encrypted_footer(),
            &metadata_bytes,
        )
    } else {
        parquet_metadata_from_bytes(&metadata_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_parse_metadata_size_smaller_than_footer() {
        let test_file = tempfile::tempfile().unwrap();
        let reader_result = parse_metadata(&test_file);
        assert_eq!(
            reader_result.unwrap_err().to_string(),
            "Parquet error: Invalid Parquet file. Size is smaller than footer"
        );
    }

    #[test]
    fn test_parse_metadata_corrupt_footer() {
        let data = Bytes::from(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let reader_result = parse_metadata(&data);
        assert_eq!(
            reader_result.unwrap_err().to_string(),
            "Parquet error: Invalid Parquet file. Corrupt footer"
        );
    }

    #[test]
    fn test_parse_metadata_invalid_start() {
        let test_file = Bytes::from(vec![255, 0, 0, 0, b'P', b'A', b'R', b'1']);
        let reader_result = parse_metadata(&test_file);
        assert_eq!(
            reader_result.unwrap_err().to_string(),
            "Parquet error: Invalid Parquet file. Reported metadata length of 255 + 8 byte footer, but file is only 8 bytes"
        );
    }

    #[test]
    fn test_footer_tail_magic_dispatch() {
        let tail = FooterTail::try_new(&[0, 1, 0, 0, b'P', b'A', b'R', b'1']).unwrap();
        assert!(!tail.is_encrypted_footer());
        assert_eq!(tail.metadata_length(), 256);

        let tail = FooterTail::try_new(&[4, 0, 0, 0, b'P', b'A', b'R', b'E']).unwrap();
        assert!(tail.is_encrypted_footer());
        assert_eq!(tail.metadata_length(), 4);

        assert!(FooterTail::try_new(&[0, 0, 0, 0, b'P', b'A', b'R', b'X']).is_err());
    }
}

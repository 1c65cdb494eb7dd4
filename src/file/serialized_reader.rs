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

//! Contains implementations of the reader traits [`FileReader`], [`RowGroupReader`]
//! and [`PageReader`].
//!
//! Also contains implementations of the [`ChunkReader`] for files and byte buffers.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;

use crate::basic::{Compression, Type};
use crate::column::page::{Page, PageReader};
use crate::compression::{Codec, create_codec};
use crate::encryption::ciphers::BlockDecryptor;
use crate::encryption::decrypt::{CryptoContext, read_and_decrypt};
use crate::errors::{ParquetError, Result};
use crate::file::footer;
use crate::file::metadata::thrift_codec::PageHeader;
use crate::file::metadata::{
    ApplicationVersion, MAX_DICT_HEADER_SIZE, ParquetMetaData, RowGroupMetaData,
};
use crate::file::properties::{ReaderProperties, ReaderPropertiesPtr};
use crate::file::reader::{ChunkReader, FileReader, Length, RowGroupReader};
use crate::file::statistics;
use crate::thrift::{ReadThrift, ThriftReadInputProtocol, ThriftSliceInputProtocol};

// ----------------------------------------------------------------------
// Implementations of file & row group readers

/// A serialized implementation for Parquet [`FileReader`].
#[derive(Debug)]
pub struct SerializedFileReader<R: ChunkReader> {
    chunk_reader: Arc<R>,
    metadata: Arc<ParquetMetaData>,
    props: ReaderPropertiesPtr,
}

impl<R: 'static + ChunkReader> SerializedFileReader<R> {
    /// Creates file reader from a Parquet file.
    /// Returns an error if the Parquet file does not exist or is corrupt.
    pub fn new(chunk_reader: R) -> Result<Self> {
        Self::new_with_properties(chunk_reader, Default::default())
    }

    /// Creates file reader from a Parquet file with reader properties.
    /// Returns an error if the Parquet file does not exist or is corrupt.
    pub fn new_with_properties(chunk_reader: R, properties: ReaderProperties) -> Result<Self> {
        let metadata = footer::parse_metadata_with_properties(&chunk_reader, &properties)?;
        Ok(Self {
            chunk_reader: Arc::new(chunk_reader),
            metadata: Arc::new(metadata),
            props: Arc::new(properties),
        })
    }

    /// Returns the reader properties of this reader.
    pub fn properties(&self) -> &ReaderPropertiesPtr {
        &self.props
    }
}

impl<R: 'static + ChunkReader> FileReader for SerializedFileReader<R> {
    fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    fn get_row_group(&self, i: usize) -> Result<Box<dyn RowGroupReader + '_>> {
        if i >= self.metadata.num_row_groups() {
            return Err(ParquetError::IndexOutOfBound(
                i,
                self.metadata.num_row_groups(),
            ));
        }
        let row_group_metadata = self.metadata.row_group(i);
        // Row groups should be processed sequentially.
        Ok(Box::new(SerializedRowGroupReader::new(
            self.chunk_reader.clone(),
            row_group_metadata,
            &self.metadata,
            i,
        )?))
    }
}

/// A serialized implementation for Parquet [`RowGroupReader`].
pub struct SerializedRowGroupReader<'a, R: ChunkReader> {
    chunk_reader: Arc<R>,
    metadata: &'a RowGroupMetaData,
    parquet_metadata: &'a ParquetMetaData,
    row_group_ordinal: usize,
    writer_version: ApplicationVersion,
}

impl<'a, R: ChunkReader> SerializedRowGroupReader<'a, R> {
    /// Creates new row group reader from a file, row group metadata and custom
    /// config.
    pub(crate) fn new(
        chunk_reader: Arc<R>,
        metadata: &'a RowGroupMetaData,
        parquet_metadata: &'a ParquetMetaData,
        row_group_ordinal: usize,
    ) -> Result<Self> {
        let writer_version = parquet_metadata.file_metadata().writer_version();
        Ok(Self {
            chunk_reader,
            metadata,
            parquet_metadata,
            row_group_ordinal,
            writer_version,
        })
    }
}

impl<R: 'static + ChunkReader> RowGroupReader for SerializedRowGroupReader<'_, R> {
    fn metadata(&self) -> &RowGroupMetaData {
        self.metadata
    }

    fn num_columns(&self) -> usize {
        self.metadata.num_columns()
    }

    // TODO: fix PARQUET-816
    fn get_column_page_reader(&self, i: usize) -> Result<Box<dyn PageReader>> {
        let col = self.metadata.column(i);

        let page_locations = col.byte_range();
        let (col_start, mut col_length) =
            (page_locations.start, page_locations.end - page_locations.start);

        // The Parquet MR writer had a bug in 1.2.8 and below where it didn't include
        // the dictionary page header size in total_compressed_size (see IMPALA-694).
        // We add padding to compensate.
        if self
            .writer_version
            .version_lt(&ApplicationVersion::parquet_816_fixed_version())
        {
            let file_size = self.chunk_reader.len();
            let bytes_remaining = file_size.saturating_sub(col_start + col_length);
            let padding = MAX_DICT_HEADER_SIZE.min(bytes_remaining);
            col_length += padding;
        }

        let crypto_context = match col.crypto_metadata() {
            Some(crypto_metadata) => {
                let file_decryptor = self.parquet_metadata.file_decryptor().ok_or_else(|| {
                    general_err!(
                        "Cannot decrypt column '{}', the file decryptor is not set",
                        col.column_path().string()
                    )
                })?;
                Some(CryptoContext::for_column(
                    file_decryptor,
                    crypto_metadata,
                    self.row_group_ordinal,
                    i,
                )?)
            }
            None => None,
        };

        Ok(Box::new(
            SerializedPageReader::new(
                self.chunk_reader.clone(),
                col_start,
                col_length as usize,
                col.num_values(),
                col.compression(),
                col.column_type(),
                crypto_context,
            )?
            .with_dictionary_page_possible(col.has_dictionary_page()),
        ))
    }
}

// ----------------------------------------------------------------------
// Page reading

/// A [`Read`] that counts the bytes it has handed out.
struct TrackedRead<R>(R, usize);

impl<R: Read> Read for TrackedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let v = self.0.read(buf)?;
        self.1 += v;
        Ok(v)
    }
}

/// Reads a page header from `input`, returning the number of bytes consumed and the
/// parsed header.
fn read_page_header_len<T: Read>(input: &mut T) -> Result<(usize, PageHeader)> {
    let mut tracked = TrackedRead(input, 0);
    let mut prot = ThriftReadInputProtocol::new(&mut tracked);
    let header = PageHeader::read_thrift(&mut prot)?;
    Ok((tracked.1, header))
}

/// Reads and decrypts a page header, returning the number of bytes consumed from
/// `input` and the parsed header.
fn read_encrypted_page_header_len<T: Read>(
    input: &mut T,
    decryptor: &Arc<dyn BlockDecryptor>,
    aad: &[u8],
) -> Result<(usize, PageHeader)> {
    let mut tracked = TrackedRead(input, 0);
    let buf = read_and_decrypt(decryptor, &mut tracked, aad)
        .map_err(|_| general_err!("Unable to decrypt page header"))?;
    let mut prot = ThriftSliceInputProtocol::new(&buf);
    let header = PageHeader::read_thrift(&mut prot)?;
    Ok((tracked.1, header))
}

/// Decompresses and converts a serialized page payload into a [`Page`].
pub(crate) fn decode_page(
    page_header: PageHeader,
    buffer: Bytes,
    physical_type: Type,
    decompressor: Option<&mut Box<dyn Codec>>,
) -> Result<Page> {
    let uncompressed_size = page_header.uncompressed_page_size as usize;

    // The whole v1 page payload is compressed as one unit.
    let buffer = match decompressor {
        Some(decompressor) => {
            let mut decompressed = Vec::with_capacity(uncompressed_size);
            decompressor.decompress(&buffer, &mut decompressed)?;
            if decompressed.len() != uncompressed_size {
                return Err(general_err!(
                    "Actual decompressed size doesn't match the expected one ({} vs {})",
                    decompressed.len(),
                    uncompressed_size
                ));
            }
            Bytes::from(decompressed)
        }
        None => buffer,
    };

    let result = match page_header.r#type {
        crate::basic::PageType::DICTIONARY_PAGE => {
            let dict_header = page_header.dictionary_page_header.as_ref().ok_or_else(|| {
                general_err!("Missing dictionary page header")
            })?;
            let is_sorted = dict_header.is_sorted.unwrap_or(false);
            Page::DictionaryPage {
                buf: buffer,
                num_values: dict_header.num_values.try_into()?,
                encoding: dict_header.encoding,
                is_sorted,
            }
        }
        crate::basic::PageType::DATA_PAGE => {
            let header = page_header
                .data_page_header
                .ok_or_else(|| general_err!("Missing v1 data page header"))?;
            Page::DataPage {
                buf: buffer,
                num_values: header.num_values.try_into()?,
                encoding: header.encoding,
                def_level_encoding: header.definition_level_encoding,
                rep_level_encoding: header.repetition_level_encoding,
                statistics: statistics::from_thrift(physical_type, header.statistics)?,
            }
        }
        other => {
            return Err(nyi_err!("Page type {} is not supported", other));
        }
    };

    Ok(result)
}

/// A serialized implementation for Parquet [`PageReader`], reading the pages of one
/// column chunk from the byte range `[start, start + length)`, decrypting and
/// decompressing them as configured.
pub struct SerializedPageReader<R: ChunkReader> {
    /// The chunk reader holding the bytes of the file
    reader: Arc<R>,

    /// The decompressor for this column chunk, if the chunk is compressed
    decompressor: Option<Box<dyn Codec>>,

    /// The physical type of the column, needed to decode statistics
    physical_type: Type,

    /// The offset of the next page header in the file
    offset: u64,

    /// The end of the column chunk byte range, padded for legacy files
    end_offset: u64,

    /// The total number of values in this column chunk
    total_num_values: i64,

    /// The number of data page values read so far
    seen_num_values: i64,

    /// The decryption context of the column chunk, when the column is encrypted
    crypto_context: Option<CryptoContext>,

    /// The ordinal of the next data page, used in the page AAD
    page_ordinal: usize,

    /// Whether the next page to read may be a dictionary page
    dictionary_page_possible: bool,
}

impl<R: ChunkReader> SerializedPageReader<R> {
    /// Creates a page reader for the column chunk at `[start, start + length)` with
    /// `total_num_values` values.
    pub(crate) fn new(
        reader: Arc<R>,
        start: u64,
        length: usize,
        total_num_values: i64,
        codec: Compression,
        physical_type: Type,
        crypto_context: Option<CryptoContext>,
    ) -> Result<Self> {
        let decompressor = create_codec(codec)?;
        Ok(Self {
            reader,
            decompressor,
            physical_type,
            offset: start,
            end_offset: start + length as u64,
            total_num_values,
            seen_num_values: 0,
            crypto_context,
            page_ordinal: 0,
            dictionary_page_possible: true,
        })
    }

    /// Sets whether the first page of the chunk may be a dictionary page. Encrypted
    /// chunks need this to pick the AAD the first page header was bound with.
    pub(crate) fn with_dictionary_page_possible(mut self, dictionary_page_possible: bool) -> Self {
        self.dictionary_page_possible = dictionary_page_possible;
        self
    }
}

impl<R: ChunkReader> Iterator for SerializedPageReader<R> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next_page().transpose()
    }
}

impl<R: ChunkReader> PageReader for SerializedPageReader<R> {
    fn get_next_page(&mut self) -> Result<Option<Page>> {
        while self.seen_num_values < self.total_num_values {
            if self.offset >= self.end_offset {
                return Ok(None);
            }

            // The page context decides which AAD decrypts the header: the first page
            // of a chunk with a dictionary uses the dictionary modules.
            let page_crypto_context = self.crypto_context.as_ref().map(|ctx| {
                if self.dictionary_page_possible {
                    ctx.for_dictionary_page()
                } else {
                    ctx.with_page_ordinal(self.page_ordinal)
                }
            });

            let mut read = self
                .reader
                .get_read(self.offset)?
                .take(self.end_offset - self.offset);

            let (header_len, header) = match &page_crypto_context {
                Some(ctx) => {
                    let aad = ctx.create_page_header_aad()?;
                    read_encrypted_page_header_len(&mut read, ctx.metadata_decryptor(), &aad)?
                }
                None => read_page_header_len(&mut read)?,
            };
            self.offset += header_len as u64;

            let data_len = header.compressed_page_size as usize;
            if self.offset + data_len as u64 > self.end_offset {
                return Err(eof_err!(
                    "Page payload of {} bytes exceeds the column chunk range",
                    data_len
                ));
            }
            let buffer = self.reader.get_bytes(self.offset, data_len)?;
            self.offset += data_len as u64;

            // Dictionary pages with a bad type after the first page are a corruption
            let is_data_page = header.r#type == crate::basic::PageType::DATA_PAGE;
            let is_dict_page = header.r#type == crate::basic::PageType::DICTIONARY_PAGE;
            if is_dict_page && !self.dictionary_page_possible {
                return Err(general_err!(
                    "Dictionary page found after the first page of the column chunk"
                ));
            }
            if is_data_page && page_crypto_context.as_ref().is_some_and(|c| c.dictionary_page) {
                // the header AAD guess was wrong; files always put the dictionary
                // first, so a mismatch here is a corruption
                return Err(general_err!("Expected a dictionary page, found a data page"));
            }

            let buffer = match &page_crypto_context {
                Some(ctx) => {
                    let aad = ctx.create_page_aad()?;
                    let decrypted = ctx
                        .data_decryptor()
                        .decrypt(&buffer, &aad)
                        .map_err(|_| general_err!("Unable to decrypt page payload"))?;
                    Bytes::from(decrypted)
                }
                None => buffer,
            };

            self.dictionary_page_possible = false;

            let page = decode_page(
                header,
                buffer,
                self.physical_type,
                self.decompressor.as_mut(),
            )?;
            if is_data_page {
                self.seen_num_values += page.num_values() as i64;
                self.page_ordinal += 1;
            }
            return Ok(Some(page));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Encoding;
    use crate::column::page::CompressedPage;
    use crate::file::writer::{SerializedPageWriter, TrackedWrite};
    use crate::column::page::PageWriter;

    fn write_test_pages(pages: Vec<Page>) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut sink = TrackedWrite::new(&mut buffer);
            let mut page_writer = SerializedPageWriter::new(&mut sink);
            for page in pages {
                let uncompressed_size = page.buffer().len();
                page_writer
                    .write_page(CompressedPage::new(page, uncompressed_size))
                    .unwrap();
            }
            page_writer.close().unwrap();
        }
        buffer
    }

    #[test]
    fn test_page_reader_dictionary_then_data() {
        let pages = vec![
            Page::DictionaryPage {
                buf: Bytes::from(vec![1, 0, 0, 0, 2, 0, 0, 0]),
                num_values: 2,
                encoding: Encoding::PLAIN,
                is_sorted: false,
            },
            Page::DataPage {
                buf: Bytes::from(vec![1, 0]),
                num_values: 2,
                encoding: Encoding::RLE_DICTIONARY,
                def_level_encoding: Encoding::RLE,
                rep_level_encoding: Encoding::RLE,
                statistics: None,
            },
        ];
        let buffer = write_test_pages(pages.clone());
        let len = buffer.len();

        let mut reader = SerializedPageReader::new(
            Arc::new(Bytes::from(buffer)),
            0,
            len,
            2,
            Compression::UNCOMPRESSED,
            Type::INT32,
            None,
        )
        .unwrap();

        let first = reader.get_next_page().unwrap().unwrap();
        assert_eq!(first, pages[0]);
        let second = reader.get_next_page().unwrap().unwrap();
        assert_eq!(second, pages[1]);
        assert!(reader.get_next_page().unwrap().is_none());
    }

    #[test]
    fn test_page_reader_stops_at_value_count() {
        // trailing garbage after the pages must not be parsed
        let pages = vec![Page::DataPage {
            buf: Bytes::from(vec![5, 0, 0, 0]),
            num_values: 1,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        }];
        let mut buffer = write_test_pages(pages);
        let valid_len = buffer.len();
        buffer.extend_from_slice(&[0xAB; 100]);
        let padded_len = buffer.len();

        let mut reader = SerializedPageReader::new(
            Arc::new(Bytes::from(buffer)),
            0,
            padded_len.min(valid_len + 100),
            1,
            Compression::UNCOMPRESSED,
            Type::INT32,
            None,
        )
        .unwrap();

        assert!(reader.get_next_page().unwrap().is_some());
        assert!(reader.get_next_page().unwrap().is_none());
    }

    #[test]
    fn test_legacy_dictionary_header_padding() {
        use crate::basic::Repetition;
        use crate::column::page::PageWriter;
        use crate::column::writer::{get_column_writer, get_typed_column_writer};
        use crate::data_type::Int32Type;
        use crate::file::metadata::{
            ColumnChunkMetaDataBuilder, FileMetaData, RowGroupMetaData,
        };
        use crate::file::properties::WriterProperties;
        use crate::schema::types::{SchemaDescriptor, Type as SchemaType};

        let field = Arc::new(
            SchemaType::primitive_type_builder("col", Type::INT32)
                .with_repetition(Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        let schema = Arc::new(
            SchemaType::group_type_builder("schema")
                .with_fields(vec![field])
                .build()
                .unwrap(),
        );
        let descr = Arc::new(SchemaDescriptor::new(schema));

        // a dictionary-encoded chunk: dictionary page header then data page
        let mut buffer = Vec::new();
        let metadata = {
            let mut sink = TrackedWrite::new(&mut buffer);
            let page_writer: Box<dyn PageWriter + '_> =
                Box::new(SerializedPageWriter::new(&mut sink));
            let props = Arc::new(WriterProperties::builder().build());
            let writer = get_column_writer(descr.column(0), props, page_writer);
            let mut typed = get_typed_column_writer::<Int32Type>(writer);
            typed.write_batch(&[1, 1, 2], None, None).unwrap();
            typed.close().unwrap().metadata
        };
        assert!(metadata.has_dictionary_page());

        // a pre-1.2.9 parquet-mr writer would have omitted the dictionary page
        // header from the recorded size
        let shortfall = 10;
        let corrupted = ColumnChunkMetaDataBuilder::from(metadata)
            .set_total_compressed_size(buffer.len() as i64 - shortfall)
            .build()
            .unwrap();
        let row_group = RowGroupMetaData::builder(descr.clone())
            .set_column_metadata(vec![corrupted])
            .set_num_rows(3)
            .set_total_byte_size(buffer.len() as i64)
            .set_ordinal(0)
            .build()
            .unwrap();

        let read_all = |created_by: &str| -> Result<usize> {
            let file_metadata = FileMetaData::new(
                1,
                3,
                Some(created_by.to_string()),
                None,
                descr.clone(),
                None,
            );
            let parquet_metadata =
                ParquetMetaData::new(file_metadata, vec![row_group.clone()]);
            let chunk_reader = Arc::new(Bytes::from(buffer.clone()));
            let row_group_reader = SerializedRowGroupReader::new(
                chunk_reader,
                parquet_metadata.row_group(0),
                &parquet_metadata,
                0,
            )?;
            let mut pages = row_group_reader.get_column_page_reader(0)?;
            let mut count = 0;
            while pages.get_next_page()?.is_some() {
                count += 1;
            }
            Ok(count)
        };

        // old writers get up to 100 bytes of padding and parse fine
        assert_eq!(read_all("parquet-mr version 1.2.8 (build abcd)").unwrap(), 2);

        // fixed writers are taken at their word, so the truncated range fails
        assert!(read_all("parquet-mr version 1.2.9 (build abcd)").is_err());
    }

    #[test]
    fn test_page_reader_truncated_payload() {
        let pages = vec![Page::DataPage {
            buf: Bytes::from(vec![5, 0, 0, 0]),
            num_values: 1,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        }];
        let buffer = write_test_pages(pages);
        // clip the range so the payload extends past it
        let clipped = buffer.len() - 2;

        let mut reader = SerializedPageReader::new(
            Arc::new(Bytes::from(buffer)),
            0,
            clipped,
            1,
            Compression::UNCOMPRESSED,
            Type::INT32,
            None,
        )
        .unwrap();

        assert!(reader.get_next_page().is_err());
    }
}

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

//! Contains file writer API, and provides methods to write row groups and columns by
//! using row group writers and column writers respectively.

use std::{io::Write, sync::Arc};

use crate::basic::{ColumnOrder, PageType};
use crate::column::page::{CompressedPage, Page, PageWriteSpec, PageWriter};
use crate::column::writer::{
    ColumnCloseResult, ColumnWriter, ColumnWriterImpl, get_column_writer,
    get_typed_column_writer_mut,
};
use crate::data_type::DataType;
use crate::encryption::encrypt::{
    FileEncryptionProperties, FileEncryptor, encrypt_object, write_signed_plaintext_object,
};
use crate::encryption::modules::{
    ModuleType, create_footer_aad, create_footer_signing_aad, create_module_aad,
};
use crate::encryption::page_encryptor::PageEncryptor;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::thrift_codec::{
    AesGcmV1, DataPageHeader, DictionaryPageHeader, EncryptionAlgorithm, FileCryptoMetaData,
    FileMeta, PageHeader, serialize_column_meta_data,
};
use crate::file::metadata::{
    ColumnChunkMetaData, ColumnChunkMetaDataBuilder, ColumnCryptoMetaData,
    EncryptionWithColumnKey, FileMetaData, RowGroupMetaData, RowGroupMetaDataPtr,
};
use crate::file::properties::WriterPropertiesPtr;
use crate::file::statistics::to_thrift as statistics_to_thrift;
use crate::file::{PARQUET_MAGIC, PARQUET_MAGIC_ENCRYPTED_FOOTER};
use crate::schema::types::{SchemaDescPtr, SchemaDescriptor, TypePtr};
use crate::thrift::{ThriftCompactOutputProtocol, WriteThrift};

/// Returns the magic identifying the file type written with `properties`.
pub(crate) fn get_file_magic(
    file_encryption_properties: Option<&FileEncryptionProperties>,
) -> &'static [u8; 4] {
    match file_encryption_properties {
        Some(properties) if properties.encrypt_footer() => &PARQUET_MAGIC_ENCRYPTED_FOOTER,
        _ => &PARQUET_MAGIC,
    }
}

/// A wrapper around a [`Write`] that keeps track of the number
/// of bytes that have been written
pub struct TrackedWrite<W> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> TrackedWrite<W> {
    /// Create a new [`TrackedWrite`] from a [`Write`]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Returns the number of bytes written to this instance
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Callback invoked on closing a column chunk
pub type OnCloseColumnChunk<'a> = Box<dyn FnOnce(ColumnCloseResult) -> Result<()> + 'a>;

/// Callback invoked on closing a row group, arguments are:
///
/// - the row group metadata
pub type OnCloseRowGroup<'a> = Box<dyn FnOnce(RowGroupMetaDataPtr) -> Result<()> + 'a>;

// ----------------------------------------------------------------------
// Serialized impl for file & row group writers

/// Parquet file writer API.
/// Provides methods to write row groups sequentially.
///
/// The main workflow should be as following:
/// - Create file writer, this will open a new file and write the leading magic.
/// - Request a new row group writer by calling `next_row_group`.
/// - Once finished writing row group, close row group writer by calling `close`
/// - Write subsequent row groups, if necessary.
/// - After all row groups have been written, close the file writer using `close`
///   method.
pub struct SerializedFileWriter<W: Write> {
    buf: TrackedWrite<W>,
    schema: TypePtr,
    descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    file_encryptor: Option<Arc<FileEncryptor>>,
    row_groups: Vec<RowGroupMetaDataPtr>,
    row_group_index: usize,
}

impl<W: Write + Send> SerializedFileWriter<W> {
    /// Creates new file writer.
    pub fn new(buf: W, schema: TypePtr, properties: WriterPropertiesPtr) -> Result<Self> {
        let mut buf = TrackedWrite::new(buf);

        let file_encryptor = match properties.file_encryption_properties() {
            Some(encryption_properties) => {
                Some(Arc::new(FileEncryptor::new(encryption_properties.clone())?))
            }
            None => None,
        };

        Self::start_file(
            &mut buf,
            properties.file_encryption_properties().map(|p| p.as_ref()),
        )?;
        Ok(Self {
            buf,
            schema: schema.clone(),
            descr: Arc::new(SchemaDescriptor::new(schema)),
            props: properties,
            file_encryptor,
            row_groups: vec![],
            row_group_index: 0,
        })
    }

    /// Creates new row group from this file writer.
    /// In case of IO error or Thrift error, returns `Err`.
    ///
    /// There is no limit on a number of row groups in a file; however, row groups
    /// have to be written sequentially. Every time the next row group is requested,
    /// the previous row group must be finalised and closed using
    /// `SerializedRowGroupWriter::close`.
    pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<'_, W>> {
        self.assert_previous_writer_closed()?;
        let ordinal = self.row_group_index;
        self.row_group_index += 1;

        let row_groups = &mut self.row_groups;
        let on_close = move |metadata| {
            row_groups.push(metadata);
            Ok(())
        };

        let row_group_writer = SerializedRowGroupWriter::new(
            self.descr.clone(),
            self.props.clone(),
            &mut self.buf,
            ordinal as i16,
            self.file_encryptor.clone(),
            Some(Box::new(on_close)),
        );
        Ok(row_group_writer)
    }

    /// Returns metadata for any flushed row groups
    pub fn flushed_row_groups(&self) -> &[RowGroupMetaDataPtr] {
        &self.row_groups
    }

    /// Closes and finalises file writer, returning the file metadata.
    ///
    /// All row groups must be appended before this method is called.
    /// No writes are allowed after this point.
    pub fn close(mut self) -> Result<FileMetaData> {
        self.assert_previous_writer_closed()?;
        let metadata = self.write_metadata()?;
        self.buf.flush()?;
        Ok(metadata)
    }

    /// Writes magic bytes at the beginning of the file.
    fn start_file(
        buf: &mut TrackedWrite<W>,
        file_encryption_properties: Option<&FileEncryptionProperties>,
    ) -> Result<()> {
        buf.write_all(get_file_magic(file_encryption_properties))?;
        Ok(())
    }

    fn encryption_algorithm(file_encryptor: &FileEncryptor) -> EncryptionAlgorithm {
        let properties = file_encryptor.properties();
        let supply_aad_prefix = properties
            .aad_prefix()
            .map(|_| !properties.store_aad_prefix());
        let aad_prefix = if properties.store_aad_prefix() {
            properties.aad_prefix().cloned()
        } else {
            None
        };
        EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
            aad_prefix,
            aad_file_unique: Some(file_encryptor.aad_file_unique().clone()),
            supply_aad_prefix,
        })
    }

    /// Assembles and writes metadata at the end of the file, encrypted or signed
    /// when the writer properties carry encryption properties.
    fn write_metadata(&mut self) -> Result<FileMetaData> {
        let num_rows = self.row_groups.iter().map(|x| x.num_rows()).sum();

        // We only include ColumnOrder for leaf nodes; the only supported order is the
        // type-defined order, resolved from the schema.
        let column_orders = (0..self.descr.num_columns())
            .map(|i| ColumnOrder::TYPE_DEFINED_ORDER(self.descr.column(i).sort_order()))
            .collect();

        let file_metadata = FileMetaData::new(
            self.props.writer_version().as_num(),
            num_rows,
            Some(self.props.created_by().to_owned()),
            self.props.key_value_metadata().cloned(),
            self.descr.clone(),
            Some(column_orders),
        );

        let row_groups: Vec<RowGroupMetaData> =
            self.row_groups.iter().map(|rg| rg.as_ref().clone()).collect();

        // Write file metadata
        let start_pos = self.buf.bytes_written();

        match self.file_encryptor.as_ref() {
            Some(file_encryptor) if file_encryptor.properties().encrypt_footer() => {
                // First write the file crypto metadata, then the encrypted footer
                let crypto_metadata = FileCryptoMetaData {
                    encryption_algorithm: Self::encryption_algorithm(file_encryptor),
                    key_metadata: file_encryptor.properties().footer_key_metadata().cloned(),
                };
                {
                    let mut protocol = ThriftCompactOutputProtocol::new(&mut self.buf);
                    crypto_metadata.write_thrift(&mut protocol)?;
                }

                let file_meta = FileMeta {
                    file_metadata: &file_metadata,
                    row_groups: &row_groups,
                    encryption_algorithm: None,
                    footer_signing_key_metadata: None,
                };
                let aad = create_footer_aad(file_encryptor.file_aad())?;
                let mut encryptor = file_encryptor.get_footer_encryptor()?;
                encrypt_object(&file_meta, &mut encryptor, &mut self.buf, &aad)?;
            }
            Some(file_encryptor) => {
                // Plaintext footer of an encrypted file: stamp the signing algorithm
                // and key metadata, then append the 28-byte signature
                let file_meta = FileMeta {
                    file_metadata: &file_metadata,
                    row_groups: &row_groups,
                    encryption_algorithm: Some(Self::encryption_algorithm(file_encryptor)),
                    footer_signing_key_metadata: file_encryptor
                        .properties()
                        .footer_key_metadata()
                        .cloned(),
                };
                let aad = create_footer_signing_aad(file_encryptor.file_aad())?;
                let mut encryptor = file_encryptor.get_footer_encryptor()?;
                write_signed_plaintext_object(&file_meta, &mut encryptor, &mut self.buf, &aad)?;
            }
            None => {
                let file_meta = FileMeta {
                    file_metadata: &file_metadata,
                    row_groups: &row_groups,
                    encryption_algorithm: None,
                    footer_signing_key_metadata: None,
                };
                let mut protocol = ThriftCompactOutputProtocol::new(&mut self.buf);
                file_meta.write_thrift(&mut protocol)?;
            }
        }

        let end_pos = self.buf.bytes_written();

        // Write footer
        let metadata_len = (end_pos - start_pos) as u32;
        self.buf.write_all(&metadata_len.to_le_bytes())?;
        self.buf.write_all(get_file_magic(
            self.props.file_encryption_properties().map(|p| p.as_ref()),
        ))?;

        Ok(file_metadata)
    }

    #[inline]
    fn assert_previous_writer_closed(&self) -> Result<()> {
        if self.row_group_index != self.row_groups.len() {
            Err(general_err!("Previous row group writer was not closed"))
        } else {
            Ok(())
        }
    }
}

/// Installs column encryption metadata after a column chunk is closed: the key
/// routing record and, when required, a separately encrypted copy of the column
/// metadata.
///
/// The separate copy is needed exactly when the column is encrypted and the footer
/// does not already protect its metadata: the footer is plaintext, or the column
/// uses its own key.
fn apply_column_crypto_metadata(
    metadata: ColumnChunkMetaData,
    file_encryptor: &Arc<FileEncryptor>,
    row_group_ordinal: usize,
    column_ordinal: usize,
) -> Result<ColumnChunkMetaData> {
    let column_path = metadata.column_path().string();
    if !file_encryptor.is_column_encrypted(&column_path) {
        return Ok(metadata);
    }

    let properties = file_encryptor.properties();
    let uses_column_key = properties.has_column_keys();
    let crypto_metadata = if uses_column_key {
        ColumnCryptoMetaData::EncryptionWithColumnKey(EncryptionWithColumnKey {
            path_in_schema: metadata.column_path().parts().to_vec(),
            key_metadata: properties
                .column_key(&column_path)
                .and_then(|key| key.key_metadata().cloned()),
        })
    } else {
        ColumnCryptoMetaData::EncryptionWithFooterKey
    };

    let plaintext_footer = !properties.encrypt_footer();
    let metadata = ColumnChunkMetaDataBuilder::from(metadata)
        .set_column_crypto_metadata(Some(crypto_metadata))
        .set_plaintext_footer_mode(plaintext_footer)
        .build()?;

    if !plaintext_footer && !uses_column_key {
        // uniform encryption with an encrypted footer already protects the metadata
        return Ok(metadata);
    }

    // Serialize the full column metadata (including statistics) and encrypt it with
    // the column metadata key; the plaintext copy written to the footer is redacted.
    let mut buffer: Vec<u8> = vec![];
    {
        let mut protocol = ThriftCompactOutputProtocol::new(&mut buffer);
        serialize_column_meta_data(&metadata, &mut protocol)?;
    }
    let mut encryptor = if uses_column_key {
        file_encryptor.get_column_encryptor(&column_path)?
    } else {
        file_encryptor.get_footer_encryptor()?
    };
    let aad = create_module_aad(
        file_encryptor.file_aad(),
        ModuleType::ColumnMetaData,
        row_group_ordinal,
        column_ordinal,
        None,
    )?;
    let ciphertext = encryptor.encrypt(&buffer, &aad)?;

    ColumnChunkMetaDataBuilder::from(metadata)
        .set_encrypted_column_metadata(Some(ciphertext))
        .build()
}

/// Parquet row group writer API.
/// Provides methods to access column writers in an iterator-like fashion, order is
/// guaranteed to match the order of schema leaves (column descriptors).
///
/// All columns should be written sequentially; the main workflow is:
/// - Request the next column using `next_column` method - this will return `None` if
///   no more columns are available to write.
/// - Once done writing a column, close column writer with `close`
/// - Once all columns have been written, close row group writer with `close` method.
pub struct SerializedRowGroupWriter<'a, W: Write> {
    descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    buf: &'a mut TrackedWrite<W>,
    total_rows_written: Option<u64>,
    total_bytes_written: u64,
    column_index: usize,
    row_group_metadata: Option<RowGroupMetaDataPtr>,
    column_chunks: Vec<ColumnChunkMetaData>,
    row_group_ordinal: i16,
    file_encryptor: Option<Arc<FileEncryptor>>,
    on_close: Option<OnCloseRowGroup<'a>>,
}

impl<'a, W: Write + Send> SerializedRowGroupWriter<'a, W> {
    /// Creates a new `SerializedRowGroupWriter` with:
    ///
    /// - `schema_descr` - the schema to write
    /// - `properties` - writer properties
    /// - `buf` - the buffer to write data to
    /// - `row_group_ordinal` - the position of this row group in the file
    /// - `file_encryptor` - the encryptor when the file is encrypted
    /// - `on_close` - an optional callback that will be invoked on [`Self::close`]
    pub(crate) fn new(
        schema_descr: SchemaDescPtr,
        properties: WriterPropertiesPtr,
        buf: &'a mut TrackedWrite<W>,
        row_group_ordinal: i16,
        file_encryptor: Option<Arc<FileEncryptor>>,
        on_close: Option<OnCloseRowGroup<'a>>,
    ) -> Self {
        let num_columns = schema_descr.num_columns();
        Self {
            buf,
            on_close,
            total_rows_written: None,
            descr: schema_descr,
            props: properties,
            column_index: 0,
            row_group_metadata: None,
            column_chunks: Vec::with_capacity(num_columns),
            row_group_ordinal,
            file_encryptor,
            total_bytes_written: 0,
        }
    }

    /// Returns the next column writer, if available, using the factory function;
    /// otherwise returns `None`.
    pub(crate) fn next_column_with_factory<'b, F, C>(&'b mut self, factory: F) -> Result<Option<C>>
    where
        F: FnOnce(
            crate::schema::types::ColumnDescPtr,
            &'b WriterPropertiesPtr,
            Box<dyn PageWriter + 'b>,
            OnCloseColumnChunk<'b>,
        ) -> Result<C>,
    {
        self.assert_previous_writer_closed()?;

        if self.column_index >= self.descr.num_columns() {
            return Ok(None);
        }
        let column = self.descr.column(self.column_index);
        let column_ordinal = self.column_index;
        self.column_index += 1;

        let page_encryptor = match &self.file_encryptor {
            Some(file_encryptor) => PageEncryptor::try_new(
                file_encryptor,
                self.row_group_ordinal as usize,
                column_ordinal,
                &column.path().string(),
            )?,
            None => None,
        };
        let page_writer = Box::new(
            SerializedPageWriter::new(self.buf).with_page_encryptor(page_encryptor),
        );

        let total_bytes_written = &mut self.total_bytes_written;
        let total_rows_written = &mut self.total_rows_written;
        let column_chunks = &mut self.column_chunks;
        let file_encryptor = self.file_encryptor.clone();
        let row_group_ordinal = self.row_group_ordinal;

        let on_close = move |r: ColumnCloseResult| {
            // Update row group writer metrics
            *total_bytes_written += r.bytes_written;

            let metadata = match &file_encryptor {
                Some(file_encryptor) => apply_column_crypto_metadata(
                    r.metadata,
                    file_encryptor,
                    row_group_ordinal as usize,
                    column_ordinal,
                )?,
                None => r.metadata,
            };
            column_chunks.push(metadata);

            if let Some(rows) = *total_rows_written {
                if rows != r.rows_written {
                    return Err(general_err!(
                        "Incorrect number of rows, expected {} != {} rows",
                        rows,
                        r.rows_written
                    ));
                }
            } else {
                *total_rows_written = Some(r.rows_written);
            }

            Ok(())
        };

        Ok(Some(factory(
            column,
            &self.props,
            page_writer,
            Box::new(on_close),
        )?))
    }

    /// Returns the next column writer, if available; otherwise returns `None`.
    /// In case of any IO error or Thrift error, or if row group writer has already
    /// been closed returns `Err`.
    pub fn next_column(&mut self) -> Result<Option<SerializedColumnWriter<'_>>> {
        self.next_column_with_factory(|descr, props, page_writer, on_close| {
            let column_writer = get_column_writer(descr, props.clone(), page_writer);
            Ok(SerializedColumnWriter::new(column_writer, Some(on_close)))
        })
    }

    /// Closes this row group writer and returns row group metadata.
    ///
    /// Can be called multiple times. In subsequent calls it will result in no-op and
    /// return the already created row group metadata.
    pub fn close(mut self) -> Result<RowGroupMetaDataPtr> {
        if self.row_group_metadata.is_none() {
            self.assert_previous_writer_closed()?;

            let column_chunks = std::mem::take(&mut self.column_chunks);
            let first_column_file_offset = column_chunks.first().map(|c| c.file_offset());

            let mut builder = RowGroupMetaData::builder(self.descr.clone())
                .set_column_metadata(column_chunks)
                .set_total_byte_size(self.total_bytes_written as i64)
                .set_num_rows(self.total_rows_written.unwrap_or(0) as i64)
                .set_ordinal(self.row_group_ordinal);

            if let Some(file_offset) = first_column_file_offset {
                builder = builder.set_file_offset(file_offset);
            }

            let row_group_metadata = builder.build()?;

            let metadata = Arc::new(row_group_metadata);
            self.row_group_metadata = Some(metadata.clone());

            if let Some(on_close) = self.on_close.take() {
                on_close(metadata)?
            }
        }

        let metadata = self.row_group_metadata.as_ref().unwrap().clone();
        Ok(metadata)
    }

    #[inline]
    fn assert_previous_writer_closed(&self) -> Result<()> {
        if self.column_index != self.column_chunks.len() {
            Err(general_err!("Previous column writer was not closed"))
        } else {
            Ok(())
        }
    }
}

/// A wrapper around a [`ColumnWriter`] that invokes a callback on [`Self::close`]
pub struct SerializedColumnWriter<'a> {
    inner: ColumnWriter<'a>,
    on_close: Option<OnCloseColumnChunk<'a>>,
}

impl<'a> SerializedColumnWriter<'a> {
    /// Create a new [`SerializedColumnWriter`] from a [`ColumnWriter`] and an
    /// optional callback to be invoked on [`Self::close`]
    pub fn new(inner: ColumnWriter<'a>, on_close: Option<OnCloseColumnChunk<'a>>) -> Self {
        Self { inner, on_close }
    }

    /// Returns a reference to an untyped [`ColumnWriter`]
    pub fn untyped(&mut self) -> &mut ColumnWriter<'a> {
        &mut self.inner
    }

    /// Returns a reference to a typed [`ColumnWriterImpl`]
    pub fn typed<T: DataType>(&mut self) -> &mut ColumnWriterImpl<'a, T> {
        get_typed_column_writer_mut(&mut self.inner)
    }

    /// Close this [`SerializedColumnWriter`]
    pub fn close(mut self) -> Result<()> {
        let r = self.inner.close()?;
        if let Some(on_close) = self.on_close.take() {
            on_close(r)?
        }

        Ok(())
    }
}

/// A serialized implementation for Parquet [`PageWriter`].
/// Writes and serializes pages and metadata directly into the output stream.
///
/// `SerializedPageWriter` should not be used after calling `close()`.
pub struct SerializedPageWriter<'a, W: Write> {
    sink: &'a mut TrackedWrite<W>,
    page_encryptor: Option<PageEncryptor>,
}

impl<'a, W: Write> SerializedPageWriter<'a, W> {
    /// Creates new page writer.
    pub fn new(sink: &'a mut TrackedWrite<W>) -> Self {
        Self {
            sink,
            page_encryptor: None,
        }
    }

    /// Sets the encryptor used for the pages and headers of one encrypted column
    /// chunk.
    pub(crate) fn with_page_encryptor(mut self, page_encryptor: Option<PageEncryptor>) -> Self {
        self.page_encryptor = page_encryptor;
        self
    }
}

impl<W: Write + Send> PageWriter for SerializedPageWriter<'_, W> {
    fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec> {
        do_write_page(page, self.sink, &mut self.page_encryptor)
    }

    fn write_metadata(&mut self, metadata: &ColumnChunkMetaData) -> Result<()> {
        do_write_metadata(metadata, self.sink, &mut self.page_encryptor)
    }

    fn close(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// A [`PageWriter`] that buffers an entire column chunk in memory, appending it to
/// the shared sink in a single write when the chunk is closed.
///
/// Page offsets are recorded relative to the in-memory buffer; the writer reports
/// the position the buffer will land at through [`PageWriter::rebase_offset`], which
/// is stable because this writer holds the sink exclusively. The trailing column
/// metadata is also written to the buffer, so the whole chunk reaches the sink as
/// one contiguous write.
pub struct BufferedPageWriter<'a, W: Write> {
    sink: &'a mut TrackedWrite<W>,
    buffer: TrackedWrite<Vec<u8>>,
    page_encryptor: Option<PageEncryptor>,
}

impl<'a, W: Write> BufferedPageWriter<'a, W> {
    /// Creates a page writer buffering the chunk bound for `sink`.
    pub fn new(sink: &'a mut TrackedWrite<W>) -> Self {
        Self {
            sink,
            buffer: TrackedWrite::new(Vec::new()),
            page_encryptor: None,
        }
    }

    /// Sets the encryptor used for the pages and headers of one encrypted column
    /// chunk.
    pub(crate) fn with_page_encryptor(mut self, page_encryptor: Option<PageEncryptor>) -> Self {
        self.page_encryptor = page_encryptor;
        self
    }
}

impl<W: Write + Send> PageWriter for BufferedPageWriter<'_, W> {
    fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec> {
        do_write_page(page, &mut self.buffer, &mut self.page_encryptor)
    }

    fn write_metadata(&mut self, metadata: &ColumnChunkMetaData) -> Result<()> {
        do_write_metadata(metadata, &mut self.buffer, &mut self.page_encryptor)
    }

    fn rebase_offset(&self) -> u64 {
        self.sink.bytes_written() as u64
    }

    fn close(&mut self) -> Result<()> {
        let buffer = std::mem::replace(&mut self.buffer, TrackedWrite::new(Vec::new()));
        self.sink.write_all(&buffer.into_inner())?;
        self.sink.flush()?;
        Ok(())
    }
}

/// Serializes a page header into `sink`, encrypting it when the chunk is encrypted.
/// Returns the number of bytes written.
fn serialize_page_header<W: Write>(
    header: PageHeader,
    sink: &mut TrackedWrite<W>,
    page_encryptor: &mut Option<PageEncryptor>,
) -> Result<usize> {
    let start_pos = sink.bytes_written();
    match page_encryptor {
        Some(page_encryptor) => {
            page_encryptor.encrypt_page_header(&header, sink)?;
        }
        None => {
            let mut protocol = ThriftCompactOutputProtocol::new(&mut *sink);
            header.write_thrift(&mut protocol)?;
        }
    }
    Ok(sink.bytes_written() - start_pos)
}

/// The shared page write routine: builds the header, optionally encrypts the
/// payload, and writes header then payload to `sink`, tracking offsets.
fn do_write_page<W: Write>(
    page: CompressedPage,
    sink: &mut TrackedWrite<W>,
    page_encryptor: &mut Option<PageEncryptor>,
) -> Result<PageWriteSpec> {
    // Encrypt the payload first so the header records the on-disk size
    let page = match page_encryptor {
        Some(page_encryptor) => {
            let encrypted = page_encryptor.encrypt_page(&page)?;
            page.with_new_buffer(encrypted)
        }
        None => page,
    };

    let uncompressed_size = page.uncompressed_size();
    let compressed_size = page.compressed_size();
    let num_values = page.num_values();
    let encoding = page.encoding();
    let page_type = page.page_type();

    let mut page_header = PageHeader {
        r#type: page_type,
        uncompressed_page_size: uncompressed_size as i32,
        compressed_page_size: compressed_size as i32,
        crc: None,
        data_page_header: None,
        dictionary_page_header: None,
    };

    match page.compressed_page() {
        Page::DataPage {
            def_level_encoding,
            rep_level_encoding,
            statistics,
            ..
        } => {
            page_header.data_page_header = Some(DataPageHeader {
                num_values: num_values as i32,
                encoding,
                definition_level_encoding: *def_level_encoding,
                repetition_level_encoding: *rep_level_encoding,
                statistics: statistics_to_thrift(statistics.as_ref()),
            });
        }
        Page::DictionaryPage { is_sorted, .. } => {
            page_header.dictionary_page_header = Some(DictionaryPageHeader {
                num_values: num_values as i32,
                encoding,
                is_sorted: Some(*is_sorted),
            });
        }
    }

    let start_pos = sink.bytes_written() as u64;

    let header_size = serialize_page_header(page_header, sink, page_encryptor)?;
    sink.write_all(page.data())?;

    if page_type == PageType::DATA_PAGE {
        if let Some(page_encryptor) = page_encryptor {
            page_encryptor.increment_page();
        }
    }

    let mut spec = PageWriteSpec::new();
    spec.page_type = page_type;
    spec.uncompressed_size = uncompressed_size + header_size;
    spec.compressed_size = compressed_size + header_size;
    spec.offset = start_pos;
    spec.bytes_written = sink.bytes_written() as u64 - start_pos;
    // Number of values is incremented for data pages only
    if page_type == PageType::DATA_PAGE {
        spec.num_values = num_values;
    }

    Ok(spec)
}

/// Writes the trailing `ColumnMetaData` copy after the chunk's pages.
fn do_write_metadata<W: Write>(
    metadata: &ColumnChunkMetaData,
    sink: &mut TrackedWrite<W>,
    page_encryptor: &mut Option<PageEncryptor>,
) -> Result<()> {
    match page_encryptor {
        Some(page_encryptor) => page_encryptor.encrypt_column_metadata(metadata, sink),
        None => {
            let mut protocol = ThriftCompactOutputProtocol::new(&mut *sink);
            serialize_column_meta_data(metadata, &mut protocol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use std::fs::File;
    use std::sync::Arc;

    use crate::basic::{Compression, Encoding, Repetition, Type};
    use crate::column::page::PageReader;
    use crate::compression::create_codec;
    use crate::data_type::Int32Type;
    use crate::encodings::decoding::{Decoder, PlainDecoder};
    use crate::file::metadata::KeyValue;
    use crate::file::properties::{ReaderProperties, WriterProperties};
    use crate::file::reader::{FileReader, Length};
    use crate::file::serialized_reader::{SerializedFileReader, SerializedPageReader};
    use crate::file::statistics::Statistics;
    use crate::schema::types;

    fn test_schema() -> TypePtr {
        let field = Arc::new(
            types::Type::primitive_type_builder("col1", Type::INT32)
                .with_repetition(Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        Arc::new(
            types::Type::group_type_builder("schema")
                .with_fields(vec![field])
                .build()
                .unwrap(),
        )
    }

    /// Reads all values of the single INT32 column of a row group.
    fn read_int32_column(reader: &dyn FileReader, row_group: usize) -> Vec<i32> {
        let rg = reader.get_row_group(row_group).unwrap();
        let num_values = rg.metadata().column(0).num_values() as usize;
        let mut page_reader = rg.get_column_page_reader(0).unwrap();

        let mut values = Vec::new();
        while let Some(page) = page_reader.get_next_page().unwrap() {
            if let crate::column::page::Page::DataPage {
                buf, num_values: n, ..
            } = page
            {
                let mut decoder = PlainDecoder::<Int32Type>::new(0);
                decoder.set_data(buf, n as usize).unwrap();
                let mut out = vec![0i32; n as usize];
                decoder.get(&mut out).unwrap();
                values.extend_from_slice(&out);
            }
        }
        assert_eq!(values.len(), num_values);
        values
    }

    #[test]
    fn test_row_group_writer_error_not_all_columns_written() {
        let file = tempfile::tempfile().unwrap();
        let schema = test_schema();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
        let row_group_writer = writer.next_row_group().unwrap();
        let res = row_group_writer.close();
        assert!(res.is_err());
        if let Err(err) = res {
            assert_eq!(
                format!("{err}"),
                "Parquet error: Column length mismatch: 1 != 0"
            );
        }
    }

    #[test]
    fn test_row_group_writer_num_records_mismatch() {
        let file = tempfile::tempfile().unwrap();
        let fields = vec![
            Arc::new(
                types::Type::primitive_type_builder("col1", Type::INT32)
                    .with_repetition(Repetition::REQUIRED)
                    .build()
                    .unwrap(),
            ),
            Arc::new(
                types::Type::primitive_type_builder("col2", Type::INT32)
                    .with_repetition(Repetition::REQUIRED)
                    .build()
                    .unwrap(),
            ),
        ];
        let schema = Arc::new(
            types::Type::group_type_builder("schema")
                .with_fields(fields)
                .build()
                .unwrap(),
        );
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();
        let mut row_group_writer = writer.next_row_group().unwrap();

        let mut col_writer = row_group_writer.next_column().unwrap().unwrap();
        col_writer
            .typed::<Int32Type>()
            .write_batch(&[1, 2, 3], None, None)
            .unwrap();
        col_writer.close().unwrap();

        let mut col_writer = row_group_writer.next_column().unwrap().unwrap();
        col_writer
            .typed::<Int32Type>()
            .write_batch(&[1, 2], None, None)
            .unwrap();

        let err = col_writer.close().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parquet error: Incorrect number of rows, expected 3 != 2 rows"
        );
    }

    #[test]
    fn test_file_writer_empty_file() {
        let file = tempfile::tempfile().unwrap();

        let schema = test_schema();
        let props = Arc::new(WriterProperties::builder().build());
        let writer =
            SerializedFileWriter::new(file.try_clone().unwrap(), schema, props).unwrap();
        writer.close().unwrap();

        let reader = SerializedFileReader::new(file).unwrap();
        assert_eq!(reader.num_row_groups(), 0);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
    }

    #[test]
    fn test_file_writer_with_metadata() {
        let file = tempfile::tempfile().unwrap();

        let schema = test_schema();
        let props = Arc::new(
            WriterProperties::builder()
                .set_key_value_metadata(Some(vec![KeyValue::new(
                    "key".to_string(),
                    "value".to_string(),
                )]))
                .build(),
        );
        let writer =
            SerializedFileWriter::new(file.try_clone().unwrap(), schema, props).unwrap();
        writer.close().unwrap();

        let reader = SerializedFileReader::new(file).unwrap();
        assert_eq!(
            reader
                .metadata()
                .file_metadata()
                .key_value_metadata()
                .to_owned()
                .unwrap()
                .len(),
            1
        );
    }

    /// File write-read roundtrip.
    /// `data` consists of arrays of values for each row group.
    fn test_file_roundtrip(file: File, data: Vec<Vec<i32>>) -> FileMetaData {
        let schema = test_schema();
        let props = Arc::new(WriterProperties::builder().build());
        let mut file_writer =
            SerializedFileWriter::new(file.try_clone().unwrap(), schema, props).unwrap();
        let mut rows: i64 = 0;

        for (idx, subset) in data.iter().enumerate() {
            let mut row_group_writer = file_writer.next_row_group().unwrap();
            if let Some(mut writer) = row_group_writer.next_column().unwrap() {
                rows += writer
                    .typed::<Int32Type>()
                    .write_batch(&subset[..], None, None)
                    .unwrap() as i64;
                writer.close().unwrap();
            }
            let last_group = row_group_writer.close().unwrap();
            let flushed = file_writer.flushed_row_groups();
            assert_eq!(flushed.len(), idx + 1);
            assert_eq!(flushed[idx].as_ref(), last_group.as_ref());
        }
        let file_metadata = file_writer.close().unwrap();

        let reader = SerializedFileReader::new(file).unwrap();
        assert_eq!(reader.num_row_groups(), data.len());
        assert_eq!(
            reader.metadata().file_metadata().num_rows(),
            rows,
            "row count in metadata not equal to number of rows written"
        );
        for (i, item) in data.iter().enumerate().take(reader.num_row_groups()) {
            assert_eq!(&read_int32_column(&reader, i), item);
        }
        file_metadata
    }

    #[test]
    fn test_file_writer_single_row_group() {
        let file = tempfile::tempfile().unwrap();
        test_file_roundtrip(file, vec![vec![1, 2, 3, 4, 5]]);
    }

    #[test]
    fn test_file_writer_multiple_row_groups() {
        let file = tempfile::tempfile().unwrap();
        test_file_roundtrip(
            file,
            vec![
                vec![1, 2, 3, 4, 5],
                vec![1, 2, 3],
                vec![1],
                vec![1, 2, 3, 4, 5, 6],
            ],
        );
    }

    #[test]
    fn test_file_writer_multiple_large_row_groups() {
        let file = tempfile::tempfile().unwrap();
        test_file_roundtrip(
            file,
            vec![vec![123; 1024], vec![124; 1000], vec![125; 15], vec![]],
        );
    }

    #[test]
    fn test_bytes_writer_roundtrip() {
        let mut buffer = vec![];
        let schema = test_schema();
        {
            let props = Arc::new(WriterProperties::builder().build());
            let mut writer =
                SerializedFileWriter::new(&mut buffer, schema, props).unwrap();

            let mut row_group_writer = writer.next_row_group().unwrap();
            let mut col_writer = row_group_writer.next_column().unwrap().unwrap();
            col_writer
                .typed::<Int32Type>()
                .write_batch(&[17, 18, 19], None, None)
                .unwrap();
            col_writer.close().unwrap();
            row_group_writer.close().unwrap();
            writer.close().unwrap();
        }

        assert_eq!(&buffer[0..4], b"PAR1");
        assert_eq!(&buffer[buffer.len() - 4..], b"PAR1");

        let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
        assert_eq!(read_int32_column(&reader, 0), vec![17, 18, 19]);
    }

    #[test]
    fn test_buffered_page_writer_rebases_offsets() {
        let mut buffer = vec![];
        let schema = test_schema();
        let descr = Arc::new(SchemaDescriptor::new(schema));
        let props = Arc::new(WriterProperties::builder().build());

        let mut sink = TrackedWrite::new(&mut buffer);
        // leading bytes simulate data already written to the file
        sink.write_all(b"PAR1").unwrap();

        let metadata = {
            let page_writer: Box<dyn PageWriter + '_> =
                Box::new(BufferedPageWriter::new(&mut sink));
            let column_writer = get_column_writer(descr.column(0), props, page_writer);
            let mut typed = crate::column::writer::get_typed_column_writer::<Int32Type>(
                column_writer,
            );
            typed.write_batch(&[1, 2, 3], None, None).unwrap();
            typed.close().unwrap().metadata
        };

        // pages were buffered, so the first page lands right after the magic
        assert_eq!(metadata.data_page_offset(), 4);
        assert_eq!(
            metadata.file_offset(),
            metadata.data_page_offset() + metadata.compressed_size()
        );
        assert!(sink.bytes_written() > 4);
    }

    #[test]
    fn test_buffered_page_writer_with_encryption() {
        use crate::encryption::decrypt::{CryptoContext, FileDecryptionProperties};
        use crate::file::metadata::ColumnCryptoMetaData;

        let key = b"0123456789012345".to_vec();
        let encryption_properties = Arc::new(
            FileEncryptionProperties::builder(key.clone()).build().unwrap(),
        );
        let file_encryptor = FileEncryptor::new(encryption_properties).unwrap();

        let mut buffer = vec![];
        let mut sink = TrackedWrite::new(&mut buffer);
        {
            let page_encryptor =
                PageEncryptor::try_new(&file_encryptor, 0, 0, "col").unwrap();
            let mut page_writer =
                BufferedPageWriter::new(&mut sink).with_page_encryptor(page_encryptor);

            let page = Page::DataPage {
                buf: Bytes::from(vec![3, 0, 0, 0, 4, 0, 0, 0]),
                num_values: 2,
                encoding: Encoding::PLAIN,
                def_level_encoding: Encoding::RLE,
                rep_level_encoding: Encoding::RLE,
                statistics: None,
            };
            page_writer.write_page(CompressedPage::new(page, 8)).unwrap();
            page_writer.close().unwrap();
        }
        let len = buffer.len();
        assert!(len > 8);

        // decrypt the chunk back with the matching file AAD
        let decryption_properties =
            FileDecryptionProperties::builder(key).build().unwrap();
        let file_decryptor = crate::encryption::decrypt::FileDecryptor::new(
            &decryption_properties,
            None,
            file_encryptor.aad_file_unique().clone(),
            vec![],
        )
        .unwrap();
        let crypto_context = CryptoContext::for_column(
            &file_decryptor,
            &ColumnCryptoMetaData::EncryptionWithFooterKey,
            0,
            0,
        )
        .unwrap();

        let mut page_reader = SerializedPageReader::new(
            Arc::new(Bytes::from(buffer)),
            0,
            len,
            2,
            Compression::UNCOMPRESSED,
            Type::INT32,
            Some(crypto_context),
        )
        .unwrap()
        .with_dictionary_page_possible(false);

        let page = page_reader.get_next_page().unwrap().unwrap();
        assert_eq!(page.num_values(), 2);
        assert_eq!(page.buffer().as_ref(), &[3, 0, 0, 0, 4, 0, 0, 0]);
    }

    #[test]
    fn test_page_roundtrip_with_compression() {
        let codec = Compression::SNAPPY;
        let mut compressor = create_codec(codec).unwrap().unwrap();

        let raw_values: Vec<u8> = (0..64u8).flat_map(|i| [i, 0, 0, 0]).collect();
        let mut compressed_values = Vec::new();
        compressor.compress(&raw_values, &mut compressed_values).unwrap();

        let page = Page::DataPage {
            buf: Bytes::from(compressed_values),
            num_values: 64,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: Some(Statistics::int32(Some(0), Some(63), None, 0, false)),
        };
        let compressed_page = CompressedPage::new(page, raw_values.len());

        let mut buffer = Vec::new();
        {
            let mut sink = TrackedWrite::new(&mut buffer);
            let mut page_writer = SerializedPageWriter::new(&mut sink);
            let spec = page_writer.write_page(compressed_page).unwrap();
            assert_eq!(spec.offset, 0);
            assert_eq!(spec.num_values, 64);
            page_writer.close().unwrap();
        }

        let len = buffer.len();
        let mut page_reader = SerializedPageReader::new(
            Arc::new(Bytes::from(buffer)),
            0,
            len,
            64,
            codec,
            Type::INT32,
            None,
        )
        .unwrap();

        let page = page_reader.get_next_page().unwrap().unwrap();
        assert_eq!(page.num_values(), 64);
        assert_eq!(page.buffer().as_ref(), raw_values.as_slice());
        let stats = page.statistics().unwrap();
        assert_eq!(stats.max_bytes_opt().unwrap(), 63i32.to_le_bytes());
        assert!(page_reader.get_next_page().unwrap().is_none());
    }

    #[test]
    fn test_file_roundtrip_with_reader_properties() {
        let file = tempfile::tempfile().unwrap();
        test_file_roundtrip(file.try_clone().unwrap(), vec![vec![7; 100]]);

        // a tail window smaller than the footer still parses via the second read
        let props = ReaderProperties::builder().set_footer_read_size(16).build();
        let metadata =
            crate::file::footer::parse_metadata_with_properties(&file, &props).unwrap();
        assert_eq!(metadata.file_metadata().num_rows(), 100);
        assert!(file.len() > 0);
    }
}

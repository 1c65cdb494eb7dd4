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

//! Contains column writer API.

use std::collections::{BTreeSet, VecDeque};

use bytes::Bytes;

use crate::basic::{Compression, ConvertedType, Encoding, PageType, SortOrder, Type};
use crate::column::page::{CompressedPage, Page, PageWriteSpec, PageWriter};
use crate::column::writer::encoder::{ColumnValueEncoder, ColumnValueEncoderImpl};
use crate::compression::{Codec, create_codec};
use crate::data_type::DataType;
use crate::data_type::private::ParquetValueType;
use crate::encodings::levels::LevelEncoder;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::ColumnChunkMetaData;
use crate::file::page_encoding_stats::PageEncodingStats;
use crate::file::properties::{EnabledStatistics, WriterPropertiesPtr};
use crate::file::statistics::ValueStatistics;
use crate::schema::types::{ColumnDescPtr, ColumnDescriptor};

pub mod encoder;

/// Column writer for a Parquet type.
pub enum ColumnWriter<'a> {
    /// Column writer for boolean type
    BoolColumnWriter(ColumnWriterImpl<'a, crate::data_type::BoolType>),
    /// Column writer for int32 type
    Int32ColumnWriter(ColumnWriterImpl<'a, crate::data_type::Int32Type>),
    /// Column writer for int64 type
    Int64ColumnWriter(ColumnWriterImpl<'a, crate::data_type::Int64Type>),
    /// Column writer for int96 (timestamp) type
    Int96ColumnWriter(ColumnWriterImpl<'a, crate::data_type::Int96Type>),
    /// Column writer for float type
    FloatColumnWriter(ColumnWriterImpl<'a, crate::data_type::FloatType>),
    /// Column writer for double type
    DoubleColumnWriter(ColumnWriterImpl<'a, crate::data_type::DoubleType>),
    /// Column writer for byte array type
    ByteArrayColumnWriter(ColumnWriterImpl<'a, crate::data_type::ByteArrayType>),
    /// Column writer for fixed length byte array type
    FixedLenByteArrayColumnWriter(ColumnWriterImpl<'a, crate::data_type::FixedLenByteArrayType>),
}

impl<'a> ColumnWriter<'a> {
    /// Close this [`ColumnWriter`]
    pub fn close(self) -> Result<ColumnCloseResult> {
        match self {
            Self::BoolColumnWriter(typed) => typed.close(),
            Self::Int32ColumnWriter(typed) => typed.close(),
            Self::Int64ColumnWriter(typed) => typed.close(),
            Self::Int96ColumnWriter(typed) => typed.close(),
            Self::FloatColumnWriter(typed) => typed.close(),
            Self::DoubleColumnWriter(typed) => typed.close(),
            Self::ByteArrayColumnWriter(typed) => typed.close(),
            Self::FixedLenByteArrayColumnWriter(typed) => typed.close(),
        }
    }
}

/// Gets a specific column writer corresponding to column descriptor `descr`.
pub fn get_column_writer<'a>(
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    page_writer: Box<dyn PageWriter + 'a>,
) -> ColumnWriter<'a> {
    use crate::data_type::*;
    match descr.physical_type() {
        Type::BOOLEAN => {
            ColumnWriter::BoolColumnWriter(ColumnWriterImpl::<BoolType>::new(descr, props, page_writer))
        }
        Type::INT32 => {
            ColumnWriter::Int32ColumnWriter(ColumnWriterImpl::<Int32Type>::new(descr, props, page_writer))
        }
        Type::INT64 => {
            ColumnWriter::Int64ColumnWriter(ColumnWriterImpl::<Int64Type>::new(descr, props, page_writer))
        }
        Type::INT96 => {
            ColumnWriter::Int96ColumnWriter(ColumnWriterImpl::<Int96Type>::new(descr, props, page_writer))
        }
        Type::FLOAT => {
            ColumnWriter::FloatColumnWriter(ColumnWriterImpl::<FloatType>::new(descr, props, page_writer))
        }
        Type::DOUBLE => ColumnWriter::DoubleColumnWriter(ColumnWriterImpl::<DoubleType>::new(
            descr,
            props,
            page_writer,
        )),
        Type::BYTE_ARRAY => ColumnWriter::ByteArrayColumnWriter(
            ColumnWriterImpl::<ByteArrayType>::new(descr, props, page_writer),
        ),
        Type::FIXED_LEN_BYTE_ARRAY => ColumnWriter::FixedLenByteArrayColumnWriter(
            ColumnWriterImpl::<FixedLenByteArrayType>::new(descr, props, page_writer),
        ),
    }
}

/// Gets a typed column writer for the specific type `T`, by "up-casting" `col_writer`
/// of non-generic type to a generic column writer type `ColumnWriterImpl`.
///
/// Panics if actual enum value for `col_writer` does not match the type `T`.
pub fn get_typed_column_writer<T: DataType>(col_writer: ColumnWriter) -> ColumnWriterImpl<T> {
    T::get_column_writer(col_writer).unwrap_or_else(|| {
        panic!(
            "Failed to convert column writer into a typed column writer for `{}` type",
            T::get_physical_type()
        )
    })
}

/// Similar to `get_typed_column_writer` but returns a mutable reference.
pub fn get_typed_column_writer_mut<'a, 'b: 'a, T: DataType>(
    col_writer: &'a mut ColumnWriter<'b>,
) -> &'a mut ColumnWriterImpl<'b, T> {
    T::get_column_writer_mut(col_writer).unwrap_or_else(|| {
        panic!(
            "Failed to convert column writer into a typed column writer for `{}` type",
            T::get_physical_type()
        )
    })
}

/// Metadata returned by [`GenericColumnWriter::close`]
#[derive(Debug, Clone)]
pub struct ColumnCloseResult {
    /// The total number of bytes written
    pub bytes_written: u64,
    /// The total number of rows written
    pub rows_written: u64,
    /// Metadata for this column chunk
    pub metadata: ColumnChunkMetaData,
}

// Metrics per page
#[derive(Default)]
struct PageMetrics {
    num_buffered_values: u32,
    num_buffered_rows: u32,
    num_page_nulls: u64,
}

// Metrics per column writer
struct ColumnMetrics<T> {
    total_bytes_written: u64,
    total_rows_written: u64,
    total_uncompressed_size: u64,
    total_compressed_size: u64,
    total_num_values: u64,
    dictionary_page_offset: Option<u64>,
    data_page_offset: Option<u64>,
    min_column_value: Option<T>,
    max_column_value: Option<T>,
    num_column_nulls: u64,
    column_distinct_count: Option<u64>,
}

/// Typed column writer for a primitive column.
pub type ColumnWriterImpl<'a, T> = GenericColumnWriter<'a, ColumnValueEncoderImpl<T>>;

/// Generic column writer for a primitive column, driving a [`ColumnValueEncoder`]
/// and assembling v1 data pages.
pub struct GenericColumnWriter<'a, E: ColumnValueEncoder> {
    // Column writer properties
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    statistics_enabled: EnabledStatistics,

    page_writer: Box<dyn PageWriter + 'a>,
    codec: Compression,
    compressor: Option<Box<dyn Codec>>,
    encoder: E,

    page_metrics: PageMetrics,
    // Metrics per column writer
    column_metrics: ColumnMetrics<E::T>,

    /// The order of encodings within the generated metadata does not impact its
    /// meaning, but we use a BTreeSet so that the output is deterministic
    encodings: BTreeSet<Encoding>,
    /// Number of pages written per page type and encoding, in first-seen order
    encoding_stats: Vec<PageEncodingStats>,
    // Reused buffers
    def_levels_sink: Vec<i16>,
    rep_levels_sink: Vec<i16>,
    // Data pages buffered while the dictionary encoding is still in play; they are
    // flushed after the dictionary page once its final size is known.
    data_pages: VecDeque<CompressedPage>,
}

impl<'a, E: ColumnValueEncoder> GenericColumnWriter<'a, E> {
    /// Creates a new column writer for `descr` writing pages to `page_writer`.
    pub fn new(
        descr: ColumnDescPtr,
        props: WriterPropertiesPtr,
        page_writer: Box<dyn PageWriter + 'a>,
    ) -> Self {
        let codec = props.compression(descr.path());
        let compressor = create_codec(codec).unwrap();
        let encoder = E::try_new(&descr, props.as_ref()).unwrap();

        // A sort order the format cannot represent disables statistics entirely.
        let statistics_enabled = if descr.sort_order() == SortOrder::UNDEFINED {
            EnabledStatistics::None
        } else {
            props.statistics_enabled(descr.path())
        };

        let mut encodings = BTreeSet::new();
        // Used for level information
        encodings.insert(Encoding::RLE);

        Self {
            descr,
            props,
            statistics_enabled,
            page_writer,
            codec,
            compressor,
            encoder,
            def_levels_sink: vec![],
            rep_levels_sink: vec![],
            data_pages: VecDeque::new(),
            page_metrics: PageMetrics::default(),
            column_metrics: ColumnMetrics {
                total_bytes_written: 0,
                total_rows_written: 0,
                total_uncompressed_size: 0,
                total_compressed_size: 0,
                total_num_values: 0,
                dictionary_page_offset: None,
                data_page_offset: None,
                min_column_value: None,
                max_column_value: None,
                num_column_nulls: 0,
                column_distinct_count: None,
            },
            encodings,
            encoding_stats: vec![],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_batch_internal(
        &mut self,
        values: &[E::T],
        value_indices: Option<&[usize]>,
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
        min: Option<&E::T>,
        max: Option<&E::T>,
        distinct_count: Option<u64>,
    ) -> Result<usize> {
        // Check data page limits only after the values of a mini batch have been
        // written. The mini batching bounds how far past `data_pagesize_limit` a page
        // can grow when the caller hands over a large batch in one call.
        let num_levels = match def_levels {
            Some(def_levels) => def_levels.len(),
            None => values.len(),
        };

        // Find out number of batches to process.
        let write_batch_size = self.props.write_batch_size();
        let num_batches = num_levels / write_batch_size;

        // If only computing chunk-level statistics, compute them here; page-level
        // statistics are computed in `write_mini_batch` and used to update chunk
        // statistics in `add_data_page`.
        if self.statistics_enabled == EnabledStatistics::Chunk {
            match (min, max) {
                (Some(min), Some(max)) => {
                    update_min(&self.descr, min, &mut self.column_metrics.min_column_value);
                    update_max(&self.descr, max, &mut self.column_metrics.max_column_value);
                }
                (None, Some(_)) | (Some(_), None) => {
                    panic!("min/max should be both set or both None")
                }
                (None, None) => {
                    if let Some((min, max)) = self.encoder.min_max(values, value_indices) {
                        update_min(&self.descr, &min, &mut self.column_metrics.min_column_value);
                        update_max(&self.descr, &max, &mut self.column_metrics.max_column_value);
                    }
                }
            };
        }

        // We can only set the distinct count if there are no other writes
        if self.encoder.num_values() == 0 && self.column_metrics.total_num_values == 0 {
            self.column_metrics.column_distinct_count = distinct_count;
        } else {
            self.column_metrics.column_distinct_count = None;
        }

        let mut values_offset = 0;
        let mut levels_offset = 0;
        for _ in 0..num_batches {
            values_offset += self.write_mini_batch(
                values,
                values_offset,
                value_indices,
                write_batch_size,
                def_levels.map(|lv| &lv[levels_offset..levels_offset + write_batch_size]),
                rep_levels.map(|lv| &lv[levels_offset..levels_offset + write_batch_size]),
            )?;
            levels_offset += write_batch_size;
        }

        values_offset += self.write_mini_batch(
            values,
            values_offset,
            value_indices,
            num_levels - levels_offset,
            def_levels.map(|lv| &lv[levels_offset..]),
            rep_levels.map(|lv| &lv[levels_offset..]),
        )?;

        // Return total number of values processed.
        Ok(values_offset)
    }

    /// Writes batch of values, definition levels and repetition levels.
    /// Returns number of values processed (written).
    ///
    /// If definition and repetition levels are provided, we write fully those levels
    /// and select how many values to write (this number will be returned), since
    /// number of actual written values may be smaller than provided values.
    ///
    /// If only values are provided, then all values are written and the length of
    /// of the values buffer is returned.
    ///
    /// Definition and/or repetition levels can be omitted, if values are
    /// non-nullable and/or non-repeated.
    pub fn write_batch(
        &mut self,
        values: &[E::T],
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
    ) -> Result<usize> {
        self.write_batch_internal(values, None, def_levels, rep_levels, None, None, None)
    }

    /// Writes a batch of values with their definition levels, where `values` is a
    /// *spaced* array: it has one slot per level, and slots at positions whose
    /// definition level is below the maximum are gaps whose content is never read.
    ///
    /// This is the natural layout for writers assembling batches from a validity
    /// bitmap, avoiding a compaction pass over the values.
    pub fn write_batch_spaced(
        &mut self,
        values: &[E::T],
        def_levels: &[i16],
        rep_levels: Option<&[i16]>,
    ) -> Result<usize> {
        if values.len() < def_levels.len() {
            return Err(general_err!(
                "Expected {} spaced value slots, but have only {}",
                def_levels.len(),
                values.len()
            ));
        }
        let max_def_level = self.descr.max_def_level();
        let value_indices: Vec<usize> = def_levels
            .iter()
            .enumerate()
            .filter(|(_, level)| **level == max_def_level)
            .map(|(idx, _)| idx)
            .collect();
        self.write_batch_internal(
            values,
            Some(&value_indices),
            Some(def_levels),
            rep_levels,
            None,
            None,
            None,
        )
    }

    /// Writer may optionally provide pre-calculated statistics for use when computing
    /// chunk-level statistics.
    ///
    /// Note: [`crate::file::properties::WriterProperties::statistics_enabled`] must
    /// be set to [`EnabledStatistics::Chunk`] for these statistics to take effect. If
    /// [`EnabledStatistics::None`] they will be ignored, and if
    /// [`EnabledStatistics::Page`] the chunk statistics will instead be computed from
    /// the computed page statistics.
    pub fn write_batch_with_statistics(
        &mut self,
        values: &[E::T],
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
        min: Option<&E::T>,
        max: Option<&E::T>,
        distinct_count: Option<u64>,
    ) -> Result<usize> {
        self.write_batch_internal(
            values,
            None,
            def_levels,
            rep_levels,
            min,
            max,
            distinct_count,
        )
    }

    /// Returns total number of bytes written by this column writer so far.
    /// This value is also returned when column writer is closed.
    pub fn get_total_bytes_written(&self) -> u64 {
        self.column_metrics.total_bytes_written
    }

    /// Returns total number of rows written by this column writer so far.
    /// This value is also returned when column writer is closed.
    pub fn get_total_rows_written(&self) -> u64 {
        self.column_metrics.total_rows_written
    }

    /// Returns a reference to a [`ColumnDescPtr`]
    pub fn get_descriptor(&self) -> &ColumnDescPtr {
        &self.descr
    }

    /// Finalizes writes and closes the column writer.
    /// Returns total bytes written, total rows written and column chunk metadata.
    pub fn close(mut self) -> Result<ColumnCloseResult> {
        if self.page_metrics.num_buffered_values > 0 {
            self.add_data_page()?;
        }
        // An empty chunk emits no pages at all, including the dictionary page
        if self.encoder.has_dictionary() && !self.data_pages.is_empty() {
            self.write_dictionary_page()?;
        }
        self.flush_data_pages()?;
        let metadata = self.write_column_metadata()?;
        self.page_writer.close()?;

        Ok(ColumnCloseResult {
            bytes_written: self.column_metrics.total_bytes_written,
            rows_written: self.column_metrics.total_rows_written,
            metadata,
        })
    }

    /// Writes mini batch of values, definition and repetition levels.
    /// This allows fine-grained processing of values and maintaining a reasonable
    /// page size.
    fn write_mini_batch(
        &mut self,
        values: &[E::T],
        values_offset: usize,
        value_indices: Option<&[usize]>,
        num_levels: usize,
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
    ) -> Result<usize> {
        // Check if number of definition levels is the same as number of repetition
        // levels.
        if let (Some(def), Some(rep)) = (def_levels, rep_levels) {
            if def.len() != rep.len() {
                return Err(general_err!(
                    "Inconsistent length of definition and repetition levels: {} != {}",
                    def.len(),
                    rep.len()
                ));
            }
        }

        // Process definition levels and determine how many values to write.
        let values_to_write = if self.descr.max_def_level() > 0 {
            let levels = def_levels.ok_or_else(|| {
                general_err!(
                    "Definition levels are required, because max definition level = {}",
                    self.descr.max_def_level()
                )
            })?;

            let mut values_to_write = 0;
            for &level in levels {
                if level == self.descr.max_def_level() {
                    values_to_write += 1;
                } else {
                    self.page_metrics.num_page_nulls += 1
                }
            }

            self.def_levels_sink.extend_from_slice(levels);
            values_to_write
        } else {
            num_levels
        };

        // Process repetition levels and determine how many rows we are about to
        // process.
        if self.descr.max_rep_level() > 0 {
            // A row could contain more than one value.
            let levels = rep_levels.ok_or_else(|| {
                general_err!(
                    "Repetition levels are required, because max repetition level = {}",
                    self.descr.max_rep_level()
                )
            })?;

            // Count the occasions where we start a new row
            for &level in levels {
                self.page_metrics.num_buffered_rows += (level == 0) as u32
            }

            self.rep_levels_sink.extend_from_slice(levels);
        } else {
            // Each value is exactly one row.
            // Equals to the number of values, we count nulls as well.
            self.page_metrics.num_buffered_rows += num_levels as u32;
        }

        match value_indices {
            Some(indices) => {
                let indices = &indices[values_offset..values_offset + values_to_write];
                self.encoder.write_gather(values, indices)?;
            }
            None => self.encoder.write(values, values_offset, values_to_write)?,
        }

        self.page_metrics.num_buffered_values += num_levels as u32;

        if self.should_add_data_page() {
            self.add_data_page()?;
        }

        if self.should_dict_fallback() {
            self.dict_fallback()?;
        }

        Ok(values_to_write)
    }

    /// Returns true if we need to fall back to non-dictionary encoding.
    ///
    /// We can only fall back if dictionary encoder is set and we have exceeded
    /// dictionary size.
    #[inline]
    fn should_dict_fallback(&self) -> bool {
        match self.encoder.estimated_dict_page_size() {
            Some(size) => size >= self.props.dictionary_pagesize_limit(),
            None => false,
        }
    }

    /// Returns true if there is enough data for a data page, false otherwise.
    #[inline]
    fn should_add_data_page(&self) -> bool {
        // This is necessary in the event of a much larger dictionary size than page
        // size
        //
        // In such a scenario the dictionary encoder may return an estimated encoded
        // size in excess of the page size limit, even when there are no buffered
        // values
        if self.page_metrics.num_buffered_values == 0 {
            return false;
        }

        self.encoder.estimated_data_page_size() >= self.props.data_pagesize_limit()
    }

    /// Performs dictionary fallback.
    /// Prepares and writes dictionary and all data pages into page writer.
    fn dict_fallback(&mut self) -> Result<()> {
        // At this point we know that we need to fall back.
        if self.page_metrics.num_buffered_values > 0 {
            self.add_data_page()?;
        }
        self.write_dictionary_page()?;
        self.flush_data_pages()?;
        Ok(())
    }

    /// Adds data page.
    /// Data page is either buffered in case of dictionary encoding or written
    /// directly.
    fn add_data_page(&mut self) -> Result<()> {
        // Extract encoded values
        let values_data = self.encoder.flush_data_page()?;

        let max_def_level = self.descr.max_def_level();
        let max_rep_level = self.descr.max_rep_level();

        self.column_metrics.num_column_nulls += self.page_metrics.num_page_nulls;

        let page_statistics = match (values_data.min_value, values_data.max_value) {
            (Some(min), Some(max)) => {
                // Update chunk level statistics
                update_min(&self.descr, &min, &mut self.column_metrics.min_column_value);
                update_max(&self.descr, &max, &mut self.column_metrics.max_column_value);

                (self.statistics_enabled == EnabledStatistics::Page).then(|| {
                    ValueStatistics::new(
                        Some(min),
                        Some(max),
                        None,
                        self.page_metrics.num_page_nulls,
                        false,
                    )
                    .with_size_limit(self.props.max_statistics_size(self.descr.path()))
                    .with_backwards_compatible_min_max(self.descr.sort_order().is_signed())
                    .into()
                })
            }
            _ => None,
        };

        // Data page v1 layout: framed repetition levels, framed definition levels,
        // then the encoded values, compressed as one unit.
        let mut buffer = vec![];

        if max_rep_level > 0 {
            buffer.extend_from_slice(
                &self.encode_levels_v1(Encoding::RLE, &self.rep_levels_sink[..], max_rep_level)[..],
            );
        }

        if max_def_level > 0 {
            buffer.extend_from_slice(
                &self.encode_levels_v1(Encoding::RLE, &self.def_levels_sink[..], max_def_level)[..],
            );
        }

        buffer.extend_from_slice(&values_data.buf);
        let uncompressed_size = buffer.len();

        if let Some(ref mut cmpr) = self.compressor {
            let mut compressed_buf = Vec::with_capacity(uncompressed_size);
            cmpr.compress(&buffer[..], &mut compressed_buf)?;
            buffer = compressed_buf;
        }

        let data_page = Page::DataPage {
            buf: Bytes::from(buffer),
            num_values: self.page_metrics.num_buffered_values,
            encoding: values_data.encoding,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: page_statistics,
        };

        let compressed_page = CompressedPage::new(data_page, uncompressed_size);

        // Check if we need to buffer data page or flush it to the sink directly.
        if self.encoder.has_dictionary() {
            self.data_pages.push_back(compressed_page);
        } else {
            self.write_data_page(compressed_page)?;
        }

        // Update total number of rows.
        self.column_metrics.total_rows_written += self.page_metrics.num_buffered_rows as u64;

        // Reset state.
        self.rep_levels_sink.clear();
        self.def_levels_sink.clear();
        self.page_metrics = PageMetrics::default();

        Ok(())
    }

    /// Finalises any outstanding data pages and flushes buffered data pages from
    /// dictionary encoding into underlying sink.
    #[inline]
    fn flush_data_pages(&mut self) -> Result<()> {
        // Write all outstanding data to a new page.
        if self.page_metrics.num_buffered_values > 0 {
            self.add_data_page()?;
        }

        while let Some(page) = self.data_pages.pop_front() {
            self.write_data_page(page)?;
        }

        Ok(())
    }

    /// Assembles and writes column chunk metadata.
    fn write_column_metadata(&mut self) -> Result<ColumnChunkMetaData> {
        // Offsets recorded by a buffering page writer are relative to its buffer and
        // are shifted by the position its output lands at in the file.
        let rebase_offset = self.page_writer.rebase_offset() as i64;

        let total_compressed_size = self.column_metrics.total_compressed_size as i64;
        let total_uncompressed_size = self.column_metrics.total_uncompressed_size as i64;
        let num_values = self.column_metrics.total_num_values as i64;
        let dict_page_offset = self
            .column_metrics
            .dictionary_page_offset
            .map(|v| v as i64 + rebase_offset);
        // If data page offset is not set, then no pages have been written
        let data_page_offset = self
            .column_metrics
            .data_page_offset
            .map(|v| v as i64 + rebase_offset)
            .unwrap_or(0);

        let file_offset = match dict_page_offset {
            Some(dict_offset) => dict_offset + total_compressed_size,
            None => data_page_offset + total_compressed_size,
        };

        let mut builder = ColumnChunkMetaData::builder(self.descr.clone())
            .set_compression(self.codec)
            .set_encodings(self.encodings.iter().cloned().collect())
            .set_file_offset(file_offset)
            .set_total_compressed_size(total_compressed_size)
            .set_total_uncompressed_size(total_uncompressed_size)
            .set_num_values(num_values)
            .set_data_page_offset(data_page_offset)
            .set_dictionary_page_offset(dict_page_offset);

        if self.statistics_enabled != EnabledStatistics::None
            && self.column_metrics.total_rows_written > 0
        {
            let statistics = ValueStatistics::<E::T>::new(
                self.column_metrics.min_column_value.clone(),
                self.column_metrics.max_column_value.clone(),
                self.column_metrics.column_distinct_count,
                self.column_metrics.num_column_nulls,
                false,
            )
            .with_size_limit(self.props.max_statistics_size(self.descr.path()));

            // Some common readers only support the deprecated statistics format, so
            // the legacy min/max fields are also written when the sort order allows
            let statistics = statistics
                .with_backwards_compatible_min_max(self.descr.sort_order().is_signed())
                .into();
            builder = builder.set_statistics(statistics);
        }

        if !self.encoding_stats.is_empty() {
            builder = builder.set_page_encoding_stats(std::mem::take(&mut self.encoding_stats));
        }

        let metadata = builder.build()?;
        self.page_writer.write_metadata(&metadata)?;

        Ok(metadata)
    }

    /// Encodes definition or repetition levels for data page v1, prefixed with the
    /// length of the RLE run.
    #[inline]
    fn encode_levels_v1(&self, encoding: Encoding, levels: &[i16], max_level: i16) -> Vec<u8> {
        let mut encoder = LevelEncoder::v1(encoding, max_level, levels.len());
        encoder.put(levels);
        encoder.consume()
    }

    /// Writes compressed data page into underlying sink and updates global metrics.
    #[inline]
    fn write_data_page(&mut self, page: CompressedPage) -> Result<()> {
        self.encodings.insert(page.encoding());
        self.record_page_encoding(PageType::DATA_PAGE, page.encoding());
        let page_spec = self.page_writer.write_page(page)?;
        self.update_metrics_for_page(page_spec);
        Ok(())
    }

    /// Writes dictionary page into underlying sink.
    #[inline]
    fn write_dictionary_page(&mut self) -> Result<()> {
        let compressed_page = {
            let mut page = self
                .encoder
                .flush_dict_page()?
                .ok_or_else(|| general_err!("Dictionary encoder is not set"))?;

            let uncompressed_size = page.buf.len();

            if let Some(ref mut cmpr) = self.compressor {
                let mut output_buf = Vec::with_capacity(uncompressed_size);
                cmpr.compress(&page.buf, &mut output_buf)?;
                page.buf = Bytes::from(output_buf);
            }

            let dict_page = Page::DictionaryPage {
                buf: page.buf,
                num_values: page.num_values as u32,
                encoding: self.props.dictionary_page_encoding(),
                is_sorted: page.is_sorted,
            };
            CompressedPage::new(dict_page, uncompressed_size)
        };

        self.encodings.insert(compressed_page.encoding());
        self.record_page_encoding(PageType::DICTIONARY_PAGE, compressed_page.encoding());
        let page_spec = self.page_writer.write_page(compressed_page)?;
        self.update_metrics_for_page(page_spec);
        Ok(())
    }

    /// Counts a page about to be written towards the chunk's per-encoding page
    /// statistics.
    fn record_page_encoding(&mut self, page_type: PageType, encoding: Encoding) {
        for stat in &mut self.encoding_stats {
            if stat.page_type == page_type && stat.encoding == encoding {
                stat.count += 1;
                return;
            }
        }
        self.encoding_stats.push(PageEncodingStats {
            page_type,
            encoding,
            count: 1,
        });
    }

    /// Updates column writer metrics with each page metadata.
    #[inline]
    fn update_metrics_for_page(&mut self, page_spec: PageWriteSpec) {
        self.column_metrics.total_uncompressed_size += page_spec.uncompressed_size as u64;
        self.column_metrics.total_compressed_size += page_spec.compressed_size as u64;
        self.column_metrics.total_num_values += page_spec.num_values as u64;
        self.column_metrics.total_bytes_written += page_spec.bytes_written;

        match page_spec.page_type {
            PageType::DATA_PAGE => {
                if self.column_metrics.data_page_offset.is_none() {
                    self.column_metrics.data_page_offset = Some(page_spec.offset);
                }
            }
            PageType::DICTIONARY_PAGE => {
                assert!(
                    self.column_metrics.dictionary_page_offset.is_none(),
                    "Dictionary offset is already set"
                );
                self.column_metrics.dictionary_page_offset = Some(page_spec.offset);
            }
            _ => {}
        }
    }
}

fn update_min<T: ParquetValueType>(descr: &ColumnDescriptor, val: &T, min: &mut Option<T>) {
    update_stat::<T, _>(val, min, |cur| compare_greater(descr, cur, val))
}

fn update_max<T: ParquetValueType>(descr: &ColumnDescriptor, val: &T, max: &mut Option<T>) {
    update_stat::<T, _>(val, max, |cur| compare_greater(descr, val, cur))
}

#[inline]
#[allow(clippy::eq_op)]
fn is_nan<T: ParquetValueType>(val: &T) -> bool {
    match T::PHYSICAL_TYPE {
        Type::FLOAT | Type::DOUBLE => val != val,
        _ => false,
    }
}

/// Perform a conditional update of `cur`, skipping any NaN values
///
/// If `cur` is `None`, sets `cur` to `Some(val)`, otherwise calls `should_update`
/// with the value of `cur`, and updates `cur` to `Some(val)` if it returns `true`
fn update_stat<T: ParquetValueType, F>(val: &T, cur: &mut Option<T>, should_update: F)
where
    F: Fn(&T) -> bool,
{
    if is_nan(val) {
        return;
    }

    if cur.as_ref().map_or(true, should_update) {
        *cur = Some(val.clone());
    }
}

/// Evaluate `a > b` according to the column's sort order.
fn compare_greater<T: ParquetValueType>(descr: &ColumnDescriptor, a: &T, b: &T) -> bool {
    match descr.converted_type() {
        ConvertedType::UINT_8
        | ConvertedType::UINT_16
        | ConvertedType::UINT_32
        | ConvertedType::UINT_64 => {
            // need to compare unsigned
            return a.as_u64().unwrap() > b.as_u64().unwrap();
        }
        _ => {}
    };

    if descr.converted_type() == ConvertedType::DECIMAL {
        match T::PHYSICAL_TYPE {
            Type::FIXED_LEN_BYTE_ARRAY | Type::BYTE_ARRAY => {
                return compare_greater_byte_array_decimals(a.as_bytes(), b.as_bytes());
            }
            _ => {}
        };
    };

    a > b
}

// ----------------------------------------------------------------------
// Encoding support for column writer.
// This mirrors parquet-mr default encodings for writes.

/// Returns encoding for a column when no other encoding is provided in writer
/// properties.
fn fallback_encoding(_kind: Type) -> Encoding {
    Encoding::PLAIN
}

/// Returns true if dictionary is supported for column writer, false otherwise.
fn has_dictionary_support(kind: Type) -> bool {
    match kind {
        // Booleans do not support dict encoding and should use a fallback encoding.
        Type::BOOLEAN => false,
        // Dictionary encoding was not enabled in PARQUET 1.0
        Type::FIXED_LEN_BYTE_ARRAY => false,
        _ => true,
    }
}

/// Signed comparison of bytes arrays
fn compare_greater_byte_array_decimals(a: &[u8], b: &[u8]) -> bool {
    let a_length = a.len();
    let b_length = b.len();

    if a_length == 0 || b_length == 0 {
        return a_length > 0;
    }

    let first_a: u8 = a[0];
    let first_b: u8 = b[0];

    // We can short circuit for different signed numbers or
    // for equal length bytes arrays that have different first bytes.
    // The equality requirement is necessary for sign extension cases.
    // 0xFF10 should be equal to 0x10 (due to big endian sign extension).
    if (0x80 & first_a) != (0x80 & first_b) || (a_length == b_length && first_a != first_b) {
        return (first_a as i8) > (first_b as i8);
    }

    // When the lengths are unequal and the numbers are of the same
    // sign we need to do comparison by sign extending the shorter
    // value first, and once we get to equal sized arrays, lexicographical
    // unsigned comparison of everything but the first byte is sufficient.

    let extension: u8 = if (first_a as i8) < 0 { 0xFF } else { 0 };

    if a_length != b_length {
        let not_equal = if a_length > b_length {
            let lead_length = a_length - b_length;
            a[0..lead_length].iter().any(|&x| x != extension)
        } else {
            let lead_length = b_length - a_length;
            b[0..lead_length].iter().any(|&x| x != extension)
        };

        if not_equal {
            let negative_values: bool = (first_a as i8) < 0;
            let a_longer: bool = a_length > b_length;
            return if negative_values { !a_longer } else { a_longer };
        }
    }

    (a[1..]) > (b[1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Repetition;
    use crate::column::page::PageReader;
    use crate::data_type::{ByteArray, ByteArrayType, DoubleType, Int32Type, Int64Type};
    use crate::file::properties::WriterProperties;
    use crate::file::serialized_reader::SerializedPageReader;
    use crate::file::writer::{SerializedPageWriter, TrackedWrite};
    use crate::schema::types::{ColumnPath, Type as SchemaType};
    use std::sync::Arc;

    fn get_test_column_descr<T: DataType>(
        max_def_level: i16,
        max_rep_level: i16,
    ) -> ColumnDescriptor {
        let repetition = if max_def_level > 0 {
            Repetition::OPTIONAL
        } else {
            Repetition::REQUIRED
        };
        let tpe = SchemaType::primitive_type_builder("col", T::get_physical_type())
            .with_repetition(repetition)
            .with_length(4)
            .build()
            .unwrap();
        ColumnDescriptor::new(
            Arc::new(tpe),
            max_def_level,
            max_rep_level,
            ColumnPath::from("col"),
        )
    }

    fn get_test_column_writer<'a, T: DataType>(
        page_writer: Box<dyn PageWriter + 'a>,
        max_def_level: i16,
        max_rep_level: i16,
        props: WriterPropertiesPtr,
    ) -> ColumnWriterImpl<'a, T> {
        let descr = Arc::new(get_test_column_descr::<T>(max_def_level, max_rep_level));
        let column_writer = get_column_writer(descr, props, page_writer);
        get_typed_column_writer::<T>(column_writer)
    }

    /// A page writer that discards its output, for tests that exercise error paths
    /// and metadata accounting only.
    struct TestPageWriter {}

    impl PageWriter for TestPageWriter {
        fn write_page(&mut self, page: CompressedPage) -> Result<PageWriteSpec> {
            let mut res = PageWriteSpec::new();
            res.page_type = page.page_type();
            res.uncompressed_size = page.uncompressed_size();
            res.compressed_size = page.compressed_size();
            res.num_values = page.num_values();
            res.offset = 0;
            res.bytes_written = page.data().len() as u64;
            Ok(res)
        }

        fn write_metadata(&mut self, _metadata: &ColumnChunkMetaData) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn get_test_page_writer() -> Box<dyn PageWriter> {
        Box::new(TestPageWriter {})
    }

    /// Reads back all pages of an unencrypted column chunk written to `buffer`.
    fn read_pages(
        buffer: Vec<u8>,
        metadata: &ColumnChunkMetaData,
        num_values: usize,
    ) -> Vec<crate::column::page::Page> {
        let reader = bytes::Bytes::from(buffer);
        let len = reader.len();
        let mut page_reader = SerializedPageReader::new(
            Arc::new(reader),
            0,
            len,
            num_values as i64,
            metadata.compression(),
            metadata.column_descr().physical_type(),
            None,
        )
        .unwrap();

        let mut pages = vec![];
        while let Some(page) = page_reader.get_next_page().unwrap() {
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_column_writer_inconsistent_def_rep_length() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 1, 1, props);
        let res = writer.write_batch(&[1, 2, 3, 4], Some(&[1, 1, 1]), Some(&[0, 0]));
        assert!(res.is_err());
        if let Err(err) = res {
            assert_eq!(
                format!("{err}"),
                "Parquet error: Inconsistent length of definition and repetition levels: 3 != 2"
            );
        }
    }

    #[test]
    fn test_column_writer_invalid_def_levels() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 1, 0, props);
        let res = writer.write_batch(&[1, 2, 3, 4], None, None);
        assert!(res.is_err());
        if let Err(err) = res {
            assert_eq!(
                format!("{err}"),
                "Parquet error: Definition levels are required, because max definition level = 1"
            );
        }
    }

    #[test]
    fn test_column_writer_invalid_rep_levels() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 0, 1, props);
        let res = writer.write_batch(&[1, 2, 3, 4], None, None);
        assert!(res.is_err());
        if let Err(err) = res {
            assert_eq!(
                format!("{err}"),
                "Parquet error: Repetition levels are required, because max repetition level = 1"
            );
        }
    }

    #[test]
    fn test_column_writer_not_enough_values_to_write() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 1, 0, props);
        let res = writer.write_batch(&[1, 2], Some(&[1, 1, 1, 1]), None);
        assert!(res.is_err());
        if let Err(err) = res {
            assert_eq!(
                format!("{err}"),
                "Parquet error: Expected to write 4 values, but have only 2"
            );
        }
    }

    #[test]
    fn test_column_writer_required_int32_no_compression() {
        let mut buffer = Vec::new();
        let metadata = {
            let mut sink = TrackedWrite::new(&mut buffer);
            let page_writer: Box<dyn PageWriter + '_> = Box::new(SerializedPageWriter::new(&mut sink));
            let props = Arc::new(
                WriterProperties::builder()
                    .set_dictionary_enabled(false)
                    .build(),
            );
            let mut writer = get_test_column_writer::<Int32Type>(page_writer, 0, 0, props);
            writer.write_batch(&[1, 2, 3, 4, 5], None, None).unwrap();
            let r = writer.close().unwrap();
            assert_eq!(r.rows_written, 5);
            r.metadata
        };

        assert_eq!(metadata.num_values(), 5);
        assert_eq!(metadata.encodings(), &vec![Encoding::PLAIN, Encoding::RLE]);
        assert_eq!(metadata.dictionary_page_offset(), None);
        assert_eq!(
            metadata.file_offset(),
            metadata.data_page_offset() + metadata.compressed_size()
        );
        let stats = metadata.statistics().unwrap();
        assert_eq!(stats.min_bytes_opt().unwrap(), 1i32.to_le_bytes());
        assert_eq!(stats.max_bytes_opt().unwrap(), 5i32.to_le_bytes());
        assert_eq!(stats.null_count(), 0);
        assert_eq!(
            metadata.page_encoding_stats(),
            Some(&vec![PageEncodingStats {
                page_type: PageType::DATA_PAGE,
                encoding: Encoding::PLAIN,
                count: 1,
            }])
        );

        // one data page, 5 * 4 value bytes plus the header
        assert!(buffer.len() > 20);
        let pages = read_pages(buffer, &metadata, 5);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].num_values(), 5);
        assert_eq!(pages[0].buffer().len(), 20);
    }

    #[test]
    fn test_column_writer_optional_int64_dictionary() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<Int64Type>(page_writer, 1, 0, props);
        writer
            .write_batch(&[10, 10, 20], Some(&[1, 0, 1, 1, 0]), None)
            .unwrap();
        let r = writer.close().unwrap();

        assert_eq!(r.rows_written, 5);
        let metadata = r.metadata;
        assert_eq!(metadata.num_values(), 5);
        assert!(metadata.dictionary_page_offset().is_some());
        assert_eq!(
            metadata.encodings(),
            &vec![Encoding::PLAIN, Encoding::RLE, Encoding::RLE_DICTIONARY]
        );
        let stats = metadata.statistics().unwrap();
        assert_eq!(stats.null_count(), 2);
        assert_eq!(stats.min_bytes_opt().unwrap(), 10i64.to_le_bytes());
        assert_eq!(stats.max_bytes_opt().unwrap(), 20i64.to_le_bytes());
    }

    #[test]
    fn test_column_writer_empty_column_chunk() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let writer = get_test_column_writer::<Int32Type>(page_writer, 0, 0, props);
        let r = writer.close().unwrap();

        assert_eq!(r.rows_written, 0);
        assert_eq!(r.metadata.num_values(), 0);
        assert_eq!(r.metadata.compressed_size(), 0);
        assert_eq!(r.metadata.dictionary_page_offset(), None);
        assert!(r.metadata.statistics().is_none());
    }

    #[test]
    fn test_column_writer_spaced_values() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(
            WriterProperties::builder()
                .set_dictionary_enabled(false)
                .build(),
        );
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 1, 0, props);
        // gaps at positions 1 and 3 are never read
        writer
            .write_batch_spaced(&[7, i32::MAX, 9, i32::MAX, 11], &[1, 0, 1, 0, 1], None)
            .unwrap();
        let r = writer.close().unwrap();
        assert_eq!(r.rows_written, 5);
        let stats = r.metadata.statistics().unwrap();
        assert_eq!(stats.min_bytes_opt().unwrap(), 7i32.to_le_bytes());
        assert_eq!(stats.max_bytes_opt().unwrap(), 11i32.to_le_bytes());
        assert_eq!(stats.null_count(), 2);
    }

    #[test]
    fn test_column_writer_nan_values_skipped_in_stats() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(WriterProperties::builder().build());
        let mut writer = get_test_column_writer::<DoubleType>(page_writer, 0, 0, props);
        writer
            .write_batch(&[1.0, f64::NAN, 3.0], None, None)
            .unwrap();
        let r = writer.close().unwrap();
        let stats = r.metadata.statistics().unwrap();
        assert_eq!(stats.min_bytes_opt().unwrap(), 1.0f64.to_le_bytes());
        assert_eq!(stats.max_bytes_opt().unwrap(), 3.0f64.to_le_bytes());
    }

    #[test]
    fn test_column_writer_dictionary_fallback() {
        let mut buffer = Vec::new();
        let metadata = {
            let mut sink = TrackedWrite::new(&mut buffer);
            let page_writer: Box<dyn PageWriter + '_> = Box::new(SerializedPageWriter::new(&mut sink));
            let props = Arc::new(
                WriterProperties::builder()
                    .set_dictionary_pagesize_limit(128)
                    .set_data_pagesize_limit(256)
                    .set_write_batch_size(8)
                    .build(),
            );
            let mut writer = get_test_column_writer::<ByteArrayType>(page_writer, 0, 0, props);
            // distinct values overflow the dictionary page limit and trigger fallback
            let values: Vec<ByteArray> = (0..64)
                .map(|i| ByteArray::from(format!("value-{i:08}").into_bytes()))
                .collect();
            writer.write_batch(&values, None, None).unwrap();
            let r = writer.close().unwrap();
            assert_eq!(r.rows_written, 64);
            r.metadata
        };

        // chunk carries the dictionary, level and fallback encodings
        assert_eq!(
            metadata.encodings(),
            &vec![Encoding::PLAIN, Encoding::RLE, Encoding::RLE_DICTIONARY]
        );
        assert!(metadata.dictionary_page_offset().is_some());

        // page counts record the dictionary page and both data page encodings
        let page_stats = metadata.page_encoding_stats().unwrap();
        let count = |page_type, encoding| {
            page_stats
                .iter()
                .find(|s| s.page_type == page_type && s.encoding == encoding)
                .map(|s| s.count)
                .unwrap_or(0)
        };
        assert_eq!(count(PageType::DICTIONARY_PAGE, Encoding::PLAIN), 1);
        assert!(count(PageType::DATA_PAGE, Encoding::RLE_DICTIONARY) > 0);
        assert!(count(PageType::DATA_PAGE, Encoding::PLAIN) > 0);

        // dictionary page must be first on disk, data pages follow
        let pages = read_pages(buffer, &metadata, 64);
        assert_eq!(pages[0].page_type(), PageType::DICTIONARY_PAGE);
        assert!(pages.len() > 2);
        let encodings: Vec<Encoding> = pages[1..].iter().map(|p| p.encoding()).collect();
        assert!(encodings.contains(&Encoding::RLE_DICTIONARY));
        assert!(encodings.contains(&Encoding::PLAIN));
        // buffered dictionary-encoded pages appear before the fallback pages
        let first_plain = encodings.iter().position(|e| *e == Encoding::PLAIN).unwrap();
        assert!(encodings[..first_plain]
            .iter()
            .all(|e| *e == Encoding::RLE_DICTIONARY));
    }

    #[test]
    fn test_column_writer_page_boundary() {
        let mut buffer = Vec::new();
        let num_values = 512usize;
        let metadata = {
            let mut sink = TrackedWrite::new(&mut buffer);
            let page_writer: Box<dyn PageWriter + '_> = Box::new(SerializedPageWriter::new(&mut sink));
            let props = Arc::new(
                WriterProperties::builder()
                    .set_dictionary_enabled(false)
                    .set_data_pagesize_limit(128)
                    .set_write_batch_size(16)
                    .build(),
            );
            let mut writer = get_test_column_writer::<Int32Type>(page_writer, 0, 0, props);
            let values: Vec<i32> = (0..num_values as i32).collect();
            writer.write_batch(&values, None, None).unwrap();
            writer.close().unwrap().metadata
        };

        let pages = read_pages(buffer, &metadata, num_values);
        assert!(pages.len() > 1, "expected multiple pages, got {}", pages.len());
        let total: u32 = pages.iter().map(|p| p.num_values()).sum();
        assert_eq!(total as usize, num_values);
    }

    #[test]
    fn test_column_writer_precalculated_statistics() {
        let page_writer = get_test_page_writer();
        let props = Arc::new(
            WriterProperties::builder()
                .set_statistics_enabled(EnabledStatistics::Chunk)
                .build(),
        );
        let mut writer = get_test_column_writer::<Int32Type>(page_writer, 0, 0, props);
        writer
            .write_batch_with_statistics(&[5, 7, 9], None, None, Some(&3), Some(&100), Some(16))
            .unwrap();
        let r = writer.close().unwrap();
        let stats = r.metadata.statistics().unwrap();
        assert_eq!(stats.min_bytes_opt().unwrap(), 3i32.to_le_bytes());
        assert_eq!(stats.max_bytes_opt().unwrap(), 100i32.to_le_bytes());
        assert_eq!(stats.distinct_count(), Some(16));
    }

    #[test]
    fn test_column_writer_compare_greater_unsigned() {
        let tpe = SchemaType::primitive_type_builder("col", Type::INT32)
            .with_repetition(Repetition::REQUIRED)
            .with_converted_type(ConvertedType::UINT_32)
            .build()
            .unwrap();
        let descr = ColumnDescriptor::new(Arc::new(tpe), 0, 0, ColumnPath::from("col"));
        // -1 casts to u32::MAX and is larger than 1 in the unsigned order
        assert!(compare_greater(&descr, &-1i32, &1i32));
        assert!(!compare_greater(&descr, &1i32, &-1i32));
    }

    #[test]
    fn test_compare_greater_byte_array_decimals() {
        // equal sign, same length
        assert!(compare_greater_byte_array_decimals(&[0x10], &[0x08]));
        // negative numbers compare below positive ones
        assert!(!compare_greater_byte_array_decimals(&[0xFF, 0x00], &[0x01]));
        // longer positive value with a significant lead byte is larger
        assert!(compare_greater_byte_array_decimals(&[0x01, 0x00], &[0x02]));
        // longer negative value with a significant lead byte is smaller
        assert!(!compare_greater_byte_array_decimals(&[0xFE, 0x00], &[0xFE]));
    }
}

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

//! Bridge between a Parquet file's thrift encoded footer and this crate's
//! [metadata API](crate::file::metadata). Contains hand-written codecs for the
//! footer structures as defined by the Parquet thrift IDL, including the
//! encryption metadata and the decryption of encrypted footers and column
//! metadata.

use std::io::Write;
use std::sync::Arc;

use crate::basic::{ColumnOrder, Compression, ConvertedType, Encoding, PageType, Repetition, Type};
use crate::encryption::decrypt::{FileDecryptionProperties, FileDecryptor};
use crate::encryption::modules::{ModuleType, create_footer_aad, create_module_aad};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{
    ColumnChunkMetaData, ColumnChunkMetaDataBuilder, ColumnCryptoMetaData,
    EncryptionWithColumnKey, FileMetaData, KeyValue, ParquetMetaData, RowGroupMetaData,
    RowGroupMetaDataBuilder,
};
use crate::file::page_encoding_stats::PageEncodingStats;
use crate::schema::types::{
    ColumnDescriptor, SchemaDescriptor, TypePtr, num_nodes, schema_from_array,
};
use crate::thrift::{
    ElementType, FieldType, ReadThrift, ThriftCompactInputProtocol, ThriftCompactOutputProtocol,
    ThriftSliceInputProtocol, WriteThrift, WriteThriftField, read_thrift_vec,
};
use crate::write_thrift_field;

// ----------------------------------------------------------------------
// SchemaElement

/// One node of the flattened schema list:
///
/// ```text
/// struct SchemaElement {
///   1: optional Type type;
///   2: optional i32 type_length;
///   3: optional FieldRepetitionType repetition_type;
///   4: required string name;
///   5: optional i32 num_children;
///   6: optional ConvertedType converted_type;
///   7: optional i32 scale
///   8: optional i32 precision
///   9: optional i32 field_id;
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SchemaElement<'a> {
    pub(crate) r#type: Option<Type>,
    pub(crate) type_length: Option<i32>,
    pub(crate) repetition_type: Option<Repetition>,
    pub(crate) name: &'a str,
    pub(crate) num_children: Option<i32>,
    pub(crate) converted_type: Option<ConvertedType>,
    pub(crate) scale: Option<i32>,
    pub(crate) precision: Option<i32>,
    pub(crate) field_id: Option<i32>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for SchemaElement<'a> {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut r#type: Option<Type> = None;
        let mut type_length: Option<i32> = None;
        let mut repetition_type: Option<Repetition> = None;
        let mut name: Option<&str> = None;
        let mut num_children: Option<i32> = None;
        let mut converted_type: Option<ConvertedType> = None;
        let mut scale: Option<i32> = None;
        let mut precision: Option<i32> = None;
        let mut field_id: Option<i32> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => r#type = Some(Type::read_thrift(&mut *prot)?),
                2 => type_length = Some(i32::read_thrift(&mut *prot)?),
                3 => repetition_type = Some(Repetition::read_thrift(&mut *prot)?),
                4 => name = Some(<&str>::read_thrift(&mut *prot)?),
                5 => num_children = Some(i32::read_thrift(&mut *prot)?),
                6 => converted_type = Some(ConvertedType::read_thrift(&mut *prot)?),
                7 => scale = Some(i32::read_thrift(&mut *prot)?),
                8 => precision = Some(i32::read_thrift(&mut *prot)?),
                9 => field_id = Some(i32::read_thrift(&mut *prot)?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(name) = name else {
            return Err(general_err!("Required field name is missing"));
        };
        Ok(Self {
            r#type,
            type_length,
            repetition_type,
            name,
            num_children,
            converted_type,
            scale,
            precision,
            field_id,
        })
    }
}

impl WriteThrift for SchemaElement<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(t) = self.r#type {
            last_field_id = t.write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(type_length) = self.type_length {
            last_field_id = type_length.write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(repetition) = self.repetition_type {
            last_field_id = repetition.write_thrift_field(writer, 3, last_field_id)?;
        }
        last_field_id = self.name.write_thrift_field(writer, 4, last_field_id)?;
        if let Some(num_children) = self.num_children {
            last_field_id = num_children.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(converted_type) = self.converted_type {
            last_field_id = converted_type.write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(scale) = self.scale {
            last_field_id = scale.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(precision) = self.precision {
            last_field_id = precision.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(field_id) = self.field_id {
            field_id.write_thrift_field(writer, 9, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

// ----------------------------------------------------------------------
// Statistics

/// The thrift `Statistics` struct, as written to page headers and column chunk
/// metadata. Min and max values are stored as PLAIN encoded bytes, except that
/// variable-length byte arrays drop their length prefix.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PageStatistics {
    pub(crate) max: Option<Vec<u8>>,
    pub(crate) min: Option<Vec<u8>>,
    pub(crate) null_count: Option<i64>,
    pub(crate) distinct_count: Option<i64>,
    pub(crate) max_value: Option<Vec<u8>>,
    pub(crate) min_value: Option<Vec<u8>>,
    pub(crate) is_max_value_exact: Option<bool>,
    pub(crate) is_min_value_exact: Option<bool>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for PageStatistics {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut stats = PageStatistics::default();
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => stats.max = Some(prot.read_bytes_owned()?),
                2 => stats.min = Some(prot.read_bytes_owned()?),
                3 => stats.null_count = Some(i64::read_thrift(&mut *prot)?),
                4 => stats.distinct_count = Some(i64::read_thrift(&mut *prot)?),
                5 => stats.max_value = Some(prot.read_bytes_owned()?),
                6 => stats.min_value = Some(prot.read_bytes_owned()?),
                7 => stats.is_max_value_exact = field_ident.bool_val,
                8 => stats.is_min_value_exact = field_ident.bool_val,
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        Ok(stats)
    }
}

impl WriteThrift for PageStatistics {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(max) = &self.max {
            last_field_id = max.as_slice().write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(min) = &self.min {
            last_field_id = min.as_slice().write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(null_count) = self.null_count {
            last_field_id = null_count.write_thrift_field(writer, 3, last_field_id)?;
        }
        if let Some(distinct_count) = self.distinct_count {
            last_field_id = distinct_count.write_thrift_field(writer, 4, last_field_id)?;
        }
        if let Some(max_value) = &self.max_value {
            last_field_id = max_value
                .as_slice()
                .write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(min_value) = &self.min_value {
            last_field_id = min_value
                .as_slice()
                .write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(is_max_value_exact) = self.is_max_value_exact {
            last_field_id = is_max_value_exact.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(is_min_value_exact) = self.is_min_value_exact {
            is_min_value_exact.write_thrift_field(writer, 8, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

// ----------------------------------------------------------------------
// Page headers

/// ```text
/// struct DataPageHeader {
///   1: required i32 num_values
///   2: required Encoding encoding
///   3: required Encoding definition_level_encoding;
///   4: required Encoding repetition_level_encoding;
///   5: optional Statistics statistics;
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DataPageHeader {
    pub(crate) num_values: i32,
    pub(crate) encoding: Encoding,
    pub(crate) definition_level_encoding: Encoding,
    pub(crate) repetition_level_encoding: Encoding,
    pub(crate) statistics: Option<PageStatistics>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for DataPageHeader {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut num_values: Option<i32> = None;
        let mut encoding: Option<Encoding> = None;
        let mut definition_level_encoding: Option<Encoding> = None;
        let mut repetition_level_encoding: Option<Encoding> = None;
        let mut statistics: Option<PageStatistics> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => num_values = Some(i32::read_thrift(&mut *prot)?),
                2 => encoding = Some(Encoding::read_thrift(&mut *prot)?),
                3 => definition_level_encoding = Some(Encoding::read_thrift(&mut *prot)?),
                4 => repetition_level_encoding = Some(Encoding::read_thrift(&mut *prot)?),
                5 => statistics = Some(PageStatistics::read_thrift(&mut *prot)?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(num_values) = num_values else {
            return Err(general_err!("Required field num_values is missing"));
        };
        let Some(encoding) = encoding else {
            return Err(general_err!("Required field encoding is missing"));
        };
        let Some(definition_level_encoding) = definition_level_encoding else {
            return Err(general_err!(
                "Required field definition_level_encoding is missing"
            ));
        };
        let Some(repetition_level_encoding) = repetition_level_encoding else {
            return Err(general_err!(
                "Required field repetition_level_encoding is missing"
            ));
        };
        Ok(Self {
            num_values,
            encoding,
            definition_level_encoding,
            repetition_level_encoding,
            statistics,
        })
    }
}

impl WriteThrift for DataPageHeader {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        self.num_values.write_thrift_field(writer, 1, 0)?;
        self.encoding.write_thrift_field(writer, 2, 1)?;
        self.definition_level_encoding
            .write_thrift_field(writer, 3, 2)?;
        let last_field_id = self
            .repetition_level_encoding
            .write_thrift_field(writer, 4, 3)?;
        if let Some(statistics) = &self.statistics {
            statistics.write_thrift_field(writer, 5, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

write_thrift_field!(DataPageHeader, FieldType::Struct);

/// ```text
/// struct DictionaryPageHeader {
///   1: required i32 num_values;
///   2: required Encoding encoding
///   3: optional bool is_sorted;
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DictionaryPageHeader {
    pub(crate) num_values: i32,
    pub(crate) encoding: Encoding,
    pub(crate) is_sorted: Option<bool>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for DictionaryPageHeader {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut num_values: Option<i32> = None;
        let mut encoding: Option<Encoding> = None;
        let mut is_sorted: Option<bool> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => num_values = Some(i32::read_thrift(&mut *prot)?),
                2 => encoding = Some(Encoding::read_thrift(&mut *prot)?),
                3 => is_sorted = field_ident.bool_val,
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(num_values) = num_values else {
            return Err(general_err!("Required field num_values is missing"));
        };
        let Some(encoding) = encoding else {
            return Err(general_err!("Required field encoding is missing"));
        };
        Ok(Self {
            num_values,
            encoding,
            is_sorted,
        })
    }
}

impl WriteThrift for DictionaryPageHeader {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        self.num_values.write_thrift_field(writer, 1, 0)?;
        let last_field_id = self.encoding.write_thrift_field(writer, 2, 1)?;
        if let Some(is_sorted) = self.is_sorted {
            is_sorted.write_thrift_field(writer, 3, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

write_thrift_field!(DictionaryPageHeader, FieldType::Struct);

/// ```text
/// struct PageHeader {
///   1: required PageType type
///   2: required i32 uncompressed_page_size
///   3: required i32 compressed_page_size
///   4: optional i32 crc
///   5: optional DataPageHeader data_page_header;
///   6: optional IndexPageHeader index_page_header;
///   7: optional DictionaryPageHeader dictionary_page_header;
///   8: optional DataPageHeaderV2 data_page_header_v2;
/// }
/// ```
///
/// Index pages and v2 data pages are understood by the parser, but only so their
/// headers can be rejected with a useful error; the writer never emits them.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PageHeader {
    pub(crate) r#type: PageType,
    pub(crate) uncompressed_page_size: i32,
    pub(crate) compressed_page_size: i32,
    pub(crate) crc: Option<i32>,
    pub(crate) data_page_header: Option<DataPageHeader>,
    pub(crate) dictionary_page_header: Option<DictionaryPageHeader>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for PageHeader {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut type_: Option<PageType> = None;
        let mut uncompressed_page_size: Option<i32> = None;
        let mut compressed_page_size: Option<i32> = None;
        let mut crc: Option<i32> = None;
        let mut data_page_header: Option<DataPageHeader> = None;
        let mut dictionary_page_header: Option<DictionaryPageHeader> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => type_ = Some(PageType::read_thrift(&mut *prot)?),
                2 => uncompressed_page_size = Some(i32::read_thrift(&mut *prot)?),
                3 => compressed_page_size = Some(i32::read_thrift(&mut *prot)?),
                4 => crc = Some(i32::read_thrift(&mut *prot)?),
                5 => data_page_header = Some(DataPageHeader::read_thrift(&mut *prot)?),
                7 => dictionary_page_header = Some(DictionaryPageHeader::read_thrift(&mut *prot)?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(r#type) = type_ else {
            return Err(general_err!("Required field type is missing"));
        };
        let Some(uncompressed_page_size) = uncompressed_page_size else {
            return Err(general_err!(
                "Required field uncompressed_page_size is missing"
            ));
        };
        let Some(compressed_page_size) = compressed_page_size else {
            return Err(general_err!(
                "Required field compressed_page_size is missing"
            ));
        };
        Ok(Self {
            r#type,
            uncompressed_page_size,
            compressed_page_size,
            crc,
            data_page_header,
            dictionary_page_header,
        })
    }
}

impl WriteThrift for PageHeader {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        self.r#type.write_thrift_field(writer, 1, 0)?;
        self.uncompressed_page_size.write_thrift_field(writer, 2, 1)?;
        let mut last_field_id = self.compressed_page_size.write_thrift_field(writer, 3, 2)?;
        if let Some(crc) = self.crc {
            last_field_id = crc.write_thrift_field(writer, 4, last_field_id)?;
        }
        if let Some(data_page_header) = &self.data_page_header {
            last_field_id = data_page_header.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(dictionary_page_header) = &self.dictionary_page_header {
            dictionary_page_header.write_thrift_field(writer, 7, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

// ----------------------------------------------------------------------
// PageEncodingStats

// struct PageEncodingStats {
//   1: required PageType page_type;
//   2: required Encoding encoding;
//   3: required i32 count;
// }
impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for PageEncodingStats {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut page_type: Option<PageType> = None;
        let mut encoding: Option<Encoding> = None;
        let mut count: Option<i32> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => page_type = Some(PageType::read_thrift(&mut *prot)?),
                2 => encoding = Some(Encoding::read_thrift(&mut *prot)?),
                3 => count = Some(i32::read_thrift(&mut *prot)?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(page_type) = page_type else {
            return Err(general_err!("Required field page_type is missing"));
        };
        let Some(encoding) = encoding else {
            return Err(general_err!("Required field encoding is missing"));
        };
        let Some(count) = count else {
            return Err(general_err!("Required field count is missing"));
        };
        Ok(Self {
            page_type,
            encoding,
            count,
        })
    }
}

impl WriteThrift for PageEncodingStats {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        self.page_type.write_thrift_field(writer, 1, 0)?;
        self.encoding.write_thrift_field(writer, 2, 1)?;
        self.count.write_thrift_field(writer, 3, 2)?;
        writer.write_struct_end()
    }
}

write_thrift_field!(PageEncodingStats, FieldType::Struct);

// ----------------------------------------------------------------------
// KeyValue

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for KeyValue {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut key: Option<String> = None;
        let mut value: Option<String> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => key = Some(String::read_thrift(&mut *prot)?),
                2 => value = Some(String::read_thrift(&mut *prot)?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(key) = key else {
            return Err(general_err!("Required field key is missing"));
        };
        Ok(Self { key, value })
    }
}

impl WriteThrift for KeyValue {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self.key.write_thrift_field(writer, 1, 0)?;
        if let Some(value) = &self.value {
            value.write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

write_thrift_field!(KeyValue, FieldType::Struct);

// ----------------------------------------------------------------------
// Encryption structures

/// ```text
/// struct AesGcmV1 {
///   1: optional binary aad_prefix
///   2: optional binary aad_file_unique
///   3: optional bool supply_aad_prefix
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct AesGcmV1 {
    pub(crate) aad_prefix: Option<Vec<u8>>,
    pub(crate) aad_file_unique: Option<Vec<u8>>,
    pub(crate) supply_aad_prefix: Option<bool>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for AesGcmV1 {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut val = AesGcmV1::default();
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => val.aad_prefix = Some(prot.read_bytes_owned()?),
                2 => val.aad_file_unique = Some(prot.read_bytes_owned()?),
                3 => val.supply_aad_prefix = field_ident.bool_val,
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        Ok(val)
    }
}

impl WriteThrift for AesGcmV1 {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(aad_prefix) = &self.aad_prefix {
            last_field_id = aad_prefix
                .as_slice()
                .write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(aad_file_unique) = &self.aad_file_unique {
            last_field_id = aad_file_unique
                .as_slice()
                .write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(supply_aad_prefix) = self.supply_aad_prefix {
            supply_aad_prefix.write_thrift_field(writer, 3, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// The GCM-CTR variant shares the AAD layout of [`AesGcmV1`].
pub(crate) type AesGcmCtrV1 = AesGcmV1;

/// ```text
/// union EncryptionAlgorithm {
///   1: AesGcmV1 AES_GCM_V1
///   2: AesGcmCtrV1 AES_GCM_CTR_V1
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub(crate) enum EncryptionAlgorithm {
    AES_GCM_V1(AesGcmV1),
    AES_GCM_CTR_V1(AesGcmCtrV1),
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for EncryptionAlgorithm {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(general_err!(
                "Received empty union from remote EncryptionAlgorithm"
            ));
        }
        let ret = match field_ident.id {
            1 => Self::AES_GCM_V1(AesGcmV1::read_thrift(&mut *prot)?),
            2 => Self::AES_GCM_CTR_V1(AesGcmCtrV1::read_thrift(&mut *prot)?),
            _ => {
                return Err(general_err!(
                    "Unexpected EncryptionAlgorithm {}",
                    field_ident.id
                ));
            }
        };
        let field_ident = prot.read_field_begin(field_ident.id)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(general_err!(
                "Received multiple fields for union from remote EncryptionAlgorithm"
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for EncryptionAlgorithm {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        match self {
            Self::AES_GCM_V1(algo) => algo.write_thrift_field(writer, 1, 0)?,
            Self::AES_GCM_CTR_V1(algo) => algo.write_thrift_field(writer, 2, 0)?,
        };
        writer.write_struct_end()
    }
}

write_thrift_field!(AesGcmV1, FieldType::Struct);
write_thrift_field!(EncryptionAlgorithm, FieldType::Struct);

/// Crypto metadata leading the footer of files with encrypted footers:
///
/// ```text
/// struct FileCryptoMetaData {
///   1: required EncryptionAlgorithm encryption_algorithm
///   2: optional binary key_metadata
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FileCryptoMetaData {
    pub(crate) encryption_algorithm: EncryptionAlgorithm,
    pub(crate) key_metadata: Option<Vec<u8>>,
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for FileCryptoMetaData {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut encryption_algorithm: Option<EncryptionAlgorithm> = None;
        let mut key_metadata: Option<Vec<u8>> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => encryption_algorithm = Some(EncryptionAlgorithm::read_thrift(&mut *prot)?),
                2 => key_metadata = Some(prot.read_bytes_owned()?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(encryption_algorithm) = encryption_algorithm else {
            return Err(general_err!(
                "Required field encryption_algorithm is missing"
            ));
        };
        Ok(Self {
            encryption_algorithm,
            key_metadata,
        })
    }
}

impl WriteThrift for FileCryptoMetaData {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self.encryption_algorithm.write_thrift_field(writer, 1, 0)?;
        if let Some(key_metadata) = &self.key_metadata {
            key_metadata
                .as_slice()
                .write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

// ColumnCryptoMetaData union:
//
// union ColumnCryptoMetaData {
//   1: EncryptionWithFooterKey ENCRYPTION_WITH_FOOTER_KEY
//   2: EncryptionWithColumnKey ENCRYPTION_WITH_COLUMN_KEY
// }
impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for ColumnCryptoMetaData {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(general_err!(
                "Received empty union from remote ColumnCryptoMetaData"
            ));
        }
        let ret = match field_ident.id {
            1 => {
                prot.skip_empty_struct()?;
                Self::EncryptionWithFooterKey
            }
            2 => Self::EncryptionWithColumnKey(EncryptionWithColumnKey::read_thrift(&mut *prot)?),
            _ => {
                return Err(general_err!(
                    "Unexpected ColumnCryptoMetaData {}",
                    field_ident.id
                ));
            }
        };
        let field_ident = prot.read_field_begin(field_ident.id)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(general_err!(
                "Received multiple fields for union from remote ColumnCryptoMetaData"
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for ColumnCryptoMetaData {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        match self {
            Self::EncryptionWithFooterKey => {
                writer.write_empty_struct(1, 0)?;
            }
            Self::EncryptionWithColumnKey(key) => {
                key.write_thrift_field(writer, 2, 0)?;
            }
        };
        writer.write_struct_end()
    }
}

write_thrift_field!(ColumnCryptoMetaData, FieldType::Struct);

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for EncryptionWithColumnKey {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let mut path_in_schema: Option<Vec<String>> = None;
        let mut key_metadata: Option<Vec<u8>> = None;

        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => path_in_schema = Some(read_thrift_vec::<String, R>(&mut *prot)?),
                2 => key_metadata = Some(prot.read_bytes_owned()?),
                _ => prot.skip(field_ident.field_type)?,
            };
            last_field_id = field_ident.id;
        }
        let Some(path_in_schema) = path_in_schema else {
            return Err(general_err!("Required field path_in_schema is missing"));
        };
        Ok(Self {
            path_in_schema,
            key_metadata,
        })
    }
}

impl WriteThrift for EncryptionWithColumnKey {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self.path_in_schema.write_thrift_field(writer, 1, 0)?;
        if let Some(key_metadata) = &self.key_metadata {
            key_metadata
                .as_slice()
                .write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

write_thrift_field!(EncryptionWithColumnKey, FieldType::Struct);

// ----------------------------------------------------------------------
// Reading the footer structures

// bit positions for required fields in the thrift ColumnMetaData struct
const COL_META_TYPE: u16 = 1 << 1;
const COL_META_ENCODINGS: u16 = 1 << 2;
const COL_META_CODEC: u16 = 1 << 4;
const COL_META_NUM_VALUES: u16 = 1 << 5;
const COL_META_TOTAL_UNCOMP_SZ: u16 = 1 << 6;
const COL_META_TOTAL_COMP_SZ: u16 = 1 << 7;
const COL_META_DATA_PAGE_OFFSET: u16 = 1 << 9;

// a mask where all required fields' bits are set
const COL_META_ALL_REQUIRED: u16 = COL_META_TYPE
    | COL_META_ENCODINGS
    | COL_META_CODEC
    | COL_META_NUM_VALUES
    | COL_META_TOTAL_UNCOMP_SZ
    | COL_META_TOTAL_COMP_SZ
    | COL_META_DATA_PAGE_OFFSET;

// check mask to see if all required fields are set. return an appropriate error if
// any are missing.
pub(crate) fn validate_column_metadata(mask: u16) -> Result<()> {
    if mask != COL_META_ALL_REQUIRED {
        if mask & COL_META_ENCODINGS == 0 {
            return Err(general_err!("Required field encodings is missing"));
        }
        if mask & COL_META_CODEC == 0 {
            return Err(general_err!("Required field codec is missing"));
        }
        if mask & COL_META_NUM_VALUES == 0 {
            return Err(general_err!("Required field num_values is missing"));
        }
        if mask & COL_META_TOTAL_UNCOMP_SZ == 0 {
            return Err(general_err!(
                "Required field total_uncompressed_size is missing"
            ));
        }
        if mask & COL_META_TOTAL_COMP_SZ == 0 {
            return Err(general_err!(
                "Required field total_compressed_size is missing"
            ));
        }
        if mask & COL_META_DATA_PAGE_OFFSET == 0 {
            return Err(general_err!("Required field data_page_offset is missing"));
        }
    }

    Ok(())
}

// Decode `ColumnMetaData` into `column`. Returns a mask of all required fields that
// were observed, to be passed to `validate_column_metadata`.
//
// struct ColumnMetaData {
//   1: required Type type
//   2: required list<Encoding> encodings
//   3: required list<string> path_in_schema
//   4: required CompressionCodec codec
//   5: required i64 num_values
//   6: required i64 total_uncompressed_size
//   7: required i64 total_compressed_size
//   8: optional list<KeyValue> key_value_metadata
//   9: required i64 data_page_offset
//   10: optional i64 index_page_offset
//   11: optional i64 dictionary_page_offset
//   12: optional Statistics statistics;
//   13: optional list<PageEncodingStats> encoding_stats;
// }
pub(crate) fn read_column_metadata(
    prot: &mut ThriftSliceInputProtocol,
    column: &mut ColumnChunkMetaData,
) -> Result<u16> {
    // mask for seen required fields
    let mut seen_mask = 0u16;

    let physical_type = column.column_descr.physical_type();

    let mut last_field_id = 0i16;
    loop {
        let field_ident = prot.read_field_begin(last_field_id)?;
        if field_ident.field_type == FieldType::Stop {
            break;
        }
        match field_ident.id {
            // 1: the type is validated against the column descriptor
            1 => {
                let t = Type::read_thrift(&mut *prot)?;
                if t != physical_type {
                    return Err(general_err!(
                        "Column chunk type {} does not match schema type {}",
                        t,
                        physical_type
                    ));
                }
                seen_mask |= COL_META_TYPE;
            }
            2 => {
                column.encodings =
                    read_thrift_vec::<Encoding, ThriftSliceInputProtocol>(&mut *prot)?;
                seen_mask |= COL_META_ENCODINGS;
            }
            // 3: path_in_schema is redundant, the descriptor has it
            3 => prot.skip(field_ident.field_type)?,
            4 => {
                column.compression = Compression::read_thrift(&mut *prot)?;
                seen_mask |= COL_META_CODEC;
            }
            5 => {
                column.num_values = i64::read_thrift(&mut *prot)?;
                seen_mask |= COL_META_NUM_VALUES;
            }
            6 => {
                column.total_uncompressed_size = i64::read_thrift(&mut *prot)?;
                seen_mask |= COL_META_TOTAL_UNCOMP_SZ;
            }
            7 => {
                column.total_compressed_size = i64::read_thrift(&mut *prot)?;
                seen_mask |= COL_META_TOTAL_COMP_SZ;
            }
            9 => {
                column.data_page_offset = i64::read_thrift(&mut *prot)?;
                seen_mask |= COL_META_DATA_PAGE_OFFSET;
            }
            10 => {
                column.index_page_offset = Some(i64::read_thrift(&mut *prot)?);
            }
            11 => {
                column.dictionary_page_offset = Some(i64::read_thrift(&mut *prot)?);
            }
            12 => {
                let stats = PageStatistics::read_thrift(&mut *prot)?;
                column.statistics =
                    crate::file::statistics::from_thrift(physical_type, Some(stats))?;
            }
            13 => {
                let val =
                    read_thrift_vec::<PageEncodingStats, ThriftSliceInputProtocol>(&mut *prot)?;
                column.encoding_stats = Some(val);
            }
            _ => {
                prot.skip(field_ident.field_type)?;
            }
        };
        last_field_id = field_ident.id;
    }

    Ok(seen_mask)
}

// struct ColumnChunk {
//   1: optional string file_path
//   2: required i64 file_offset = 0
//   3: optional ColumnMetaData meta_data
//   4: optional i64 offset_index_offset
//   5: optional i32 offset_index_length
//   6: optional i64 column_index_offset
//   7: optional i32 column_index_length
//   8: optional ColumnCryptoMetaData crypto_metadata
//   9: optional binary encrypted_column_metadata
// }
fn read_column_chunk(
    prot: &mut ThriftSliceInputProtocol,
    column_descr: &Arc<ColumnDescriptor>,
) -> Result<ColumnChunkMetaData> {
    // create a default initialized ColumnChunkMetaData
    let mut col = ColumnChunkMetaDataBuilder::new(column_descr.clone()).build()?;

    // seen flag for file_offset
    let mut has_file_offset = false;

    // mask of seen flags for ColumnMetaData
    let mut col_meta_mask = 0u16;

    let mut last_field_id = 0i16;
    loop {
        let field_ident = prot.read_field_begin(last_field_id)?;
        if field_ident.field_type == FieldType::Stop {
            break;
        }
        match field_ident.id {
            1 => {
                col.file_path = Some(String::read_thrift(&mut *prot)?);
            }
            2 => {
                col.file_offset = i64::read_thrift(&mut *prot)?;
                has_file_offset = true;
            }
            3 => {
                col_meta_mask = read_column_metadata(&mut *prot, &mut col)?;
            }
            8 => {
                col.column_crypto_metadata = Some(ColumnCryptoMetaData::read_thrift(&mut *prot)?);
            }
            9 => {
                col.encrypted_column_metadata = Some(prot.read_bytes_owned()?);
            }
            _ => {
                prot.skip(field_ident.field_type)?;
            }
        };
        last_field_id = field_ident.id;
    }

    // the only required field of ColumnChunk itself
    if !has_file_offset {
        return Err(general_err!("Required field file_offset is missing"));
    };

    // if encrypted just return; the rest is populated after decrypting the footer
    if col.encrypted_column_metadata.is_some() {
        return Ok(col);
    }

    // not encrypted, so make sure all required fields were read
    validate_column_metadata(col_meta_mask)?;

    Ok(col)
}

// struct RowGroup {
//   1: required list<ColumnChunk> columns
//   2: required i64 total_byte_size
//   3: required i64 num_rows
//   4: optional list<SortingColumn> sorting_columns
//   5: optional i64 file_offset
//   6: optional i64 total_compressed_size
//   7: optional i16 ordinal
// }
fn read_row_group(
    prot: &mut ThriftSliceInputProtocol,
    schema_descr: &Arc<SchemaDescriptor>,
) -> Result<RowGroupMetaData> {
    // create default initialized RowGroupMetaData
    let mut row_group = RowGroupMetaDataBuilder::new(schema_descr.clone()).build_unchecked();

    // mask values for required fields
    const RG_COLUMNS: u8 = 1 << 1;
    const RG_TOT_BYTE_SIZE: u8 = 1 << 2;
    const RG_NUM_ROWS: u8 = 1 << 3;
    const RG_ALL_REQUIRED: u8 = RG_COLUMNS | RG_TOT_BYTE_SIZE | RG_NUM_ROWS;

    let mut mask = 0u8;

    let mut last_field_id = 0i16;
    loop {
        let field_ident = prot.read_field_begin(last_field_id)?;
        if field_ident.field_type == FieldType::Stop {
            break;
        }
        match field_ident.id {
            1 => {
                let list_ident = prot.read_list_begin()?;
                if schema_descr.num_columns() != list_ident.size as usize {
                    return Err(general_err!(
                        "Column count mismatch. Schema has {} columns while Row Group has {}",
                        schema_descr.num_columns(),
                        list_ident.size
                    ));
                }
                for i in 0..list_ident.size as usize {
                    let col = read_column_chunk(prot, &schema_descr.columns()[i])?;
                    row_group.columns.push(col);
                }
                mask |= RG_COLUMNS;
            }
            2 => {
                row_group.total_byte_size = i64::read_thrift(&mut *prot)?;
                mask |= RG_TOT_BYTE_SIZE;
            }
            3 => {
                row_group.num_rows = i64::read_thrift(&mut *prot)?;
                mask |= RG_NUM_ROWS;
            }
            5 => {
                row_group.file_offset = Some(i64::read_thrift(&mut *prot)?);
            }
            // 6: total_compressed_size is recomputed from the columns
            7 => {
                row_group.ordinal = Some(i16::read_thrift(&mut *prot)?);
            }
            _ => {
                prot.skip(field_ident.field_type)?;
            }
        };
        last_field_id = field_ident.id;
    }

    if mask != RG_ALL_REQUIRED {
        if mask & RG_COLUMNS == 0 {
            return Err(general_err!("Required field columns is missing"));
        }
        if mask & RG_TOT_BYTE_SIZE == 0 {
            return Err(general_err!("Required field total_byte_size is missing"));
        }
        if mask & RG_NUM_ROWS == 0 {
            return Err(general_err!("Required field num_rows is missing"));
        }
    }

    Ok(row_group)
}

/// Create [`ParquetMetaData`] from thrift encoded bytes of a plaintext
/// `FileMetaData`.
///
/// struct FileMetaData {
///   1: required i32 version
///   2: required list<SchemaElement> schema;
///   3: required i64 num_rows
///   4: required list<RowGroup> row_groups
///   5: optional list<KeyValue> key_value_metadata
///   6: optional string created_by
///   7: optional list<ColumnOrder> column_orders;
///   8: optional EncryptionAlgorithm encryption_algorithm
///   9: optional binary footer_signing_key_metadata
/// }
pub(crate) fn parquet_metadata_from_bytes(buf: &[u8]) -> Result<ParquetMetaData> {
    let mut prot = ThriftSliceInputProtocol::new(buf);

    let mut version: Option<i32> = None;
    let mut num_rows: Option<i64> = None;
    let mut row_groups: Option<Vec<RowGroupMetaData>> = None;
    let mut key_value_metadata: Option<Vec<KeyValue>> = None;
    let mut created_by: Option<&str> = None;
    let mut column_orders: Option<Vec<ColumnOrder>> = None;
    let mut encryption_algorithm: Option<EncryptionAlgorithm> = None;
    let mut footer_signing_key_metadata: Option<Vec<u8>> = None;

    // this must be set before parsing row groups
    let mut schema_descr: Option<Arc<SchemaDescriptor>> = None;

    let mut last_field_id = 0i16;
    loop {
        let field_ident = prot.read_field_begin(last_field_id)?;
        if field_ident.field_type == FieldType::Stop {
            break;
        }
        match field_ident.id {
            1 => {
                version = Some(i32::read_thrift(&mut prot)?);
            }
            2 => {
                // read schema and convert to SchemaDescriptor for use when reading row
                // groups
                let val = read_thrift_vec::<SchemaElement, ThriftSliceInputProtocol>(&mut prot)?;
                let val = schema_from_array(val)?;
                schema_descr = Some(Arc::new(SchemaDescriptor::new(val)));
            }
            3 => {
                num_rows = Some(i64::read_thrift(&mut prot)?);
            }
            4 => {
                let Some(schema_descr) = schema_descr.as_ref() else {
                    return Err(general_err!("Required field schema is missing"));
                };
                let list_ident = prot.read_list_begin()?;
                let mut rg_vec = Vec::with_capacity(list_ident.size.clamp(0, 1024) as usize);
                for ordinal in 0..list_ident.size {
                    let ordinal: i16 = ordinal.try_into().map_err(|_| {
                        general_err!("Row group ordinal {} exceeds i16 max value", ordinal)
                    })?;
                    let mut rg = read_row_group(&mut prot, schema_descr)?;
                    if rg.ordinal.is_none() {
                        rg.ordinal = Some(ordinal);
                    }
                    rg_vec.push(rg);
                }
                row_groups = Some(rg_vec);
            }
            5 => {
                let val = read_thrift_vec::<KeyValue, ThriftSliceInputProtocol>(&mut prot)?;
                key_value_metadata = Some(val);
            }
            6 => {
                created_by = Some(<&str>::read_thrift(&mut prot)?);
            }
            7 => {
                let val = read_thrift_vec::<ColumnOrder, ThriftSliceInputProtocol>(&mut prot)?;
                column_orders = Some(val);
            }
            8 => {
                encryption_algorithm = Some(EncryptionAlgorithm::read_thrift(&mut prot)?);
            }
            9 => {
                footer_signing_key_metadata = Some(prot.read_bytes_owned()?);
            }
            _ => {
                prot.skip(field_ident.field_type)?;
            }
        };
        last_field_id = field_ident.id;
    }
    let Some(version) = version else {
        return Err(general_err!("Required field version is missing"));
    };
    let Some(num_rows) = num_rows else {
        return Err(general_err!("Required field num_rows is missing"));
    };
    let Some(row_groups) = row_groups else {
        return Err(general_err!("Required field row_groups is missing"));
    };
    let Some(schema_descr) = schema_descr else {
        return Err(general_err!("Required field schema is missing"));
    };

    let created_by = created_by.map(|c| c.to_owned());

    // need to map read column orders to actual sort orders based on the schema
    if column_orders
        .as_ref()
        .is_some_and(|cos| cos.len() != schema_descr.num_columns())
    {
        return Err(general_err!("Column order length mismatch"));
    }
    let column_orders = column_orders.map(|mut cos| {
        for (i, column) in schema_descr.columns().iter().enumerate() {
            if let ColumnOrder::TYPE_DEFINED_ORDER(_) = cos[i] {
                let sort_order = ColumnOrder::get_sort_order(
                    column.converted_type(),
                    column.physical_type(),
                );
                cos[i] = ColumnOrder::TYPE_DEFINED_ORDER(sort_order);
            }
        }
        cos
    });

    let fmd = FileMetaData::new(
        version,
        num_rows,
        created_by,
        key_value_metadata,
        schema_descr,
        column_orders,
    )
    .with_encryption_algorithm(encryption_algorithm)
    .with_footer_signing_key_metadata(footer_signing_key_metadata);

    Ok(ParquetMetaData::new(fmd, row_groups))
}

// ----------------------------------------------------------------------
// Encrypted footer and column metadata

fn row_group_from_encrypted_thrift(
    mut rg: RowGroupMetaData,
    decryptor: Option<&FileDecryptor>,
) -> Result<RowGroupMetaData> {
    let schema_descr = rg.schema_descr.clone();

    if schema_descr.num_columns() != rg.columns.len() {
        return Err(general_err!(
            "Column count mismatch. Schema has {} columns while Row Group has {}",
            schema_descr.num_columns(),
            rg.columns.len()
        ));
    }
    let mut columns = vec![];

    for (i, (mut c, d)) in rg
        .columns
        .drain(0..)
        .zip(schema_descr.columns())
        .enumerate()
    {
        // Read encrypted metadata if it's present and we have a decryptor.
        if let (true, Some(decryptor)) = (c.encrypted_column_metadata.is_some(), decryptor) {
            let column_decryptor = match c.crypto_metadata() {
                None => {
                    return Err(general_err!(
                        "No crypto_metadata is set for column '{}', which has encrypted metadata",
                        d.path().string()
                    ));
                }
                Some(ColumnCryptoMetaData::EncryptionWithColumnKey(crypto_metadata)) => {
                    let column_name = crypto_metadata.path_in_schema.join(".");
                    // If the key is unavailable the chunk is passed through with its
                    // metadata still encrypted; readers with the key for other
                    // columns can still use them.
                    match decryptor.get_column_metadata_decryptor(
                        column_name.as_str(),
                        crypto_metadata.key_metadata.as_deref(),
                    ) {
                        Ok(decryptor) => decryptor,
                        Err(_) => {
                            columns.push(c);
                            continue;
                        }
                    }
                }
                Some(ColumnCryptoMetaData::EncryptionWithFooterKey) => {
                    decryptor.get_footer_decryptor()?
                }
            };

            let column_aad = create_module_aad(
                decryptor.file_aad(),
                ModuleType::ColumnMetaData,
                rg.ordinal.unwrap() as usize,
                i,
                None,
            )?;

            // Take the encrypted column metadata as it is no longer needed.
            let buf = c.encrypted_column_metadata.take().unwrap();
            let decrypted_cc_buf =
                column_decryptor
                    .decrypt(&buf, column_aad.as_ref())
                    .map_err(|_| {
                        general_err!(
                            "Unable to decrypt column '{}', perhaps the column key is wrong?",
                            d.path().string()
                        )
                    })?;

            // parse decrypted buffer and then replace fields in 'c'
            let mut prot = ThriftSliceInputProtocol::new(&decrypted_cc_buf);
            let mask = read_column_metadata(&mut prot, &mut c)?;
            validate_column_metadata(mask)?;

            columns.push(c);
        } else {
            columns.push(c);
        }
    }

    rg.columns = columns;
    Ok(rg)
}

/// Decodes [`ParquetMetaData`] from the provided bytes, handling metadata that may
/// be encrypted.
///
/// Typically this is used to decode the metadata from the end of a parquet file. The
/// format of `buf` is the Thrift compact binary protocol. The buffer can be encrypted
/// with the AES GCM cipher as specified in the Parquet encryption specification.
pub(crate) fn parquet_metadata_with_encryption(
    file_decryption_properties: Option<&Arc<FileDecryptionProperties>>,
    encrypted_footer: bool,
    buf: &[u8],
) -> Result<ParquetMetaData> {
    let mut buf = buf;
    let mut file_decryptor = None;
    let decrypted_fmd_buf;

    if encrypted_footer {
        let mut prot = ThriftSliceInputProtocol::new(buf);
        if let Some(file_decryption_properties) = file_decryption_properties {
            let t_file_crypto_metadata: FileCryptoMetaData =
                FileCryptoMetaData::read_thrift(&mut prot)
                    .map_err(|e| general_err!("Could not parse crypto metadata: {}", e))?;
            let supply_aad_prefix = match &t_file_crypto_metadata.encryption_algorithm {
                EncryptionAlgorithm::AES_GCM_V1(algo) => algo.supply_aad_prefix,
                _ => Some(false),
            }
            .unwrap_or(false);
            if supply_aad_prefix && file_decryption_properties.aad_prefix().is_none() {
                return Err(general_err!(
                    "Parquet file was encrypted with an AAD prefix that is not stored in the file, \
                        but no AAD prefix was provided in the file decryption properties"
                ));
            }
            let decryptor = get_file_decryptor(
                t_file_crypto_metadata.encryption_algorithm,
                t_file_crypto_metadata.key_metadata.as_deref(),
                file_decryption_properties,
            )?;
            let footer_decryptor = decryptor.get_footer_decryptor();
            let aad_footer = create_footer_aad(decryptor.file_aad())?;

            decrypted_fmd_buf = footer_decryptor?
                .decrypt(prot.as_slice().as_ref(), aad_footer.as_ref())
                .map_err(|_| {
                    general_err!(
                        "Provided footer key and AAD were unable to decrypt parquet footer"
                    )
                })?;

            buf = &decrypted_fmd_buf;
            file_decryptor = Some(decryptor);
        } else {
            return Err(general_err!(
                "Parquet file has an encrypted footer but decryption properties were not provided"
            ));
        }
    }

    let parquet_meta = parquet_metadata_from_bytes(buf)
        .map_err(|e| general_err!("Could not parse metadata: {}", e))?;

    let ParquetMetaData {
        mut file_metadata,
        row_groups,
        file_decryptor: _,
    } = parquet_meta;

    // Take the encryption algorithm and footer signing key metadata as they are no
    // longer needed after this.
    if let (Some(algo), Some(file_decryption_properties)) = (
        file_metadata.encryption_algorithm.take(),
        file_decryption_properties,
    ) {
        let footer_signing_key_metadata = file_metadata.footer_signing_key_metadata.take();

        // File has a plaintext footer but encryption algorithm is set
        let file_decryptor_value = get_file_decryptor(
            algo,
            footer_signing_key_metadata.as_deref(),
            file_decryption_properties,
        )?;
        if file_decryption_properties.check_plaintext_footer_integrity() && !encrypted_footer {
            file_decryptor_value.verify_plaintext_footer_signature(buf)?;
        }
        file_decryptor = Some(file_decryptor_value);
    } else if !encrypted_footer {
        // Neither footer magic nor metadata mark this file as encrypted
        if let Some(file_decryption_properties) = file_decryption_properties {
            if !file_decryption_properties.plaintext_files_allowed() {
                return Err(general_err!(
                    "Parquet file is not encrypted but decryption properties without \
                     plaintext files allowed were provided"
                ));
            }
        }
    }

    // decrypt column chunk info
    let row_groups = row_groups
        .into_iter()
        .map(|rg| row_group_from_encrypted_thrift(rg, file_decryptor.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let metadata =
        ParquetMetaData::new(file_metadata, row_groups).with_file_decryptor(file_decryptor);

    Ok(metadata)
}

fn get_file_decryptor(
    encryption_algorithm: EncryptionAlgorithm,
    footer_key_metadata: Option<&[u8]>,
    file_decryption_properties: &Arc<FileDecryptionProperties>,
) -> Result<FileDecryptor> {
    match encryption_algorithm {
        EncryptionAlgorithm::AES_GCM_V1(algo) => {
            let aad_file_unique = algo
                .aad_file_unique
                .ok_or_else(|| general_err!("AAD unique file identifier is not set"))?;
            let aad_prefix = if let Some(aad_prefix) = file_decryption_properties.aad_prefix() {
                aad_prefix.clone()
            } else {
                algo.aad_prefix.unwrap_or_default()
            };

            if let Some(verifier) = file_decryption_properties.aad_prefix_verifier() {
                verifier.verify(&aad_prefix)?;
            }

            FileDecryptor::new(
                file_decryption_properties,
                footer_key_metadata,
                aad_file_unique,
                aad_prefix,
            )
        }
        EncryptionAlgorithm::AES_GCM_CTR_V1(_) => Err(nyi_err!(
            "The AES_GCM_CTR_V1 encryption algorithm is not yet supported"
        )),
    }
}

// ----------------------------------------------------------------------
// Writing the footer structures

/// True when the plaintext copy of the column metadata may carry statistics and
/// encoding stats.
///
/// If encrypted column metadata is present, the column is encrypted with a different
/// key than the footer or a plaintext footer is used, so these fields are sensitive
/// and only belong in the encrypted copy.
fn should_write_column_stats(column_chunk: &ColumnChunkMetaData) -> bool {
    column_chunk.encrypted_column_metadata.is_none()
}

/// Serialize the bits of the column chunk needed for a thrift `ColumnMetaData`
/// struct.
pub(crate) fn serialize_column_meta_data<W: Write>(
    column_chunk: &ColumnChunkMetaData,
    w: &mut ThriftCompactOutputProtocol<W>,
) -> Result<()> {
    column_chunk.column_type().write_thrift_field(w, 1, 0)?;
    column_chunk.encodings.write_thrift_field(w, 2, 1)?;
    let path = column_chunk.column_descr.path().parts();
    let path: Vec<&str> = path.iter().map(|v| v.as_str()).collect();
    path.write_thrift_field(w, 3, 2)?;
    column_chunk.compression.write_thrift_field(w, 4, 3)?;
    column_chunk.num_values.write_thrift_field(w, 5, 4)?;
    column_chunk
        .total_uncompressed_size
        .write_thrift_field(w, 6, 5)?;
    column_chunk
        .total_compressed_size
        .write_thrift_field(w, 7, 6)?;
    // no key_value_metadata here
    let mut last_field_id = column_chunk.data_page_offset.write_thrift_field(w, 9, 7)?;
    if let Some(index_page_offset) = column_chunk.index_page_offset {
        last_field_id = index_page_offset.write_thrift_field(w, 10, last_field_id)?;
    }
    if let Some(dictionary_page_offset) = column_chunk.dictionary_page_offset {
        last_field_id = dictionary_page_offset.write_thrift_field(w, 11, last_field_id)?;
    }

    if should_write_column_stats(column_chunk) {
        if let Some(stats) = crate::file::statistics::to_thrift(column_chunk.statistics()) {
            last_field_id = stats.write_thrift_field(w, 12, last_field_id)?;
        }
        if let Some(encoding_stats) = column_chunk.page_encoding_stats() {
            encoding_stats.write_thrift_field(w, 13, last_field_id)?;
        }
    }

    w.write_struct_end()
}

write_thrift_field!(PageStatistics, FieldType::Struct);

impl WriteThrift for ColumnChunkMetaData {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    #[allow(unused_assignments)]
    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(file_path) = self.file_path() {
            last_field_id = file_path.write_thrift_field(writer, 1, last_field_id)?;
        }
        last_field_id = self
            .file_offset()
            .write_thrift_field(writer, 2, last_field_id)?;

        // When the footer is encrypted and encrypted_column_metadata is present, the
        // plaintext meta_data field is skipped entirely. When the footer is plaintext,
        // meta_data is still written for legacy readers, with the sensitive fields
        // (statistics, encoding stats) stripped.
        let write_meta_data =
            self.encrypted_column_metadata.is_none() || self.plaintext_footer_mode;
        if write_meta_data {
            writer.write_field_begin(FieldType::Struct, 3, last_field_id)?;
            serialize_column_meta_data(self, writer)?;
            last_field_id = 3;
        }

        if let Some(crypto_metadata) = self.crypto_metadata() {
            last_field_id = crypto_metadata.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(encrypted_meta) = self.encrypted_column_metadata.as_ref() {
            encrypted_meta
                .as_slice()
                .write_thrift_field(writer, 9, last_field_id)?;
        }

        writer.write_struct_end()
    }
}

impl WriteThrift for RowGroupMetaData {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        // this will call ColumnChunkMetaData::write_thrift
        self.columns.write_thrift_field(writer, 1, 0)?;
        self.total_byte_size.write_thrift_field(writer, 2, 1)?;
        let mut last_field_id = self.num_rows.write_thrift_field(writer, 3, 2)?;
        if let Some(file_offset) = self.file_offset() {
            last_field_id = file_offset.write_thrift_field(writer, 5, last_field_id)?;
        }
        // this is optional, but we'll always write it
        last_field_id = self
            .compressed_size()
            .write_thrift_field(writer, 6, last_field_id)?;
        if let Some(ordinal) = self.ordinal() {
            ordinal.write_thrift_field(writer, 7, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Borrowing wrapper tying together the pieces of a `FileMetaData` struct for
/// serialization.
pub(crate) struct FileMeta<'a> {
    pub(crate) file_metadata: &'a FileMetaData,
    pub(crate) row_groups: &'a Vec<RowGroupMetaData>,
    pub(crate) encryption_algorithm: Option<EncryptionAlgorithm>,
    pub(crate) footer_signing_key_metadata: Option<Vec<u8>>,
}

impl WriteThrift for FileMeta<'_> {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    #[allow(unused_assignments)]
    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        self.file_metadata
            .version()
            .write_thrift_field(writer, 1, 0)?;

        // field 2 is the schema: depth-first traversal of the tree, converting to
        // SchemaElement and writing along the way.
        let root = self.file_metadata.schema_descr().root_schema_ptr();
        let schema_len = num_nodes(&root)?;
        writer.write_field_begin(FieldType::List, 2, 1)?;
        writer.write_list_begin(ElementType::Struct, schema_len)?;
        write_schema(&root, writer)?;

        self.file_metadata
            .num_rows()
            .write_thrift_field(writer, 3, 2)?;

        // this will call RowGroupMetaData::write_thrift
        let mut last_field_id = self.row_groups.write_thrift_field(writer, 4, 3)?;

        if let Some(kv_metadata) = self.file_metadata.key_value_metadata() {
            last_field_id = kv_metadata.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(created_by) = self.file_metadata.created_by() {
            last_field_id = created_by.write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(column_orders) = self.file_metadata.column_orders() {
            last_field_id = column_orders.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(algo) = self.encryption_algorithm.as_ref() {
            last_field_id = algo.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(key) = self.footer_signing_key_metadata.as_ref() {
            key.as_slice().write_thrift_field(writer, 9, last_field_id)?;
        }

        writer.write_struct_end()
    }
}

fn write_schema<W: Write>(
    schema: &TypePtr,
    writer: &mut ThriftCompactOutputProtocol<W>,
) -> Result<()> {
    if !schema.is_group() {
        return Err(general_err!("Root schema must be Group type"));
    }
    write_schema_helper(schema, writer)
}

fn write_schema_helper<W: Write>(
    node: &TypePtr,
    writer: &mut ThriftCompactOutputProtocol<W>,
) -> Result<()> {
    match node.as_ref() {
        crate::schema::types::Type::PrimitiveType {
            basic_info,
            physical_type,
            type_length,
            scale,
            precision,
        } => {
            let element = SchemaElement {
                r#type: Some(*physical_type),
                type_length: if *type_length >= 0 {
                    Some(*type_length)
                } else {
                    None
                },
                repetition_type: Some(basic_info.repetition()),
                name: basic_info.name(),
                num_children: None,
                converted_type: match basic_info.converted_type() {
                    ConvertedType::NONE => None,
                    other => Some(other),
                },
                scale: if *scale >= 0 { Some(*scale) } else { None },
                precision: if *precision >= 0 {
                    Some(*precision)
                } else {
                    None
                },
                field_id: if basic_info.has_id() {
                    Some(basic_info.id())
                } else {
                    None
                },
            };
            element.write_thrift(writer)
        }
        crate::schema::types::Type::GroupType { basic_info, fields } => {
            let repetition = if basic_info.has_repetition() {
                Some(basic_info.repetition())
            } else {
                None
            };

            let element = SchemaElement {
                r#type: None,
                type_length: None,
                repetition_type: repetition,
                name: basic_info.name(),
                num_children: Some(fields.len().try_into()?),
                converted_type: match basic_info.converted_type() {
                    ConvertedType::NONE => None,
                    other => Some(other),
                },
                scale: None,
                precision: None,
                field_id: if basic_info.has_id() {
                    Some(basic_info.id())
                } else {
                    None
                },
            };

            element.write_thrift(writer)?;

            // Add child elements for a group
            for field in fields {
                write_schema_helper(field, writer)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::tests::test_roundtrip;

    #[test]
    fn test_page_header_roundtrip() {
        test_roundtrip(PageHeader {
            r#type: PageType::DATA_PAGE,
            uncompressed_page_size: 100,
            compressed_page_size: 80,
            crc: None,
            data_page_header: Some(DataPageHeader {
                num_values: 10,
                encoding: Encoding::PLAIN,
                definition_level_encoding: Encoding::RLE,
                repetition_level_encoding: Encoding::RLE,
                statistics: Some(PageStatistics {
                    min_value: Some(vec![1, 0, 0, 0]),
                    max_value: Some(vec![9, 0, 0, 0]),
                    null_count: Some(2),
                    ..Default::default()
                }),
            }),
            dictionary_page_header: None,
        });

        test_roundtrip(PageHeader {
            r#type: PageType::DICTIONARY_PAGE,
            uncompressed_page_size: 5,
            compressed_page_size: 5,
            crc: None,
            data_page_header: None,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: 5,
                encoding: Encoding::PLAIN,
                is_sorted: Some(false),
            }),
        });
    }

    #[test]
    fn test_page_encoding_stats_roundtrip() {
        test_roundtrip(PageEncodingStats {
            page_type: PageType::DATA_PAGE,
            encoding: Encoding::RLE_DICTIONARY,
            count: 7,
        });
        test_roundtrip(PageEncodingStats {
            page_type: PageType::DICTIONARY_PAGE,
            encoding: Encoding::PLAIN,
            count: 1,
        });
    }

    #[test]
    fn test_key_value_roundtrip() {
        test_roundtrip(KeyValue::new("key".to_string(), "value".to_string()));
        test_roundtrip(KeyValue::new("key".to_string(), None));
    }

    #[test]
    fn test_encryption_algorithm_roundtrip() {
        test_roundtrip(EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
            aad_prefix: Some(b"prefix".to_vec()),
            aad_file_unique: Some(b"unique88".to_vec()),
            supply_aad_prefix: Some(false),
        }));
        test_roundtrip(EncryptionAlgorithm::AES_GCM_CTR_V1(AesGcmCtrV1::default()));
    }

    #[test]
    fn test_file_crypto_metadata_roundtrip() {
        test_roundtrip(FileCryptoMetaData {
            encryption_algorithm: EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
                aad_prefix: None,
                aad_file_unique: Some(vec![1, 2, 3, 4, 5, 6, 7, 8]),
                supply_aad_prefix: None,
            }),
            key_metadata: Some(b"kf".to_vec()),
        });
    }

    #[test]
    fn test_column_crypto_metadata_roundtrip() {
        test_roundtrip(ColumnCryptoMetaData::EncryptionWithFooterKey);
        test_roundtrip(ColumnCryptoMetaData::EncryptionWithColumnKey(
            EncryptionWithColumnKey {
                path_in_schema: vec!["nested".to_string(), "b".to_string()],
                key_metadata: Some(vec![0, 1, 2]),
            },
        ));
    }
}

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

//! Rust mappings for the enums defined in the Parquet thrift IDL, plus the
//! sort-order and column-order types derived from them.

use std::fmt;
use std::io::Write;

use crate::errors::{ParquetError, Result};
use crate::thrift::{
    ElementType, FieldType, ReadThrift, ThriftCompactInputProtocol, ThriftCompactOutputProtocol,
    WriteThrift, WriteThriftField,
};
use crate::{thrift_enum, write_thrift_field};

// ----------------------------------------------------------------------
// Types from the thrift definition

thrift_enum!(
/// The physical type of a leaf column as stored in the file.
pub enum Type {
    BOOLEAN = 0;
    INT32 = 1;
    INT64 = 2;
    INT96 = 3;
    FLOAT = 4;
    DOUBLE = 5;
    BYTE_ARRAY = 6;
    FIXED_LEN_BYTE_ARRAY = 7;
}
);

thrift_enum!(
/// Representation of field repetition in a schema.
pub enum Repetition {
    /// Field is required (can not be null) and each record has exactly one value.
    REQUIRED = 0;
    /// Field is optional (can be null) and each record has zero or one values.
    OPTIONAL = 1;
    /// Field is repeated and can contain zero or more values.
    REPEATED = 2;
}
);

thrift_enum!(
/// Encodings supported for page payloads.
///
/// Not all encodings are valid for all types. These enums are also used to specify the
/// encoding of definition and repetition levels.
pub enum Encoding {
    /// The default encoding.
    ///
    /// - BOOLEAN - 1 bit per value, 0 is false, 1 is true.
    /// - INT32 - 4 bytes per value, stored as little-endian.
    /// - INT64 - 8 bytes per value, stored as little-endian.
    /// - FLOAT - 4 bytes per value, stored as IEEE little-endian.
    /// - DOUBLE - 8 bytes per value, stored as IEEE little-endian.
    /// - BYTE_ARRAY - 4 byte length stored as little endian, followed by bytes.
    /// - FIXED_LEN_BYTE_ARRAY - just the bytes are stored.
    PLAIN = 0;
    /// **Deprecated** dictionary encoding.
    ///
    /// The values in the dictionary are encoded using PLAIN encoding. Since it is
    /// deprecated, RLE_DICTIONARY encoding is used for a data page, and PLAIN encoding
    /// is used for the dictionary page.
    PLAIN_DICTIONARY = 2;
    /// Group packed run length encoding.
    ///
    /// Usable for definition/repetition levels encoding and boolean values.
    RLE = 3;
    /// **Deprecated** bit-packed encoding for levels.
    #[deprecated(note = "unsupported by the writer, use RLE instead")]
    BIT_PACKED = 4;
    /// Delta encoding for integers, either INT32 or INT64.
    DELTA_BINARY_PACKED = 5;
    /// Encoding for byte arrays to separate the length values and the data.
    DELTA_LENGTH_BYTE_ARRAY = 6;
    /// Incremental encoding for byte arrays.
    DELTA_BYTE_ARRAY = 7;
    /// Dictionary encoding.
    ///
    /// The ids are encoded using the RLE encoding.
    RLE_DICTIONARY = 8;
    /// Encoding for fixed-width data.
    BYTE_STREAM_SPLIT = 9;
}
);

thrift_enum!(
/// Supported block compression algorithms.
pub enum Compression {
    UNCOMPRESSED = 0;
    SNAPPY = 1;
    GZIP = 2;
    LZO = 3;
    BROTLI = 4;
    LZ4 = 5;
    ZSTD = 6;
    LZ4_RAW = 7;
}
);

thrift_enum!(
/// Types of pages found in column chunks.
pub enum PageType {
    DATA_PAGE = 0;
    INDEX_PAGE = 1;
    DICTIONARY_PAGE = 2;
    DATA_PAGE_V2 = 3;
}
);

/// Common types (converted types) used by frameworks when using Parquet.
///
/// This helps map between types in those frameworks to the base types in Parquet.
/// This is only metadata and not needed to read or write the data.
/// `NONE` stands for an absent converted type annotation.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[allow(non_camel_case_types)]
pub enum ConvertedType {
    NONE,
    /// A BYTE_ARRAY actually contains UTF8 encoded chars.
    UTF8,
    /// A map is converted as an optional field containing a repeated key/value pair.
    MAP,
    /// A key/value pair is converted into a group of two fields.
    MAP_KEY_VALUE,
    /// A list is converted into an optional field containing a repeated field for its
    /// values.
    LIST,
    /// An enum is converted into a BYTE_ARRAY field.
    ENUM,
    /// A decimal value. The scale and precision are stored in the SchemaElement.
    DECIMAL,
    /// A date, stored as days since the Unix epoch in an INT32.
    DATE,
    /// A time, stored as milliseconds since midnight in an INT32.
    TIME_MILLIS,
    /// A time, stored as microseconds since midnight in an INT64.
    TIME_MICROS,
    /// A timestamp, stored as milliseconds since the Unix epoch in an INT64.
    TIMESTAMP_MILLIS,
    /// A timestamp, stored as microseconds since the Unix epoch in an INT64.
    TIMESTAMP_MICROS,
    /// An unsigned integer value. 8 bits wide.
    UINT_8,
    /// An unsigned integer value. 16 bits wide.
    UINT_16,
    /// An unsigned integer value. 32 bits wide.
    UINT_32,
    /// An unsigned integer value. 64 bits wide.
    UINT_64,
    /// A signed integer value. 8 bits wide.
    INT_8,
    /// A signed integer value. 16 bits wide.
    INT_16,
    /// A signed integer value. 32 bits wide.
    INT_32,
    /// A signed integer value. 64 bits wide.
    INT_64,
    /// A BYTE_ARRAY containing an embedded JSON document.
    JSON,
    /// A BYTE_ARRAY containing an embedded BSON document.
    BSON,
    /// A deprecated interval of time, stored as a FIXED_LEN_BYTE_ARRAY of length 12.
    INTERVAL,
}

impl ConvertedType {
    pub(crate) fn as_i32(self) -> i32 {
        match self {
            ConvertedType::NONE => panic!("NONE is not part of the thrift definition"),
            ConvertedType::UTF8 => 0,
            ConvertedType::MAP => 1,
            ConvertedType::MAP_KEY_VALUE => 2,
            ConvertedType::LIST => 3,
            ConvertedType::ENUM => 4,
            ConvertedType::DECIMAL => 5,
            ConvertedType::DATE => 6,
            ConvertedType::TIME_MILLIS => 7,
            ConvertedType::TIME_MICROS => 8,
            ConvertedType::TIMESTAMP_MILLIS => 9,
            ConvertedType::TIMESTAMP_MICROS => 10,
            ConvertedType::UINT_8 => 11,
            ConvertedType::UINT_16 => 12,
            ConvertedType::UINT_32 => 13,
            ConvertedType::UINT_64 => 14,
            ConvertedType::INT_8 => 15,
            ConvertedType::INT_16 => 16,
            ConvertedType::INT_32 => 17,
            ConvertedType::INT_64 => 18,
            ConvertedType::JSON => 19,
            ConvertedType::BSON => 20,
            ConvertedType::INTERVAL => 21,
        }
    }
}

impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for ConvertedType {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let val = prot.read_i32()?;
        Ok(match val {
            0 => ConvertedType::UTF8,
            1 => ConvertedType::MAP,
            2 => ConvertedType::MAP_KEY_VALUE,
            3 => ConvertedType::LIST,
            4 => ConvertedType::ENUM,
            5 => ConvertedType::DECIMAL,
            6 => ConvertedType::DATE,
            7 => ConvertedType::TIME_MILLIS,
            8 => ConvertedType::TIME_MICROS,
            9 => ConvertedType::TIMESTAMP_MILLIS,
            10 => ConvertedType::TIMESTAMP_MICROS,
            11 => ConvertedType::UINT_8,
            12 => ConvertedType::UINT_16,
            13 => ConvertedType::UINT_32,
            14 => ConvertedType::UINT_64,
            15 => ConvertedType::INT_8,
            16 => ConvertedType::INT_16,
            17 => ConvertedType::INT_32,
            18 => ConvertedType::INT_64,
            19 => ConvertedType::JSON,
            20 => ConvertedType::BSON,
            21 => ConvertedType::INTERVAL,
            _ => return Err(general_err!("Unexpected ConvertedType {}", val)),
        })
    }
}

impl WriteThrift for ConvertedType {
    const ELEMENT_TYPE: ElementType = ElementType::I32;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        writer.write_i32(self.as_i32())
    }
}

write_thrift_field!(ConvertedType, FieldType::I32);

impl fmt::Display for ConvertedType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ----------------------------------------------------------------------
// Mirrors `parquet::ColumnOrder`

/// Sort order for page and column statistics.
///
/// Types are associated with sort orders and column stats are aggregated using a sort
/// order, and a sort order should be considered when comparing values with statistics
/// min/max.
///
/// See reference in <https://github.com/apache/parquet-cpp/blob/master/src/parquet/types.h>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum SortOrder {
    /// Signed (either value or legacy byte-wise) comparison.
    SIGNED,
    /// Unsigned (depending on physical type either value or byte-wise) comparison.
    UNSIGNED,
    /// Comparison is undefined.
    UNDEFINED,
}

impl SortOrder {
    /// Returns true if this is [`Self::SIGNED`]
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::SIGNED)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Column order that specifies what method was used to aggregate min/max values for
/// statistics.
///
/// If column order is undefined, then it is the legacy behaviour and all values should
/// be compared as signed values/bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum ColumnOrder {
    /// Column uses the order defined by its logical or physical type (if there is no
    /// logical type), parquet-format 2.4.0 onwards.
    TYPE_DEFINED_ORDER(SortOrder),
    /// Undefined column order, means legacy behaviour before parquet-format 2.4.0.
    /// Sort order is always SIGNED.
    UNDEFINED,
}

impl ColumnOrder {
    /// Returns sort order for a physical/converted type.
    pub fn get_sort_order(converted_type: ConvertedType, physical_type: Type) -> SortOrder {
        match converted_type {
            // Unsigned byte-wise comparison.
            ConvertedType::UTF8
            | ConvertedType::JSON
            | ConvertedType::BSON
            | ConvertedType::ENUM => SortOrder::UNSIGNED,

            ConvertedType::INT_8
            | ConvertedType::INT_16
            | ConvertedType::INT_32
            | ConvertedType::INT_64 => SortOrder::SIGNED,

            ConvertedType::UINT_8
            | ConvertedType::UINT_16
            | ConvertedType::UINT_32
            | ConvertedType::UINT_64 => SortOrder::UNSIGNED,

            // Signed comparison of the represented value.
            ConvertedType::DATE
            | ConvertedType::TIME_MILLIS
            | ConvertedType::TIME_MICROS
            | ConvertedType::TIMESTAMP_MILLIS
            | ConvertedType::TIMESTAMP_MICROS => SortOrder::SIGNED,

            ConvertedType::DECIMAL => SortOrder::SIGNED,

            ConvertedType::INTERVAL => SortOrder::UNDEFINED,

            ConvertedType::LIST | ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE => {
                SortOrder::UNDEFINED
            }

            // Fall back to the physical type.
            ConvertedType::NONE => Self::get_default_sort_order(physical_type),
        }
    }

    /// Returns default sort order based on physical type.
    fn get_default_sort_order(physical_type: Type) -> SortOrder {
        match physical_type {
            // Order: false, true
            Type::BOOLEAN => SortOrder::SIGNED,
            Type::INT32 | Type::INT64 => SortOrder::SIGNED,
            Type::INT96 => SortOrder::UNDEFINED,
            // Notes to remember when comparing float/double values:
            // If the min is a NaN, it should be ignored.
            // If the max is a NaN, it should be ignored.
            // If the min is +0, the row group may contain -0 values as well.
            // If the max is -0, the row group may contain +0 values as well.
            // When looking for NaN values, min and max should be ignored.
            Type::FLOAT | Type::DOUBLE => SortOrder::SIGNED,
            // Unsigned byte-wise comparison
            Type::BYTE_ARRAY | Type::FIXED_LEN_BYTE_ARRAY => SortOrder::UNSIGNED,
        }
    }

    /// Returns sort order associated with this column order.
    pub fn sort_order(&self) -> SortOrder {
        match *self {
            ColumnOrder::TYPE_DEFINED_ORDER(order) => order,
            ColumnOrder::UNDEFINED => SortOrder::SIGNED,
        }
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ColumnOrder is a thrift union with a single empty-struct variant:
//
// union ColumnOrder {
//   1: TypeDefinedOrder TYPE_ORDER;
// }
//
// The actual sort order is resolved from the schema after parsing.
impl<'a, R: ThriftCompactInputProtocol<'a>> ReadThrift<'a, R> for ColumnOrder {
    fn read_thrift(prot: &mut R) -> Result<Self> {
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(general_err!("Received empty union from remote ColumnOrder"));
        }
        let ret = match field_ident.id {
            1 => {
                prot.skip_empty_struct()?;
                // sort order is filled in once the schema is known
                Self::TYPE_DEFINED_ORDER(SortOrder::UNDEFINED)
            }
            _ => {
                prot.skip(field_ident.field_type)?;
                Self::UNDEFINED
            }
        };
        let field_ident = prot.read_field_begin(field_ident.id)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(general_err!(
                "Received multiple fields for union from remote ColumnOrder"
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for ColumnOrder {
    const ELEMENT_TYPE: ElementType = ElementType::Struct;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        // both variants serialize as TypeDefinedOrder, the only order in the format
        writer.write_empty_struct(1, 0)?;
        writer.write_struct_end()
    }
}

write_thrift_field!(ColumnOrder, FieldType::Struct);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::tests::test_roundtrip;

    #[test]
    fn test_type_roundtrip() {
        test_roundtrip(Type::BOOLEAN);
        test_roundtrip(Type::INT32);
        test_roundtrip(Type::INT64);
        test_roundtrip(Type::INT96);
        test_roundtrip(Type::FLOAT);
        test_roundtrip(Type::DOUBLE);
        test_roundtrip(Type::BYTE_ARRAY);
        test_roundtrip(Type::FIXED_LEN_BYTE_ARRAY);
    }

    #[test]
    fn test_encoding_roundtrip() {
        test_roundtrip(Encoding::PLAIN);
        test_roundtrip(Encoding::PLAIN_DICTIONARY);
        test_roundtrip(Encoding::RLE);
        test_roundtrip(Encoding::RLE_DICTIONARY);
    }

    #[test]
    fn test_compression_roundtrip() {
        test_roundtrip(Compression::UNCOMPRESSED);
        test_roundtrip(Compression::SNAPPY);
        test_roundtrip(Compression::GZIP);
        test_roundtrip(Compression::ZSTD);
    }

    #[test]
    fn test_invalid_enum_value_rejected() {
        // PageType has no value 42
        let mut buf = Vec::new();
        crate::thrift::ThriftCompactOutputProtocol::new(&mut buf)
            .write_i32(42)
            .unwrap();
        let mut prot = crate::thrift::ThriftSliceInputProtocol::new(&buf);
        let res: Result<PageType> = PageType::read_thrift(&mut prot);
        assert!(res.is_err());
    }

    #[test]
    fn test_display_type() {
        assert_eq!(Type::BOOLEAN.to_string(), "BOOLEAN");
        assert_eq!(Type::FIXED_LEN_BYTE_ARRAY.to_string(), "FIXED_LEN_BYTE_ARRAY");
    }

    #[test]
    fn test_column_order_sort_order() {
        assert_eq!(
            ColumnOrder::TYPE_DEFINED_ORDER(SortOrder::UNSIGNED).sort_order(),
            SortOrder::UNSIGNED
        );
        assert_eq!(ColumnOrder::UNDEFINED.sort_order(), SortOrder::SIGNED);
    }

    #[test]
    fn test_sort_order_from_converted_type() {
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::UINT_32, Type::INT32),
            SortOrder::UNSIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::INT32),
            SortOrder::SIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::BYTE_ARRAY),
            SortOrder::UNSIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::INT96),
            SortOrder::UNDEFINED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::INTERVAL, Type::FIXED_LEN_BYTE_ARRAY),
            SortOrder::UNDEFINED
        );
    }
}

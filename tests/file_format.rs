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

//! End-to-end tests of the file write/read pipeline: layout invariants, nested
//! columns, compression and dictionary encoding.

use std::sync::Arc;

use bytes::Bytes;

use parq::basic::{Compression, Encoding, Repetition, Type};
use parq::column::page::Page;
use parq::data_type::{ByteArray, ByteArrayType, Int32Type, Int64Type};
use parq::encodings::decoding::{Decoder, DictDecoder, PlainDecoder};
use parq::encodings::levels::LevelDecoder;
use parq::file::properties::{WriterProperties, WriterPropertiesPtr};
use parq::file::reader::{FileReader, RowGroupReader};
use parq::file::serialized_reader::SerializedFileReader;
use parq::file::writer::SerializedFileWriter;
use parq::schema::types::{ColumnPath, Type as SchemaType, TypePtr};

fn two_column_schema() -> TypePtr {
    let a = Arc::new(
        SchemaType::primitive_type_builder("a", Type::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap(),
    );
    let b = Arc::new(
        SchemaType::primitive_type_builder("b", Type::INT64)
            .with_repetition(Repetition::OPTIONAL)
            .build()
            .unwrap(),
    );
    Arc::new(
        SchemaType::group_type_builder("schema")
            .with_fields(vec![a, b])
            .build()
            .unwrap(),
    )
}

fn write_two_column_file(props: WriterPropertiesPtr) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut writer =
        SerializedFileWriter::new(&mut buffer, two_column_schema(), props).unwrap();

    let mut row_group = writer.next_row_group().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&[1, 2, 3, 4, 5], None, None)
        .unwrap();
    col.close().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int64Type>()
        .write_batch(&[10, 10, 20], Some(&[1, 0, 1, 1, 0]), None)
        .unwrap();
    col.close().unwrap();

    row_group.close().unwrap();
    writer.close().unwrap();
    buffer
}

/// Decodes the levels and values of a v1 data page holding optional INT64 values.
fn decode_optional_int64_page(
    page: &Page,
    max_def_level: i16,
    dictionary: Option<&Bytes>,
) -> (Vec<i16>, Vec<i64>) {
    let (buf, num_values, encoding) = match page {
        Page::DataPage {
            buf,
            num_values,
            encoding,
            ..
        } => (buf.clone(), *num_values as usize, *encoding),
        _ => panic!("expected a data page"),
    };

    let mut decoder = LevelDecoder::v1(Encoding::RLE, max_def_level);
    let consumed = decoder.set_data(num_values, buf.clone()).unwrap();
    let mut def_levels = vec![0i16; num_values];
    assert_eq!(decoder.get(&mut def_levels).unwrap(), num_values);

    let values_buf = buf.slice(consumed..);
    let num_non_null = def_levels.iter().filter(|l| **l == max_def_level).count();
    let mut values = vec![0i64; num_non_null];
    match encoding {
        Encoding::PLAIN => {
            let mut decoder = PlainDecoder::<Int64Type>::new(0);
            decoder.set_data(values_buf, num_non_null).unwrap();
            assert_eq!(decoder.get(&mut values).unwrap(), num_non_null);
        }
        Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
            let dict = dictionary.expect("dictionary page required");
            let mut dict_decoder = PlainDecoder::<Int64Type>::new(0);
            // dictionary length is bounded by the entry width
            dict_decoder.set_data(dict.clone(), dict.len() / 8).unwrap();
            let mut decoder = DictDecoder::<Int64Type>::new();
            decoder.set_dict(Box::new(dict_decoder)).unwrap();
            decoder.set_data(values_buf, num_non_null).unwrap();
            assert_eq!(decoder.get(&mut values).unwrap(), num_non_null);
        }
        other => panic!("unexpected encoding {other}"),
    }
    (def_levels, values)
}

#[test]
fn test_two_column_roundtrip_layout_invariants() {
    let props = Arc::new(WriterProperties::builder().build());
    let buffer = write_two_column_file(props);

    assert_eq!(&buffer[0..4], b"PAR1");
    assert_eq!(&buffer[buffer.len() - 4..], b"PAR1");

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let metadata = reader.metadata();
    assert_eq!(metadata.num_row_groups(), 1);
    assert_eq!(metadata.file_metadata().num_rows(), 5);

    let row_group = metadata.row_group(0);
    assert_eq!(row_group.num_rows(), 5);

    for column in row_group.columns() {
        // every chunk points one past its own bytes
        let expected_start = column
            .dictionary_page_offset()
            .unwrap_or_else(|| column.data_page_offset());
        assert_eq!(
            column.file_offset(),
            expected_start + column.compressed_size()
        );
        if let Some(dict_offset) = column.dictionary_page_offset() {
            assert!(dict_offset < column.data_page_offset());
        }
        // every chunk covers all rows
        assert_eq!(column.num_values(), 5);
    }
}

#[test]
fn test_optional_column_with_nulls() {
    let props = Arc::new(WriterProperties::builder().build());
    let buffer = write_two_column_file(props);

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let row_group = reader.get_row_group(0).unwrap();

    let chunk = row_group.metadata().column(1);
    let stats = chunk.statistics().unwrap();
    assert_eq!(stats.null_count(), 2);
    assert_eq!(stats.min_bytes_opt().unwrap(), 10i64.to_le_bytes());
    assert_eq!(stats.max_bytes_opt().unwrap(), 20i64.to_le_bytes());

    let mut pages = row_group.get_column_page_reader(1).unwrap();
    let mut dictionary: Option<Bytes> = None;
    let mut all_levels = Vec::new();
    let mut all_values = Vec::new();
    while let Some(page) = pages.get_next_page().unwrap() {
        match &page {
            Page::DictionaryPage { buf, .. } => dictionary = Some(buf.clone()),
            Page::DataPage { .. } => {
                let (levels, values) =
                    decode_optional_int64_page(&page, 1, dictionary.as_ref());
                all_levels.extend(levels);
                all_values.extend(values);
            }
        }
    }

    assert_eq!(all_levels, vec![1, 0, 1, 1, 0]);
    assert_eq!(all_values, vec![10, 10, 20]);
}

#[test]
fn test_compressed_roundtrip() {
    for codec in [Compression::SNAPPY, Compression::GZIP, Compression::ZSTD] {
        let props = Arc::new(
            WriterProperties::builder()
                .set_compression(codec)
                .set_dictionary_enabled(false)
                .build(),
        );
        let buffer = write_two_column_file(props);

        let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
        let row_group = reader.get_row_group(0).unwrap();
        assert_eq!(row_group.metadata().column(0).compression(), codec);

        let mut pages = row_group.get_column_page_reader(0).unwrap();
        let page = pages.get_next_page().unwrap().unwrap();
        // 5 INT32 values decompress back to 20 bytes
        if let Page::DataPage { buf, num_values, .. } = page {
            assert_eq!(num_values, 5);
            assert_eq!(buf.len(), 20);
        } else {
            panic!("expected a data page");
        }
    }
}

#[test]
fn test_footer_roundtrip_semantic_equality() {
    let props = Arc::new(WriterProperties::builder().build());
    let buffer = write_two_column_file(props);
    let bytes = Bytes::from(buffer);

    let first = SerializedFileReader::new(bytes.clone()).unwrap();
    let second = SerializedFileReader::new(bytes).unwrap();
    assert_eq!(first.metadata(), second.metadata());

    let md = first.metadata().file_metadata();
    assert!(md.created_by().unwrap().starts_with("parq version"));
    assert_eq!(md.schema_descr().num_columns(), 2);
    assert!(md.column_orders().is_some());
}

#[test]
fn test_dictionary_fallback_end_to_end() {
    let field = Arc::new(
        SchemaType::primitive_type_builder("s", Type::BYTE_ARRAY)
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
    let props = Arc::new(
        WriterProperties::builder()
            .set_dictionary_pagesize_limit(256)
            .set_data_pagesize_limit(512)
            .set_write_batch_size(16)
            .build(),
    );

    let values: Vec<ByteArray> = (0..128)
        .map(|i| ByteArray::from(format!("unique-value-{i:06}").into_bytes()))
        .collect();

    let mut buffer = Vec::new();
    {
        let mut writer =
            SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
        let mut row_group = writer.next_row_group().unwrap();
        let mut col = row_group.next_column().unwrap().unwrap();
        col.typed::<ByteArrayType>()
            .write_batch(&values, None, None)
            .unwrap();
        col.close().unwrap();
        row_group.close().unwrap();
        writer.close().unwrap();
    }

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let chunk = reader.metadata().row_group(0).column(0);
    assert_eq!(
        chunk.encodings(),
        &vec![Encoding::PLAIN, Encoding::RLE, Encoding::RLE_DICTIONARY]
    );
    let page_stats = chunk.page_encoding_stats().unwrap().clone();

    let row_group = reader.get_row_group(0).unwrap();
    let mut pages = row_group.get_column_page_reader(0).unwrap();
    let first = pages.get_next_page().unwrap().unwrap();
    assert!(matches!(first, Page::DictionaryPage { .. }));

    let mut encodings = Vec::new();
    let mut total_values = 0;
    while let Some(page) = pages.get_next_page().unwrap() {
        total_values += page.num_values();
        encodings.push(page.encoding());
    }

    // the recorded page counts survive the footer and match the pages on disk
    let recorded: i32 = page_stats
        .iter()
        .filter(|s| s.page_type == parq::basic::PageType::DATA_PAGE)
        .map(|s| s.count)
        .sum();
    assert_eq!(recorded as usize, encodings.len());
    assert!(page_stats.iter().any(|s| {
        s.page_type == parq::basic::PageType::DICTIONARY_PAGE && s.count == 1
    }));
    assert_eq!(total_values, 128);
    assert!(encodings.contains(&Encoding::RLE_DICTIONARY));
    assert!(encodings.contains(&Encoding::PLAIN));
    // buffered dictionary-encoded pages land before the fallback pages
    let first_plain = encodings.iter().position(|e| *e == Encoding::PLAIN).unwrap();
    assert!(
        encodings[..first_plain]
            .iter()
            .all(|e| *e == Encoding::RLE_DICTIONARY)
    );
}

#[test]
fn test_per_column_compression_override() {
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_column_compression(ColumnPath::from("b"), Compression::UNCOMPRESSED)
            .build(),
    );
    let buffer = write_two_column_file(props);

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let row_group = reader.metadata().row_group(0);
    assert_eq!(row_group.column(0).compression(), Compression::SNAPPY);
    assert_eq!(row_group.column(1).compression(), Compression::UNCOMPRESSED);
}

#[test]
fn test_eight_byte_file_rejected() {
    let data = Bytes::from(b"PAR1PAR1".to_vec());
    // footer length of 0x31524150 far exceeds the file size
    let err = SerializedFileReader::new(data).unwrap_err().to_string();
    assert!(err.contains("Invalid Parquet file"), "{err}");

    let too_small = Bytes::from(b"PAR1".to_vec());
    let err = SerializedFileReader::new(too_small).unwrap_err().to_string();
    assert!(err.contains("Size is smaller than footer"), "{err}");
}

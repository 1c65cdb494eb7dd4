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

//! End-to-end tests of Parquet Modular Encryption: encrypted footers, per-column
//! keys, plaintext footer signing and AAD prefixes.

use std::sync::Arc;

use bytes::Bytes;

use parq::basic::{Repetition, Type};
use parq::column::page::Page;
use parq::data_type::Int32Type;
use parq::encodings::decoding::{Decoder, PlainDecoder};
use parq::encryption::decrypt::FileDecryptionProperties;
use parq::encryption::encrypt::FileEncryptionProperties;
use parq::file::properties::{ReaderProperties, WriterProperties};
use parq::file::reader::{FileReader, RowGroupReader};
use parq::file::serialized_reader::SerializedFileReader;
use parq::file::writer::SerializedFileWriter;
use parq::schema::types::{Type as SchemaType, TypePtr};

const FOOTER_KEY: &[u8] = b"0123456789012345";
const COLUMN_KEY_B: &[u8] = b"1234567890123450";

fn two_column_schema() -> TypePtr {
    let a = Arc::new(
        SchemaType::primitive_type_builder("a", Type::INT32)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .unwrap(),
    );
    let b = Arc::new(
        SchemaType::primitive_type_builder("b", Type::INT32)
            .with_repetition(Repetition::REQUIRED)
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

fn write_file(encryption: FileEncryptionProperties) -> Vec<u8> {
    let props = Arc::new(
        WriterProperties::builder()
            .set_dictionary_enabled(false)
            .set_file_encryption_properties(encryption)
            .build(),
    );
    let mut buffer = Vec::new();
    let mut writer =
        SerializedFileWriter::new(&mut buffer, two_column_schema(), props).unwrap();

    let mut row_group = writer.next_row_group().unwrap();
    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&[1, 2, 3], None, None)
        .unwrap();
    col.close().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&[7, 8, 9], None, None)
        .unwrap();
    col.close().unwrap();

    row_group.close().unwrap();
    writer.close().unwrap();
    buffer
}

fn read_column(reader: &dyn FileReader, column: usize) -> Vec<i32> {
    let row_group = reader.get_row_group(0).unwrap();
    let mut pages = row_group.get_column_page_reader(column).unwrap();
    let mut values = Vec::new();
    while let Some(page) = pages.get_next_page().unwrap() {
        if let Page::DataPage {
            buf, num_values, ..
        } = page
        {
            let mut decoder = PlainDecoder::<Int32Type>::new(0);
            decoder.set_data(buf, num_values as usize).unwrap();
            let mut out = vec![0i32; num_values as usize];
            decoder.get(&mut out).unwrap();
            values.extend_from_slice(&out);
        }
    }
    values
}

fn reader_with_keys(
    buffer: Bytes,
    decryption: Arc<FileDecryptionProperties>,
) -> parq::errors::Result<SerializedFileReader<Bytes>> {
    let props = ReaderProperties::builder()
        .set_file_decryption_properties(decryption)
        .build();
    SerializedFileReader::new_with_properties(buffer, props)
}

#[test]
fn test_uniform_encryption_roundtrip() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let buffer = write_file(encryption);

    // encrypted-footer files are framed with a different magic
    assert_eq!(&buffer[0..4], b"PARE");
    assert_eq!(&buffer[buffer.len() - 4..], b"PARE");

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(Bytes::from(buffer), decryption).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);
    assert_eq!(read_column(&reader, 1), vec![7, 8, 9]);
}

#[test]
fn test_encrypted_footer_requires_keys() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let buffer = Bytes::from(write_file(encryption));

    // no decryption properties at all
    let err = SerializedFileReader::new(buffer.clone()).unwrap_err().to_string();
    assert!(err.contains("decryption properties were not provided"), "{err}");

    // wrong footer key fails the footer authentication
    let decryption = FileDecryptionProperties::builder(b"9999999999999999".to_vec())
        .build()
        .unwrap();
    let err = reader_with_keys(buffer, decryption).unwrap_err().to_string();
    assert!(err.contains("unable to decrypt parquet footer"), "{err}");
}

#[test]
fn test_column_key_encryption() {
    // column b is encrypted with its own key, column a stays plaintext
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_column_key("b", COLUMN_KEY_B.to_vec())
        .build()
        .unwrap();
    let buffer = Bytes::from(write_file(encryption));
    assert_eq!(&buffer[0..4], b"PARE");

    // footer key only: column a is readable, column b is not
    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(buffer.clone(), decryption).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);

    let row_group = reader.get_row_group(0).unwrap();
    let result = row_group
        .get_column_page_reader(1)
        .and_then(|mut pages| pages.get_next_page());
    assert!(result.is_err());

    // footer key and column key: both columns are readable
    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_column_key("b", COLUMN_KEY_B.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(buffer, decryption).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);
    assert_eq!(read_column(&reader, 1), vec![7, 8, 9]);
}

#[test]
fn test_plaintext_footer_with_signature() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_plaintext_footer(true)
        .build()
        .unwrap();
    let buffer = write_file(encryption);

    // plaintext footers keep the regular magic
    assert_eq!(&buffer[0..4], b"PAR1");
    assert_eq!(&buffer[buffer.len() - 4..], b"PAR1");

    // the footer parses without any keys
    let reader = SerializedFileReader::new(Bytes::from(buffer.clone())).unwrap();
    assert_eq!(reader.metadata().file_metadata().num_rows(), 3);

    // signature verification passes with the right key
    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(Bytes::from(buffer.clone()), decryption.clone()).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);

    // corrupting a footer byte fails verification
    let footer_len = u32::from_le_bytes(
        buffer[buffer.len() - 8..buffer.len() - 4].try_into().unwrap(),
    ) as usize;
    let mut corrupt = buffer.clone();
    let footer_start = corrupt.len() - 8 - footer_len;
    corrupt[footer_start] ^= 1;
    let err = reader_with_keys(Bytes::from(corrupt), decryption)
        .unwrap_err()
        .to_string();
    assert!(!err.is_empty());
}

#[test]
fn test_plaintext_footer_signature_can_be_skipped() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_plaintext_footer(true)
        .build()
        .unwrap();
    let buffer = Bytes::from(write_file(encryption));

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .disable_footer_signature_verification()
        .build()
        .unwrap();
    let reader = reader_with_keys(buffer, decryption).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);
}

#[test]
fn test_aad_prefix_stored_and_supplied() {
    // stored prefix: the reader needs no configuration beyond the key
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"file-identity".to_vec())
        .build()
        .unwrap();
    let buffer = Bytes::from(write_file(encryption));
    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(buffer, decryption).unwrap();
    assert_eq!(read_column(&reader, 0), vec![1, 2, 3]);

    // unstored prefix: the reader must supply it
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"file-identity".to_vec())
        .with_aad_prefix_storage(false)
        .build()
        .unwrap();
    let buffer = Bytes::from(write_file(encryption));

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err = reader_with_keys(buffer.clone(), decryption)
        .unwrap_err()
        .to_string();
    assert!(err.contains("AAD prefix"), "{err}");

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"file-identity".to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(buffer, decryption).unwrap();
    assert_eq!(read_column(&reader, 1), vec![7, 8, 9]);
}

#[test]
fn test_encrypted_dictionary_pages() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let props = Arc::new(
        WriterProperties::builder()
            .set_file_encryption_properties(encryption)
            .build(),
    );
    let mut buffer = Vec::new();
    let mut writer =
        SerializedFileWriter::new(&mut buffer, two_column_schema(), props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&[5, 5, 5, 6], None, None)
        .unwrap();
    col.close().unwrap();
    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<Int32Type>()
        .write_batch(&[1, 1, 2, 2], None, None)
        .unwrap();
    col.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(Bytes::from(buffer), decryption).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    assert!(row_group.metadata().column(0).has_dictionary_page());

    let mut pages = row_group.get_column_page_reader(0).unwrap();
    let first = pages.get_next_page().unwrap().unwrap();
    assert!(matches!(first, Page::DictionaryPage { .. }));
    let second = pages.get_next_page().unwrap().unwrap();
    assert_eq!(second.num_values(), 4);
    assert!(pages.get_next_page().unwrap().is_none());
}

#[test]
fn test_tampered_page_rejected() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let mut buffer = write_file(encryption);

    // flip a byte in the first column chunk, right after the leading magic
    buffer[10] ^= 1;

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = reader_with_keys(Bytes::from(buffer), decryption).unwrap();
    let row_group = reader.get_row_group(0).unwrap();
    let result = row_group
        .get_column_page_reader(0)
        .and_then(|mut pages| pages.get_next_page());
    assert!(result.is_err());
}

#[test]
fn test_plaintext_file_rejected_by_default() {
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    let mut writer =
        SerializedFileWriter::new(&mut buffer, two_column_schema(), props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    while let Some(col) = row_group.next_column().unwrap() {
        col.close().unwrap();
    }
    row_group.close().unwrap();
    writer.close().unwrap();
    let buffer = Bytes::from(buffer);

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err = reader_with_keys(buffer.clone(), decryption)
        .unwrap_err()
        .to_string();
    assert!(err.contains("not encrypted"), "{err}");

    let decryption = FileDecryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_plaintext_files_allowed()
        .build()
        .unwrap();
    assert!(reader_with_keys(buffer, decryption).is_ok());
}

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

//! Additional authenticated data (AAD) construction.
//!
//! Every encrypted module carries an AAD of the form
//! `aad_prefix || aad_file_unique || module_byte || row_group_ordinal (LE16) ||
//! column_ordinal (LE16) [|| page_ordinal (LE16)]`, binding the ciphertext to its
//! position in the file. The page ordinal is only present for data pages and data
//! page headers.

use crate::errors::{ParquetError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ModuleType {
    FooterSigning = 0,
    Footer = 1,
    ColumnMetaData = 2,
    DataPage = 3,
    DictionaryPage = 4,
    DataPageHeader = 5,
    DictionaryPageHeader = 6,
    ColumnIndex = 7,
    OffsetIndex = 8,
    BloomFilterHeader = 9,
    BloomFilterBitset = 10,
}

/// Builds the AAD for the footer module.
pub(crate) fn create_footer_aad(file_aad: &[u8]) -> Result<Vec<u8>> {
    create_module_aad(file_aad, ModuleType::Footer, 0, 0, None)
}

/// Builds the AAD used when signing or verifying a plaintext footer.
pub(crate) fn create_footer_signing_aad(file_aad: &[u8]) -> Result<Vec<u8>> {
    create_module_aad(file_aad, ModuleType::FooterSigning, 0, 0, None)
}

/// Builds the AAD for one module of the file.
pub(crate) fn create_module_aad(
    file_aad: &[u8],
    module_type: ModuleType,
    row_group_ordinal: usize,
    column_ordinal: usize,
    page_ordinal: Option<usize>,
) -> Result<Vec<u8>> {
    let module_buf = [module_type as u8];

    if matches!(module_type, ModuleType::Footer | ModuleType::FooterSigning) {
        let mut aad = Vec::with_capacity(file_aad.len() + 1);
        aad.extend_from_slice(file_aad);
        aad.extend_from_slice(&module_buf);
        return Ok(aad);
    }

    if row_group_ordinal > i16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} row groups: {}",
            i16::MAX,
            row_group_ordinal
        ));
    }
    if column_ordinal > i16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} columns: {}",
            i16::MAX,
            column_ordinal
        ));
    }

    if !matches!(
        module_type,
        ModuleType::DataPage | ModuleType::DataPageHeader
    ) {
        let mut aad = Vec::with_capacity(file_aad.len() + 5);
        aad.extend_from_slice(file_aad);
        aad.extend_from_slice(&module_buf);
        aad.extend_from_slice(&(row_group_ordinal as u16).to_le_bytes());
        aad.extend_from_slice(&(column_ordinal as u16).to_le_bytes());
        return Ok(aad);
    }

    let page_ordinal =
        page_ordinal.ok_or_else(|| general_err!("Page ordinal must be set for data pages"))?;
    if page_ordinal > i16::MAX as usize {
        return Err(general_err!(
            "Encrypted parquet files can't have more than {} pages per column chunk: {}",
            i16::MAX,
            page_ordinal
        ));
    }

    let mut aad = Vec::with_capacity(file_aad.len() + 7);
    aad.extend_from_slice(file_aad);
    aad.extend_from_slice(&module_buf);
    aad.extend_from_slice(&(row_group_ordinal as u16).to_le_bytes());
    aad.extend_from_slice(&(column_ordinal as u16).to_le_bytes());
    aad.extend_from_slice(&(page_ordinal as u16).to_le_bytes());
    Ok(aad)
}

/// Rewrites the trailing page ordinal of a previously built page AAD, avoiding a
/// fresh allocation per page.
pub(crate) fn quick_update_page_aad(aad: &mut [u8], page_ordinal: usize) {
    debug_assert!(page_ordinal <= i16::MAX as usize);
    let len = aad.len();
    aad[len - 2..].copy_from_slice(&(page_ordinal as u16).to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_aad_layout() {
        let aad = create_footer_aad(b"unique").unwrap();
        assert_eq!(aad, b"unique\x01");
        let aad = create_footer_signing_aad(b"unique").unwrap();
        assert_eq!(aad, b"unique\x00");
    }

    #[test]
    fn test_column_module_aad_layout() {
        let aad =
            create_module_aad(b"u", ModuleType::ColumnMetaData, 1, 2, None).unwrap();
        assert_eq!(aad, [b'u', 2, 1, 0, 2, 0]);
    }

    #[test]
    fn test_data_page_aad_includes_page_ordinal() {
        let aad = create_module_aad(b"u", ModuleType::DataPage, 1, 2, Some(3)).unwrap();
        assert_eq!(aad, [b'u', 3, 1, 0, 2, 0, 3, 0]);

        // dictionary pages carry no page ordinal
        let aad = create_module_aad(b"u", ModuleType::DictionaryPage, 1, 2, Some(3)).unwrap();
        assert_eq!(aad, [b'u', 4, 1, 0, 2, 0]);
    }

    #[test]
    fn test_data_page_aad_requires_page_ordinal() {
        assert!(create_module_aad(b"u", ModuleType::DataPage, 0, 0, None).is_err());
    }

    #[test]
    fn test_quick_update_page_aad() {
        let mut aad = create_module_aad(b"u", ModuleType::DataPage, 1, 2, Some(0)).unwrap();
        let expected = create_module_aad(b"u", ModuleType::DataPage, 1, 2, Some(7)).unwrap();
        quick_update_page_aad(&mut aad, 7);
        assert_eq!(aad, expected);
    }

    #[test]
    fn test_ordinal_overflow() {
        assert!(create_module_aad(b"u", ModuleType::ColumnMetaData, 40000, 0, None).is_err());
        assert!(create_module_aad(b"u", ModuleType::DataPage, 0, 0, Some(40000)).is_err());
    }
}

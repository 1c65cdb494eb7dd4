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

use std::io::Write;

use bytes::Bytes;

use crate::column::page::CompressedPage;
use crate::encryption::ciphers::BlockEncryptor;
use crate::encryption::encrypt::{FileEncryptor, encrypt_object};
use crate::encryption::modules::{ModuleType, create_module_aad, quick_update_page_aad};
use crate::errors::Result;
use crate::file::metadata::ColumnChunkMetaData;
use crate::file::metadata::thrift_codec::{PageHeader, serialize_column_meta_data};
use crate::thrift::ThriftCompactOutputProtocol;

/// Encrypts the pages, page headers and trailing column metadata of one column
/// chunk.
///
/// The per-page AADs are built once and their trailing page ordinal bytes rewritten
/// as pages advance.
pub(crate) struct PageEncryptor {
    encryptor: Box<dyn BlockEncryptor>,
    file_aad: Vec<u8>,
    row_group_ordinal: usize,
    column_ordinal: usize,
    page_ordinal: usize,
    data_page_aad: Vec<u8>,
    data_page_header_aad: Vec<u8>,
}

impl PageEncryptor {
    /// Creates a page encryptor for one column chunk, or `None` when the column is
    /// not encrypted.
    pub(crate) fn try_new(
        file_encryptor: &FileEncryptor,
        row_group_ordinal: usize,
        column_ordinal: usize,
        column_path: &str,
    ) -> Result<Option<Self>> {
        if !file_encryptor.is_column_encrypted(column_path) {
            return Ok(None);
        }
        let encryptor = file_encryptor.get_column_encryptor(column_path)?;
        let file_aad = file_encryptor.file_aad().to_vec();
        let data_page_aad = create_module_aad(
            &file_aad,
            ModuleType::DataPage,
            row_group_ordinal,
            column_ordinal,
            Some(0),
        )?;
        let data_page_header_aad = create_module_aad(
            &file_aad,
            ModuleType::DataPageHeader,
            row_group_ordinal,
            column_ordinal,
            Some(0),
        )?;
        Ok(Some(Self {
            encryptor,
            file_aad,
            row_group_ordinal,
            column_ordinal,
            page_ordinal: 0,
            data_page_aad,
            data_page_header_aad,
        }))
    }

    /// Advances the page ordinal after a data page has been written.
    pub(crate) fn increment_page(&mut self) {
        self.page_ordinal += 1;
        quick_update_page_aad(&mut self.data_page_aad, self.page_ordinal);
        quick_update_page_aad(&mut self.data_page_header_aad, self.page_ordinal);
    }

    /// Encrypts a page payload, returning the replacement buffer.
    pub(crate) fn encrypt_page(&mut self, page: &CompressedPage) -> Result<Bytes> {
        let encrypted = match page.compressed_page() {
            crate::column::page::Page::DataPage { .. } => {
                self.encryptor.encrypt(page.data(), &self.data_page_aad)?
            }
            crate::column::page::Page::DictionaryPage { .. } => {
                let aad = create_module_aad(
                    &self.file_aad,
                    ModuleType::DictionaryPage,
                    self.row_group_ordinal,
                    self.column_ordinal,
                    None,
                )?;
                self.encryptor.encrypt(page.data(), &aad)?
            }
        };
        Ok(encrypted.into())
    }

    /// Thrift-serializes and encrypts a page header to `sink`.
    pub(crate) fn encrypt_page_header<W: Write>(
        &mut self,
        page_header: &PageHeader,
        sink: &mut W,
    ) -> Result<()> {
        let aad = if page_header.dictionary_page_header.is_some() {
            create_module_aad(
                &self.file_aad,
                ModuleType::DictionaryPageHeader,
                self.row_group_ordinal,
                self.column_ordinal,
                None,
            )?
        } else {
            self.data_page_header_aad.clone()
        };

        encrypt_object(page_header, &mut self.encryptor, sink, &aad)
    }

    /// Thrift-serializes and encrypts the trailing `ColumnMetaData` copy to `sink`.
    pub(crate) fn encrypt_column_metadata<W: Write>(
        &mut self,
        metadata: &ColumnChunkMetaData,
        sink: &mut W,
    ) -> Result<()> {
        let mut buffer: Vec<u8> = vec![];
        {
            let mut protocol = ThriftCompactOutputProtocol::new(&mut buffer);
            serialize_column_meta_data(metadata, &mut protocol)?;
        }
        let aad = create_module_aad(
            &self.file_aad,
            ModuleType::ColumnMetaData,
            self.row_group_ordinal,
            self.column_ordinal,
            None,
        )?;
        let encrypted = self.encryptor.encrypt(&buffer, &aad)?;
        sink.write_all(&encrypted)?;
        Ok(())
    }
}

// SPDX-License-Identifier: Mulan PSL v2
/*
 * Copyright (c) 2024 Huawei Technologies Co., Ltd.
 * quickfixd is licensed under Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *         http://license.coscl.org.cn/MulanPSL2
 *
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND,
 * EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT,
 * MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use log::debug;
use zip::{result::ZipError, ZipArchive};

use quickfix_common::fs;

pub const PATCH_PROFILE_NAME: &str = "patch.json";
pub const PROVISION_PROFILE_NAME: &str = "provision.json";
pub const DIFF_FILE_SUFFIX: &str = ".diff";

const ENTRY_SEPARATOR: char = '/';
const MAX_PROFILE_SIZE: u64 = 1024 * 1024;

/// Read access to a quick fix package (.hqf)
pub struct PatchExtractor {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl PatchExtractor {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let archive = ZipArchive::new(BufReader::new(fs::open_file(&path)?))
            .with_context(|| format!("Failed to read archive {}", path.display()))?;

        Ok(Self { path, archive })
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let package = &self.path;
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {} from {}", name, package.display())
                })
            }
        };

        let mut buf = Vec::new();
        entry
            .by_ref()
            .take(MAX_PROFILE_SIZE + 1)
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {} from {}", name, package.display()))?;
        ensure!(
            buf.len() as u64 <= MAX_PROFILE_SIZE,
            "{} of {} exceeds {} bytes",
            name,
            package.display(),
            MAX_PROFILE_SIZE
        );

        Ok(Some(buf))
    }

    /// Returns the patch profile, `None` if the package does not carry one
    pub fn read_profile(&mut self) -> Result<Option<Vec<u8>>> {
        self.read_entry(PATCH_PROFILE_NAME)
    }

    pub fn read_provision(&mut self) -> Result<Option<Vec<u8>>> {
        self.read_entry(PROVISION_PROFILE_NAME)
    }

    /// Checks whether any entry lives below `dir`
    pub fn is_dir_exist(&self, dir: &str) -> bool {
        let mut prefix = dir.trim_end_matches(ENTRY_SEPARATOR).to_string();
        prefix.push(ENTRY_SEPARATOR);

        self.archive
            .file_names()
            .any(|name| name.starts_with(&prefix))
    }

    /// Extracts entries directly below `dir` whose name ends with `suffix`.
    /// Entries are flattened into `out_dir` by file name.
    pub fn extract_files<P: AsRef<Path>>(
        &mut self,
        dir: &str,
        suffix: &str,
        out_dir: P,
    ) -> Result<Vec<PathBuf>> {
        let mut prefix = dir.trim_end_matches(ENTRY_SEPARATOR).to_string();
        prefix.push(ENTRY_SEPARATOR);

        let entry_names = self
            .archive
            .file_names()
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .map(|file_name| {
                        !file_name.is_empty()
                            && !file_name.contains(ENTRY_SEPARATOR)
                            && file_name.ends_with(suffix)
                    })
                    .unwrap_or(false)
            })
            .map(String::from)
            .collect::<Vec<_>>();

        let out_dir = out_dir.as_ref();
        let mut file_list = Vec::with_capacity(entry_names.len());
        for entry_name in entry_names {
            let content = self.read_entry(&entry_name)?.unwrap_or_default();
            let file_name = entry_name
                .rsplit(ENTRY_SEPARATOR)
                .next()
                .unwrap_or_default();
            let file_path = out_dir.join(file_name);

            debug!("Extracting {} to {}", entry_name, file_path.display());
            fs::write(&file_path, content)?;
            file_list.push(file_path);
        }

        Ok(file_list)
    }
}

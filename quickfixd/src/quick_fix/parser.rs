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

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, error};

use quickfix_abi::AppQuickFix;

use super::{
    error::{Error, Result},
    extractor::PatchExtractor,
    profile::{DeviceInfo, PatchProfile},
};

pub struct PatchParser {
    device: DeviceInfo,
}

impl PatchParser {
    pub fn new(device: DeviceInfo) -> Self {
        Self { device }
    }

    pub fn parse_patch_info<P: AsRef<Path>>(&self, path: P) -> Result<AppQuickFix> {
        let file_path = path.as_ref();
        if file_path.as_os_str().is_empty() {
            return Err(Error::ParseNoProfile(String::new()));
        }

        debug!("Parsing patch package {}", file_path.display());
        let mut extractor = PatchExtractor::open(file_path).map_err(|e| {
            error!("{:?}", e);
            Error::ParseUnexpected(file_path.display().to_string())
        })?;
        let profile = extractor
            .read_profile()
            .map_err(|e| {
                error!("{:?}", e);
                Error::ParseUnexpected(file_path.display().to_string())
            })?
            .ok_or_else(|| Error::ParseNoProfile(file_path.display().to_string()))?;

        PatchProfile::transform_to(&profile, &extractor, &self.device)
    }

    /// Parses a batch of packages, the first failure aborts the whole batch
    pub fn parse_patch_infos<I, P>(&self, paths: I) -> Result<IndexMap<PathBuf, AppQuickFix>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut app_qf_infos = IndexMap::new();
        for path in paths {
            let file_path = path.as_ref();
            let app_qf = self.parse_patch_info(file_path).map_err(|e| {
                error!("Failed to parse {}, {}", file_path.display(), e);
                e
            })?;
            app_qf_infos.insert(file_path.to_path_buf(), app_qf);
        }

        Ok(app_qf_infos)
    }
}

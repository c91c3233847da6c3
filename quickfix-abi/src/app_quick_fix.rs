// SPDX-License-Identifier: Mulan PSL v2
/*
 * Copyright (c) 2024 Huawei Technologies Co., Ltd.
 * quickfix-abi is licensed under Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *         http://license.coscl.org.cn/MulanPSL2
 *
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND,
 * EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT,
 * MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use serde::{Deserialize, Serialize};

use super::QuickFixType;

/// Patch unit of a single module
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct HqfInfo {
    pub module_name: String,
    pub hap_sha256: String,
    pub hqf_file_path: String,
    pub kind: QuickFixType,
    pub cpu_abi: String,
    pub native_library_path: String,
}

/// One patch revision of an application
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct AppqfInfo {
    pub version_code: u32,
    pub version_name: String,
    pub cpu_abi: String,
    pub native_library_path: String,
    pub kind: QuickFixType,
    pub hqf_infos: Vec<HqfInfo>,
}

impl AppqfInfo {
    pub fn module_names(&self) -> Vec<String> {
        self.hqf_infos
            .iter()
            .map(|hqf| hqf.module_name.clone())
            .collect()
    }

    /// Returns true if the revision carries any native library,
    /// either bundle level or module level.
    pub fn has_native_so(&self) -> bool {
        if !self.native_library_path.is_empty() {
            return true;
        }
        self.hqf_infos
            .iter()
            .any(|hqf| !hqf.native_library_path.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct AppQuickFix {
    pub bundle_name: String,
    pub version_code: u32,
    pub version_name: String,
    pub deployed_appqf_info: AppqfInfo,
    pub deploying_appqf_info: AppqfInfo,
}

impl std::fmt::Display for AppQuickFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "bundle:    {}", self.bundle_name)?;
        writeln!(
            f,
            "version:   {} ({})",
            self.version_name, self.version_code
        )?;
        for (title, info) in [
            ("deployed", &self.deployed_appqf_info),
            ("deploying", &self.deploying_appqf_info),
        ] {
            writeln!(
                f,
                "{}: {} {} ({})",
                title, info.kind, info.version_name, info.version_code
            )?;
            for hqf in &info.hqf_infos {
                writeln!(f, "* {}", hqf.module_name)?;
            }
        }

        Ok(())
    }
}

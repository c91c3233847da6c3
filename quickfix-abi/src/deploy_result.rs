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

/// Summary of a finished deployment
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct DeployQuickFixResult {
    pub bundle_name: String,
    pub bundle_version_code: u32,
    pub patch_version_code: u32,
    pub kind: QuickFixType,
    pub is_so_contained: bool,
    pub module_names: Vec<String>,
}

impl std::fmt::Display for DeployQuickFixResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "bundle:        {}", self.bundle_name)?;
        writeln!(f, "version code:  {}", self.bundle_version_code)?;
        writeln!(f, "patch version: {}", self.patch_version_code)?;
        writeln!(f, "type:          {}", self.kind)?;
        writeln!(f, "native so:     {}", self.is_so_contained)?;
        write!(f, "modules:       {}", self.module_names.join(", "))
    }
}

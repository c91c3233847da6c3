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

use super::AppQuickFix;

const APP_PROVISION_TYPE_DEBUG: &str = "debug";

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct HapModuleInfo {
    pub name: String,
    pub cpu_abi: String,
    pub native_library_path: String,
    pub is_lib_isolated: bool,
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct ApplicationInfo {
    pub name: String,
    pub debug: bool,
    pub app_provision_type: String,
    pub app_privilege_level: String,
    pub cpu_abi: String,
    pub native_library_path: String,
    pub app_quick_fix: AppQuickFix,
}

impl ApplicationInfo {
    /// Debug build signed with a debug provision
    pub fn is_debug(&self) -> bool {
        self.debug && (self.app_provision_type == APP_PROVISION_TYPE_DEBUG)
    }
}

/// Installed bundle as seen by the quick fix service
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct BundleInfo {
    pub name: String,
    pub version_code: u32,
    pub version_name: String,
    pub app_id: String,
    pub application_info: ApplicationInfo,
    pub hap_module_infos: Vec<HapModuleInfo>,
}

impl BundleInfo {
    pub fn find_module(&self, module_name: &str) -> Option<&HapModuleInfo> {
        self.hap_module_infos
            .iter()
            .find(|module| module.name == module_name)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum BundleStatus {
    Enabled,
    Disabled,
}

impl Default for BundleStatus {
    fn default() -> Self {
        Self::Enabled
    }
}

impl std::fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BundleStatus::Enabled => "ENABLED",
            BundleStatus::Disabled => "DISABLED",
        })
    }
}

/// Registry record of an installed bundle
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct InnerBundleInfo {
    pub bundle_info: BundleInfo,
    pub status: BundleStatus,
}

impl InnerBundleInfo {
    pub fn bundle_name(&self) -> &str {
        &self.bundle_info.name
    }

    pub fn is_lib_isolated(&self, module_name: &str) -> bool {
        self.bundle_info
            .find_module(module_name)
            .map(|module| module.is_lib_isolated)
            .unwrap_or(false)
    }

    pub fn app_quick_fix(&self) -> &AppQuickFix {
        &self.bundle_info.application_info.app_quick_fix
    }

    pub fn set_app_quick_fix(&mut self, app_quick_fix: AppQuickFix) {
        self.bundle_info.application_info.app_quick_fix = app_quick_fix;
    }

    pub fn set_bundle_status(&mut self, status: BundleStatus) {
        self.status = status;
    }
}

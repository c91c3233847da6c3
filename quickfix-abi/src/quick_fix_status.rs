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

const QUICK_FIX_TYPE_UNKNOWN: &str = "UNKNOWN";
const QUICK_FIX_TYPE_PATCH: &str = "PATCH";
const QUICK_FIX_TYPE_HOT_RELOAD: &str = "HOT-RELOAD";

const QUICK_FIX_STATUS_DEFAULT: &str = "DEFAULT";
const QUICK_FIX_STATUS_DEPLOY_START: &str = "DEPLOY-START";
const QUICK_FIX_STATUS_DEPLOY_END: &str = "DEPLOY-END";
const QUICK_FIX_STATUS_SWITCH_ENABLE_START: &str = "SWITCH-ENABLE-START";
const QUICK_FIX_STATUS_SWITCH_DISABLE_START: &str = "SWITCH-DISABLE-START";
const QUICK_FIX_STATUS_SWITCH_END: &str = "SWITCH-END";
const QUICK_FIX_STATUS_DELETE_START: &str = "DELETE-START";
const QUICK_FIX_STATUS_DELETE_END: &str = "DELETE-END";

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum QuickFixType {
    Unknown,
    Patch,
    HotReload,
}

impl QuickFixType {
    /// Directory prefix of a deployed quick fix under the bundle code directory
    pub fn dir_prefix(&self) -> &'static str {
        match self {
            QuickFixType::HotReload => "hotreload_",
            _ => "patch_",
        }
    }
}

impl Default for QuickFixType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for QuickFixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QuickFixType::Unknown => QUICK_FIX_TYPE_UNKNOWN,
            QuickFixType::Patch => QUICK_FIX_TYPE_PATCH,
            QuickFixType::HotReload => QUICK_FIX_TYPE_HOT_RELOAD,
        })
    }
}

/// Lifecycle of a persisted quick fix record.
/// Deployment only ever moves a record between `DeployStart` and `DeployEnd`,
/// the remaining states belong to switch & delete flows.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QuickFixStatus {
    Default,
    DeployStart,
    DeployEnd,
    SwitchEnableStart,
    SwitchDisableStart,
    SwitchEnd,
    DeleteStart,
    DeleteEnd,
}

impl QuickFixStatus {
    pub fn is_deployable(&self) -> bool {
        matches!(self, QuickFixStatus::DeployStart | QuickFixStatus::DeployEnd)
    }
}

impl Default for QuickFixStatus {
    fn default() -> Self {
        Self::Default
    }
}

impl std::fmt::Display for QuickFixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            QuickFixStatus::Default => QUICK_FIX_STATUS_DEFAULT,
            QuickFixStatus::DeployStart => QUICK_FIX_STATUS_DEPLOY_START,
            QuickFixStatus::DeployEnd => QUICK_FIX_STATUS_DEPLOY_END,
            QuickFixStatus::SwitchEnableStart => QUICK_FIX_STATUS_SWITCH_ENABLE_START,
            QuickFixStatus::SwitchDisableStart => QUICK_FIX_STATUS_SWITCH_DISABLE_START,
            QuickFixStatus::SwitchEnd => QUICK_FIX_STATUS_SWITCH_END,
            QuickFixStatus::DeleteStart => QUICK_FIX_STATUS_DELETE_START,
            QuickFixStatus::DeleteEnd => QUICK_FIX_STATUS_DELETE_END,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct QuickFixMark {
    pub bundle_name: String,
    pub status: QuickFixStatus,
}

#[test]
fn test_deployable_status() {
    assert!(QuickFixStatus::DeployStart.is_deployable());
    assert!(QuickFixStatus::DeployEnd.is_deployable());
    assert!(!QuickFixStatus::Default.is_deployable());
    assert!(!QuickFixStatus::SwitchEnd.is_deployable());
    assert_eq!(QuickFixType::HotReload.dir_prefix(), "hotreload_");
    assert_eq!(QuickFixType::Patch.dir_prefix(), "patch_");
}

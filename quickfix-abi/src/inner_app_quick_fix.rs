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

use super::{AppQuickFix, QuickFixMark};

/// Persisted quick fix record of a bundle
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
pub struct InnerAppQuickFix {
    pub app_quick_fix: AppQuickFix,
    pub mark: QuickFixMark,
}

impl InnerAppQuickFix {
    pub fn new(app_quick_fix: AppQuickFix, mark: QuickFixMark) -> Self {
        Self {
            app_quick_fix,
            mark,
        }
    }

    pub fn bundle_name(&self) -> &str {
        &self.app_quick_fix.bundle_name
    }

    /// Merges the module patches of `new_info` into the deploying revision.
    /// A module that is already present is replaced, otherwise appended.
    /// Returns false when `new_info` does not describe the same deployment.
    pub fn add_hqf_info(&mut self, new_info: &AppQuickFix) -> bool {
        let new_qf_info = &new_info.deploying_appqf_info;
        if new_qf_info.hqf_infos.is_empty() {
            return false;
        }

        let qf_info = &mut self.app_quick_fix.deploying_appqf_info;
        if (self.app_quick_fix.bundle_name != new_info.bundle_name)
            || (self.app_quick_fix.version_code != new_info.version_code)
            || (qf_info.version_code != new_qf_info.version_code)
            || (qf_info.kind != new_qf_info.kind)
        {
            return false;
        }

        for hqf_info in &new_qf_info.hqf_infos {
            match qf_info
                .hqf_infos
                .iter_mut()
                .find(|info| info.module_name == hqf_info.module_name)
            {
                Some(info) => *info = hqf_info.clone(),
                None => qf_info.hqf_infos.push(hqf_info.clone()),
            }
        }

        true
    }
}

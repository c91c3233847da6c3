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

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use log::info;
use parking_lot::RwLock;

use quickfix_abi::{DeployQuickFixResult, InnerAppQuickFix, QuickFixMark};

use crate::quick_fix::QuickFixManager;

use super::{
    function::{RpcFunction, RpcResult},
    skeleton::QuickFixSkeleton,
};

pub struct QuickFixSkeletonImpl {
    quick_fix_manager: Arc<RwLock<QuickFixManager>>,
}

impl QuickFixSkeletonImpl {
    pub fn new(quick_fix_manager: Arc<RwLock<QuickFixManager>>) -> Self {
        Self { quick_fix_manager }
    }
}

impl QuickFixSkeleton for QuickFixSkeletonImpl {
    fn deploy_quick_fix(&self, file_paths: Vec<PathBuf>) -> RpcResult<DeployQuickFixResult> {
        RpcFunction::call(move || {
            info!("Deploy quick fix {:?}", file_paths);
            self.quick_fix_manager
                .write()
                .deploy_quick_fix(file_paths)
                .context("Failed to deploy quick fix")
        })
    }

    fn get_quick_fix_info(&self, bundle_name: String) -> RpcResult<InnerAppQuickFix> {
        RpcFunction::call(|| {
            self.quick_fix_manager
                .read()
                .get_quick_fix_info(&bundle_name)
                .with_context(|| format!("Failed to get quick fix info of '{}'", bundle_name))
        })
    }

    fn get_quick_fix_status(&self, bundle_name: String) -> RpcResult<QuickFixMark> {
        RpcFunction::call(|| {
            self.quick_fix_manager
                .read()
                .get_quick_fix_status(&bundle_name)
                .with_context(|| format!("Failed to get quick fix status of '{}'", bundle_name))
        })
    }
}

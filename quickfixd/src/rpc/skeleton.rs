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

use std::path::PathBuf;

use quickfix_abi::{DeployQuickFixResult, InnerAppQuickFix, QuickFixMark};

use super::function::{rpc, RpcResult};

#[rpc(server)]
pub trait QuickFixSkeleton {
    #[rpc(name = "deploy_quick_fix")]
    fn deploy_quick_fix(&self, file_paths: Vec<PathBuf>) -> RpcResult<DeployQuickFixResult>;

    #[rpc(name = "get_quick_fix_info")]
    fn get_quick_fix_info(&self, bundle_name: String) -> RpcResult<InnerAppQuickFix>;

    #[rpc(name = "get_quick_fix_status")]
    fn get_quick_fix_status(&self, bundle_name: String) -> RpcResult<QuickFixMark>;
}

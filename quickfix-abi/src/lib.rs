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

mod app_quick_fix;
mod bundle_info;
mod deploy_result;
mod inner_app_quick_fix;
mod provision_info;
mod quick_fix_status;

pub use app_quick_fix::*;
pub use bundle_info::*;
pub use deploy_result::*;
pub use inner_app_quick_fix::*;
pub use provision_info::*;
pub use quick_fix_status::*;

/// Suffix of quick fix package files
pub const QUICK_FIX_FILE_SUFFIX: &str = ".hqf";

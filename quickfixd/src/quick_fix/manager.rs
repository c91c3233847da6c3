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
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use log::{debug, info};

use quickfix_abi::{DeployQuickFixResult, InnerAppQuickFix, QuickFixMark};
use quickfix_common::fs;

use crate::config::Config;

use super::{
    bundle_mgr::BundleRegistry,
    data_mgr::{QuickFixDataMgr, QuickFixStore},
    deployer::{DeployContext, QuickFixDeployer},
    error::{Error, Result},
    installer::InstalldClient,
    profile::DeviceInfo,
    verifier::ProvisionVerifier,
};

const QUICK_FIX_DB_NAME: &str = "quick_fix.db";
const BUNDLE_DB_NAME: &str = "bundles.db";

pub struct QuickFixManager {
    context: DeployContext,
}

impl QuickFixManager {
    pub fn new<P: AsRef<Path>>(config: &Config, data_dir: P) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        let device = DeviceInfo {
            abi_list: config.device.abi_list.clone(),
            is_system_lib64_exist: config.device.system_lib64_dir.is_dir(),
        };
        debug!(
            "Device abi list: [{}], lib64: {}",
            device.abi_list.join(", "),
            device.is_system_lib64_exist
        );

        fs::create_dir_all(&config.bundle.code_dir)?;
        fs::create_dir_all(&config.bundle.tmp_dir)?;

        let bundle_mgr = BundleRegistry::new(data_dir.join(BUNDLE_DB_NAME))
            .context("Failed to initialize bundle registry")?;
        let data_mgr = QuickFixDataMgr::new(data_dir.join(QUICK_FIX_DB_NAME))
            .context("Failed to initialize quick fix data manager")?;

        Ok(Self::with_context(DeployContext {
            installer: Arc::new(InstalldClient::new(&config.installer.patch_tool)),
            bundle_mgr: Arc::new(bundle_mgr),
            data_mgr: Arc::new(data_mgr),
            verifier: Arc::new(ProvisionVerifier),
            device,
            bundle_code_dir: config.bundle.code_dir.clone(),
            bundle_tmp_dir: config.bundle.tmp_dir.clone(),
        }))
    }

    pub fn with_context(context: DeployContext) -> Self {
        Self { context }
    }

    pub fn deploy_quick_fix(&mut self, file_paths: Vec<PathBuf>) -> Result<DeployQuickFixResult> {
        let mut deployer = QuickFixDeployer::new(&self.context, file_paths);
        deployer.execute()?;

        let deploy_result = deployer.deploy_result().clone();
        info!("{}", deploy_result);

        Ok(deploy_result)
    }

    pub fn get_quick_fix_info(&self, bundle_name: &str) -> Result<InnerAppQuickFix> {
        self.context
            .data_mgr
            .query_inner_app_quick_fix(bundle_name)
            .ok_or_else(|| Error::QuickFixNotExist(bundle_name.to_string()))
    }

    pub fn get_quick_fix_status(&self, bundle_name: &str) -> Result<QuickFixMark> {
        self.get_quick_fix_info(bundle_name)
            .map(|record| record.mark)
    }
}

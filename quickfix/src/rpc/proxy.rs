// SPDX-License-Identifier: Mulan PSL v2
/*
 * Copyright (c) 2024 Huawei Technologies Co., Ltd.
 * quickfix is licensed under Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *         http://license.coscl.org.cn/MulanPSL2
 *
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND,
 * EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT,
 * MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::{fmt::Write, path::PathBuf};

use anyhow::{anyhow, Error, Result};
use function_name::named;
use log::info;

use quickfix_abi::{DeployQuickFixResult, InnerAppQuickFix, QuickFixMark};

use super::client::{RpcArguments, RpcClient};

pub struct QuickFixProxy<'a> {
    client: &'a RpcClient,
}

impl<'a> QuickFixProxy<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }
}

/* RPC methods */
impl QuickFixProxy<'_> {
    #[named]
    fn deploy_quick_fix(&self, file_paths: &[PathBuf]) -> Result<DeployQuickFixResult> {
        self.client
            .call_with_args(function_name!(), RpcArguments::new().arg(file_paths))
    }

    #[named]
    fn get_quick_fix_info(&self, bundle_name: &str) -> Result<InnerAppQuickFix> {
        self.client
            .call_with_args(function_name!(), RpcArguments::new().arg(bundle_name))
    }

    #[named]
    fn get_quick_fix_status(&self, bundle_name: &str) -> Result<QuickFixMark> {
        self.client
            .call_with_args(function_name!(), RpcArguments::new().arg(bundle_name))
    }
}

/* Internal methods */
impl QuickFixProxy<'_> {
    fn check_error(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => {
                let mut err_msg = String::new();
                for (idx, e) in errors.into_iter().enumerate() {
                    writeln!(err_msg, "{}. {}", idx, e)?;
                }
                err_msg.pop();

                Err(anyhow!(err_msg))
            }
        }
    }
}

/* External methods */
impl QuickFixProxy<'_> {
    pub fn deploy_quick_fixes(&self, file_paths: &[PathBuf]) -> Result<()> {
        let deploy_result = self.deploy_quick_fix(file_paths)?;

        info!("-------------------------------------------");
        info!("{}", deploy_result);
        info!("-------------------------------------------");
        Ok(())
    }

    pub fn show_quick_fix_info(&self, bundle_names: &[String]) -> Result<()> {
        let mut results = vec![];
        let mut errors = vec![];

        for bundle_name in bundle_names {
            match self.get_quick_fix_info(bundle_name) {
                Ok(record) => results.push(record),
                Err(e) => errors.push(e),
            }
        }

        let mut result_iter = results.into_iter().peekable();
        while let Some(record) = result_iter.next() {
            info!("-------------------------------------------");
            info!("Bundle: {}", record.mark.bundle_name);
            info!("-------------------------------------------");
            info!("status:    {}", record.mark.status);
            info!("{}", record.app_quick_fix.to_string().trim_end());
            if result_iter.peek().is_some() {
                continue;
            }
            info!("-------------------------------------------");
        }
        Self::check_error(errors)
    }

    pub fn show_quick_fix_status(&self, bundle_names: &[String]) -> Result<()> {
        let mut errors = vec![];

        for bundle_name in bundle_names {
            match self.get_quick_fix_status(bundle_name) {
                Ok(mark) => info!("{}: {}", mark.bundle_name, mark.status),
                Err(e) => errors.push(e),
            }
        }
        Self::check_error(errors)
    }
}

#[test]
fn test_check_error() {
    assert!(QuickFixProxy::check_error(vec![]).is_ok());

    let err = QuickFixProxy::check_error(vec![anyhow!("first")]).unwrap_err();
    assert_eq!(err.to_string(), "first");

    let err = QuickFixProxy::check_error(vec![anyhow!("first"), anyhow!("second")]).unwrap_err();
    assert_eq!(err.to_string(), "0. first\n1. second");
}

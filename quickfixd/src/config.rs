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

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use quickfix_common::fs;

const DEFAULT_SOCKET_UID: u32 = 0;
const DEFAULT_SOCKET_GID: u32 = 0;

const DEFAULT_ABI: &str = "default";
const DEFAULT_SYSTEM_LIB64_DIR: &str = "/system/lib64";
const DEFAULT_BUNDLE_CODE_DIR: &str = "/data/app/el1/bundle/public";
const DEFAULT_BUNDLE_TMP_DIR: &str = "/data/local/tmp/quickfixd";
const DEFAULT_PATCH_TOOL: &str = "/usr/bin/bspatch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    pub uid: u32,
    pub gid: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            uid: DEFAULT_SOCKET_UID,
            gid: DEFAULT_SOCKET_GID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Supported abi list, may contain "default"
    pub abi_list: Vec<String>,
    /// Device is 64-bit if the directory exists
    pub system_lib64_dir: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            abi_list: vec![DEFAULT_ABI.to_string()],
            system_lib64_dir: PathBuf::from(DEFAULT_SYSTEM_LIB64_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub code_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            code_dir: PathBuf::from(DEFAULT_BUNDLE_CODE_DIR),
            tmp_dir: PathBuf::from(DEFAULT_BUNDLE_TMP_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    pub patch_tool: PathBuf,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            patch_tool: PathBuf::from(DEFAULT_PATCH_TOOL),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub socket: SocketConfig,
    pub device: DeviceConfig,
    pub bundle: BundleConfig,
    pub installer: InstallerConfig,
}

impl Config {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let instance = serde_yaml::from_reader(fs::open_file(config_path)?)
            .map_err(|_| anyhow!("Failed to parse config {}", config_path.display()))?;

        Ok(instance)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();
        let config_file = fs::create_file(config_path)?;
        serde_yaml::to_writer(config_file, self)
            .map_err(|_| anyhow!("Failed to write config {}", config_path.display()))?;

        Ok(())
    }
}

#[test]
fn test() -> Result<()> {
    use anyhow::{ensure, Context};

    let tmp_dir = tempfile::tempdir()?;
    let tmp_file = tmp_dir.path().join("quickfixd.yaml");

    let mut orig_cfg = Config::default();
    orig_cfg.device.abi_list = vec![String::from("arm64-v8a"), String::from("armeabi-v7a")];
    println!("{:#?}", orig_cfg);

    orig_cfg
        .write(&tmp_file)
        .context("Failed to write config")?;

    let new_cfg = Config::parse(&tmp_file).context("Failed to read config")?;
    println!("{:#?}", new_cfg);

    ensure!(orig_cfg == new_cfg, "Config does not match");
    ensure!(
        Config::parse(tmp_dir.path().join("missing.yaml")).is_err(),
        "Missing config should fail"
    );

    Ok(())
}

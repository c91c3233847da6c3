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
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use zip::{write::FileOptions, ZipWriter};

use quickfix_abi::{
    AppQuickFix, AppqfInfo, ApplicationInfo, BundleInfo, BundleStatus, HapModuleInfo,
    HapVerifyResult, HqfInfo, InnerAppQuickFix, InnerBundleInfo, ProvisionInfo, ProvisionType,
    QuickFixStatus, QuickFixType,
};
use quickfix_common::fs;

use super::{
    bundle_mgr::BundleDataMgr,
    data_mgr::QuickFixStore,
    extractor::{PATCH_PROFILE_NAME, PROVISION_PROFILE_NAME},
    installer::{InstalldClient, Installer},
    profile::DeviceInfo,
    verifier::SignatureVerifier,
};

pub const APP_ID: &str = "5765880207853134833";
pub const APL_NORMAL: &str = "normal";
pub const DIFF_CONTENT: &[u8] = b"diff";

pub fn device_info() -> DeviceInfo {
    DeviceInfo {
        abi_list: vec![String::from("arm64-v8a")],
        is_system_lib64_exist: true,
    }
}

pub fn create_profile(
    bundle_name: &str,
    version_code: u32,
    patch_version_code: u32,
    module_name: &str,
    kind: &str,
) -> Value {
    json!({
        "app": {
            "bundleName": bundle_name,
            "versionCode": version_code,
            "versionName": "1.0.0",
            "patchVersionCode": patch_version_code,
            "patchVersionName": format!("1.0.{}", patch_version_code),
        },
        "module": {
            "name": module_name,
            "type": kind,
            "deviceTypes": ["default", "tablet"],
            "originalModuleHash": "0123456789abcdef",
        }
    })
}

fn write_package(path: &Path, entries: &[(&str, Vec<u8>)]) -> Result<()> {
    let mut writer = ZipWriter::new(fs::create_file(path)?);
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default())?;
        writer.write_all(content)?;
    }
    writer.finish()?;

    Ok(())
}

/// Writes a package, `entries` are filled with diff content
pub fn create_package(path: &Path, profile: Option<&Value>, entries: &[&str]) -> Result<()> {
    let mut content = Vec::new();
    if let Some(profile) = profile {
        content.push((PATCH_PROFILE_NAME, profile.to_string().into_bytes()));
    }
    for entry in entries {
        content.push((*entry, DIFF_CONTENT.to_vec()));
    }
    write_package(path, &content)
}

pub fn create_package_with_provision(
    path: &Path,
    profile: &Value,
    provision_info: Option<&ProvisionInfo>,
) -> Result<()> {
    let mut content = vec![(PATCH_PROFILE_NAME, profile.to_string().into_bytes())];
    if let Some(provision_info) = provision_info {
        content.push((PROVISION_PROFILE_NAME, serde_json::to_vec(provision_info)?));
    }
    write_package(path, &content)
}

pub fn create_app_quick_fix(
    bundle_name: &str,
    version_code: u32,
    patch_version_code: u32,
    module_name: &str,
    kind: QuickFixType,
) -> AppQuickFix {
    AppQuickFix {
        bundle_name: bundle_name.to_string(),
        version_code,
        version_name: String::from("1.0.0"),
        deploying_appqf_info: AppqfInfo {
            version_code: patch_version_code,
            version_name: format!("1.0.{}", patch_version_code),
            kind,
            hqf_infos: vec![HqfInfo {
                module_name: module_name.to_string(),
                kind,
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn create_bundle_info(bundle_name: &str, version_code: u32, debug: bool) -> BundleInfo {
    let module = |name: &str| HapModuleInfo {
        name: name.to_string(),
        ..Default::default()
    };

    BundleInfo {
        name: bundle_name.to_string(),
        version_code,
        version_name: String::from("1.0.0"),
        app_id: format!("{}_{}", bundle_name, APP_ID),
        application_info: ApplicationInfo {
            name: bundle_name.to_string(),
            debug,
            app_provision_type: match debug {
                true => String::from("debug"),
                false => String::from("release"),
            },
            app_privilege_level: String::from(APL_NORMAL),
            cpu_abi: String::from("arm64-v8a"),
            native_library_path: String::from("libs/arm64"),
            ..Default::default()
        },
        hap_module_infos: vec![module("entry"), module("feature")],
    }
}

pub fn create_inner_bundle_info(bundle_name: &str, version_code: u32, debug: bool) -> InnerBundleInfo {
    InnerBundleInfo {
        bundle_info: create_bundle_info(bundle_name, version_code, debug),
        status: BundleStatus::Enabled,
    }
}

pub fn create_provision_info(bundle_name: &str) -> ProvisionInfo {
    ProvisionInfo {
        app_id: String::from(APP_ID),
        bundle_name: bundle_name.to_string(),
        apl: String::from(APL_NORMAL),
        kind: ProvisionType::Release,
    }
}

/// Installer running on the local file system.
/// Diff patching concatenates the old library and the diff file.
pub struct MockInstaller {
    client: InstalldClient,
    failed_op: Mutex<Option<&'static str>>,
}

impl Default for MockInstaller {
    fn default() -> Self {
        Self {
            client: InstalldClient::new("bspatch"),
            failed_op: Mutex::new(None),
        }
    }
}

impl MockInstaller {
    pub fn fail_on(&self, op: &'static str) {
        *self.failed_op.lock() = Some(op);
    }

    fn check_op(&self, op: &'static str) -> Result<()> {
        if *self.failed_op.lock() == Some(op) {
            bail!("Injected {} failure", op);
        }
        Ok(())
    }
}

impl Installer for MockInstaller {
    fn create_bundle_dir(&self, dir: &Path) -> Result<()> {
        self.check_op("create_bundle_dir")?;
        self.client.create_bundle_dir(dir)
    }

    fn remove_dir(&self, dir: &Path) -> Result<()> {
        self.client.remove_dir(dir)
    }

    fn is_exist_dir(&self, dir: &Path) -> bool {
        self.client.is_exist_dir(dir)
    }

    fn extract_diff_files(&self, hqf_path: &Path, out_dir: &Path, cpu_abi: &str) -> Result<()> {
        self.check_op("extract_diff_files")?;
        self.client.extract_diff_files(hqf_path, out_dir, cpu_abi)
    }

    fn apply_diff_patch(
        &self,
        old_so_dir: &Path,
        diff_dir: &Path,
        new_so_dir: &Path,
    ) -> Result<()> {
        self.check_op("apply_diff_patch")?;
        fs::create_dir_all(new_so_dir)?;

        let diff_files =
            fs::list_files_by_ext(diff_dir, "diff", fs::TraverseOptions { recursive: false })?;
        for diff_file in diff_files {
            let so_name = fs::file_name(diff_file.with_extension(""));
            let mut content = fs::read(old_so_dir.join(&so_name))?;
            content.extend(fs::read(&diff_file)?);
            fs::write(new_so_dir.join(&so_name), content)?;
        }

        Ok(())
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        self.check_op("move_file")?;
        self.client.move_file(src, dst)
    }
}

#[derive(Default)]
pub struct MockBundleDataMgr {
    bundle_map: Mutex<IndexMap<String, InnerBundleInfo>>,
    update_failed: Mutex<bool>,
}

impl MockBundleDataMgr {
    pub fn insert(&self, info: InnerBundleInfo) {
        self.bundle_map
            .lock()
            .insert(info.bundle_name().to_string(), info);
    }

    pub fn fail_update(&self) {
        *self.update_failed.lock() = true;
    }
}

impl BundleDataMgr for MockBundleDataMgr {
    fn get_bundle_info(&self, bundle_name: &str) -> Option<BundleInfo> {
        self.bundle_map
            .lock()
            .get(bundle_name)
            .map(|info| info.bundle_info.clone())
    }

    fn get_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo> {
        let mut bundle_map = self.bundle_map.lock();
        let info = bundle_map.get_mut(bundle_name)?;
        let result = info.clone();
        info.set_bundle_status(BundleStatus::Disabled);

        Some(result)
    }

    fn fetch_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo> {
        self.bundle_map.lock().get(bundle_name).cloned()
    }

    fn update_quick_fix_inner_bundle_info(
        &self,
        bundle_name: &str,
        info: &InnerBundleInfo,
    ) -> Result<()> {
        if *self.update_failed.lock() {
            bail!("Injected update failure");
        }
        self.bundle_map
            .lock()
            .insert(bundle_name.to_string(), info.clone());
        Ok(())
    }

    fn enable_bundle(&self, bundle_name: &str) {
        if let Some(info) = self.bundle_map.lock().get_mut(bundle_name) {
            info.set_bundle_status(BundleStatus::Enabled);
        }
    }
}

#[derive(Default)]
pub struct MockQuickFixStore {
    record_map: Mutex<IndexMap<String, InnerAppQuickFix>>,
    failed_status: Mutex<Option<QuickFixStatus>>,
}

impl MockQuickFixStore {
    /// Fails saving records of the given status
    pub fn fail_save(&self, status: QuickFixStatus) {
        *self.failed_status.lock() = Some(status);
    }
}

impl QuickFixStore for MockQuickFixStore {
    fn query_inner_app_quick_fix(&self, bundle_name: &str) -> Option<InnerAppQuickFix> {
        self.record_map.lock().get(bundle_name).cloned()
    }

    fn save_inner_app_quick_fix(&self, record: &InnerAppQuickFix) -> Result<()> {
        if *self.failed_status.lock() == Some(record.mark.status) {
            bail!("Injected save failure");
        }
        self.record_map
            .lock()
            .insert(record.bundle_name().to_string(), record.clone());
        Ok(())
    }

    fn delete_inner_app_quick_fix(&self, bundle_name: &str) -> Result<()> {
        self.record_map.lock().remove(bundle_name);
        Ok(())
    }
}

/// Provisions every package with the same profile, `None` yields no result
pub struct MockVerifier {
    provision_info: Mutex<Option<ProvisionInfo>>,
}

impl MockVerifier {
    pub fn new(provision_info: Option<ProvisionInfo>) -> Self {
        Self {
            provision_info: Mutex::new(provision_info),
        }
    }

    pub fn set_provision_info(&self, provision_info: Option<ProvisionInfo>) {
        *self.provision_info.lock() = provision_info;
    }
}

impl SignatureVerifier for MockVerifier {
    fn check_multiple_haps_sign_info(
        &self,
        file_paths: &[PathBuf],
    ) -> Result<Vec<HapVerifyResult>> {
        let provision_info = match self.provision_info.lock().clone() {
            Some(info) => info,
            None => return Ok(Vec::new()),
        };

        Ok(file_paths
            .iter()
            .map(|file_path| HapVerifyResult {
                file_path: file_path.display().to_string(),
                provision_info: provision_info.clone(),
            })
            .collect())
    }
}

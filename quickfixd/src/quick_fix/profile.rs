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
    convert::TryFrom,
    path::{Component, Path},
};

use indexmap::{indexmap, IndexMap};
use lazy_static::lazy_static;
use log::{debug, error};
use serde_json::{Map, Value};

use quickfix_abi::{AppQuickFix, AppqfInfo, HqfInfo, QuickFixType};

use super::{
    error::{Error, Result},
    extractor::PatchExtractor,
};

const APP: &str = "app";
const APP_BUNDLE_NAME: &str = "bundleName";
const APP_VERSION_CODE: &str = "versionCode";
const APP_VERSION_NAME: &str = "versionName";
const APP_PATCH_VERSION_CODE: &str = "patchVersionCode";
const APP_PATCH_VERSION_NAME: &str = "patchVersionName";
const MODULE: &str = "module";
const MODULE_NAME: &str = "name";
const MODULE_TYPE: &str = "type";
const MODULE_DEVICE_TYPES: &str = "deviceTypes";
const MODULE_ORIGINAL_MODULE_HASH: &str = "originalModuleHash";

const TYPE_PATCH: &str = "patch";
const TYPE_HOT_RELOAD: &str = "hotreload";

const LIBS_DIR: &str = "libs";
const ABI_DEFAULT: &str = "default";
const ABI_ARM64_V8A: &str = "arm64-v8a";
const ABI_ARMEABI_V7A: &str = "armeabi-v7a";
const ABI_ARMEABI: &str = "armeabi";

lazy_static! {
    static ref ABI_MAP: IndexMap<&'static str, &'static str> = indexmap! {
        ABI_ARM64_V8A => "arm64",
        ABI_ARMEABI_V7A => "arm",
        ABI_ARMEABI => "arm",
        "x86_64" => "x86_64",
        "x86" => "x86",
    };
}

/// Device facts used to resolve the native library layout of a patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub abi_list: Vec<String>,
    pub is_system_lib64_exist: bool,
}

#[derive(Debug, Default)]
struct PatchAppInfo {
    bundle_name: String,
    version_code: u32,
    version_name: String,
    patch_version_code: u32,
    patch_version_name: String,
}

#[derive(Debug, Default)]
struct PatchModuleInfo {
    name: String,
    kind: String,
    original_module_hash: String,
}

fn prop_name(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

fn get_object<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>> {
    obj.get(key)
        .ok_or_else(|| Error::MissingProp(key.to_string()))?
        .as_object()
        .ok_or_else(|| Error::PropTypeError(key.to_string()))
}

fn get_string(
    obj: &Map<String, Value>,
    parent: &str,
    key: &str,
    required: bool,
) -> Result<String> {
    match obj.get(key) {
        Some(value) => value
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::PropTypeError(prop_name(parent, key))),
        None if required => Err(Error::MissingProp(prop_name(parent, key))),
        None => Ok(String::new()),
    }
}

fn get_u32(obj: &Map<String, Value>, parent: &str, key: &str, required: bool) -> Result<u32> {
    match obj.get(key) {
        Some(value) => value
            .as_u64()
            .and_then(|num| u32::try_from(num).ok())
            .ok_or_else(|| Error::PropTypeError(prop_name(parent, key))),
        None if required => Err(Error::MissingProp(prop_name(parent, key))),
        None => Ok(0),
    }
}

fn get_string_list(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<Vec<String>> {
    let value = match obj.get(key) {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };
    let type_error = || Error::PropTypeError(prop_name(parent, key));

    value
        .as_array()
        .ok_or_else(type_error)?
        .iter()
        .map(|item| item.as_str().map(String::from).ok_or_else(type_error))
        .collect()
}

/// Names are used as path components, a name must be a single normal component
fn check_name(name: &str, parent: &str, key: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let is_valid = match (components.next(), components.next()) {
        (Some(Component::Normal(component)), None) => {
            (component == name) && !name.contains('\\')
        }
        _ => false,
    };
    if !is_valid {
        error!("Property '{}' is not a valid name, \"{}\"", prop_name(parent, key), name);
        return Err(Error::PropCheckError(prop_name(parent, key)));
    }
    Ok(())
}

pub struct PatchProfile;

impl PatchProfile {
    fn parse_app_info(obj: &Map<String, Value>) -> Result<PatchAppInfo> {
        let app_info = PatchAppInfo {
            bundle_name: get_string(obj, APP, APP_BUNDLE_NAME, true)?,
            version_code: get_u32(obj, APP, APP_VERSION_CODE, true)?,
            version_name: get_string(obj, APP, APP_VERSION_NAME, false)?,
            patch_version_code: get_u32(obj, APP, APP_PATCH_VERSION_CODE, true)?,
            patch_version_name: get_string(obj, APP, APP_PATCH_VERSION_NAME, false)?,
        };
        check_name(&app_info.bundle_name, APP, APP_BUNDLE_NAME)?;

        Ok(app_info)
    }

    fn parse_module_info(obj: &Map<String, Value>) -> Result<PatchModuleInfo> {
        let module_info = PatchModuleInfo {
            name: get_string(obj, MODULE, MODULE_NAME, true)?,
            kind: get_string(obj, MODULE, MODULE_TYPE, true)?,
            original_module_hash: get_string(obj, MODULE, MODULE_ORIGINAL_MODULE_HASH, false)?,
        };
        check_name(&module_info.name, MODULE, MODULE_NAME)?;

        let device_types = get_string_list(obj, MODULE, MODULE_DEVICE_TYPES)?;
        debug!("Module '{}' device types: [{}]", module_info.name, device_types.join(", "));

        Ok(module_info)
    }

    fn parse_quick_fix_type(kind: &str) -> QuickFixType {
        match kind {
            TYPE_PATCH => QuickFixType::Patch,
            TYPE_HOT_RELOAD => QuickFixType::HotReload,
            _ => QuickFixType::Unknown,
        }
    }

    fn parse_default_native_so(
        appqf_info: &mut AppqfInfo,
        extractor: &PatchExtractor,
        device: &DeviceInfo,
    ) -> bool {
        let candidates: &[&str] = match device.is_system_lib64_exist {
            true => &[ABI_ARM64_V8A],
            false => &[ABI_ARMEABI_V7A, ABI_ARMEABI],
        };

        for abi in candidates.iter().copied() {
            if let Some(lib_dir) = ABI_MAP.get(abi) {
                if extractor.is_dir_exist(&format!("{}/{}", LIBS_DIR, abi)) {
                    appqf_info.cpu_abi = abi.to_string();
                    appqf_info.native_library_path = format!("{}/{}", LIBS_DIR, lib_dir);
                    return true;
                }
            }
        }
        false
    }

    /// Resolves the bundle level native library abi & path of a patch
    fn parse_native_so(
        appqf_info: &mut AppqfInfo,
        extractor: &PatchExtractor,
        device: &DeviceInfo,
    ) -> Result<()> {
        let abi_list = &device.abi_list;
        let first_abi = abi_list
            .first()
            .ok_or_else(|| Error::ParseNativeSoFailed("device abi list is empty".to_string()))?;
        let is_default = abi_list.iter().any(|abi| abi == ABI_DEFAULT);

        if !extractor.is_dir_exist(LIBS_DIR) {
            appqf_info.cpu_abi = match (is_default, device.is_system_lib64_exist) {
                (true, true) => ABI_ARM64_V8A.to_string(),
                (true, false) => ABI_ARMEABI_V7A.to_string(),
                (false, _) => first_abi.clone(),
            };
            debug!("Patch has no native library, abi: {}", appqf_info.cpu_abi);
            return Ok(());
        }

        for abi in abi_list {
            if let Some(lib_dir) = ABI_MAP.get(abi.as_str()) {
                if extractor.is_dir_exist(&format!("{}/{}", LIBS_DIR, abi)) {
                    appqf_info.cpu_abi = abi.clone();
                    appqf_info.native_library_path = format!("{}/{}", LIBS_DIR, lib_dir);
                    return Ok(());
                }
            }
        }

        if is_default && Self::parse_default_native_so(appqf_info, extractor, device) {
            return Ok(());
        }

        Err(Error::ParseNativeSoFailed(format!(
            "no library directory matches abi list [{}]",
            abi_list.join(", ")
        )))
    }

    pub fn transform_to(
        buf: &[u8],
        extractor: &PatchExtractor,
        device: &DeviceInfo,
    ) -> Result<AppQuickFix> {
        let profile: Value =
            serde_json::from_slice(buf).map_err(|e| Error::BadProfile(e.to_string()))?;
        let root = profile
            .as_object()
            .ok_or_else(|| Error::BadProfile("profile is not an object".to_string()))?;

        let app_info = Self::parse_app_info(get_object(root, APP)?)?;
        let module_info = Self::parse_module_info(get_object(root, MODULE)?)?;
        debug!("{:?}", app_info);
        debug!("{:?}", module_info);

        let kind = Self::parse_quick_fix_type(&module_info.kind);
        let mut appqf_info = AppqfInfo {
            version_code: app_info.patch_version_code,
            version_name: app_info.patch_version_name,
            kind,
            hqf_infos: vec![HqfInfo {
                module_name: module_info.name,
                hap_sha256: module_info.original_module_hash,
                kind,
                ..Default::default()
            }],
            ..Default::default()
        };
        if kind == QuickFixType::Patch {
            Self::parse_native_so(&mut appqf_info, extractor, device)?;
        }

        Ok(AppQuickFix {
            bundle_name: app_info.bundle_name,
            version_code: app_info.version_code,
            version_name: app_info.version_name,
            deploying_appqf_info: appqf_info,
            ..Default::default()
        })
    }
}

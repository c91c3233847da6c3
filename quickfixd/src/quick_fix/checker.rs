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

use std::{collections::HashSet, path::PathBuf};

use indexmap::IndexMap;
use log::{debug, error};

use quickfix_abi::{AppQuickFix, BundleInfo, HapVerifyResult, ProvisionInfo, QuickFixType};

use super::{
    error::{Error, Result},
    verifier::SignatureVerifier,
};

/// Validation rules of quick fix deployment
pub struct QuickFixChecker;

impl QuickFixChecker {
    pub fn check_multiple_hqfs_sign_info(
        verifier: &dyn SignatureVerifier,
        file_paths: &[PathBuf],
    ) -> Result<Vec<HapVerifyResult>> {
        verifier.check_multiple_haps_sign_info(file_paths).map_err(|e| {
            error!("{:?}", e);
            Error::IncompatibleSignature
        })
    }

    /// Packages deployed together must describe the same patch of the same bundle
    pub fn check_app_quick_fix_infos(app_qf_infos: &IndexMap<PathBuf, AppQuickFix>) -> Result<()> {
        if app_qf_infos.len() <= 1 {
            return Ok(());
        }

        let first = match app_qf_infos.values().next() {
            Some(app_qf) => app_qf,
            None => return Ok(()),
        };
        let first_qf_info = &first.deploying_appqf_info;

        let mut module_names = HashSet::new();
        for (file_path, app_qf) in app_qf_infos {
            let qf_info = &app_qf.deploying_appqf_info;
            if app_qf.bundle_name != first.bundle_name {
                return Err(Error::BundleNameNotSame);
            }
            if app_qf.version_code != first.version_code {
                return Err(Error::VersionCodeNotSame);
            }
            if app_qf.version_name != first.version_name {
                return Err(Error::VersionNameNotSame);
            }
            if qf_info.version_code != first_qf_info.version_code {
                return Err(Error::PatchVersionCodeNotSame);
            }
            if qf_info.version_name != first_qf_info.version_name {
                return Err(Error::PatchVersionNameNotSame);
            }
            if qf_info.kind != first_qf_info.kind {
                return Err(Error::PatchTypeNotSame);
            }
            if qf_info.hqf_infos.is_empty() {
                return Err(Error::ProfileParseFailed(file_path.display().to_string()));
            }
            for hqf_info in &qf_info.hqf_infos {
                if !module_names.insert(hqf_info.module_name.as_str()) {
                    return Err(Error::ModuleNameSame(hqf_info.module_name.clone()));
                }
            }
        }

        Ok(())
    }

    pub fn check_common_with_installed_bundle(
        app_qf: &AppQuickFix,
        bundle_info: &BundleInfo,
    ) -> Result<()> {
        if app_qf.bundle_name != bundle_info.name {
            return Err(Error::BundleNameNotSame);
        }
        if app_qf.version_code != bundle_info.version_code {
            return Err(Error::VersionCodeNotSame);
        }

        let deployed_info = &bundle_info
            .application_info
            .app_quick_fix
            .deployed_appqf_info;
        let new_version_code = app_qf.deploying_appqf_info.version_code;
        if !deployed_info.hqf_infos.is_empty() && (new_version_code <= deployed_info.version_code)
        {
            error!(
                "Patch version code {} is not greater than deployed version code {}",
                new_version_code, deployed_info.version_code
            );
            return Err(Error::VersionCodeError);
        }

        Ok(())
    }

    pub fn check_patch_with_installed_bundle(
        app_qf: &AppQuickFix,
        bundle_info: &BundleInfo,
        provision_info: &ProvisionInfo,
    ) -> Result<()> {
        Self::check_common_with_installed_bundle(app_qf, bundle_info)?;

        let app_info = &bundle_info.application_info;
        if app_info.is_debug()
            && (app_info.app_quick_fix.deployed_appqf_info.kind == QuickFixType::HotReload)
        {
            return Err(Error::HotReloadAlreadyExisted);
        }
        if app_qf.version_name != bundle_info.version_name {
            return Err(Error::VersionNameNotSame);
        }

        Self::check_patch_native_so_with_installed_bundle(app_qf, bundle_info)?;
        Self::check_signature_info(bundle_info, provision_info)
    }

    pub fn check_hot_reload_with_installed_bundle(
        app_qf: &AppQuickFix,
        bundle_info: &BundleInfo,
    ) -> Result<()> {
        Self::check_common_with_installed_bundle(app_qf, bundle_info)?;

        let app_info = &bundle_info.application_info;
        if !app_info.is_debug() {
            return Err(Error::HotReloadNotSupportReleaseBundle);
        }
        if app_info.app_quick_fix.deployed_appqf_info.kind == QuickFixType::Patch {
            return Err(Error::PatchAlreadyExisted);
        }

        Ok(())
    }

    fn check_patch_native_so_with_installed_bundle(
        app_qf: &AppQuickFix,
        bundle_info: &BundleInfo,
    ) -> Result<()> {
        let qf_info = &app_qf.deploying_appqf_info;
        let app_info = &bundle_info.application_info;

        if !qf_info.native_library_path.is_empty() && !app_info.native_library_path.is_empty() {
            if (qf_info.native_library_path != app_info.native_library_path)
                || (qf_info.cpu_abi != app_info.cpu_abi)
            {
                error!(
                    "Native library {} ({}) does not match installed {} ({})",
                    qf_info.native_library_path,
                    qf_info.cpu_abi,
                    app_info.native_library_path,
                    app_info.cpu_abi
                );
                return Err(Error::SoIncompatible);
            }
            return Ok(());
        }

        for hqf_info in &qf_info.hqf_infos {
            let module_info = match bundle_info.find_module(&hqf_info.module_name) {
                Some(module_info) => module_info,
                None => continue,
            };
            if hqf_info.native_library_path.is_empty() || module_info.native_library_path.is_empty()
            {
                continue;
            }
            if (hqf_info.native_library_path != module_info.native_library_path)
                || (hqf_info.cpu_abi != module_info.cpu_abi)
            {
                error!(
                    "Module '{}' native library {} ({}) does not match installed {} ({})",
                    hqf_info.module_name,
                    hqf_info.native_library_path,
                    hqf_info.cpu_abi,
                    module_info.native_library_path,
                    module_info.cpu_abi
                );
                return Err(Error::SoIncompatible);
            }
        }

        Ok(())
    }

    pub fn check_signature_info(
        bundle_info: &BundleInfo,
        provision_info: &ProvisionInfo,
    ) -> Result<()> {
        let expected_app_id = format!("{}_{}", bundle_info.name, provision_info.app_id);
        if bundle_info.app_id != expected_app_id {
            error!(
                "App id '{}' does not match '{}'",
                bundle_info.app_id, expected_app_id
            );
            return Err(Error::SignatureInfoNotSame);
        }
        if provision_info.bundle_name != bundle_info.name {
            error!(
                "Provision bundle name '{}' does not match '{}'",
                provision_info.bundle_name, bundle_info.name
            );
            return Err(Error::SignatureInfoNotSame);
        }
        if provision_info.apl != bundle_info.application_info.app_privilege_level {
            error!(
                "Provision apl '{}' does not match '{}'",
                provision_info.apl, bundle_info.application_info.app_privilege_level
            );
            return Err(Error::SignatureInfoNotSame);
        }

        Ok(())
    }

    pub fn check_module_name_exist(
        bundle_info: &BundleInfo,
        app_qf_infos: &IndexMap<PathBuf, AppQuickFix>,
    ) -> Result<()> {
        let hqf_infos = app_qf_infos
            .values()
            .flat_map(|app_qf| app_qf.deploying_appqf_info.hqf_infos.iter());
        for hqf_info in hqf_infos {
            if bundle_info.find_module(&hqf_info.module_name).is_none() {
                return Err(Error::ModuleNameNotExist(hqf_info.module_name.clone()));
            }
        }

        Ok(())
    }

    /// Packages of one deployment share a single native library layout,
    /// the first non-empty one is applied to all of them.
    pub fn check_multi_native_so(app_qf_infos: &mut IndexMap<PathBuf, AppQuickFix>) -> Result<()> {
        if app_qf_infos.len() <= 1 {
            return Ok(());
        }

        let mut canonical: Option<(String, String)> = None;
        for app_qf in app_qf_infos.values() {
            let qf_info = &app_qf.deploying_appqf_info;
            if qf_info.native_library_path.is_empty() {
                continue;
            }
            match &canonical {
                None => {
                    canonical = Some((qf_info.native_library_path.clone(), qf_info.cpu_abi.clone()))
                }
                Some((native_library_path, cpu_abi)) => {
                    if (&qf_info.native_library_path != native_library_path)
                        || (&qf_info.cpu_abi != cpu_abi)
                    {
                        error!(
                            "Native library {} ({}) conflicts with {} ({})",
                            qf_info.native_library_path, qf_info.cpu_abi, native_library_path, cpu_abi
                        );
                        return Err(Error::SoIncompatible);
                    }
                }
            }
        }

        if let Some((native_library_path, cpu_abi)) = canonical {
            debug!("Native library: {} ({})", native_library_path, cpu_abi);
            for app_qf in app_qf_infos.values_mut() {
                let qf_info = &mut app_qf.deploying_appqf_info;
                qf_info.native_library_path = native_library_path.clone();
                qf_info.cpu_abi = cpu_abi.clone();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quickfix_abi::{AppqfInfo, HapModuleInfo, HqfInfo};

    use super::super::mock::{create_app_quick_fix, create_bundle_info, create_provision_info};
    use super::*;

    fn create_infos(app_qfs: Vec<AppQuickFix>) -> IndexMap<PathBuf, AppQuickFix> {
        app_qfs
            .into_iter()
            .enumerate()
            .map(|(idx, app_qf)| (PathBuf::from(format!("/data/patch_{}.hqf", idx)), app_qf))
            .collect()
    }

    #[test]
    fn test_check_app_quick_fix_infos() {
        let entry = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::Patch);
        let feature = create_app_quick_fix("com.example.test", 1000000, 1, "feature", QuickFixType::Patch);
        let single = create_infos(vec![entry.clone()]);
        assert_eq!(QuickFixChecker::check_app_quick_fix_infos(&single), Ok(()));
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), feature.clone()])),
            Ok(())
        );
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), entry.clone()])),
            Err(Error::ModuleNameSame(String::from("entry")))
        );

        let mut other = feature.clone();
        other.bundle_name = String::from("com.example.other");
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), other])),
            Err(Error::BundleNameNotSame)
        );

        let mut other = feature.clone();
        other.version_code += 1;
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), other])),
            Err(Error::VersionCodeNotSame)
        );

        let mut other = feature.clone();
        other.version_name = String::from("1.0.1");
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), other])),
            Err(Error::VersionNameNotSame)
        );

        let mut other = feature.clone();
        other.deploying_appqf_info.version_code = 2;
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), other])),
            Err(Error::PatchVersionCodeNotSame)
        );

        let mut other = feature.clone();
        other.deploying_appqf_info.version_name = String::from("1.0.2");
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry.clone(), other])),
            Err(Error::PatchVersionNameNotSame)
        );

        let mut other = feature;
        other.deploying_appqf_info.kind = QuickFixType::HotReload;
        assert_eq!(
            QuickFixChecker::check_app_quick_fix_infos(&create_infos(vec![entry, other])),
            Err(Error::PatchTypeNotSame)
        );
    }

    #[test]
    fn test_check_common_with_installed_bundle() {
        let app_qf = create_app_quick_fix("com.example.test", 1000000, 2, "entry", QuickFixType::Patch);
        let mut bundle_info = create_bundle_info("com.example.test", 1000000, false);
        assert_eq!(
            QuickFixChecker::check_common_with_installed_bundle(&app_qf, &bundle_info),
            Ok(())
        );

        let deployed_info = &mut bundle_info.application_info.app_quick_fix.deployed_appqf_info;
        deployed_info.version_code = 2;
        deployed_info.hqf_infos.push(HqfInfo::default());
        assert_eq!(
            QuickFixChecker::check_common_with_installed_bundle(&app_qf, &bundle_info),
            Err(Error::VersionCodeError)
        );

        bundle_info.version_code = 1000001;
        assert_eq!(
            QuickFixChecker::check_common_with_installed_bundle(&app_qf, &bundle_info),
            Err(Error::VersionCodeNotSame)
        );

        bundle_info.name = String::from("com.example.other");
        assert_eq!(
            QuickFixChecker::check_common_with_installed_bundle(&app_qf, &bundle_info),
            Err(Error::BundleNameNotSame)
        );
    }

    #[test]
    fn test_check_patch_with_installed_bundle() {
        let provision_info = create_provision_info("com.example.test");
        let mut app_qf = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::Patch);
        let mut bundle_info = create_bundle_info("com.example.test", 1000000, true);
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Ok(())
        );

        app_qf.deploying_appqf_info.native_library_path = String::from("libs/arm64");
        app_qf.deploying_appqf_info.cpu_abi = String::from("arm64-v8a");
        bundle_info.application_info.native_library_path = String::from("libs/arm");
        bundle_info.application_info.cpu_abi = String::from("armeabi-v7a");
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Err(Error::SoIncompatible)
        );

        app_qf.version_name = String::from("2.0.0");
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Err(Error::VersionNameNotSame)
        );

        let deployed_info = &mut bundle_info.application_info.app_quick_fix.deployed_appqf_info;
        deployed_info.kind = QuickFixType::HotReload;
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Err(Error::HotReloadAlreadyExisted)
        );
    }

    #[test]
    fn test_check_module_native_so() {
        let provision_info = create_provision_info("com.example.test");
        let mut app_qf = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::Patch);
        app_qf.deploying_appqf_info.hqf_infos[0].native_library_path = String::from("entry/libs/arm64");
        app_qf.deploying_appqf_info.hqf_infos[0].cpu_abi = String::from("arm64-v8a");

        let mut bundle_info = create_bundle_info("com.example.test", 1000000, false);
        bundle_info.hap_module_infos[0] = HapModuleInfo {
            name: String::from("entry"),
            cpu_abi: String::from("arm64-v8a"),
            native_library_path: String::from("entry/libs/arm64"),
            is_lib_isolated: true,
        };
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Ok(())
        );

        bundle_info.hap_module_infos[0].cpu_abi = String::from("x86_64");
        assert_eq!(
            QuickFixChecker::check_patch_with_installed_bundle(&app_qf, &bundle_info, &provision_info),
            Err(Error::SoIncompatible)
        );
    }

    #[test]
    fn test_check_signature_info() {
        let bundle_info = create_bundle_info("com.example.test", 1000000, false);
        let provision_info = create_provision_info("com.example.test");
        assert_eq!(
            QuickFixChecker::check_signature_info(&bundle_info, &provision_info),
            Ok(())
        );

        let mut other = provision_info.clone();
        other.app_id = String::from("other_app_id");
        assert_eq!(
            QuickFixChecker::check_signature_info(&bundle_info, &other),
            Err(Error::SignatureInfoNotSame)
        );

        let mut other = provision_info.clone();
        other.bundle_name = String::from("com.example.other");
        assert_eq!(
            QuickFixChecker::check_signature_info(&bundle_info, &other),
            Err(Error::SignatureInfoNotSame)
        );

        let mut other = provision_info;
        other.apl = String::from("system_core");
        assert_eq!(
            QuickFixChecker::check_signature_info(&bundle_info, &other),
            Err(Error::SignatureInfoNotSame)
        );
    }

    #[test]
    fn test_check_hot_reload_with_installed_bundle() {
        let app_qf = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::HotReload);
        let release_bundle = create_bundle_info("com.example.test", 1000000, false);
        assert_eq!(
            QuickFixChecker::check_hot_reload_with_installed_bundle(&app_qf, &release_bundle),
            Err(Error::HotReloadNotSupportReleaseBundle)
        );

        let mut debug_bundle = create_bundle_info("com.example.test", 1000000, true);
        assert_eq!(
            QuickFixChecker::check_hot_reload_with_installed_bundle(&app_qf, &debug_bundle),
            Ok(())
        );

        debug_bundle.application_info.app_quick_fix.deployed_appqf_info = AppqfInfo {
            kind: QuickFixType::Patch,
            ..Default::default()
        };
        assert_eq!(
            QuickFixChecker::check_hot_reload_with_installed_bundle(&app_qf, &debug_bundle),
            Err(Error::PatchAlreadyExisted)
        );
    }

    #[test]
    fn test_check_module_name_exist() {
        let bundle_info = create_bundle_info("com.example.test", 1000000, false);
        let entry = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::Patch);
        let unknown = create_app_quick_fix("com.example.test", 1000000, 1, "unknown", QuickFixType::Patch);

        assert_eq!(
            QuickFixChecker::check_module_name_exist(&bundle_info, &create_infos(vec![entry.clone()])),
            Ok(())
        );
        assert_eq!(
            QuickFixChecker::check_module_name_exist(&bundle_info, &create_infos(vec![entry, unknown])),
            Err(Error::ModuleNameNotExist(String::from("unknown")))
        );
    }

    #[test]
    fn test_check_multi_native_so() {
        let mut entry = create_app_quick_fix("com.example.test", 1000000, 1, "entry", QuickFixType::Patch);
        let mut feature = create_app_quick_fix("com.example.test", 1000000, 1, "feature", QuickFixType::Patch);
        entry.deploying_appqf_info.cpu_abi = String::from("arm64-v8a");
        feature.deploying_appqf_info.cpu_abi = String::from("arm64-v8a");
        feature.deploying_appqf_info.native_library_path = String::from("libs/arm64");

        let mut app_qf_infos = create_infos(vec![entry.clone(), feature.clone()]);
        assert_eq!(QuickFixChecker::check_multi_native_so(&mut app_qf_infos), Ok(()));
        for app_qf in app_qf_infos.values() {
            assert_eq!(app_qf.deploying_appqf_info.native_library_path, "libs/arm64");
            assert_eq!(app_qf.deploying_appqf_info.cpu_abi, "arm64-v8a");
        }

        entry.deploying_appqf_info.native_library_path = String::from("libs/arm");
        entry.deploying_appqf_info.cpu_abi = String::from("armeabi-v7a");
        let mut app_qf_infos = create_infos(vec![entry, feature]);
        assert_eq!(
            QuickFixChecker::check_multi_native_so(&mut app_qf_infos),
            Err(Error::SoIncompatible)
        );
    }
}

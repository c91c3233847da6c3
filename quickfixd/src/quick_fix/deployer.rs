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

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use scopeguard::ScopeGuard;
use uuid::Uuid;

use quickfix_abi::{
    AppQuickFix, AppqfInfo, BundleInfo, BundleStatus, DeployQuickFixResult, HqfInfo,
    InnerAppQuickFix, QuickFixMark, QuickFixStatus, QuickFixType, QUICK_FIX_FILE_SUFFIX,
};
use quickfix_common::{fs, util::digest};

use super::{
    bundle_mgr::BundleDataMgr,
    checker::QuickFixChecker,
    data_mgr::QuickFixStore,
    error::{Error, Result},
    installer::Installer,
    parser::PatchParser,
    profile::DeviceInfo,
    transaction::DeployTransaction,
    verifier::SignatureVerifier,
};

const SESSION_DIR_NAME: &str = "quick_fix";
const DIFF_DIR_SUFFIX: &str = "_tmp";

/// Collaborators & locations shared by every deployment
pub struct DeployContext {
    pub installer: Arc<dyn Installer>,
    pub bundle_mgr: Arc<dyn BundleDataMgr>,
    pub data_mgr: Arc<dyn QuickFixStore>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub device: DeviceInfo,
    pub bundle_code_dir: PathBuf,
    pub bundle_tmp_dir: PathBuf,
}

impl DeployContext {
    fn patch_dir(&self, bundle_name: &str, kind: QuickFixType, version_code: u32) -> PathBuf {
        self.bundle_code_dir
            .join(bundle_name)
            .join(format!("{}{}", kind.dir_prefix(), version_code))
    }
}

/// Deploys one or more quick fix packages of a single bundle.
///
/// Deployment runs in two phases. The first phase parses & validates every
/// package and persists the new record as DEPLOY-START. The second phase
/// builds the patch directory, persists DEPLOY-END and pushes the result to
/// the bundle registry. A failed second phase restores the record which
/// existed before the deployment.
pub struct QuickFixDeployer<'a> {
    context: &'a DeployContext,
    bundle_file_paths: Vec<PathBuf>,
    deploy_result: DeployQuickFixResult,
}

impl<'a> QuickFixDeployer<'a> {
    pub fn new(context: &'a DeployContext, bundle_file_paths: Vec<PathBuf>) -> Self {
        Self {
            context,
            bundle_file_paths,
            deploy_result: DeployQuickFixResult::default(),
        }
    }

    pub fn execute(&mut self) -> Result<()> {
        info!("Deploying quick fix {:?}...", self.bundle_file_paths);
        match self.deploy_quick_fix() {
            Ok(()) => {
                info!("Deployed quick fix of '{}'", self.deploy_result.bundle_name);
                Ok(())
            }
            Err(e) => {
                error!("Failed to deploy quick fix, {} ({})", e, e.code());
                Err(e)
            }
        }
    }

    pub fn deploy_result(&self) -> &DeployQuickFixResult {
        &self.deploy_result
    }

    fn deploy_quick_fix(&mut self) -> Result<()> {
        if self.bundle_file_paths.is_empty() {
            return Err(Error::Param("no quick fix file".to_string()));
        }

        let session_dir = self
            .context
            .bundle_tmp_dir
            .join(SESSION_DIR_NAME)
            .join(Uuid::new_v4().to_string());
        fs::create_dir_all(&session_dir).map_err(|e| Error::Internal(e.to_string()))?;
        let installer = self.context.installer.clone();
        let session_guard = scopeguard::guard(session_dir, move |dir| {
            if let Err(e) = installer.remove_dir(&dir) {
                warn!("Failed to remove {}, {:?}", dir.display(), e);
            }
        });

        let file_paths = self.process_bundle_file_paths(&session_guard)?;
        let (transaction, mut record) = self.to_deploy_start_status(&file_paths)?;

        let old_patch_dir = transaction.snapshot().map(|old_record| {
            let old_qf_info = &old_record.app_quick_fix.deploying_appqf_info;
            self.context
                .patch_dir(old_record.bundle_name(), old_qf_info.kind, old_qf_info.version_code)
        });

        match self.to_deploy_end_status(&mut record) {
            Ok(deploy_result) => {
                transaction.commit();
                self.deploy_result = deploy_result;
            }
            Err(e) => {
                if let Err(rollback_err) = transaction.abort() {
                    error!("Failed to restore quick fix record, {}", rollback_err);
                }
                return Err(e);
            }
        }

        let new_qf_info = &record.app_quick_fix.deploying_appqf_info;
        let new_patch_dir =
            self.context
                .patch_dir(record.bundle_name(), new_qf_info.kind, new_qf_info.version_code);
        if let Some(old_patch_dir) = old_patch_dir.filter(|dir| dir != &new_patch_dir) {
            debug!("Removing old patch directory {}", old_patch_dir.display());
            if let Err(e) = self.context.installer.remove_dir(&old_patch_dir) {
                warn!("Failed to remove {}, {:?}", old_patch_dir.display(), e);
            }
        }

        Ok(())
    }

    /// Checks the requested packages & stages them into the session directory
    fn process_bundle_file_paths(&self, session_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut file_paths = Vec::with_capacity(self.bundle_file_paths.len());

        for (index, bundle_file_path) in self.bundle_file_paths.iter().enumerate() {
            let real_path = fs::canonicalize(bundle_file_path).map_err(|e| {
                error!("{}", e);
                Error::Param(format!("cannot access {}", bundle_file_path.display()))
            })?;
            let file_name = fs::file_name(&real_path);
            if !real_path.is_file() || !file_name.to_string_lossy().ends_with(QUICK_FIX_FILE_SUFFIX)
            {
                return Err(Error::Param(format!(
                    "{} is not a quick fix file",
                    real_path.display()
                )));
            }

            let staged_path = session_dir.join(format!("{}_{}", index, file_name.to_string_lossy()));
            debug!("Staging {} to {}", real_path.display(), staged_path.display());
            fs::copy(&real_path, &staged_path).map_err(|e| Error::Internal(e.to_string()))?;
            Self::check_staged_file(&real_path, &staged_path)?;
            file_paths.push(staged_path);
        }

        Ok(file_paths)
    }

    fn check_staged_file(file_path: &Path, staged_path: &Path) -> Result<()> {
        let digest_file = |path: &Path| {
            digest::file(path).map_err(|e| Error::Internal(e.to_string()))
        };
        let checksum = digest_file(file_path)?;
        let staged_checksum = digest_file(staged_path)?;
        debug!("Package checksum: '{}'", checksum);
        debug!("Staged checksum:  '{}'", staged_checksum);

        if checksum != staged_checksum {
            return Err(Error::Param(format!(
                "{} is changed during staging",
                file_path.display()
            )));
        }
        Ok(())
    }

    fn to_deploy_start_status(
        &self,
        file_paths: &[PathBuf],
    ) -> Result<(DeployTransaction<'a>, InnerAppQuickFix)> {
        info!("Deploy start...");
        let mut app_qf_infos = self.parse_and_check_app_quick_fix_infos(file_paths)?;
        let app_qf = first_app_quick_fix(&app_qf_infos)?.clone();
        let new_qf_info = &app_qf.deploying_appqf_info;

        let context = self.context;
        let transaction = DeployTransaction::begin(&*context.data_mgr, &app_qf.bundle_name)?;
        if let Some(old_record) = transaction.snapshot() {
            if old_record.app_quick_fix.deploying_appqf_info.kind == new_qf_info.kind {
                Self::check_patch_version_code(&app_qf, old_record)?;
            }
        }

        let bundle_info = self
            .context
            .bundle_mgr
            .get_bundle_info(&app_qf.bundle_name)
            .ok_or_else(|| Error::BundleNameNotExist(app_qf.bundle_name.clone()))?;

        match new_qf_info.kind {
            QuickFixType::Patch => {
                self.process_patch_deploy_start(file_paths, &bundle_info, &mut app_qf_infos)?
            }
            QuickFixType::HotReload => {
                QuickFixChecker::check_hot_reload_with_installed_bundle(&app_qf, &bundle_info)?
            }
            QuickFixType::Unknown => return Err(Error::UnknownQuickFixType),
        }

        let record = Self::to_inner_app_quick_fix(&app_qf_infos, transaction.snapshot())?;
        self.save_app_quick_fix(&record)?;

        Ok((transaction, record))
    }

    fn parse_and_check_app_quick_fix_infos(
        &self,
        file_paths: &[PathBuf],
    ) -> Result<IndexMap<PathBuf, AppQuickFix>> {
        let parser = PatchParser::new(self.context.device.clone());
        let mut app_qf_infos = parser.parse_patch_infos(file_paths)?;

        self.reset_native_so_attrs(&mut app_qf_infos);
        QuickFixChecker::check_app_quick_fix_infos(&app_qf_infos)?;

        for (file_path, app_qf) in app_qf_infos.iter_mut() {
            let qf_info = &mut app_qf.deploying_appqf_info;
            if qf_info.kind == QuickFixType::Unknown {
                return Err(Error::UnknownQuickFixType);
            }
            let hqf_info = qf_info
                .hqf_infos
                .first_mut()
                .ok_or_else(|| Error::ProfileParseFailed(file_path.display().to_string()))?;
            hqf_info.hqf_file_path = file_path.display().to_string();
        }

        Ok(app_qf_infos)
    }

    /// A single module package of a lib isolated module carries its native
    /// library on module level.
    fn reset_native_so_attrs(&self, app_qf_infos: &mut IndexMap<PathBuf, AppQuickFix>) {
        for (file_path, app_qf) in app_qf_infos.iter_mut() {
            let qf_info = &mut app_qf.deploying_appqf_info;
            if qf_info.hqf_infos.len() != 1 {
                warn!(
                    "Package {} has {} module(s), skip resetting native library",
                    file_path.display(),
                    qf_info.hqf_infos.len()
                );
                continue;
            }

            let inner_bundle_info = match self
                .context
                .bundle_mgr
                .fetch_inner_bundle_info(&app_qf.bundle_name)
            {
                Some(info) => info,
                None => continue,
            };
            let hqf_info = &mut qf_info.hqf_infos[0];
            if !inner_bundle_info.is_lib_isolated(&hqf_info.module_name) {
                continue;
            }

            hqf_info.cpu_abi = qf_info.cpu_abi.clone();
            if !qf_info.native_library_path.is_empty() {
                hqf_info.native_library_path =
                    format!("{}/{}", hqf_info.module_name, qf_info.native_library_path);
                qf_info.native_library_path.clear();
            }
            debug!(
                "Module '{}' native library: {} ({})",
                hqf_info.module_name, hqf_info.native_library_path, hqf_info.cpu_abi
            );
        }
    }

    fn check_patch_version_code(app_qf: &AppQuickFix, old_record: &InnerAppQuickFix) -> Result<()> {
        let new_version_code = app_qf.deploying_appqf_info.version_code;
        let old_app_qf = &old_record.app_quick_fix;
        let deployed_version_code = old_app_qf.deployed_appqf_info.version_code;
        let deploying_version_code = old_app_qf.deploying_appqf_info.version_code;

        if (new_version_code <= deployed_version_code) || (new_version_code <= deploying_version_code)
        {
            error!(
                "Patch version code {} is not greater than deployed {} and deploying {}",
                new_version_code, deployed_version_code, deploying_version_code
            );
            return Err(Error::VersionCodeError);
        }

        Ok(())
    }

    fn process_patch_deploy_start(
        &self,
        file_paths: &[PathBuf],
        bundle_info: &BundleInfo,
        app_qf_infos: &mut IndexMap<PathBuf, AppQuickFix>,
    ) -> Result<()> {
        QuickFixChecker::check_multi_native_so(app_qf_infos)?;

        let verify_results = QuickFixChecker::check_multiple_hqfs_sign_info(
            &*self.context.verifier,
            file_paths,
        )?;
        let provision_info = match verify_results.first() {
            Some(result) => &result.provision_info,
            None => {
                error!("No signature info of the quick fix files");
                return Err(Error::IncompatibleSignature);
            }
        };

        let app_qf = first_app_quick_fix(app_qf_infos)?;
        QuickFixChecker::check_patch_with_installed_bundle(app_qf, bundle_info, provision_info)?;
        QuickFixChecker::check_module_name_exist(bundle_info, app_qf_infos)
    }

    fn to_inner_app_quick_fix(
        app_qf_infos: &IndexMap<PathBuf, AppQuickFix>,
        old_record: Option<&InnerAppQuickFix>,
    ) -> Result<InnerAppQuickFix> {
        let mut app_qf = first_app_quick_fix(app_qf_infos)?.clone();
        if let Some(old_record) = old_record {
            app_qf.deployed_appqf_info = old_record.app_quick_fix.deployed_appqf_info.clone();
        }

        let mark = QuickFixMark {
            bundle_name: app_qf.bundle_name.clone(),
            status: QuickFixStatus::DeployStart,
        };
        let mut record = InnerAppQuickFix::new(app_qf, mark);
        for app_qf in app_qf_infos.values() {
            if !record.add_hqf_info(app_qf) {
                error!("Failed to add module patch of '{}'", app_qf.bundle_name);
                return Err(Error::AddHqfFailed);
            }
        }

        Ok(record)
    }

    fn save_app_quick_fix(&self, record: &InnerAppQuickFix) -> Result<()> {
        self.context
            .data_mgr
            .save_inner_app_quick_fix(record)
            .map_err(|e| {
                error!("{:?}", e);
                Error::SaveAppQuickFixFailed
            })
    }

    fn to_deploy_end_status(&self, record: &mut InnerAppQuickFix) -> Result<DeployQuickFixResult> {
        info!("Deploy end...");
        let qf_info = &record.app_quick_fix.deploying_appqf_info;
        let patch_dir =
            self.context
                .patch_dir(record.bundle_name(), qf_info.kind, qf_info.version_code);

        let installer = self.context.installer.clone();
        let patch_dir_guard = scopeguard::guard(patch_dir, move |dir| {
            warn!("Removing patch directory {}", dir.display());
            if let Err(e) = installer.remove_dir(&dir) {
                warn!("Failed to remove {}, {:?}", dir.display(), e);
            }
        });

        match qf_info.kind {
            QuickFixType::Patch => {
                self.process_patch_deploy_end(&record.app_quick_fix, &patch_dir_guard)?
            }
            QuickFixType::HotReload => self.create_patch_dir(&patch_dir_guard)?,
            QuickFixType::Unknown => return Err(Error::UnknownQuickFixType),
        }

        self.process_native_library_path(&patch_dir_guard, &mut record.app_quick_fix);
        self.move_hqf_files(&patch_dir_guard, &mut record.app_quick_fix.deploying_appqf_info)?;

        record.mark.status = QuickFixStatus::DeployEnd;
        self.save_app_quick_fix(record)?;

        let deploy_result = Self::to_deploy_quick_fix_result(&record.app_quick_fix);
        self.save_to_inner_bundle_info(record)?;

        let patch_dir = ScopeGuard::into_inner(patch_dir_guard);
        debug!("Quick fix is deployed to {}", patch_dir.display());

        Ok(deploy_result)
    }

    fn create_patch_dir(&self, patch_dir: &Path) -> Result<()> {
        self.context
            .installer
            .create_bundle_dir(patch_dir)
            .map_err(|e| {
                error!("{:?}", e);
                Error::CreatePatchPathFailed(patch_dir.display().to_string())
            })
    }

    fn fetch_patch_native_so_attrs<'b>(
        qf_info: &'b AppqfInfo,
        hqf_info: &'b HqfInfo,
        is_lib_isolated: bool,
    ) -> (&'b str, &'b str) {
        match is_lib_isolated {
            true => (hqf_info.native_library_path.as_str(), hqf_info.cpu_abi.as_str()),
            false => (qf_info.native_library_path.as_str(), qf_info.cpu_abi.as_str()),
        }
    }

    fn process_patch_deploy_end(&self, app_qf: &AppQuickFix, patch_dir: &Path) -> Result<()> {
        self.create_patch_dir(patch_dir)?;

        let bundle_name = &app_qf.bundle_name;
        let inner_bundle_info = self
            .context
            .bundle_mgr
            .fetch_inner_bundle_info(bundle_name)
            .ok_or_else(|| Error::NotExistedBundleInfo(bundle_name.clone()))?;
        let bundle_dir = self.context.bundle_code_dir.join(bundle_name);
        let installer = &self.context.installer;

        let qf_info = &app_qf.deploying_appqf_info;
        for hqf_info in &qf_info.hqf_infos {
            if hqf_info.hqf_file_path.is_empty() {
                return Err(Error::Param(format!(
                    "module '{}' has no quick fix file",
                    hqf_info.module_name
                )));
            }

            let is_lib_isolated = inner_bundle_info.is_lib_isolated(&hqf_info.module_name);
            let (library_path, cpu_abi) =
                Self::fetch_patch_native_so_attrs(qf_info, hqf_info, is_lib_isolated);
            if library_path.is_empty() {
                continue;
            }

            let old_so_dir = bundle_dir.join(library_path);
            if !installer.is_exist_dir(&old_so_dir) {
                info!(
                    "Module '{}' has no installed library in {}, skipped",
                    hqf_info.module_name,
                    old_so_dir.display()
                );
                continue;
            }

            let diff_dir = self
                .context
                .bundle_tmp_dir
                .join(format!("{}{}", bundle_name, DIFF_DIR_SUFFIX));
            let diff_installer = installer.clone();
            let _diff_dir_guard = scopeguard::guard(diff_dir.clone(), move |dir| {
                if let Err(e) = diff_installer.remove_dir(&dir) {
                    warn!("Failed to remove {}, {:?}", dir.display(), e);
                }
            });

            let hqf_path = Path::new(&hqf_info.hqf_file_path);
            installer
                .extract_diff_files(hqf_path, &diff_dir, cpu_abi)
                .map_err(|e| {
                    error!("{:?}", e);
                    Error::ExtractDiffFilesFailed(hqf_info.hqf_file_path.clone())
                })?;

            let new_so_dir = patch_dir.join(library_path);
            installer
                .apply_diff_patch(&old_so_dir, &diff_dir, &new_so_dir)
                .map_err(|e| {
                    error!("{:?}", e);
                    Error::ApplyDiffPatchFailed(old_so_dir.display().to_string())
                })?;
        }

        Ok(())
    }

    /// Rewrites native library paths relative to the bundle code directory.
    /// Paths without a generated library are cleared.
    fn process_native_library_path(&self, patch_dir: &Path, app_qf: &mut AppQuickFix) {
        let qf_info = &mut app_qf.deploying_appqf_info;
        let dir_name = format!("{}{}", qf_info.kind.dir_prefix(), qf_info.version_code);
        let installer = &self.context.installer;

        let rewrite = |library_path: &mut String| {
            if library_path.is_empty() {
                return;
            }
            if installer.is_exist_dir(&patch_dir.join(library_path.as_str())) {
                *library_path = format!("{}/{}", dir_name, library_path);
            } else {
                debug!("Library {} is not generated, cleared", library_path);
                library_path.clear();
            }
        };

        rewrite(&mut qf_info.native_library_path);
        for hqf_info in qf_info.hqf_infos.iter_mut() {
            rewrite(&mut hqf_info.native_library_path);
        }
    }

    fn move_hqf_files(&self, patch_dir: &Path, qf_info: &mut AppqfInfo) -> Result<()> {
        for hqf_info in qf_info.hqf_infos.iter_mut() {
            if hqf_info.hqf_file_path.is_empty() {
                return Err(Error::Param(format!(
                    "module '{}' has no quick fix file",
                    hqf_info.module_name
                )));
            }

            let src_path = PathBuf::from(&hqf_info.hqf_file_path);
            let dst_path = patch_dir.join(format!("{}{}", hqf_info.module_name, QUICK_FIX_FILE_SUFFIX));
            self.context
                .installer
                .move_file(&src_path, &dst_path)
                .map_err(|e| {
                    error!("{:?}", e);
                    Error::MovePatchFileFailed(hqf_info.hqf_file_path.clone())
                })?;
            hqf_info.hqf_file_path = dst_path.display().to_string();
        }

        Ok(())
    }

    fn to_deploy_quick_fix_result(app_qf: &AppQuickFix) -> DeployQuickFixResult {
        let qf_info = &app_qf.deploying_appqf_info;
        DeployQuickFixResult {
            bundle_name: app_qf.bundle_name.clone(),
            bundle_version_code: app_qf.version_code,
            patch_version_code: qf_info.version_code,
            kind: qf_info.kind,
            is_so_contained: qf_info.has_native_so(),
            module_names: qf_info.module_names(),
        }
    }

    fn save_to_inner_bundle_info(&self, record: &InnerAppQuickFix) -> Result<()> {
        let bundle_name = record.bundle_name();
        let bundle_mgr = &self.context.bundle_mgr;

        let mut inner_bundle_info = bundle_mgr
            .get_inner_bundle_info(bundle_name)
            .ok_or_else(|| Error::NotExistedBundleInfo(bundle_name.to_string()))?;
        let _enable_guard = scopeguard::guard((), |_| bundle_mgr.enable_bundle(bundle_name));

        let mut app_qf = record.app_quick_fix.clone();
        app_qf.deployed_appqf_info = inner_bundle_info.app_quick_fix().deployed_appqf_info.clone();
        inner_bundle_info.set_app_quick_fix(app_qf);
        inner_bundle_info.set_bundle_status(BundleStatus::Enabled);

        bundle_mgr
            .update_quick_fix_inner_bundle_info(bundle_name, &inner_bundle_info)
            .map_err(|e| {
                error!("{:?}", e);
                Error::Internal(format!("cannot update bundle info of '{}'", bundle_name))
            })
    }
}

fn first_app_quick_fix(app_qf_infos: &IndexMap<PathBuf, AppQuickFix>) -> Result<&AppQuickFix> {
    app_qf_infos
        .values()
        .next()
        .ok_or_else(|| Error::ProfileParseFailed(String::new()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use quickfix_abi::{HapModuleInfo, InnerBundleInfo};

    use super::super::mock::*;
    use super::*;

    const BUNDLE_NAME: &str = "com.example.test";
    const VERSION_CODE: u32 = 1000000;

    struct Fixture {
        work_dir: TempDir,
        installer: Arc<MockInstaller>,
        bundle_mgr: Arc<MockBundleDataMgr>,
        data_mgr: Arc<MockQuickFixStore>,
        verifier: Arc<MockVerifier>,
        context: DeployContext,
    }

    impl Fixture {
        fn new(debug: bool) -> anyhow::Result<Self> {
            let work_dir = tempfile::tempdir()?;
            let installer = Arc::new(MockInstaller::default());
            let bundle_mgr = Arc::new(MockBundleDataMgr::default());
            let data_mgr = Arc::new(MockQuickFixStore::default());
            let verifier = Arc::new(MockVerifier::new(Some(create_provision_info(BUNDLE_NAME))));
            bundle_mgr.insert(create_inner_bundle_info(BUNDLE_NAME, VERSION_CODE, debug));

            let context = DeployContext {
                installer: installer.clone(),
                bundle_mgr: bundle_mgr.clone(),
                data_mgr: data_mgr.clone(),
                verifier: verifier.clone(),
                device: device_info(),
                bundle_code_dir: work_dir.path().join("code"),
                bundle_tmp_dir: work_dir.path().join("tmp"),
            };
            fs::create_dir_all(&context.bundle_code_dir)?;
            fs::create_dir_all(&context.bundle_tmp_dir)?;

            Ok(Self {
                work_dir,
                installer,
                bundle_mgr,
                data_mgr,
                verifier,
                context,
            })
        }

        fn create_hqf(
            &self,
            patch_version_code: u32,
            module_name: &str,
            kind: &str,
            entries: &[&str],
        ) -> anyhow::Result<PathBuf> {
            let profile =
                create_profile(BUNDLE_NAME, VERSION_CODE, patch_version_code, module_name, kind);
            let file_path = self.work_dir.path().join(format!(
                "{}_{}{}",
                module_name, patch_version_code, QUICK_FIX_FILE_SUFFIX
            ));
            create_package(&file_path, Some(&profile), entries)?;

            Ok(file_path)
        }

        fn deploy(&self, file_paths: &[PathBuf]) -> Result<DeployQuickFixResult> {
            let mut deployer = QuickFixDeployer::new(&self.context, file_paths.to_vec());
            deployer.execute()?;
            Ok(deployer.deploy_result().clone())
        }

        fn bundle_dir(&self) -> PathBuf {
            self.context.bundle_code_dir.join(BUNDLE_NAME)
        }

        fn record(&self) -> Option<InnerAppQuickFix> {
            self.data_mgr.query_inner_app_quick_fix(BUNDLE_NAME)
        }

        fn bundle_info(&self) -> anyhow::Result<InnerBundleInfo> {
            self.bundle_mgr
                .fetch_inner_bundle_info(BUNDLE_NAME)
                .ok_or_else(|| anyhow::anyhow!("Bundle '{}' is missing", BUNDLE_NAME))
        }

        fn is_session_clean(&self) -> anyhow::Result<bool> {
            let session_root = self.context.bundle_tmp_dir.join(SESSION_DIR_NAME);
            if !session_root.exists() {
                return Ok(true);
            }
            Ok(fs::read_dir(session_root)?.next().is_none())
        }
    }

    #[test]
    fn test_deploy_patch() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;

        let result = fixture.deploy(&[hqf_path.clone()])?;
        assert_eq!(result.bundle_name, BUNDLE_NAME);
        assert_eq!(result.bundle_version_code, VERSION_CODE);
        assert_eq!(result.patch_version_code, 1);
        assert_eq!(result.kind, QuickFixType::Patch);
        assert!(!result.is_so_contained);
        assert_eq!(result.module_names, vec![String::from("entry")]);

        let record = fixture.record().ok_or_else(|| anyhow::anyhow!("No record"))?;
        assert_eq!(record.mark.status, QuickFixStatus::DeployEnd);
        let deployed_hqf = fixture.bundle_dir().join("patch_1").join("entry.hqf");
        assert!(deployed_hqf.is_file());
        assert_eq!(
            record.app_quick_fix.deploying_appqf_info.hqf_infos[0].hqf_file_path,
            deployed_hqf.display().to_string()
        );

        let bundle_info = fixture.bundle_info()?;
        assert_eq!(bundle_info.status, BundleStatus::Enabled);
        assert_eq!(
            bundle_info.app_quick_fix().deploying_appqf_info.version_code,
            1
        );

        assert!(hqf_path.is_file());
        assert!(fixture.is_session_clean()?);

        Ok(())
    }

    #[test]
    fn test_redeploy_same_version() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        fixture.deploy(&[hqf_path.clone()])?;
        let old_record = fixture.record();

        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::VersionCodeError));
        assert_eq!(fixture.record(), old_record);
        assert!(fixture.bundle_dir().join("patch_1").join("entry.hqf").is_file());
        assert!(fixture.is_session_clean()?);

        Ok(())
    }

    #[test]
    fn test_upgrade_patch() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        fixture.deploy(&[fixture.create_hqf(1, "entry", "patch", &[])?])?;

        let result = fixture.deploy(&[fixture.create_hqf(2, "entry", "patch", &[])?])?;
        assert_eq!(result.patch_version_code, 2);
        assert!(!fixture.bundle_dir().join("patch_1").exists());
        assert!(fixture.bundle_dir().join("patch_2").join("entry.hqf").is_file());

        let record = fixture.record().ok_or_else(|| anyhow::anyhow!("No record"))?;
        assert_eq!(record.app_quick_fix.deploying_appqf_info.version_code, 2);
        assert_eq!(record.mark.status, QuickFixStatus::DeployEnd);

        Ok(())
    }

    #[test]
    fn test_hot_reload() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let hqf_path = fixture.create_hqf(1, "entry", "hotreload", &[])?;
        assert_eq!(
            fixture.deploy(&[hqf_path]),
            Err(Error::HotReloadNotSupportReleaseBundle)
        );
        assert!(fixture.record().is_none());
        assert!(!fixture.bundle_dir().join("hotreload_1").exists());

        let fixture = Fixture::new(true)?;
        fixture.verifier.set_provision_info(None);
        let result = fixture.deploy(&[fixture.create_hqf(1, "entry", "hotreload", &[])?])?;
        assert_eq!(result.kind, QuickFixType::HotReload);
        assert!(fixture.bundle_dir().join("hotreload_1").join("entry.hqf").is_file());

        Ok(())
    }

    #[test]
    fn test_absolute_module_name() -> anyhow::Result<()> {
        let fixture = Fixture::new(true)?;
        fixture.verifier.set_provision_info(None);

        let escaped = fixture.work_dir.path().join("escaped");
        let module_name = escaped.display().to_string();
        let profile = create_profile(BUNDLE_NAME, VERSION_CODE, 1, &module_name, "hotreload");
        let hqf_path = fixture.work_dir.path().join("escaped_1.hqf");
        create_package(&hqf_path, Some(&profile), &[])?;

        assert_eq!(
            fixture.deploy(&[hqf_path]),
            Err(Error::PropCheckError(String::from("module.name")))
        );
        assert!(!escaped.with_extension("hqf").exists());
        assert!(!fixture.bundle_dir().join("hotreload_1").exists());
        assert!(fixture.record().is_none());
        assert!(fixture.is_session_clean()?);

        Ok(())
    }

    #[test]
    fn test_patch_and_hot_reload_exclusion() -> anyhow::Result<()> {
        let fixture = Fixture::new(true)?;
        let mut bundle_info = fixture.bundle_info()?;
        let mut app_qf = bundle_info.app_quick_fix().clone();
        app_qf.deployed_appqf_info.kind = QuickFixType::Patch;
        bundle_info.set_app_quick_fix(app_qf.clone());
        fixture.bundle_mgr.insert(bundle_info.clone());

        let hqf_path = fixture.create_hqf(1, "entry", "hotreload", &[])?;
        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::PatchAlreadyExisted));

        app_qf.deployed_appqf_info.kind = QuickFixType::HotReload;
        bundle_info.set_app_quick_fix(app_qf);
        fixture.bundle_mgr.insert(bundle_info);

        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::HotReloadAlreadyExisted));
        assert!(fixture.record().is_none());

        Ok(())
    }

    #[test]
    fn test_rollback_without_record() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        fixture.installer.fail_on("move_file");

        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        assert!(matches!(
            fixture.deploy(&[hqf_path.clone()]),
            Err(Error::MovePatchFileFailed(_))
        ));
        assert!(fixture.record().is_none());
        assert!(!fixture.bundle_dir().join("patch_1").exists());
        assert_eq!(fixture.bundle_info()?.status, BundleStatus::Enabled);
        assert!(hqf_path.is_file());
        assert!(fixture.is_session_clean()?);

        Ok(())
    }

    #[test]
    fn test_rollback_with_record() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        fixture.deploy(&[fixture.create_hqf(1, "entry", "patch", &[])?])?;
        let old_record = fixture.record();
        let old_bundle_info = fixture.bundle_info()?;

        fixture.bundle_mgr.fail_update();
        let hqf_path = fixture.create_hqf(2, "entry", "patch", &[])?;
        assert!(matches!(fixture.deploy(&[hqf_path]), Err(Error::Internal(_))));

        assert_eq!(fixture.record(), old_record);
        assert_eq!(fixture.bundle_info()?, old_bundle_info);
        assert!(fixture.bundle_dir().join("patch_1").join("entry.hqf").is_file());
        assert!(!fixture.bundle_dir().join("patch_2").exists());

        Ok(())
    }

    #[test]
    fn test_save_deploy_end_failure() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        fixture.data_mgr.fail_save(QuickFixStatus::DeployEnd);

        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::SaveAppQuickFixFailed));
        assert!(fixture.record().is_none());
        assert!(!fixture.bundle_dir().join("patch_1").exists());

        Ok(())
    }

    #[test]
    fn test_deploy_native_library() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let old_so_dir = fixture.bundle_dir().join("libs/arm64");
        fs::create_dir_all(&old_so_dir)?;
        fs::write(old_so_dir.join("libtest.so"), b"old")?;

        let hqf_path =
            fixture.create_hqf(1, "entry", "patch", &["libs/arm64-v8a/libtest.so.diff"])?;
        let result = fixture.deploy(&[hqf_path])?;
        assert!(result.is_so_contained);

        let new_so = fixture.bundle_dir().join("patch_1/libs/arm64/libtest.so");
        assert_eq!(fs::read(new_so)?, b"olddiff".to_vec());
        assert!(!fixture
            .context
            .bundle_tmp_dir
            .join(format!("{}{}", BUNDLE_NAME, DIFF_DIR_SUFFIX))
            .exists());

        let record = fixture.record().ok_or_else(|| anyhow::anyhow!("No record"))?;
        let qf_info = &record.app_quick_fix.deploying_appqf_info;
        assert_eq!(qf_info.cpu_abi, "arm64-v8a");
        assert_eq!(qf_info.native_library_path, "patch_1/libs/arm64");

        Ok(())
    }

    #[test]
    fn test_deploy_lib_isolated_module() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let mut bundle_info = fixture.bundle_info()?;
        bundle_info.bundle_info.hap_module_infos[0] = HapModuleInfo {
            name: String::from("entry"),
            cpu_abi: String::from("arm64-v8a"),
            native_library_path: String::from("entry/libs/arm64"),
            is_lib_isolated: true,
        };
        fixture.bundle_mgr.insert(bundle_info);

        let old_so_dir = fixture.bundle_dir().join("entry/libs/arm64");
        fs::create_dir_all(&old_so_dir)?;
        fs::write(old_so_dir.join("libtest.so"), b"old")?;

        let hqf_path =
            fixture.create_hqf(1, "entry", "patch", &["libs/arm64-v8a/libtest.so.diff"])?;
        let result = fixture.deploy(&[hqf_path])?;
        assert!(result.is_so_contained);

        let new_so = fixture.bundle_dir().join("patch_1/entry/libs/arm64/libtest.so");
        assert_eq!(fs::read(new_so)?, b"olddiff".to_vec());

        let record = fixture.record().ok_or_else(|| anyhow::anyhow!("No record"))?;
        let qf_info = &record.app_quick_fix.deploying_appqf_info;
        assert_eq!(qf_info.native_library_path, "");
        assert_eq!(qf_info.hqf_infos[0].cpu_abi, "arm64-v8a");
        assert_eq!(
            qf_info.hqf_infos[0].native_library_path,
            "patch_1/entry/libs/arm64"
        );

        Ok(())
    }

    #[test]
    fn test_deploy_multiple_modules() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let file_paths = vec![
            fixture.create_hqf(1, "entry", "patch", &[])?,
            fixture.create_hqf(1, "feature", "patch", &[])?,
        ];

        let result = fixture.deploy(&file_paths)?;
        assert_eq!(
            result.module_names,
            vec![String::from("entry"), String::from("feature")]
        );
        assert!(fixture.bundle_dir().join("patch_1/entry.hqf").is_file());
        assert!(fixture.bundle_dir().join("patch_1/feature.hqf").is_file());

        let file_paths = vec![
            fixture.create_hqf(2, "entry", "patch", &[])?,
            fixture.create_hqf(3, "feature", "patch", &[])?,
        ];
        assert_eq!(
            fixture.deploy(&file_paths),
            Err(Error::PatchVersionCodeNotSame)
        );

        Ok(())
    }

    #[test]
    fn test_duplicate_module() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        let dup_path = fixture.work_dir.path().join("dup.hqf");
        fs::copy(&hqf_path, &dup_path)?;

        assert_eq!(
            fixture.deploy(&[hqf_path, dup_path]),
            Err(Error::ModuleNameSame(String::from("entry")))
        );
        assert!(fixture.record().is_none());

        Ok(())
    }

    #[test]
    fn test_invalid_params() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        assert!(matches!(fixture.deploy(&[]), Err(Error::Param(_))));

        let missing_path = fixture.work_dir.path().join("missing.hqf");
        assert!(matches!(fixture.deploy(&[missing_path]), Err(Error::Param(_))));

        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        let zip_path = fixture.work_dir.path().join("entry.zip");
        fs::copy(&hqf_path, &zip_path)?;
        assert!(matches!(fixture.deploy(&[zip_path]), Err(Error::Param(_))));
        assert!(fixture.is_session_clean()?);

        Ok(())
    }

    #[test]
    fn test_validation_errors() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let hqf_path = fixture.create_hqf(1, "entry", "unknown", &[])?;
        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::UnknownQuickFixType));

        let hqf_path = fixture.create_hqf(1, "other", "patch", &[])?;
        assert_eq!(
            fixture.deploy(&[hqf_path]),
            Err(Error::ModuleNameNotExist(String::from("other")))
        );

        fixture.verifier.set_provision_info(None);
        let hqf_path = fixture.create_hqf(1, "entry", "patch", &[])?;
        assert_eq!(fixture.deploy(&[hqf_path]), Err(Error::IncompatibleSignature));
        assert!(fixture.record().is_none());

        Ok(())
    }

    #[test]
    fn test_invalid_status_and_missing_bundle() -> anyhow::Result<()> {
        let fixture = Fixture::new(false)?;
        let record = InnerAppQuickFix::new(
            create_app_quick_fix(BUNDLE_NAME, VERSION_CODE, 1, "entry", QuickFixType::Patch),
            QuickFixMark {
                bundle_name: String::from(BUNDLE_NAME),
                status: QuickFixStatus::SwitchEnd,
            },
        );
        fixture.data_mgr.save_inner_app_quick_fix(&record)?;

        let hqf_path = fixture.create_hqf(2, "entry", "patch", &[])?;
        assert_eq!(
            fixture.deploy(&[hqf_path]),
            Err(Error::InvalidPatchStatus(QuickFixStatus::SwitchEnd))
        );

        let fixture_without_bundle = Fixture::new(false)?;
        let missing_bundle = BundleInfo {
            name: String::from("com.example.missing"),
            ..Default::default()
        };
        let profile = create_profile(&missing_bundle.name, VERSION_CODE, 1, "entry", "patch");
        let missing_path = fixture_without_bundle.work_dir.path().join("missing.hqf");
        create_package(&missing_path, Some(&profile), &[])?;
        assert_eq!(
            fixture_without_bundle.deploy(&[missing_path]),
            Err(Error::BundleNameNotExist(missing_bundle.name))
        );

        Ok(())
    }
}

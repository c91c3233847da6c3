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

use anyhow::{bail, ensure, Context, Result};
use log::debug;

use quickfix_abi::{HapVerifyResult, ProvisionInfo};

use super::extractor::PatchExtractor;

pub trait SignatureVerifier: Send + Sync {
    /// Verifies a group of packages, every package yields one result
    fn check_multiple_haps_sign_info(&self, file_paths: &[PathBuf])
        -> Result<Vec<HapVerifyResult>>;
}

/// Reads the provision profile shipped in each package.
/// Packages of one group have to be provisioned for the same application.
pub struct ProvisionVerifier;

impl ProvisionVerifier {
    fn read_provision_info(file_path: &Path) -> Result<ProvisionInfo> {
        let mut extractor = PatchExtractor::open(file_path)?;
        let buf = match extractor.read_provision()? {
            Some(buf) => buf,
            None => bail!("Package {} has no provision profile", file_path.display()),
        };

        serde_json::from_slice(&buf).with_context(|| {
            format!(
                "Failed to parse provision profile of {}",
                file_path.display()
            )
        })
    }
}

impl SignatureVerifier for ProvisionVerifier {
    fn check_multiple_haps_sign_info(
        &self,
        file_paths: &[PathBuf],
    ) -> Result<Vec<HapVerifyResult>> {
        let mut results: Vec<HapVerifyResult> = Vec::with_capacity(file_paths.len());

        for file_path in file_paths {
            let provision_info = Self::read_provision_info(file_path)?;
            debug!("{}: {:?}", file_path.display(), provision_info);

            if let Some(first) = results.first() {
                let first_info = &first.provision_info;
                ensure!(
                    (first_info.app_id == provision_info.app_id)
                        && (first_info.bundle_name == provision_info.bundle_name)
                        && (first_info.apl == provision_info.apl)
                        && (first_info.kind == provision_info.kind),
                    "Package {} is not provisioned as {}",
                    file_path.display(),
                    first.file_path
                );
            }
            results.push(HapVerifyResult {
                file_path: file_path.display().to_string(),
                provision_info,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use quickfix_abi::ProvisionType;

    use super::super::mock::{create_package_with_provision, create_profile, create_provision_info};
    use super::*;

    #[test]
    fn test_provision_verifier() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let entry_file = temp_dir.path().join("entry.hqf");
        let feature_file = temp_dir.path().join("feature.hqf");
        let other_file = temp_dir.path().join("other.hqf");
        let unsigned_file = temp_dir.path().join("unsigned.hqf");

        let provision_info = create_provision_info("com.example.test");
        let mut other_info = provision_info.clone();
        other_info.kind = ProvisionType::Debug;

        let profile = create_profile("com.example.test", 1000000, 1, "entry", "patch");
        create_package_with_provision(&entry_file, &profile, Some(&provision_info))?;
        create_package_with_provision(&feature_file, &profile, Some(&provision_info))?;
        create_package_with_provision(&other_file, &profile, Some(&other_info))?;
        create_package_with_provision(&unsigned_file, &profile, None)?;

        let results = ProvisionVerifier
            .check_multiple_haps_sign_info(&[entry_file.clone(), feature_file.clone()])?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].provision_info, provision_info);
        assert_eq!(results[1].file_path, feature_file.display().to_string());

        assert!(ProvisionVerifier
            .check_multiple_haps_sign_info(&[entry_file.clone(), other_file])
            .is_err());
        assert!(ProvisionVerifier
            .check_multiple_haps_sign_info(&[entry_file, unsigned_file])
            .is_err());

        Ok(())
    }
}

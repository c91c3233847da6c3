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

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, error, info};
use parking_lot::RwLock;

use quickfix_abi::{BundleInfo, BundleStatus, InnerBundleInfo};
use quickfix_common::util::serde;

const BUNDLE_DB_MAGIC: &str = "42554E444C455321"; // BUNDLES!

/// Installed bundle metadata consumed by quick fix deployment
pub trait BundleDataMgr: Send + Sync {
    fn get_bundle_info(&self, bundle_name: &str) -> Option<BundleInfo>;

    /// Returns the registry record for modification, the bundle stays
    /// disabled until `enable_bundle` is called.
    fn get_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo>;

    fn fetch_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo>;

    fn update_quick_fix_inner_bundle_info(
        &self,
        bundle_name: &str,
        info: &InnerBundleInfo,
    ) -> Result<()>;

    fn enable_bundle(&self, bundle_name: &str);
}

type BundleMap = IndexMap<String, InnerBundleInfo>;

pub struct BundleRegistry {
    db_file: PathBuf,
    bundle_map: RwLock<BundleMap>,
}

impl BundleRegistry {
    pub fn new<P: AsRef<Path>>(db_file: P) -> Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();
        let bundle_map = match db_file.exists() {
            true => serde::deserialize_with_magic::<BundleMap, _, _>(&db_file, BUNDLE_DB_MAGIC)
                .with_context(|| format!("Failed to read {}", db_file.display()))?,
            false => BundleMap::new(),
        };
        info!("Loaded {} bundle(s)", bundle_map.len());

        Ok(Self {
            db_file,
            bundle_map: RwLock::new(bundle_map),
        })
    }

    fn save(&self, bundle_map: &BundleMap) -> Result<()> {
        debug!("Writing {}...", self.db_file.display());
        serde::serialize_with_magic(bundle_map, &self.db_file, BUNDLE_DB_MAGIC)
            .with_context(|| format!("Failed to write {}", self.db_file.display()))
    }

    fn set_bundle_status(&self, bundle_name: &str, status: BundleStatus) -> Result<()> {
        let mut bundle_map = self.bundle_map.write();
        if let Some(info) = bundle_map.get_mut(bundle_name) {
            debug!("Bundle '{}' status: {}", bundle_name, status);
            info.set_bundle_status(status);
            self.save(&bundle_map)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn insert(&self, info: InnerBundleInfo) -> Result<()> {
        let mut bundle_map = self.bundle_map.write();
        bundle_map.insert(info.bundle_name().to_string(), info);
        self.save(&bundle_map)
    }
}

impl BundleDataMgr for BundleRegistry {
    fn get_bundle_info(&self, bundle_name: &str) -> Option<BundleInfo> {
        self.bundle_map
            .read()
            .get(bundle_name)
            .map(|info| info.bundle_info.clone())
    }

    fn get_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo> {
        let info = self.fetch_inner_bundle_info(bundle_name)?;
        if let Err(e) = self.set_bundle_status(bundle_name, BundleStatus::Disabled) {
            error!("{:?}", e);
            return None;
        }
        Some(info)
    }

    fn fetch_inner_bundle_info(&self, bundle_name: &str) -> Option<InnerBundleInfo> {
        self.bundle_map.read().get(bundle_name).cloned()
    }

    fn update_quick_fix_inner_bundle_info(
        &self,
        bundle_name: &str,
        info: &InnerBundleInfo,
    ) -> Result<()> {
        let mut bundle_map = self.bundle_map.write();
        let old_info = bundle_map
            .get_mut(bundle_name)
            .with_context(|| format!("Bundle '{}' is not installed", bundle_name))?;

        let backup = std::mem::replace(old_info, info.clone());
        if let Err(e) = self.save(&bundle_map) {
            bundle_map.insert(bundle_name.to_string(), backup);
            return Err(e);
        }
        Ok(())
    }

    fn enable_bundle(&self, bundle_name: &str) {
        if let Err(e) = self.set_bundle_status(bundle_name, BundleStatus::Enabled) {
            error!("Failed to enable bundle '{}', {:?}", bundle_name, e);
        }
    }
}

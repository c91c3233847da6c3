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
use log::{debug, info};
use parking_lot::RwLock;

use quickfix_abi::InnerAppQuickFix;
use quickfix_common::util::serde;

const QUICK_FIX_DB_MAGIC: &str = "515549434B464958"; // QUICKFIX

/// Persistent quick fix records, keyed by bundle name
pub trait QuickFixStore: Send + Sync {
    fn query_inner_app_quick_fix(&self, bundle_name: &str) -> Option<InnerAppQuickFix>;

    fn save_inner_app_quick_fix(&self, record: &InnerAppQuickFix) -> Result<()>;

    fn delete_inner_app_quick_fix(&self, bundle_name: &str) -> Result<()>;
}

type RecordMap = IndexMap<String, InnerAppQuickFix>;

pub struct QuickFixDataMgr {
    db_file: PathBuf,
    record_map: RwLock<RecordMap>,
}

impl QuickFixDataMgr {
    pub fn new<P: AsRef<Path>>(db_file: P) -> Result<Self> {
        let db_file = db_file.as_ref().to_path_buf();
        let record_map = match db_file.exists() {
            true => serde::deserialize_with_magic::<RecordMap, _, _>(&db_file, QUICK_FIX_DB_MAGIC)
                .with_context(|| format!("Failed to read {}", db_file.display()))?,
            false => RecordMap::new(),
        };
        for (bundle_name, record) in &record_map {
            debug!("Quick fix of '{}': {}", bundle_name, record.mark.status);
        }
        info!("Loaded {} quick fix record(s)", record_map.len());

        Ok(Self {
            db_file,
            record_map: RwLock::new(record_map),
        })
    }

    fn save(&self, record_map: &RecordMap) -> Result<()> {
        debug!("Writing {}...", self.db_file.display());
        serde::serialize_with_magic(record_map, &self.db_file, QUICK_FIX_DB_MAGIC)
            .with_context(|| format!("Failed to write {}", self.db_file.display()))
    }
}

impl QuickFixStore for QuickFixDataMgr {
    fn query_inner_app_quick_fix(&self, bundle_name: &str) -> Option<InnerAppQuickFix> {
        self.record_map.read().get(bundle_name).cloned()
    }

    fn save_inner_app_quick_fix(&self, record: &InnerAppQuickFix) -> Result<()> {
        let bundle_name = record.bundle_name().to_string();
        let mut record_map = self.record_map.write();

        let old_record = record_map.insert(bundle_name.clone(), record.clone());
        if let Err(e) = self.save(&record_map) {
            match old_record {
                Some(old_record) => record_map.insert(bundle_name, old_record),
                None => record_map.remove(&bundle_name),
            };
            return Err(e);
        }
        debug!("Quick fix of '{}' is {}", bundle_name, record.mark.status);

        Ok(())
    }

    fn delete_inner_app_quick_fix(&self, bundle_name: &str) -> Result<()> {
        let mut record_map = self.record_map.write();

        if let Some(old_record) = record_map.remove(bundle_name) {
            if let Err(e) = self.save(&record_map) {
                record_map.insert(bundle_name.to_string(), old_record);
                return Err(e);
            }
            debug!("Quick fix of '{}' is deleted", bundle_name);
        }

        Ok(())
    }
}

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

use log::{debug, error, warn};

use quickfix_abi::{InnerAppQuickFix, QuickFixStatus};

use super::{
    data_mgr::QuickFixStore,
    error::{Error, Result},
};

/// Persisted deployment state of a bundle when a transaction begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Absent,
    Started,
    Ended,
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DeployState::Absent => "ABSENT",
            DeployState::Started => "DEPLOY-START",
            DeployState::Ended => "DEPLOY-END",
        })
    }
}

/// Snapshot of the quick fix record of a bundle.
/// `abort` puts the snapshot back, or removes the record if there was none.
pub struct DeployTransaction<'a> {
    store: &'a dyn QuickFixStore,
    bundle_name: String,
    snapshot: Option<InnerAppQuickFix>,
}

impl<'a> DeployTransaction<'a> {
    pub fn begin(store: &'a dyn QuickFixStore, bundle_name: &str) -> Result<Self> {
        let snapshot = store.query_inner_app_quick_fix(bundle_name);
        if let Some(record) = &snapshot {
            let status = record.mark.status;
            if !status.is_deployable() {
                error!(
                    "Quick fix of '{}' is in status {}, cannot deploy",
                    bundle_name, status
                );
                return Err(Error::InvalidPatchStatus(status));
            }
        }

        let instance = Self {
            store,
            bundle_name: bundle_name.to_string(),
            snapshot,
        };
        debug!("{} began at {}", instance, instance.state());

        Ok(instance)
    }

    pub fn state(&self) -> DeployState {
        match self.snapshot.as_ref().map(|record| record.mark.status) {
            None => DeployState::Absent,
            Some(QuickFixStatus::DeployStart) => DeployState::Started,
            Some(_) => DeployState::Ended,
        }
    }

    pub fn snapshot(&self) -> Option<&InnerAppQuickFix> {
        self.snapshot.as_ref()
    }

    pub fn commit(self) {
        debug!("{} committed", self);
    }

    pub fn abort(self) -> Result<()> {
        warn!("{} rolling back to {}...", self, self.state());
        match &self.snapshot {
            Some(record) => self.store.save_inner_app_quick_fix(record).map_err(|e| {
                error!("{} rollback failed, {:?}", self, e);
                Error::SaveAppQuickFixFailed
            })?,
            None => self
                .store
                .delete_inner_app_quick_fix(&self.bundle_name)
                .map_err(|e| {
                    error!("{} rollback failed, {:?}", self, e);
                    Error::DeleteAppQuickFixFailed
                })?,
        }
        warn!("{} rolled back", self);

        Ok(())
    }
}

impl std::fmt::Display for DeployTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transaction deploy '{}'", self.bundle_name)
    }
}

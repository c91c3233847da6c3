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

use std::fmt;

use quickfix_abi::QuickFixStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /* Request */
    Param(String),

    /* Parse */
    ParseNoProfile(String),
    ParseUnexpected(String),
    ProfileParseFailed(String),
    BadProfile(String),
    MissingProp(String),
    PropTypeError(String),
    PropCheckError(String),
    ParseNativeSoFailed(String),

    /* Validation */
    BundleNameNotSame,
    VersionCodeNotSame,
    VersionNameNotSame,
    PatchVersionCodeNotSame,
    PatchVersionNameNotSame,
    PatchTypeNotSame,
    ModuleNameSame(String),
    ModuleNameNotExist(String),
    SoIncompatible,
    SignatureInfoNotSame,
    IncompatibleSignature,
    VersionCodeError,
    HotReloadAlreadyExisted,
    PatchAlreadyExisted,
    HotReloadNotSupportReleaseBundle,
    InvalidPatchStatus(QuickFixStatus),
    UnknownQuickFixType,
    BundleNameNotExist(String),

    /* Infrastructure */
    Internal(String),
    NotExistedBundleInfo(String),
    AddHqfFailed,
    SaveAppQuickFixFailed,
    DeleteAppQuickFixFailed,
    CreatePatchPathFailed(String),
    ExtractDiffFilesFailed(String),
    ApplyDiffPatchFailed(String),
    MovePatchFileFailed(String),
    QuickFixNotExist(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::Param(msg) => format!("Invalid parameter, {}", msg),
            Error::ParseNoProfile(path) => format!("Cannot find patch profile in {}", path),
            Error::ParseUnexpected(msg) => format!("Cannot open patch package, {}", msg),
            Error::ProfileParseFailed(path) => format!("Patch package {} has no module info", path),
            Error::BadProfile(msg) => format!("Malformed patch profile, {}", msg),
            Error::MissingProp(name) => format!("Patch profile misses property '{}'", name),
            Error::PropTypeError(name) => format!("Patch profile property '{}' has wrong type", name),
            Error::PropCheckError(name) => format!("Patch profile property '{}' is invalid", name),
            Error::ParseNativeSoFailed(msg) => format!("Cannot resolve native library, {}", msg),
            Error::BundleNameNotSame => "Bundle name is not same".to_string(),
            Error::VersionCodeNotSame => "Bundle version code is not same".to_string(),
            Error::VersionNameNotSame => "Bundle version name is not same".to_string(),
            Error::PatchVersionCodeNotSame => "Patch version code is not same".to_string(),
            Error::PatchVersionNameNotSame => "Patch version name is not same".to_string(),
            Error::PatchTypeNotSame => "Patch type is not same".to_string(),
            Error::ModuleNameSame(name) => format!("Module '{}' is patched more than once", name),
            Error::ModuleNameNotExist(name) => format!("Module '{}' is not installed", name),
            Error::SoIncompatible => "Native library is incompatible".to_string(),
            Error::SignatureInfoNotSame => "Signature info is not same".to_string(),
            Error::IncompatibleSignature => "Patch signature is incompatible".to_string(),
            Error::VersionCodeError => {
                "Patch version code is not greater than the existing one".to_string()
            }
            Error::HotReloadAlreadyExisted => "Hot reload is already deployed".to_string(),
            Error::PatchAlreadyExisted => "Patch is already deployed".to_string(),
            Error::HotReloadNotSupportReleaseBundle => {
                "Hot reload is not supported by release bundle".to_string()
            }
            Error::InvalidPatchStatus(status) => {
                format!("Cannot deploy quick fix in status {}", status)
            }
            Error::UnknownQuickFixType => "Unknown quick fix type".to_string(),
            Error::BundleNameNotExist(name) => format!("Bundle '{}' is not installed", name),
            Error::Internal(msg) => format!("Internal error, {}", msg),
            Error::NotExistedBundleInfo(name) => format!("Cannot find bundle info of '{}'", name),
            Error::AddHqfFailed => "Cannot merge module patch info".to_string(),
            Error::SaveAppQuickFixFailed => "Cannot save quick fix record".to_string(),
            Error::DeleteAppQuickFixFailed => "Cannot delete quick fix record".to_string(),
            Error::CreatePatchPathFailed(path) => format!("Cannot create patch directory {}", path),
            Error::ExtractDiffFilesFailed(path) => format!("Cannot extract diff files from {}", path),
            Error::ApplyDiffPatchFailed(path) => format!("Cannot apply diff patch to {}", path),
            Error::MovePatchFileFailed(path) => format!("Cannot move patch file {}", path),
            Error::QuickFixNotExist(name) => format!("Bundle '{}' has no quick fix", name),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Error::Param(_) => -1,
            Error::ParseNoProfile(_) => -101,
            Error::ParseUnexpected(_) => -102,
            Error::ProfileParseFailed(_) => -103,
            Error::BadProfile(_) => -104,
            Error::MissingProp(_) => -105,
            Error::PropTypeError(_) => -106,
            Error::PropCheckError(_) => -107,
            Error::ParseNativeSoFailed(_) => -108,
            Error::BundleNameNotSame => -201,
            Error::VersionCodeNotSame => -202,
            Error::VersionNameNotSame => -203,
            Error::PatchVersionCodeNotSame => -204,
            Error::PatchVersionNameNotSame => -205,
            Error::PatchTypeNotSame => -206,
            Error::ModuleNameSame(_) => -207,
            Error::ModuleNameNotExist(_) => -208,
            Error::SoIncompatible => -209,
            Error::SignatureInfoNotSame => -210,
            Error::IncompatibleSignature => -211,
            Error::VersionCodeError => -212,
            Error::HotReloadAlreadyExisted => -213,
            Error::PatchAlreadyExisted => -214,
            Error::HotReloadNotSupportReleaseBundle => -215,
            Error::InvalidPatchStatus(_) => -216,
            Error::UnknownQuickFixType => -217,
            Error::BundleNameNotExist(_) => -218,
            Error::Internal(_) => -301,
            Error::NotExistedBundleInfo(_) => -302,
            Error::AddHqfFailed => -303,
            Error::SaveAppQuickFixFailed => -304,
            Error::DeleteAppQuickFixFailed => -305,
            Error::CreatePatchPathFailed(_) => -306,
            Error::ExtractDiffFilesFailed(_) => -307,
            Error::ApplyDiffPatchFailed(_) => -308,
            Error::MovePatchFileFailed(_) => -309,
            Error::QuickFixNotExist(_) => -310,
        }
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Error {}

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
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{ensure, Context, Result};
use log::{debug, trace};

use quickfix_common::fs;

use super::extractor::{PatchExtractor, DIFF_FILE_SUFFIX};

const LIBS_DIR: &str = "libs";
const DIFF_FILE_EXT: &str = "diff";

/// File system operations of quick fix deployment
pub trait Installer: Send + Sync {
    fn create_bundle_dir(&self, dir: &Path) -> Result<()>;

    fn remove_dir(&self, dir: &Path) -> Result<()>;

    fn is_exist_dir(&self, dir: &Path) -> bool;

    /// Extracts `libs/<cpu_abi>/*.diff` of a package into `out_dir`
    fn extract_diff_files(&self, hqf_path: &Path, out_dir: &Path, cpu_abi: &str) -> Result<()>;

    /// Applies every diff file in `diff_dir` to the library of the same name in
    /// `old_so_dir`, the patched library is written into `new_so_dir`
    fn apply_diff_patch(&self, old_so_dir: &Path, diff_dir: &Path, new_so_dir: &Path)
        -> Result<()>;

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()>;
}

pub struct InstalldClient {
    patch_tool: PathBuf,
}

impl InstalldClient {
    pub fn new<P: AsRef<Path>>(patch_tool: P) -> Self {
        Self {
            patch_tool: patch_tool.as_ref().to_path_buf(),
        }
    }

    fn patch_library(&self, old_so: &Path, new_so: &Path, diff_file: &Path) -> Result<()> {
        trace_command(&self.patch_tool, &[old_so, new_so, diff_file]);

        let output = Command::new(&self.patch_tool)
            .arg(old_so)
            .arg(new_so)
            .arg(diff_file)
            .output()
            .with_context(|| format!("Failed to execute {}", self.patch_tool.display()))?;
        ensure!(
            output.status.success(),
            "Failed to patch {}, {}",
            old_so.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );

        Ok(())
    }
}

fn trace_command(program: &Path, args: &[&Path]) {
    let args = args
        .iter()
        .map(|arg| arg.display().to_string())
        .collect::<Vec<_>>();
    trace!("Executing {} {}", program.display(), args.join(" "));
}

impl Installer for InstalldClient {
    fn create_bundle_dir(&self, dir: &Path) -> Result<()> {
        debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn remove_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }
        debug!("Removing directory {}", dir.display());
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    fn is_exist_dir(&self, dir: &Path) -> bool {
        dir.is_dir()
    }

    fn extract_diff_files(&self, hqf_path: &Path, out_dir: &Path, cpu_abi: &str) -> Result<()> {
        fs::create_dir_all(out_dir)?;

        let lib_dir = format!("{}/{}", LIBS_DIR, cpu_abi);
        let file_list = PatchExtractor::open(hqf_path)?
            .extract_files(&lib_dir, DIFF_FILE_SUFFIX, out_dir)
            .with_context(|| format!("Failed to extract {}", lib_dir))?;
        debug!(
            "Extracted {} diff file(s) from {}",
            file_list.len(),
            hqf_path.display()
        );

        Ok(())
    }

    fn apply_diff_patch(
        &self,
        old_so_dir: &Path,
        diff_dir: &Path,
        new_so_dir: &Path,
    ) -> Result<()> {
        fs::create_dir_all(new_so_dir)?;

        let diff_files =
            fs::list_files_by_ext(diff_dir, DIFF_FILE_EXT, fs::TraverseOptions { recursive: false })?;
        for diff_file in diff_files {
            let so_name = diff_file.file_stem().unwrap_or_else(|| OsStr::new(""));
            let old_so = old_so_dir.join(so_name);
            let new_so = new_so_dir.join(so_name);
            ensure!(
                old_so.is_file(),
                "Cannot find library {}",
                old_so.display()
            );

            debug!("Patching {} to {}", old_so.display(), new_so.display());
            self.patch_library(&old_so, &new_so, &diff_file)?;
        }

        Ok(())
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        debug!("Moving {} to {}", src.display(), dst.display());
        fs::move_file(src, dst)?;
        Ok(())
    }
}

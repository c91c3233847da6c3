// SPDX-License-Identifier: Mulan PSL v2
/*
 * Copyright (c) 2024 Huawei Technologies Co., Ltd.
 * quickfix-common is licensed under Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *         http://license.coscl.org.cn/MulanPSL2
 *
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND,
 * EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT,
 * MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::path::Path;

use nix::errno::Errno;
use sha2::{Digest, Sha256};

use crate::fs;

pub fn bytes<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Sha256 of a regular file
pub fn file<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
    let file_path = path.as_ref();
    if !file_path.is_file() {
        return Err(std::io::Error::from(Errno::EINVAL));
    }
    Ok(self::bytes(fs::read(file_path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_bytes() {
        assert_eq!(self::bytes(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_file() -> std::io::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file_path = temp_dir.path().join("entry.hqf");
        fs::write(&file_path, b"hello")?;

        assert_eq!(self::file(&file_path)?, HELLO_SHA256);
        Ok(())
    }

    #[test]
    fn test_file_is_dir() -> std::io::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let result = self::file(temp_dir.path());

        assert!(result.is_err());
        if let Err(e) = &result {
            assert_eq!(e.kind(), std::io::ErrorKind::InvalidInput);
        }
        Ok(())
    }
}

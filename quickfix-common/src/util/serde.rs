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

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_cbor::{de, ser};

use crate::fs;

use super::digest;

const DEFAULT_PACK_MAGIC: &str = "515549434B464958"; // QUICKFIX

#[derive(Serialize, Deserialize)]
struct PackedData {
    magic: String,
    payload: Vec<u8>,
    checksum: String,
}

fn invalid_data<S: Into<String>>(msg: S) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into())
}

impl PackedData {
    fn pack<T: Serialize>(magic: &str, obj: &T) -> std::io::Result<Self> {
        let payload = serde_cbor::to_vec(obj).map_err(|e| {
            debug!("Packing data failed, {}", e);
            invalid_data("Packing data failed")
        })?;
        let checksum = digest::bytes(&payload);

        Ok(Self {
            magic: magic.to_owned(),
            payload,
            checksum,
        })
    }

    fn unpack<T: DeserializeOwned>(&self, magic: &str) -> std::io::Result<T> {
        if self.magic != magic {
            return Err(invalid_data("Data magic check failed"));
        }
        if self.checksum != digest::bytes(&self.payload) {
            return Err(invalid_data("Data checksum failed"));
        }

        de::from_slice(&self.payload).map_err(|e| {
            debug!("Unpacking data failed, {}", e);
            invalid_data("Unpacking data failed")
        })
    }

    fn read_from(path: &Path) -> std::io::Result<Self> {
        de::from_reader::<Self, _>(fs::open_file(path)?).map_err(|e| {
            debug!("Deserialize packed data failed, {}", e);
            invalid_data(format!("Invalid data format of {}", path.display()))
        })
    }

    /// Writes to a sibling file first, then renames it over the target
    fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut temp_path = path.as_os_str().to_os_string();
        temp_path.push(".tmp");

        ser::to_writer(&mut fs::create_file(&temp_path)?, &self).map_err(|e| {
            debug!("Serialize packed data failed, {}", e);
            invalid_data(format!("Write data to {} failed", path.display()))
        })?;
        fs::rename(&temp_path, path)
    }
}

pub fn serialize_with_magic<T, P, S>(obj: &T, path: P, magic: S) -> std::io::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
    S: AsRef<str>,
{
    PackedData::pack(magic.as_ref(), obj)?.write_to(path.as_ref())
}

pub fn deserialize_with_magic<T, P, S>(path: P, magic: S) -> std::io::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
    S: AsRef<str>,
{
    PackedData::read_from(path.as_ref())?.unpack(magic.as_ref())
}

#[inline]
pub fn serialize<T, P>(obj: &T, path: P) -> std::io::Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    self::serialize_with_magic(obj, path, DEFAULT_PACK_MAGIC)
}

#[inline]
pub fn deserialize<T, P>(path: P) -> std::io::Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    self::deserialize_with_magic(path, DEFAULT_PACK_MAGIC)
}

// SPDX-License-Identifier: Mulan PSL v2
/*
 * Copyright (c) 2024 Huawei Technologies Co., Ltd.
 * quickfix is licensed under Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *         http://license.coscl.org.cn/MulanPSL2
 *
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND,
 * EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT,
 * MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use anyhow::{Context, Result};
use flexi_logger::{LogSpecification, Logger, WriteMode};
use log::{debug, LevelFilter};
use nix::sys::stat::{umask, Mode};

mod args;
mod rpc;

use self::{
    args::{Arguments, SubCommand},
    rpc::{QuickFixProxy, RpcClient},
};

pub const CLI_NAME: &str = env!("CARGO_PKG_NAME");
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");
pub const CLI_UMASK: u32 = 0o022;

fn main() -> Result<()> {
    // Parse arguments
    let args = Arguments::new()?;

    // Set up environments
    umask(Mode::from_bits_truncate(CLI_UMASK));

    // Initialize logger
    let max_log_level = if args.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    let log_spec = LogSpecification::builder().default(max_log_level).build();
    let _ = Logger::with(log_spec)
        .log_to_stdout()
        .format(|w, _, record| write!(w, "{}", record.args()))
        .write_mode(WriteMode::Direct)
        .start()
        .context("Failed to initialize logger")?;

    debug!("Start with {:#?}", args);

    debug!("Initializing rpc client...");
    let client = RpcClient::new(&args.work_dir).context("Failed to initialize rpc client")?;
    let proxy = QuickFixProxy::new(&client);

    debug!("Invoking rpc call...");
    match &args.subcommand {
        SubCommand::Deploy { file_paths } => {
            proxy.deploy_quick_fixes(file_paths)?;
        }
        SubCommand::Info { bundle_names } => {
            proxy.show_quick_fix_info(bundle_names)?;
        }
        SubCommand::Status { bundle_names } => {
            proxy.show_quick_fix_status(bundle_names)?;
        }
    }

    Ok(())
}

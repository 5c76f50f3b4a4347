/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "trust_cli")]
#[command(about = "Flavor based host trust verification", version = "0.1.0")]
pub struct Cli {
    /// Verifier configuration file
    #[arg(short, long, default_value = "trust_cli.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify one host manifest against a set of flavors
    Verify {
        /// Host manifest JSON file
        #[arg(short, long)]
        manifest: PathBuf,

        /// Signed flavor JSON file, a single flavor or an array
        #[arg(short, long)]
        flavors: PathBuf,

        /// Do not verify flavor signatures
        #[arg(long)]
        skip_signature: bool,
    },

    /// Verify several host manifests concurrently against the same flavors
    VerifyHosts {
        /// Host manifest JSON files
        #[arg(short, long, required = true, num_args = 1..)]
        manifests: Vec<PathBuf>,

        /// Signed flavor JSON file, a single flavor or an array
        #[arg(short, long)]
        flavors: PathBuf,
    },
}

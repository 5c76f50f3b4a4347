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

use std::process::exit;

use clap::Parser;
use trust_cli::commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match trust_cli::execute(cli).await {
        Ok((output, trusted)) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Failed to render report: {}", e);
                    exit(2);
                },
            }
            if !trusted {
                log::warn!("At least one host is untrusted");
                exit(1);
            }
        },
        Err(e) => {
            log::error!("Failed to handle command, error: {}", e);
            eprintln!("{}", e);
            exit(2);
        },
    }
}

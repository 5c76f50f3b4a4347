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

pub mod config;
pub mod logger;

use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;

pub use crate::config::{LogConfig, LoggerConfig};
// Re-export log macros for convenient use in other modules
pub use log::{debug, error, info, trace, warn};

static LOGGER: OnceLock<logger::Logger> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log config error: {0}")]
    ConfigError(String),
    #[error("Log io error: {0}")]
    IoError(String),
    #[error("Log init error: {0}")]
    InitError(String),
}

/// Initialize logging system
///
/// # Arguments
/// * `config_path` - Path to the logging configuration file
///
/// # Example
/// ```no_run
/// common_log::init_with_yaml("logging.yaml").expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init_with_yaml(config_path: impl Into<PathBuf>) -> Result<(), LogError> {
    ensure_uninitialized()?;
    install(logger::Logger::new_from_yaml(config_path)?)
}

/// Initialize logging system with config
///
/// # Example
/// ```no_run
/// use common_log::{init_with_config, LogConfig};
///
/// init_with_config(LogConfig::root_only("trust-cli.log", "info")).expect("Failed to initialize logger");
/// log::info!("Logger initialized");
/// ```
pub fn init_with_config(config: LogConfig) -> Result<(), LogError> {
    ensure_uninitialized()?;
    install(logger::Logger::new_from_config(config)?)
}

fn ensure_uninitialized() -> Result<(), LogError> {
    if LOGGER.get().is_some() {
        return Err(LogError::InitError("Logger already initialized".to_string()));
    }
    Ok(())
}

fn install(logger: logger::Logger) -> Result<(), LogError> {
    LOGGER.set(logger).map_err(|_| LogError::InitError("Logger already initialized".to_string()))
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

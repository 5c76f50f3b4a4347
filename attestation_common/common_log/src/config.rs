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

use serde::{Deserialize, Serialize};

use crate::LogError;

/// Logger name every module falls back to
pub const ROOT_LOGGER: &str = "root";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    pub loggers: Vec<LoggerConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggerConfig {
    /// Module path prefix, `root` for the root logger
    pub path_prefix: String,
    pub log_directory: String,
    pub log_file_name: String,
    pub max_file_size: u64,
    pub max_zip_count: u32,
    pub level: String,
}

impl LogConfig {
    pub fn from_yaml(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path)
            .map_err(|e| LogError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: LogConfig = serde_yaml::from_str(&config_str)
            .map_err(|e| LogError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Single root logger writing `file_name` under `logs/`
    pub fn root_only(file_name: &str, level: &str) -> Self {
        Self {
            loggers: vec![LoggerConfig {
                path_prefix: ROOT_LOGGER.to_string(),
                log_directory: "logs".to_string(),
                log_file_name: file_name.to_string(),
                max_file_size: 10 * 1024 * 1024,
                max_zip_count: 6,
                level: level.to_string(),
            }],
        }
    }

    pub fn get_logger_config(&self, path_prefix: &str) -> Option<&LoggerConfig> {
        self.loggers.iter().find(|l| path_prefix.starts_with(&l.path_prefix))
    }

    pub fn get_root_config(&self) -> Option<&LoggerConfig> {
        self.loggers.iter().find(|l| l.path_prefix == ROOT_LOGGER)
    }
}

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

use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::LevelFilter;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::{
    append::rolling_file::RollingFileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config, Handle,
};

use crate::config::{LogConfig, LoggerConfig, ROOT_LOGGER};
use crate::LogError;

/// Environment variable naming the directory log directories are created in
pub const LOG_OUTPUT_DIR: &str = "LOG_OUTPUT_DIR";

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S:%3f)} {l} [{M}:{L}] - {m}{n}";

pub struct Logger {
    _handle: Handle,
}

impl Logger {
    /// Installs `config` as the global log4rs configuration
    pub fn new_from_config(config: LogConfig) -> Result<Self, LogError> {
        let log4rs_config = Self::build_config(&config, &output_dir())?;
        let handle = log4rs::init_config(log4rs_config).map_err(|e| LogError::InitError(e.to_string()))?;
        Ok(Self { _handle: handle })
    }

    pub fn new_from_yaml(config_path: impl Into<PathBuf>) -> Result<Self, LogError> {
        Self::new_from_config(LogConfig::from_yaml(config_path)?)
    }

    /// Translates `config` into a log4rs configuration writing below `output_dir`
    ///
    /// One rolling file appender per logger; the root logger defaults to
    /// `info` without an appender when no `root` entry is configured.
    pub fn build_config(config: &LogConfig, output_dir: &Path) -> Result<Config, LogError> {
        let mut builder = Config::builder();

        for logger_config in &config.loggers {
            let appender_name = format!("{}_appender", logger_config.path_prefix);
            let appender = Self::create_appender(logger_config, output_dir)?;
            builder = builder.appender(Appender::builder().build(&appender_name, Box::new(appender)));

            if logger_config.path_prefix != ROOT_LOGGER {
                let logger = log4rs::config::Logger::builder()
                    .appender(appender_name)
                    .additive(false)
                    .build(logger_config.path_prefix.clone(), parse_level(&logger_config.level));
                builder = builder.logger(logger);
            }
        }

        let root = match config.get_root_config() {
            Some(root_config) => Root::builder()
                .appender(format!("{}_appender", ROOT_LOGGER))
                .build(parse_level(&root_config.level)),
            None => Root::builder().build(LevelFilter::Info),
        };
        builder.build(root).map_err(|e| LogError::ConfigError(e.to_string()))
    }

    fn create_appender(config: &LoggerConfig, output_dir: &Path) -> Result<RollingFileAppender, LogError> {
        let log_directory = output_dir.join(&config.log_directory);
        std::fs::create_dir_all(&log_directory).map_err(|e| {
            LogError::IoError(format!("Failed to create log directory {}: {}", log_directory.display(), e))
        })?;

        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y%m%d%H%M%S%3f").to_string();

        let log_file = log_directory.join(&config.log_file_name);
        let archived_log_pattern =
            format!("{}/{}-{{}}-{}.gz", log_directory.display(), config.log_file_name, formatted_time);

        let size_trigger = SizeTrigger::new(config.max_file_size);
        let roller = FixedWindowRoller::builder()
            .build(&archived_log_pattern, config.max_zip_count)
            .map_err(|e| LogError::ConfigError(format!("Invalid archive pattern: {}", e)))?;
        let compound_policy = CompoundPolicy::new(Box::new(size_trigger), Box::new(roller));

        RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(log_file, Box::new(compound_policy))
            .map_err(|e| LogError::IoError(format!("Failed to open log file: {}", e)))
    }
}

/// Directory from `LOG_OUTPUT_DIR` (a `.env` file is honoured), else the
/// current directory
pub fn output_dir() -> PathBuf {
    let _ = dotenv::dotenv();
    env::var(LOG_OUTPUT_DIR).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

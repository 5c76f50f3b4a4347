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
use std::io::Write;

use common_log::config::LogConfig;
use common_log::logger::{output_dir, parse_level, Logger, LOG_OUTPUT_DIR};
use log::LevelFilter;
use serial_test::serial;
use tempfile::{tempdir, NamedTempFile};

const LOGGING_YAML: &str = r#"
loggers:
  - path_prefix: root
    log_directory: logs
    log_file_name: root.log
    max_file_size: 10485760
    max_zip_count: 6
    level: info
  - path_prefix: flavor_rule_verifier
    log_directory: logs/verifier
    log_file_name: verifier.log
    max_file_size: 10485760
    max_zip_count: 3
    level: debug
"#;

fn write_yaml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_from_yaml() {
    let file = write_yaml(LOGGING_YAML);

    let config = LogConfig::from_yaml(file.path()).unwrap();

    assert_eq!(config.loggers.len(), 2);
    assert_eq!(config.get_root_config().unwrap().log_file_name, "root.log");
    assert_eq!(
        config.get_logger_config("flavor_rule_verifier::rules").unwrap().level,
        "debug"
    );
}

#[test]
fn test_logger_from_missing_yaml_fails_before_init() {
    let dir = tempdir().unwrap();

    let result = Logger::new_from_yaml(dir.path().join("absent.yaml"));

    assert!(matches!(result, Err(common_log::LogError::ConfigError(_))));
}

#[test]
#[serial]
fn test_init_with_missing_yaml_fails() {
    let dir = tempdir().unwrap();

    let result = common_log::init_with_yaml(dir.path().join("absent.yaml"));

    assert!(result.is_err());
}

#[test]
fn test_reject_malformed_yaml() {
    let file = write_yaml("loggers: [");

    assert!(LogConfig::from_yaml(file.path()).is_err());
}

#[test]
fn test_build_config_creates_log_directories() {
    // Arrange
    let output = tempdir().unwrap();
    let file = write_yaml(LOGGING_YAML);
    let config = LogConfig::from_yaml(file.path()).unwrap();

    // Act
    let log4rs_config = Logger::build_config(&config, output.path()).unwrap();

    // Assert
    assert!(output.path().join("logs").is_dir());
    assert!(output.path().join("logs/verifier").is_dir());
    assert_eq!(log4rs_config.appenders().len(), 2);
    assert_eq!(log4rs_config.loggers().len(), 1);
    assert_eq!(log4rs_config.root().level(), LevelFilter::Info);
}

#[test]
fn test_build_config_without_root_logger() {
    let output = tempdir().unwrap();
    let mut config = LogConfig::root_only("cli.log", "warn");
    config.loggers[0].path_prefix = "trust_cli".to_string();

    let log4rs_config = Logger::build_config(&config, output.path()).unwrap();

    assert!(log4rs_config.root().appenders().is_empty());
    assert_eq!(log4rs_config.loggers()[0].level(), LevelFilter::Warn);
}

#[test]
fn test_parse_level_defaults_to_info() {
    assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
    assert_eq!(parse_level("off"), LevelFilter::Off);
    assert_eq!(parse_level("verbose"), LevelFilter::Info);
}

#[test]
#[serial]
fn test_output_dir_from_environment() {
    let output = tempdir().unwrap();
    env::set_var(LOG_OUTPUT_DIR, output.path());

    assert_eq!(output_dir(), output.path());

    env::remove_var(LOG_OUTPUT_DIR);
}

#[test]
#[serial]
fn test_init_only_once() {
    let output = tempdir().unwrap();
    env::set_var(LOG_OUTPUT_DIR, output.path());

    common_log::init_with_config(LogConfig::root_only("test.log", "info")).unwrap();
    let second = common_log::init_with_config(LogConfig::root_only("test.log", "info"));

    assert!(common_log::is_initialized());
    assert!(second.is_err());
    assert!(output.path().join("logs/test.log").exists());
    env::remove_var(LOG_OUTPUT_DIR);
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration management for nanoqt.

use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "nanoqt.toml";

/// Environment variable appending to the default module path.
pub const PATH_ENV: &str = "NANOQT_PATH";

/// Environment variable overriding the log level.
pub const LOG_ENV: &str = "NANOQT_LOG";

/// Configuration for nanoqt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global default module path, searched after every `nanoqt_modules`
    pub module_path: Vec<PathBuf>,

    /// Directory top-level code resolves relative specifiers against
    pub entry_dir: Option<PathBuf>,

    /// Log level or `tracing` filter directive
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_path: Vec::new(),
            entry_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Later sources override earlier ones; module paths accumulate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Load from user config file
        if let Some(user_config_path) = user_config_path() {
            if user_config_path.is_file() {
                config.merge_from_file(&user_config_path)?;
            }
        }

        // Load from project config file
        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.is_file() {
            config.merge_from_file(&project_config)?;
        }

        // Load from environment variables
        config.merge_env(std::env::vars_os());

        Ok(config)
    }

    /// Parse a configuration file on its own.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        parse(path, &content)
    }

    /// Merge configuration from a file.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = read(path)?;
        let layer: ConfigLayer = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply(layer);
        Ok(())
    }

    /// Merge `NANOQT_PATH` and `NANOQT_LOG` from the given variables.
    pub fn merge_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        for (key, value) in vars {
            if key == PATH_ENV {
                self.module_path
                    .extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
            } else if key == LOG_ENV {
                if let Some(level) = value.to_str() {
                    self.log_level = level.to_string();
                }
            }
        }
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(paths) = layer.module_path {
            self.module_path.extend(paths);
        }
        if let Some(entry_dir) = layer.entry_dir {
            self.entry_dir = Some(entry_dir);
        }
        if let Some(log_level) = layer.log_level {
            self.log_level = log_level;
        }
    }
}

/// A configuration file, where absent keys leave earlier values alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigLayer {
    module_path: Option<Vec<PathBuf>>,
    entry_dir: Option<PathBuf>,
    log_level: Option<String>,
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Get the user config path.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nanoqt").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
        pairs
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.module_path.is_empty());
        assert_eq!(config.entry_dir, None);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_merge_layers_append_paths() {
        let user = write_config("module_path = [\"/usr/share/nanoqt\"]\nlog_level = \"info\"\n");
        let project = write_config("module_path = [\"./lib\"]\nentry_dir = \"/proj\"\n");

        let mut config = Config::default();
        config.merge_from_file(user.path()).unwrap();
        config.merge_from_file(project.path()).unwrap();

        assert_eq!(
            config.module_path,
            vec![PathBuf::from("/usr/share/nanoqt"), PathBuf::from("./lib")]
        );
        assert_eq!(config.entry_dir, Some(PathBuf::from("/proj")));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let joined = std::env::join_paths(["/a", "/b"]).unwrap();
        let mut vars = env(&[("NANOQT_LOG", "debug"), ("UNRELATED", "x")]);
        vars.push((OsString::from(PATH_ENV), joined));

        let mut config = Config {
            module_path: vec![PathBuf::from("/first")],
            ..Config::default()
        };
        config.merge_env(vars);

        assert_eq!(
            config.module_path,
            vec![PathBuf::from("/first"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let file = write_config("module_path = 3\n");
        let error = Config::default().merge_from_file(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));

        let unknown = write_config("modules = []\n");
        assert!(Config::default().merge_from_file(unknown.path()).is_err());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let file = write_config("entry_dir = \"/e\"\n");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.entry_dir, Some(PathBuf::from("/e")));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_file() {
        let error = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}

//! Workspace settings, optionally loaded from a YAML file.
//!
//! ```yaml
//! page_size: 100
//! page_size_options: [50, 100, 500]
//! chart_group_limit: 20
//! max_rows: 50000
//! history_limit: 200
//! encoding: utf-8
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use std::{fs, path::Path};

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::{chart::DEFAULT_GROUP_LIMIT, error::ConfigError, pagination::DEFAULT_PAGE_SIZE};

pub const DEFAULT_MAX_ROWS: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub chart_group_limit: usize,
    pub max_rows: usize,
    pub history_limit: Option<usize>,
    pub encoding: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![50, 100, 500],
            chart_group_limit: DEFAULT_GROUP_LIMIT,
            max_rows: DEFAULT_MAX_ROWS,
            history_limit: None,
            encoding: "utf-8".to_string(),
        }
    }
}

impl WorkspaceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.page_size_options.is_empty() && !self.page_size_options.contains(&self.page_size) {
            return Err(ConfigError::PageSizeNotOffered(
                self.page_size,
                self.page_size_options.clone(),
            ));
        }
        if self.chart_group_limit == 0 {
            return Err(ConfigError::ZeroChartLimit);
        }
        self.resolve_encoding()?;
        Ok(())
    }

    pub fn resolve_encoding(&self) -> Result<&'static Encoding, ConfigError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = WorkspaceConfig::from_yaml("page_size: 100\n").unwrap();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.chart_group_limit, 20);
        assert_eq!(config.max_rows, 50_000);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn rejects_page_size_outside_options() {
        let err = WorkspaceConfig::from_yaml("page_size: 75\n").unwrap_err();
        assert!(matches!(err, ConfigError::PageSizeNotOffered(75, _)));
        let ok = WorkspaceConfig::from_yaml("page_size: 75\npage_size_options: []\n").unwrap();
        assert_eq!(ok.page_size, 75);
    }

    #[test]
    fn rejects_zero_values_and_unknown_encoding() {
        assert!(matches!(
            WorkspaceConfig::from_yaml("page_size: 0\n"),
            Err(ConfigError::ZeroPageSize)
        ));
        assert!(matches!(
            WorkspaceConfig::from_yaml("chart_group_limit: 0\n"),
            Err(ConfigError::ZeroChartLimit)
        ));
        assert!(matches!(
            WorkspaceConfig::from_yaml("encoding: klingon\n"),
            Err(ConfigError::UnknownEncoding(_))
        ));
        assert!(WorkspaceConfig::from_yaml("bogus: 1\n").is_err());
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = WorkspaceConfig {
            history_limit: Some(10),
            encoding: "windows-1252".into(),
            ..WorkspaceConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(WorkspaceConfig::from_yaml(&yaml).unwrap(), config);
    }
}

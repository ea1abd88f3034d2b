use crate::filter::{DEFAULT_FUNCTIONS, DisplayFilter, FunctionTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unknown function '{name}' in [filter] functions")]
    UnknownFunction { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfqlConfig {
    pub filter: FilterRules,
    pub shell: ShellRules,
    pub table: TableRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Allow-list of field paths; empty leaves fields unrestricted.
    pub field_names: Vec<String>,
    /// Builtin functions usable in filters. An empty list disables functions.
    pub functions: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            field_names: Vec::new(),
            functions: DEFAULT_FUNCTIONS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellRules {
    pub prompt: String,
    pub intro: String,
}

impl Default for ShellRules {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            intro: "Type help or ? to list commands.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRules {
    /// List nested maps as dotted leaf paths in `fields`.
    pub nested_fields: bool,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            nested_fields: true,
        }
    }
}

impl DfqlConfig {
    pub fn function_table(&self) -> Result<FunctionTable, ConfigError> {
        FunctionTable::builtins(&self.filter.functions)
            .map_err(|name| ConfigError::UnknownFunction { name })
    }

    pub fn field_names(&self) -> Option<&[String]> {
        if self.filter.field_names.is_empty() {
            None
        } else {
            Some(self.filter.field_names.as_slice())
        }
    }

    /// Build a display filter from the `[filter]` section.
    pub fn display_filter(&self) -> Result<DisplayFilter, ConfigError> {
        let filter = DisplayFilter::new().with_functions(self.function_table()?);
        Ok(match self.field_names() {
            Some(names) => filter.with_field_names(names.iter().cloned()),
            None => filter,
        })
    }
}

pub fn load_config(path: Option<&Path>) -> Result<DfqlConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<DfqlConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    let config = toml::from_str::<DfqlConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })?;
    config.function_table()?;
    Ok(config)
}

pub fn default_config() -> &'static DfqlConfig {
    static DEFAULT_CONFIG: LazyLock<DfqlConfig> = LazyLock::new(DfqlConfig::default);
    &DEFAULT_CONFIG
}

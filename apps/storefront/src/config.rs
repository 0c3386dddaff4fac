use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use table_core::{PagingMode, DEFAULT_PAGE_SIZE};
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid api url '{value}': {source}")]
    InvalidApiUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("page size must be a positive integer, got '{0}'")]
    InvalidPageSize(String),
    #[error("{0}")]
    InvalidPagingMode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub page_size: usize,
    pub paging: PagingMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".into(),
            token: None,
            token_file: None,
            page_size: DEFAULT_PAGE_SIZE,
            paging: PagingMode::Client,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    page_size: Option<usize>,
    paging: Option<PagingMode>,
}

impl Settings {
    pub fn api_base(&self) -> Result<Url, SettingsError> {
        Url::parse(&self.api_url).map_err(|source| SettingsError::InvalidApiUrl {
            value: self.api_url.clone(),
            source,
        })
    }

    /// Inline token wins over the token file.
    pub fn read_token(&self) -> Result<Option<String>, SettingsError> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        fs::read_to_string(path)
            .map(|raw| Some(raw.trim().to_string()))
            .map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })
    }
}

/// Defaults, then the settings file, then the environment.
///
/// Without an explicit path, `storefront.toml` is read only when it exists.
/// An explicit path must be readable.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let file = match path {
        Some(path) => Some(path),
        None => Some(Path::new(DEFAULT_CONFIG_FILE)).filter(|default| default.exists()),
    };
    if let Some(path) = file {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_cfg: FileSettings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.token {
        settings.token = Some(v);
    }
    if let Some(v) = file_cfg.token_file {
        settings.token_file = Some(v);
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.paging {
        settings.paging = v;
    }
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    if let Some(v) = var("STOREFRONT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("STOREFRONT_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN_FILE") {
        settings.token_file = Some(PathBuf::from(v));
    }

    if let Some(v) = var("APP__PAGE_SIZE") {
        settings.page_size = match v.trim().parse::<usize>() {
            Ok(size) if size > 0 => size,
            _ => return Err(SettingsError::InvalidPageSize(v)),
        };
    }

    if let Some(v) = var("APP__PAGING_MODE") {
        settings.paging = v.parse().map_err(SettingsError::InvalidPagingMode)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

use crate::error::{BurndownError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "gitlab-burndown";

/// Persisted tool configuration, stored by confy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub project_id: Option<u64>,
    pub project_path: Option<String>,
    pub access_token: Option<String>,
    pub per_page: u32,
    pub timeout_secs: u64,
}

impl ::std::default::Default for Config {
    fn default() -> Self {
        Self {
            host: String::from(""),
            project_id: None,
            project_path: None,
            access_token: None,
            per_page: 100,
            timeout_secs: 30,
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub project_id: Option<u64>,
    pub project_path: Option<String>,
    pub access_token: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.project_id.is_none()
            && self.project_path.is_none()
            && self.access_token.is_none()
    }
}

/// How the project is addressed in API URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(u64),
    Path(String),
}

impl ProjectRef {
    /// Path segment for `/projects/:id`; the url crate escapes `/` in paths.
    pub fn as_segment(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Path(path) => path.clone(),
        }
    }
}

/// Validated configuration handed to the client.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: Url,
    pub project: ProjectRef,
    pub access_token: Option<String>,
    pub per_page: u32,
    pub timeout: Duration,
}

impl Config {
    /// Loads the config from `path`, or from the platform default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let loaded = match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, None),
        };
        loaded.map_err(|err| BurndownError::Configuration(err.to_string()))
    }

    /// Writes the config back to `path`, or to the platform default location.
    pub fn store(&self, path: Option<&Path>) -> Result<()> {
        let stored = match path {
            Some(path) => confy::store_path(path, self),
            None => confy::store(APP_NAME, None, self),
        };
        stored.map_err(|err| BurndownError::Configuration(err.to_string()))
    }

    pub fn file_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => confy::get_configuration_file_path(APP_NAME, None)
                .map_err(|err| BurndownError::Configuration(err.to_string())),
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.host.filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(id) = overrides.project_id {
            self.project_id = Some(id);
        }
        if let Some(path) = overrides.project_path.filter(|p| !p.is_empty()) {
            self.project_path = Some(path);
        }
        if let Some(token) = overrides.access_token.filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
    }

    /// Checks that a host and a project are known. A numeric id wins over a
    /// path when both are set.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        if self.host.is_empty() {
            return Err(BurndownError::Configuration(
                "no GitLab host set, use --host or the config file".into(),
            ));
        }
        let host = Url::parse(&self.host).map_err(|err| {
            BurndownError::Configuration(format!("invalid host {:?}: {err}", self.host))
        })?;

        let project = match (self.project_id, self.project_path.as_deref()) {
            (Some(id), _) => ProjectRef::Id(id),
            (None, Some(path)) if !path.is_empty() => ProjectRef::Path(path.to_string()),
            _ => {
                return Err(BurndownError::Configuration(
                    "no project set, use --project-id or --project-path".into(),
                ))
            }
        };

        if self.per_page == 0 {
            return Err(BurndownError::Configuration("per_page must be positive".into()));
        }

        Ok(ResolvedConfig {
            host,
            project,
            access_token: self.access_token.clone().filter(|t| !t.is_empty()),
            per_page: self.per_page,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

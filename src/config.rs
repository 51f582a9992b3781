use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::PreconditionMissing;
use crate::paths::expand_tilde;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub service: ServiceConfig,
    pub proxy: ProxyConfig,
    pub frontend: FrontendConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project directory for the launcher. Setup uses the current directory.
    pub project_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub manifest: PathBuf,
    pub entry_file: String,
    pub app_object: String,
    pub host: String,
    pub port: u16,
    pub default_packages: Vec<String>,
    pub max_search_depth: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("/home/backend"),
            venv_dir: PathBuf::from("venv"),
            manifest: PathBuf::from("requirements.txt"),
            entry_file: "main.py".to_string(),
            app_object: "app".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_packages: ["fastapi", "uvicorn[standard]", "sqlalchemy", "passlib[bcrypt]"]
                .map(String::from)
                .to_vec(),
            max_search_depth: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub description: String,
    pub unit_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "fastapi-backend".to_string(),
            description: "FastAPI Backend Service".to_string(),
            unit_dir: PathBuf::from("/etc/systemd/system"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub site_name: String,
    pub listen_port: u16,
    pub sites_available: PathBuf,
    pub sites_enabled: PathBuf,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            site_name: "fastapi-frontend".to_string(),
            listen_port: 80,
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub dir: PathBuf,
    pub build_dir: PathBuf,
    pub node_setup_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("frontend"),
            build_dir: PathBuf::from("dist"),
            node_setup_url: "https://deb.nodesource.com/setup_18.x".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Prefix for privileged commands. Empty runs them unprivileged.
    pub privilege_command: String,
    pub packages: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            privilege_command: "sudo".to_string(),
            packages: ["python3", "python3-pip", "python3-venv"]
                .map(String::from)
                .to_vec(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "stackup")
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Loads `explicit` if given (it must exist), else the default path if it
/// exists, else built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(PreconditionMissing {
                    what: "config file",
                    path: path.to_path_buf(),
                }
                .into());
            }
            load_config(path)
        }
        None => {
            let path = default_config_path()?;
            if path.exists() {
                load_config(&path)
            } else {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Config::default())
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(contents).context("failed to parse config TOML")?;

    config.backend.project_dir =
        expand_tilde(config.backend.project_dir.to_str().unwrap_or_default());

    if config.backend.port == 0 {
        bail!("backend.port must be non-zero");
    }
    if config.proxy.listen_port == 0 {
        bail!("proxy.listen_port must be non-zero");
    }
    let stem = config.backend.entry_file.strip_suffix(".py").unwrap_or("");
    if stem.is_empty() || stem.contains('/') {
        bail!(
            "backend.entry_file must be a file name ending in .py (got {:?})",
            config.backend.entry_file
        );
    }
    if config.backend.app_object.trim().is_empty() {
        bail!("backend.app_object must not be empty");
    }
    if config.service.name.trim().is_empty() {
        bail!("service.name must not be empty");
    }

    Ok(config)
}

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SHARE_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api_base_url: Option<String>,
    share_base_url: Option<String>,
    qr_share: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub api_base_url: ConfigValue<String>,
    pub share_base_url: ConfigValue<String>,
    pub qr_share: ConfigValue<bool>,
}

impl Config {
    /// Priority: environment > `config.json` > defaults.
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "larder").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_file = proj_dirs.config_dir().join("config.json");
        Self::resolve(data_dir, config_file, |key| std::env::var(key).ok())
    }

    pub(crate) fn resolve(
        data_dir: PathBuf,
        config_file: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = read_config_file(&config_file)?;

        let api_base_url = pick(
            env("LARDER_API_URL"),
            file.api_base_url,
            DEFAULT_API_URL.to_string(),
        );
        validate_url("api_base_url", &api_base_url.value)?;

        let share_base_url = pick(
            env("LARDER_SHARE_URL"),
            file.share_base_url,
            DEFAULT_SHARE_URL.to_string(),
        );
        validate_url("share_base_url", &share_base_url.value)?;

        let qr_env = env("LARDER_QR_SHARE")
            .map(|v| parse_bool(&v))
            .transpose()
            .context("LARDER_QR_SHARE must be true/false")?;
        let qr_share = pick(qr_env, file.qr_share, true);

        Ok(Config {
            data_dir,
            config_file,
            api_base_url,
            share_base_url,
            qr_share,
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

fn pick<T>(env: Option<T>, file: Option<T>, default: T) -> ConfigValue<T> {
    match (env, file) {
        (Some(value), _) => ConfigValue {
            value,
            source: ConfigSource::Environment,
        },
        (None, Some(value)) => ConfigValue {
            value,
            source: ConfigSource::File,
        },
        (None, None) => ConfigValue {
            value: default,
            source: ConfigSource::Default,
        },
    }
}

fn validate_url(name: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("Invalid {name}: '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid {name}: '{raw}' must use http or https");
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Expected a boolean, got '{other}'"),
    }
}

use crate::media::ExtensionFilter;
use crate::placement::NamingPolicy;
use crate::resolver::{ResolverOptions, DEFAULT_MIN_PLAUSIBLE_YEAR};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub extensions: String,
    pub include_hidden: bool,
    pub photo_naming: NamingPolicy,
    pub video_naming: NamingPolicy,
    pub use_exiftool: bool,
    pub exiftool_path: String,
    pub min_plausible_year: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extensions: "*".to_string(),
            include_hidden: false,
            photo_naming: NamingPolicy::Rename,
            video_naming: NamingPolicy::Preserve,
            use_exiftool: true,
            exiftool_path: "exiftool".to_string(),
            min_plausible_year: DEFAULT_MIN_PLAUSIBLE_YEAR,
        }
    }
}

impl AppConfig {
    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::parse(&self.extensions)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            min_plausible_year: self.min_plausible_year,
            exiftool: self.use_exiftool.then(|| self.exiftool_path.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "kelly", "camera-roll-sorter")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

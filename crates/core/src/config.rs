use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub recursive_default: bool,
    pub include_hidden_default: bool,
    pub prefix_filter: Option<String>,
}

fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "kelly", "photo-sorter")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    let config_path = config_path()?;
    if !config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&config_path).with_context(|| {
        format!(
            "設定ファイルを読めませんでした: {}",
            config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

//! 配置管理命令
//!
//! 配置文件查找顺序：`--config` 指定的路径，其次 `<config_dir>/gripper/config.toml`，
//! 都不存在时使用默认配置。

use anyhow::{Context, Result};
use clap::Subcommand;
use gripper_control::GripperConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("gripper");
    path.push("config.toml");
    Ok(path)
}

/// 解析配置文件路径
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// 加载配置
///
/// 显式指定的文件必须存在；默认路径不存在时返回默认配置。
pub fn load_config(explicit: Option<&Path>) -> Result<GripperConfig> {
    let path = resolve_config_path(explicit)?;

    if !path.exists() {
        if explicit.is_some() {
            anyhow::bail!("配置文件不存在: {}", path.display());
        }
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(GripperConfig::default());
    }

    GripperConfig::load_from_file(&path)
        .with_context(|| format!("加载配置文件失败: {}", path.display()))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置
    Show,

    /// 写入默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = load_config(explicit)?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            },

            ConfigCommand::Init { force } => {
                let path = init_config(explicit, force)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", resolve_config_path(explicit)?.display());
                Ok(())
            },
        }
    }
}

fn init_config(explicit: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = resolve_config_path(explicit)?;
    if path.exists() && !force {
        anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("创建配置目录失败")?;
    }
    GripperConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
    Ok(path)
}

use crate::error::{LauncherError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件内容
///
/// ```toml
/// root = "/home/me/qxmpp/tests"
/// report_name = "nightly"
///
/// [environment]
/// QT_QPA_PLATFORM = "offscreen"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// 测试目录（测试程序所在目录）
    pub root: Option<PathBuf>,

    /// 报告文件名（不含 `.xml`）
    pub report_name: Option<String>,

    /// 额外传给测试程序的环境变量
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// 配置文件所在目录，相对的 `root` 以它为基准
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl LauncherConfig {
    /// 测试目录：相对路径按配置文件所在目录展开
    pub fn resolved_root(&self) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        match self.base_dir {
            Some(ref base) if root.is_relative() => Some(base.join(root)),
            _ => Some(root.clone()),
        }
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    pub const CONFIG_FILE: &'static str = "qxmpp-testrun.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<LauncherConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LauncherError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config: LauncherConfig = toml::from_str(&content).map_err(|e| {
            LauncherError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录及其父目录
    /// 2. 用户配置目录 ~/.config/qxmpp-testrun/
    pub fn find_and_load() -> Option<LauncherConfig> {
        let start = std::env::current_dir().ok();
        let path = start
            .as_deref()
            .and_then(Self::find_upwards)
            .or_else(Self::user_config_path)?;

        match Self::load_from_path(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Ignoring config file: {}", e);
                None
            }
        }
    }

    /// 从 start 开始向上查找配置文件
    pub fn find_upwards(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let config_path = current.join(Self::CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let config_path = home
            .join(".config")
            .join("qxmpp-testrun")
            .join(Self::CONFIG_FILE);

        config_path.is_file().then_some(config_path)
    }
}

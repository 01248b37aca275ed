use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("无法创建报告目录 {}: {source}", .path.display())]
    ReportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法启动测试程序 {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type for the launcher crate
pub type Result<T> = std::result::Result<T, LauncherError>;

use std::path::{Path, PathBuf};

/// 测试程序的 bundle 名
pub const TEST_BUNDLE: &str = "qxmpp-tests.app";

/// bundle 内真正的可执行文件名（仅 macOS）
pub const TEST_EXECUTABLE: &str = "qxmpp-tests";

/// 宿主平台
///
/// 只区分 macOS 和其他平台：两者的动态库搜索变量和测试程序布局不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    /// 当前编译目标对应的平台
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// 动态库搜索路径环境变量名
    pub fn library_path_var(self) -> &'static str {
        match self {
            Platform::MacOs => "DYLD_LIBRARY_PATH",
            Platform::Other => "LD_LIBRARY_PATH",
        }
    }

    /// 测试程序路径
    ///
    /// macOS 上进入 `.app` bundle 内部；其他平台把 `qxmpp-tests.app` 当普通可执行文件。
    pub fn executable_path(self, root: &Path) -> PathBuf {
        let bundle = root.join(TEST_BUNDLE);
        match self {
            Platform::MacOs => bundle.join("Contents").join("MacOS").join(TEST_EXECUTABLE),
            Platform::Other => bundle,
        }
    }
}

/// 测试程序共享库所在目录：测试目录的兄弟目录 `src`
pub fn library_dir(root: &Path) -> PathBuf {
    match root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("src"),
        _ => root.join("..").join("src"),
    }
}

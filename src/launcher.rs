use crate::error::{LauncherError, Result};
use crate::platform::{self, Platform};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// 默认报告文件名（不含 `.xml`）
pub const DEFAULT_REPORT_NAME: &str = "qxmpp-tests";

/// 一次启动所需的全部输入
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// 测试目录，测试程序 bundle 就在这里
    pub root: PathBuf,

    /// xunit 报告输出目录
    pub report_dir: Option<PathBuf>,

    /// 报告文件名
    pub report_name: String,

    /// 额外传给测试程序的环境变量
    pub environment: BTreeMap<String, String>,

    pub platform: Platform,
}

impl LaunchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            report_dir: None,
            report_name: DEFAULT_REPORT_NAME.to_string(),
            environment: BTreeMap::new(),
            platform: Platform::host(),
        }
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

/// 解析测试目录
///
/// 未指定时使用启动器可执行文件所在目录；相对路径按当前工作目录转成绝对路径，
/// 之后的库路径与 cwd 无关。
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let exe = std::env::current_exe()?;
            exe.parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| LauncherError::Other("launcher path has no parent".to_string()))?
        }
    };

    if root.is_absolute() {
        Ok(root)
    } else {
        Ok(std::env::current_dir()?.join(root))
    }
}

/// 确保报告目录存在
///
/// 只创建一层目录，父目录缺失时直接失败。已存在的目录什么都不做，
/// 已存在但不是目录时报错。
pub fn prepare_report_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(LauncherError::ReportDir {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    fs::create_dir(path).map_err(|source| LauncherError::ReportDir {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Created report directory");
    Ok(())
}

/// 计算好的子进程调用：程序、参数、环境变量覆盖
///
/// 只作用于子进程，不修改启动器自身的环境。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(String, OsString)>,
}

impl LaunchPlan {
    pub fn build(options: &LaunchOptions) -> Self {
        let program = options.platform.executable_path(&options.root);

        let mut args = Vec::new();
        if let Some(ref dir) = options.report_dir {
            let report_file = dir.join(format!("{}.xml", options.report_name));
            args.push(OsString::from("-xunitxml"));
            args.push(OsString::from("-o"));
            args.push(report_file.into_os_string());
        }

        let mut env: Vec<(String, OsString)> = options
            .environment
            .iter()
            .map(|(k, v)| (k.clone(), OsString::from(v)))
            .collect();

        // 库路径放最后，同名时覆盖配置里的值
        let var = options.platform.library_path_var();
        env.retain(|(k, _)| k != var);
        env.push((
            var.to_string(),
            platform::library_dir(&options.root).into_os_string(),
        ));

        Self { program, args, env }
    }

    /// 某个环境变量在子进程里的值
    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    /// 同步运行测试程序，阻塞直到它退出
    pub fn run(&self) -> Result<ExitStatus> {
        tracing::info!(
            program = %self.program.display(),
            args = ?self.args,
            "Running test binary"
        );

        self.command()
            .status()
            .map_err(|source| LauncherError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// 启动器
pub struct Launcher {
    options: LaunchOptions,
}

impl Launcher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    pub fn plan(&self) -> LaunchPlan {
        LaunchPlan::build(&self.options)
    }

    /// 准备报告目录并运行测试程序
    ///
    /// 报告目录创建失败会返回错误。测试程序本身的结果（包括无法启动）不影响返回值，
    /// 只记录日志。
    pub fn launch(&self) -> Result<()> {
        if let Some(ref dir) = self.options.report_dir {
            prepare_report_dir(dir)?;
        }

        let plan = self.plan();
        match plan.run() {
            Ok(status) => tracing::debug!(%status, "Test binary exited"),
            Err(e) => tracing::error!("{}", e),
        }

        Ok(())
    }
}

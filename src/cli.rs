use crate::config::{ConfigLoader, LauncherConfig};
use crate::error::Result;
use crate::launcher::{self, DEFAULT_REPORT_NAME, LaunchOptions};
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "qxmpp-testrun",
    version,
    about = "Run the qxmpp-tests binary",
    override_usage = "qxmpp-testrun [options]",
    help_template = "{usage-heading} {usage}"
)]
pub struct Cli {
    /// xunit XML 报告目录，不存在时创建（只创建一层）
    #[arg(short = 'x', long = "report-dir", value_name = "PATH")]
    pub report_dir: Option<PathBuf>,

    /// 报告文件名（不含 .xml）
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub report_name: Option<String>,

    /// 测试目录，默认为启动器所在目录
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// 配置文件路径，默认自动查找 qxmpp-testrun.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 位置参数：接受但不使用
    #[arg(hide = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// 解析参数
    ///
    /// 出错时返回 clap 的错误：`-h` 对应退出码 0，用法错误对应退出码 2。
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// 用法错误的完整输出：clap 的诊断信息，后面一定跟着用法行
    pub fn usage_error_message(err: &clap::Error) -> String {
        let rendered = err.render().to_string();
        if rendered.contains("Usage:") {
            return rendered;
        }

        let usage = Self::command().render_usage();
        format!("{}\n\n{}\n", rendered.trim_end(), usage)
    }

    /// 加载配置：显式指定的文件必须可用，自动查找的失败时忽略
    pub fn load_config(&self) -> Result<LauncherConfig> {
        match self.config {
            Some(ref path) => ConfigLoader::load_from_path(path),
            None => Ok(ConfigLoader::find_and_load().unwrap_or_default()),
        }
    }

    /// 合并命令行和配置，优先级：命令行 > 配置文件 > 默认值
    pub fn into_options(self, config: LauncherConfig) -> Result<LaunchOptions> {
        if !self.args.is_empty() {
            tracing::debug!(args = ?self.args, "Ignoring positional arguments");
        }

        let root = self.root.or_else(|| config.resolved_root());
        let root = launcher::resolve_root(root.as_deref())?;
        let report_name = self
            .report_name
            .or(config.report_name)
            .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string());

        let mut options = LaunchOptions::new(root)
            .with_report_name(report_name)
            .with_environment(config.environment);
        if let Some(dir) = self.report_dir {
            options = options.with_report_dir(dir);
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use std::collections::BTreeMap;

    #[test]
    fn test_help() {
        let err = Cli::try_parse_args(["qxmpp-testrun", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
        assert_eq!(err.to_string().trim_end(), "Usage: qxmpp-testrun [options]");

        // -h 后面的其他参数不影响
        let err = Cli::try_parse_args(["qxmpp-testrun", "-h", "-x", "reports"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_unknown_flag() {
        let err = Cli::try_parse_args(["qxmpp-testrun", "-z"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Usage: qxmpp-testrun [options]"));
    }

    #[test]
    fn test_missing_report_dir_value() {
        let err = Cli::try_parse_args(["qxmpp-testrun", "-x"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let message = Cli::usage_error_message(&err);
        assert!(message.contains("--report-dir"));
        assert!(message.contains("Usage: qxmpp-testrun [options]"));
    }

    #[test]
    fn test_usage_line_not_repeated() {
        let err = Cli::try_parse_args(["qxmpp-testrun", "-z"]).unwrap_err();
        let message = Cli::usage_error_message(&err);
        assert_eq!(message.matches("Usage:").count(), 1);
    }

    #[test]
    fn test_into_options_relative_config_root() {
        let cli = Cli::try_parse_args(["qxmpp-testrun"]).unwrap();
        let config = LauncherConfig {
            root: Some(PathBuf::from("qxmpp/tests")),
            base_dir: Some(PathBuf::from("/work")),
            ..Default::default()
        };

        let options = cli.into_options(config).unwrap();
        assert_eq!(options.root, PathBuf::from("/work/qxmpp/tests"));
    }

    #[test]
    fn test_report_dir_and_positionals() {
        let cli = Cli::try_parse_args(["qxmpp-testrun", "-x", "reports", "extra", "args"]).unwrap();
        assert_eq!(cli.report_dir, Some(PathBuf::from("reports")));
        assert_eq!(cli.args, vec!["extra".to_string(), "args".to_string()]);
    }

    #[test]
    fn test_no_args() {
        let cli = Cli::try_parse_args(["qxmpp-testrun"]).unwrap();
        assert!(cli.report_dir.is_none());
        assert!(cli.args.is_empty());
    }

    #[test]
    fn test_into_options_cli_overrides_config() {
        let cli = Cli::try_parse_args([
            "qxmpp-testrun",
            "--root",
            "/cli/tests",
            "-n",
            "from-cli",
            "-x",
            "reports",
        ])
        .unwrap();

        let mut environment = BTreeMap::new();
        environment.insert("QT_QPA_PLATFORM".to_string(), "offscreen".to_string());
        let config = LauncherConfig {
            root: Some(PathBuf::from("/config/tests")),
            report_name: Some("from-config".to_string()),
            environment,
            ..Default::default()
        };

        let options = cli.into_options(config).unwrap();
        assert_eq!(options.root, PathBuf::from("/cli/tests"));
        assert_eq!(options.report_name, "from-cli");
        assert_eq!(options.report_dir, Some(PathBuf::from("reports")));
        assert_eq!(options.environment.len(), 1);
    }

    #[test]
    fn test_into_options_config_fallback() {
        let cli = Cli::try_parse_args(["qxmpp-testrun"]).unwrap();
        let config = LauncherConfig {
            root: Some(PathBuf::from("/config/tests")),
            ..Default::default()
        };

        let options = cli.into_options(config).unwrap();
        assert_eq!(options.root, PathBuf::from("/config/tests"));
        assert_eq!(options.report_name, DEFAULT_REPORT_NAME);
        assert!(options.report_dir.is_none());
    }
}
